use thiserror::Error;

/// Errors produced while reading a SMILES string. Positions are character offsets.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SmilesError {
    #[error("empty SMILES string")]
    EmptyInput,
    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { pos: usize, ch: char },
    #[error("invalid element '{text}' at position {pos}")]
    InvalidElement { pos: usize, text: String },
    #[error("unclosed bracket atom starting at position {pos}")]
    UnclosedBracket { pos: usize },
    #[error("invalid charge at position {pos}")]
    InvalidCharge { pos: usize },
    #[error("bond at position {pos} does not join two atoms")]
    DanglingBond { pos: usize },
    #[error("unmatched parenthesis at position {pos}")]
    UnmatchedParen { pos: usize },
    #[error("unclosed ring {digit}")]
    UnclosedRing { digit: u16 },
    #[error("invalid ring bond {digit} at position {pos}")]
    InvalidRingBond { digit: u16, pos: usize },
    #[error("conflicting bond types on ring closure {digit}")]
    RingBondConflict { digit: u16 },
}
