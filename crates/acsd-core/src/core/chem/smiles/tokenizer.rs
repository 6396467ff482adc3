use super::error::SmilesError;
use crate::core::chem::elements::is_known_element;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Atom(AtomToken),
    Bond(BondToken, usize),
    RingClosure { digit: u16, pos: usize },
    OpenParen(usize),
    CloseParen(usize),
    Dot(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomToken {
    /// Capitalized element symbol, or `*` for a wildcard atom.
    pub symbol: String,
    pub is_aromatic: bool,
    pub isotope: Option<u16>,
    pub hcount: Option<u8>,
    pub charge: i8,
    pub is_bracket: bool,
    pub pos: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondToken {
    Single,
    Double,
    Triple,
    Quadruple,
    Aromatic,
    Up,
    Down,
}

pub fn tokenize(input: &str) -> Result<Vec<Token>, SmilesError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\r' | '\n' => i += 1,
            '[' => {
                let (token, next) = parse_bracket_atom(&chars, i)?;
                tokens.push(Token::Atom(token));
                i = next;
            }
            'B' | 'C' => {
                let two = match (c, chars.get(i + 1)) {
                    ('B', Some('r')) => Some("Br"),
                    ('C', Some('l')) => Some("Cl"),
                    _ => None,
                };
                match two {
                    Some(symbol) => {
                        tokens.push(Token::Atom(bare_atom(symbol, false, i)));
                        i += 2;
                    }
                    None => {
                        tokens.push(Token::Atom(bare_atom(&c.to_string(), false, i)));
                        i += 1;
                    }
                }
            }
            'N' | 'O' | 'P' | 'S' | 'F' | 'I' | '*' => {
                tokens.push(Token::Atom(bare_atom(&c.to_string(), false, i)));
                i += 1;
            }
            'b' | 'c' | 'n' | 'o' | 'p' | 's' => {
                let symbol = c.to_ascii_uppercase().to_string();
                tokens.push(Token::Atom(bare_atom(&symbol, true, i)));
                i += 1;
            }
            '-' | '=' | '#' | '$' | ':' | '/' | '\\' => {
                let bond = match c {
                    '-' => BondToken::Single,
                    '=' => BondToken::Double,
                    '#' => BondToken::Triple,
                    '$' => BondToken::Quadruple,
                    ':' => BondToken::Aromatic,
                    '/' => BondToken::Up,
                    _ => BondToken::Down,
                };
                tokens.push(Token::Bond(bond, i));
                i += 1;
            }
            '(' => {
                tokens.push(Token::OpenParen(i));
                i += 1;
            }
            ')' => {
                tokens.push(Token::CloseParen(i));
                i += 1;
            }
            '.' => {
                tokens.push(Token::Dot(i));
                i += 1;
            }
            '%' => {
                let digits: Option<u16> = match (chars.get(i + 1), chars.get(i + 2)) {
                    (Some(d1), Some(d2)) if d1.is_ascii_digit() && d2.is_ascii_digit() => {
                        Some((*d1 as u16 - b'0' as u16) * 10 + (*d2 as u16 - b'0' as u16))
                    }
                    _ => None,
                };
                let digit = digits.ok_or(SmilesError::UnexpectedChar { pos: i, ch: '%' })?;
                tokens.push(Token::RingClosure { digit, pos: i });
                i += 3;
            }
            d if d.is_ascii_digit() => {
                tokens.push(Token::RingClosure {
                    digit: d as u16 - b'0' as u16,
                    pos: i,
                });
                i += 1;
            }
            ch => return Err(SmilesError::UnexpectedChar { pos: i, ch }),
        }
    }

    Ok(tokens)
}

fn bare_atom(symbol: &str, aromatic: bool, pos: usize) -> AtomToken {
    AtomToken {
        symbol: symbol.to_string(),
        is_aromatic: aromatic,
        isotope: None,
        hcount: None,
        charge: 0,
        is_bracket: false,
        pos,
    }
}

fn parse_bracket_atom(chars: &[char], start: usize) -> Result<(AtomToken, usize), SmilesError> {
    let mut i = start + 1;

    let isotope = parse_digits(chars, &mut i);
    let (symbol, is_aromatic) = parse_bracket_element(chars, &mut i, start)?;
    skip_chirality(chars, &mut i);

    let hcount = if chars.get(i) == Some(&'H') {
        i += 1;
        Some(parse_digits(chars, &mut i).map_or(1, |n| n.min(u8::MAX as u16) as u8))
    } else {
        None
    };

    let charge = parse_charge(chars, &mut i)?;

    if chars.get(i) == Some(&':') {
        i += 1;
        parse_digits(chars, &mut i);
    }

    match chars.get(i) {
        Some(']') => i += 1,
        Some(&ch) => return Err(SmilesError::UnexpectedChar { pos: i, ch }),
        None => return Err(SmilesError::UnclosedBracket { pos: start }),
    }

    Ok((
        AtomToken {
            symbol,
            is_aromatic,
            isotope,
            hcount: Some(hcount.unwrap_or(0)),
            charge,
            is_bracket: true,
            pos: start,
        },
        i,
    ))
}

fn parse_digits(chars: &[char], i: &mut usize) -> Option<u16> {
    let start = *i;
    let mut value: u16 = 0;
    while let Some(d) = chars.get(*i).filter(|c| c.is_ascii_digit()) {
        value = value.saturating_mul(10).saturating_add(*d as u16 - b'0' as u16);
        *i += 1;
    }
    (*i > start).then_some(value)
}

fn parse_bracket_element(
    chars: &[char],
    i: &mut usize,
    bracket_start: usize,
) -> Result<(String, bool), SmilesError> {
    let Some(&first) = chars.get(*i) else {
        return Err(SmilesError::UnclosedBracket { pos: bracket_start });
    };

    if first == '*' {
        *i += 1;
        return Ok(("*".to_string(), false));
    }

    if first.is_ascii_lowercase() {
        for pattern in ["se", "te", "as"] {
            if chars[*i..].iter().take(2).copied().eq(pattern.chars()) {
                *i += 2;
                return Ok((capitalize(pattern), true));
            }
        }
        if matches!(first, 'b' | 'c' | 'n' | 'o' | 'p' | 's') {
            *i += 1;
            return Ok((first.to_ascii_uppercase().to_string(), true));
        }
    }

    if first.is_ascii_uppercase() {
        if let Some(&second) = chars.get(*i + 1).filter(|c| c.is_ascii_lowercase()) {
            let symbol: String = [first, second].iter().collect();
            if is_known_element(&symbol) {
                *i += 2;
                return Ok((symbol, false));
            }
        }
        let symbol = first.to_string();
        if is_known_element(&symbol) {
            *i += 1;
            return Ok((symbol, false));
        }
    }

    Err(SmilesError::InvalidElement {
        pos: *i,
        text: first.to_string(),
    })
}

fn capitalize(symbol: &str) -> String {
    let mut chars = symbol.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

// Stereo markers (@, @@, @TH1, @SP2, ...) do not affect connectivity.
fn skip_chirality(chars: &[char], i: &mut usize) {
    if chars.get(*i) != Some(&'@') {
        return;
    }
    while chars.get(*i) == Some(&'@') {
        *i += 1;
    }
    let class: String = chars[*i..].iter().take(2).collect();
    if ["TH", "AL", "SP", "TB", "OH"].contains(&class.as_str()) {
        *i += 2;
        parse_digits(chars, i);
    }
}

fn parse_charge(chars: &[char], i: &mut usize) -> Result<i8, SmilesError> {
    let sign: i8 = match chars.get(*i) {
        Some('+') => 1,
        Some('-') => -1,
        _ => return Ok(0),
    };
    let sign_char = chars[*i];
    let start = *i;
    *i += 1;

    if let Some(magnitude) = parse_digits(chars, i) {
        let magnitude = i8::try_from(magnitude).map_err(|_| SmilesError::InvalidCharge { pos: start })?;
        return Ok(sign * magnitude);
    }

    let mut magnitude: i8 = 1;
    while chars.get(*i) == Some(&sign_char) {
        magnitude = magnitude
            .checked_add(1)
            .ok_or(SmilesError::InvalidCharge { pos: start })?;
        *i += 1;
    }
    Ok(sign * magnitude)
}
