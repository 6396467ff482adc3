use itertools::Itertools;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

const COUNT_TOLERANCE: f64 = 1e-9;

/// Errors raised while reading a declared formula. Positions index the formula after
/// comma normalization and charge stripping.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormulaError {
    #[error("Unexpected character '{ch}' at position {pos} in formula '{formula}'")]
    UnexpectedCharacter {
        formula: String,
        pos: usize,
        ch: char,
    },
    #[error("Unclosed parenthesis in formula '{formula}'")]
    UnclosedParenthesis { formula: String },
    #[error("Unmatched ')' at position {pos} in formula '{formula}'")]
    UnmatchedParenthesis { formula: String, pos: usize },
    #[error("Multiplier at position {pos} applies to nothing in formula '{formula}'")]
    DanglingMultiplier { formula: String, pos: usize },
    #[error("Invalid number '{text}' in formula '{formula}'")]
    InvalidNumber { formula: String, text: String },
}

/// Element symbol to (possibly fractional) count.
///
/// Equality ignores zero entries and tolerates floating-point noise, so counts built from
/// `0.5(H2O)`-style fragments compare as expected.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ElementCounts(BTreeMap<String, f64>);

impl ElementCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_symbols<'a>(symbols: impl IntoIterator<Item = &'a str>) -> Self {
        let mut counts = Self::new();
        for symbol in symbols {
            counts.add(symbol, 1.0);
        }
        counts
    }

    pub fn add(&mut self, element: &str, count: f64) {
        *self.0.entry(element.to_string()).or_insert(0.0) += count;
    }

    pub fn merge_scaled(&mut self, other: &ElementCounts, factor: f64) {
        for (element, count) in &other.0 {
            self.add(element, count * factor);
        }
    }

    pub fn get(&self, element: &str) -> f64 {
        self.0.get(element).copied().unwrap_or(0.0)
    }

    /// A copy with `element` removed.
    pub fn without(&self, element: &str) -> Self {
        let mut copy = self.clone();
        copy.0.remove(element);
        copy
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(e, &n)| (e.as_str(), n))
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|n| n.abs() <= COUNT_TOLERANCE)
    }
}

impl PartialEq for ElementCounts {
    fn eq(&self, other: &Self) -> bool {
        self.0
            .keys()
            .chain(other.0.keys())
            .all(|e| (self.get(e) - other.get(e)).abs() <= COUNT_TOLERANCE)
    }
}

impl fmt::Display for ElementCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self
            .iter()
            .filter(|(_, n)| n.abs() > COUNT_TOLERANCE)
            .map(|(e, n)| {
                if n.fract() == 0.0 {
                    format!("{e}{n:.0}")
                } else {
                    format!("{e}{n}")
                }
            })
            .join(" ");
        write!(f, "{}", text)
    }
}

/// Parses a declared chemical formula into element counts.
///
/// Accepts database-style spaced formulas (`"C10 H8 N2 O2,2(H2 O1)"`) as well as compact
/// ones (`"(CH3)2CO"`). Rules:
///
/// - Commas separate fragments like whitespace does.
/// - Charge annotations (`1+`, `2-`, trailing `+`/`-` on a token) are removed.
/// - A fragment may start with a multiplier that scales the whole fragment.
/// - A parenthesized group may be followed by a multiplier; prefix and suffix multiply.
/// - A placeholder multiplier (`n`, `x`, `y`, `z`) makes the group or fragment
///   unconstrained and it contributes nothing.
/// - `.` between fragments is a hydrate separator (`CuSO4.5H2O`). A dot inside a number is
///   a decimal point unless it is followed by digits and then an element or `(`, in which
///   case it separates a hydrate fragment. Numbers with an integer part of `0` and leading
///   multipliers are always decimals (`C2H6O.0.5H2O`).
/// - Deuterium (`D`) and tritium (`T`) count as hydrogen.
pub fn parse_formula(formula: &str) -> Result<ElementCounts, FormulaError> {
    let normalized = formula
        .replace(',', " ")
        .split_whitespace()
        .map(strip_charge)
        .filter(|token| !token.is_empty())
        .join(" ");
    let mut parser = FormulaParser {
        text: &normalized,
        chars: normalized.chars().collect(),
        pos: 0,
    };
    parser.parse_sequence(false)
}

/// Removes charge annotations from a whitespace-delimited formula token.
///
/// A run of `+`/`-` is dropped together with the digits right before it when those digits
/// start the token or follow `(`; otherwise the digits are an element count and are kept.
fn strip_charge(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '+' || c == '-' {
            let digits_start = out
                .trim_end_matches(|ch: char| ch.is_ascii_digit() || ch == '.')
                .len();
            if digits_start == 0 || out[..digits_start].ends_with('(') {
                out.truncate(digits_start);
            }
            while matches!(chars.peek(), Some('+') | Some('-')) {
                chars.next();
            }
            continue;
        }
        out.push(c);
    }
    out
}

enum Multiplier {
    Absent,
    Value(f64),
    Unconstrained,
}

struct FormulaParser<'a> {
    text: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl FormulaParser<'_> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn parse_sequence(&mut self, inside_group: bool) -> Result<ElementCounts, FormulaError> {
        let mut counts = ElementCounts::new();
        loop {
            match self.peek() {
                None if inside_group => {
                    return Err(FormulaError::UnclosedParenthesis {
                        formula: self.text.to_string(),
                    });
                }
                None => return Ok(counts),
                Some(')') if inside_group => {
                    self.pos += 1;
                    return Ok(counts);
                }
                Some(')') => {
                    return Err(FormulaError::UnmatchedParenthesis {
                        formula: self.text.to_string(),
                        pos: self.pos,
                    });
                }
                Some(c) if c.is_whitespace() || c == '.' => self.pos += 1,
                Some(_) => {
                    if let Some((fragment, factor)) = self.parse_fragment()? {
                        counts.merge_scaled(&fragment, factor);
                    }
                }
            }
        }
    }

    /// `fragment := [multiplier] (element [count] | '(' sequence ')' [multiplier])+`
    fn parse_fragment(&mut self) -> Result<Option<(ElementCounts, f64)>, FormulaError> {
        let start = self.pos;
        let multiplier = self.parse_multiplier(false)?;
        let mut counts = ElementCounts::new();
        let mut units = 0;

        loop {
            match self.peek() {
                Some(c) if c.is_ascii_uppercase() => {
                    self.parse_element(&mut counts)?;
                    units += 1;
                }
                Some('(') => {
                    self.pos += 1;
                    let inner = self.parse_sequence(true)?;
                    match self.parse_multiplier(true)? {
                        Multiplier::Absent => counts.merge_scaled(&inner, 1.0),
                        Multiplier::Value(factor) => counts.merge_scaled(&inner, factor),
                        Multiplier::Unconstrained => {}
                    }
                    units += 1;
                }
                _ => break,
            }
        }

        if units == 0 {
            return Err(match (&multiplier, self.peek()) {
                (Multiplier::Absent, Some(ch)) => FormulaError::UnexpectedCharacter {
                    formula: self.text.to_string(),
                    pos: self.pos,
                    ch,
                },
                _ => FormulaError::DanglingMultiplier {
                    formula: self.text.to_string(),
                    pos: start,
                },
            });
        }

        Ok(match multiplier {
            Multiplier::Absent => Some((counts, 1.0)),
            Multiplier::Value(factor) => Some((counts, factor)),
            Multiplier::Unconstrained => None,
        })
    }

    fn parse_element(&mut self, counts: &mut ElementCounts) -> Result<(), FormulaError> {
        let mut symbol = String::new();
        if let Some(c) = self.peek() {
            symbol.push(c);
            self.pos += 1;
        }
        if let Some(c) = self.peek().filter(|c| c.is_ascii_lowercase()) {
            symbol.push(c);
            self.pos += 1;
        }
        let count = match self.peek() {
            Some(c) if c.is_ascii_digit() => self.parse_number(true)?,
            _ => 1.0,
        };
        let element = match symbol.as_str() {
            "D" | "T" => "H",
            other => other,
        };
        counts.add(element, count);
        Ok(())
    }

    fn parse_multiplier(&mut self, allow_hydrate_split: bool) -> Result<Multiplier, FormulaError> {
        match self.peek() {
            Some(c) if c.is_ascii_digit() => {
                Ok(Multiplier::Value(self.parse_number(allow_hydrate_split)?))
            }
            Some('n' | 'x' | 'y' | 'z') => {
                self.pos += 1;
                Ok(Multiplier::Unconstrained)
            }
            _ => Ok(Multiplier::Absent),
        }
    }

    fn parse_number(&mut self, allow_hydrate_split: bool) -> Result<f64, FormulaError> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }

        if self.peek() == Some('.') && self.is_decimal_point(start, allow_hydrate_split) {
            self.pos += 1;
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1;
            }
        }

        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse().map_err(|_| FormulaError::InvalidNumber {
            formula: self.text.to_string(),
            text,
        })
    }

    /// Decides whether the `.` at the cursor continues the number that began at `start`.
    fn is_decimal_point(&self, start: usize, allow_hydrate_split: bool) -> bool {
        let mut end = self.pos + 1;
        while self.chars.get(end).is_some_and(|c| c.is_ascii_digit()) {
            end += 1;
        }
        if end == self.pos + 1 {
            return false;
        }
        let integer_part: String = self.chars[start..self.pos].iter().collect();
        // A second dot followed by digits means the digits after the first one were a
        // hydrate multiplier such as the `0` of `C6H6.0.5H2O`.
        let starts_fragment = match self.chars.get(end) {
            Some(c) if c.is_ascii_uppercase() || *c == '(' => true,
            Some('.') => self.chars.get(end + 1).is_some_and(|c| c.is_ascii_digit()),
            _ => false,
        };
        !(allow_hydrate_split && starts_fragment && integer_part != "0")
    }
}
