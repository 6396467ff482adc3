use nalgebra::{Matrix3, Vector3};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SymmetryError {
    #[error("Symmetry operator '{operator}' has {count} components, expected 3")]
    ComponentCount { operator: String, count: usize },
    #[error("Symmetry operator '{operator}' has an invalid term near '{term}'")]
    InvalidTerm { operator: String, term: String },
}

/// A crystallographic symmetry operation acting on fractional coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct SymmetryOperator {
    pub rotation: Matrix3<f64>,
    pub translation: Vector3<f64>,
    text: String,
}

impl SymmetryOperator {
    pub fn identity() -> Self {
        Self {
            rotation: Matrix3::identity(),
            translation: Vector3::zeros(),
            text: "x,y,z".to_string(),
        }
    }

    pub fn apply(&self, fractional: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * fractional + self.translation
    }

    pub fn is_identity(&self) -> bool {
        self.rotation == Matrix3::identity() && self.translation.iter().all(|t| *t == 0.0)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for SymmetryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl FromStr for SymmetryOperator {
    type Err = SymmetryError;

    /// Parses operators in the `x,y,z` notation, e.g. `-x+1/2,y,-z+1/2` or `x-y,x,z+1/6`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        let components: Vec<&str> = compact.split(',').collect();
        if components.len() != 3 {
            return Err(SymmetryError::ComponentCount {
                operator: s.to_string(),
                count: components.len(),
            });
        }

        let mut rotation = Matrix3::zeros();
        let mut translation = Vector3::zeros();
        for (row, component) in components.iter().enumerate() {
            let (coefficients, offset) = parse_component(component).ok_or_else(|| {
                SymmetryError::InvalidTerm {
                    operator: s.to_string(),
                    term: component.to_string(),
                }
            })?;
            for (col, value) in coefficients.iter().enumerate() {
                rotation[(row, col)] = *value;
            }
            translation[row] = offset;
        }

        Ok(Self {
            rotation,
            translation,
            text: s.trim().to_string(),
        })
    }
}

fn parse_component(component: &str) -> Option<([f64; 3], f64)> {
    if component.is_empty() {
        return None;
    }
    let chars: Vec<char> = component.chars().collect();
    let mut coefficients = [0.0; 3];
    let mut offset = 0.0;
    let mut i = 0;

    while i < chars.len() {
        let mut sign = 1.0;
        match chars[i] {
            '+' => i += 1,
            '-' => {
                sign = -1.0;
                i += 1;
            }
            _ => {}
        }

        let number = parse_number(&chars, &mut i)?;
        let axis = match chars.get(i) {
            Some('x') => Some(0),
            Some('y') => Some(1),
            Some('z') => Some(2),
            _ => None,
        };

        match (number, axis) {
            (value, Some(axis)) => {
                i += 1;
                coefficients[axis] += sign * value.unwrap_or(1.0);
            }
            (Some(value), None) => offset += sign * value,
            (None, None) => return None,
        }
    }
    Some((coefficients, offset))
}

/// Reads an optional integer, decimal or `a/b` fraction starting at `*i`.
fn parse_number(chars: &[char], i: &mut usize) -> Option<Option<f64>> {
    let start = *i;
    while *i < chars.len() && (chars[*i].is_ascii_digit() || chars[*i] == '.') {
        *i += 1;
    }
    if *i == start {
        return Some(None);
    }
    let numerator: f64 = chars[start..*i].iter().collect::<String>().parse().ok()?;

    if chars.get(*i) == Some(&'/') {
        *i += 1;
        let denominator_start = *i;
        while *i < chars.len() && (chars[*i].is_ascii_digit() || chars[*i] == '.') {
            *i += 1;
        }
        let denominator: f64 = chars[denominator_start..*i]
            .iter()
            .collect::<String>()
            .parse()
            .ok()?;
        if denominator == 0.0 {
            return None;
        }
        return Some(Some(numerator / denominator));
    }
    Some(Some(numerator))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn parses_identity() {
        let op: SymmetryOperator = "x,y,z".parse().unwrap();
        assert!(op.is_identity());
        assert_eq!(op, SymmetryOperator::identity());
    }

    #[test]
    fn parses_screw_axis_with_fractions() {
        let op: SymmetryOperator = "-x, y+1/2, -z+1/2".parse().unwrap();
        let image = op.apply(&Vector3::new(0.1, 0.2, 0.3));
        assert!((image - Vector3::new(-0.1, 0.7, 0.2)).norm() < EPS);
        assert!(!op.is_identity());
    }

    #[test]
    fn parses_hexagonal_mixed_terms_and_leading_translation() {
        let op: SymmetryOperator = "x-y,X,1/6+z".parse().unwrap();
        assert_eq!(op.rotation[(0, 0)], 1.0);
        assert_eq!(op.rotation[(0, 1)], -1.0);
        assert_eq!(op.rotation[(1, 0)], 1.0);
        assert!((op.translation[2] - 1.0 / 6.0).abs() < EPS);
    }

    #[test]
    fn parses_decimal_translations() {
        let op: SymmetryOperator = "0.5-x,y,z+0.25".parse().unwrap();
        assert!((op.translation[0] - 0.5).abs() < EPS);
        assert_eq!(op.rotation[(0, 0)], -1.0);
        assert!((op.translation[2] - 0.25).abs() < EPS);
    }

    #[test]
    fn rejects_wrong_component_count() {
        assert!(matches!(
            "x,y".parse::<SymmetryOperator>(),
            Err(SymmetryError::ComponentCount { count: 2, .. })
        ));
    }

    #[test]
    fn rejects_invalid_terms() {
        assert!(matches!(
            "x,q,z".parse::<SymmetryOperator>(),
            Err(SymmetryError::InvalidTerm { .. })
        ));
        assert!("x,,z".parse::<SymmetryOperator>().is_err());
        assert!("x,y,z+1/0".parse::<SymmetryOperator>().is_err());
    }
}
