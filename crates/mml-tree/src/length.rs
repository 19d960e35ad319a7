//! Dimensions as written in TeX source, and conversions to `em`.

use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::Serialize;
use strum_macros::{EnumString, IntoStaticStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[strum(serialize_all = "lowercase")]
pub enum Unit {
    Pt,
    Em,
    Ex,
    Mu,
    Px,
    Mm,
    Cm,
    In,
    Pc,
}

impl Unit {
    /// How many `em` one unit is, assuming a 10pt font and a 7.2pt inch-to-em ratio.
    fn in_em(self) -> f64 {
        match self {
            Unit::Em => 1.0,
            Unit::Ex => 0.431,
            Unit::Pt => 1.0 / 10.0,
            Unit::Pc => 1.2,
            Unit::Px => 7.2 / 72.0,
            Unit::In => 7.2,
            Unit::Cm => 7.2 / 2.54,
            Unit::Mm => 7.2 / 25.4,
            Unit::Mu => 1.0 / 18.0,
        }
    }
}

/// A number with a unit, e.g. `-1.5pt`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Dimension {
    pub value: f64,
    pub unit: Unit,
}

impl Dimension {
    pub fn to_em(self) -> f64 {
        self.value * self.unit.in_em()
    }

    /// The dimension in a form suitable for a MathML attribute. `mu` has no MathML
    /// equivalent and is converted to `em`.
    pub fn to_attribute(self) -> String {
        if matches!(self.unit, Unit::Mu) {
            return em(self.to_em());
        }
        let mut s = format_number(self.value);
        s.push_str(<&str>::from(self.unit));
        s
    }
}

/// Parse a dimension at the start of `s`. Returns the dimension and the number of bytes
/// consumed. Whitespace is allowed before the number and between the number and the unit.
pub fn match_dimension(s: &str) -> Option<(Dimension, usize)> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    let start = i;
    if i < bytes.len() && (bytes[i] == b'-' || bytes[i] == b'+') {
        i += 1;
    }
    let digits_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut has_digits = i > digits_start;
    if i < bytes.len() && (bytes[i] == b'.' || bytes[i] == b',') {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        has_digits |= i > frac_start;
    }
    if !has_digits {
        return None;
    }
    let number = s.get(start..i)?.replace(',', ".");
    let value = f64::from_str(&number).ok()?;
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    let unit_str = s.get(i..i + 2)?;
    let unit = Unit::from_str(unit_str).ok()?;
    Some((Dimension { value, unit }, i + 2))
}

/// Parse a string that consists of exactly one dimension.
pub fn parse_dimension(s: &str) -> Option<Dimension> {
    let (dim, used) = match_dimension(s)?;
    s[used..].trim().is_empty().then_some(dim)
}

/// Format a length in `em`, rounded to three decimals.
pub fn em(value: f64) -> String {
    if value.abs() < 0.0006 {
        return "0em".to_string();
    }
    let mut s = format_number(value);
    s.push_str("em");
    s
}

fn format_number(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    let mut buffer = dtoa::Buffer::new();
    let s = buffer.format(rounded);
    s.strip_suffix(".0").unwrap_or(s).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn em_rounding() {
        assert_eq!(em(3.0 / 18.0), "0.167em");
        assert_eq!(em(-3.0 / 18.0), "-0.167em");
        assert_eq!(em(1.0), "1em");
        assert_eq!(em(2.047), "2.047em");
        assert_eq!(em(0.0001), "0em");
    }

    #[test]
    fn dimensions() {
        let dim = parse_dimension("2.5pt").expect("valid");
        assert_eq!(dim.unit, Unit::Pt);
        assert_eq!(dim.to_attribute(), "2.5pt");
        assert_eq!(parse_dimension(" -1 em").map(Dimension::to_attribute).as_deref(), Some("-1em"));
        assert_eq!(parse_dimension(".5in").map(|d| d.unit), Some(Unit::In));
        assert_eq!(parse_dimension("18mu").map(Dimension::to_attribute).as_deref(), Some("1em"));
        assert!(parse_dimension("3").is_none());
        assert!(parse_dimension("pt").is_none());
        assert!(parse_dimension("3pt x").is_none());
    }

    #[test]
    fn dimension_prefix() {
        let (dim, used) = match_dimension("1.5em rest").expect("valid");
        assert_eq!(dim.value, 1.5);
        assert_eq!(used, 5);
    }
}
