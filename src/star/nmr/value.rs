//! Typed values
//!
//! After conversion every value is one of null, boolean, integer, float or
//! string. Only unquoted tokens are coerced; a quoted `"."` stays the
//! one-character string `.`.

use crate::star::ast::{StarValue, FALSE_STRING, NULL_STRING, TRUE_STRING, UNKNOWN_STRING};
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;

/// A converted NEF / NMR-STAR value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NmrValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl NmrValue {
    pub fn is_null(&self) -> bool {
        matches!(self, NmrValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            NmrValue::Str(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            NmrValue::Int(number) => Some(*number),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            NmrValue::Float(number) => Some(*number),
            NmrValue::Int(number) => Some(*number as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            NmrValue::Bool(flag) => Some(*flag),
            _ => None,
        }
    }
}

impl fmt::Display for NmrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NmrValue::Null => f.write_str(NULL_STRING),
            NmrValue::Bool(true) => f.write_str(TRUE_STRING),
            NmrValue::Bool(false) => f.write_str(FALSE_STRING),
            NmrValue::Int(number) => write!(f, "{}", number),
            // Debug keeps a decimal point or exponent, so the text re-reads as a float
            NmrValue::Float(number) => write!(f, "{:?}", number),
            NmrValue::Str(text) => f.write_str(text),
        }
    }
}

impl From<&str> for NmrValue {
    fn from(text: &str) -> Self {
        NmrValue::Str(text.to_string())
    }
}

impl From<String> for NmrValue {
    fn from(text: String) -> Self {
        NmrValue::Str(text)
    }
}

impl From<i64> for NmrValue {
    fn from(number: i64) -> Self {
        NmrValue::Int(number)
    }
}

impl From<f64> for NmrValue {
    fn from(number: f64) -> Self {
        NmrValue::Float(number)
    }
}

impl From<bool> for NmrValue {
    fn from(flag: bool) -> Self {
        NmrValue::Bool(flag)
    }
}

impl<T: Into<NmrValue>> From<Option<T>> for NmrValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(NmrValue::Null, Into::into)
    }
}

/// Tags whose values stay strings even when they look numeric
pub fn is_string_tag(tag: &str) -> bool {
    tag.ends_with("_code") || tag.ends_with("_name")
}

/// Integer first, then float
///
/// Single underscores between digits are digit separators, so `1_000` is an
/// integer. Integers outside the `i64` range read as the nearest float.
pub fn parse_number(text: &str) -> Option<NmrValue> {
    let digits = without_digit_separators(text)?;
    if let Ok(number) = digits.parse::<i64>() {
        return Some(NmrValue::Int(number));
    }
    digits.parse::<f64>().ok().map(NmrValue::Float)
}

fn without_digit_separators(text: &str) -> Option<Cow<'_, str>> {
    if !text.contains('_') {
        return Some(Cow::Borrowed(text));
    }
    let bytes = text.as_bytes();
    let between_digits = |at: usize| {
        at > 0 && bytes[at - 1].is_ascii_digit() && bytes.get(at + 1).is_some_and(u8::is_ascii_digit)
    };
    let separated = bytes
        .iter()
        .enumerate()
        .filter(|(_, byte)| **byte == b'_')
        .all(|(at, _)| between_digits(at));
    separated.then(|| Cow::Owned(text.replace('_', "")))
}

/// Conversion of raw values into typed values under a given tag
pub trait IntoNmrValue {
    fn into_nmr_value(self, tag: &str) -> NmrValue;
}

impl IntoNmrValue for &StarValue {
    fn into_nmr_value(self, tag: &str) -> NmrValue {
        match self {
            StarValue::Quoted(text) => NmrValue::Str(text.clone()),
            StarValue::Unquoted(text) => text.as_str().into_nmr_value(tag),
        }
    }
}

/// A bare `&str` is treated as an unquoted token
impl IntoNmrValue for &str {
    fn into_nmr_value(self, tag: &str) -> NmrValue {
        match self {
            NULL_STRING | UNKNOWN_STRING => NmrValue::Null,
            TRUE_STRING => NmrValue::Bool(true),
            FALSE_STRING => NmrValue::Bool(false),
            _ => {
                if let Some(reference) = self.strip_prefix('$') {
                    NmrValue::Str(reference.to_string())
                } else if is_string_tag(tag) {
                    NmrValue::Str(self.to_string())
                } else {
                    parse_number(self).unwrap_or_else(|| NmrValue::Str(self.to_string()))
                }
            }
        }
    }
}

/// Already typed: unchanged
impl IntoNmrValue for NmrValue {
    fn into_nmr_value(self, _tag: &str) -> NmrValue {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels() {
        assert!(StarValue::unquoted("?").into_nmr_value("_a.b").is_null());
        assert_eq!(StarValue::unquoted(".").into_nmr_value("_a.b"), NmrValue::Null);
        assert_eq!(
            StarValue::quoted(".").into_nmr_value("_a.b"),
            NmrValue::Str(".".to_string())
        );
        assert_eq!("true".into_nmr_value("x"), NmrValue::Bool(true));
        assert_eq!("false".into_nmr_value("x"), NmrValue::Bool(false));
        assert_eq!("$frame_1".into_nmr_value("x"), NmrValue::from("frame_1"));
    }

    #[test]
    fn test_numbers() {
        assert_eq!("12".into_nmr_value("x"), NmrValue::Int(12));
        assert_eq!("-1.5".into_nmr_value("x"), NmrValue::Float(-1.5));
        assert_eq!("1e3".into_nmr_value("x"), NmrValue::Float(1000.0));
        assert_eq!("12a".into_nmr_value("x"), NmrValue::from("12a"));
        assert_eq!("12".into_nmr_value("sequence_code"), NmrValue::from("12"));
        assert_eq!("12".into_nmr_value("residue_name"), NmrValue::from("12"));
        assert_eq!(
            StarValue::quoted("12").into_nmr_value("x"),
            NmrValue::from("12")
        );
    }

    #[test]
    fn test_digit_separators() {
        assert_eq!("1_000".into_nmr_value("x"), NmrValue::Int(1000));
        assert_eq!("-2_5.0_5".into_nmr_value("x"), NmrValue::Float(-25.05));
        for text in ["_1", "1_", "1__0", "1_.5", "a_1"] {
            assert_eq!(text.into_nmr_value("x"), NmrValue::from(text), "{text}");
        }
    }

    #[test]
    fn test_integers_beyond_i64() {
        assert_eq!(
            "99999999999999999999".into_nmr_value("x"),
            NmrValue::Float(1e20)
        );
        assert_eq!(
            i64::MIN.to_string().as_str().into_nmr_value("x"),
            NmrValue::Int(i64::MIN)
        );
    }

    #[test]
    fn test_typed_values_are_fixed_points() {
        for value in [
            NmrValue::Null,
            NmrValue::Bool(true),
            NmrValue::Int(3),
            NmrValue::Float(0.25),
        ] {
            assert_eq!(value.clone().into_nmr_value("x"), value);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(NmrValue::Float(1.0).to_string(), "1.0");
        assert_eq!(NmrValue::Null.to_string(), ".");
        assert_eq!(NmrValue::Bool(false).to_string(), "false");
        assert_eq!(NmrValue::from(None::<i64>), NmrValue::Null);
    }
}
