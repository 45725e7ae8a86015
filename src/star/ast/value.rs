//! Leaf values of the generic STAR tree

use serde::Serialize;
use std::fmt;

/// CIF null
pub const NULL_STRING: &str = ".";
/// CIF unknown / missing
pub const UNKNOWN_STRING: &str = "?";
pub const TRUE_STRING: &str = "true";
pub const FALSE_STRING: &str = "false";

/// A value as it appeared in the file.
///
/// Quoting is preserved because it changes the meaning of a value:
/// an unquoted `.` is null while `'.'` is the one-character string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum StarValue {
    /// Single-, double-quoted or multi-line string
    Quoted(String),
    /// Bare word, including `.`, `?`, `$name` and bracket constructs
    Unquoted(String),
}

impl StarValue {
    pub fn quoted(text: impl Into<String>) -> Self {
        StarValue::Quoted(text.into())
    }

    pub fn unquoted(text: impl Into<String>) -> Self {
        StarValue::Unquoted(text.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            StarValue::Quoted(text) | StarValue::Unquoted(text) => text,
        }
    }

    pub fn is_quoted(&self) -> bool {
        matches!(self, StarValue::Quoted(_))
    }

    /// Unquoted `.`
    pub fn is_null(&self) -> bool {
        matches!(self, StarValue::Unquoted(text) if text == NULL_STRING)
    }

    /// Unquoted `?`
    pub fn is_unknown(&self) -> bool {
        matches!(self, StarValue::Unquoted(text) if text == UNKNOWN_STRING)
    }

    /// Target of an unquoted `$name` save-frame reference
    pub fn frame_reference(&self) -> Option<&str> {
        match self {
            StarValue::Unquoted(text) => text.strip_prefix('$').filter(|name| !name.is_empty()),
            StarValue::Quoted(_) => None,
        }
    }
}

impl fmt::Display for StarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
