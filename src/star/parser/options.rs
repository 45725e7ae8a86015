//! Parser configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the parser reacts to structural irregularities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// Any irregularity is a hard failure
    Strict,
    /// Irregularities are logged, recorded as diagnostics and recovered from
    #[default]
    Standard,
    /// Irregularities are recovered from silently; a missing data block
    /// header is synthesized
    Lenient,
}

impl ParseMode {
    pub fn all() -> [ParseMode; 3] {
        [ParseMode::Strict, ParseMode::Standard, ParseMode::Lenient]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ParseMode::Strict => "strict",
            ParseMode::Standard => "standard",
            ParseMode::Lenient => "lenient",
        }
    }
}

impl fmt::Display for ParseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown parse mode '{0}' (expected strict, standard or lenient)")]
pub struct UnknownParseMode(pub String);

impl FromStr for ParseMode {
    type Err = UnknownParseMode;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        ParseMode::all()
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(text))
            .ok_or_else(|| UnknownParseMode(text.to_string()))
    }
}

/// Options for [`super::StarParser`]
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct ParserOptions {
    pub mode: ParseMode,
    /// Lower-case data names and block/frame names (values are never changed)
    pub lowercase_tags: bool,
    /// Abort after this many tokens
    pub max_tokens: Option<usize>,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            mode: ParseMode::Standard,
            lowercase_tags: true,
            max_tokens: None,
        }
    }
}

impl ParserOptions {
    pub fn new(mode: ParseMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn with_lowercase_tags(mut self, lowercase_tags: bool) -> Self {
        self.lowercase_tags = lowercase_tags;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<usize>) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}
