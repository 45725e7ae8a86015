//! Token definitions for STAR text
//!
//! A STAR token is a whitespace-delimited word, a quoted string, a comment or a
//! `;`-delimited multi-line string. Words are classified by the logos-derived
//! [`WordKind`] lexer; the other three shapes depend on line context and are
//! recognized by the scanner in [`super::lexer_impl`].
//!
//! Every pattern below carries an explicit priority. The catch-all
//! [`WordKind::BadToken`] matches any word in full, so longest-match always
//! covers the whole word and the priorities alone pick the class, in the same
//! order the STAR grammar lists its alternatives.
use logos::Logos;
use serde::Serialize;
use std::fmt;
use std::ops::Range;

/// Classification of a single whitespace-delimited word
#[derive(Logos, Debug, PartialEq, Eq, Clone, Copy)]
pub enum WordKind {
    #[token("global_", priority = 40, ignore(ascii_case))]
    Global,

    // `save_` alone is a frame terminator, `save_name` a frame header
    #[regex(r"save_[^\s]*", priority = 39, ignore(ascii_case))]
    SaveFrame,

    #[regex(r"\$[^\s]+", priority = 38)]
    SaveFrameRef,

    #[token("stop_", priority = 37, ignore(ascii_case))]
    LoopStop,

    #[regex(r"data_[^\s]+", priority = 36, ignore(ascii_case))]
    DataBlock,

    #[token("loop_", priority = 35, ignore(ascii_case))]
    Loop,

    // Reserved stems glued to extra characters, and a bare `data_`
    #[regex(
        r"global_[^\s]+|stop_[^\s]+|data_|loop_[^\s]+",
        priority = 34,
        ignore(ascii_case)
    )]
    BadConstruct,

    #[regex(r"_[^\s]+", priority = 33)]
    DataName,

    #[token(".", priority = 32)]
    Null,

    #[token("?", priority = 31)]
    Unknown,

    #[regex(r"[\[\]][^\s]*", priority = 30)]
    SquareBracket,

    #[regex(r#"[^'";_$\s][^\s]*"#, priority = 29)]
    Str,

    #[regex(r"[^\s]+", priority = 1)]
    BadToken,
}

/// Token classes, numbered in grammar precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenType {
    Multiline = 1,
    Comment = 2,
    Global = 3,
    SaveFrame = 4,
    SaveFrameRef = 5,
    LoopStop = 6,
    DataBlock = 7,
    Loop = 8,
    BadConstruct = 9,
    DataName = 10,
    SquoteString = 11,
    DquoteString = 12,
    Null = 13,
    Unknown = 14,
    SquareBracket = 15,
    Str = 16,
    BadToken = 17,
}

impl TokenType {
    /// Numeric code of the token class (1..=17)
    pub fn code(self) -> u8 {
        self as u8
    }

    /// True for tokens that can stand in a value position
    pub fn is_value(self) -> bool {
        matches!(
            self,
            TokenType::Multiline
                | TokenType::SaveFrameRef
                | TokenType::SquoteString
                | TokenType::DquoteString
                | TokenType::Null
                | TokenType::Unknown
                | TokenType::SquareBracket
                | TokenType::Str
        )
    }

    /// True for the three quoted string forms
    pub fn is_quoted(self) -> bool {
        matches!(
            self,
            TokenType::Multiline | TokenType::SquoteString | TokenType::DquoteString
        )
    }

    /// True for malformed input
    pub fn is_bad(self) -> bool {
        matches!(self, TokenType::BadConstruct | TokenType::BadToken)
    }
}

impl From<WordKind> for TokenType {
    fn from(kind: WordKind) -> Self {
        match kind {
            WordKind::Global => TokenType::Global,
            WordKind::SaveFrame => TokenType::SaveFrame,
            WordKind::SaveFrameRef => TokenType::SaveFrameRef,
            WordKind::LoopStop => TokenType::LoopStop,
            WordKind::DataBlock => TokenType::DataBlock,
            WordKind::Loop => TokenType::Loop,
            WordKind::BadConstruct => TokenType::BadConstruct,
            WordKind::DataName => TokenType::DataName,
            WordKind::Null => TokenType::Null,
            WordKind::Unknown => TokenType::Unknown,
            WordKind::SquareBracket => TokenType::SquareBracket,
            WordKind::Str => TokenType::Str,
            WordKind::BadToken => TokenType::BadToken,
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenType::Multiline => "MULTILINE",
            TokenType::Comment => "COMMENT",
            TokenType::Global => "GLOBAL",
            TokenType::SaveFrame => "SAVE_FRAME",
            TokenType::SaveFrameRef => "SAVE_FRAME_REF",
            TokenType::LoopStop => "LOOP_STOP",
            TokenType::DataBlock => "DATA_BLOCK",
            TokenType::Loop => "LOOP",
            TokenType::BadConstruct => "BAD_CONSTRUCT",
            TokenType::DataName => "DATA_NAME",
            TokenType::SquoteString => "SQUOTE_STRING",
            TokenType::DquoteString => "DQUOTE_STRING",
            TokenType::Null => "NULL",
            TokenType::Unknown => "UNKNOWN",
            TokenType::SquareBracket => "SQUARE_BRACKET",
            TokenType::Str => "STRING",
            TokenType::BadToken => "BAD_TOKEN",
        };
        write!(f, "{}", name)
    }
}

/// A token borrowed from the source text.
///
/// `value` is the captured content: the text between the quotes for quoted
/// strings, the text between the delimiting `;` lines for multi-line strings,
/// the comment including its `#`, and the whole word otherwise. `span` covers
/// the complete match, delimiters included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StarToken<'a> {
    pub kind: TokenType,
    pub value: &'a str,
    pub span: Range<usize>,
}

impl<'a> StarToken<'a> {
    pub fn new(kind: TokenType, value: &'a str, span: Range<usize>) -> Self {
        Self { kind, value, span }
    }
}

impl fmt::Display for StarToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}:{:?}>", self.kind, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str) -> Option<WordKind> {
        let mut lexer = WordKind::lexer(text);
        match lexer.next() {
            Some(Ok(kind)) if lexer.span().end == text.len() => Some(kind),
            _ => None,
        }
    }

    #[test]
    fn test_reserved_words() {
        assert_eq!(word("global_"), Some(WordKind::Global));
        assert_eq!(word("save_"), Some(WordKind::SaveFrame));
        assert_eq!(word("save_frame1"), Some(WordKind::SaveFrame));
        assert_eq!(word("stop_"), Some(WordKind::LoopStop));
        assert_eq!(word("data_x"), Some(WordKind::DataBlock));
        assert_eq!(word("loop_"), Some(WordKind::Loop));
    }

    #[test]
    fn test_reserved_words_ignore_case() {
        assert_eq!(word("LOOP_"), Some(WordKind::Loop));
        assert_eq!(word("Save_Frame"), Some(WordKind::SaveFrame));
        assert_eq!(word("DATA_abc"), Some(WordKind::DataBlock));
        assert_eq!(word("Global_"), Some(WordKind::Global));
    }

    #[test]
    fn test_bad_constructs() {
        assert_eq!(word("data_"), Some(WordKind::BadConstruct));
        assert_eq!(word("loop_x"), Some(WordKind::BadConstruct));
        assert_eq!(word("stop_now"), Some(WordKind::BadConstruct));
        assert_eq!(word("global_x"), Some(WordKind::BadConstruct));
    }

    #[test]
    fn test_values() {
        assert_eq!(word("."), Some(WordKind::Null));
        assert_eq!(word("?"), Some(WordKind::Unknown));
        assert_eq!(word(".5"), Some(WordKind::Str));
        assert_eq!(word("?x"), Some(WordKind::Str));
        assert_eq!(word("loopx"), Some(WordKind::Str));
        assert_eq!(word("$frame"), Some(WordKind::SaveFrameRef));
        assert_eq!(word("[1,2]"), Some(WordKind::SquareBracket));
        assert_eq!(word("_tag.name"), Some(WordKind::DataName));
    }

    #[test]
    fn test_catch_all() {
        assert_eq!(word("$"), Some(WordKind::BadToken));
        assert_eq!(word("_"), Some(WordKind::BadToken));
        assert_eq!(word("'open"), Some(WordKind::BadToken));
        assert_eq!(word(";x"), Some(WordKind::BadToken));
    }

    #[test]
    fn test_token_type_codes() {
        assert_eq!(TokenType::Multiline.code(), 1);
        assert_eq!(TokenType::DataName.code(), 10);
        assert_eq!(TokenType::BadToken.code(), 17);
        assert_eq!(TokenType::Str.to_string(), "STRING");
    }
}
