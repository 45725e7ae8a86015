//! Lexer
//!
//! This module turns STAR text into a lazy stream of typed tokens. The
//! tokenizer never fails: malformed fragments come out as
//! [`TokenType::BadToken`] or [`TokenType::BadConstruct`] tokens and the
//! parser decides what to do with them according to its mode.
//!
//! Structure:
//!     - `tokens`: token classes and the logos word classifier
//!     - `lexer_impl`: the scanner (multi-line strings, comments, quotes, words)
//!     - `detokenizer`: token stream back to text

pub mod detokenizer;
pub mod lexer_impl;
pub mod tokens;

pub use detokenizer::detokenize;
pub use lexer_impl::{classify_word, tokenize, Tokenizer};
pub use tokens::{StarToken, TokenType, WordKind};
