//! Detokenizer for STAR token streams
//!
//! Renders a token list back into STAR text. Layout is normalized (one
//! structural token or tag per line) but re-tokenizing the output yields the
//! same token classes and values.
use super::tokens::{StarToken, TokenType};

/// Trait for converting a token back to source text
pub trait ToTokenText {
    fn to_token_text(&self) -> String;
}

impl ToTokenText for StarToken<'_> {
    fn to_token_text(&self) -> String {
        match self.kind {
            TokenType::SquoteString => format!("'{}'", self.value),
            TokenType::DquoteString => format!("\"{}\"", self.value),
            // the tokenizer drops one `\r` before the closing line break
            TokenType::Multiline if self.value.ends_with('\r') => format!(";{}\r\n;", self.value),
            TokenType::Multiline => format!(";{}\n;", self.value),
            _ => self.value.to_string(),
        }
    }
}

fn starts_line(token: &StarToken<'_>) -> bool {
    match token.kind {
        TokenType::Global
        | TokenType::DataBlock
        | TokenType::SaveFrame
        | TokenType::Loop
        | TokenType::LoopStop
        | TokenType::DataName
        | TokenType::Multiline => true,
        // a `;word` is only bad at column zero
        TokenType::BadToken => token.value.starts_with(';'),
        _ => false,
    }
}

/// True when nothing may follow `token` on its line
fn ends_line(kind: TokenType) -> bool {
    // a bad token opening with a quote would pair with a later quote on the line
    matches!(
        kind,
        TokenType::Comment | TokenType::Multiline | TokenType::BadToken
    )
}

/// Detokenize a stream of tokens into a string
pub fn detokenize(tokens: &[StarToken<'_>]) -> String {
    let mut result = String::new();

    for token in tokens {
        let at_line_start = result.is_empty() || result.ends_with('\n');
        if !at_line_start {
            result.push(if starts_line(token) { '\n' } else { ' ' });
        } else if token.kind == TokenType::Str && token.value.starts_with(';') {
            // keep a plain `;word` away from column zero
            result.push(' ');
        }
        result.push_str(&token.to_token_text());
        if ends_line(token.kind) {
            result.push('\n');
        }
    }

    result
}
