//! Lazy STAR tokenizer
//!
//! The scanner walks the source once. At each word start it first tries the
//! context-dependent shapes (multi-line string at line start, comment, quoted
//! string) and otherwise hands the word to the logos [`WordKind`] lexer.
//!
//! A token always starts at line start or after whitespace and always ends
//! before whitespace or at end of input, so the gaps between token spans are
//! pure whitespace.

use super::tokens::{StarToken, TokenType, WordKind};
use logos::Logos;

/// Forward-only iterator over the tokens of a STAR document
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, pos: 0 }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    fn at_line_start(&self, pos: usize) -> bool {
        pos == 0 || self.source.as_bytes()[pos - 1] == b'\n'
    }

    /// True when `pos` is end of input or followed by whitespace
    fn at_boundary(&self, pos: usize) -> bool {
        self.source[pos..]
            .chars()
            .next()
            .map_or(true, char::is_whitespace)
    }

    fn line_end(&self, from: usize) -> usize {
        self.source[from..]
            .find('\n')
            .map_or(self.source.len(), |offset| from + offset)
    }

    fn scan_multiline(&self, start: usize) -> Option<StarToken<'a>> {
        let bytes = self.source.as_bytes();
        let content_start = start + 1;
        let mut search = content_start;

        while let Some(offset) = self.source[search..].find('\n') {
            let newline = search + offset;
            let close = newline + 1;
            if bytes.get(close) == Some(&b';') && self.at_boundary(close + 1) {
                let mut content_end = newline;
                if content_end > content_start && bytes[content_end - 1] == b'\r' {
                    content_end -= 1;
                }
                return Some(StarToken::new(
                    TokenType::Multiline,
                    &self.source[content_start..content_end],
                    start..close + 1,
                ));
            }
            search = close;
        }
        None
    }

    fn scan_comment(&self, start: usize) -> StarToken<'a> {
        let mut end = self.line_end(start);
        if end > start && self.source.as_bytes()[end - 1] == b'\r' {
            end -= 1;
        }
        StarToken::new(TokenType::Comment, &self.source[start..end], start..end)
    }

    fn scan_quoted(&self, start: usize, quote: u8) -> Option<StarToken<'a>> {
        let content_start = start + 1;
        let line_end = self.line_end(content_start);
        let kind = if quote == b'\'' {
            TokenType::SquoteString
        } else {
            TokenType::DquoteString
        };

        // The first matching quote followed by whitespace closes the string
        self.source.as_bytes()[content_start..line_end]
            .iter()
            .enumerate()
            .find(|(offset, byte)| {
                **byte == quote && self.at_boundary(content_start + offset + 1)
            })
            .map(|(offset, _)| {
                let close = content_start + offset;
                StarToken::new(kind, &self.source[content_start..close], start..close + 1)
            })
    }

    fn scan_word(&self, start: usize) -> StarToken<'a> {
        let end = self.source[start..]
            .find(char::is_whitespace)
            .map_or(self.source.len(), |offset| start + offset);
        let word = &self.source[start..end];
        let kind = classify_word(word, self.at_line_start(start));
        StarToken::new(kind, word, start..end)
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = StarToken<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.source[self.pos..];
        let trimmed = rest.trim_start();
        self.pos += rest.len() - trimmed.len();

        let start = self.pos;
        let token = match trimmed.as_bytes().first()? {
            b';' if self.at_line_start(start) => self.scan_multiline(start),
            b'#' => Some(self.scan_comment(start)),
            quote @ (b'\'' | b'"') => self.scan_quoted(start, *quote),
            _ => None,
        }
        .unwrap_or_else(|| self.scan_word(start));

        self.pos = token.span.end;
        Some(token)
    }
}

/// Classify a single word that contains no whitespace.
///
/// `at_line_start` matters only for words starting with `;`, which are plain
/// strings unless they sit at the start of a line.
pub fn classify_word(word: &str, at_line_start: bool) -> TokenType {
    let mut lexer = WordKind::lexer(word);
    let kind = match lexer.next() {
        Some(Ok(kind)) if lexer.span().end == word.len() => TokenType::from(kind),
        _ => TokenType::BadToken,
    };

    if kind == TokenType::BadToken && word.starts_with(';') && !at_line_start {
        TokenType::Str
    } else {
        kind
    }
}

/// Tokenize a whole document
pub fn tokenize(source: &str) -> Vec<StarToken<'_>> {
    Tokenizer::new(source).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<(TokenType, &str)> {
        tokenize(source)
            .into_iter()
            .map(|token| (token.kind, token.value))
            .collect()
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(tokenize(""), vec![]);
        assert_eq!(tokenize("  \n\t "), vec![]);
    }

    #[test]
    fn test_item_line() {
        assert_eq!(
            kinds("_a.b  value"),
            vec![(TokenType::DataName, "_a.b"), (TokenType::Str, "value")]
        );
    }

    #[test]
    fn test_quoted_strings() {
        assert_eq!(
            kinds(r#"'single quoted' "double quoted""#),
            vec![
                (TokenType::SquoteString, "single quoted"),
                (TokenType::DquoteString, "double quoted"),
            ]
        );
    }

    #[test]
    fn test_quote_inside_quoted_string() {
        assert_eq!(
            kinds("'it's here' x"),
            vec![(TokenType::SquoteString, "it's here"), (TokenType::Str, "x")]
        );
    }

    #[test]
    fn test_unterminated_quote_is_bad_token() {
        assert_eq!(
            kinds("'open words\nnext"),
            vec![
                (TokenType::BadToken, "'open"),
                (TokenType::Str, "words"),
                (TokenType::Str, "next"),
            ]
        );
    }

    #[test]
    fn test_quote_not_followed_by_space_does_not_close() {
        assert_eq!(kinds("'a'b'"), vec![(TokenType::SquoteString, "a'b")]);
    }

    #[test]
    fn test_comment() {
        assert_eq!(
            kinds("# a comment\r\n_x y # trailing"),
            vec![
                (TokenType::Comment, "# a comment"),
                (TokenType::DataName, "_x"),
                (TokenType::Str, "y"),
                (TokenType::Comment, "# trailing"),
            ]
        );
    }

    #[test]
    fn test_hash_inside_word_is_not_comment() {
        assert_eq!(kinds("a#b"), vec![(TokenType::Str, "a#b")]);
    }

    #[test]
    fn test_multiline_string() {
        let source = "_x\n;line one\nline two\n;\n_y z";
        assert_eq!(
            kinds(source),
            vec![
                (TokenType::DataName, "_x"),
                (TokenType::Multiline, "line one\nline two"),
                (TokenType::DataName, "_y"),
                (TokenType::Str, "z"),
            ]
        );
    }

    #[test]
    fn test_multiline_crlf() {
        assert_eq!(
            kinds(";abc\r\n;\r\n"),
            vec![(TokenType::Multiline, "abc")]
        );
    }

    #[test]
    fn test_empty_multiline() {
        assert_eq!(kinds(";\n;"), vec![(TokenType::Multiline, "")]);
    }

    #[test]
    fn test_multiline_closing_needs_boundary() {
        // `;x` on a line start does not close the string
        assert_eq!(
            kinds(";a\n;x\n;\n"),
            vec![(TokenType::Multiline, "a\n;x")]
        );
    }

    #[test]
    fn test_unterminated_multiline() {
        assert_eq!(
            kinds(";abc\ndef"),
            vec![(TokenType::BadToken, ";abc"), (TokenType::Str, "def")]
        );
    }

    #[test]
    fn test_semicolon_inside_line_is_string() {
        assert_eq!(
            kinds("x ;abc"),
            vec![(TokenType::Str, "x"), (TokenType::Str, ";abc")]
        );
    }

    #[test]
    fn test_spans_cover_delimiters() {
        let tokens = tokenize("  'ab'  ");
        assert_eq!(tokens[0].span, 2..6);
        assert_eq!(tokens[0].value, "ab");
    }

    #[test]
    fn test_tokenizer_is_restartable() {
        let tokenizer = Tokenizer::new("data_a loop_ _x 1 2");
        let first: Vec<_> = tokenizer.clone().collect();
        let second: Vec<_> = tokenizer.collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 5);
    }

    #[test]
    fn test_unicode_content() {
        assert_eq!(
            kinds("_name 'Ångström ü' ß"),
            vec![
                (TokenType::DataName, "_name"),
                (TokenType::SquoteString, "Ångström ü"),
                (TokenType::Str, "ß"),
            ]
        );
    }
}
