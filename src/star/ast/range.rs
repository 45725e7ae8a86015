//! Source positions
//!
//! Tokens carry byte spans. Diagnostics and errors report 1-based line and
//! column numbers, computed on demand through [`SourceLocation`].

use std::fmt;
use std::ops::Range as ByteRange;

/// 1-based line and column (columns count characters, not bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A byte span with its start and end positions
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Range {
    pub span: ByteRange<usize>,
    pub start: Position,
    pub end: Position,
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Byte offset to line/column conversion for one source text
#[derive(Debug, Clone)]
pub struct SourceLocation<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> SourceLocation<'a> {
    pub fn new(source: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(offset, _)| offset + 1))
            .collect();
        Self {
            source,
            line_starts,
        }
    }

    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.source.len());
        let line = self
            .line_starts
            .binary_search(&offset)
            .unwrap_or_else(|next| next - 1);
        let line_start = self.line_starts[line];
        let column = self
            .source
            .get(line_start..offset)
            .map_or(offset - line_start, |text| text.chars().count());
        Position::new(line + 1, column + 1)
    }

    pub fn range(&self, span: &ByteRange<usize>) -> Range {
        Range {
            span: span.clone(),
            start: self.position(span.start),
            end: self.position(span.end),
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}
