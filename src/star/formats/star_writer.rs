//! STAR text output
//!
//! Writes both tree families back to STAR text. Output is meant to be re-read:
//! any string that would tokenize as something other than a plain string
//! (reserved words, sentinels, numbers, leading special characters) is quoted,
//! so parsing the output yields the values that were written.
//!
//! One kind of text has no STAR spelling at all: a line break followed by `;`
//! and whitespace (or the end of the text) would close a `;` field early, and
//! the quoted forms cannot hold line breaks. Writing such a value fails with
//! [`FormatError::Unwritable`].

use super::registry::FormatError;
use super::ToStarString;
use crate::star::ast::{Container, DataBlock, DataExtent, Entry, Loop, SaveFrame, StarValue};
use crate::star::lexer::{classify_word, TokenType};
use crate::star::nmr::value::parse_number;
use crate::star::nmr::{NmrDataBlock, NmrDataExtent, NmrEntry, NmrLoop, NmrSaveFrame, NmrValue};
use crate::star::ast::{FALSE_STRING, TRUE_STRING};

/// Indentation used by [`StarWriter`]
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct WriterOptions {
    /// Indentation of items and `loop_` / `stop_` inside a save frame
    pub indent: usize,
    /// Indentation of loop columns and rows
    pub loop_indent: usize,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            indent: 3,
            loop_indent: 6,
        }
    }
}

impl WriterOptions {
    pub fn new(indent: usize, loop_indent: usize) -> Self {
        Self {
            indent,
            loop_indent,
        }
    }
}

/// True when `text` can be quoted with `quote` on a single line
fn fits_quote(text: &str, quote: char) -> bool {
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == quote && chars.peek().map_or(false, |next| next.is_whitespace()) {
            return false;
        }
    }
    true
}

/// True when a line of `text` starts with `;` followed by whitespace or the end
fn closes_text_field(text: &str) -> bool {
    text.match_indices("\n;").any(|(at, _)| {
        text[at + 2..]
            .chars()
            .next()
            .map_or(true, char::is_whitespace)
    })
}

/// Quote `text` unconditionally, choosing the lightest form that re-reads exactly
pub fn quote_string(text: &str) -> Result<String, FormatError> {
    if !text.contains(['\n', '\r']) {
        if fits_quote(text, '\'') {
            return Ok(format!("'{}'", text));
        }
        if fits_quote(text, '"') {
            return Ok(format!("\"{}\"", text));
        }
    }
    if closes_text_field(text) {
        return Err(FormatError::Unwritable(text.to_string()));
    }
    // the reader drops one `\r` before the closing line break
    if text.ends_with('\r') {
        Ok(format!(";{}\r\n;", text))
    } else {
        Ok(format!(";{}\n;", text))
    }
}

/// True when a bare `text` would not re-read as the same plain string
fn needs_quotes(text: &str) -> bool {
    text.is_empty()
        || text.contains(char::is_whitespace)
        || text.starts_with('#')
        || classify_word(text, true) != TokenType::Str
        || text == TRUE_STRING
        || text == FALSE_STRING
        || parse_number(text).is_some()
}

/// Format a string value: bare when that is unambiguous, quoted otherwise
pub fn format_string(text: &str) -> Result<String, FormatError> {
    if needs_quotes(text) {
        quote_string(text)
    } else {
        Ok(text.to_string())
    }
}

impl ToStarString for StarValue {
    fn to_star_string(&self) -> Result<String, FormatError> {
        match self {
            StarValue::Quoted(text) => quote_string(text),
            StarValue::Unquoted(text) => Ok(text.clone()),
        }
    }
}

impl ToStarString for NmrValue {
    fn to_star_string(&self) -> Result<String, FormatError> {
        match self {
            NmrValue::Str(text) => format_string(text),
            other => Ok(other.to_string()),
        }
    }
}

fn format_row<'v, V: ToStarString + 'v>(
    values: impl Iterator<Item = &'v V>,
) -> Result<Vec<String>, FormatError> {
    values.map(ToStarString::to_star_string).collect()
}

fn is_multiline(formatted: &str) -> bool {
    formatted.starts_with(';') && formatted.ends_with("\n;")
}

/// Writer for generic and typed trees
#[derive(Debug, Clone, Default)]
pub struct StarWriter {
    options: WriterOptions,
}

impl StarWriter {
    pub fn new(options: WriterOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    fn indent(&self) -> String {
        " ".repeat(self.options.indent)
    }

    fn push_items(&self, out: &mut String, items: &[(String, String)]) {
        let indent = self.indent();
        let width = items
            .iter()
            .filter(|(_, value)| !is_multiline(value))
            .map(|(tag, _)| tag.chars().count())
            .max()
            .unwrap_or(0);

        for (tag, value) in items {
            if is_multiline(value) {
                out.push_str(&format!("{}{}\n{}\n", indent, tag, value));
            } else {
                out.push_str(&format!("{}{:<width$} {}\n", indent, tag, value, width = width));
            }
        }
    }

    fn push_loop(&self, out: &mut String, columns: &[String], rows: &[Vec<String>]) {
        if columns.is_empty() {
            return;
        }
        let indent = self.indent();
        let inner = " ".repeat(self.options.loop_indent);

        out.push_str(&format!("\n{}loop_\n", indent));
        for column in columns {
            out.push_str(&format!("{}{}\n", inner, column));
        }
        out.push('\n');

        for row in rows {
            let mut line = String::new();
            for value in row {
                if is_multiline(value) {
                    if !line.is_empty() {
                        out.push_str(&format!("{}{}\n", inner, line));
                        line.clear();
                    }
                    out.push_str(value);
                    out.push('\n');
                } else {
                    if !line.is_empty() {
                        line.push(' ');
                    }
                    line.push_str(value);
                }
            }
            if !line.is_empty() {
                out.push_str(&format!("{}{}\n", inner, line));
            }
        }
        out.push_str(&format!("\n{}stop_\n", indent));
    }

    /// Items and loops of a generic container, in entry order
    fn push_container<C: Container>(&self, out: &mut String, container: &C) -> Result<(), FormatError> {
        let mut items = Vec::new();
        for (key, entry) in container.entries() {
            match entry {
                Entry::Value(value) => items.push((key.clone(), value.to_star_string()?)),
                Entry::Loop(slot) if slot.primary => {
                    self.push_items(out, &items);
                    items.clear();
                    if let Some(table) = container.loop_arena().get(slot.index) {
                        self.push_generic_loop(out, table)?;
                    }
                }
                Entry::SaveFrame(index) => {
                    self.push_items(out, &items);
                    items.clear();
                    if let Some(frame) = container.frame_arena().get(*index) {
                        out.push('\n');
                        out.push_str(&self.write_save_frame(frame)?);
                    }
                }
                Entry::Loop(_) => {}
            }
        }
        self.push_items(out, &items);
        Ok(())
    }

    fn push_generic_loop(&self, out: &mut String, table: &Loop) -> Result<(), FormatError> {
        let rows = table
            .data
            .iter()
            .map(|row| format_row(row.values()))
            .collect::<Result<Vec<_>, _>>()?;
        self.push_loop(out, &table.columns, &rows);
        Ok(())
    }

    pub fn write_loop(&self, table: &Loop) -> Result<String, FormatError> {
        let mut out = String::new();
        self.push_generic_loop(&mut out, table)?;
        Ok(out)
    }

    pub fn write_save_frame(&self, frame: &SaveFrame) -> Result<String, FormatError> {
        let mut out = format!("{}\n", frame.name);
        self.push_container(&mut out, frame)?;
        out.push_str("save_\n");
        Ok(out)
    }

    pub fn write_block(&self, block: &DataBlock) -> Result<String, FormatError> {
        let mut out = format!("{}\n", block.name);
        self.push_container(&mut out, block)?;
        Ok(out)
    }

    pub fn write_extent(&self, extent: &DataExtent) -> Result<String, FormatError> {
        Ok(extent
            .blocks()
            .map(|block| self.write_block(block))
            .collect::<Result<Vec<_>, _>>()?
            .join("\n"))
    }

    fn push_nmr_loop(&self, out: &mut String, table: &NmrLoop) -> Result<(), FormatError> {
        let prefix = table.tag_prefix();
        let columns: Vec<String> = table
            .columns
            .iter()
            .map(|column| format!("{}{}", prefix, column))
            .collect();
        let rows = table
            .data
            .iter()
            .map(|row| format_row(row.values()))
            .collect::<Result<Vec<_>, _>>()?;
        self.push_loop(out, &columns, &rows);
        Ok(())
    }

    pub fn write_nmr_loop(&self, table: &NmrLoop) -> Result<String, FormatError> {
        let mut out = String::new();
        self.push_nmr_loop(&mut out, table)?;
        Ok(out)
    }

    pub fn write_nmr_save_frame(&self, frame: &NmrSaveFrame) -> Result<String, FormatError> {
        let prefix = frame.tag_prefix();
        let mut out = format!("save_{}\n", frame.name);
        let mut items = Vec::new();
        for (tag, entry) in frame.items() {
            match entry {
                NmrEntry::Value(value) => {
                    items.push((format!("{}{}", prefix, tag), value.to_star_string()?))
                }
                NmrEntry::Loop(table) => {
                    self.push_items(&mut out, &items);
                    items.clear();
                    self.push_nmr_loop(&mut out, table)?;
                }
            }
        }
        self.push_items(&mut out, &items);
        out.push_str("save_\n");
        Ok(out)
    }

    pub fn write_nmr_block(&self, block: &NmrDataBlock) -> Result<String, FormatError> {
        let header = if block.name == "global" {
            "global_".to_string()
        } else {
            format!("data_{}", block.name)
        };
        let mut out = format!("{}\n", header);
        for frame in block.save_frames() {
            out.push('\n');
            out.push_str(&self.write_nmr_save_frame(frame)?);
        }
        Ok(out)
    }

    pub fn write_nmr_extent(&self, extent: &NmrDataExtent) -> Result<String, FormatError> {
        Ok(extent
            .blocks()
            .map(|block| self.write_nmr_block(block))
            .collect::<Result<Vec<_>, _>>()?
            .join("\n"))
    }
}

impl ToStarString for Loop {
    fn to_star_string(&self) -> Result<String, FormatError> {
        StarWriter::default().write_loop(self)
    }
}

impl ToStarString for SaveFrame {
    fn to_star_string(&self) -> Result<String, FormatError> {
        StarWriter::default().write_save_frame(self)
    }
}

impl ToStarString for DataBlock {
    fn to_star_string(&self) -> Result<String, FormatError> {
        StarWriter::default().write_block(self)
    }
}

impl ToStarString for DataExtent {
    fn to_star_string(&self) -> Result<String, FormatError> {
        StarWriter::default().write_extent(self)
    }
}

impl ToStarString for NmrLoop {
    fn to_star_string(&self) -> Result<String, FormatError> {
        StarWriter::default().write_nmr_loop(self)
    }
}

impl ToStarString for NmrSaveFrame {
    fn to_star_string(&self) -> Result<String, FormatError> {
        StarWriter::default().write_nmr_save_frame(self)
    }
}

impl ToStarString for NmrDataBlock {
    fn to_star_string(&self) -> Result<String, FormatError> {
        StarWriter::default().write_nmr_block(self)
    }
}

impl ToStarString for NmrDataExtent {
    fn to_star_string(&self) -> Result<String, FormatError> {
        StarWriter::default().write_nmr_extent(self)
    }
}
