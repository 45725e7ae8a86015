//! Generic STAR tree → typed NEF / NMR-STAR tree
//!
//! [`StarDataConverter::pre_validate`] walks the generic tree read-only and
//! stops at the first dialect violation. [`StarDataConverter::convert`] then
//! builds the typed tree. Every check that could make conversion fail lives in
//! the first pass, so converting a validated tree does not fail.
//!
//! Both passes keep a stack of container names (block, frame, tag, loop) that
//! becomes the context of any [`ValidationError`].

use super::error::ValidationError;
use super::tree::{NmrDataBlock, NmrDataExtent, NmrLoop, NmrSaveFrame, SF_CATEGORY, SF_FRAMECODE};
use super::value::IntoNmrValue;
use crate::star::ast::{Container, DataBlock, DataExtent, Entry, Item, Loop, SaveFrame};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, trace};

/// Block name given to a bare `data_` block
pub const MISSING_BLOCK_NAME: &str = "__MissingDataBlockName";

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\p{XID_Start}_]\p{XID_Continue}*$").expect("identifier pattern is valid")
});

/// Identifiers a column name may not take after sanitization
static RESERVED_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // strict
        "as", "break", "const", "continue", "crate", "else", "enum", "extern", "false", "fn",
        "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref",
        "return", "self", "Self", "static", "struct", "super", "trait", "true", "type",
        "unsafe", "use", "where", "while", "async", "await", "dyn",
        // reserved
        "abstract", "become", "box", "do", "final", "macro", "override", "priv", "typeof",
        "unsized", "virtual", "yield", "try",
    ]
    .into_iter()
    .collect()
});

/// Which dialect rules apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// Tag prefixes must equal `sf_category` and framecodes start with it
    #[default]
    Nef,
    /// Free-form tag prefixes
    NmrStar,
}

impl FileType {
    pub fn as_str(self) -> &'static str {
        match self {
            FileType::Nef => "nef",
            FileType::NmrStar => "nmrstar",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown file type '{0}' (expected nef or nmrstar)")]
pub struct UnknownFileType(pub String);

impl FromStr for FileType {
    type Err = UnknownFileType;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text.to_ascii_lowercase().as_str() {
            "nef" => Ok(FileType::Nef),
            "nmrstar" | "nmr-star" | "star" => Ok(FileType::NmrStar),
            _ => Err(UnknownFileType(text.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct ConverterOptions {
    pub file_type: FileType,
    /// Sanitize invalid loop column names instead of rejecting them
    pub convert_column_names: bool,
}

impl Default for ConverterOptions {
    fn default() -> Self {
        Self {
            file_type: FileType::Nef,
            convert_column_names: true,
        }
    }
}

impl ConverterOptions {
    pub fn new(file_type: FileType) -> Self {
        Self {
            file_type,
            ..Self::default()
        }
    }

    pub fn with_convert_column_names(mut self, convert_column_names: bool) -> Self {
        self.convert_column_names = convert_column_names;
        self
    }
}

/// Longest common prefix of `names` up to and including its first `.`
fn dotted_prefix<'t>(names: &[&'t str]) -> Option<&'t str> {
    let (first, rest) = names.split_first()?;
    let mut common: &str = first;
    for name in rest {
        let len = common
            .chars()
            .zip(name.chars())
            .take_while(|(a, b)| a == b)
            .map(|(a, _)| a.len_utf8())
            .sum();
        common = &common[..len];
    }
    let dot = common.find('.')?;
    Some(&first[..=dot])
}

fn plain_tags(frame: &SaveFrame) -> Vec<&str> {
    frame
        .entries()
        .iter()
        .filter(|(_, entry)| matches!(entry, Entry::Value(_)))
        .map(|(tag, _)| tag.as_str())
        .collect()
}

/// Loop category and the byte length of the column prefix
fn loop_prefix(table: &Loop) -> Option<(&str, usize)> {
    let columns: Vec<&str> = table.columns.iter().map(String::as_str).collect();
    let prefix = dotted_prefix(&columns)?;
    let category = &prefix[..prefix.len() - 1];
    Some((category.strip_prefix('_').unwrap_or(category), prefix.len()))
}

/// Converter from a generic tree to a NEF or NMR-STAR tree
#[derive(Debug)]
pub struct StarDataConverter<'a> {
    extent: &'a DataExtent,
    options: ConverterOptions,
    stack: Vec<String>,
}

impl<'a> StarDataConverter<'a> {
    pub fn new(extent: &'a DataExtent, options: ConverterOptions) -> Self {
        Self {
            extent,
            options,
            stack: Vec::new(),
        }
    }

    pub fn options(&self) -> &ConverterOptions {
        &self.options
    }

    fn error(&self, message: impl Into<String>) -> ValidationError {
        ValidationError::new(self.stack.clone(), message)
    }

    /// Check every dialect rule without building anything
    pub fn pre_validate(&mut self) -> Result<(), ValidationError> {
        self.stack.clear();
        let extent = self.extent;
        for block in extent.blocks() {
            self.pre_validate_block(block)?;
        }
        debug!(
            blocks = extent.len(),
            file_type = %self.options.file_type,
            "pre-validated STAR tree"
        );
        Ok(())
    }

    /// Build the typed tree. Call after [`Self::pre_validate`] succeeded.
    pub fn convert(&mut self) -> Result<NmrDataExtent, ValidationError> {
        self.stack.clear();
        let extent = self.extent;
        let mut result = NmrDataExtent::new(extent.name.clone());
        for block in extent.blocks() {
            let converted = self.convert_block(block)?;
            result.add_block(converted);
        }
        Ok(result)
    }

    fn pre_validate_block(&mut self, block: &DataBlock) -> Result<(), ValidationError> {
        self.stack.push(block.name.clone());

        if block.name != "global_" && !block.name.starts_with("data_") {
            return Err(self.error("DataBlock name must be 'global_' or start with 'data_'"));
        }

        let mut framecodes = HashSet::new();
        for (key, item) in block.items() {
            let Item::SaveFrame(frame) = item else {
                return Err(self.error(format!(
                    "{} file DataBlock contains non-saveframe element {}",
                    self.options.file_type, key
                )));
            };
            let framecode = self.pre_validate_frame(frame)?;
            if !framecodes.insert(framecode.clone()) {
                return Err(self.error(format!("duplicate sf_framecode {}", framecode)));
            }
        }

        self.stack.pop();
        Ok(())
    }

    fn frame_prefix<'f>(&self, frame: &'f SaveFrame) -> Result<&'f str, ValidationError> {
        let tags = plain_tags(frame);
        dotted_prefix(&tags).ok_or_else(|| {
            self.error(format!(
                "Saveframe tags do not start with a common dot-separated prefix: [{}]",
                tags.join(", ")
            ))
        })
    }

    /// Returns the frame's `sf_framecode`
    fn pre_validate_frame(&mut self, frame: &SaveFrame) -> Result<String, ValidationError> {
        self.stack.push(frame.name.clone());

        let prefix = self.frame_prefix(frame)?;
        let category = frame
            .value(&format!("{}{}", prefix, SF_CATEGORY))
            .ok_or_else(|| self.error("SaveFrame lacks .sf_category item"))?
            .as_str();
        let framecode = frame
            .value(&format!("{}{}", prefix, SF_FRAMECODE))
            .ok_or_else(|| self.error("SaveFrame lacks .sf_framecode item"))?
            .as_str();

        let name = frame.name.strip_prefix("save_").unwrap_or(&frame.name);
        if name.to_lowercase() != framecode.to_lowercase() {
            return Err(self.error(format!(
                "Saveframe.name {} does not match sf_framecode {}",
                name, framecode
            )));
        }

        if self.options.file_type == FileType::Nef {
            if !framecode.starts_with(category) {
                return Err(self.error(format!(
                    "NEF file sf_framecode {} does not start with the sf_category {}",
                    framecode, category
                )));
            }
            if &prefix[1..prefix.len() - 1] != category {
                return Err(self.error(format!(
                    "NEF file sf_category {} does not match tag prefix {}",
                    category, prefix
                )));
            }
        }

        // Converted keys: stripped item tags plus loop categories
        let mut keys: HashSet<&str> = plain_tags(frame)
            .into_iter()
            .map(|tag| &tag[prefix.len()..])
            .collect();
        for (tag, entry) in frame.entries() {
            let Entry::Loop(slot) = entry else {
                continue;
            };
            if !slot.primary {
                continue;
            }
            let Some(table) = frame.loop_arena().get(slot.index) else {
                continue;
            };
            self.stack.push(tag.clone());
            let category = self.pre_validate_loop(table)?;
            if !keys.insert(category) {
                return Err(self.error(format!(
                    "Saveframe contains more than one item named {}",
                    category
                )));
            }
            self.stack.pop();
        }

        self.stack.pop();
        Ok(framecode.to_string())
    }

    /// Returns the loop category
    fn pre_validate_loop<'t>(&mut self, table: &'t Loop) -> Result<&'t str, ValidationError> {
        self.stack.push(table.name.clone());

        let (category, prefix_len) = loop_prefix(table).ok_or_else(|| {
            self.error(format!(
                "Column names of {} do not start with a common dot-separated prefix: [{}]",
                table.name,
                table.columns.join(", ")
            ))
        })?;

        let mut seen = HashSet::new();
        for column in &table.columns {
            let name = self.column_name(column, prefix_len)?;
            if !seen.insert(name.clone()) {
                return Err(self.error(format!(
                    "column name {} (as modified) clashes with another column",
                    column
                )));
            }
        }

        self.stack.pop();
        Ok(category)
    }

    /// Strip the loop prefix from `column` and make sure the rest is an identifier
    fn column_name(&self, column: &str, prefix_len: usize) -> Result<String, ValidationError> {
        let mut name = column[prefix_len..].to_string();

        if name.starts_with('_') || !IDENTIFIER.is_match(&name) {
            if !self.options.convert_column_names {
                return Err(self.error(format!("Invalid column name: {}", column)));
            }
            name = name
                .chars()
                .map(|ch| if ch.is_alphanumeric() { ch } else { '_' })
                .collect::<String>()
                .trim_start_matches('_')
                .to_string();
            if name.is_empty() {
                return Err(self.error(format!(
                    "column name {} is empty after conversion",
                    column
                )));
            }
        }

        if RESERVED_WORDS.contains(name.as_str()) {
            return Err(self.error(format!(
                "column name (as modified) clashes with reserved keyword: {}",
                column
            )));
        }
        Ok(name)
    }

    fn convert_block(&mut self, block: &DataBlock) -> Result<NmrDataBlock, ValidationError> {
        self.stack.push(block.name.clone());

        let name = match block.name.strip_prefix("data_") {
            Some("") => MISSING_BLOCK_NAME,
            Some(rest) => rest,
            None if block.name == "global_" => "global",
            None => block.name.as_str(),
        };
        let mut result = NmrDataBlock::new(name);
        for frame in block.save_frames() {
            let converted = self.convert_frame(frame)?;
            result.add_save_frame(converted);
        }

        debug!(block = %result.name, frames = result.len(), "converted data block");
        self.stack.pop();
        Ok(result)
    }

    fn convert_frame(&mut self, frame: &SaveFrame) -> Result<NmrSaveFrame, ValidationError> {
        self.stack.push(frame.name.clone());

        let prefix = self.frame_prefix(frame)?;
        let reserved = |tag: &str| {
            frame
                .value(&format!("{}{}", prefix, tag))
                .map(|value| value.as_str().to_string())
                .ok_or_else(|| self.error(format!("SaveFrame lacks .{} item", tag)))
        };
        let framecode = reserved(SF_FRAMECODE)?;
        let category = reserved(SF_CATEGORY)?;

        let mut result = NmrSaveFrame::new(framecode, category);
        for (tag, entry) in frame.entries() {
            self.stack.push(tag.clone());
            match entry {
                Entry::Value(value) => {
                    result.add_item(&tag[prefix.len()..], value.into_nmr_value(tag));
                }
                Entry::Loop(slot) if slot.primary => {
                    if let Some(table) = frame.loop_arena().get(slot.index) {
                        let converted = self.convert_loop(table)?;
                        result.add_loop(converted);
                    }
                }
                // secondary keys of a loop already converted, or nothing a frame holds
                _ => {}
            }
            self.stack.pop();
        }

        trace!(frame = %result.name, items = result.len(), "converted save frame");
        self.stack.pop();
        Ok(result)
    }

    fn convert_loop(&mut self, table: &Loop) -> Result<NmrLoop, ValidationError> {
        self.stack.push(table.name.clone());

        let (category, prefix_len) = loop_prefix(table).ok_or_else(|| {
            self.error(format!(
                "Column names of {} do not start with a common dot-separated prefix",
                table.name
            ))
        })?;
        let columns = table
            .columns
            .iter()
            .map(|column| self.column_name(column, prefix_len))
            .collect::<Result<Vec<_>, _>>()?;

        let mut result = NmrLoop::new(category, columns);
        for row in &table.data {
            let values: Vec<_> = row
                .values()
                .zip(&result.columns)
                .map(|(value, column)| value.into_nmr_value(column))
                .collect();
            result.new_row(values);
        }

        trace!(table = %result.name, rows = result.row_count(), "converted loop");
        self.stack.pop();
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::star::nmr::NmrValue;
    use crate::star::parser::{parse, ParseMode, ParserOptions, StarParser};

    const META: &str = "data_test
save_nef_nmr_meta_data
   _nef_nmr_meta_data.sf_category nef_nmr_meta_data
   _nef_nmr_meta_data.sf_framecode nef_nmr_meta_data
   _nef_nmr_meta_data.format_version 1.1
save_
";

    fn run(text: &str, options: ConverterOptions) -> Result<NmrDataExtent, ValidationError> {
        let outcome = parse(text, ParseMode::Strict).expect("parses");
        let mut converter = StarDataConverter::new(&outcome.extent, options);
        converter.pre_validate()?;
        converter.convert()
    }

    fn nef(text: &str) -> Result<NmrDataExtent, ValidationError> {
        run(text, ConverterOptions::default())
    }

    #[test]
    fn test_dotted_prefix() {
        assert_eq!(dotted_prefix(&["_a.b", "_a.c"]), Some("_a."));
        assert_eq!(dotted_prefix(&["_a.b.c", "_a.b.d"]), Some("_a."));
        assert_eq!(dotted_prefix(&["_a.x", "_ab.x"]), None);
        assert_eq!(dotted_prefix(&["_ab"]), None);
        assert_eq!(dotted_prefix(&[]), None);
        assert_eq!(dotted_prefix(&["_é.a", "_é.b"]), Some("_é."));
    }

    #[test]
    fn test_converts_meta_data() {
        let extent = nef(META).expect("valid NEF");
        let block = extent.get("test").expect("block named without data_");
        let frame = block.get("nef_nmr_meta_data").expect("frame");
        assert_eq!(frame.category, "nef_nmr_meta_data");
        assert_eq!(frame.str_value("sf_category"), Some("nef_nmr_meta_data"));
        assert_eq!(frame.value("format_version"), Some(&NmrValue::Float(1.1)));
    }

    #[test]
    fn test_loop_conversion() {
        let text = "data_test
save_nef_molecular_system
   _nef_molecular_system.sf_category nef_molecular_system
   _nef_molecular_system.sf_framecode nef_molecular_system
   loop_
      _nef_sequence.index
      _nef_sequence.chain_code
      _nef_sequence.sequence_code
      _nef_sequence.residue_name
      1 A 10 ALA
      2 A 11 .
   stop_
save_
";
        let extent = nef(text).expect("valid NEF");
        let frame = extent
            .first_block()
            .and_then(|block| block.get("nef_molecular_system"))
            .expect("frame");
        let table = frame.get_loop("nef_sequence").expect("loop");
        assert_eq!(table.columns, vec!["index", "chain_code", "sequence_code", "residue_name"]);
        assert_eq!(table.data[0]["index"], NmrValue::Int(1));
        assert_eq!(table.data[0]["sequence_code"], NmrValue::from("10"));
        assert_eq!(table.data[1]["residue_name"], NmrValue::Null);
        assert_eq!(frame.len(), 3);
    }

    #[test]
    fn test_missing_category() {
        let text = "data_x save_nef_a _nef_a.sf_framecode nef_a save_";
        let error = nef(text).expect_err("invalid");
        assert_eq!(error.context, vec!["data_x", "save_nef_a"]);
        assert_eq!(error.message, "SaveFrame lacks .sf_category item");
    }

    #[test]
    fn test_nef_prefix_must_equal_category() {
        let text = "data_x save_nef_a _other.sf_category nef_a _other.sf_framecode nef_a save_";
        let error = nef(text).expect_err("prefix differs from category");
        assert!(error.message.contains("does not match tag prefix"));

        // NMR-STAR does not care
        assert!(run(text, ConverterOptions::new(FileType::NmrStar)).is_ok());
    }

    #[test]
    fn test_framecode_must_start_with_category() {
        let text = "data_x save_b_1 _a.sf_category a _a.sf_framecode b_1 save_";
        let error = nef(text).expect_err("bad framecode");
        assert!(error.message.contains("does not start with the sf_category"));
    }

    #[test]
    fn test_framecode_must_match_name() {
        let text = "data_x save_a_1 _a.sf_category a _a.sf_framecode a_2 save_";
        let error = nef(text).expect_err("name mismatch");
        assert!(error.message.starts_with("Saveframe.name a_1"));
    }

    #[test]
    fn test_block_must_hold_only_frames() {
        let error = nef("data_x _a.b 1").expect_err("item in block");
        assert_eq!(error.context, vec!["data_x"]);
        assert!(error.message.starts_with("nef file DataBlock contains non-saveframe element _a.b"));
    }

    #[test]
    fn test_column_sanitization() {
        let text = "data_x save_a _a.sf_category a _a.sf_framecode a
            loop_ _t.x-y _t.__z 1 2 stop_ save_";
        let extent = nef(text).expect("sanitized");
        let table = extent
            .first_block()
            .and_then(|block| block.get("a"))
            .and_then(|frame| frame.get_loop("t"))
            .expect("loop");
        assert_eq!(table.columns, vec!["x_y", "z"]);

        let strict = ConverterOptions::default().with_convert_column_names(false);
        let error = run(text, strict).expect_err("not sanitized");
        assert_eq!(error.message, "Invalid column name: _t.x-y");
        assert_eq!(error.context, vec!["data_x", "save_a", "_t.x-y", "_t.x-y"]);
    }

    #[test]
    fn test_reserved_column_rejected() {
        let text = "data_x save_a _a.sf_category a _a.sf_framecode a
            loop_ _t.type _t.value 1 2 stop_ save_";
        let error = nef(text).expect_err("keyword");
        assert!(error.message.contains("reserved keyword: _t.type"));
    }

    #[test]
    fn test_loop_without_common_prefix() {
        let text = "data_x save_a _a.sf_category a _a.sf_framecode a
            loop_ _t.x _u.y 1 2 stop_ save_";
        let error = nef(text).expect_err("mixed loop");
        assert!(error.message.starts_with("Column names of _t.x"));
    }

    #[test]
    fn test_block_names() {
        let text = "save_a _a.sf_category a _a.sf_framecode a save_";
        let outcome = parse(text, ParseMode::Lenient).expect("parses");
        let mut converter = StarDataConverter::new(&outcome.extent, ConverterOptions::default());
        converter.pre_validate().expect("valid");
        let extent = converter.convert().expect("converts");
        assert!(extent.get(MISSING_BLOCK_NAME).is_some());

        let extent = nef("global_ save_a _a.sf_category a _a.sf_framecode a save_").expect("valid");
        assert!(extent.get("global").is_some());
    }

    #[test]
    fn test_duplicate_framecode() {
        let text = "data_x save_a _a.sf_category a _a.sf_framecode a save_
            save_A _a.sf_category a _a.sf_framecode a save_";
        let parser = StarParser::new(ParserOptions::new(ParseMode::Strict).with_lowercase_tags(false));
        let outcome = parser.parse(text).expect("distinct frame names");
        let mut converter = StarDataConverter::new(&outcome.extent, ConverterOptions::default());
        let error = converter.pre_validate().expect_err("same framecode twice");
        assert_eq!(error.message, "duplicate sf_framecode a");
    }

    #[test]
    fn test_file_type_from_str() {
        assert_eq!("NEF".parse::<FileType>(), Ok(FileType::Nef));
        assert_eq!("nmrstar".parse::<FileType>(), Ok(FileType::NmrStar));
        assert!("cif".parse::<FileType>().is_err());
    }
}
