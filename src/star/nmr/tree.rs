//! Typed NEF / NMR-STAR tree
//!
//! Unlike the generic tree, tags here are stored without their prefix: a save
//! frame of category `nef_nmr_meta_data` holds `sf_category`, not
//! `_nef_nmr_meta_data.sf_category`, and a loop stores its category as its name
//! and bare column names. Prefixes are re-added on output from
//! [`NmrSaveFrame::tag_prefix`] and [`NmrLoop::tag_prefix`].
//!
//! The builders on these types are also the way to assemble a new document for
//! writing.

use super::framecode::string_to_framecode;
use super::value::NmrValue;
use indexmap::IndexMap;
use serde::Serialize;

pub const SF_CATEGORY: &str = "sf_category";
pub const SF_FRAMECODE: &str = "sf_framecode";

/// One loop row: column name → value
pub type NmrRow = IndexMap<String, NmrValue>;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct NmrLoop {
    /// The loop category, without leading underscore
    pub name: String,
    pub columns: Vec<String>,
    pub data: Vec<NmrRow>,
}

impl NmrLoop {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            data: Vec::new(),
        }
    }

    /// Loop category, the same as its name
    pub fn category(&self) -> &str {
        &self.name
    }

    /// Prefix written before each column name
    pub fn tag_prefix(&self) -> String {
        format!("_{}.", self.name)
    }

    /// Append a row built from positional values. Missing trailing values are null.
    pub fn new_row<V: Into<NmrValue>>(&mut self, values: impl IntoIterator<Item = V>) -> &mut NmrRow {
        let mut values = values.into_iter();
        let row = self
            .columns
            .iter()
            .map(|column| (column.clone(), values.next().map_or(NmrValue::Null, Into::into)))
            .collect();
        self.data.push(row);
        let last = self.data.len() - 1;
        &mut self.data[last]
    }

    pub fn row_count(&self) -> usize {
        self.data.len()
    }

    pub fn column<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a NmrValue> + 'a {
        self.data.iter().filter_map(move |row| row.get(name))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NmrEntry {
    Value(NmrValue),
    Loop(NmrLoop),
}

impl NmrEntry {
    pub fn as_value(&self) -> Option<&NmrValue> {
        match self {
            NmrEntry::Value(value) => Some(value),
            NmrEntry::Loop(_) => None,
        }
    }

    pub fn as_loop(&self) -> Option<&NmrLoop> {
        match self {
            NmrEntry::Loop(table) => Some(table),
            NmrEntry::Value(_) => None,
        }
    }
}

/// Save frame keyed by its framecode, holding prefix-less tags and loops
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct NmrSaveFrame {
    /// The framecode
    pub name: String,
    pub category: String,
    entries: IndexMap<String, NmrEntry>,
}

impl NmrSaveFrame {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            entries: IndexMap::new(),
        }
    }

    /// Prefix written before each item tag
    pub fn tag_prefix(&self) -> String {
        format!("_{}.", self.category)
    }

    /// Framecode without the leading `<category>_`
    pub fn object_name(&self) -> &str {
        self.name
            .strip_prefix(self.category.as_str())
            .map(|rest| rest.strip_prefix('_').unwrap_or(rest))
            .unwrap_or(&self.name)
    }

    /// Add a tagged value. Returns false, leaving the frame unchanged, if the tag exists.
    pub fn add_item(&mut self, tag: impl Into<String>, value: impl Into<NmrValue>) -> bool {
        let tag = tag.into();
        if self.entries.contains_key(&tag) {
            return false;
        }
        self.entries.insert(tag, NmrEntry::Value(value.into()));
        true
    }

    /// Set a tagged value, replacing any previous binding
    pub fn set(&mut self, tag: impl Into<String>, value: impl Into<NmrValue>) {
        self.entries.insert(tag.into(), NmrEntry::Value(value.into()));
    }

    /// Add a loop under its name. Returns false if the name is taken.
    pub fn add_loop(&mut self, table: NmrLoop) -> bool {
        if self.entries.contains_key(&table.name) {
            return false;
        }
        self.entries.insert(table.name.clone(), NmrEntry::Loop(table));
        true
    }

    /// Make a new empty loop in this frame, replacing any previous binding of `name`
    pub fn new_loop(&mut self, name: impl Into<String>, columns: Vec<String>) -> &mut NmrLoop {
        let name = name.into();
        let (index, _) = self
            .entries
            .insert_full(name.clone(), NmrEntry::Loop(NmrLoop::new(name, columns)));
        match &mut self.entries[index] {
            NmrEntry::Loop(table) => table,
            NmrEntry::Value(_) => unreachable!("entry was just bound to a loop"),
        }
    }

    pub fn get(&self, key: &str) -> Option<&NmrEntry> {
        self.entries.get(key)
    }

    pub fn value(&self, key: &str) -> Option<&NmrValue> {
        self.get(key).and_then(NmrEntry::as_value)
    }

    /// String value of `key`, if it is a string
    pub fn str_value(&self, key: &str) -> Option<&str> {
        self.value(key).and_then(NmrValue::as_str)
    }

    pub fn get_loop(&self, key: &str) -> Option<&NmrLoop> {
        self.get(key).and_then(NmrEntry::as_loop)
    }

    pub fn get_loop_mut(&mut self, key: &str) -> Option<&mut NmrLoop> {
        match self.entries.get_mut(key) {
            Some(NmrEntry::Loop(table)) => Some(table),
            _ => None,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn items(&self) -> impl Iterator<Item = (&str, &NmrEntry)> + '_ {
        self.entries.iter().map(|(key, entry)| (key.as_str(), entry))
    }

    pub fn loops(&self) -> impl Iterator<Item = &NmrLoop> + '_ {
        self.entries.values().filter_map(NmrEntry::as_loop)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Data block: framecode → save frame
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct NmrDataBlock {
    pub name: String,
    save_frames: IndexMap<String, NmrSaveFrame>,
}

impl NmrDataBlock {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            save_frames: IndexMap::new(),
        }
    }

    /// Make a new save frame carrying `sf_category` and `sf_framecode`.
    ///
    /// The name is sanitized with [`string_to_framecode`] first. Any frame
    /// already stored under that name is replaced.
    pub fn new_save_frame(&mut self, name: &str, category: &str) -> &mut NmrSaveFrame {
        let name = string_to_framecode(name);
        let mut frame = NmrSaveFrame::new(name.clone(), category);
        frame.set(SF_CATEGORY, category);
        frame.set(SF_FRAMECODE, name.as_str());
        let (index, _) = self.save_frames.insert_full(name, frame);
        &mut self.save_frames[index]
    }

    /// Add an existing frame keyed by its `sf_framecode` (or its name when it
    /// has none). Returns the frame previously stored under that key.
    pub fn add_save_frame(&mut self, frame: NmrSaveFrame) -> Option<NmrSaveFrame> {
        let key = frame
            .str_value(SF_FRAMECODE)
            .map_or_else(|| frame.name.clone(), str::to_string);
        self.save_frames.insert(key, frame)
    }

    pub fn get(&self, framecode: &str) -> Option<&NmrSaveFrame> {
        self.save_frames.get(framecode)
    }

    pub fn get_mut(&mut self, framecode: &str) -> Option<&mut NmrSaveFrame> {
        self.save_frames.get_mut(framecode)
    }

    pub fn contains_key(&self, framecode: &str) -> bool {
        self.save_frames.contains_key(framecode)
    }

    pub fn save_frames(&self) -> impl Iterator<Item = &NmrSaveFrame> + '_ {
        self.save_frames.values()
    }

    /// Frames of one category, in file order
    pub fn frames_of_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a NmrSaveFrame> + 'a {
        self.save_frames
            .values()
            .filter(move |frame| frame.category == category)
    }

    pub fn len(&self) -> usize {
        self.save_frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.save_frames.is_empty()
    }
}

/// Converted document: block name → block
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct NmrDataExtent {
    pub name: String,
    blocks: IndexMap<String, NmrDataBlock>,
}

impl NmrDataExtent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            blocks: IndexMap::new(),
        }
    }

    /// Add a block keyed by its name. Returns the block previously stored there.
    pub fn add_block(&mut self, block: NmrDataBlock) -> Option<NmrDataBlock> {
        self.blocks.insert(block.name.clone(), block)
    }

    pub fn get(&self, name: &str) -> Option<&NmrDataBlock> {
        self.blocks.get(name)
    }

    pub fn blocks(&self) -> impl Iterator<Item = &NmrDataBlock> + '_ {
        self.blocks.values()
    }

    /// The first block; NEF documents have exactly one
    pub fn first_block(&self) -> Option<&NmrDataBlock> {
        self.blocks.values().next()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
