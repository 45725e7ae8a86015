//! Generic STAR containers
//!
//! The tree is `DataExtent → DataBlock → SaveFrame / Loop → value`. Every
//! container keeps insertion order.
//!
//! A loop is stored once, in the loop arena of the container that owns it, and
//! registered under each of its column names. The first key registered for a
//! loop is flagged as primary, which lets a traversal visit each loop exactly
//! once while lookups through any column return the same [`Loop`].

use super::value::StarValue;
use indexmap::IndexMap;

/// One loop row: column name → value
pub type LoopRow = IndexMap<String, StarValue>;

/// A STAR table
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Loop {
    /// First column name, the loop's canonical name
    pub name: String,
    pub columns: Vec<String>,
    pub data: Vec<LoopRow>,
}

impl Loop {
    pub fn new(columns: Vec<String>) -> Self {
        let name = columns.first().cloned().unwrap_or_default();
        Self {
            name,
            columns,
            data: Vec::new(),
        }
    }

    /// Append a row. Values are paired with columns positionally.
    pub fn add_row(&mut self, values: impl IntoIterator<Item = StarValue>) {
        let row = self.columns.iter().cloned().zip(values).collect();
        self.data.push(row);
    }

    pub fn row_count(&self) -> usize {
        self.data.len()
    }

    /// Values of one column, in row order
    pub fn column<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a StarValue> + 'a {
        self.data.iter().filter_map(move |row| row.get(name))
    }
}

/// Arena position of a loop plus whether this key is the loop's primary key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSlot {
    pub index: usize,
    pub primary: bool,
}

/// What a container key is bound to
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Value(StarValue),
    Loop(LoopSlot),
    SaveFrame(usize),
}

/// A resolved entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Item<'a> {
    Value(&'a StarValue),
    Loop(&'a Loop),
    SaveFrame(&'a SaveFrame),
}

impl<'a> Item<'a> {
    pub fn as_value(self) -> Option<&'a StarValue> {
        match self {
            Item::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_loop(self) -> Option<&'a Loop> {
        match self {
            Item::Loop(table) => Some(table),
            _ => None,
        }
    }

    pub fn as_save_frame(self) -> Option<&'a SaveFrame> {
        match self {
            Item::SaveFrame(frame) => Some(frame),
            _ => None,
        }
    }
}

/// Read access shared by data blocks and save frames
pub trait Container {
    fn name(&self) -> &str;
    fn entries(&self) -> &IndexMap<String, Entry>;
    fn loop_arena(&self) -> &[Loop];

    fn frame_arena(&self) -> &[SaveFrame] {
        &[]
    }

    fn resolve<'a>(&'a self, entry: &'a Entry) -> Option<Item<'a>> {
        match entry {
            Entry::Value(value) => Some(Item::Value(value)),
            Entry::Loop(slot) => self.loop_arena().get(slot.index).map(Item::Loop),
            Entry::SaveFrame(index) => self.frame_arena().get(*index).map(Item::SaveFrame),
        }
    }

    fn get(&self, key: &str) -> Option<Item<'_>> {
        self.entries()
            .get(key)
            .and_then(|entry| self.resolve(entry))
    }

    fn value(&self, key: &str) -> Option<&StarValue> {
        self.get(key).and_then(Item::as_value)
    }

    fn get_loop(&self, key: &str) -> Option<&Loop> {
        self.get(key).and_then(Item::as_loop)
    }

    fn contains_key(&self, key: &str) -> bool {
        self.entries().contains_key(key)
    }

    /// True when `key` is bound to a loop and is that loop's primary key
    fn is_primary_key(&self, key: &str) -> bool {
        matches!(self.entries().get(key), Some(Entry::Loop(slot)) if slot.primary)
    }

    fn len(&self) -> usize {
        self.entries().len()
    }

    fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries().keys().map(String::as_str)
    }

    /// Every key with its resolved entry, loops once per column
    fn items(&self) -> impl Iterator<Item = (&str, Item<'_>)> + '_ {
        self.entries()
            .iter()
            .filter_map(move |(key, entry)| self.resolve(entry).map(|item| (key.as_str(), item)))
    }

    /// Distinct loops in order of their primary keys
    fn loops(&self) -> impl Iterator<Item = &Loop> + '_ {
        self.entries().values().filter_map(move |entry| match entry {
            Entry::Loop(slot) if slot.primary => self.loop_arena().get(slot.index),
            _ => None,
        })
    }
}

fn insert_value(entries: &mut IndexMap<String, Entry>, tag: String, value: StarValue) -> bool {
    if entries.contains_key(&tag) {
        return false;
    }
    entries.insert(tag, Entry::Value(value));
    true
}

/// Register `table` under each free column name. Returns the clashing names.
fn register_loop(
    entries: &mut IndexMap<String, Entry>,
    loops: &mut Vec<Loop>,
    table: Loop,
) -> Vec<String> {
    let index = loops.len();
    let mut clashes = Vec::new();
    let mut primary = true;

    for column in &table.columns {
        if entries.contains_key(column) {
            clashes.push(column.clone());
            continue;
        }
        entries.insert(column.clone(), Entry::Loop(LoopSlot { index, primary }));
        primary = false;
    }

    // `primary` is still set only when no key could be registered
    if !primary {
        loops.push(table);
    }
    clashes
}

/// Named save frame holding items and loops
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SaveFrame {
    pub name: String,
    entries: IndexMap<String, Entry>,
    loops: Vec<Loop>,
}

impl SaveFrame {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add a tagged value. Returns false, leaving the frame unchanged, if the tag exists.
    pub fn add_item(&mut self, tag: impl Into<String>, value: StarValue) -> bool {
        insert_value(&mut self.entries, tag.into(), value)
    }

    /// Add a loop under all of its column names. Returns column names that were already taken.
    pub fn add_loop(&mut self, table: Loop) -> Vec<String> {
        register_loop(&mut self.entries, &mut self.loops, table)
    }
}

impl Container for SaveFrame {
    fn name(&self) -> &str {
        &self.name
    }

    fn entries(&self) -> &IndexMap<String, Entry> {
        &self.entries
    }

    fn loop_arena(&self) -> &[Loop] {
        &self.loops
    }
}

/// Data block: save frames, and in generic STAR also plain items and loops
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataBlock {
    pub name: String,
    entries: IndexMap<String, Entry>,
    loops: Vec<Loop>,
    save_frames: Vec<SaveFrame>,
}

impl DataBlock {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn add_item(&mut self, tag: impl Into<String>, value: StarValue) -> bool {
        insert_value(&mut self.entries, tag.into(), value)
    }

    pub fn add_loop(&mut self, table: Loop) -> Vec<String> {
        register_loop(&mut self.entries, &mut self.loops, table)
    }

    /// Add a save frame keyed by its name. Returns false if the name is taken.
    pub fn add_save_frame(&mut self, frame: SaveFrame) -> bool {
        if self.entries.contains_key(&frame.name) {
            return false;
        }
        self.entries
            .insert(frame.name.clone(), Entry::SaveFrame(self.save_frames.len()));
        self.save_frames.push(frame);
        true
    }

    pub fn save_frames(&self) -> impl Iterator<Item = &SaveFrame> + '_ {
        self.entries.values().filter_map(move |entry| match entry {
            Entry::SaveFrame(index) => self.save_frames.get(*index),
            _ => None,
        })
    }
}

impl Container for DataBlock {
    fn name(&self) -> &str {
        &self.name
    }

    fn entries(&self) -> &IndexMap<String, Entry> {
        &self.entries
    }

    fn loop_arena(&self) -> &[Loop] {
        &self.loops
    }

    fn frame_arena(&self) -> &[SaveFrame] {
        &self.save_frames
    }
}

/// Result of parsing one document: data block name → block
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataExtent {
    pub name: String,
    blocks: IndexMap<String, DataBlock>,
}

impl DataExtent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            blocks: IndexMap::new(),
        }
    }

    /// Add a block keyed by its name. Returns false if the name is taken.
    pub fn add_block(&mut self, block: DataBlock) -> bool {
        if self.blocks.contains_key(&block.name) {
            return false;
        }
        self.blocks.insert(block.name.clone(), block);
        true
    }

    pub fn get(&self, name: &str) -> Option<&DataBlock> {
        self.blocks.get(name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.blocks.contains_key(name)
    }

    pub fn blocks(&self) -> impl Iterator<Item = &DataBlock> + '_ {
        self.blocks.values()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(words: &[&str]) -> Vec<StarValue> {
        words.iter().map(|word| StarValue::unquoted(*word)).collect()
    }

    fn sample_loop() -> Loop {
        let mut table = Loop::new(vec!["_t.a".into(), "_t.b".into()]);
        table.add_row(values(&["1", "2"]));
        table.add_row(values(&["3", "4"]));
        table
    }

    #[test]
    fn test_loop_registered_under_every_column() {
        let mut frame = SaveFrame::new("save_x");
        assert!(frame.add_loop(sample_loop()).is_empty());

        let by_a = frame.get_loop("_t.a").expect("loop under first column");
        let by_b = frame.get_loop("_t.b").expect("loop under second column");
        assert!(std::ptr::eq(by_a, by_b));
        assert!(frame.is_primary_key("_t.a"));
        assert!(!frame.is_primary_key("_t.b"));
        assert_eq!(frame.loops().count(), 1);
        assert_eq!(frame.len(), 2);
    }

    #[test]
    fn test_duplicate_item_keeps_first() {
        let mut frame = SaveFrame::new("save_x");
        assert!(frame.add_item("_t.a", StarValue::unquoted("1")));
        assert!(!frame.add_item("_t.a", StarValue::unquoted("2")));
        assert_eq!(frame.value("_t.a").map(StarValue::as_str), Some("1"));
    }

    #[test]
    fn test_loop_clash_moves_primary_key() {
        let mut frame = SaveFrame::new("save_x");
        frame.add_item("_t.a", StarValue::unquoted("1"));
        let clashes = frame.add_loop(sample_loop());
        assert_eq!(clashes, vec!["_t.a".to_string()]);
        assert!(frame.is_primary_key("_t.b"));
        assert_eq!(frame.loops().count(), 1);
    }

    #[test]
    fn test_block_save_frames_in_order() {
        let mut block = DataBlock::new("data_x");
        assert!(block.add_save_frame(SaveFrame::new("save_b")));
        assert!(block.add_save_frame(SaveFrame::new("save_a")));
        assert!(!block.add_save_frame(SaveFrame::new("save_a")));
        let names: Vec<_> = block.save_frames().map(|frame| frame.name.as_str()).collect();
        assert_eq!(names, vec!["save_b", "save_a"]);
        assert!(matches!(block.get("save_a"), Some(Item::SaveFrame(_))));
    }

    #[test]
    fn test_loop_column_values() {
        let table = sample_loop();
        let column: Vec<_> = table.column("_t.b").map(StarValue::as_str).collect();
        assert_eq!(column, vec!["2", "4"]);
        assert_eq!(table.name, "_t.a");
    }
}
