//! JSON serialization
//!
//! The typed tree derives `Serialize`. The generic tree stores loops in an
//! arena behind index slots, so it is serialized by hand here: each container
//! becomes `{"name": .., "entries": {..}}` with every loop written once, under
//! its primary key.

use super::registry::FormatError;
use crate::star::ast::{Container, DataBlock, DataExtent, Entry, Loop, SaveFrame};
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};

impl Serialize for Loop {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Loop", 3)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("columns", &self.columns)?;
        state.serialize_field("data", &self.data)?;
        state.end()
    }
}

/// Entry map of a container, resolving arena slots
struct Entries<'a, C>(&'a C);

impl<C: Container> Serialize for Entries<'_, C> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let container = self.0;
        let mut map = serializer.serialize_map(None)?;
        for (key, entry) in container.entries() {
            match entry {
                Entry::Value(value) => map.serialize_entry(key, value)?,
                Entry::Loop(slot) if slot.primary => {
                    if let Some(table) = container.loop_arena().get(slot.index) {
                        map.serialize_entry(key, table)?;
                    }
                }
                Entry::Loop(_) => {}
                Entry::SaveFrame(index) => {
                    if let Some(frame) = container.frame_arena().get(*index) {
                        map.serialize_entry(key, frame)?;
                    }
                }
            }
        }
        map.end()
    }
}

impl Serialize for SaveFrame {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("SaveFrame", 2)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("entries", &Entries(self))?;
        state.end()
    }
}

impl Serialize for DataBlock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("DataBlock", 2)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("entries", &Entries(self))?;
        state.end()
    }
}

impl Serialize for DataExtent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let blocks: Vec<&DataBlock> = self.blocks().collect();
        let mut state = serializer.serialize_struct("DataExtent", 2)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("blocks", &blocks)?;
        state.end()
    }
}

/// Pretty-printed JSON for anything serializable in this crate
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, FormatError> {
    serde_json::to_string_pretty(value).map_err(|e| FormatError::Serialization(e.to_string()))
}
