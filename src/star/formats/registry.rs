//! Format registry for tree serialization
//!
//! Each output format implements [`Formatter`] and is looked up by name. The
//! processor and the CLI go through the registry, so adding a format means
//! registering one more implementation.

use super::json::to_json;
use super::star_writer::{StarWriter, WriterOptions};
use crate::star::ast::DataExtent;
use crate::star::nmr::NmrDataExtent;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("Format '{0}' not found")]
    FormatNotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Text has no STAR spelling that reads back unchanged: {0:?}")]
    Unwritable(String),
}

/// A parsed document at either stage
#[derive(Debug, Clone, PartialEq)]
pub enum StarDocument {
    Generic(DataExtent),
    Nmr(NmrDataExtent),
}

pub trait Formatter: Send + Sync {
    /// Registry key, e.g. "star"
    fn name(&self) -> &str;

    fn serialize(&self, document: &StarDocument) -> Result<String, FormatError>;

    fn description(&self) -> &str {
        ""
    }
}

/// STAR text
#[derive(Debug, Clone, Default)]
pub struct StarFormatter {
    writer: StarWriter,
}

impl StarFormatter {
    pub fn new(options: WriterOptions) -> Self {
        Self {
            writer: StarWriter::new(options),
        }
    }
}

impl Formatter for StarFormatter {
    fn name(&self) -> &str {
        "star"
    }

    fn serialize(&self, document: &StarDocument) -> Result<String, FormatError> {
        match document {
            StarDocument::Generic(extent) => self.writer.write_extent(extent),
            StarDocument::Nmr(extent) => self.writer.write_nmr_extent(extent),
        }
    }

    fn description(&self) -> &str {
        "STAR text, re-readable by the parser"
    }
}

/// Pretty-printed JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn name(&self) -> &str {
        "json"
    }

    fn serialize(&self, document: &StarDocument) -> Result<String, FormatError> {
        match document {
            StarDocument::Generic(extent) => to_json(extent),
            StarDocument::Nmr(extent) => to_json(extent),
        }
    }

    fn description(&self) -> &str {
        "JSON dump of the tree"
    }
}

pub struct FormatRegistry {
    formatters: HashMap<String, Box<dyn Formatter>>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        FormatRegistry {
            formatters: HashMap::new(),
        }
    }

    /// Register a formatter, replacing any with the same name
    pub fn register<F: Formatter + 'static>(&mut self, formatter: F) {
        self.formatters
            .insert(formatter.name().to_string(), Box::new(formatter));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Formatter> {
        self.formatters.get(name).map(|f| f.as_ref())
    }

    pub fn has(&self, name: &str) -> bool {
        self.formatters.contains_key(name)
    }

    pub fn serialize(&self, document: &StarDocument, format: &str) -> Result<String, FormatError> {
        let formatter = self
            .get(format)
            .ok_or_else(|| FormatError::FormatNotFound(format.to_string()))?;
        formatter.serialize(document)
    }

    /// Format names, sorted
    pub fn list_formats(&self) -> Vec<String> {
        let mut names: Vec<_> = self.formatters.keys().cloned().collect();
        names.sort();
        names
    }

    /// Registry with the built-in formats and the given STAR layout
    pub fn with_writer_options(options: WriterOptions) -> Self {
        let mut registry = Self::new();
        registry.register(StarFormatter::new(options));
        registry.register(JsonFormatter);
        registry
    }

    pub fn with_defaults() -> Self {
        Self::with_writer_options(WriterOptions::default())
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::star::ast::DataBlock;
    use crate::star::nmr::NmrDataBlock;

    struct NameCount;

    impl Formatter for NameCount {
        fn name(&self) -> &str {
            "count"
        }

        fn serialize(&self, document: &StarDocument) -> Result<String, FormatError> {
            Ok(match document {
                StarDocument::Generic(extent) => extent.len().to_string(),
                StarDocument::Nmr(extent) => extent.len().to_string(),
            })
        }
    }

    fn document() -> StarDocument {
        let mut extent = DataExtent::new("doc");
        extent.add_block(DataBlock::new("data_a"));
        StarDocument::Generic(extent)
    }

    #[test]
    fn test_defaults() {
        let registry = FormatRegistry::default();
        assert_eq!(registry.list_formats(), vec!["json", "star"]);
        assert_eq!(registry.serialize(&document(), "star"), Ok("data_a\n".to_string()));
    }

    #[test]
    fn test_custom_formatter() {
        let mut registry = FormatRegistry::new();
        registry.register(NameCount);
        assert!(registry.has("count"));
        assert_eq!(registry.serialize(&document(), "count"), Ok("1".to_string()));
        assert_eq!(
            registry.serialize(&document(), "xml"),
            Err(FormatError::FormatNotFound("xml".to_string()))
        );
    }

    #[test]
    fn test_unwritable_value() {
        let mut block = NmrDataBlock::new("a");
        block.new_save_frame("ccpn_notes", "ccpn_notes").set("text", "x\n;");
        let mut extent = NmrDataExtent::new("doc");
        extent.add_block(block);
        assert_eq!(
            FormatRegistry::default().serialize(&StarDocument::Nmr(extent), "star"),
            Err(FormatError::Unwritable("x\n;".to_string()))
        );
    }
}
