//! Output formats
//!
//! - STAR text for both tree families, through [`ToStarString`] and [`StarWriter`]
//! - JSON, through `serde`
//! - a registry that the processor uses to pick a format by name

pub mod json;
pub mod registry;
pub mod star_writer;

pub use json::to_json;
pub use registry::{FormatError, FormatRegistry, Formatter, JsonFormatter, StarDocument, StarFormatter};
pub use star_writer::{format_string, quote_string, StarWriter, WriterOptions};

/// Render a value or container as STAR text that reads back unchanged
pub trait ToStarString {
    fn to_star_string(&self) -> Result<String, registry::FormatError>;
}
