//! NEF and NMR-STAR layer
//!
//! Validates a generic [`crate::star::ast::DataExtent`] against the dialect
//! rules and converts it into a typed tree:
//!
//! - save frames are keyed by `sf_framecode` and carry their `sf_category`
//! - tag and column prefixes are stripped
//! - unquoted values are coerced to null, booleans and numbers
//!
//! Structure:
//!     - `value`: [`NmrValue`] and the coercion rules
//!     - `tree`: typed containers and their builders
//!     - `converter`: the two-pass [`StarDataConverter`]
//!     - `framecode`: save frame name sanitization
//!     - `error`: [`ValidationError`]

pub mod converter;
pub mod error;
pub mod framecode;
pub mod tree;
pub mod value;

pub use converter::{ConverterOptions, FileType, StarDataConverter, UnknownFileType, MISSING_BLOCK_NAME};
pub use error::ValidationError;
pub use framecode::string_to_framecode;
pub use tree::{NmrDataBlock, NmrDataExtent, NmrEntry, NmrLoop, NmrRow, NmrSaveFrame, SF_CATEGORY, SF_FRAMECODE};
pub use value::{IntoNmrValue, NmrValue};
