//! NEF reader boundary
//!
//! Hands a converted NEF data block to an external domain model. Frames are
//! read in a fixed category order (metadata, molecular system, assignments and
//! shifts, then the rest) because later frames refer to earlier ones by
//! framecode. The model itself lives outside this crate behind [`NefModel`].
//!
//! ```rust,ignore
//! use starnef::nef::NefReader;
//! use starnef::star::{parse_nef, ParseMode};
//!
//! let extent = parse_nef(text, ParseMode::Standard)?;
//! if let Some(block) = extent.first_block() {
//!     let report = NefReader::new().read(block, &mut my_model)?;
//!     println!("loaded {} frames", report.loaded.len());
//! }
//! ```
//!
//! Structure:
//!     - `categories`: [`SaveFrameCategory`] and [`READING_ORDER`]
//!     - `sequence`: chain grouping and [`split_nef_sequence`]
//!     - `reader`: [`NefReader`], [`NefModel`], [`ReadContext`], [`CrossLinks`]
//!     - `error`: [`ReadError`]

pub mod categories;
pub mod error;
pub mod reader;
pub mod sequence;

pub use categories::{frames_in_reading_order, SaveFrameCategory, READING_ORDER};
pub use error::ReadError;
pub use reader::{CrossLinks, NefModel, NefReader, ReadContext, ReadReport};
pub use sequence::{default_chain_code, group_by_chain, split_nef_sequence, Stretches};
