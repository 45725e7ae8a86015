//! # starnef
//!
//! Reading and writing of STAR text and its NEF and NMR-STAR dialects.
//!
//! - [`star`]: tokenizer, generic parser, dialect converter and writers
//! - [`nef`]: the boundary that walks converted NEF data into a domain model
//! - [`config`]: layered configuration for the command line
//!
//! ```rust,ignore
//! use starnef::star::{parse_nef, ParseMode};
//!
//! let extent = parse_nef(text, ParseMode::Standard)?;
//! ```

pub mod config;
pub mod nef;
pub mod star;
