//! STAR, NEF and NMR-STAR reading and writing
//!
//! The pipeline is text → tokens ([`lexer`]) → generic tree ([`parser`],
//! [`ast`]) → validated typed tree ([`nmr`]). [`formats`] writes either tree
//! back out, and [`processor`] bundles the stages for the command line.
//!
//! The functions in this module run the whole pipeline:
//!
//! ```rust,ignore
//! use starnef::star::{parse_nef, ParseMode};
//!
//! let extent = parse_nef(text, ParseMode::Standard)?;
//! for frame in extent.first_block().into_iter().flat_map(|block| block.save_frames()) {
//!     println!("{} ({})", frame.name, frame.category);
//! }
//! ```

pub mod ast;
pub mod formats;
pub mod lexer;
pub mod nmr;
pub mod parser;
pub mod processor;

pub use ast::Diagnostic;
pub use nmr::{ConverterOptions, FileType, NmrDataExtent, ValidationError};
pub use parser::{ParseError, ParseMode, ParserOptions, StarParser};

use nmr::StarDataConverter;
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Header put in front of data-block-less text by [`wrap_in_data_block`]
pub const DUMMY_BLOCK_HEADER: &str = "data_dummy \n\n";

#[derive(Debug, thiserror::Error)]
pub enum StarError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// A converted document and the parse diagnostics recovered on the way
#[derive(Debug, Clone, PartialEq)]
pub struct Converted {
    pub extent: NmrDataExtent,
    pub diagnostics: Vec<Diagnostic>,
}

/// Put `save_` frames that have no enclosing data block into `data_dummy`
pub fn wrap_in_data_block(text: &str) -> Cow<'_, str> {
    if text.contains("save_") && !text.contains("data_") {
        Cow::Owned(format!("{}{}", DUMMY_BLOCK_HEADER, text))
    } else {
        Cow::Borrowed(text)
    }
}

/// Read a whole file. Text that is not valid UTF-8 is read as Latin-1.
pub fn read_star_file(path: &Path) -> Result<String, StarError> {
    let bytes = fs::read(path).map_err(|source| StarError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8(bytes).unwrap_or_else(|error| {
        debug!(path = %path.display(), "not UTF-8, reading as Latin-1");
        error.into_bytes().into_iter().map(char::from).collect()
    }))
}

/// Extent name used for a file: its stem
pub fn extent_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Parse, pre-validate and convert `text`
pub fn convert_text(
    name: &str,
    text: &str,
    parser_options: &ParserOptions,
    converter_options: ConverterOptions,
) -> Result<Converted, StarError> {
    let outcome = StarParser::new(parser_options.clone()).parse_named(name, text)?;
    let mut converter = StarDataConverter::new(&outcome.extent, converter_options);
    converter.pre_validate()?;
    let extent = converter.convert()?;
    Ok(Converted {
        extent,
        diagnostics: outcome.diagnostics,
    })
}

/// [`convert_text`] on the contents of a file, optionally wrapped with [`wrap_in_data_block`]
pub fn convert_file(
    path: &Path,
    parser_options: &ParserOptions,
    converter_options: ConverterOptions,
    wrap: bool,
) -> Result<Converted, StarError> {
    let text = read_star_file(path)?;
    let text = if wrap {
        wrap_in_data_block(&text)
    } else {
        Cow::Borrowed(text.as_str())
    };
    convert_text(&extent_name(path), &text, parser_options, converter_options)
}

pub fn parse_nef(text: &str, mode: ParseMode) -> Result<NmrDataExtent, StarError> {
    convert_text("", text, &ParserOptions::new(mode), ConverterOptions::new(FileType::Nef))
        .map(|converted| converted.extent)
}

pub fn parse_nmr_star(text: &str, mode: ParseMode) -> Result<NmrDataExtent, StarError> {
    convert_text("", text, &ParserOptions::new(mode), ConverterOptions::new(FileType::NmrStar))
        .map(|converted| converted.extent)
}

pub fn parse_nef_file(
    path: impl AsRef<Path>,
    mode: ParseMode,
    wrap: bool,
) -> Result<NmrDataExtent, StarError> {
    convert_file(
        path.as_ref(),
        &ParserOptions::new(mode),
        ConverterOptions::new(FileType::Nef),
        wrap,
    )
    .map(|converted| converted.extent)
}

pub fn parse_nmr_star_file(
    path: impl AsRef<Path>,
    mode: ParseMode,
    wrap: bool,
) -> Result<NmrDataExtent, StarError> {
    convert_file(
        path.as_ref(),
        &ParserOptions::new(mode),
        ConverterOptions::new(FileType::NmrStar),
        wrap,
    )
    .map(|converted| converted.extent)
}
