//! File processing API
//!
//! A processing spec names a pipeline stage and an output format, written
//! `stage-format` on the command line:
//!
//! | stage     | formats        | result                                  |
//! |-----------|----------------|-----------------------------------------|
//! | `token`   | `simple`, `json` | the token stream                      |
//! | `star`    | `star`, `json` | the generic tree                        |
//! | `nef`     | `star`, `json` | the typed tree, NEF rules               |
//! | `nmrstar` | `star`, `json` | the typed tree, NMR-STAR rules          |
//!
//! ```rust,ignore
//! use starnef::config::load_defaults;
//! use starnef::star::processor::{process_text, ProcessingSpec};
//!
//! let spec = ProcessingSpec::from_string("nef-json")?;
//! let processed = process_text("project", text, &spec, &load_defaults()?)?;
//! println!("{}", processed.output);
//! ```

use super::ast::Diagnostic;
use super::formats::{FormatError, FormatRegistry, StarDocument};
use super::lexer::{tokenize, StarToken};
use super::nmr::FileType;
use super::{convert_text, extent_name, read_star_file, wrap_in_data_block, StarError, StarParser};
use crate::config::StarConfig;
use std::borrow::Cow;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// What data to extract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    Token,
    Star,
    Nef,
    NmrStar,
}

impl ProcessingStage {
    pub fn as_str(self) -> &'static str {
        match self {
            ProcessingStage::Token => "token",
            ProcessingStage::Star => "star",
            ProcessingStage::Nef => "nef",
            ProcessingStage::NmrStar => "nmrstar",
        }
    }
}

/// How to write it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Simple,
    Json,
    Star,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Simple => "simple",
            OutputFormat::Json => "json",
            OutputFormat::Star => "star",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingSpec {
    pub stage: ProcessingStage,
    pub format: OutputFormat,
}

impl ProcessingSpec {
    /// Parse a spec string like "token-simple" or "nef-json"
    pub fn from_string(spec: &str) -> Result<Self, ProcessingError> {
        let (stage, format) = spec
            .split_once('-')
            .ok_or_else(|| ProcessingError::InvalidFormat(spec.to_string()))?;

        let stage = match stage {
            "token" => ProcessingStage::Token,
            "star" => ProcessingStage::Star,
            "nef" => ProcessingStage::Nef,
            "nmrstar" => ProcessingStage::NmrStar,
            _ => return Err(ProcessingError::InvalidStage(stage.to_string())),
        };

        let format = match format {
            "simple" => OutputFormat::Simple,
            "json" => OutputFormat::Json,
            "star" => OutputFormat::Star,
            _ => return Err(ProcessingError::InvalidFormatType(format.to_string())),
        };

        match (stage, format) {
            (ProcessingStage::Token, OutputFormat::Star) => Err(
                ProcessingError::InvalidFormatType(
                    "Format 'star' only works with tree stages".to_string(),
                ),
            ),
            (ProcessingStage::Token, _) => Ok(ProcessingSpec { stage, format }),
            (_, OutputFormat::Simple) => Err(ProcessingError::InvalidFormatType(format!(
                "Format 'simple' not supported for {} stage (only 'star' and 'json' are supported)",
                stage.as_str()
            ))),
            _ => Ok(ProcessingSpec { stage, format }),
        }
    }

    /// Every valid stage/format combination
    pub fn available_specs() -> Vec<ProcessingSpec> {
        let mut specs = vec![
            ProcessingSpec {
                stage: ProcessingStage::Token,
                format: OutputFormat::Simple,
            },
            ProcessingSpec {
                stage: ProcessingStage::Token,
                format: OutputFormat::Json,
            },
        ];
        for stage in [
            ProcessingStage::Star,
            ProcessingStage::Nef,
            ProcessingStage::NmrStar,
        ] {
            for format in [OutputFormat::Star, OutputFormat::Json] {
                specs.push(ProcessingSpec { stage, format });
            }
        }
        specs
    }

    /// File type the typed stages convert with
    fn file_type(self) -> Option<FileType> {
        match self.stage {
            ProcessingStage::Nef => Some(FileType::Nef),
            ProcessingStage::NmrStar => Some(FileType::NmrStar),
            ProcessingStage::Token | ProcessingStage::Star => None,
        }
    }
}

impl fmt::Display for ProcessingSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.stage.as_str(), self.format.as_str())
    }
}

/// Spec strings for every valid combination
pub fn available_formats() -> Vec<String> {
    ProcessingSpec::available_specs()
        .iter()
        .map(ProcessingSpec::to_string)
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    #[error("Invalid stage: {0}")]
    InvalidStage(String),
    #[error("Invalid format type: {0}")]
    InvalidFormatType(String),
    #[error(transparent)]
    Star(#[from] StarError),
    #[error(transparent)]
    Format(#[from] FormatError),
}

/// Rendered output plus the diagnostics recovered while parsing
#[derive(Debug, Clone, PartialEq)]
pub struct Processed {
    pub output: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Run `text` through the stage named by `spec` and render it
pub fn process_text(
    name: &str,
    text: &str,
    spec: &ProcessingSpec,
    config: &StarConfig,
) -> Result<Processed, ProcessingError> {
    debug!(%spec, name, "processing");
    if spec.stage == ProcessingStage::Token {
        return Ok(Processed {
            output: format_tokens(&tokenize(text), spec.format)?,
            diagnostics: Vec::new(),
        });
    }

    let (document, diagnostics) = match spec.file_type() {
        Some(file_type) => {
            let converted = convert_text(
                name,
                text,
                &config.parser_options(),
                config.converter_options_for(file_type),
            )?;
            (StarDocument::Nmr(converted.extent), converted.diagnostics)
        }
        None => {
            let outcome = StarParser::new(config.parser_options())
                .parse_named(name, text)
                .map_err(StarError::from)?;
            (StarDocument::Generic(outcome.extent), outcome.diagnostics)
        }
    };

    let registry = FormatRegistry::with_writer_options(config.writer_options());
    let output = registry.serialize(&document, spec.format.as_str())?;
    Ok(Processed {
        output,
        diagnostics,
    })
}

/// [`process_text`] on a file. Tree stages honour `convert.wrap_in_data_block`.
pub fn process_file<P: AsRef<Path>>(
    file_path: P,
    spec: &ProcessingSpec,
    config: &StarConfig,
) -> Result<Processed, ProcessingError> {
    let file_path = file_path.as_ref();
    let content = read_star_file(file_path)?;
    let content = if spec.stage != ProcessingStage::Token && config.convert.wrap_in_data_block {
        wrap_in_data_block(&content)
    } else {
        Cow::Borrowed(content.as_str())
    };
    process_text(&extent_name(file_path), &content, spec, config)
}

/// Render a token stream: one token per line, or a JSON array
pub fn format_tokens(tokens: &[StarToken<'_>], format: OutputFormat) -> Result<String, ProcessingError> {
    match format {
        OutputFormat::Simple => {
            let mut result = String::new();
            for token in tokens {
                result.push_str(&token.to_string());
                result.push('\n');
            }
            Ok(result)
        }
        OutputFormat::Json => serde_json::to_string_pretty(tokens)
            .map_err(|e| FormatError::Serialization(e.to_string()).into()),
        OutputFormat::Star => Err(ProcessingError::InvalidFormatType(
            "Format 'star' only works with tree stages".to_string(),
        )),
    }
}
