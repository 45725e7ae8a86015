//! Configuration loading
//!
//! `defaults/starnef.default.toml` is embedded into the binary so that the
//! documented defaults and runtime behavior stay in sync. Callers layer their
//! own files and overrides on top with [`Loader`] before deserializing into
//! [`StarConfig`]. The library entry points never read configuration
//! themselves; they take the option structs produced by
//! [`StarConfig::parser_options`], [`StarConfig::converter_options`] and
//! [`StarConfig::writer_options`].

use crate::star::formats::WriterOptions;
use crate::star::nmr::{ConverterOptions, FileType};
use crate::star::parser::{ParseMode, ParserOptions};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat, Source, ValueKind};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

const DEFAULT_TOML: &str = include_str!("../defaults/starnef.default.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct StarConfig {
    pub parser: ParserConfig,
    pub convert: ConvertConfig,
    pub write: WriteConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParserConfig {
    pub mode: ParseMode,
    pub lowercase_tags: bool,
    /// 0 means unlimited
    pub max_tokens: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConvertConfig {
    pub file_type: FileType,
    pub convert_column_names: bool,
    pub wrap_in_data_block: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WriteConfig {
    pub indent: usize,
    pub loop_indent: usize,
}

impl StarConfig {
    pub fn parser_options(&self) -> ParserOptions {
        let max_tokens = match self.parser.max_tokens {
            0 => None,
            limit => Some(limit),
        };
        ParserOptions::new(self.parser.mode)
            .with_lowercase_tags(self.parser.lowercase_tags)
            .with_max_tokens(max_tokens)
    }

    /// Converter options for the configured file type
    pub fn converter_options(&self) -> ConverterOptions {
        self.converter_options_for(self.convert.file_type)
    }

    pub fn converter_options_for(&self, file_type: FileType) -> ConverterOptions {
        ConverterOptions::new(file_type)
            .with_convert_column_names(self.convert.convert_column_names)
    }

    pub fn writer_options(&self) -> WriterOptions {
        WriterOptions::new(self.write.indent, self.write.loop_indent)
    }
}

/// File name picked up by [`Loader::with_project_file`]
pub const PROJECT_FILE: &str = "starnef.toml";

/// Prefix of environment overrides, e.g. `STARNEF_PARSER__MODE=strict`
pub const ENV_PREFIX: &str = "STARNEF";

/// Builds a [`StarConfig`] from layers; later layers win.
///
/// The command line stacks them as: embedded defaults, `./starnef.toml`,
/// `--config`, `STARNEF_*` variables, then flags.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
    layers: Vec<String>,
}

impl Loader {
    /// Start from the embedded defaults
    pub fn new() -> Self {
        Self {
            builder: Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml)),
            layers: vec!["defaults".to_string()],
        }
    }

    fn add_layer<S>(mut self, name: String, source: S) -> Self
    where
        S: Source + Send + Sync + 'static,
    {
        self.builder = self.builder.add_source(source);
        self.layers.push(name);
        self
    }

    /// Layer a TOML file that must exist
    pub fn with_file(self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let source = File::from(path).format(FileFormat::Toml).required(true);
        self.add_layer(path.display().to_string(), source)
    }

    /// Layer a TOML file if it exists
    pub fn with_optional_file(self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let source = File::from(path).format(FileFormat::Toml).required(false);
        self.add_layer(format!("{} (optional)", path.display()), source)
    }

    /// Layer [`PROJECT_FILE`] from `dir`, if there is one
    pub fn with_project_file(self, dir: impl AsRef<Path>) -> Self {
        self.with_optional_file(dir.as_ref().join(PROJECT_FILE))
    }

    /// Layer `STARNEF_<SECTION>__<KEY>` environment variables
    pub fn with_env(self) -> Self {
        let source = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true);
        self.add_layer(format!("{}_* environment", ENV_PREFIX), source)
    }

    /// Override one key by its dotted path
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        self.layers.push(format!("override {}", key));
        Ok(self)
    }

    pub fn with_parse_mode(self, mode: ParseMode) -> Result<Self, ConfigError> {
        self.set_override("parser.mode", mode.as_str())
    }

    pub fn with_file_type(self, file_type: FileType) -> Result<Self, ConfigError> {
        self.set_override("convert.file_type", file_type.as_str())
    }

    pub fn with_wrap_in_data_block(self, wrap: bool) -> Result<Self, ConfigError> {
        self.set_override("convert.wrap_in_data_block", wrap)
    }

    /// Names of the layers added so far, lowest precedence first
    pub fn layers(&self) -> &[String] {
        &self.layers
    }

    pub fn build(self) -> Result<StarConfig, ConfigError> {
        debug!(layers = ?self.layers, "building configuration");
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

pub fn load_defaults() -> Result<StarConfig, ConfigError> {
    Loader::new().build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_default_config() {
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(config.parser.mode, ParseMode::Standard);
        assert!(config.parser.lowercase_tags);
        assert_eq!(config.convert.file_type, FileType::Nef);
        assert!(!config.convert.wrap_in_data_block);
        assert_eq!(config.writer_options(), WriterOptions::default());
        assert_eq!(config.parser_options(), ParserOptions::default());
        assert_eq!(config.converter_options(), ConverterOptions::default());
    }

    #[test]
    fn supports_overrides() {
        let config = Loader::new()
            .with_parse_mode(ParseMode::Strict)
            .and_then(|loader| loader.set_override("parser.max_tokens", 500_i64))
            .and_then(|loader| loader.with_file_type(FileType::NmrStar))
            .and_then(|loader| loader.with_wrap_in_data_block(true))
            .expect("overrides to apply")
            .build()
            .expect("config to build");
        assert_eq!(config.parser.mode, ParseMode::Strict);
        assert_eq!(config.parser_options().max_tokens, Some(500));
        assert_eq!(config.converter_options().file_type, FileType::NmrStar);
        assert!(config.convert.wrap_in_data_block);
    }

    #[test]
    fn records_layers_in_order() {
        let loader = Loader::new()
            .with_project_file("/nonexistent")
            .with_env()
            .with_parse_mode(ParseMode::Lenient)
            .expect("override to apply");
        assert_eq!(
            loader.layers(),
            [
                "defaults",
                "/nonexistent/starnef.toml (optional)",
                "STARNEF_* environment",
                "override parser.mode",
            ]
        );
    }

    #[test]
    fn environment_overrides_defaults() {
        std::env::set_var("STARNEF_WRITE__LOOP_INDENT", "4");
        let config = Loader::new().with_env().build();
        std::env::remove_var("STARNEF_WRITE__LOOP_INDENT");
        let config = config.expect("config to build");
        assert_eq!(config.write.loop_indent, 4);
        assert_eq!(config.write.indent, 3);
    }

    #[test]
    fn rejects_unknown_mode() {
        let result = Loader::new()
            .set_override("parser.mode", "sloppy")
            .expect("override to apply")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn missing_required_file_fails() {
        let result = Loader::new().with_file("/nonexistent/starnef.toml").build();
        assert!(result.is_err());
        let config = Loader::new()
            .with_optional_file("/nonexistent/starnef.toml")
            .build()
            .expect("optional file may be absent");
        assert_eq!(config.write.indent, 3);
    }
}
