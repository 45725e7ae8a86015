//! Command-line interface for starnef
//!
//! Usage:
//!   starnef tokens `<path>` [--format simple|json]                 - Dump the token stream
//!   starnef parse `<path>` [--format star|json]                    - Parse as generic STAR
//!   starnef convert `<path>` [--file-type nef|nmrstar] [--format star|json] [--wrap]
//!                                                                - Parse, validate and convert
//!   starnef framecode `<text>`                                     - Sanitize a save frame name
//!   starnef list-formats                                         - List processing specs
//!
//! Global options: `--config <file>` layers a TOML file over the built-in
//! defaults and `./starnef.toml`, `--mode <mode>` overrides `parser.mode`,
//! `-v`/`-vv` raise the log level. `STARNEF_<SECTION>__<KEY>` variables sit
//! between the files and the flags.
mod logging;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use config::ConfigError;
use logging::{init_logging, LogConfig};
use starnef::config::{Loader, StarConfig};
use starnef::star::formats::FormatRegistry;
use starnef::star::nmr::{string_to_framecode, FileType};
use starnef::star::parser::ParseMode;
use starnef::star::processor::{available_formats, process_file, ProcessingSpec};
use std::path::PathBuf;
use tracing::info;

fn path_arg() -> Arg {
    Arg::new("path")
        .help("Path to the STAR file")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .index(1)
}

fn format_arg(formats: [&'static str; 2]) -> Arg {
    Arg::new("format")
        .long("format")
        .short('f')
        .help("Output format")
        .value_parser(formats)
        .default_value(formats[0])
}

fn cli() -> Command {
    Command::new("starnef")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A tool for reading, checking and converting STAR, NEF and NMR-STAR files")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("TOML file layered over the built-in defaults")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("mode")
                .long("mode")
                .short('m')
                .help("Parser strictness")
                .value_parser(["strict", "standard", "lenient"])
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .help("Raise the log level (-v debug, -vv trace)")
                .action(ArgAction::Count)
                .global(true),
        )
        .subcommand(
            Command::new("tokens")
                .about("Dump the token stream")
                .arg(path_arg())
                .arg(format_arg(["simple", "json"])),
        )
        .subcommand(
            Command::new("parse")
                .about("Parse into the generic STAR tree")
                .arg(path_arg())
                .arg(format_arg(["star", "json"])),
        )
        .subcommand(
            Command::new("convert")
                .about("Parse, validate and convert a NEF or NMR-STAR file")
                .arg(path_arg())
                .arg(format_arg(["star", "json"]))
                .arg(
                    Arg::new("file-type")
                        .long("file-type")
                        .short('t')
                        .help("Dialect rules to validate against (default from config)")
                        .value_parser(["nef", "nmrstar"]),
                )
                .arg(
                    Arg::new("wrap")
                        .long("wrap")
                        .help("Wrap save frames that have no data block in data_dummy")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("framecode")
                .about("Turn text into a valid save frame name")
                .arg(Arg::new("text").required(true).index(1)),
        )
        .subcommand(Command::new("list-formats").about("List available processing specs"))
}

fn main() {
    let matches = cli().get_matches();

    let verbosity = matches.get_count("verbose");
    init_logging(&LogConfig::from_verbosity(verbosity).with_target(verbosity > 1));

    match matches.subcommand() {
        Some(("tokens", sub)) => handle_process_command(&matches, sub, "token"),
        Some(("parse", sub)) => handle_process_command(&matches, sub, "star"),
        Some(("convert", sub)) => handle_convert_command(&matches, sub),
        Some(("framecode", sub)) => {
            if let Some(text) = sub.get_one::<String>("text") {
                println!("{}", string_to_framecode(text));
            }
        }
        Some(("list-formats", _)) => handle_list_formats_command(),
        _ => unreachable!("clap requires a subcommand"),
    }
}

/// Defaults, `./starnef.toml`, `--config`, `STARNEF_*` variables, then `--mode`
fn base_loader(matches: &ArgMatches) -> Result<Loader, ConfigError> {
    let mut loader = Loader::new().with_project_file(".");
    if let Some(path) = matches.get_one::<PathBuf>("config") {
        loader = loader.with_file(path);
    }
    loader = loader.with_env();
    if let Some(mode) = matches.get_one::<String>("mode") {
        let mode = mode
            .parse::<ParseMode>()
            .map_err(|e| ConfigError::Message(e.to_string()))?;
        loader = loader.with_parse_mode(mode)?;
    }
    Ok(loader)
}

fn build_config(loader: Result<Loader, ConfigError>) -> StarConfig {
    loader.and_then(Loader::build).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    })
}

fn handle_process_command(matches: &ArgMatches, sub: &ArgMatches, stage: &str) {
    let config = build_config(base_loader(matches));
    run(sub, &format!("{}-{}", stage, selected_format(sub)), &config);
}

fn handle_convert_command(matches: &ArgMatches, sub: &ArgMatches) {
    let mut loader = base_loader(matches);
    if let Some(file_type) = sub.get_one::<String>("file-type") {
        loader = loader.and_then(|l| {
            let file_type = file_type
                .parse::<FileType>()
                .map_err(|e| ConfigError::Message(e.to_string()))?;
            l.with_file_type(file_type)
        });
    }
    if sub.get_flag("wrap") {
        loader = loader.and_then(|l| l.with_wrap_in_data_block(true));
    }
    let config = build_config(loader);
    let stage = config.convert.file_type.as_str();
    run(sub, &format!("{}-{}", stage, selected_format(sub)), &config);
}

fn selected_format(sub: &ArgMatches) -> &str {
    sub.get_one::<String>("format").map_or("star", String::as_str)
}

/// Process the file at `path` and print the result; diagnostics go to stderr
fn run(sub: &ArgMatches, spec: &str, config: &StarConfig) {
    let Some(path) = sub.get_one::<PathBuf>("path") else {
        eprintln!("Missing path");
        std::process::exit(1);
    };

    let spec = ProcessingSpec::from_string(spec).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        eprintln!("\nAvailable formats: {}", available_formats().join(", "));
        std::process::exit(1);
    });

    let processed = process_file(path, &spec, config).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    for diagnostic in &processed.diagnostics {
        eprintln!("{}: {}", path.display(), diagnostic);
    }
    info!(path = %path.display(), %spec, diagnostics = processed.diagnostics.len(), "processed");

    print!("{}", processed.output);
    if !processed.output.ends_with('\n') {
        println!();
    }
}

fn handle_list_formats_command() {
    println!("Available processing specs:\n");
    for spec in available_formats() {
        println!("  {}", spec);
    }

    let registry = FormatRegistry::with_defaults();
    println!("\nTree output formats:\n");
    for name in registry.list_formats() {
        if let Some(formatter) = registry.get(&name) {
            println!("  {:<8}{}", name, formatter.description());
        }
    }
}
