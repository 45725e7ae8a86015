//! File processing through the public processor API

use starnef::config::{load_defaults, Loader, StarConfig};
use starnef::star::processor::{process_file, ProcessingError, ProcessingSpec};
use starnef::star::StarError;

fn data(name: &str) -> String {
    format!("{}/tests/data/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn spec(text: &str) -> ProcessingSpec {
    ProcessingSpec::from_string(text).expect("valid spec")
}

fn wrapping_config() -> StarConfig {
    Loader::new()
        .set_override("convert.wrap_in_data_block", true)
        .expect("override")
        .build()
        .expect("config")
}

#[test]
fn sample_as_nef_json() {
    let processed =
        process_file(data("sample.nef"), &spec("nef-json"), &load_defaults().expect("defaults"))
            .expect("sample converts");
    let json: serde_json::Value = serde_json::from_str(&processed.output).expect("json");

    assert_eq!(json["name"], "sample");
    let frames = &json["blocks"]["sample"]["save_frames"];
    assert_eq!(frames["nef_nmr_meta_data"]["category"], "nef_nmr_meta_data");
    assert_eq!(frames["nef_nmr_spectrum_hsqc"]["category"], "nef_nmr_spectrum");
    assert!(processed.diagnostics.is_empty());
}

#[test]
fn sample_as_written_star() {
    let processed =
        process_file(data("sample.nef"), &spec("nef-star"), &load_defaults().expect("defaults"))
            .expect("sample converts");
    assert!(processed.output.starts_with("data_sample\n"));
    assert!(processed.output.contains("   loop_\n"));
    assert!(processed.output.contains("_nef_sequence.linking"));
    assert!(processed.output.contains(";line one\nline two\n;"));
}

#[test]
fn token_stage_ignores_wrapping() {
    let processed = process_file(data("unwrapped.nef"), &spec("token-simple"), &wrapping_config())
        .expect("tokens");
    assert!(processed.output.starts_with("<SAVE_FRAME:\"save_nef_nmr_meta_data\">\n"));
}

#[test]
fn unwrapped_frames_need_the_wrap_setting() {
    let error = process_file(
        data("unwrapped.nef"),
        &spec("nef-json"),
        &load_defaults().expect("defaults"),
    )
    .expect_err("no data block");
    assert!(matches!(error, ProcessingError::Star(StarError::Parse(_))));

    let processed = process_file(data("unwrapped.nef"), &spec("nef-json"), &wrapping_config())
        .expect("wrapped");
    let json: serde_json::Value = serde_json::from_str(&processed.output).expect("json");
    assert_eq!(json["name"], "unwrapped");
    assert!(json["blocks"]["dummy"]["save_frames"]["nef_nmr_meta_data"].is_object());
}

#[test]
fn latin1_files_are_decoded() {
    let processed =
        process_file(data("latin1.nef"), &spec("nef-star"), &load_defaults().expect("defaults"))
            .expect("latin-1 text converts");
    assert!(processed.output.contains("André"));
}

#[test]
fn missing_file_is_an_io_error() {
    let error = process_file(data("absent.nef"), &spec("star-json"), &load_defaults().expect("defaults"))
        .expect_err("absent");
    assert!(matches!(error, ProcessingError::Star(StarError::Io { .. })));
}

#[test]
fn every_listed_spec_runs_on_the_sample() {
    let config = load_defaults().expect("defaults");
    for spec in ProcessingSpec::available_specs() {
        let processed = process_file(data("sample.nef"), &spec, &config)
            .unwrap_or_else(|error| panic!("{spec} failed: {error}"));
        assert!(!processed.output.is_empty(), "{spec} produced nothing");
    }
}
