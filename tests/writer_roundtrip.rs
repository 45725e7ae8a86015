//! Values written by the STAR writer read back unchanged

use proptest::prelude::*;
use starnef::star::ast::{Container, DataBlock, StarValue};
use starnef::star::formats::{format_string, FormatError, StarWriter, ToStarString};
use starnef::star::nmr::{IntoNmrValue, NmrDataBlock, NmrValue};
use starnef::star::parser::{parse, ParseMode};
use starnef::star::parse_nef;

/// Write `value` as the only item of a block and read it back
fn reread_generic(value: StarValue) -> Result<Option<StarValue>, FormatError> {
    let mut block = DataBlock::new("data_x");
    block.add_item("_a.b", value);
    let text = StarWriter::default().write_block(&block)?;
    Ok(parse(&text, ParseMode::Strict)
        .ok()
        .and_then(|outcome| outcome.extent.get("data_x")?.value("_a.b").cloned()))
}

/// Write `value` into a NEF frame and read it back through the converter
fn reread_typed(value: NmrValue) -> Result<Option<NmrValue>, FormatError> {
    let mut block = NmrDataBlock::new("x");
    block
        .new_save_frame("nef_nmr_meta_data", "nef_nmr_meta_data")
        .set("payload", value);
    let text = StarWriter::default().write_nmr_block(&block)?;
    Ok(parse_nef(&text, ParseMode::Strict).ok().and_then(|extent| {
        extent
            .get("x")?
            .get("nef_nmr_meta_data")?
            .value("payload")
            .cloned()
    }))
}

/// A line starting with `;` then whitespace or the end closes a text field
fn has_closing_line(text: &str) -> bool {
    text.match_indices("\n;")
        .any(|(at, _)| text[at + 2..].chars().next().map_or(true, char::is_whitespace))
}

fn text() -> impl Strategy<Value = String> {
    prop_oneof![
        "[ -~]{0,16}",
        "[ -~\r\n]{0,24}",
        // dense in line breaks and semicolons
        "[a;' \t\r\n]{0,12}",
    ]
}

fn typed_value() -> impl Strategy<Value = NmrValue> {
    prop_oneof![
        Just(NmrValue::Null),
        any::<bool>().prop_map(NmrValue::Bool),
        any::<i64>().prop_map(NmrValue::Int),
        any::<f64>()
            .prop_filter("NaN never compares equal", |number| !number.is_nan())
            .prop_map(NmrValue::Float),
        text().prop_map(NmrValue::Str),
    ]
}

proptest! {
    #[test]
    fn quoted_strings_round_trip(text in text()) {
        let value = StarValue::quoted(text.clone());
        match reread_generic(value.clone()) {
            Ok(reread) => prop_assert_eq!(reread, Some(value)),
            Err(error) => {
                prop_assert!(has_closing_line(&text));
                prop_assert_eq!(error, FormatError::Unwritable(text));
            }
        }
    }

    #[test]
    fn typed_values_round_trip(value in typed_value()) {
        match reread_typed(value.clone()) {
            Ok(reread) => prop_assert_eq!(reread, Some(value)),
            Err(error) => {
                let NmrValue::Str(text) = value else {
                    return Err(TestCaseError::fail("only strings can be unwritable"));
                };
                prop_assert!(has_closing_line(&text));
                prop_assert_eq!(error, FormatError::Unwritable(text));
            }
        }
    }

    #[test]
    fn formatted_strings_reread_as_strings(text in "[ -~]{1,20}") {
        let formatted = format_string(&text).expect("single-line text is writable");
        let value = if formatted == text {
            StarValue::unquoted(formatted)
        } else {
            StarValue::quoted(text.clone())
        };
        prop_assert_eq!(value.into_nmr_value("_a.b"), NmrValue::Str(text));
    }

    #[test]
    fn coercion_is_idempotent(value in typed_value()) {
        prop_assert_eq!(value.clone().into_nmr_value("_a.b"), value);
    }
}

#[test]
fn sentinels_are_quoted() {
    for text in [".", "?", "true", "false", "12", "1.5e3", "$ref", "_tag", "loop_", "data_x", "# x", ""] {
        assert_ne!(format_string(text), Ok(text.to_string()), "{text:?} must be quoted");
        assert_eq!(
            reread_typed(NmrValue::from(text)),
            Ok(Some(NmrValue::from(text))),
            "{text:?} reads back as a string"
        );
    }
}

#[test]
fn semicolon_lines_are_refused() {
    for text in ["a\n; b", "x\n;"] {
        assert_eq!(
            reread_typed(NmrValue::from(text)),
            Err(FormatError::Unwritable(text.to_string()))
        );
    }
    assert_eq!(
        reread_typed(NmrValue::from("a\n;b")),
        Ok(Some(NmrValue::from("a\n;b")))
    );
}

#[test]
fn trailing_carriage_return_survives() {
    assert_eq!(
        reread_typed(NmrValue::from("a\nb\r")),
        Ok(Some(NmrValue::from("a\nb\r")))
    );
    assert_eq!(
        reread_generic(StarValue::quoted("a\r")),
        Ok(Some(StarValue::quoted("a\r")))
    );
}

#[test]
fn typed_values_render() {
    let render = |value: NmrValue| value.to_star_string().expect("writable");
    assert_eq!(render(NmrValue::Null), ".");
    assert_eq!(render(NmrValue::Bool(true)), "true");
    assert_eq!(render(NmrValue::Float(2.0)), "2.0");
    assert_eq!(render(NmrValue::from("plain")), "plain");
    assert_eq!(render(NmrValue::from("two words")), "'two words'");
}
