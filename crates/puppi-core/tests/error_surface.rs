use puppi_core::errors::{ErrorInfo, PuppiError};
use puppi_core::Category;

fn sample_info(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .with_context("region", 1)
        .with_context("reason", "example")
}

#[test]
fn config_error_surface() {
    let err = PuppiError::Config(sample_info("non-positive-cone", "cone must be positive"));
    assert_eq!(err.info().code, "non-positive-cone");
    assert_eq!(err.info().context.get("region").map(String::as_str), Some("1"));
}

#[test]
fn input_error_surface() {
    let err = PuppiError::Input(ErrorInfo::new(
        "length-mismatch",
        "weights and candidates differ",
    ));
    assert_eq!(err.info().code, "length-mismatch");
    assert!(err.to_string().starts_with("input error:"));
}

#[test]
fn display_includes_context_and_hint() {
    let err = PuppiError::Engine(
        ErrorInfo::new("not-initialized", "initialize first")
            .with_context("state", "idle")
            .with_hint("call initialize"),
    );
    let text = err.to_string();
    assert!(text.contains("code: not-initialized"));
    assert!(text.contains("state=idle"));
    assert!(text.contains("hint: call initialize"));
}

#[test]
fn errors_round_trip_through_json() {
    let err = PuppiError::Serde(sample_info("json-deserialize", "bad payload"));
    let json = serde_json::to_string(&err).unwrap();
    assert!(json.contains("\"family\":\"Serde\""));
    let back: PuppiError = serde_json::from_str(&json).unwrap();
    assert_eq!(back, err);
}

#[test]
fn category_codes_are_stable() {
    for code in 0..4 {
        let category = Category::try_from(code).unwrap();
        assert_eq!(category.code(), code);
    }
    let err = Category::try_from(7).unwrap_err();
    assert_eq!(err.info().code, "unknown-category");
}
