//! Error taxonomy tests: each failure surfaces as its declared kind and
//! is reported from the translation entry point.

use bson_transpile::{translate, TranslateError};

fn py_err(source: &str) -> TranslateError {
    translate(source, "python").expect_err(source)
}

#[test]
fn test_argument_count_mismatch() {
    assert!(matches!(
        py_err("Timestamp(100)"),
        TranslateError::ArgumentCount { .. }
    ));
    assert!(matches!(
        py_err("Timestamp(100, 1, 2)"),
        TranslateError::ArgumentCount { .. }
    ));
    assert!(matches!(
        py_err("MaxKey(1)"),
        TranslateError::ArgumentCount { .. }
    ));
}

#[test]
fn test_argument_type_mismatch_names_slot_and_index() {
    let err = py_err("Timestamp(\"a\", 1)");
    assert!(matches!(err, TranslateError::Type { .. }));
    let message = err.to_string();
    assert!(message.contains("argument 1"), "got: {message}");
    assert!(message.contains("_integer"), "got: {message}");
    assert!(message.contains("_string"), "got: {message}");
}

#[test]
fn test_first_failure_wins() {
    // Both arguments are wrong; only the first is reported.
    let err = py_err("Timestamp('a', 'b')");
    assert!(err.to_string().contains("argument 1"));
}

#[test]
fn test_reference_error_for_unknown_identifier() {
    assert!(matches!(
        py_err("Widget(1)"),
        TranslateError::Reference { .. }
    ));
    assert!(matches!(
        py_err("{a: unknownThing}"),
        TranslateError::Reference { .. }
    ));
}

#[test]
fn test_attribute_error_on_recognized_class() {
    assert!(matches!(
        py_err("Long.fromNumber(5)"),
        TranslateError::Attribute { .. }
    ));
}

#[test]
fn test_non_callable_is_type_error() {
    assert!(matches!(py_err("Object()"), TranslateError::Type { .. }));
}

#[test]
fn test_sandbox_failures_are_generic() {
    assert!(matches!(
        py_err("ObjectId('nothex')"),
        TranslateError::Generic { .. }
    ));
    assert!(matches!(
        py_err("NumberDecimal('1.2.3')"),
        TranslateError::Generic { .. }
    ));
    assert!(matches!(
        py_err("new Date('not a date')"),
        TranslateError::Generic { .. }
    ));
}

#[test]
fn test_unsupported_bson_regex_flags_listed() {
    let err = py_err("BSONRegExp('foo', 'gk')");
    assert!(matches!(err, TranslateError::Generic { .. }));
    assert!(err.to_string().contains("gk"));

    // The Java path raises the same way.
    let err = translate("BSONRegExp('foo', 'gk')", "java").unwrap_err();
    assert!(matches!(err, TranslateError::Generic { .. }));
}

#[test]
fn test_statements_are_rejected() {
    assert!(matches!(
        py_err("let x = 1"),
        TranslateError::Generic { .. }
    ));
    assert!(matches!(py_err("1; 2"), TranslateError::Generic { .. }));
}

#[test]
fn test_same_errors_across_targets() {
    for target in ["python", "java"] {
        let err = translate("Timestamp('a', 1)", target).unwrap_err();
        assert!(
            matches!(err, TranslateError::Type { .. }),
            "{target} should type-error"
        );
    }
}
