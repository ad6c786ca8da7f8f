// Unit tests for error module

use crate::error::DemoError;

use bridge_core::error::BridgeError;

/// **VALUE**: Tests that bridge errors convert into demo errors with the
/// original message preserved.
///
/// **WHY THIS MATTERS**: The demo surfaces every bridge failure through
/// DemoError. If the conversion drops the inner message, log lines say
/// only "Bridge Error" and debugging means guessing.
///
/// **BUG THIS CATCHES**: Would catch the From impl discarding the source
/// error text.
#[test]
fn given_bridge_error_when_converted_then_message_preserved() {
    // GIVEN: A bridge transport error
    let inner = BridgeError::transport("channel torn down");

    // WHEN: Converting to a DemoError
    let err: DemoError = inner.into();

    // THEN: The variant is Bridge and the inner text survives
    let rendered = err.to_string();
    assert!(
        rendered.starts_with("Bridge Error:"),
        "Unexpected rendering: {rendered}"
    );
    assert!(
        rendered.contains("channel torn down"),
        "Inner message should survive conversion: {rendered}"
    );
}

/// **VALUE**: Tests that error display includes the capture location.
///
/// **WHY THIS MATTERS**: Location tracking is the whole point of the
/// structured error variants; a display format without it makes the
/// tracked location invisible in logs.
///
/// **BUG THIS CATCHES**: Would catch the `{location}` segment being
/// dropped from the error attribute.
#[test]
fn given_demo_error_when_displayed_then_location_included() {
    // GIVEN: An error converted here, capturing this file
    let err: DemoError = BridgeError::transport("x").into();

    // THEN: The rendering names this source file
    assert!(
        err.to_string().contains("error.rs"),
        "Display should include the capture location: {err}"
    );
}
