// Unit tests for the wire envelope model
// Pins the JSON field names that form the interop contract

use crate::wire::{Envelope, EnvelopeKind, split_qualified};

use serde_json::{Value, json};

/// **VALUE**: Verifies the request envelope's JSON shape field by field.
///
/// **WHY THIS MATTERS**: The field names (`from`, `func`, `args`,
/// `correlationId`, `type`) are the interop contract between independently
/// implemented sides. A renamed field breaks every foreign peer silently.
///
/// **BUG THIS CATCHES**: Would catch serde attribute regressions - a dropped
/// `rename_all = "camelCase"` would ship `correlation_id` on the wire.
#[test]
fn given_request_envelope_when_serialized_then_uses_contract_field_names() {
    // GIVEN: A request envelope
    let envelope = Envelope::request("plugin-a", "echo", vec![json!(42)], 3);

    // WHEN: Serializing to JSON
    let value = serde_json::to_value(&envelope).expect("serialization failed");

    // THEN: Exactly the contract fields, with contract spellings
    assert_eq!(value["from"], json!("plugin-a"));
    assert_eq!(value["func"], json!("echo"));
    assert_eq!(value["args"], json!([42]));
    assert_eq!(value["correlationId"], json!(3));
    assert_eq!(value["type"], json!("call"));
    assert!(
        value.get("result").is_none() && value.get("error").is_none(),
        "Requests must not carry result/error fields"
    );
}

/// **VALUE**: Verifies response envelopes carry result XOR error.
///
/// **WHY THIS MATTERS**: The calling side decides resolve-vs-reject purely from
/// the presence of the `error` field. A response carrying both or neither would
/// be ambiguous.
///
/// **BUG THIS CATCHES**: Would catch `Envelope::response` populating both arms,
/// or the error arm being dropped during serialization.
#[test]
fn given_response_envelopes_when_built_then_carry_result_xor_error() {
    // GIVEN/WHEN: One success and one failure response
    let ok = Envelope::response("plugin-a", "echo", 3, Ok(json!(42)));
    let failed = Envelope::response("plugin-a", "echo", 4, Err("boom".to_string()));

    // THEN: Success carries result only, failure carries error only
    assert_eq!(ok.kind, EnvelopeKind::Return);
    assert_eq!(ok.result, Some(json!(42)));
    assert_eq!(ok.error, None);
    assert_eq!(failed.result, None);
    assert_eq!(failed.error.as_deref(), Some("boom"));

    let failed_json = serde_json::to_value(&failed).expect("serialization failed");
    assert_eq!(failed_json["type"], json!("return"));
    assert_eq!(failed_json["error"], json!("boom"));
}

/// **VALUE**: Verifies a foreign-format envelope still parses.
///
/// **WHY THIS MATTERS**: The counterpart side may be implemented independently;
/// parsing must accept envelopes with optional fields absent rather than
/// requiring our own serialization quirks.
///
/// **BUG THIS CATCHES**: Would catch missing `#[serde(default)]` on optional
/// fields, which would reject minimal foreign requests.
#[test]
fn given_minimal_foreign_json_when_deserialized_then_parses_as_request() {
    // GIVEN: A minimal request as a foreign peer would send it
    let raw = r#"{"from":"peer","func":"ping","correlationId":9,"type":"call"}"#;

    // WHEN: Deserializing
    let envelope: Envelope = serde_json::from_str(raw).expect("should parse");

    // THEN: Optional fields default cleanly
    assert_eq!(envelope.kind, EnvelopeKind::Call);
    assert!(envelope.args.is_empty());
    assert_eq!(envelope.result, None);
    assert_eq!(envelope.correlation_id, 9);
}

/// **VALUE**: Verifies qualified-name splitting used for endpoint routing.
///
/// **WHY THIS MATTERS**: `<clientId>::<func>` routing is how several logical
/// endpoints share one physical transport. Splitting on the wrong separator
/// would misroute or drop every namespaced call.
///
/// **BUG THIS CATCHES**: Would catch splitting on the last separator instead of
/// the first, which changes routing for nested names.
#[test]
fn given_function_names_when_split_then_bare_and_qualified_are_distinguished() {
    // GIVEN/WHEN/THEN: Bare names stay local
    assert_eq!(split_qualified("echo"), None);

    // Qualified names split at the first separator
    assert_eq!(split_qualified("plugin-b::echo"), Some(("plugin-b", "echo")));
    assert_eq!(
        split_qualified("plugin-b::ns::echo"),
        Some(("plugin-b", "ns::echo"))
    );
}

/// **VALUE**: Verifies null results are representable.
///
/// **WHY THIS MATTERS**: Handlers returning nothing resolve the caller with
/// JSON null; the wire must distinguish "result: null" from "no result field"
/// only where it matters (requests).
///
/// **BUG THIS CATCHES**: Would catch `skip_serializing_if` accidentally
/// dropping an explicit null result from responses.
#[test]
fn given_null_result_response_when_serialized_then_result_field_is_present() {
    let envelope = Envelope::response("plugin-a", "fire", 5, Ok(Value::Null));
    let value = serde_json::to_value(&envelope).expect("serialization failed");
    assert!(
        value.as_object().expect("object").contains_key("result"),
        "Explicit null result should survive serialization"
    );
}
