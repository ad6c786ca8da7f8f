// Unit tests for the function exposure registry

use crate::rpc::{ExposedFunctions, async_handler, sync_handler};

use serde_json::{Value, json};

/// **VALUE**: Verifies name -> handler registration and lookup round out.
///
/// **WHY THIS MATTERS**: Inbound dispatch consults this table exclusively; a
/// broken lookup silently drops every remote call.
///
/// **BUG THIS CATCHES**: Would catch handler wrapping losing arguments or the
/// table keying on something other than the exact registered name.
#[tokio::test]
async fn given_registered_function_when_looked_up_then_invokes_with_arguments() {
    // GIVEN: An exposure table with one function
    let exposed = ExposedFunctions::new();
    exposed.register(
        "sum",
        sync_handler(|args| {
            let total: i64 = args.iter().filter_map(Value::as_i64).sum();
            Ok(json!(total))
        }),
    );

    // WHEN: Looking up and invoking
    let handler = exposed.lookup("sum").expect("should be registered");
    let outcome = handler(vec![json!(1), json!(2), json!(3)]).await;

    // THEN: Arguments reached the implementation positionally
    assert_eq!(outcome.unwrap(), json!(6));
    assert!(exposed.lookup("other").is_none(), "Unknown names miss");
}

/// **VALUE**: Verifies that a duplicate registration shadows the earlier one.
///
/// **WHY THIS MATTERS**: Names must be unique within a side; the documented
/// policy for collisions is silent shadowing (plus a logged warning), not an
/// error and not first-wins. Callers rely on the policy being stable.
///
/// **BUG THIS CATCHES**: Would catch a switch to first-wins semantics, which
/// would invert which implementation answers remote calls after a collision.
#[tokio::test]
async fn given_duplicate_name_when_registered_then_later_handler_shadows_earlier() {
    // GIVEN: Two registrations under one name
    let exposed = ExposedFunctions::new();
    exposed.register("version", sync_handler(|_| Ok(json!("first"))));
    exposed.register("version", sync_handler(|_| Ok(json!("second"))));

    // WHEN: Invoking
    let handler = exposed.lookup("version").expect("should be registered");

    // THEN: The later registration answers
    assert_eq!(handler(Vec::new()).await.unwrap(), json!("second"));
}

/// **VALUE**: Verifies async handlers propagate their errors as strings.
///
/// **WHY THIS MATTERS**: A remote-handler error travels the wire as the
/// response's error field; the string produced here is exactly what the caller
/// will see inside its rejection.
///
/// **BUG THIS CATCHES**: Would catch the async wrapper swallowing errors or
/// turning them into panics inside the dispatch task.
#[tokio::test]
async fn given_failing_async_handler_when_invoked_then_error_string_is_returned() {
    // GIVEN: An async handler that fails
    let exposed = ExposedFunctions::new();
    exposed.register(
        "explode",
        async_handler(|_args| async move { Err::<Value, _>("kaboom".to_string()) }),
    );

    // WHEN: Invoking
    let handler = exposed.lookup("explode").expect("should be registered");
    let outcome = handler(Vec::new()).await;

    // THEN: The error string survives intact
    assert_eq!(outcome.unwrap_err(), "kaboom");
}
