// Unit tests for the frontend handler registry and fan-out
// Pins ordering, identity-based removal, and handler-failure isolation

use crate::events::{EventHandler, FrontendEvents};

use std::sync::{Arc, Mutex};

use serde_json::json;

fn recording_handler(label: &'static str, log: &Arc<Mutex<Vec<String>>>) -> EventHandler {
    let log = Arc::clone(log);
    Arc::new(move |event_type, payload| {
        log.lock()
            .unwrap()
            .push(format!("{label}:{event_type}:{payload}"));
        Ok(())
    })
}

/// **VALUE**: Verifies fan-out hits every handler in registration order.
///
/// **WHY THIS MATTERS**: Registration order is the documented fan-out order;
/// UI code frequently relies on a logging handler seeing events before the
/// handler that mutates state.
///
/// **BUG THIS CATCHES**: Would catch a switch to unordered storage (e.g. a
/// set) that scrambles delivery order.
#[test]
fn given_two_handlers_when_dispatched_then_invoked_in_registration_order() {
    // GIVEN: Two handlers registered in order
    let events = FrontendEvents::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    events.add("sample.changed", recording_handler("a", &log));
    events.add("sample.changed", recording_handler("b", &log));

    // WHEN: Dispatching one event
    let delivered = events.dispatch("sample.changed", &json!({"v": 1}));

    // THEN: Both handlers ran, in order, with type and payload
    assert_eq!(delivered, 2);
    let log = log.lock().unwrap();
    assert_eq!(
        *log,
        vec![
            "a:sample.changed:{\"v\":1}".to_string(),
            "b:sample.changed:{\"v\":1}".to_string(),
        ]
    );
}

/// **VALUE**: Verifies removal is by handler identity, not structure.
///
/// **WHY THIS MATTERS**: Two structurally identical closures are distinct
/// subscriptions. Removing one must not unhook the other, or a component
/// could silently cancel a sibling's subscription.
///
/// **BUG THIS CATCHES**: Would catch removal comparing behavior or position
/// instead of `Arc` identity.
#[test]
fn given_equal_but_distinct_handlers_when_one_removed_then_other_still_fires() {
    // GIVEN: Two separately created but identical handlers
    let events = FrontendEvents::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let first = recording_handler("x", &log);
    let second = recording_handler("x", &log);
    events.add("sample.changed", first.clone());
    events.add("sample.changed", second);

    // WHEN: Removing the first by reference
    assert!(events.remove("sample.changed", &first));

    // THEN: Exactly one registration remains
    assert_eq!(events.dispatch("sample.changed", &json!(null)), 1);
    assert!(
        !events.remove("sample.changed", &first),
        "Second removal of the same handle should report absence"
    );
}

/// **VALUE**: Verifies the same handler registered twice fires twice.
///
/// **WHY THIS MATTERS**: The registry explicitly does not dedup; double
/// subscription doubling delivery is the pinned policy, and callers who want
/// at-most-once must not subscribe twice.
///
/// **BUG THIS CATCHES**: Would catch someone "fixing" the registry to dedup by
/// identity, silently changing delivery counts.
#[test]
fn given_same_handler_subscribed_twice_when_dispatched_then_fires_twice() {
    let events = FrontendEvents::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let handler = recording_handler("h", &log);
    events.add("sample.changed", handler.clone());
    events.add("sample.changed", handler);

    assert_eq!(events.dispatch("sample.changed", &json!(1)), 2);
}

/// **VALUE**: Verifies a failing handler does not abort the rest of fan-out.
///
/// **WHY THIS MATTERS**: Handlers come from independent subscribers; one
/// broken subscriber must not starve the others of their deliveries. This
/// test pins the isolation policy.
///
/// **BUG THIS CATCHES**: Would catch fan-out returning early on the first
/// handler error.
#[test]
fn given_failing_first_handler_when_dispatched_then_remaining_handlers_still_run() {
    // GIVEN: A failing handler registered before a healthy one
    let events = FrontendEvents::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    events.add(
        "sample.changed",
        Arc::new(|_: &str, _: &serde_json::Value| Err("handler broke".to_string())) as EventHandler,
    );
    events.add("sample.changed", recording_handler("ok", &log));

    // WHEN: Dispatching
    let delivered = events.dispatch("sample.changed", &json!(2));

    // THEN: The healthy handler still ran; only it counts as delivered
    assert_eq!(delivered, 1);
    assert_eq!(log.lock().unwrap().len(), 1);
}

/// **VALUE**: Verifies clear() empties the registry and reports affected types.
///
/// **WHY THIS MATTERS**: `unsubscribe_all` uses the returned type list to
/// disable each type backend-side; a type missing from the list would stay
/// enabled and keep paying dispatch cost.
///
/// **BUG THIS CATCHES**: Would catch clear() dropping handlers without
/// reporting their types.
#[test]
fn given_registrations_when_cleared_then_all_types_reported_and_nothing_fires() {
    let events = FrontendEvents::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    events.add("a.changed", recording_handler("a", &log));
    events.add("b.changed", recording_handler("b", &log));

    let mut types = events.clear();
    types.sort();
    assert_eq!(types, vec!["a.changed".to_string(), "b.changed".to_string()]);
    assert_eq!(events.dispatch("a.changed", &json!(null)), 0);
}
