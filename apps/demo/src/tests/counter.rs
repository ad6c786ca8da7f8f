// Unit tests for the counter demo component

use crate::counter::CounterComponent;

/// **VALUE**: Verifies the exposed increment handler and the component
/// share one counter.
///
/// **WHY THIS MATTERS**: The handler is built from the component but
/// outlives the borrow; if it captured a copy instead of the shared
/// state, remote increments would never show up in the component.
///
/// **BUG THIS CATCHES**: Would catch the handler cloning the value
/// instead of the Arc.
#[tokio::test]
async fn given_increment_handler_when_invoked_then_component_sees_new_value() {
    // GIVEN: A component and its handler
    let counter = CounterComponent::new();
    let handler = counter.increment_handler();

    // WHEN: Invoking the handler twice
    let first = handler(Vec::new()).await.expect("increment failed");
    let second = handler(Vec::new()).await.expect("increment failed");

    // THEN: Returned values advance and the component observes them
    assert_eq!(first, serde_json::json!(1));
    assert_eq!(second, serde_json::json!(2));
    assert_eq!(counter.current(), 2);
}
