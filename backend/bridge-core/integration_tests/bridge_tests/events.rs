use crate::bridge_tests::helpers::{assert_no_delivery, handshaken_pair, recv_within};

use bridge_core::events::EventHandler;

use std::sync::Arc;

use serde_json::{Value, json};
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};

/// Handler that forwards every delivery into a channel for assertions.
fn forwarding_handler(tx: UnboundedSender<(String, Value)>) -> EventHandler {
    Arc::new(move |event_type, payload| {
        tx.send((event_type.to_string(), payload.clone()))
            .map_err(|e| e.to_string())
    })
}

/// **VALUE**: Verifies the full subscribe -> fire -> unsubscribe event cycle.
///
/// **WHY THIS MATTERS**: This is the event layer's contract end to end: a
/// subscribed handler sees exactly the fired type and payload once, and after
/// unsubscription a subsequent fire produces zero invocations.
///
/// **BUG THIS CATCHES**: Would catch the backend ignoring enable requests,
/// fan-out mangling the payload, or unsubscription leaving the handler wired.
#[tokio::test]
async fn given_subscription_when_fired_then_handler_sees_event_once_until_unsubscribed() {
    // GIVEN: A ready pair sourcing "sample.changed", with one subscriber
    let pair = handshaken_pair(&["sample.changed"]).await;
    let (tx, mut rx) = unbounded_channel();
    let handler = forwarding_handler(tx);
    pair.frontend
        .subscribe_event("sample.changed", handler.clone())
        .await
        .expect("subscribe failed");

    // WHEN: The backend fires the type with a payload
    assert!(pair.backend.fire_event("sample.changed", json!({"v": 1})).await);

    // THEN: The handler is invoked once with type and payload
    let (event_type, payload) = recv_within(&mut rx).await;
    assert_eq!(event_type, "sample.changed");
    assert_eq!(payload, json!({"v": 1}));
    assert_no_delivery(&mut rx).await;

    // WHEN: Unsubscribed and fired again
    assert!(
        pair.frontend
            .unsubscribe_event("sample.changed", &handler)
            .await
            .expect("unsubscribe failed")
    );
    let fired = pair.backend.fire_event("sample.changed", json!({"v": 2})).await;

    // THEN: Dispatch is gated off and nothing is delivered
    assert!(!fired, "Fire after unsubscribe should be gated off");
    assert_no_delivery(&mut rx).await;
}

/// **VALUE**: Verifies dispatch gating for types nobody subscribed.
///
/// **WHY THIS MATTERS**: The active set, not the catalog, gates dispatch.
/// Firing an unsubscribed type must cost nothing and emit nothing - that is
/// the whole point of the subscribed-event set.
///
/// **BUG THIS CATCHES**: Would catch the backend pushing every catalog type
/// regardless of subscriptions.
#[tokio::test]
async fn given_no_subscription_when_fired_then_dispatch_is_gated_off() {
    // GIVEN: A catalog type without subscribers
    let pair = handshaken_pair(&["sample.changed"]).await;

    // WHEN/THEN: Firing it reports gated-off dispatch
    assert!(!pair.backend.fire_event("sample.changed", json!(1)).await);
}

/// **VALUE**: Verifies subscriptions for types outside the catalog are
/// ignored.
///
/// **WHY THIS MATTERS**: The backend can only source what its native catalog
/// offers. An unknown type must not enter the active set, and firing it must
/// stay gated, while the subscribe call itself stays lenient (no error).
///
/// **BUG THIS CATCHES**: Would catch unknown types silently activating and
/// later panicking at fire time.
#[tokio::test]
async fn given_unknown_event_type_when_subscribed_then_ignored_and_never_fires() {
    // GIVEN: A subscription for a type the backend cannot source
    let pair = handshaken_pair(&["sample.changed"]).await;
    let (tx, mut rx) = unbounded_channel();
    pair.frontend
        .subscribe_event("not.in.catalog", forwarding_handler(tx))
        .await
        .expect("lenient subscribe should not error");

    // WHEN/THEN: Firing it stays gated and nothing arrives
    assert!(!pair.backend.fire_event("not.in.catalog", json!(1)).await);
    assert_no_delivery(&mut rx).await;
}

/// **VALUE**: Verifies the pinned no-dedup policy over the full stack.
///
/// **WHY THIS MATTERS**: Subscribing the same handler twice doubles delivery;
/// the backend's active set stays idempotent underneath. Both halves of that
/// policy have to hold at once.
///
/// **BUG THIS CATCHES**: Would catch either half drifting - a deduping
/// frontend registry, or a backend that double-fires per duplicate enable.
#[tokio::test]
async fn given_same_handler_subscribed_twice_when_fired_then_delivered_twice() {
    // GIVEN: The same handler subscribed twice
    let pair = handshaken_pair(&["sample.changed"]).await;
    let (tx, mut rx) = unbounded_channel();
    let handler = forwarding_handler(tx);
    for _ in 0..2 {
        pair.frontend
            .subscribe_event("sample.changed", handler.clone())
            .await
            .expect("subscribe failed");
    }

    // WHEN: Firing once
    assert!(pair.backend.fire_event("sample.changed", json!(7)).await);

    // THEN: Exactly two deliveries arrive
    recv_within(&mut rx).await;
    recv_within(&mut rx).await;
    assert_no_delivery(&mut rx).await;
}

/// **VALUE**: Verifies unsubscribe_all disables every affected type.
///
/// **WHY THIS MATTERS**: Teardown paths call unsubscribe_all; a type left
/// active would keep paying dispatch cost and pushing events at a page that
/// stopped listening.
///
/// **BUG THIS CATCHES**: Would catch unsubscribe_all clearing local handlers
/// without disabling the types backend-side.
#[tokio::test]
async fn given_multiple_subscriptions_when_unsubscribe_all_then_every_type_gated_off() {
    // GIVEN: Two subscribed types
    let pair = handshaken_pair(&["a.changed", "b.changed"]).await;
    let (tx, _rx) = unbounded_channel();
    for event_type in ["a.changed", "b.changed"] {
        pair.frontend
            .subscribe_event(event_type, forwarding_handler(tx.clone()))
            .await
            .expect("subscribe failed");
    }

    // WHEN: Unsubscribing everything
    pair.frontend
        .unsubscribe_all()
        .await
        .expect("unsubscribe_all failed");

    // THEN: Both types are gated off again
    assert!(!pair.backend.fire_event("a.changed", json!(1)).await);
    assert!(!pair.backend.fire_event("b.changed", json!(2)).await);
}
