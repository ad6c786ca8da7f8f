// Unit tests for the Deferred one-shot primitive
// Tests settle-once semantics and waiting from both sides of settlement

use crate::deferred::Deferred;

use std::time::Duration;

/// **VALUE**: Verifies that waiting after resolution yields the value immediately.
///
/// **WHY THIS MATTERS**: Readiness deferreds are frequently read after the fact -
/// a late `ready()` caller must still observe the settled value, not hang.
///
/// **BUG THIS CATCHES**: Would catch if settlement state were consumed by the
/// first waiter instead of being shared by all of them.
#[tokio::test]
async fn given_resolved_deferred_when_waiting_then_yields_value_immediately() {
    // GIVEN: A deferred resolved before anyone waits
    let deferred = Deferred::new();
    deferred.resolve(7u32);

    // WHEN: Waiting after settlement, twice
    let first = deferred.wait().await;
    let second = deferred.wait().await;

    // THEN: Both waits observe the same value
    assert_eq!(first.unwrap(), 7);
    assert_eq!(second.unwrap(), 7);
}

/// **VALUE**: Verifies that a waiter parked before settlement is woken with the value.
///
/// **WHY THIS MATTERS**: The handshake orchestrator parks on readiness deferreds
/// for arbitrarily long. A lost wakeup would freeze the whole bridge startup.
///
/// **BUG THIS CATCHES**: Would catch the classic notify-before-arm race where a
/// settlement between state check and await is missed forever.
#[tokio::test]
async fn given_pending_deferred_when_resolved_then_parked_waiter_wakes() {
    // GIVEN: A waiter parked on a pending deferred
    let deferred: Deferred<String> = Deferred::new();
    let waiter = {
        let deferred = deferred.clone();
        tokio::spawn(async move { deferred.wait().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(deferred.is_pending(), "Should still be pending");

    // WHEN: Resolving
    deferred.resolve("done".to_string());

    // THEN: The parked waiter wakes with the value
    let outcome = waiter.await.expect("waiter task panicked");
    assert_eq!(outcome.unwrap(), "done");
    assert!(!deferred.is_pending(), "Should report settled");
}

/// **VALUE**: Verifies that the second settlement is a no-op.
///
/// **WHY THIS MATTERS**: Both handshake paths may race to settle the same
/// deferred (e.g. a duplicate onPageInit). Settle-once idempotence is what makes
/// that race harmless.
///
/// **BUG THIS CATCHES**: Would catch if a later resolve or reject overwrote the
/// first settlement, changing what earlier waiters already observed.
#[tokio::test]
async fn given_settled_deferred_when_settled_again_then_first_outcome_wins() {
    // GIVEN: A resolved deferred
    let deferred = Deferred::new();
    deferred.resolve(1u32);

    // WHEN: Resolving again and rejecting afterwards
    deferred.resolve(2u32);
    deferred.reject("too late");

    // THEN: The first resolution is the only observable outcome
    assert_eq!(deferred.wait().await.unwrap(), 1);
}

/// **VALUE**: Verifies that rejection surfaces as a handshake error to waiters.
///
/// **WHY THIS MATTERS**: Component init failures reject readiness; callers must
/// get a structured error rather than a value or a hang.
///
/// **BUG THIS CATCHES**: Would catch rejection being silently swallowed or
/// reported as success.
#[tokio::test]
async fn given_rejected_deferred_when_waiting_then_returns_handshake_error() {
    // GIVEN: A rejected deferred
    let deferred: Deferred<()> = Deferred::new();
    deferred.reject("init failed");

    // WHEN: Waiting
    let outcome = deferred.wait().await;

    // THEN: The rejection message is carried in the error
    let error = outcome.expect_err("should be rejected");
    assert!(
        error.to_string().contains("init failed"),
        "Error should carry the rejection message, got: {error}"
    );
}
