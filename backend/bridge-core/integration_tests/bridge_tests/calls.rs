use crate::bridge_tests::helpers::{TEST_PLUGIN_ID, handshaken_pair};

use bridge_core::error::BridgeError;
use bridge_core::rpc::{async_handler, sync_handler};
use bridge_core::transport::Transport;
use bridge_core::wire::Envelope;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Value, json};
use tokio::sync::oneshot;
use tokio::time::timeout;

/// **VALUE**: Verifies the canonical request/response round trip.
///
/// **WHY THIS MATTERS**: `call` -> dispatch -> response -> settlement is the
/// spine of the whole bridge. If an echoed argument does not come back intact,
/// nothing built on top of the bridge can work.
///
/// **BUG THIS CATCHES**: Would catch correlation id mismatches, envelope
/// field mix-ups, and dispatch losing arguments.
#[tokio::test]
async fn given_exposed_echo_when_called_then_resolves_with_argument() {
    // GIVEN: A ready pair where the backend exposes "echo"
    let pair = handshaken_pair(&[]).await;
    pair.backend.expose(
        "echo",
        sync_handler(|args| Ok(args.into_iter().next().unwrap_or(Value::Null))),
    );

    // WHEN: The frontend calls echo with 42
    let result = pair
        .frontend
        .call("echo", vec![json!(42)])
        .await
        .expect("echo call failed");

    // THEN: It resolves with exactly 42
    assert_eq!(result, json!(42));
}

/// **VALUE**: Verifies responses arriving out of issuance order settle the
/// right promises.
///
/// **WHY THIS MATTERS**: Arrival order carries no meaning; only the
/// correlation table decides which call a response settles. Concurrent calls
/// with swapped responses are the primary production hazard for an RPC core.
///
/// **BUG THIS CATCHES**: Would catch settlement by arrival order (first
/// response settling the first issued call), which would hand callers each
/// other's results.
#[tokio::test]
async fn given_reversed_response_order_when_two_calls_pending_then_results_not_swapped() {
    // GIVEN: slow_a blocks on a release signal, slow_b answers immediately
    let pair = handshaken_pair(&[]).await;
    let (release_tx, release_rx) = oneshot::channel::<()>();
    let release_slot = Arc::new(Mutex::new(Some(release_rx)));

    pair.backend.expose(
        "slowA",
        async_handler(move |_args| {
            let release_slot = Arc::clone(&release_slot);
            async move {
                let waiter = release_slot.lock().unwrap().take();
                if let Some(rx) = waiter {
                    let _ = rx.await;
                }
                Ok(json!("slow-a"))
            }
        }),
    );
    pair.backend
        .expose("slowB", sync_handler(|_args| Ok(json!("slow-b"))));

    // WHEN: A is issued first, B second, and B's response arrives first
    let call_a = {
        let frontend = pair.frontend.clone();
        tokio::spawn(async move { frontend.call("slowA", Vec::new()).await })
    };
    let result_b = pair
        .frontend
        .call("slowB", Vec::new())
        .await
        .expect("slowB failed");
    release_tx.send(()).expect("release signal dropped");
    let result_a = call_a
        .await
        .expect("slowA task panicked")
        .expect("slowA failed");

    // THEN: Each call resolved to its own function's result
    assert_eq!(result_a, json!("slow-a"));
    assert_eq!(result_b, json!("slow-b"));
}

/// **VALUE**: Verifies a remote handler error becomes a local rejection.
///
/// **WHY THIS MATTERS**: Exceptions on the receiving side must be caught at
/// the dispatch site, travel as the response's error field, and surface as a
/// structured error to the caller - not as a hang or a panic.
///
/// **BUG THIS CATCHES**: Would catch handler errors being swallowed (caller
/// pending forever) or collapsing into a generic success.
#[tokio::test]
async fn given_failing_remote_handler_when_called_then_caller_gets_remote_error() {
    // GIVEN: The backend exposes a failing function
    let pair = handshaken_pair(&[]).await;
    pair.backend.expose(
        "fail",
        sync_handler(|_args| Err("boom at the far end".to_string())),
    );

    // WHEN: The frontend calls it
    let outcome = pair.frontend.call("fail", Vec::new()).await;

    // THEN: A Remote error carrying the handler's message comes back
    match outcome {
        Err(BridgeError::Remote { message, .. }) => {
            assert!(message.contains("boom at the far end"));
        }
        other => panic!("Expected Remote error, got {other:?}"),
    }
}

/// **VALUE**: Verifies unknown function names are dropped without a response.
///
/// **WHY THIS MATTERS**: The channel may carry unrelated traffic, so unmatched
/// requests are deliberately not errors. The caller must simply stay pending;
/// the receiving side must not crash or answer.
///
/// **BUG THIS CATCHES**: Would catch the dispatch path sending error responses
/// for unknown names (breaking channel sharing) or panicking on them.
#[tokio::test]
async fn given_unexposed_function_when_called_then_no_response_and_call_stays_pending() {
    // GIVEN: A ready pair with nothing exposed beyond the defaults
    let pair = handshaken_pair(&[]).await;

    // WHEN: Calling a function nobody exposed
    let pending = pair.frontend.call("missing", Vec::new());

    // THEN: The call is still pending after a generous window
    let outcome = timeout(Duration::from_millis(300), pending).await;
    assert!(
        outcome.is_err(),
        "Call to an unexposed function must stay pending, got {outcome:?}"
    );
}

/// **VALUE**: Verifies qualified-name routing both to and past this endpoint.
///
/// **WHY THIS MATTERS**: `<clientId>::<func>` is how several logical endpoints
/// share one transport. A request qualified with a foreign client id must be
/// ignored; one qualified with ours must dispatch like a bare name.
///
/// **BUG THIS CATCHES**: Would catch the qualifier being treated as part of
/// the function name, which would break every namespaced call.
#[tokio::test]
async fn given_qualified_names_when_called_then_only_matching_client_dispatches() {
    // GIVEN: The backend (client id "test-plugin") exposes "whoami"
    let pair = handshaken_pair(&[]).await;
    pair.backend
        .expose("whoami", sync_handler(|_args| Ok(json!("backend"))));

    // WHEN/THEN: Qualified with our client id, the call resolves
    let result = pair
        .frontend
        .call(&format!("{TEST_PLUGIN_ID}::whoami"), Vec::new())
        .await
        .expect("qualified call failed");
    assert_eq!(result, json!("backend"));

    // Qualified with a foreign client id, the request is dropped silently
    let foreign = pair
        .frontend
        .call("some-other-plugin::whoami", Vec::new());
    let outcome = timeout(Duration::from_millis(300), foreign).await;
    assert!(outcome.is_err(), "Foreign-qualified call must stay pending");
}

/// **VALUE**: Verifies unrelated envelopes on the shared channel do not
/// disturb a pending call.
///
/// **WHY THIS MATTERS**: Responses with stale or foreign correlation ids must
/// be dropped silently while genuine responses keep settling the right calls.
///
/// **BUG THIS CATCHES**: Would catch stale responses settling fresh calls, or
/// foreign traffic crashing the inbound path.
#[tokio::test]
async fn given_stale_response_injected_when_real_call_made_then_it_still_resolves() {
    // GIVEN: A ready pair with echo exposed
    let pair = handshaken_pair(&[]).await;
    pair.backend.expose(
        "echo",
        sync_handler(|args| Ok(args.into_iter().next().unwrap_or(Value::Null))),
    );

    // WHEN: A stale response envelope is injected toward the frontend
    let stale = Envelope::response("nobody", "ghost", 999_999, Ok(json!("stale")));
    assert!(pair.backend_transport.post_message(stale));

    // THEN: A real call is unaffected
    let result = pair
        .frontend
        .call("echo", vec![json!("still fine")])
        .await
        .expect("echo call failed");
    assert_eq!(result, json!("still fine"));
}

/// **VALUE**: Verifies transport disposal settles every pending call, once.
///
/// **WHY THIS MATTERS**: This is the only built-in cancellation mechanism.
/// Without it a torn-down panel leaks promises forever; with it every caller
/// gets a deterministic Transport error. Note the design choice pinned here:
/// infrastructure failure is an explicit error variant, never a value that
/// could be confused with a remote function returning `false`.
///
/// **BUG THIS CATCHES**: Would catch pending calls left unsettled on dispose,
/// or a double settlement panic on the oneshot channel.
#[tokio::test]
async fn given_pending_calls_when_transport_disposed_then_all_settle_with_transport_error() {
    // GIVEN: Two calls pending on functions nobody answers
    let pair = handshaken_pair(&[]).await;
    let first = {
        let frontend = pair.frontend.clone();
        tokio::spawn(async move { frontend.call("never.answered", Vec::new()).await })
    };
    let second = {
        let frontend = pair.frontend.clone();
        tokio::spawn(async move { frontend.call("also.never", Vec::new()).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    // WHEN: The frontend's transport endpoint is disposed (twice - the
    // second dispose must be a harmless no-op)
    pair.frontend_transport.dispose();
    pair.frontend_transport.dispose();

    // THEN: Both calls settle with a Transport error
    for task in [first, second] {
        let outcome = task.await.expect("call task panicked");
        match outcome {
            Err(BridgeError::Transport { .. }) => {}
            other => panic!("Expected Transport error, got {other:?}"),
        }
    }

    // And new calls fail immediately on the dead bridge
    let late = pair.frontend.call("echo", Vec::new()).await;
    assert!(matches!(late, Err(BridgeError::Transport { .. })));
}
