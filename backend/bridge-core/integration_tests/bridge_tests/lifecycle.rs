use crate::bridge_tests::helpers::{
    TEST_PLUGIN_ID, assert_no_delivery, handshaken_pair, recv_within, unstarted_pair,
};

use bridge_core::error::BridgeError;
use bridge_core::lifecycle::{BackendHost, BridgeComponent, FrontendHost};
use bridge_core::rpc::sync_handler;
use bridge_core::transport::{MemoryTransport, Transport};

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use serde_json::json;
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};
use tokio::time::timeout;

/// Component that logs its lifecycle phases into a channel, optionally
/// refusing to initialize.
struct ProbeComponent {
    name: String,
    log: UnboundedSender<String>,
    fail_init: bool,
}

impl ProbeComponent {
    fn new(name: &str, log: UnboundedSender<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            log,
            fail_init: false,
        })
    }

    fn failing(name: &str, log: UnboundedSender<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            log,
            fail_init: true,
        })
    }
}

impl BridgeComponent for ProbeComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&self) -> BoxFuture<'_, Result<(), BridgeError>> {
        Box::pin(async move {
            if self.fail_init {
                return Err(BridgeError::transport("probe init refused"));
            }
            let _ = self.log.send(format!("init:{}", self.name));
            Ok(())
        })
    }

    fn run(&self) -> BoxFuture<'_, Result<(), BridgeError>> {
        Box::pin(async move {
            let _ = self.log.send(format!("run:{}", self.name));
            Ok(())
        })
    }
}

async fn recv_log(rx: &mut tokio::sync::mpsc::UnboundedReceiver<String>) -> String {
    timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for probe log entry")
        .expect("probe log channel closed")
}

/// **VALUE**: Verifies backend calls issued before the page announces
/// itself are held back, then delivered in issuance order.
///
/// **WHY THIS MATTERS**: Backend components start calling into the page
/// as soon as they initialize, long before the webview finishes loading.
/// Those calls must neither be lost nor reordered; the page sees them
/// exactly as issued once it is ready.
///
/// **BUG THIS CATCHES**: Would catch calls leaking onto the wire before
/// the handshake, or a queue that flushes newest-first.
#[tokio::test]
async fn given_calls_before_page_init_when_handshake_completes_then_flushed_in_issuance_order() {
    // GIVEN: A started frontend that has not announced its DOM yet
    let pair = unstarted_pair(&[]);
    let (tx, mut rx) = unbounded_channel();
    pair.frontend.expose(
        "record",
        sync_handler(move |args| {
            let _ = tx.send(("record".to_string(), args[0].clone()));
            Ok(args[0].clone())
        }),
    );
    pair.frontend.start().await.expect("frontend start failed");
    let backend_started = {
        let backend = pair.backend.clone();
        tokio::spawn(async move { backend.start().await })
    };

    // WHEN: Three calls are issued before the page announcement
    let caller = {
        let backend = pair.backend.clone();
        tokio::spawn(async move {
            tokio::join!(
                backend.call("record", vec![json!(1)]),
                backend.call("record", vec![json!(2)]),
                backend.call("record", vec![json!(3)]),
            )
        })
    };

    // THEN: Nothing reaches the frontend while the gate is closed
    assert_no_delivery(&mut rx).await;

    // WHEN: The page announces itself
    pair.frontend
        .notify_dom_ready()
        .await
        .expect("dom-ready handshake failed");

    // THEN: All three complete, delivered in issuance order
    let (r1, r2, r3) = caller.await.expect("caller task panicked");
    assert_eq!(r1.expect("call 1 failed"), json!(1));
    assert_eq!(r2.expect("call 2 failed"), json!(2));
    assert_eq!(r3.expect("call 3 failed"), json!(3));
    for expected in 1..=3 {
        let (_, arg) = recv_within(&mut rx).await;
        assert_eq!(arg, json!(expected));
    }
    backend_started
        .await
        .expect("backend task panicked")
        .expect("backend start failed");
}

/// **VALUE**: Verifies the symmetric frontend-side gate.
///
/// **WHY THIS MATTERS**: Frontend code may call into the backend before
/// the backend acknowledged initialization. Those calls queue until the
/// acknowledgment arrives, mirroring the backend's page gate.
///
/// **BUG THIS CATCHES**: Would catch only one direction being gated.
#[tokio::test]
async fn given_frontend_call_before_backend_ack_when_handshake_completes_then_call_succeeds() {
    // GIVEN: A backend-exposed recorder and an unstarted handshake
    let pair = unstarted_pair(&[]);
    let (tx, mut rx) = unbounded_channel();
    pair.backend.expose(
        "record",
        sync_handler(move |args| {
            let _ = tx.send(("record".to_string(), args[0].clone()));
            Ok(json!("ack"))
        }),
    );
    pair.frontend.start().await.expect("frontend start failed");
    let backend_started = {
        let backend = pair.backend.clone();
        tokio::spawn(async move { backend.start().await })
    };

    // WHEN: A frontend call is issued before dom-ready
    let caller = {
        let frontend = pair.frontend.clone();
        tokio::spawn(async move { frontend.call("record", vec![json!("early")]).await })
    };
    assert_no_delivery(&mut rx).await;
    pair.frontend
        .notify_dom_ready()
        .await
        .expect("dom-ready handshake failed");

    // THEN: The queued call goes through after the acknowledgment
    let result = caller.await.expect("caller task panicked");
    assert_eq!(result.expect("early call failed"), json!("ack"));
    let (_, arg) = recv_within(&mut rx).await;
    assert_eq!(arg, json!("early"));
    backend_started
        .await
        .expect("backend task panicked")
        .expect("backend start failed");
}

/// **VALUE**: Verifies component init() completes before run() starts,
/// on both sides.
///
/// **WHY THIS MATTERS**: run() code assumes whatever init() prepared.
/// Dispatching run() before the handshake (or before init finished)
/// breaks that assumption.
///
/// **BUG THIS CATCHES**: Would catch run() being spawned alongside
/// init() instead of after readiness.
#[tokio::test]
async fn given_components_on_both_sides_when_handshake_completes_then_init_precedes_run() {
    // GIVEN: A probe component hosted on each side
    let (backend_transport, frontend_transport) = MemoryTransport::pair();
    let backend_side: Arc<dyn Transport> = backend_transport;
    let frontend_side: Arc<dyn Transport> = frontend_transport;
    let (log_tx, mut log_rx) = unbounded_channel();

    let backend = BackendHost::new(
        backend_side,
        TEST_PLUGIN_ID,
        vec![ProbeComponent::new("back", log_tx.clone()) as Arc<dyn BridgeComponent>],
        std::iter::empty::<&str>(),
    );
    let frontend = FrontendHost::new(
        frontend_side,
        TEST_PLUGIN_ID,
        vec![ProbeComponent::new("front", log_tx) as Arc<dyn BridgeComponent>],
    );

    // WHEN: The handshake runs to completion
    let backend_started = {
        let backend = backend.clone();
        tokio::spawn(async move { backend.start().await })
    };
    frontend.start().await.expect("frontend start failed");
    frontend
        .notify_dom_ready()
        .await
        .expect("dom-ready handshake failed");
    backend_started
        .await
        .expect("backend task panicked")
        .expect("backend start failed");

    // THEN: Each side logs init strictly before its run
    let mut entries = Vec::new();
    for _ in 0..4 {
        entries.push(recv_log(&mut log_rx).await);
    }
    for name in ["back", "front"] {
        let init_at = entries.iter().position(|e| e == &format!("init:{name}"));
        let run_at = entries.iter().position(|e| e == &format!("run:{name}"));
        assert!(
            init_at.expect("missing init entry") < run_at.expect("missing run entry"),
            "init must precede run for '{name}': {entries:?}"
        );
    }
}

/// **VALUE**: Verifies a failing component init fails the whole startup.
///
/// **WHY THIS MATTERS**: A side whose component could not prepare must
/// not announce readiness; the caller needs the failure surfaced as a
/// component error naming the culprit.
///
/// **BUG THIS CATCHES**: Would catch init errors being swallowed and
/// the handshake proceeding on a half-initialized side.
#[tokio::test]
async fn given_failing_component_init_when_started_then_startup_fails_with_component_error() {
    // GIVEN: A backend hosting a component that refuses to init
    let (backend_transport, _frontend_transport) = MemoryTransport::pair();
    let backend_side: Arc<dyn Transport> = backend_transport;
    let (log_tx, _log_rx) = unbounded_channel();
    let backend = BackendHost::new(
        backend_side,
        TEST_PLUGIN_ID,
        vec![ProbeComponent::failing("broken", log_tx) as Arc<dyn BridgeComponent>],
        std::iter::empty::<&str>(),
    );

    // WHEN: Startup runs
    let err = backend.start().await.expect_err("startup should fail");

    // THEN: The error is a component error naming the component
    match err {
        BridgeError::Component { message, .. } => {
            assert!(message.contains("broken"), "Unexpected message: {message}")
        }
        other => panic!("Expected component error, got: {other}"),
    }
}

/// **VALUE**: Verifies the before-uninstall self-teardown path.
///
/// **WHY THIS MATTERS**: When the host retires this plugin, the backend
/// must notify the page and then dismantle itself so nothing keeps
/// running against a page that is about to disappear.
///
/// **BUG THIS CATCHES**: Would catch the teardown never firing, or the
/// instance remaining usable after it.
#[tokio::test]
async fn given_before_uninstall_naming_this_plugin_when_fired_then_instance_torn_down() {
    // GIVEN: A ready pair
    let pair = handshaken_pair(&[]).await;

    // WHEN: before-uninstall fires naming this plugin
    let notified = pair
        .backend
        .fire_event("before-uninstall", json!({ "pluginId": TEST_PLUGIN_ID }))
        .await;

    // THEN: The notification went out and the instance is dead
    assert!(notified, "Auto-subscribed before-uninstall should dispatch");
    let outcome = pair.backend.call("anything", Vec::new()).await;
    assert!(
        matches!(outcome, Err(BridgeError::Transport { .. })),
        "Calls after teardown should fail: {outcome:?}"
    );
}

/// **VALUE**: Verifies before-uninstall for a different plugin leaves
/// this instance alive.
///
/// **WHY THIS MATTERS**: The host broadcasts uninstall notices; only
/// the named plugin tears down. Everyone else forwards the event and
/// keeps serving.
///
/// **BUG THIS CATCHES**: Would catch teardown triggering on any
/// before-uninstall regardless of the payload.
#[tokio::test]
async fn given_before_uninstall_naming_other_plugin_when_fired_then_instance_stays_alive() {
    // GIVEN: A ready pair with an echo function on the frontend
    let pair = handshaken_pair(&[]).await;
    pair.frontend
        .expose("echo", sync_handler(|args| Ok(args[0].clone())));

    // WHEN: before-uninstall fires naming some other plugin
    let notified = pair
        .backend
        .fire_event("before-uninstall", json!({ "pluginId": "someone-else" }))
        .await;

    // THEN: The event still dispatched, and this instance keeps serving
    assert!(notified);
    let echoed = pair
        .backend
        .call("echo", vec![json!("still here")])
        .await
        .expect("instance should remain usable");
    assert_eq!(echoed, json!("still here"));
}
