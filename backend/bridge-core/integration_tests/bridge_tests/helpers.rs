//! Test helpers for bridge integration tests.
//!
//! Builds a connected backend/frontend pair over the in-process
//! transport and drives the two-way handshake to completion, so
//! individual tests start from a ready bridge.

use bridge_core::lifecycle::{BackendHost, FrontendHost};
use bridge_core::transport::{MemoryTransport, Transport};

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;

/// Plugin identity shared by both test halves.
pub const TEST_PLUGIN_ID: &str = "test-plugin";

/// A fully handshaken bridge pair plus the raw transport endpoints for
/// disposal and raw-envelope injection.
pub struct BridgePair {
    pub backend: BackendHost,
    pub frontend: FrontendHost,
    pub backend_transport: Arc<MemoryTransport>,
    pub frontend_transport: Arc<MemoryTransport>,
}

/// Build hosts over a fresh memory pair without running the handshake.
pub fn unstarted_pair(event_catalog: &[&str]) -> BridgePair {
    let (backend_transport, frontend_transport) = MemoryTransport::pair();
    let backend_side: Arc<dyn Transport> = backend_transport.clone();
    let frontend_side: Arc<dyn Transport> = frontend_transport.clone();

    let backend = BackendHost::new(
        backend_side,
        TEST_PLUGIN_ID,
        Vec::new(),
        event_catalog.iter().copied(),
    );
    let frontend = FrontendHost::new(frontend_side, TEST_PLUGIN_ID, Vec::new());

    BridgePair {
        backend,
        frontend,
        backend_transport,
        frontend_transport,
    }
}

/// Drive both sides of the handshake to Ready.
pub async fn complete_handshake(backend: &BackendHost, frontend: &FrontendHost) {
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

    assert!(backend.ready().await.expect("backend ready failed"));
    assert!(frontend.ready().await.expect("frontend ready failed"));
}

/// Build a pair and run the handshake.
pub async fn handshaken_pair(event_catalog: &[&str]) -> BridgePair {
    let pair = unstarted_pair(event_catalog);
    complete_handshake(&pair.backend, &pair.frontend).await;
    pair
}

/// Receive one value from an event-recording channel, or panic after a
/// generous deadline.
pub async fn recv_within(rx: &mut UnboundedReceiver<(String, Value)>) -> (String, Value) {
    timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for event delivery")
        .expect("recording channel closed")
}

/// Assert that nothing arrives on an event-recording channel for a
/// short window.
pub async fn assert_no_delivery(rx: &mut UnboundedReceiver<(String, Value)>) {
    let outcome = timeout(Duration::from_millis(200), rx.recv()).await;
    assert!(outcome.is_err(), "Unexpected delivery: {:?}", outcome);
}
