use crate::bridge_tests::helpers::TEST_PLUGIN_ID;

use bridge_core::error::BridgeError;
use bridge_core::lifecycle::{BackendHost, FrontendHost};
use bridge_core::rpc::sync_handler;
use bridge_core::transport::{Transport, WebSocketTransport};

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::{accept_async, connect_async};

/// Establish a localhost WebSocket connection and wrap both ends.
async fn connected_transports() -> (Arc<dyn Transport>, Arc<dyn Transport>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind failed");
    let addr = listener.local_addr().expect("local_addr failed");

    let accept = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept failed");
        accept_async(stream).await.expect("ws accept failed")
    });
    let (client_stream, _) = connect_async(format!("ws://{addr}"))
        .await
        .expect("ws connect failed");
    let server_stream = accept.await.expect("accept task panicked");

    let backend_side: Arc<dyn Transport> = WebSocketTransport::new(server_stream);
    let frontend_side: Arc<dyn Transport> = WebSocketTransport::new(client_stream);
    (backend_side, frontend_side)
}

/// **VALUE**: Verifies the whole stack over a real WebSocket.
///
/// **WHY THIS MATTERS**: The in-process transport proves the protocol;
/// this proves the production adapter - handshake, gated calls, and
/// responses all surviving JSON text-frame framing over TCP.
///
/// **BUG THIS CATCHES**: Would catch envelope serialization that only
/// works in-process, or the reader/writer tasks dropping frames.
#[tokio::test]
async fn given_websocket_pair_when_handshaken_then_calls_roundtrip() {
    // GIVEN: Hosts wired over an accepted and a connected stream
    let (backend_side, frontend_side) = connected_transports().await;
    let backend = BackendHost::new(
        backend_side,
        TEST_PLUGIN_ID,
        Vec::new(),
        std::iter::empty::<&str>(),
    );
    let frontend = FrontendHost::new(frontend_side, TEST_PLUGIN_ID, Vec::new());
    frontend.expose("echo", sync_handler(|args| Ok(args[0].clone())));

    // WHEN: The handshake runs over the wire
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

    // THEN: A call crosses the socket and comes back intact
    let echoed = backend
        .call("echo", vec![json!({"payload": [1, 2, 3]})])
        .await
        .expect("echo over websocket failed");
    assert_eq!(echoed, json!({"payload": [1, 2, 3]}));
}

/// **VALUE**: Verifies closing one WebSocket end fails the peer's
/// pending calls.
///
/// **WHY THIS MATTERS**: A vanished webview looks like a closed socket.
/// The backend must observe the close and settle outstanding calls as
/// transport failures instead of hanging on them.
///
/// **BUG THIS CATCHES**: Would catch the reader task ending without
/// firing disposal, leaving callers awaiting forever.
#[tokio::test]
async fn given_peer_socket_closed_when_call_pending_then_call_fails_with_transport_error() {
    // GIVEN: A handshaken pair over a real socket
    let (backend_side, frontend_side) = connected_transports().await;
    let backend = BackendHost::new(
        Arc::clone(&backend_side),
        TEST_PLUGIN_ID,
        Vec::new(),
        std::iter::empty::<&str>(),
    );
    let frontend = FrontendHost::new(Arc::clone(&frontend_side), TEST_PLUGIN_ID, Vec::new());
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

    // WHEN: A call to a function the frontend never answers is in
    // flight and the frontend side closes its socket
    let pending = {
        let backend = backend.clone();
        tokio::spawn(async move { backend.call("never.answered", Vec::new()).await })
    };
    tokio::task::yield_now().await;
    frontend_side.dispose();

    // THEN: The pending call settles as a transport failure
    let outcome = pending.await.expect("pending task panicked");
    assert!(
        matches!(outcome, Err(BridgeError::Transport { .. })),
        "Expected transport failure, got: {outcome:?}"
    );
}

/// **VALUE**: Verifies disposal propagates across an idle socket.
///
/// **WHY THIS MATTERS**: Teardown usually happens when nothing is in
/// flight. With no frame arriving to wake it, the peer only learns of
/// disposal because shutdown sends an explicit Close frame; its pending
/// calls must still settle and its tasks must still end.
///
/// **BUG THIS CATCHES**: Would catch shutdown merely dropping the
/// outbound sender, which leaves the peer's reader parked forever and
/// its callers hanging on a channel nobody will ever write to again.
#[tokio::test]
async fn given_idle_socket_when_peer_disposed_then_pending_call_still_settles() {
    // GIVEN: A handshaken pair with one call already delivered, dropped
    // (nothing answers it), and the channel gone quiet
    let (backend_side, frontend_side) = connected_transports().await;
    let backend = BackendHost::new(
        backend_side,
        TEST_PLUGIN_ID,
        Vec::new(),
        std::iter::empty::<&str>(),
    );
    let frontend = FrontendHost::new(Arc::clone(&frontend_side), TEST_PLUGIN_ID, Vec::new());
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

    let pending = {
        let backend = backend.clone();
        tokio::spawn(async move { backend.call("never.answered", Vec::new()).await })
    };
    tokio::time::sleep(Duration::from_millis(200)).await;

    // WHEN: The frontend disposes while no traffic is flowing
    frontend_side.dispose();

    // THEN: The backend's pending call settles promptly, not never
    let outcome = timeout(Duration::from_secs(2), pending)
        .await
        .expect("pending call not settled after peer disposal")
        .expect("pending task panicked");
    assert!(
        matches!(outcome, Err(BridgeError::Transport { .. })),
        "Expected transport failure, got: {outcome:?}"
    );
}
