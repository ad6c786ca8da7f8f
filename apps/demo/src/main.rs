//! Demo host wiring both bridge halves in one process.
//!
//! Stands in for a real embedding: the backend half plays the plugin
//! backend, the frontend half plays the page script, and the in-process
//! transport replaces the webview message channel. Walks through the
//! handshake, a few calls in each direction, event subscription, and
//! the before-uninstall teardown.

use bridge_demo::counter::{CounterComponent, EVENT_COUNTER_CHANGED};
use bridge_demo::error::DemoError;
use bridge_demo::logger::initialize as logger_initialize;

use bridge_core::lifecycle::{BackendHost, BridgeComponent, FrontendHost};
use bridge_core::rpc::sync_handler;
use bridge_core::transport::{MemoryTransport, Transport};

use common::ErrorLocation;

use std::fs::create_dir_all;
use std::panic::Location;
use std::sync::Arc;

use log::info;
use serde_json::json;
use uuid::Uuid;

const PLUGIN_ID: &str = "demo-plugin";

#[tokio::main]
async fn main() -> Result<(), DemoError> {
    let log_dir = std::env::temp_dir().join("bridge-demo-logs");
    create_dir_all(&log_dir).map_err(|e| DemoError::Demo {
        message: format!("Failed to create log directory: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;
    logger_initialize(&log_dir)?;

    let instance_id = Uuid::new_v4();
    info!("Bridge demo starting, instance {instance_id}");

    let (backend_transport, frontend_transport) = MemoryTransport::pair();
    let backend_side: Arc<dyn Transport> = backend_transport;
    let frontend_side: Arc<dyn Transport> = frontend_transport;

    // Backend half: hosts the counter and can source counter.changed.
    let counter = CounterComponent::new();
    let backend = BackendHost::new(
        backend_side,
        PLUGIN_ID,
        vec![Arc::clone(&counter) as Arc<dyn BridgeComponent>],
        [EVENT_COUNTER_CHANGED],
    );
    backend.expose("increment", counter.increment_handler());

    // Frontend half: exposes a greeter the backend can call.
    let frontend = FrontendHost::new(frontend_side, PLUGIN_ID, Vec::new());
    frontend.expose(
        "greet",
        sync_handler(|args| {
            let who = args.first().and_then(|v| v.as_str()).unwrap_or("nobody");
            Ok(json!(format!("hello, {who}")))
        }),
    );

    // Two-way handshake.
    let backend_started = {
        let backend = backend.clone();
        tokio::spawn(async move { backend.start().await })
    };
    frontend.start().await?;
    frontend.notify_dom_ready().await?;
    backend_started.await.map_err(|e| DemoError::Demo {
        message: format!("Backend task panicked: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })??;
    info!("Handshake complete, backend ready: {}", backend.ready().await?);

    // Page subscribes to counter movement.
    frontend
        .subscribe_event(
            EVENT_COUNTER_CHANGED,
            Arc::new(|event_type, payload| {
                info!("Page saw {event_type}: {payload}");
                Ok(())
            }),
        )
        .await?;

    // Page drives the counter; backend announces each move.
    for _ in 0..3 {
        let value = frontend.call("increment", Vec::new()).await?;
        backend.fire_event(EVENT_COUNTER_CHANGED, value).await;
    }

    // Backend calls into the page.
    let greeting = backend
        .call("greet", vec![json!(instance_id.to_string())])
        .await?;
    info!("Backend received: {greeting}");

    // Host retires the plugin; the instance dismantles itself.
    backend
        .fire_event("before-uninstall", json!({ "pluginId": PLUGIN_ID }))
        .await;
    match frontend.call("increment", Vec::new()).await {
        Ok(value) => info!("Unexpected post-teardown success: {value}"),
        Err(e) => info!("Post-teardown call failed as expected: {e}"),
    }

    info!("Bridge demo finished");
    Ok(())
}
