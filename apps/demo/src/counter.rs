//! Backend-hosted demo component: a shared counter.

use bridge_core::error::BridgeError;
use bridge_core::lifecycle::BridgeComponent;
use bridge_core::rpc::{ExposedHandler, sync_handler};

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::future::BoxFuture;
use log::info;
use serde_json::json;

/// Event type fired whenever the counter moves.
pub const EVENT_COUNTER_CHANGED: &str = "counter.changed";

/// Counter state shared between the component and its exposed handler.
pub struct CounterComponent {
    value: Arc<AtomicU64>,
}

impl CounterComponent {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            value: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Handler for the remotely callable "increment" function. Bumps
    /// the counter and returns the new value.
    pub fn increment_handler(&self) -> ExposedHandler {
        let value = Arc::clone(&self.value);
        sync_handler(move |_args| {
            let next = value.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(json!(next))
        })
    }

    pub fn current(&self) -> u64 {
        self.value.load(Ordering::SeqCst)
    }
}

impl BridgeComponent for CounterComponent {
    fn name(&self) -> &str {
        "counter"
    }

    fn init(&self) -> BoxFuture<'_, Result<(), BridgeError>> {
        Box::pin(async move {
            self.value.store(0, Ordering::SeqCst);
            info!("Counter component initialized");
            Ok(())
        })
    }

    fn run(&self) -> BoxFuture<'_, Result<(), BridgeError>> {
        Box::pin(async move {
            info!("Counter component running, value = {}", self.current());
            Ok(())
        })
    }
}
