//! Frontend-side lifecycle host.
//!
//! Mirror of the backend host for the sandboxed page: announces DOM
//! readiness to the backend, waits for the backend's acknowledgement,
//! and owns the frontend half of the event layer (handler registry and
//! fan-out).

use crate::deferred::Deferred;
use crate::error::BridgeError;
use crate::events::{EventHandler, FrontendEvents};
use crate::lifecycle::component::BridgeComponent;
use crate::lifecycle::state::FrontendHandshakeState;
use crate::rpc::{ExposedHandler, MessageBridge, sync_handler};
use crate::transport::Transport;
use crate::{FN_BACKEND_INITIALIZED, FN_ON_EVENT, FN_PAGE_INIT};
use crate::{FN_SUBSCRIBE_EVENT, FN_UNSUBSCRIBE_EVENT};

use common::ErrorLocation;

use std::panic::Location;
use std::sync::{Arc, Mutex};

use futures_util::future::try_join_all;
use log::{error, info};
use serde_json::{Value, json};

/// The frontend half of one plugin instance.
#[derive(Clone)]
pub struct FrontendHost {
    inner: Arc<FrontendInner>,
}

struct FrontendInner {
    bridge: MessageBridge,
    events: Arc<FrontendEvents>,
    components: Vec<Arc<dyn BridgeComponent>>,
    state: Mutex<FrontendHandshakeState>,
    /// Resolved when the backend acknowledges via onBackendInitialized.
    backend_initialized: Deferred<()>,
    is_ready: Deferred<bool>,
}

impl FrontendHost {
    /// Wire a frontend host onto `transport`. The default exposure
    /// (backend acknowledgement target, inbound event push target) is
    /// registered here, before any traffic can arrive.
    pub fn new(
        transport: Arc<dyn Transport>,
        client_id: impl Into<String>,
        components: Vec<Arc<dyn BridgeComponent>>,
    ) -> Self {
        let bridge = MessageBridge::new(transport, client_id);
        let events = Arc::new(FrontendEvents::new());
        let backend_initialized = Deferred::new();
        let is_ready = Deferred::new();

        let acknowledged = backend_initialized.clone();
        bridge.expose(
            FN_BACKEND_INITIALIZED,
            sync_handler(move |_args| {
                acknowledged.resolve(());
                Ok(Value::Bool(true))
            }),
        );

        let fan_out = Arc::clone(&events);
        bridge.expose(
            FN_ON_EVENT,
            sync_handler(move |args| {
                let event_type = args
                    .first()
                    .and_then(Value::as_str)
                    .ok_or_else(|| "expected an event type string".to_string())?
                    .to_string();
                let payload = args.get(1).cloned().unwrap_or(Value::Null);
                let delivered = fan_out.dispatch(&event_type, &payload);
                Ok(json!(delivered))
            }),
        );

        Self {
            inner: Arc::new(FrontendInner {
                bridge,
                events,
                components,
                state: Mutex::new(FrontendHandshakeState::Created),
                backend_initialized,
                is_ready,
            }),
        }
    }

    /// Run component init() futures concurrently and start waiting for
    /// DOM readiness.
    pub async fn start(&self) -> Result<(), BridgeError> {
        let inits = self.inner.components.iter().map(|component| async move {
            component.init().await.map_err(|e| BridgeError::Component {
                message: format!("init of '{}' failed: {e}", component.name()),
                location: ErrorLocation::from(Location::caller()),
            })
        });
        try_join_all(inits).await?;
        self.set_state(FrontendHandshakeState::WaitingForDom);
        Ok(())
    }

    /// Signal that the hosting page is mounted. Announces onPageInit to
    /// the backend (this handshake call bypasses the gate it unlocks),
    /// awaits the backend's acknowledgement, then opens the outbound
    /// gate and dispatches component run()s. Never returns if the
    /// acknowledgement never arrives.
    pub async fn notify_dom_ready(&self) -> Result<(), BridgeError> {
        self.set_state(FrontendHandshakeState::NotifyingBackend);
        self.inner
            .bridge
            .call_ungated(FN_PAGE_INIT, Vec::new())
            .await?;
        self.inner.backend_initialized.wait().await?;

        self.inner.bridge.open_gate();
        self.set_state(FrontendHandshakeState::Ready);
        self.inner.is_ready.resolve(true);

        for component in &self.inner.components {
            let component = Arc::clone(component);
            tokio::spawn(async move {
                if let Err(e) = component.run().await {
                    error!("Component '{}' run failed: {e}", component.name());
                }
            });
        }
        Ok(())
    }

    /// Resolves `true` once the two-way handshake completes.
    pub async fn ready(&self) -> Result<bool, BridgeError> {
        self.inner.is_ready.wait().await
    }

    /// Call a function exposed by the backend. Gated on the backend's
    /// acknowledgement: nothing is sent before onBackendInitialized
    /// arrived, except the handshake announcement itself.
    pub async fn call(&self, func: &str, args: Vec<Value>) -> Result<Value, BridgeError> {
        self.inner.bridge.call(func, args).await
    }

    /// Expose a local function as remotely callable under `name`.
    pub fn expose(&self, name: impl Into<String>, handler: ExposedHandler) {
        self.inner.bridge.expose(name, handler);
    }

    /// Ask the backend to enable `event_type`, then register `handler`
    /// for it locally. No dedup: subscribing the same handler twice
    /// makes it fire twice per event.
    pub async fn subscribe_event(
        &self,
        event_type: &str,
        handler: EventHandler,
    ) -> Result<(), BridgeError> {
        self.inner
            .bridge
            .call(FN_SUBSCRIBE_EVENT, vec![json!(event_type)])
            .await?;
        self.inner.events.add(event_type, handler);
        Ok(())
    }

    /// Ask the backend to disable `event_type`, then drop that specific
    /// `handler` (compared by identity). Returns whether the handler was
    /// registered.
    pub async fn unsubscribe_event(
        &self,
        event_type: &str,
        handler: &EventHandler,
    ) -> Result<bool, BridgeError> {
        self.inner
            .bridge
            .call(FN_UNSUBSCRIBE_EVENT, vec![json!(event_type)])
            .await?;
        Ok(self.inner.events.remove(event_type, handler))
    }

    /// Drop every local handler and disable each affected event type
    /// backend-side.
    pub async fn unsubscribe_all(&self) -> Result<(), BridgeError> {
        for event_type in self.inner.events.clear() {
            self.inner
                .bridge
                .call(FN_UNSUBSCRIBE_EVENT, vec![json!(event_type)])
                .await?;
        }
        Ok(())
    }

    /// Tear the instance down: dispose the transport, which settles
    /// every pending call as failed.
    pub fn dispose(&self) {
        self.inner.bridge.dispose();
    }

    fn set_state(&self, next: FrontendHandshakeState) {
        let mut state = self.inner.state.lock().expect("handshake state poisoned");
        info!("Frontend handshake state: {} -> {next}", *state);
        *state = next;
    }
}
