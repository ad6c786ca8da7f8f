//! Backend-side lifecycle host.
//!
//! Owns the bridge for the host process: runs component initialization,
//! waits for the page to announce itself, acknowledges back, and only
//! then lets queued outbound calls flow. Also owns the backend half of
//! the event layer, including the before-uninstall self-teardown.

use crate::deferred::Deferred;
use crate::error::BridgeError;
use crate::events::{BackendEvents, SubscriptionCommand};
use crate::lifecycle::component::BridgeComponent;
use crate::lifecycle::state::BackendHandshakeState;
use crate::rpc::{ExposedHandler, MessageBridge, async_handler, sync_handler};
use crate::transport::Transport;
use crate::{EVENT_BEFORE_UNINSTALL, FN_BACKEND_INITIALIZED, FN_ON_EVENT, FN_PAGE_INIT};
use crate::{FN_SUBSCRIBE_EVENT, FN_UNSUBSCRIBE_EVENT};

use common::ErrorLocation;

use std::panic::Location;
use std::sync::{Arc, Mutex};

use futures_util::future::try_join_all;
use log::{debug, error, info};
use serde_json::{Value, json};

/// The backend half of one plugin instance.
///
/// `Clone` hands out another handle to the same instance.
#[derive(Clone)]
pub struct BackendHost {
    inner: Arc<BackendInner>,
}

struct BackendInner {
    bridge: MessageBridge,
    events: BackendEvents,
    components: Vec<Arc<dyn BridgeComponent>>,
    plugin_id: String,
    state: Mutex<BackendHandshakeState>,
    /// Resolved when the page announces itself via onPageInit.
    page_initialized: Deferred<()>,
    is_ready: Deferred<bool>,
}

impl BackendHost {
    /// Wire a backend host onto `transport`.
    ///
    /// `event_catalog` lists the event types this backend can source;
    /// the before-uninstall type is always included. The default
    /// exposure (page-init announcement, event enable/disable) is
    /// registered here, before any traffic can arrive.
    pub fn new<I, S>(
        transport: Arc<dyn Transport>,
        plugin_id: impl Into<String>,
        components: Vec<Arc<dyn BridgeComponent>>,
        event_catalog: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let plugin_id = plugin_id.into();
        let bridge = MessageBridge::new(transport, plugin_id.clone());
        let events = BackendEvents::new(event_catalog);
        let page_initialized = Deferred::new();
        let is_ready = Deferred::new();

        let page_init = page_initialized.clone();
        bridge.expose(
            FN_PAGE_INIT,
            sync_handler(move |_args| {
                page_init.resolve(());
                Ok(Value::Bool(true))
            }),
        );
        bridge.expose(FN_SUBSCRIBE_EVENT, subscription_handler(&events, true));
        bridge.expose(FN_UNSUBSCRIBE_EVENT, subscription_handler(&events, false));

        Self {
            inner: Arc::new(BackendInner {
                bridge,
                events,
                components,
                plugin_id,
                state: Mutex::new(BackendHandshakeState::Created),
                page_initialized,
                is_ready,
            }),
        }
    }

    /// Run the backend side of the handshake to completion.
    ///
    /// Component init() futures run concurrently; then the host waits
    /// for the page announcement, opens the outbound gate, acknowledges
    /// with onBackendInitialized, and dispatches component run()s.
    /// Never returns if the page announcement never arrives.
    pub async fn start(&self) -> Result<(), BridgeError> {
        self.set_state(BackendHandshakeState::BackendsInitializing);
        let inits = self.inner.components.iter().map(|component| async move {
            component.init().await.map_err(|e| BridgeError::Component {
                message: format!("init of '{}' failed: {e}", component.name()),
                location: ErrorLocation::from(Location::caller()),
            })
        });
        try_join_all(inits).await?;

        self.set_state(BackendHandshakeState::WaitingForPage);
        self.inner.page_initialized.wait().await?;

        // The page is mounted; queued outbound calls may flow now.
        self.inner.bridge.open_gate();
        self.inner
            .events
            .update(SubscriptionCommand::Subscribe(
                EVENT_BEFORE_UNINSTALL.to_string(),
            ))
            .await;

        self.set_state(BackendHandshakeState::NotifyingFrontend);
        self.inner
            .bridge
            .call(FN_BACKEND_INITIALIZED, Vec::new())
            .await?;

        self.set_state(BackendHandshakeState::Ready);
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

    /// Resolves `true` once the two-way handshake completes. Bootstrap
    /// code awaits this before treating the bridge as usable.
    pub async fn ready(&self) -> Result<bool, BridgeError> {
        self.inner.is_ready.wait().await
    }

    /// Call a function exposed by the frontend. Gated on the page
    /// announcement: nothing is sent before onPageInit arrived.
    pub async fn call(&self, func: &str, args: Vec<Value>) -> Result<Value, BridgeError> {
        self.inner.bridge.call(func, args).await
    }

    /// Expose a local function as remotely callable under `name`.
    pub fn expose(&self, name: impl Into<String>, handler: ExposedHandler) {
        self.inner.bridge.expose(name, handler);
    }

    /// Push one event to the frontend. Dispatch is gated on the
    /// subscribed-event set; firing an unsubscribed type is a cheap
    /// no-op. Returns whether a notification actually went out.
    ///
    /// Firing before-uninstall with a payload naming this plugin tears
    /// the whole instance down after the notification.
    pub async fn fire_event(&self, event_type: &str, payload: Value) -> bool {
        if !self.inner.events.is_active(event_type).await {
            debug!("Event '{event_type}' fired with no subscription, skipping dispatch");
            return false;
        }
        let notified = self
            .inner
            .bridge
            .notify(FN_ON_EVENT, vec![json!(event_type), payload.clone()]);

        if event_type == EVENT_BEFORE_UNINSTALL && names_plugin(&payload, &self.inner.plugin_id) {
            info!(
                "before-uninstall names plugin '{}', tearing the instance down",
                self.inner.plugin_id
            );
            self.dispose();
        }
        notified
    }

    /// Tear the instance down: dispose the transport, which settles
    /// every pending call as failed.
    pub fn dispose(&self) {
        self.inner.bridge.dispose();
    }

    pub fn plugin_id(&self) -> &str {
        &self.inner.plugin_id
    }

    pub fn events(&self) -> &BackendEvents {
        &self.inner.events
    }

    fn set_state(&self, next: BackendHandshakeState) {
        let mut state = self.inner.state.lock().expect("handshake state poisoned");
        info!("Backend handshake state: {} -> {next}", *state);
        *state = next;
    }
}

/// Build the exposed enable/disable handler for the subscription
/// registry. The first argument is the event type string.
fn subscription_handler(events: &BackendEvents, subscribe: bool) -> ExposedHandler {
    let events = events.clone();
    async_handler(move |args| {
        let events = events.clone();
        async move {
            let event_type = args
                .first()
                .and_then(Value::as_str)
                .ok_or_else(|| "expected an event type string".to_string())?
                .to_string();
            let command = if subscribe {
                SubscriptionCommand::Subscribe(event_type)
            } else {
                SubscriptionCommand::Unsubscribe(event_type)
            };
            events.update(command).await;
            Ok(Value::Bool(true))
        }
    })
}

/// Whether a before-uninstall payload names the given plugin identity:
/// either the bare identity string or an object with a `pluginId` field.
fn names_plugin(payload: &Value, plugin_id: &str) -> bool {
    payload.as_str() == Some(plugin_id)
        || payload.get("pluginId").and_then(Value::as_str) == Some(plugin_id)
}
