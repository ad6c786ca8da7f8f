//! The message bridge engine.

use crate::error::BridgeError;
use crate::rpc::{ExposedFunctions, ExposedHandler, PendingCalls};
use crate::transport::Transport;
use crate::wire::{Envelope, EnvelopeKind, split_qualified};

use common::ErrorLocation;

use std::panic::Location;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use log::{debug, info, warn};
use serde_json::Value;

/// Outbound gate. Calls issued before the handshake completes are held
/// here in issuance order; opening the gate flushes them in that order.
enum Gate {
    Gated(Vec<Envelope>),
    Open,
}

/// The request/response correlation engine, one per transport endpoint.
///
/// Cheaply cloneable; all clones share the same tables and transport.
/// Created once per logical plugin instance and torn down when the
/// owning panel or page is disposed.
#[derive(Clone)]
pub struct MessageBridge {
    inner: Arc<BridgeInner>,
}

struct BridgeInner {
    client_id: String,
    transport: Arc<dyn Transport>,
    pending: PendingCalls,
    exposed: ExposedFunctions,
    next_correlation_id: AtomicU64,
    gate: Mutex<Gate>,
    disposed: AtomicBool,
}

impl MessageBridge {
    /// Wire a bridge onto `transport`. The bridge starts gated: outbound
    /// calls queue until the lifecycle orchestrator opens the gate after
    /// the two-way handshake.
    pub fn new(transport: Arc<dyn Transport>, client_id: impl Into<String>) -> Self {
        let inner = Arc::new(BridgeInner {
            client_id: client_id.into(),
            transport: Arc::clone(&transport),
            pending: PendingCalls::new(),
            exposed: ExposedFunctions::new(),
            next_correlation_id: AtomicU64::new(0),
            gate: Mutex::new(Gate::Gated(Vec::new())),
            disposed: AtomicBool::new(false),
        });

        // Weak references below: the transport outlives its handler
        // registrations, so strong captures would cycle.
        let for_handler = Arc::downgrade(&inner);
        transport.register_message_handler(Arc::new(move |envelope| {
            if let Some(inner) = for_handler.upgrade() {
                BridgeInner::handle_inbound(&inner, envelope);
            }
        }));

        let for_dispose = Arc::downgrade(&inner);
        transport.on_dispose(Box::new(move || {
            if let Some(inner) = for_dispose.upgrade() {
                inner.on_transport_disposed();
            }
        }));

        Self { inner }
    }

    /// Call a remote function and wait for its response.
    ///
    /// The returned future settles when a matching response arrives, or
    /// with [`BridgeError::Transport`] when the transport is disposed
    /// mid-call. There is no retry and no timeout; an unanswered call on
    /// a live transport stays pending indefinitely.
    pub async fn call(&self, func: &str, args: Vec<Value>) -> Result<Value, BridgeError> {
        if self.inner.disposed.load(Ordering::SeqCst) {
            return Err(BridgeError::transport("Bridge is disposed"));
        }
        let correlation_id = self.inner.next_correlation_id.fetch_add(1, Ordering::Relaxed) + 1;
        let receiver = self.inner.pending.register(correlation_id);
        let envelope = Envelope::request(self.inner.client_id.clone(), func, args, correlation_id);
        self.inner.dispatch_outbound(envelope, true);
        match receiver.await {
            Ok(outcome) => outcome,
            Err(_) => Err(BridgeError::transport("Call abandoned: bridge torn down")),
        }
    }

    /// Call bypassing the readiness gate. Reserved for handshake traffic,
    /// which must not await the gate it is about to unlock.
    pub(crate) async fn call_ungated(
        &self,
        func: &str,
        args: Vec<Value>,
    ) -> Result<Value, BridgeError> {
        if self.inner.disposed.load(Ordering::SeqCst) {
            return Err(BridgeError::transport("Bridge is disposed"));
        }
        let correlation_id = self.inner.next_correlation_id.fetch_add(1, Ordering::Relaxed) + 1;
        let receiver = self.inner.pending.register(correlation_id);
        let envelope = Envelope::request(self.inner.client_id.clone(), func, args, correlation_id);
        if !self.inner.transport.post_message(envelope) {
            self.inner.pending.settle(
                correlation_id,
                Err(BridgeError::transport("Transport unavailable")),
            );
        }
        match receiver.await {
            Ok(outcome) => outcome,
            Err(_) => Err(BridgeError::transport("Call abandoned: bridge torn down")),
        }
    }

    /// One-way push to the remote side. No pending entry is recorded;
    /// any response the remote sends back is dropped as stale by design.
    /// Returns `false` when the transport refused the message.
    pub fn notify(&self, func: &str, args: Vec<Value>) -> bool {
        if self.inner.disposed.load(Ordering::SeqCst) {
            return false;
        }
        let correlation_id = self.inner.next_correlation_id.fetch_add(1, Ordering::Relaxed) + 1;
        let envelope = Envelope::request(self.inner.client_id.clone(), func, args, correlation_id);
        self.inner.dispatch_outbound(envelope, false)
    }

    /// Expose a local function as remotely callable under `name`.
    pub fn expose(&self, name: impl Into<String>, handler: ExposedHandler) {
        self.inner.exposed.register(name, handler);
    }

    /// Open the outbound gate, flushing queued calls in issuance order.
    pub(crate) fn open_gate(&self) {
        let queued = {
            let mut gate = self.inner.gate.lock().expect("gate poisoned");
            match std::mem::replace(&mut *gate, Gate::Open) {
                Gate::Gated(queue) => queue,
                Gate::Open => Vec::new(),
            }
        };
        if !queued.is_empty() {
            info!("Handshake complete, flushing {} queued call(s)", queued.len());
        }
        for envelope in queued {
            let correlation_id = envelope.correlation_id;
            if !self.inner.transport.post_message(envelope) {
                self.inner.pending.settle(
                    correlation_id,
                    Err(BridgeError::transport("Transport unavailable during flush")),
                );
            }
        }
    }

    /// Tear down the bridge by disposing its transport. The dispose hook
    /// settles every pending call as failed.
    pub fn dispose(&self) {
        self.inner.transport.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    pub fn client_id(&self) -> &str {
        &self.inner.client_id
    }
}

impl BridgeInner {
    /// Queue or post one outbound request envelope. `track` marks calls
    /// with a pending entry, which must be settled when posting fails.
    fn dispatch_outbound(&self, envelope: Envelope, track: bool) -> bool {
        let mut gate = self.gate.lock().expect("gate poisoned");
        match &mut *gate {
            Gate::Gated(queue) => {
                debug!(
                    "Queueing call '{}' until the handshake completes",
                    envelope.func
                );
                queue.push(envelope);
                true
            }
            Gate::Open => {
                let correlation_id = envelope.correlation_id;
                let posted = self.transport.post_message(envelope);
                drop(gate);
                if !posted && track {
                    self.pending.settle(
                        correlation_id,
                        Err(BridgeError::transport("Transport unavailable")),
                    );
                }
                posted
            }
        }
    }

    /// Inbound dispatch, invoked by the transport in arrival order.
    fn handle_inbound(inner: &Arc<BridgeInner>, envelope: Envelope) {
        match envelope.kind {
            EnvelopeKind::Return => inner.handle_response(envelope),
            EnvelopeKind::Call => Self::handle_request(inner, envelope),
        }
    }

    /// Match a response to its pending call via the correlation table.
    /// Arrival order is irrelevant; the table decides which call settles.
    fn handle_response(&self, envelope: Envelope) {
        let outcome = match envelope.error {
            Some(message) => Err(BridgeError::Remote {
                message,
                location: ErrorLocation::from(Location::caller()),
            }),
            None => Ok(envelope.result.unwrap_or(Value::Null)),
        };
        if !self.pending.settle(envelope.correlation_id, outcome) {
            debug!(
                "Dropping response with unknown correlation id {}",
                envelope.correlation_id
            );
        }
    }

    /// Look up and invoke a locally exposed function, sending the result
    /// or error back under the original correlation id. Unknown names
    /// get no response: unrelated envelopes may share the channel.
    fn handle_request(inner: &Arc<BridgeInner>, envelope: Envelope) {
        let target = match split_qualified(&envelope.func) {
            Some((client_id, func)) => {
                if client_id != inner.client_id {
                    debug!("Dropping request addressed to client '{client_id}'");
                    return;
                }
                func
            }
            None => envelope.func.as_str(),
        };

        let Some(handler) = inner.exposed.lookup(target) else {
            debug!("No exposed function '{target}', dropping request");
            return;
        };

        let inner = Arc::clone(inner);
        tokio::spawn(async move {
            let outcome = handler(envelope.args).await;
            let response = Envelope::response(
                inner.client_id.clone(),
                envelope.func,
                envelope.correlation_id,
                outcome,
            );
            if !inner.transport.post_message(response) {
                warn!(
                    "Failed to send response for correlation id {}",
                    envelope.correlation_id
                );
            }
        });
    }

    /// Transport dispose hook: mark the bridge dead, drop anything still
    /// queued, and settle every in-flight call exactly once.
    fn on_transport_disposed(&self) {
        self.disposed.store(true, Ordering::SeqCst);
        {
            let mut gate = self.gate.lock().expect("gate poisoned");
            *gate = Gate::Open;
        }
        self.pending
            .settle_all_failed(|| BridgeError::transport("Transport disposed"));
        info!("Bridge '{}' disposed", self.client_id);
    }
}
