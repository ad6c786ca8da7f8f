//! Transport abstraction for the bridge.
//!
//! A transport is "a channel that can post a message out and register a
//! handler for incoming messages", plus a disposal notification. Two
//! concrete adapters exist: an in-process paired channel
//! ([`MemoryTransport`]) for a frontend and backend living in one
//! process, and a WebSocket adapter ([`WebSocketTransport`]) for
//! cross-process panels. Both satisfy the same contract.

pub mod memory;
pub mod websocket;

pub use memory::MemoryTransport;
pub use websocket::WebSocketTransport;

use crate::wire::Envelope;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use log::warn;

/// Handler invoked for every inbound envelope, in arrival order.
pub type MessageHandler = Arc<dyn Fn(Envelope) + Send + Sync>;

/// Callback fired exactly once when the channel becomes unusable.
pub type DisposeCallback = Box<dyn FnOnce() + Send>;

pub trait Transport: Send + Sync {
    /// Send one envelope. Returns `false` when the channel is unusable;
    /// never panics. Callers treat an unavailable transport as "call
    /// fails", not as a crash.
    fn post_message(&self, envelope: Envelope) -> bool;

    /// Install the single inbound handler. Envelopes that arrived before
    /// registration are replayed to it in arrival order.
    fn register_message_handler(&self, handler: MessageHandler);

    /// Register a callback fired once when the channel dies. Registering
    /// after disposal invokes the callback immediately.
    fn on_dispose(&self, callback: DisposeCallback);

    /// Tear the channel down. Idempotent; fires the dispose callbacks.
    fn dispose(&self);
}

/// Inbound delivery slot shared by the concrete adapters.
///
/// Holds the registered handler and buffers envelopes that arrive before
/// registration so no message is lost during startup. Delivery happens
/// under the slot lock, which keeps arrival order intact.
pub(crate) struct HandlerSlot {
    inner: Mutex<HandlerSlotInner>,
}

struct HandlerSlotInner {
    handler: Option<MessageHandler>,
    buffered: Vec<Envelope>,
}

impl HandlerSlot {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(HandlerSlotInner {
                handler: None,
                buffered: Vec::new(),
            }),
        }
    }

    /// Deliver one envelope to the handler, or buffer it if none is
    /// installed yet.
    pub(crate) fn deliver(&self, envelope: Envelope) {
        let mut slot = self.inner.lock().expect("handler slot poisoned");
        match &slot.handler {
            Some(handler) => handler(envelope),
            None => slot.buffered.push(envelope),
        }
    }

    /// Install the handler and replay anything buffered, in order.
    pub(crate) fn install(&self, handler: MessageHandler) {
        let mut slot = self.inner.lock().expect("handler slot poisoned");
        if slot.handler.is_some() {
            warn!("Transport message handler replaced; earlier handler is dropped");
        }
        for envelope in slot.buffered.drain(..) {
            handler(envelope);
        }
        slot.handler = Some(handler);
    }
}

/// Dispose-callback list shared by the concrete adapters. Fires each
/// callback at most once.
pub(crate) struct DisposeList {
    fired: AtomicBool,
    callbacks: Mutex<Vec<DisposeCallback>>,
}

impl DisposeList {
    pub(crate) fn new() -> Self {
        Self {
            fired: AtomicBool::new(false),
            callbacks: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn is_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    /// Register a callback, or invoke it immediately if disposal already
    /// happened.
    pub(crate) fn register(&self, callback: DisposeCallback) {
        if self.is_fired() {
            callback();
            return;
        }
        let mut callbacks = self.callbacks.lock().expect("dispose list poisoned");
        // Re-check under the lock so a concurrent fire() cannot strand us.
        if self.is_fired() {
            drop(callbacks);
            callback();
        } else {
            callbacks.push(callback);
        }
    }

    /// Fire all registered callbacks. Later calls are no-ops.
    pub(crate) fn fire(&self) {
        if self.fired.swap(true, Ordering::SeqCst) {
            return;
        }
        let callbacks = {
            let mut guard = self.callbacks.lock().expect("dispose list poisoned");
            std::mem::take(&mut *guard)
        };
        for callback in callbacks {
            callback();
        }
    }
}
