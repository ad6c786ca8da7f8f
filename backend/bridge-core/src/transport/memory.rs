//! In-process paired transport.
//!
//! [`MemoryTransport::pair`] yields two linked endpoints backed by a
//! pair of unbounded tokio channels, one per direction. A pump task per
//! endpoint drains its inbound channel into the registered handler.
//! Disposing either endpoint drops its outbound sender, which ends the
//! peer's pump and fires the peer's dispose callbacks too - mirroring a
//! panel teardown observed from both sides.

use crate::transport::{DisposeCallback, DisposeList, HandlerSlot, MessageHandler, Transport};
use crate::wire::Envelope;

use std::sync::{Arc, Mutex};

use log::{debug, info};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

pub struct MemoryTransport {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    /// Sender toward the peer. Taken on disposal so the peer's pump ends.
    outbound: Mutex<Option<UnboundedSender<Envelope>>>,
    slot: HandlerSlot,
    dispose: DisposeList,
}

impl MemoryTransport {
    /// Create two linked endpoints. Must be called inside a tokio
    /// runtime; the pump tasks are spawned immediately.
    pub fn pair() -> (Arc<MemoryTransport>, Arc<MemoryTransport>) {
        let (to_first, from_second) = unbounded_channel();
        let (to_second, from_first) = unbounded_channel();

        let first = Arc::new(MemoryTransport {
            inner: Arc::new(MemoryInner::new(to_second)),
        });
        let second = Arc::new(MemoryTransport {
            inner: Arc::new(MemoryInner::new(to_first)),
        });

        tokio::spawn(pump(from_second, Arc::clone(&first.inner)));
        tokio::spawn(pump(from_first, Arc::clone(&second.inner)));

        (first, second)
    }
}

impl MemoryInner {
    fn new(outbound: UnboundedSender<Envelope>) -> Self {
        Self {
            outbound: Mutex::new(Some(outbound)),
            slot: HandlerSlot::new(),
            dispose: DisposeList::new(),
        }
    }

    /// Mark the endpoint unusable: drop the outbound sender (ending the
    /// peer's pump) and fire local dispose callbacks once.
    fn shutdown(&self) {
        let dropped = self
            .outbound
            .lock()
            .expect("memory transport outbound poisoned")
            .take();
        if dropped.is_some() {
            info!("Memory transport endpoint disposed");
        }
        self.dispose.fire();
    }
}

/// Drain one direction into the receiving endpoint's handler slot.
async fn pump(mut inbound: UnboundedReceiver<Envelope>, inner: Arc<MemoryInner>) {
    while let Some(envelope) = inbound.recv().await {
        if inner.dispose.is_fired() {
            debug!("Dropping envelope delivered after disposal");
            continue;
        }
        inner.slot.deliver(envelope);
    }
    inner.shutdown();
}

impl Transport for MemoryTransport {
    fn post_message(&self, envelope: Envelope) -> bool {
        let outbound = self
            .inner
            .outbound
            .lock()
            .expect("memory transport outbound poisoned");
        match outbound.as_ref() {
            Some(sender) => sender.send(envelope).is_ok(),
            None => {
                debug!("post_message on disposed memory transport");
                false
            }
        }
    }

    fn register_message_handler(&self, handler: MessageHandler) {
        self.inner.slot.install(handler);
    }

    fn on_dispose(&self, callback: DisposeCallback) {
        self.inner.dispose.register(callback);
    }

    fn dispose(&self) {
        self.inner.shutdown();
    }
}
