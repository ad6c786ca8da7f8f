//! WebSocket transport adapter.
//!
//! Wraps an already-established WebSocket stream (either the accepting
//! or the connecting side) and carries envelopes as JSON text frames.
//! A writer task drains an unbounded outbound queue into the sink; a
//! reader task feeds inbound frames to the registered handler. Stream
//! termination on either half fires the dispose callbacks.
//!
//! Non-text frames and frames that do not parse as an [`Envelope`] are
//! dropped with a warning: the channel may carry unrelated traffic, and
//! the bridge is deliberately lenient about it.

use crate::transport::{DisposeCallback, DisposeList, HandlerSlot, MessageHandler, Transport};
use crate::wire::Envelope;

use std::sync::{Arc, Mutex};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

pub struct WebSocketTransport {
    inner: Arc<WsInner>,
}

struct WsInner {
    /// Sender into the writer task. Taken on disposal.
    outbound: Mutex<Option<UnboundedSender<Message>>>,
    slot: HandlerSlot,
    dispose: DisposeList,
}

impl WebSocketTransport {
    /// Wrap an established WebSocket stream. Must be called inside a
    /// tokio runtime; the reader and writer tasks are spawned
    /// immediately.
    pub fn new<S>(stream: WebSocketStream<S>) -> Arc<Self>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (write, read) = stream.split();
        let (outbound_tx, outbound_rx) = unbounded_channel();

        let inner = Arc::new(WsInner {
            outbound: Mutex::new(Some(outbound_tx)),
            slot: HandlerSlot::new(),
            dispose: DisposeList::new(),
        });

        tokio::spawn(writer_task(write, outbound_rx, Arc::clone(&inner)));
        tokio::spawn(reader_task(read, Arc::clone(&inner)));

        Arc::new(Self { inner })
    }
}

impl WsInner {
    /// Mark the endpoint unusable: enqueue a Close frame so the peer's
    /// reader observes disposal even on an idle channel, then drop the
    /// outbound sender (ending the writer task) and fire local dispose
    /// callbacks once. The peer answers with its own Close, which ends
    /// this side's reader as well.
    fn shutdown(&self) {
        let dropped = self
            .outbound
            .lock()
            .expect("websocket outbound poisoned")
            .take();
        if let Some(sender) = dropped {
            let _ = sender.send(Message::Close(None));
            info!("WebSocket transport disposed");
        }
        self.dispose.fire();
    }
}

/// Drain the outbound queue into the WebSocket sink.
async fn writer_task<S>(
    mut write: SplitSink<WebSocketStream<S>, Message>,
    mut outbound: UnboundedReceiver<Message>,
    inner: Arc<WsInner>,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    while let Some(message) = outbound.recv().await {
        if let Err(e) = write.send(message).await {
            error!("WebSocket send failed: {e}");
            break;
        }
    }
    inner.shutdown();
}

/// Feed inbound frames to the handler slot until the stream ends.
async fn reader_task<S>(mut read: SplitStream<WebSocketStream<S>>, inner: Arc<WsInner>)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    while let Some(message) = read.next().await {
        if inner.dispose.is_fired() {
            break;
        }
        match message {
            Ok(Message::Text(text)) => match serde_json::from_str::<Envelope>(text.as_str()) {
                Ok(envelope) => inner.slot.deliver(envelope),
                Err(e) => warn!("Dropping unparseable frame: {e}"),
            },
            Ok(Message::Close(_)) => {
                info!("WebSocket peer closed the channel");
                break;
            }
            Ok(other) => debug!("Ignoring non-text frame: {other:?}"),
            Err(e) => {
                error!("WebSocket read failed: {e}");
                break;
            }
        }
    }
    inner.shutdown();
}

impl Transport for WebSocketTransport {
    fn post_message(&self, envelope: Envelope) -> bool {
        let json = match serde_json::to_string(&envelope) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to encode envelope, dropping: {e}");
                return false;
            }
        };
        let outbound = self
            .inner
            .outbound
            .lock()
            .expect("websocket outbound poisoned");
        match outbound.as_ref() {
            Some(sender) => sender.send(Message::Text(json.into())).is_ok(),
            None => {
                debug!("post_message on disposed websocket transport");
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
