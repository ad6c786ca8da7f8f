//! Pending-call table.

use crate::error::BridgeError;

use std::collections::HashMap;
use std::sync::Mutex;

use log::info;
use serde_json::Value;
use tokio::sync::oneshot;

/// Correlation id -> settlement channel for in-flight outbound calls.
///
/// Entries are removed exactly once: on the first matching response, or
/// all at once when the transport is disposed. A response for an id not
/// in the table is stale or foreign and is dropped by the caller.
pub(crate) struct PendingCalls {
    table: Mutex<HashMap<u64, oneshot::Sender<Result<Value, BridgeError>>>>,
}

impl PendingCalls {
    pub(crate) fn new() -> Self {
        Self {
            table: Mutex::new(HashMap::new()),
        }
    }

    /// Record a fresh in-flight call and hand back its settlement side.
    pub(crate) fn register(
        &self,
        correlation_id: u64,
    ) -> oneshot::Receiver<Result<Value, BridgeError>> {
        let (tx, rx) = oneshot::channel();
        self.table
            .lock()
            .expect("pending table poisoned")
            .insert(correlation_id, tx);
        rx
    }

    /// Settle one call. Returns `false` when the id is unknown
    /// (stale/duplicate/foreign response).
    pub(crate) fn settle(&self, correlation_id: u64, outcome: Result<Value, BridgeError>) -> bool {
        let sender = self
            .table
            .lock()
            .expect("pending table poisoned")
            .remove(&correlation_id);
        match sender {
            // A dropped receiver means the caller gave up waiting; the
            // entry is still consumed exactly once.
            Some(tx) => {
                let _ = tx.send(outcome);
                true
            }
            None => false,
        }
    }

    /// Settle every in-flight call as failed. Used by the transport
    /// dispose hook so no promise is leaked when a panel is torn down
    /// mid-call.
    pub(crate) fn settle_all_failed(&self, make_error: impl Fn() -> BridgeError) {
        let drained: Vec<_> = {
            let mut table = self.table.lock().expect("pending table poisoned");
            table.drain().collect()
        };
        if !drained.is_empty() {
            info!("Settling {} pending call(s) as failed", drained.len());
        }
        for (_, tx) in drained {
            let _ = tx.send(Err(make_error()));
        }
    }
}
