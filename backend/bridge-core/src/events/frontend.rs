//! Frontend-side handler registry and fan-out.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use log::{debug, warn};
use serde_json::Value;

/// A local event callback. Handlers are compared by `Arc` identity, not
/// structure: two separately-created but identical closures are distinct
/// for unsubscription purposes.
pub type EventHandler = Arc<dyn Fn(&str, &Value) -> Result<(), String> + Send + Sync>;

/// Event type -> ordered list of local handlers. Insertion order is
/// fan-out order.
pub struct FrontendEvents {
    handlers: Mutex<HashMap<String, Vec<EventHandler>>>,
}

impl FrontendEvents {
    pub fn new() -> Self {
        Self {
            handlers: Mutex::new(HashMap::new()),
        }
    }

    /// Append `handler` to the list for `event_type`. No dedup: adding
    /// the same handler twice means it fires twice per event.
    pub fn add(&self, event_type: impl Into<String>, handler: EventHandler) {
        self.handlers
            .lock()
            .expect("handler map poisoned")
            .entry(event_type.into())
            .or_default()
            .push(handler);
    }

    /// Remove the first occurrence of `handler` (by identity) from the
    /// list for `event_type`. Returns `false` when it was not present.
    pub fn remove(&self, event_type: &str, handler: &EventHandler) -> bool {
        let mut map = self.handlers.lock().expect("handler map poisoned");
        let Some(list) = map.get_mut(event_type) else {
            return false;
        };
        let Some(index) = list.iter().position(|h| Arc::ptr_eq(h, handler)) else {
            return false;
        };
        list.remove(index);
        if list.is_empty() {
            map.remove(event_type);
        }
        true
    }

    /// Drop every registration, returning the event types that had
    /// handlers so the caller can disable them backend-side.
    pub fn clear(&self) -> Vec<String> {
        let mut map = self.handlers.lock().expect("handler map poisoned");
        map.drain().map(|(event_type, _)| event_type).collect()
    }

    /// Invoke every handler registered for `event_type`, in registration
    /// order. A failing handler is isolated: its error is logged and
    /// fan-out continues with the remaining handlers.
    pub fn dispatch(&self, event_type: &str, payload: &Value) -> usize {
        let snapshot: Vec<EventHandler> = {
            let map = self.handlers.lock().expect("handler map poisoned");
            match map.get(event_type) {
                Some(list) => list.clone(),
                None => {
                    debug!("Event '{event_type}' arrived with no registered handlers");
                    return 0;
                }
            }
        };
        let mut delivered = 0;
        for handler in snapshot {
            match handler(event_type, payload) {
                Ok(()) => delivered += 1,
                Err(e) => warn!("Event handler for '{event_type}' failed: {e}"),
            }
        }
        delivered
    }
}

impl Default for FrontendEvents {
    fn default() -> Self {
        Self::new()
    }
}
