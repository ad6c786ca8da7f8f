//! One-shot settable future.
//!
//! A [`Deferred`] models "wait until X happens exactly once": readiness
//! handshakes, page announcements, teardown signals. It settles at most
//! once; later `resolve`/`reject` calls are no-ops. `wait()` can be
//! called any number of times, before or after settlement, and always
//! yields the eventual outcome.

use crate::error::BridgeError;

use common::ErrorLocation;

use std::panic::Location;
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

enum SettleState<T> {
    Pending,
    Resolved(T),
    Rejected(String),
}

struct Shared<T> {
    state: Mutex<SettleState<T>>,
    notify: Notify,
}

/// A settable future with pending/resolved/rejected state.
///
/// Cloning yields another handle to the same settlement; all clones
/// observe the same outcome.
pub struct Deferred<T: Clone> {
    shared: Arc<Shared<T>>,
}

impl<T: Clone> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Clone> Deferred<T> {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(SettleState::Pending),
                notify: Notify::new(),
            }),
        }
    }

    /// Settle with a value. No-op if already settled.
    pub fn resolve(&self, value: T) {
        let mut state = self.shared.state.lock().expect("deferred state poisoned");
        if matches!(*state, SettleState::Pending) {
            *state = SettleState::Resolved(value);
            drop(state);
            self.shared.notify.notify_waiters();
        }
    }

    /// Settle with an error. No-op if already settled.
    pub fn reject(&self, message: impl Into<String>) {
        let mut state = self.shared.state.lock().expect("deferred state poisoned");
        if matches!(*state, SettleState::Pending) {
            *state = SettleState::Rejected(message.into());
            drop(state);
            self.shared.notify.notify_waiters();
        }
    }

    /// Whether settlement has not yet occurred.
    pub fn is_pending(&self) -> bool {
        matches!(
            *self.shared.state.lock().expect("deferred state poisoned"),
            SettleState::Pending
        )
    }

    /// Wait for settlement. Returns immediately if already settled.
    pub async fn wait(&self) -> Result<T, BridgeError> {
        loop {
            // Arm the notification before checking state so a settlement
            // between the check and the await is not missed.
            let notified = self.shared.notify.notified();
            {
                let state = self.shared.state.lock().expect("deferred state poisoned");
                match &*state {
                    SettleState::Resolved(value) => return Ok(value.clone()),
                    SettleState::Rejected(message) => {
                        return Err(BridgeError::Handshake {
                            message: message.clone(),
                            location: ErrorLocation::from(Location::caller()),
                        });
                    }
                    SettleState::Pending => {}
                }
            }
            notified.await;
        }
    }
}

impl<T: Clone> Default for Deferred<T> {
    fn default() -> Self {
        Self::new()
    }
}
