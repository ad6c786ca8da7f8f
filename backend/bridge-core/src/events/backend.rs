//! Backend-side subscription registry.
//!
//! Tracks which event types the frontend asked to receive. Native
//! sources are wired eagerly by the host; this registry only gates
//! dispatch, trading a small always-on subscription cost for simpler
//! code. Mutations go through [`SubscriptionCommand`]s applied under a
//! write lock, so they are serialized; reads are concurrent.

use crate::EVENT_BEFORE_UNINSTALL;

use std::collections::HashSet;
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::RwLock;

/// Commands that mutate the subscribed-event set.
#[derive(Debug, Clone)]
pub enum SubscriptionCommand {
    /// Add an event type to the active set (idempotent).
    Subscribe(String),

    /// Remove an event type from the active set (no-op when absent).
    Unsubscribe(String),
}

/// Subscription state for one backend bridge instance.
///
/// # Thread Safety
///
/// This type is `Clone` and can be shared across tasks. All clones share
/// the same underlying state.
#[derive(Clone)]
pub struct BackendEvents {
    /// Event types this backend can source. Fixed at construction;
    /// always includes the before-uninstall type.
    catalog: Arc<HashSet<String>>,

    /// Event types with at least one active frontend subscription.
    active: Arc<RwLock<HashSet<String>>>,
}

impl BackendEvents {
    /// Create the registry from the catalog of source-able event types.
    pub fn new<I, S>(catalog: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut catalog: HashSet<String> = catalog.into_iter().map(Into::into).collect();
        catalog.insert(EVENT_BEFORE_UNINSTALL.to_string());
        Self {
            catalog: Arc::new(catalog),
            active: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Apply one subscription mutation.
    pub async fn update(&self, command: SubscriptionCommand) {
        match command {
            SubscriptionCommand::Subscribe(event_type) => {
                if !self.catalog.contains(&event_type) {
                    warn!("Subscription for unknown event type '{event_type}' ignored");
                    return;
                }
                let mut active = self.active.write().await;
                if active.insert(event_type.clone()) {
                    info!("Event type '{event_type}' subscribed");
                } else {
                    debug!("Event type '{event_type}' already subscribed");
                }
            }
            SubscriptionCommand::Unsubscribe(event_type) => {
                let mut active = self.active.write().await;
                if active.remove(&event_type) {
                    info!("Event type '{event_type}' unsubscribed");
                } else {
                    debug!("Unsubscribe for inactive event type '{event_type}' ignored");
                }
            }
        }
    }

    /// Whether dispatching `event_type` would reach a subscriber.
    pub async fn is_active(&self, event_type: &str) -> bool {
        self.active.read().await.contains(event_type)
    }

    /// Whether this backend can source `event_type` at all.
    pub fn in_catalog(&self, event_type: &str) -> bool {
        self.catalog.contains(event_type)
    }
}
