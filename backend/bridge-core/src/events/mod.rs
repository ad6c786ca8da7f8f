//! Event subscription and fan-out.
//!
//! The backend half owns the catalog of event types it can source and
//! the set the frontend actually asked for; dispatch is gated on that
//! set, so unsubscribed events cost nothing beyond the check. The
//! frontend half keeps an ordered handler list per event type and fans
//! inbound notifications out to them.

pub mod backend;
pub mod frontend;

pub use backend::{BackendEvents, SubscriptionCommand};
pub use frontend::{EventHandler, FrontendEvents};
