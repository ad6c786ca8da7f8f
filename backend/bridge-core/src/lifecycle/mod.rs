//! Lifecycle and handshake orchestration.
//!
//! Sequences initialization on both sides of the bridge so that no call
//! is issued before the counterpart is ready: page announcement, backend
//! component readiness, and the mutual acknowledgement that opens the
//! outbound gates. Calls issued early are deferred, never dropped.
//!
//! If either side's acknowledgement never arrives, readiness never
//! resolves and dependent calls stay queued indefinitely; no timeout is
//! imposed here.

pub mod backend;
pub mod component;
pub mod frontend;
pub mod state;

pub use backend::BackendHost;
pub use component::BridgeComponent;
pub use frontend::FrontendHost;
pub use state::{BackendHandshakeState, FrontendHandshakeState};
