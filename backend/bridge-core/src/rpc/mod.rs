//! Request/response correlation engine.
//!
//! This module is the messaging core of the bridge: it assigns each
//! outgoing call a correlation id, tracks in-flight calls, matches
//! inbound responses to pending calls, and dispatches inbound requests
//! to locally exposed functions.
//!
//! # Architecture
//!
//! - [`MessageBridge`] - the engine; one per transport endpoint
//! - [`PendingCalls`] - correlation id -> settlement channel
//! - [`ExposedFunctions`] - function name -> local async handler
//!
//! Outbound calls pass through a readiness gate: calls issued before
//! the handshake completes are queued in issuance order and flushed,
//! still in order, when the gate opens. No envelope leaves early.

mod bridge;
mod exposed;
mod pending;

pub use bridge::MessageBridge;
pub use exposed::{ExposedFunctions, ExposedHandler, async_handler, sync_handler};
pub(crate) use pending::PendingCalls;
