//! Component contract for code hosted on either side of the bridge.

use crate::error::BridgeError;

use futures_util::future::BoxFuture;

/// A unit of hosted behavior with a two-phase lifecycle.
///
/// `init()` futures of all components on one side run concurrently
/// before that side announces readiness. `run()` is dispatched only
/// after the full two-way handshake completes.
pub trait BridgeComponent: Send + Sync {
    fn name(&self) -> &str;

    /// Prepare the component. Failing here fails the whole side's
    /// startup.
    fn init(&self) -> BoxFuture<'_, Result<(), BridgeError>>;

    /// Long-running behavior. Errors are logged, not propagated.
    fn run(&self) -> BoxFuture<'_, Result<(), BridgeError>> {
        Box::pin(async { Ok(()) })
    }
}
