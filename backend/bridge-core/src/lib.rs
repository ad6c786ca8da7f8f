pub mod deferred;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod rpc;
pub mod transport;
pub mod wire;

#[cfg(test)]
mod tests;

/// Wire name of the frontend's "page is mounted" announcement.
pub const FN_PAGE_INIT: &str = "onPageInit";

/// Wire name of the backend's "components finished init" acknowledgement.
pub const FN_BACKEND_INITIALIZED: &str = "onBackendInitialized";

/// Wire name of the backend-exposed event-enable operation.
pub const FN_SUBSCRIBE_EVENT: &str = "subscribeEvent";

/// Wire name of the backend-exposed event-disable operation.
pub const FN_UNSUBSCRIBE_EVENT: &str = "unsubscribeEvent";

/// Wire name of the frontend-exposed inbound event push target.
pub const FN_ON_EVENT: &str = "onEvent";

/// Event type the backend auto-subscribes after page initialization.
/// When fired naming the local plugin identity, the whole bridge
/// instance is torn down.
pub const EVENT_BEFORE_UNINSTALL: &str = "before-uninstall";
