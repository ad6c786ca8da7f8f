use bridge_core::error::BridgeError;
use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error;

/// Errors that can occur while running the demo host.
#[derive(Debug, Error)]
pub enum DemoError {
    /// Error from this app's own setup (log directory, logger, ...)
    #[error("Demo Error: {message} {location}")]
    Demo {
        message: String,
        location: ErrorLocation,
    },

    /// Error from bridge-core operations (handshake, calls, disposal)
    #[error("Bridge Error: {message} {location}")]
    Bridge {
        message: String,
        location: ErrorLocation,
    },
}

impl From<BridgeError> for DemoError {
    #[track_caller]
    fn from(e: BridgeError) -> Self {
        DemoError::Bridge {
            message: e.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
