use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum BridgeError {
    /// The message channel is gone or never came up. A call settled with
    /// this variant may have been sent and lost, or never sent at all.
    #[error("Transport Error: {message} {location}")]
    Transport {
        message: String,
        location: ErrorLocation,
    },

    /// The remote side invoked the function and its handler failed.
    #[error("Remote Error: {message} {location}")]
    Remote {
        message: String,
        location: ErrorLocation,
    },

    #[error("Serialization Error: {message} {location}")]
    Serialization {
        message: String,
        location: ErrorLocation,
    },

    /// A readiness deferred was rejected, or the handshake sequence failed.
    #[error("Handshake Error: {message} {location}")]
    Handshake {
        message: String,
        location: ErrorLocation,
    },

    /// A bridge component's init() or run() failed.
    #[error("Component Error: {message} {location}")]
    Component {
        message: String,
        location: ErrorLocation,
    },
}

impl From<serde_json::Error> for BridgeError {
    #[track_caller]
    fn from(error: serde_json::Error) -> Self {
        BridgeError::Serialization {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl BridgeError {
    /// Shorthand for a transport failure at the current call site.
    #[track_caller]
    pub fn transport(message: impl Into<String>) -> Self {
        BridgeError::Transport {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
