//! Wire model for the bridge protocol.
//!
//! Every message crossing the transport is one [`Envelope`], serialized
//! as JSON. The shape is the interop contract between independently
//! implemented sides:
//!
//! - `from` - client id of the sender
//! - `func` - target function name, optionally `<clientId>::<func>` qualified
//! - `args` - positional arguments (requests only)
//! - `correlationId` - token matching a response to its request
//! - `type` - `"call"` or `"return"`
//! - `result` / `error` - exactly one present on responses
//!
//! Correlation ids are unique among in-flight calls issued by one side;
//! a monotonically increasing counter scoped to the bridge instance
//! provides that.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Separator between a client id and a function name in a qualified
/// function name. Lets multiple logical endpoints share one transport.
pub const CLIENT_SEPARATOR: &str = "::";

/// Call-vs-return discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeKind {
    Call,
    Return,
}

/// One message on the transport, request or response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub from: String,
    pub func: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Value>,
    pub correlation_id: u64,
    #[serde(rename = "type")]
    pub kind: EnvelopeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    /// Build a request envelope for an outgoing call.
    pub fn request(
        from: impl Into<String>,
        func: impl Into<String>,
        args: Vec<Value>,
        correlation_id: u64,
    ) -> Self {
        Self {
            from: from.into(),
            func: func.into(),
            args,
            correlation_id,
            kind: EnvelopeKind::Call,
            result: None,
            error: None,
        }
    }

    /// Build the response envelope for a dispatched request, carrying
    /// either the handler's result or its error.
    pub fn response(
        from: impl Into<String>,
        func: impl Into<String>,
        correlation_id: u64,
        outcome: Result<Value, String>,
    ) -> Self {
        let (result, error) = match outcome {
            Ok(value) => (Some(value), None),
            Err(message) => (None, Some(message)),
        };
        Self {
            from: from.into(),
            func: func.into(),
            args: Vec::new(),
            correlation_id,
            kind: EnvelopeKind::Return,
            result,
            error,
        }
    }
}

/// Split a `<clientId>::<func>` qualified name. Returns `None` for bare
/// names, which are always dispatched locally.
pub fn split_qualified(name: &str) -> Option<(&str, &str)> {
    name.split_once(CLIENT_SEPARATOR)
}
