//! Function exposure registry.
//!
//! Maps a symbolic function name to a local async handler. The table is
//! consulted only for inbound requests addressed to this side. Names
//! should be unique within a side: a duplicate registration shadows
//! the earlier one, detected at registration time and logged as a
//! warning.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use futures_util::future::BoxFuture;
use log::warn;
use serde_json::Value;

/// A remotely invokable handler: positional JSON arguments in, result
/// or error message out.
pub type ExposedHandler =
    Arc<dyn Fn(Vec<Value>) -> BoxFuture<'static, Result<Value, String>> + Send + Sync>;

/// Wrap a synchronous closure as an [`ExposedHandler`].
pub fn sync_handler<F>(f: F) -> ExposedHandler
where
    F: Fn(Vec<Value>) -> Result<Value, String> + Send + Sync + 'static,
{
    Arc::new(move |args| {
        let outcome = f(args);
        Box::pin(async move { outcome })
    })
}

/// Wrap an asynchronous closure as an [`ExposedHandler`].
pub fn async_handler<F, Fut>(f: F) -> ExposedHandler
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, String>> + Send + 'static,
{
    Arc::new(move |args| Box::pin(f(args)))
}

pub struct ExposedFunctions {
    table: Mutex<HashMap<String, ExposedHandler>>,
}

impl ExposedFunctions {
    pub fn new() -> Self {
        Self {
            table: Mutex::new(HashMap::new()),
        }
    }

    /// Register `handler` under `name`. A later registration under the
    /// same name shadows the earlier one.
    pub fn register(&self, name: impl Into<String>, handler: ExposedHandler) {
        let name = name.into();
        let previous = self
            .table
            .lock()
            .expect("exposed table poisoned")
            .insert(name.clone(), handler);
        if previous.is_some() {
            warn!("Exposed function '{name}' shadows an earlier registration");
        }
    }

    /// Look up the handler for an inbound request. `None` means the
    /// request is dropped without a response.
    pub fn lookup(&self, name: &str) -> Option<ExposedHandler> {
        self.table
            .lock()
            .expect("exposed table poisoned")
            .get(name)
            .cloned()
    }
}

impl Default for ExposedFunctions {
    fn default() -> Self {
        Self::new()
    }
}
