//! The intent registry: binding names to handlers.
//!
//! A registry is an explicit, constructed value passed into each runtime,
//! so independent runtimes (and tests) never share dispatch tables.
//! Registration normally happens once during startup composition;
//! runtime registration is supported and safe against concurrent reads.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::handler::{FnHandler, HandlerError, IntentHandler};
use intentwire_core::ParamValue;

/// Maps intent names to handlers. Names are case-sensitive, symbolic
/// prefixes included. The last registration for a name wins.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: RwLock<HashMap<String, Arc<dyn IntentHandler>>>,
}

impl HandlerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under a name, overwriting any previous entry.
    pub fn register(&self, name: impl Into<String>, handler: impl IntentHandler + 'static) {
        let name = name.into();
        let mut handlers = self.handlers.write().expect("registry lock poisoned");
        if handlers.insert(name.clone(), Arc::new(handler)).is_some() {
            tracing::debug!(intent = %name, "handler re-registered, previous entry replaced");
        }
    }

    /// Register a plain closure as a handler.
    pub fn register_fn<F>(&self, name: impl Into<String>, f: F)
    where
        F: Fn(&[ParamValue]) -> Result<ParamValue, HandlerError> + Send + Sync + 'static,
    {
        self.register(name, FnHandler::new(f));
    }

    /// Look up the handler for a name. Absence is an expected condition,
    /// not an error.
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn IntentHandler>> {
        self.handlers
            .read()
            .expect("registry lock poisoned")
            .get(name)
            .cloned()
    }

    /// Snapshot of registered names, sorted for stable output.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .handlers
            .read()
            .expect("registry lock poisoned")
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.read().expect("registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
