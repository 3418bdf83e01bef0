//! Intent: an atomic named command with ordered parameters.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::value::ParamValue;

/// Seconds since the Unix epoch, as the protocol's float timestamp.
pub fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before Unix epoch")
        .as_secs_f64()
}

/// A single dispatchable command.
///
/// `name` is the dispatch key and must match a registered handler exactly,
/// case and symbolic prefixes included. Immutable after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    /// Handler name this intent dispatches to.
    pub name: String,

    /// Ordered parameters, passed to the handler positionally.
    pub params: Vec<ParamValue>,

    /// Creation time, float seconds since epoch.
    pub created_at: f64,
}

impl Intent {
    /// Create an intent with no parameters, stamped with the current time.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            created_at: now_secs(),
        }
    }

    /// Append one parameter.
    pub fn with_param(mut self, param: impl Into<ParamValue>) -> Self {
        self.params.push(param.into());
        self
    }

    /// Replace the parameter list.
    pub fn with_params(mut self, params: Vec<ParamValue>) -> Self {
        self.params = params;
        self
    }

    /// Set an explicit creation timestamp. Deterministic encodings in
    /// tests and golden vectors depend on this.
    pub fn created_at(mut self, secs: f64) -> Self {
        self.created_at = secs;
        self
    }
}
