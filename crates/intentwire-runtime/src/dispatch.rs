//! The runtime: the verify → authorize → dispatch state machine.
//!
//! Verification and authorization are whole-packet gates and must pass
//! before any handler runs. Individual intent failures are isolated so a
//! multi-intent packet's partial success stays observable and one bad
//! command cannot block the rest.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::DispatchError;
use crate::registry::HandlerRegistry;
use intentwire_core::{Intent, Packet, ParamValue, SenderId};

/// Outcome of one intent.
///
/// Exactly one of `output`/`error` is populated, according to `success`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub output: Option<ParamValue>,
    pub error: Option<String>,
}

impl ExecutionResult {
    /// A successful invocation with the handler's return value.
    pub fn completed(output: ParamValue) -> Self {
        Self {
            success: true,
            output: Some(output),
            error: None,
        }
    }

    /// A failure, described by its dispatch or handler error.
    pub fn failed(error: impl std::fmt::Display) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(error.to_string()),
        }
    }
}

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Upper bound on a single handler invocation. A handler that
    /// exceeds it is aborted and its intent fails; later intents in the
    /// packet still run.
    pub handler_timeout: Duration,

    /// Require each sender's nonce to be strictly greater than the last
    /// one accepted from it. Off by default: the wire protocol carries
    /// the nonce but does not mandate enforcement.
    pub enforce_nonce_order: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            handler_timeout: Duration::from_secs(30),
            enforce_nonce_order: false,
        }
    }
}

/// The secure execution environment for packets.
///
/// Holds the authorized-sender set and a handler registry. `execute`
/// takes `&self`, so independent packets may be processed concurrently;
/// the intents within one packet always run sequentially, in order.
pub struct Runtime {
    authorized: HashSet<SenderId>,
    registry: Arc<HandlerRegistry>,
    config: RuntimeConfig,
    last_nonces: Mutex<HashMap<SenderId, u64>>,
}

impl Runtime {
    /// Create a runtime with the default configuration.
    pub fn new(
        authorized: impl IntoIterator<Item = SenderId>,
        registry: Arc<HandlerRegistry>,
    ) -> Self {
        Self::with_config(authorized, registry, RuntimeConfig::default())
    }

    /// Create a runtime with an explicit configuration.
    pub fn with_config(
        authorized: impl IntoIterator<Item = SenderId>,
        registry: Arc<HandlerRegistry>,
        config: RuntimeConfig,
    ) -> Self {
        Self {
            authorized: authorized.into_iter().collect(),
            registry,
            config,
            last_nonces: Mutex::new(HashMap::new()),
        }
    }

    /// Whether the given sender may have packets executed.
    pub fn is_authorized(&self, sender: &SenderId) -> bool {
        self.authorized.contains(sender)
    }

    /// The registry this runtime dispatches through.
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Execute a packet: verify, authorize, then dispatch each intent.
    ///
    /// Gate failures return a single-element result list and no handler
    /// is invoked. Otherwise the list holds one result per intent, in
    /// packet order.
    pub async fn execute(&self, packet: &Packet) -> Vec<ExecutionResult> {
        if !packet.verify() {
            warn!(packet = %packet.digest(), "rejected packet: invalid signature");
            return vec![ExecutionResult::failed(DispatchError::InvalidSignature)];
        }

        if !self.is_authorized(&packet.sender) {
            warn!(
                packet = %packet.digest(),
                sender = %packet.sender,
                "rejected packet: sender not authorized"
            );
            return vec![ExecutionResult::failed(DispatchError::UnauthorizedSender(
                packet.sender,
            ))];
        }

        if self.config.enforce_nonce_order {
            if let Err(err) = self.accept_nonce(packet) {
                warn!(packet = %packet.digest(), "rejected packet: {err}");
                return vec![ExecutionResult::failed(err)];
            }
        }

        let mut results = Vec::with_capacity(packet.intents.len());
        for intent in &packet.intents {
            results.push(self.dispatch(intent).await);
        }
        results
    }

    /// Monotonic-per-sender replay check. Records the nonce only after
    /// all gates have passed.
    fn accept_nonce(&self, packet: &Packet) -> Result<(), DispatchError> {
        let mut last_nonces = self.last_nonces.lock().expect("nonce lock poisoned");
        match last_nonces.get(&packet.sender) {
            Some(&last) if packet.nonce <= last => Err(DispatchError::NonceReplayed {
                sender: packet.sender,
                nonce: packet.nonce,
                last,
            }),
            _ => {
                last_nonces.insert(packet.sender, packet.nonce);
                Ok(())
            }
        }
    }

    /// Run one intent through its handler, isolating every failure mode.
    async fn dispatch(&self, intent: &Intent) -> ExecutionResult {
        let Some(handler) = self.registry.resolve(&intent.name) else {
            debug!(intent = %intent.name, "no handler registered");
            return ExecutionResult::failed(DispatchError::UnknownIntent(intent.name.clone()));
        };

        // The handler runs on its own task: a panic surfaces as a join
        // error instead of unwinding through the dispatch loop, and a
        // timeout can abort it.
        let params = intent.params.clone();
        let mut task = tokio::spawn(async move { handler.invoke(&params).await });

        match tokio::time::timeout(self.config.handler_timeout, &mut task).await {
            Ok(Ok(Ok(output))) => ExecutionResult::completed(output),
            Ok(Ok(Err(err))) => {
                debug!(intent = %intent.name, "handler failed: {err}");
                ExecutionResult::failed(err)
            }
            Ok(Err(_)) => {
                warn!(intent = %intent.name, "handler panicked");
                ExecutionResult::failed(DispatchError::HandlerPanicked(intent.name.clone()))
            }
            Err(_) => {
                task.abort();
                warn!(
                    intent = %intent.name,
                    timeout = ?self.config.handler_timeout,
                    "handler timed out"
                );
                ExecutionResult::failed(DispatchError::HandlerTimeout {
                    name: intent.name.clone(),
                    timeout: self.config.handler_timeout,
                })
            }
        }
    }
}
