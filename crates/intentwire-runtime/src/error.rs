//! Dispatch failure taxonomy.
//!
//! None of these are raised as errors by the runtime: every variant is
//! converted into a failed `ExecutionResult` so gate rejections and
//! per-intent failures reach callers as inspectable data.

use std::time::Duration;
use thiserror::Error;

use intentwire_core::SenderId;

/// Why a packet or a single intent was not executed.
///
/// The first three variants are whole-packet gates and short-circuit to
/// a single-element result list; the rest are isolated per intent.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("unauthorized sender: {0}")]
    UnauthorizedSender(SenderId),

    #[error("replayed nonce {nonce} from sender {sender}: last accepted nonce is {last}")]
    NonceReplayed {
        sender: SenderId,
        nonce: u64,
        last: u64,
    },

    #[error("unknown intent: {0}")]
    UnknownIntent(String),

    #[error("intent {name} timed out after {timeout:?}")]
    HandlerTimeout { name: String, timeout: Duration },

    #[error("intent {0} handler panicked")]
    HandlerPanicked(String),
}
