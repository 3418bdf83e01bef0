//! Error types for intentwire core operations.

use thiserror::Error;

use crate::crypto::SenderId;

/// Errors that can occur while constructing, encoding, or decoding packets.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("sender mismatch: packet claims {expected}, signing key is {actual}")]
    SenderMismatch {
        expected: SenderId,
        actual: SenderId,
    },

    #[error("invalid key material: {0}")]
    KeyFormat(String),

    #[error("unsupported wire version: {0}")]
    UnsupportedVersion(u64),

    #[error("malformed packet: {0}")]
    MalformedPacket(String),

    #[error("encoding error: {0}")]
    Encoding(String),
}
