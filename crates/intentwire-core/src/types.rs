//! Strong type definitions shared across the workspace.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte content address for a packet, computed as
/// Blake3(signing content bytes).
///
/// Two packets with the same sender, nonce, and intents share a digest
/// regardless of signature state. Used to correlate log lines and audit
/// records; not part of the wire format.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PacketDigest(pub [u8; 32]);

impl PacketDigest {
    /// Compute the digest of the given content bytes.
    pub fn hash(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for PacketDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PacketDigest({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for PacketDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for PacketDigest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_deterministic() {
        let a = PacketDigest::hash(b"content");
        let b = PacketDigest::hash(b"content");
        assert_eq!(a, b);
        assert_ne!(a, PacketDigest::hash(b"other"));
    }

    #[test]
    fn test_digest_display_truncated() {
        let d = PacketDigest::from_bytes([0xcd; 32]);
        assert_eq!(format!("{}", d), "cdcdcdcdcdcdcdcd");
        assert!(format!("{:?}", d).starts_with("PacketDigest("));
    }
}
