//! Cryptographic primitives for intentwire.
//!
//! Wraps Ed25519 signing behind strong types. The sender identifier used
//! on the wire and in authorization sets is the lower-case hex encoding
//! of the 32-byte verifying key.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// A 32-byte Ed25519 public key naming a packet sender.
///
/// Its `Display` form is the full 64-character lower-case hex identifier
/// that appears in the `src` field of signed content.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SenderId(pub [u8; 32]);

impl SenderId {
    /// Create from raw public key bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The hex identifier string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from the hex identifier string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Verify a signature by this sender over exactly `message`.
    ///
    /// This is a pure boolean gate: malformed keys and signatures fold
    /// into `false` so callers can use it directly in an authorization
    /// pipeline without an error path.
    pub fn verify(&self, message: &[u8], signature: &PacketSignature) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.0) else {
            return false;
        };
        let sig = Signature::from_bytes(&signature.0);
        verifying_key.verify(message, &sig).is_ok()
    }
}

impl fmt::Debug for SenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SenderId({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for SenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl AsRef<[u8]> for SenderId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for SenderId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// A 64-byte Ed25519 signature over a packet's signed content.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PacketSignature(pub [u8; 64]);

// serde has no built-in impl for `[u8; 64]` (arrays are covered only up to
// length 32), so the serde support the `Packet` derive relies on is provided
// by hand here. The signature is serialized as a sequence of its 64 bytes,
// exactly as a `[u8; 64]` derive would.
impl Serialize for PacketSignature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeTuple;
        let mut tup = serializer.serialize_tuple(64)?;
        for byte in &self.0 {
            tup.serialize_element(byte)?;
        }
        tup.end()
    }
}

impl<'de> Deserialize<'de> for PacketSignature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct SignatureVisitor;

        impl<'de> serde::de::Visitor<'de> for SignatureVisitor {
            type Value = PacketSignature;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a 64-byte Ed25519 signature")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                let mut bytes = [0u8; 64];
                for (i, slot) in bytes.iter_mut().enumerate() {
                    *slot = seq
                        .next_element()?
                        .ok_or_else(|| serde::de::Error::invalid_length(i, &self))?;
                }
                Ok(PacketSignature(bytes))
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                let bytes: [u8; 64] = v
                    .try_into()
                    .map_err(|_| serde::de::Error::invalid_length(v.len(), &self))?;
                Ok(PacketSignature(bytes))
            }
        }

        deserializer.deserialize_tuple(64, SignatureVisitor)
    }
}

impl PacketSignature {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for PacketSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PacketSignature({}...)", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for PacketSignature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 64]> for PacketSignature {
    fn from(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }
}

/// A signing identity: an Ed25519 key pair held by one sender.
///
/// Immutable for its lifetime; the public identifier is a pure function
/// of the key pair and is never regenerated.
#[derive(Clone)]
pub struct Identity {
    signing_key: SigningKey,
}

impl Identity {
    /// Generate a new identity with a fresh random key pair.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let signing_key = SigningKey::generate(&mut rng);
        Self { signing_key }
    }

    /// Create from a 32-byte seed. Deterministic; used by tests and vectors.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        Self { signing_key }
    }

    /// Load from persisted key material.
    ///
    /// The material must be exactly a 32-byte Ed25519 seed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        let seed: [u8; 32] = bytes.try_into().map_err(|_| {
            CoreError::KeyFormat(format!("expected 32-byte seed, got {} bytes", bytes.len()))
        })?;
        Ok(Self::from_seed(&seed))
    }

    /// Export the seed bytes for persistence.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// The public identifier of this identity.
    pub fn sender_id(&self) -> SenderId {
        SenderId(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign exactly the given bytes.
    pub fn sign(&self, message: &[u8]) -> PacketSignature {
        let sig = self.signing_key.sign(message);
        PacketSignature(sig.to_bytes())
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({:?})", self.sender_id())
    }
}
