//! Packet: a signed, ordered bundle of intents from one sender.
//!
//! A packet is constructed unsigned, signed exactly once (re-signing
//! overwrites), optionally serialized to wire bytes, and optionally
//! reconstructed from wire bytes. Reconstruction never implies trust:
//! a decoded packet must be independently verified.

use serde::{Deserialize, Serialize};

use crate::canonical;
use crate::crypto::{Identity, PacketSignature, SenderId};
use crate::error::CoreError;
use crate::intent::Intent;
use crate::types::PacketDigest;

/// The current wire envelope version.
pub const WIRE_VERSION: u64 = 1;

/// An ordered collection of intents from one sender, with a replay nonce
/// and an optional signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    /// Public identifier of the sender.
    pub sender: SenderId,

    /// Replay nonce. Carried in the signed content; enforcement is a
    /// runtime configuration concern.
    pub nonce: u64,

    /// The intents, in dispatch order.
    pub intents: Vec<Intent>,

    /// Signature over the canonical signing content. `None` until signed;
    /// encoded as an empty byte string on the wire.
    pub signature: Option<PacketSignature>,
}

impl Packet {
    /// Create an unsigned packet.
    pub fn new(sender: SenderId, nonce: u64, intents: Vec<Intent>) -> Self {
        Self {
            sender,
            nonce,
            intents,
            signature: None,
        }
    }

    /// The canonical encoding of `{sender, nonce, intents}`: exactly the
    /// bytes that are signed. The signature field is never included.
    pub fn signing_bytes(&self) -> Vec<u8> {
        canonical::signing_content_bytes(self)
    }

    /// Sign the packet with the given identity.
    ///
    /// Fails with [`CoreError::SenderMismatch`] unless the identity's
    /// public identifier equals `self.sender`. Mutates only the
    /// signature field; re-signing overwrites.
    pub fn sign(&mut self, identity: &Identity) -> Result<(), CoreError> {
        let actual = identity.sender_id();
        if actual != self.sender {
            return Err(CoreError::SenderMismatch {
                expected: self.sender,
                actual,
            });
        }
        let content = self.signing_bytes();
        self.signature = Some(identity.sign(&content));
        Ok(())
    }

    /// Whether a signature is attached. Says nothing about validity.
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// Verify the attached signature against the recomputed canonical
    /// signing content.
    ///
    /// Returns `false` for unsigned packets. Pure and side-effect free;
    /// safe to call repeatedly and from concurrent readers.
    pub fn verify(&self) -> bool {
        let Some(signature) = &self.signature else {
            return false;
        };
        self.sender.verify(&self.signing_bytes(), signature)
    }

    /// Content address of the signing content, for log correlation.
    pub fn digest(&self) -> PacketDigest {
        PacketDigest::hash(&self.signing_bytes())
    }

    /// Package the packet into its transport envelope.
    pub fn to_wire(&self) -> Vec<u8> {
        canonical::wire_bytes(self)
    }

    /// Reconstruct a packet from wire bytes.
    ///
    /// Structural parsing only; the result must still be verified.
    pub fn from_wire(bytes: &[u8]) -> Result<Self, CoreError> {
        canonical::packet_from_wire(bytes)
    }
}

/// Builder for assembling and signing packets.
pub struct PacketBuilder {
    sender: SenderId,
    nonce: u64,
    intents: Vec<Intent>,
}

impl PacketBuilder {
    /// Start building a packet.
    pub fn new(sender: SenderId, nonce: u64) -> Self {
        Self {
            sender,
            nonce,
            intents: Vec::new(),
        }
    }

    /// Append an intent.
    pub fn intent(mut self, intent: Intent) -> Self {
        self.intents.push(intent);
        self
    }

    /// Build the packet unsigned.
    pub fn build(self) -> Packet {
        Packet::new(self.sender, self.nonce, self.intents)
    }

    /// Build and sign in one step.
    pub fn sign(self, identity: &Identity) -> Result<Packet, CoreError> {
        let mut packet = self.build();
        packet.sign(identity)?;
        Ok(packet)
    }
}
