//! # intentwire-core
//!
//! Pure primitives for the intentwire protocol: identities, intents,
//! packets, and canonical encoding.
//!
//! This crate contains no I/O, no async, no dispatch logic. It is pure
//! computation over cryptographic data structures.
//!
//! ## Key Types
//!
//! - [`Identity`] - An Ed25519 key pair held by a sender
//! - [`SenderId`] - The hex public identifier of a sender
//! - [`Intent`] - An atomic named command with ordered parameters
//! - [`Packet`] - A signed, ordered bundle of intents from one sender
//! - [`PacketDigest`] - Content address of a packet's signed content
//!
//! ## Canonicalization
//!
//! Signed content is encoded with deterministic CBOR so signatures are
//! reproducible across implementations. See [`canonical`].

pub mod canonical;
pub mod crypto;
pub mod error;
pub mod intent;
pub mod packet;
pub mod types;
pub mod value;

pub use canonical::{packet_from_wire, signing_content_bytes, wire_bytes};
pub use crypto::{Identity, PacketSignature, SenderId};
pub use error::CoreError;
pub use intent::{now_secs, Intent};
pub use packet::{Packet, PacketBuilder, WIRE_VERSION};
pub use types::PacketDigest;
pub use value::ParamValue;
