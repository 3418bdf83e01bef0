//! # intentwire-testkit
//!
//! Testing utilities for the intentwire protocol.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: fixed packets with expected canonical bytes,
//!   for cross-implementation verification of the signing encoding
//! - **Generators**: proptest strategies for identities, intents, and
//!   signed packets
//! - **Fixtures**: helpers for setting up runtimes and packets in tests
//!
//! ## Golden Vectors
//!
//! ```rust
//! use intentwire_testkit::vectors::verify_all_vectors;
//!
//! for (name, matches, actual_hex) in verify_all_vectors() {
//!     assert!(matches, "{name} diverged: {actual_hex}");
//! }
//! ```
//!
//! ## Fixtures
//!
//! ```rust
//! use intentwire_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::new();
//! let packet = fixture.echo_packet(1, "hi");
//! assert!(packet.verify());
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{multi_party_fixtures, CountingHandler, TestFixture};
pub use generators::{packet_params, signed_packet_from_params, PacketParams};
pub use vectors::{all_vectors, verify_all_vectors, GoldenVector};
