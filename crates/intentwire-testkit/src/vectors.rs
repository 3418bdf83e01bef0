//! Golden test vectors for deterministic verification.
//!
//! Each vector pins the exact canonical signed-content bytes for a fixed
//! packet. Any implementation of the protocol, in any language, must
//! reproduce these bytes to interoperate: the signature is computed over
//! exactly this encoding.
//!
//! The senders are synthetic 32-byte identifiers (no private key
//! exists), which is fine: these vectors pin the encoding, not the
//! signature. Signature determinism is covered by the generators.

use serde::Serialize;

use intentwire_core::{signing_content_bytes, Intent, Packet, PacketBuilder, SenderId};

/// A golden test vector.
#[derive(Debug, Clone, Serialize)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// The packet, unsigned.
    pub packet: Packet,
    /// Expected canonical encoding of the signed content, hex.
    pub expected_content_hex: String,
}

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "single echo intent",
            packet: PacketBuilder::new(SenderId::from_bytes([0x11; 32]), 1)
                .intent(Intent::new("ECHO").with_param("hi").created_at(0.0))
                .build(),
            expected_content_hex: format!(
                "a3616e0162706c81a36170816268696174f90000626964644543484f637372637840{}",
                "31".repeat(64)
            ),
        },
        GoldenVector {
            name: "empty intent list",
            packet: PacketBuilder::new(SenderId::from_bytes([0xab; 32]), 0).build(),
            expected_content_hex: format!(
                "a3616e0062706c80637372637840{}",
                "6162".repeat(32)
            ),
        },
        GoldenVector {
            name: "boot intent with text and int params",
            packet: PacketBuilder::new(SenderId::from_bytes([0xcd; 32]), 1000)
                .intent(
                    Intent::new("BOOT")
                        .with_param("v1")
                        .with_param(7i64)
                        .created_at(1.5),
                )
                .build(),
            expected_content_hex: format!(
                "a3616e1903e862706c81a3617082627631076174f93e0062696464424f4f54637372637840{}",
                "6364".repeat(32)
            ),
        },
        GoldenVector {
            name: "negative, bytes, and float params",
            packet: PacketBuilder::new(SenderId::from_bytes([0xef; 32]), 42)
                .intent(
                    Intent::new("MIX")
                        .with_param(-2i64)
                        .with_param(vec![0xde_u8, 0xad])
                        .with_param(0.5f64)
                        .created_at(1048576.0),
                )
                .build(),
            expected_content_hex: format!(
                "a3616e182a62706c81a36170832142deadf938006174fa49800000626964634d4958637372637840{}",
                "6566".repeat(32)
            ),
        },
    ]
}

/// Check every golden vector against the local encoder.
///
/// Returns `(name, matches, actual_hex)` per vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|v| {
            let actual = hex::encode(signing_content_bytes(&v.packet));
            let matches = actual == v.expected_content_hex;
            (v.name.to_string(), matches, actual)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vectors_match_expected_bytes() {
        for (name, matches, actual) in verify_all_vectors() {
            assert!(matches, "vector '{name}' diverged, got {actual}");
        }
    }

    #[test]
    fn test_vectors_are_deterministic() {
        for vector in all_vectors() {
            let a = signing_content_bytes(&vector.packet);
            let b = signing_content_bytes(&vector.packet);
            assert_eq!(a, b, "vector '{}' re-encoded differently", vector.name);
        }
    }

    #[test]
    fn test_vectors_survive_wire_roundtrip() {
        for vector in all_vectors() {
            let decoded = Packet::from_wire(&vector.packet.to_wire()).unwrap();
            assert_eq!(decoded, vector.packet, "vector '{}'", vector.name);
        }
    }

    #[test]
    fn test_envelope_golden_bytes() {
        // The unsigned empty-list vector is small enough to pin the
        // whole envelope: {v: 1, dat: <78 bytes>, sig: h''}.
        let vector = &all_vectors()[1];
        assert_eq!(vector.name, "empty intent list");

        let expected_wire = format!(
            "a361760163646174584e{}6373696740",
            vector.expected_content_hex
        );
        assert_eq!(hex::encode(vector.packet.to_wire()), expected_wire);
    }

    #[test]
    fn test_vectors_export_as_json() {
        // Vectors are serializable so other implementations can consume
        // them without a Rust toolchain.
        let json = serde_json::to_string_pretty(&all_vectors()).unwrap();
        assert!(json.contains("single echo intent"));
        assert!(json.contains("expected_content_hex"));
    }
}
