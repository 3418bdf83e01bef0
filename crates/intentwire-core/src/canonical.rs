//! Canonical CBOR encoding for deterministic serialization.
//!
//! This module implements RFC 8949 Core Deterministic Encoding:
//! - Map keys sorted by encoded byte comparison
//! - Integers use smallest valid encoding
//! - Floats use the shortest form (half/single/double) that preserves value
//! - Definite lengths only
//!
//! The canonical encoding is critical: the bytes that get signed are the
//! canonical encoding of `{src, n, pl}`, so two packets with equal field
//! values must produce byte-identical output regardless of construction
//! order or encoder implementation.
//!
//! Wire field tags are fixed by the protocol and must never be renamed:
//! envelope `v`/`dat`/`sig`, signed content `src`/`n`/`pl`, intent
//! records `id`/`p`/`t`.

use ciborium::value::Value;

use crate::crypto::{PacketSignature, SenderId};
use crate::error::CoreError;
use crate::intent::Intent;
use crate::packet::{Packet, WIRE_VERSION};
use crate::value::ParamValue;

/// Encode the signed content of a packet: `{src, n, pl}`.
///
/// The signature field is never part of what is signed.
pub fn signing_content_bytes(packet: &Packet) -> Vec<u8> {
    let entries = vec![
        (
            Value::Text("src".into()),
            Value::Text(packet.sender.to_hex()),
        ),
        (Value::Text("n".into()), Value::Integer(packet.nonce.into())),
        (
            Value::Text("pl".into()),
            Value::Array(packet.intents.iter().map(intent_to_cbor).collect()),
        ),
    ];
    encode_canonical(&Value::Map(entries))
}

/// Encode a packet into its transport envelope: `{v, dat, sig}`.
///
/// The signed content is embedded as an opaque byte string, not
/// re-encoded field-by-field, so decoding recovers exactly the bytes
/// that were signed.
pub fn wire_bytes(packet: &Packet) -> Vec<u8> {
    let sig_bytes = match &packet.signature {
        Some(sig) => sig.as_bytes().to_vec(),
        None => Vec::new(),
    };
    let entries = vec![
        (
            Value::Text("v".into()),
            Value::Integer(WIRE_VERSION.into()),
        ),
        (
            Value::Text("dat".into()),
            Value::Bytes(signing_content_bytes(packet)),
        ),
        (Value::Text("sig".into()), Value::Bytes(sig_bytes)),
    ];
    encode_canonical(&Value::Map(entries))
}

/// Decode a packet from wire bytes.
///
/// Performs structural parsing only. The returned packet carries the
/// envelope's signature but has not been verified; callers must call
/// [`Packet::verify`] before trusting it.
pub fn packet_from_wire(bytes: &[u8]) -> Result<Packet, CoreError> {
    let envelope: Value = ciborium::from_reader(bytes)
        .map_err(|e| CoreError::MalformedPacket(format!("invalid envelope: {e}")))?;
    let envelope = as_map(&envelope, "envelope")?;

    let version = match field(envelope, "v") {
        Some(Value::Integer(i)) => u64::try_from(i128::from(*i))
            .map_err(|_| CoreError::MalformedPacket("invalid version".into()))?,
        _ => return Err(CoreError::MalformedPacket("missing version".into())),
    };
    if version != WIRE_VERSION {
        return Err(CoreError::UnsupportedVersion(version));
    }

    let content_bytes = match field(envelope, "dat") {
        Some(Value::Bytes(b)) => b.as_slice(),
        _ => return Err(CoreError::MalformedPacket("missing signed content".into())),
    };

    let signature = match field(envelope, "sig") {
        Some(Value::Bytes(b)) if b.is_empty() => None,
        Some(Value::Bytes(b)) => {
            let arr: [u8; 64] = b.as_slice().try_into().map_err(|_| {
                CoreError::MalformedPacket(format!(
                    "signature must be empty or 64 bytes, got {}",
                    b.len()
                ))
            })?;
            Some(PacketSignature::from_bytes(arr))
        }
        _ => return Err(CoreError::MalformedPacket("missing signature field".into())),
    };

    let content: Value = ciborium::from_reader(content_bytes)
        .map_err(|e| CoreError::MalformedPacket(format!("invalid signed content: {e}")))?;
    let content = as_map(&content, "signed content")?;

    let sender = match field(content, "src") {
        Some(Value::Text(s)) => SenderId::from_hex(s)
            .map_err(|_| CoreError::MalformedPacket("invalid sender identifier".into()))?,
        _ => return Err(CoreError::MalformedPacket("missing sender".into())),
    };

    let nonce = match field(content, "n") {
        Some(Value::Integer(i)) => u64::try_from(i128::from(*i))
            .map_err(|_| CoreError::MalformedPacket("nonce out of range".into()))?,
        _ => return Err(CoreError::MalformedPacket("missing nonce".into())),
    };

    let intents = match field(content, "pl") {
        Some(Value::Array(items)) => items
            .iter()
            .map(intent_from_cbor)
            .collect::<Result<Vec<_>, _>>()?,
        _ => return Err(CoreError::MalformedPacket("missing intent list".into())),
    };

    Ok(Packet {
        sender,
        nonce,
        intents,
        signature,
    })
}

/// Convert an intent to its CBOR record: `{id, p, t}`.
fn intent_to_cbor(intent: &Intent) -> Value {
    let entries = vec![
        (Value::Text("id".into()), Value::Text(intent.name.clone())),
        (
            Value::Text("p".into()),
            Value::Array(intent.params.iter().map(param_to_cbor).collect()),
        ),
        (Value::Text("t".into()), Value::Float(intent.created_at)),
    ];
    Value::Map(entries)
}

fn intent_from_cbor(value: &Value) -> Result<Intent, CoreError> {
    let record = as_map(value, "intent record")?;

    let name = match field(record, "id") {
        Some(Value::Text(s)) => s.clone(),
        _ => return Err(CoreError::MalformedPacket("missing intent name".into())),
    };

    let params = match field(record, "p") {
        Some(Value::Array(items)) => items
            .iter()
            .map(param_from_cbor)
            .collect::<Result<Vec<_>, _>>()?,
        _ => return Err(CoreError::MalformedPacket("missing intent params".into())),
    };

    // Foreign encoders may emit whole-second timestamps as integers.
    let created_at = match field(record, "t") {
        Some(Value::Float(f)) => *f,
        Some(Value::Integer(i)) => i128::from(*i) as f64,
        _ => return Err(CoreError::MalformedPacket("missing intent timestamp".into())),
    };

    Ok(Intent {
        name,
        params,
        created_at,
    })
}

fn param_to_cbor(param: &ParamValue) -> Value {
    match param {
        ParamValue::Null => Value::Null,
        ParamValue::Bool(b) => Value::Bool(*b),
        ParamValue::Int(n) => Value::Integer((*n).into()),
        ParamValue::Float(f) => Value::Float(*f),
        ParamValue::Text(s) => Value::Text(s.clone()),
        ParamValue::Bytes(b) => Value::Bytes(b.to_vec()),
    }
}

fn param_from_cbor(value: &Value) -> Result<ParamValue, CoreError> {
    match value {
        Value::Null => Ok(ParamValue::Null),
        Value::Bool(b) => Ok(ParamValue::Bool(*b)),
        Value::Integer(i) => i64::try_from(i128::from(*i))
            .map(ParamValue::Int)
            .map_err(|_| CoreError::MalformedPacket("parameter integer out of range".into())),
        Value::Float(f) => Ok(ParamValue::Float(*f)),
        Value::Text(s) => Ok(ParamValue::Text(s.clone())),
        Value::Bytes(b) => Ok(ParamValue::Bytes(b.clone().into())),
        _ => Err(CoreError::MalformedPacket(
            "parameters must be primitive values".into(),
        )),
    }
}

fn as_map<'a>(value: &'a Value, what: &str) -> Result<&'a [(Value, Value)], CoreError> {
    match value {
        Value::Map(entries) => Ok(entries),
        _ => Err(CoreError::MalformedPacket(format!("{what} must be a map"))),
    }
}

fn field<'a>(entries: &'a [(Value, Value)], key: &str) -> Option<&'a Value> {
    entries
        .iter()
        .find(|(k, _)| matches!(k, Value::Text(s) if s == key))
        .map(|(_, v)| v)
}

/// Encode a CBOR value to canonical bytes.
fn encode_canonical(value: &Value) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_value_to(&mut buf, value);
    buf
}

/// Recursively encode a CBOR value.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Integer(i) => {
            encode_integer(buf, *i);
        }
        Value::Bytes(b) => {
            encode_uint(buf, 2, b.len() as u64);
            buf.extend_from_slice(b);
        }
        Value::Text(s) => {
            encode_uint(buf, 3, s.len() as u64);
            buf.extend_from_slice(s.as_bytes());
        }
        Value::Array(arr) => {
            encode_uint(buf, 4, arr.len() as u64);
            for item in arr {
                encode_value_to(buf, item);
            }
        }
        Value::Map(entries) => {
            encode_map_canonical(buf, entries);
        }
        Value::Float(f) => {
            encode_float(buf, *f);
        }
        Value::Bool(b) => {
            buf.push(if *b { 0xf5 } else { 0xf4 });
        }
        Value::Null => {
            buf.push(0xf6);
        }
        _ => {
            panic!("unsupported CBOR value type");
        }
    }
}

/// Encode a CBOR integer (major types 0 and 1).
fn encode_integer(buf: &mut Vec<u8>, i: ciborium::value::Integer) {
    let n: i128 = i.into();

    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        let abs = (-1 - n) as u64;
        encode_uint(buf, 1, abs);
    }
}

/// Encode an unsigned integer with the given major type, smallest width.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffffffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a float in the shortest form that preserves its value.
fn encode_float(buf: &mut Vec<u8>, v: f64) {
    if v.is_nan() {
        // Canonical NaN.
        buf.extend_from_slice(&[0xf9, 0x7e, 0x00]);
        return;
    }
    let single = v as f32;
    if f64::from(single) == v {
        if let Some(half) = half_bits(single) {
            buf.push(0xf9);
            buf.extend_from_slice(&half.to_be_bytes());
        } else {
            buf.push(0xfa);
            buf.extend_from_slice(&single.to_bits().to_be_bytes());
        }
    } else {
        buf.push(0xfb);
        buf.extend_from_slice(&v.to_bits().to_be_bytes());
    }
}

/// Half-precision bits for an f32, if the conversion is lossless.
fn half_bits(v: f32) -> Option<u16> {
    let bits = v.to_bits();
    let sign = ((bits >> 16) & 0x8000) as u16;
    let exp = ((bits >> 23) & 0xff) as i32;
    let mantissa = bits & 0x007f_ffff;

    if exp == 0xff {
        // Infinities; NaN is handled by the caller.
        return if mantissa == 0 { Some(sign | 0x7c00) } else { None };
    }
    if exp == 0 {
        // f32 subnormals are below the f16 range entirely, except zero.
        return if mantissa == 0 { Some(sign) } else { None };
    }

    let unbiased = exp - 127;
    if (-14..=15).contains(&unbiased) {
        // Normal f16: the mantissa must fit in 10 bits.
        if mantissa & 0x1fff != 0 {
            return None;
        }
        return Some(sign | (((unbiased + 15) as u16) << 10) | (mantissa >> 13) as u16);
    }
    if (-24..-14).contains(&unbiased) {
        // Subnormal f16: the implicit leading bit becomes explicit.
        let shift = 13 + (-14 - unbiased) as u32;
        let significand = 0x0080_0000 | mantissa;
        let half_mantissa = significand >> shift;
        if half_mantissa << shift != significand {
            return None;
        }
        return Some(sign | half_mantissa as u16);
    }
    None
}

/// Encode a map canonically (major type 5).
///
/// Keys are sorted by their encoded byte comparison.
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(Value, Value)]) {
    let mut key_value_pairs: Vec<(Vec<u8>, &Value)> = entries
        .iter()
        .map(|(k, v)| {
            let mut key_buf = Vec::new();
            encode_value_to(&mut key_buf, k);
            (key_buf, v)
        })
        .collect();

    key_value_pairs.sort_by(|a, b| a.0.cmp(&b.0));

    encode_uint(buf, 5, key_value_pairs.len() as u64);

    for (key_bytes, value) in key_value_pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Identity;
    use crate::packet::PacketBuilder;
    use proptest::prelude::*;

    fn sample_packet() -> Packet {
        let sender = SenderId::from_bytes([0x11; 32]);
        PacketBuilder::new(sender, 1)
            .intent(Intent::new("ECHO").with_param("hi").created_at(0.0))
            .build()
    }

    #[test]
    fn test_content_encoding_deterministic() {
        let packet = sample_packet();
        assert_eq!(signing_content_bytes(&packet), signing_content_bytes(&packet));
    }

    #[test]
    fn test_content_key_order() {
        // Keys sort bytewise: "n" < "pl" < "src".
        let bytes = signing_content_bytes(&sample_packet());
        assert_eq!(&bytes[..3], &[0xa3, 0x61, 0x6e]);
    }

    #[test]
    fn test_map_order_independent_of_insertion() {
        let forward = vec![
            (Value::Text("a".into()), Value::Integer(1.into())),
            (Value::Text("b".into()), Value::Integer(2.into())),
        ];
        let reversed: Vec<_> = forward.iter().rev().cloned().collect();

        let mut buf_fwd = Vec::new();
        encode_map_canonical(&mut buf_fwd, &forward);
        let mut buf_rev = Vec::new();
        encode_map_canonical(&mut buf_rev, &reversed);
        assert_eq!(buf_fwd, buf_rev);
    }

    #[test]
    fn test_integer_widths() {
        let mut buf = Vec::new();
        encode_uint(&mut buf, 0, 23);
        assert_eq!(buf, vec![0x17]);

        buf.clear();
        encode_uint(&mut buf, 0, 24);
        assert_eq!(buf, vec![0x18, 24]);

        buf.clear();
        encode_uint(&mut buf, 0, 1000);
        assert_eq!(buf, vec![0x19, 0x03, 0xe8]);

        buf.clear();
        encode_uint(&mut buf, 0, 1_000_000);
        assert_eq!(buf, vec![0x1a, 0x00, 0x0f, 0x42, 0x40]);
    }

    #[test]
    fn test_negative_integer_encoding() {
        let mut buf = Vec::new();
        encode_integer(&mut buf, (-1i64).into());
        assert_eq!(buf, vec![0x20]);

        buf.clear();
        encode_integer(&mut buf, (-2i64).into());
        assert_eq!(buf, vec![0x21]);
    }

    #[test]
    fn test_float_shortest_form() {
        let mut buf = Vec::new();
        encode_float(&mut buf, 0.0);
        assert_eq!(buf, vec![0xf9, 0x00, 0x00]);

        buf.clear();
        encode_float(&mut buf, 1.5);
        assert_eq!(buf, vec![0xf9, 0x3e, 0x00]);

        buf.clear();
        encode_float(&mut buf, 0.5);
        assert_eq!(buf, vec![0xf9, 0x38, 0x00]);

        buf.clear();
        encode_float(&mut buf, 65504.0);
        assert_eq!(buf, vec![0xf9, 0x7b, 0xff]);

        buf.clear();
        encode_float(&mut buf, 1048576.0);
        assert_eq!(buf, vec![0xfa, 0x49, 0x80, 0x00, 0x00]);

        buf.clear();
        encode_float(&mut buf, 0.1);
        assert_eq!(
            buf,
            vec![0xfb, 0x3f, 0xb9, 0x99, 0x99, 0x99, 0x99, 0x99, 0x9a]
        );

        buf.clear();
        encode_float(&mut buf, f64::INFINITY);
        assert_eq!(buf, vec![0xf9, 0x7c, 0x00]);

        buf.clear();
        encode_float(&mut buf, f64::NAN);
        assert_eq!(buf, vec![0xf9, 0x7e, 0x00]);
    }

    #[test]
    fn test_wire_roundtrip_unsigned() {
        let packet = sample_packet();
        let decoded = packet_from_wire(&wire_bytes(&packet)).unwrap();
        assert_eq!(decoded, packet);
        assert!(decoded.signature.is_none());
    }

    #[test]
    fn test_wire_roundtrip_signed() {
        let identity = Identity::from_seed(&[0x42; 32]);
        let packet = PacketBuilder::new(identity.sender_id(), 7)
            .intent(Intent::new("BOOT").with_param("0.1.0").with_param("live").created_at(1.5))
            .sign(&identity)
            .unwrap();

        let decoded = packet_from_wire(&wire_bytes(&packet)).unwrap();
        assert_eq!(decoded, packet);
        assert!(decoded.verify());
    }

    #[test]
    fn test_decode_rejects_truncated() {
        let packet = sample_packet();
        let bytes = wire_bytes(&packet);
        let err = packet_from_wire(&bytes[..bytes.len() - 3]).unwrap_err();
        assert!(matches!(err, CoreError::MalformedPacket(_)));
    }

    #[test]
    fn test_decode_rejects_wrong_version() {
        let entries = vec![
            (Value::Text("v".into()), Value::Integer(2.into())),
            (Value::Text("dat".into()), Value::Bytes(vec![])),
            (Value::Text("sig".into()), Value::Bytes(vec![])),
        ];
        let bytes = encode_canonical(&Value::Map(entries));
        let err = packet_from_wire(&bytes).unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedVersion(2)));
    }

    #[test]
    fn test_decode_rejects_missing_fields() {
        let entries = vec![(Value::Text("v".into()), Value::Integer(1.into()))];
        let bytes = encode_canonical(&Value::Map(entries));
        let err = packet_from_wire(&bytes).unwrap_err();
        assert!(matches!(err, CoreError::MalformedPacket(_)));
    }

    #[test]
    fn test_decode_rejects_bad_signature_length() {
        let packet = sample_packet();
        let entries = vec![
            (Value::Text("v".into()), Value::Integer(1.into())),
            (
                Value::Text("dat".into()),
                Value::Bytes(signing_content_bytes(&packet)),
            ),
            (Value::Text("sig".into()), Value::Bytes(vec![0xab; 63])),
        ];
        let bytes = encode_canonical(&Value::Map(entries));
        let err = packet_from_wire(&bytes).unwrap_err();
        assert!(matches!(err, CoreError::MalformedPacket(_)));
    }

    #[test]
    fn test_decode_rejects_bad_sender_hex() {
        let content = encode_canonical(&Value::Map(vec![
            (Value::Text("src".into()), Value::Text("not-hex".into())),
            (Value::Text("n".into()), Value::Integer(1.into())),
            (Value::Text("pl".into()), Value::Array(vec![])),
        ]));
        let bytes = encode_canonical(&Value::Map(vec![
            (Value::Text("v".into()), Value::Integer(1.into())),
            (Value::Text("dat".into()), Value::Bytes(content)),
            (Value::Text("sig".into()), Value::Bytes(vec![])),
        ]));
        let err = packet_from_wire(&bytes).unwrap_err();
        assert!(matches!(err, CoreError::MalformedPacket(_)));
    }

    #[test]
    fn test_decode_rejects_nested_params() {
        let intent_record = Value::Map(vec![
            (Value::Text("id".into()), Value::Text("X".into())),
            (
                Value::Text("p".into()),
                Value::Array(vec![Value::Array(vec![Value::Integer(1.into())])]),
            ),
            (Value::Text("t".into()), Value::Float(0.0)),
        ]);
        let content = encode_canonical(&Value::Map(vec![
            (
                Value::Text("src".into()),
                Value::Text(SenderId::from_bytes([0x11; 32]).to_hex()),
            ),
            (Value::Text("n".into()), Value::Integer(1.into())),
            (Value::Text("pl".into()), Value::Array(vec![intent_record])),
        ]));
        let bytes = encode_canonical(&Value::Map(vec![
            (Value::Text("v".into()), Value::Integer(1.into())),
            (Value::Text("dat".into()), Value::Bytes(content)),
            (Value::Text("sig".into()), Value::Bytes(vec![])),
        ]));
        let err = packet_from_wire(&bytes).unwrap_err();
        assert!(matches!(err, CoreError::MalformedPacket(_)));
    }

    #[test]
    fn test_decode_accepts_integer_timestamp() {
        let intent_record = Value::Map(vec![
            (Value::Text("id".into()), Value::Text("X".into())),
            (Value::Text("p".into()), Value::Array(vec![])),
            (Value::Text("t".into()), Value::Integer(12.into())),
        ]);
        let content = encode_canonical(&Value::Map(vec![
            (
                Value::Text("src".into()),
                Value::Text(SenderId::from_bytes([0x11; 32]).to_hex()),
            ),
            (Value::Text("n".into()), Value::Integer(1.into())),
            (Value::Text("pl".into()), Value::Array(vec![intent_record])),
        ]));
        let bytes = encode_canonical(&Value::Map(vec![
            (Value::Text("v".into()), Value::Integer(1.into())),
            (Value::Text("dat".into()), Value::Bytes(content)),
            (Value::Text("sig".into()), Value::Bytes(vec![])),
        ]));
        let decoded = packet_from_wire(&bytes).unwrap();
        assert_eq!(decoded.intents[0].created_at, 12.0);
    }

    fn param_strategy() -> impl Strategy<Value = ParamValue> {
        prop_oneof![
            Just(ParamValue::Null),
            any::<bool>().prop_map(ParamValue::Bool),
            any::<i64>().prop_map(ParamValue::Int),
            (-1.0e12..1.0e12f64).prop_map(ParamValue::Float),
            "[a-zA-Z0-9 _:-]{0,16}".prop_map(ParamValue::Text),
            prop::collection::vec(any::<u8>(), 0..16)
                .prop_map(|b| ParamValue::Bytes(b.into())),
        ]
    }

    fn packet_strategy() -> impl Strategy<Value = Packet> {
        (
            any::<[u8; 32]>(),
            any::<u64>(),
            prop::collection::vec(
                (
                    "[A-Z][A-Z0-9_]{0,11}",
                    prop::collection::vec(param_strategy(), 0..4),
                    0.0f64..2.0e9,
                ),
                0..4,
            ),
        )
            .prop_map(|(sender, nonce, intents)| Packet {
                sender: SenderId::from_bytes(sender),
                nonce,
                intents: intents
                    .into_iter()
                    .map(|(name, params, t)| {
                        Intent::new(name).with_params(params).created_at(t)
                    })
                    .collect(),
                signature: None,
            })
    }

    proptest! {
        #[test]
        fn prop_content_encoding_deterministic(packet in packet_strategy()) {
            prop_assert_eq!(
                signing_content_bytes(&packet),
                signing_content_bytes(&packet)
            );
        }

        #[test]
        fn prop_wire_roundtrip(packet in packet_strategy()) {
            let decoded = packet_from_wire(&wire_bytes(&packet)).unwrap();
            prop_assert_eq!(decoded, packet);
        }
    }
}
