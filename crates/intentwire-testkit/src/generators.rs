//! Proptest generators for property-based testing.

use proptest::prelude::*;

use intentwire_core::{Identity, Intent, Packet, PacketBuilder, ParamValue, SenderId};

/// Generate a deterministic identity from an arbitrary seed.
pub fn identity() -> impl Strategy<Value = Identity> {
    any::<[u8; 32]>().prop_map(|seed| Identity::from_seed(&seed))
}

/// Generate a sender identifier backed by a real key pair.
pub fn sender_id() -> impl Strategy<Value = SenderId> {
    identity().prop_map(|i| i.sender_id())
}

/// Generate a primitive parameter value.
///
/// Floats are drawn from a finite range: NaN has no equality and
/// infinities add nothing to encoder coverage here.
pub fn param_value() -> impl Strategy<Value = ParamValue> {
    prop_oneof![
        Just(ParamValue::Null),
        any::<bool>().prop_map(ParamValue::Bool),
        any::<i64>().prop_map(ParamValue::Int),
        (-1.0e12..1.0e12f64).prop_map(ParamValue::Float),
        "[a-zA-Z0-9 _:-]{0,24}".prop_map(ParamValue::Text),
        prop::collection::vec(any::<u8>(), 0..32).prop_map(|b| ParamValue::Bytes(b.into())),
    ]
}

/// Generate an intent name in the conventional upper-case style.
pub fn intent_name() -> impl Strategy<Value = String> {
    "[A-Z][A-Z0-9_]{0,11}".prop_map(String::from)
}

/// Generate a plausible creation timestamp.
pub fn timestamp() -> impl Strategy<Value = f64> {
    0.0f64..2.0e9
}

/// Generate a complete intent.
pub fn intent() -> impl Strategy<Value = Intent> {
    (
        intent_name(),
        prop::collection::vec(param_value(), 0..4),
        timestamp(),
    )
        .prop_map(|(name, params, t)| Intent::new(name).with_params(params).created_at(t))
}

/// Parameters for generating a signed packet.
#[derive(Debug, Clone)]
pub struct PacketParams {
    pub seed: [u8; 32],
    pub nonce: u64,
    pub intents: Vec<Intent>,
}

/// Generate packet parameters.
pub fn packet_params() -> impl Strategy<Value = PacketParams> {
    (
        any::<[u8; 32]>(),
        any::<u64>(),
        prop::collection::vec(intent(), 0..4),
    )
        .prop_map(|(seed, nonce, intents)| PacketParams {
            seed,
            nonce,
            intents,
        })
}

/// Build and sign a packet from parameters. Deterministic: the same
/// parameters always produce the same packet and signature.
pub fn signed_packet_from_params(params: &PacketParams) -> Packet {
    let identity = Identity::from_seed(&params.seed);
    let builder = params
        .intents
        .iter()
        .cloned()
        .fold(
            PacketBuilder::new(identity.sender_id(), params.nonce),
            |b, i| b.intent(i),
        );
    builder
        .sign(&identity)
        .expect("generated identity matches packet sender")
}
