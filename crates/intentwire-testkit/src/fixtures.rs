//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use intentwire_core::{Identity, Intent, Packet, PacketBuilder, ParamValue, SenderId};
use intentwire_runtime::{
    builtin, HandlerError, HandlerRegistry, IntentHandler, Runtime, RuntimeConfig,
};

/// A test fixture with an identity and a registry preloaded with the
/// built-in handlers.
pub struct TestFixture {
    pub identity: Identity,
    pub registry: Arc<HandlerRegistry>,
}

impl TestFixture {
    /// Create a fixture with a random identity.
    pub fn new() -> Self {
        let registry = Arc::new(HandlerRegistry::new());
        builtin::register_builtins(&registry);
        Self {
            identity: Identity::generate(),
            registry,
        }
    }

    /// Create with a deterministic identity from a seed.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        let registry = Arc::new(HandlerRegistry::new());
        builtin::register_builtins(&registry);
        Self {
            identity: Identity::from_seed(&seed),
            registry,
        }
    }

    /// The fixture identity's public identifier.
    pub fn sender_id(&self) -> SenderId {
        self.identity.sender_id()
    }

    /// A runtime that authorizes this fixture's identity.
    pub fn runtime(&self) -> Runtime {
        Runtime::new([self.sender_id()], Arc::clone(&self.registry))
    }

    /// Same, with an explicit configuration.
    pub fn runtime_with_config(&self, config: RuntimeConfig) -> Runtime {
        Runtime::with_config([self.sender_id()], Arc::clone(&self.registry), config)
    }

    /// Build and sign a packet from this fixture's identity.
    pub fn signed_packet(&self, nonce: u64, intents: Vec<Intent>) -> Packet {
        let builder = intents
            .into_iter()
            .fold(PacketBuilder::new(self.sender_id(), nonce), |b, i| {
                b.intent(i)
            });
        builder
            .sign(&self.identity)
            .expect("fixture identity matches packet sender")
    }

    /// A signed single-intent ECHO packet.
    pub fn echo_packet(&self, nonce: u64, message: &str) -> Packet {
        self.signed_packet(nonce, vec![Intent::new(builtin::ECHO).with_param(message)])
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Create multiple fixtures with distinct deterministic identities.
pub fn multi_party_fixtures(count: usize) -> Vec<TestFixture> {
    (0..count)
        .map(|i| {
            let mut seed = [0u8; 32];
            seed[0] = i as u8;
            TestFixture::with_seed(seed)
        })
        .collect()
}

/// A handler that counts invocations.
///
/// Register it and assert on the counter to prove that the security
/// gates ran before any handler did.
pub struct CountingHandler {
    calls: Arc<AtomicUsize>,
}

impl CountingHandler {
    /// Returns the handler and a shared view of its call counter.
    pub fn new() -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }
}

#[async_trait]
impl IntentHandler for CountingHandler {
    async fn invoke(&self, _params: &[ParamValue]) -> Result<ParamValue, HandlerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ParamValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_signs_valid_packets() {
        let fixture = TestFixture::new();
        let packet = fixture.echo_packet(1, "hi");
        assert!(packet.verify());
        assert_eq!(packet.sender, fixture.sender_id());
    }

    #[test]
    fn test_multi_party_distinct_identities() {
        let parties = multi_party_fixtures(3);
        let ids: Vec<_> = parties.iter().map(|p| p.sender_id()).collect();
        assert_ne!(ids[0], ids[1]);
        assert_ne!(ids[1], ids[2]);
        assert_ne!(ids[0], ids[2]);
    }

    #[tokio::test]
    async fn test_counting_handler_counts() {
        let (handler, calls) = CountingHandler::new();
        handler.invoke(&[]).await.unwrap();
        handler.invoke(&[]).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
