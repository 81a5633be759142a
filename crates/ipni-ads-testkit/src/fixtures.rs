//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use bytes::Bytes;
use ipni_ads_core::{
    Advertisement, AdvertisementOptions, AdvertisementRecord, Cid, EntriesLink, EntryChunk,
    Keypair, Keyring, PeerId, ProtocolKind, Provider,
};
use ipni_ads_store::MemoryStore;

use crate::generators::sha256_entry;

/// Address every fixture provider listens on unless told otherwise.
pub const FIXTURE_ADDRESS: &str = "/dns4/example.org/tcp/443/https";

/// A seeded provider with its keypair and a memory store.
pub struct ProviderFixture {
    pub keypair: Keypair,
    pub provider: Provider,
    pub store: MemoryStore,
}

impl ProviderFixture {
    /// Create a new HTTP provider fixture with a random keypair.
    pub fn new() -> Self {
        Self::from_keypair(Keypair::generate_ed25519(), ProtocolKind::Http)
    }

    /// Create an HTTP provider with a deterministic keypair from seed.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        Self::with_seed_and_protocol(seed, ProtocolKind::Http)
    }

    /// Deterministic keypair, chosen protocol. Graphsync is not supported
    /// here since it needs piece metadata.
    pub fn with_seed_and_protocol(seed: [u8; 32], protocol: ProtocolKind) -> Self {
        let keypair = Keypair::ed25519_from_bytes(seed).expect("32-byte seed");
        Self::from_keypair(keypair, protocol)
    }

    fn from_keypair(keypair: Keypair, protocol: ProtocolKind) -> Self {
        let provider = Provider::parse(
            keypair.public().to_peer_id(),
            &[FIXTURE_ADDRESS],
            protocol.as_str(),
            None,
        )
        .expect("fixture provider");
        Self {
            keypair,
            provider,
            store: MemoryStore::new(),
        }
    }

    pub fn peer_id(&self) -> PeerId {
        self.keypair.public().to_peer_id()
    }

    /// A chunk of `count` distinct sha2-256 multihashes.
    pub fn make_chunk(&self, count: u32) -> EntryChunk {
        let entries: Vec<Bytes> = (0..count).map(|n| sha256_entry(&n.to_be_bytes())).collect();
        EntryChunk::from_entries(entries, None)
    }

    /// An advertisement over a fresh ten-entry chunk.
    pub fn make_advertisement(&self, context: &[u8], previous: Option<Cid>) -> Advertisement {
        let chunk = self.make_chunk(10).export().expect("encodable chunk");
        Advertisement::new(
            vec![self.provider.clone()],
            EntriesLink::Chunk(chunk.cid),
            context.to_vec(),
            previous,
            AdvertisementOptions::default(),
        )
        .expect("valid advertisement")
    }

    /// A signed advertisement record.
    pub fn make_record(&self, context: &[u8], previous: Option<Cid>) -> AdvertisementRecord {
        self.make_advertisement(context, previous)
            .encode_and_sign(&self.keypair)
            .expect("signable")
    }
}

impl Default for ProviderFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Create multiple provider fixtures for extended-provider tests.
pub fn multi_party_fixtures(count: usize) -> Vec<ProviderFixture> {
    (0..count)
        .map(|i| {
            let mut seed = [0u8; 32];
            seed[0] = i as u8;
            seed[31] = 0xA5;
            ProviderFixture::with_seed(seed)
        })
        .collect()
}

/// A keyring that can sign for every fixture.
pub fn keyring(fixtures: &[ProviderFixture]) -> Keyring {
    fixtures.iter().map(|f| f.keypair.clone()).collect()
}
