//! Proptest generators for property-based testing.

use bytes::Bytes;
use multihash::Multihash;
use proptest::prelude::*;
use rand::{rngs::StdRng, RngCore, SeedableRng};
use sha2::{Digest, Sha256, Sha512};

use ipni_ads_core::{
    crypto::{SHA2_256, SHA2_512},
    types::DAG_CBOR,
    Advertisement, AdvertisementOptions, Cid, EntriesLink, Keypair, PeerId, ProtocolKind,
    Provider, MAX_CONTEXT_LEN,
};

/// The sha2-256 multihash of `data`, as entry bytes.
pub fn sha256_entry(data: &[u8]) -> Bytes {
    let digest = Sha256::digest(data);
    let mh = Multihash::<64>::wrap(SHA2_256, &digest).expect("32-byte digest fits");
    Bytes::from(mh.to_bytes())
}

/// The sha2-512 multihash of `data`, as entry bytes.
pub fn sha512_entry(data: &[u8]) -> Bytes {
    let digest = Sha512::digest(data);
    let mh = Multihash::<64>::wrap(SHA2_512, &digest).expect("64-byte digest fits");
    Bytes::from(mh.to_bytes())
}

/// `count` pseudo-random sha2-256 entries from a seed. Faster than proptest
/// collections for large chunks.
pub fn seeded_entries(seed: u64, count: usize) -> Vec<Bytes> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut buf = [0u8; 32];
    (0..count)
        .map(|_| {
            rng.fill_bytes(&mut buf);
            sha256_entry(&buf)
        })
        .collect()
}

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::ed25519_from_bytes(seed).expect("32-byte seed"))
}

/// Generate a random PeerId.
pub fn peer_id() -> impl Strategy<Value = PeerId> {
    keypair().prop_map(|kp| kp.public().to_peer_id())
}

/// A sha2-256 or sha2-512 multihash entry.
pub fn entry() -> impl Strategy<Value = Bytes> {
    prop_oneof![
        3 => any::<[u8; 16]>().prop_map(|d| sha256_entry(&d)),
        1 => any::<[u8; 16]>().prop_map(|d| sha512_entry(&d)),
    ]
}

/// Entries of up to `max_len` multihashes.
pub fn entries(max_len: usize) -> impl Strategy<Value = Vec<Bytes>> {
    prop::collection::vec(entry(), 0..=max_len)
}

/// A DAG-CBOR CID, as used for chunk links.
pub fn cid() -> impl Strategy<Value = Cid> {
    any::<[u8; 16]>().prop_map(|d| {
        let digest = Sha256::digest(d);
        let mh = Multihash::<64>::wrap(SHA2_256, &digest).expect("32-byte digest fits");
        Cid::new_v1(DAG_CBOR, mh)
    })
}

/// A context id within the allowed length.
pub fn context() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=MAX_CONTEXT_LEN)
}

/// A protocol that needs no metadata.
pub fn simple_protocol() -> impl Strategy<Value = ProtocolKind> {
    prop_oneof![Just(ProtocolKind::Http), Just(ProtocolKind::Bitswap)]
}

/// Parameters for generating an advertisement.
#[derive(Debug, Clone)]
pub struct AdParams {
    pub seed: [u8; 32],
    pub protocol: ProtocolKind,
    pub port: u16,
    pub context: Vec<u8>,
    pub entries: Option<Cid>,
    pub previous: Option<Cid>,
    pub remove: bool,
}

impl Arbitrary for AdParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            any::<[u8; 32]>(),
            simple_protocol(),
            1u16..=u16::MAX,
            context(),
            prop::option::of(cid()),
            prop::option::of(cid()),
            any::<bool>(),
        )
            .prop_map(
                |(seed, protocol, port, context, entries, previous, remove)| AdParams {
                    seed,
                    protocol,
                    port,
                    context,
                    entries,
                    previous,
                    remove,
                },
            )
            .boxed()
    }
}

/// Build the keypair for generated params.
pub fn keypair_from_params(params: &AdParams) -> Keypair {
    Keypair::ed25519_from_bytes(params.seed).expect("32-byte seed")
}

/// Build an advertisement from params.
pub fn advertisement_from_params(params: &AdParams) -> Advertisement {
    let keypair = keypair_from_params(params);
    let address = format!("/ip4/127.0.0.1/tcp/{}", params.port);
    let provider = Provider::parse(
        keypair.public().to_peer_id(),
        &[address],
        params.protocol.as_str(),
        None,
    )
    .expect("generated provider");

    let entries = match params.entries {
        Some(cid) if !params.remove => EntriesLink::Chunk(cid),
        _ => EntriesLink::NoEntries,
    };

    Advertisement::new(
        vec![provider],
        entries,
        params.context.clone(),
        params.previous,
        AdvertisementOptions {
            remove: params.remove,
            override_extended: false,
        },
    )
    .expect("generated advertisement")
}
