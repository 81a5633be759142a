//! Golden test vectors for deterministic verification.
//!
//! Size vectors pin the exact DAG-CBOR length of entry chunks, which other
//! indexer implementations must agree on to chunk identically. Advertisement
//! vectors pin the wire record built from fixed inputs.

use bytes::Bytes;
use ipni_ads_core::{
    Advertisement, AdvertisementOptions, AdvertisementRecord, Cid, EntriesLink, EntryChunk,
    Keypair, Provider,
};

use crate::generators::sha512_entry;

/// The CID used as both a link and, via its multihash, a 34-byte entry.
pub const EMPTY_DIR_CID: &str = "bafybeiczsscdsbs7ffqz55asqdf3smv6klcw3gofszvwlyarci47bgf354";

/// Which multihash a size vector repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// sha2-256 multihash of [`EMPTY_DIR_CID`], 34 bytes.
    Sha256,
    /// sha2-512 multihash of the empty string, 66 bytes.
    Sha512,
}

/// A golden entry chunk size.
#[derive(Debug, Clone)]
pub struct SizeVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    pub entry_kind: EntryKind,
    pub entry_count: usize,
    /// Link the chunk to [`EMPTY_DIR_CID`].
    pub with_next: bool,
    /// Expected encoded length in bytes.
    pub expected_size: usize,
}

/// Get all size vectors.
pub fn all_size_vectors() -> Vec<SizeVector> {
    vec![
        SizeVector {
            name: "empty chunk",
            entry_kind: EntryKind::Sha256,
            entry_count: 0,
            with_next: false,
            expected_size: 10,
        },
        SizeVector {
            name: "one sha256 entry",
            entry_kind: EntryKind::Sha256,
            entry_count: 1,
            with_next: false,
            expected_size: 46,
        },
        SizeVector {
            name: "one sha256 entry with next",
            entry_kind: EntryKind::Sha256,
            entry_count: 1,
            with_next: true,
            expected_size: 92,
        },
        SizeVector {
            name: "ten thousand sha256 entries",
            entry_kind: EntryKind::Sha256,
            entry_count: 10_000,
            with_next: false,
            expected_size: 360_012,
        },
        SizeVector {
            name: "65536 sha512 entries with next",
            entry_kind: EntryKind::Sha512,
            entry_count: 65_536,
            with_next: true,
            expected_size: 4_456_508,
        },
    ]
}

pub fn empty_dir_cid() -> Cid {
    Cid::try_from(EMPTY_DIR_CID).expect("valid literal cid")
}

/// Build the chunk a size vector describes.
pub fn chunk_from_vector(vector: &SizeVector) -> EntryChunk {
    let entry = match vector.entry_kind {
        EntryKind::Sha256 => Bytes::from(empty_dir_cid().hash().to_bytes()),
        EntryKind::Sha512 => sha512_entry(b""),
    };
    let next = vector.with_next.then(empty_dir_cid);
    EntryChunk::from_entries(vec![entry; vector.entry_count], next)
}

/// Check every size vector against both the tracked size and the real
/// encoding. Returns the names of failing vectors.
pub fn verify_size_vectors() -> Vec<&'static str> {
    all_size_vectors()
        .iter()
        .filter(|v| {
            let chunk = chunk_from_vector(v);
            let encoded = chunk.export().map(|b| b.len()).unwrap_or(0);
            chunk.calculate_encoded_size() != v.expected_size || encoded != v.expected_size
        })
        .map(|v| v.name)
        .collect()
}

/// A golden advertisement built from fixed inputs.
#[derive(Debug, Clone)]
pub struct AdVector {
    pub name: &'static str,
    /// Seed for the deterministic ed25519 key.
    pub seed: [u8; 32],
    pub address: &'static str,
    pub protocol: &'static str,
    pub entries: &'static str,
    pub context: &'static [u8],
    pub remove: bool,
    /// Expected `Metadata` field (hex).
    pub expected_metadata: &'static str,
}

/// Get all advertisement vectors.
pub fn all_ad_vectors() -> Vec<AdVector> {
    vec![
        AdVector {
            name: "http provider, one-byte context",
            seed: [0x01; 32],
            address: "/dns4/example.org/tcp/443/https",
            protocol: "http",
            entries: EMPTY_DIR_CID,
            context: &[99],
            remove: false,
            expected_metadata: "8080f401",
        },
        AdVector {
            name: "bitswap provider, empty context",
            seed: [0x02; 32],
            address: "/ip4/127.0.0.1/tcp/4001",
            protocol: "bitswap",
            entries: EMPTY_DIR_CID,
            context: &[],
            remove: false,
            expected_metadata: "8012",
        },
        AdVector {
            name: "http removal",
            seed: [0x03; 32],
            address: "/dns4/example.org/tcp/443/https",
            protocol: "http",
            entries: "",
            context: b"gone",
            remove: true,
            expected_metadata: "8080f401",
        },
    ]
}

/// The keypair a vector signs with.
pub fn keypair_from_vector(vector: &AdVector) -> Keypair {
    Keypair::ed25519_from_bytes(vector.seed).expect("32-byte seed")
}

/// Build the unsigned advertisement a vector describes. An empty `entries`
/// string means no entries.
pub fn advertisement_from_vector(vector: &AdVector) -> Advertisement {
    let keypair = keypair_from_vector(vector);
    let provider = Provider::parse(
        keypair.public().to_peer_id(),
        &[vector.address],
        vector.protocol,
        None,
    )
    .expect("vector provider");

    let entries = if vector.entries.is_empty() {
        EntriesLink::NoEntries
    } else {
        EntriesLink::Chunk(Cid::try_from(vector.entries).expect("valid literal cid"))
    };

    Advertisement::new(
        vec![provider],
        entries,
        vector.context.to_vec(),
        None,
        AdvertisementOptions {
            remove: vector.remove,
            override_extended: false,
        },
    )
    .expect("vector advertisement")
}

/// Build and sign the record a vector describes.
pub fn record_from_vector(vector: &AdVector) -> AdvertisementRecord {
    advertisement_from_vector(vector)
        .encode_and_sign(&keypair_from_vector(vector))
        .expect("vector signs")
}
