//! Links, blocks and the "no entries" sentinel.

use std::fmt;

use cid::Cid;
use ciborium::value::Value;

use crate::canonical::encode_dag_cbor;
use crate::crypto::sha256_multihash;
use crate::error::CodecError;

/// Multicodec code for raw bytes.
pub const RAW: u64 = 0x55;

/// Multicodec code for DAG-CBOR.
pub const DAG_CBOR: u64 = 0x71;

/// The CID used in place of an entries link when an advertisement carries no
/// content: CIDv1, raw codec, sha2-256 of the empty byte string.
pub fn no_entries_cid() -> Cid {
    // Hashing the empty string into a 32-byte digest always fits a 64-byte
    // multihash; the fallback is never reached.
    let mh = sha256_multihash(&[]).unwrap_or_default();
    Cid::new_v1(RAW, mh)
}

/// What an advertisement's `Entries` field points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntriesLink {
    /// Head of an entry chunk chain.
    Chunk(Cid),
    /// The advertisement announces no content.
    NoEntries,
}

impl EntriesLink {
    /// The link written to the wire.
    pub fn cid(&self) -> Cid {
        match self {
            EntriesLink::Chunk(cid) => *cid,
            EntriesLink::NoEntries => no_entries_cid(),
        }
    }

    /// Binary form of the link, as used in signable bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.cid().to_bytes()
    }

    pub fn is_no_entries(&self) -> bool {
        matches!(self, EntriesLink::NoEntries)
    }
}

impl From<Cid> for EntriesLink {
    fn from(cid: Cid) -> Self {
        if cid == no_entries_cid() {
            EntriesLink::NoEntries
        } else {
            EntriesLink::Chunk(cid)
        }
    }
}

/// An encoded block and its content identifier.
#[derive(Clone, PartialEq, Eq)]
pub struct Block {
    pub cid: Cid,
    pub bytes: Vec<u8>,
}

impl Block {
    /// Encode `value` as DAG-CBOR and address it with sha2-256.
    pub fn encode(value: &Value) -> Result<Self, CodecError> {
        let bytes = encode_dag_cbor(value)?;
        let cid = Cid::new_v1(DAG_CBOR, sha256_multihash(&bytes)?);
        Ok(Self { cid, bytes })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Block({}, {} bytes)", self.cid, self.bytes.len())
    }
}
