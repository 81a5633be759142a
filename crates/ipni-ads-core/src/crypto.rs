//! Hashing and signing for advertisements.
//!
//! Signatures are libp2p signed envelopes whose payload is the sha2-256
//! multihash of an advertisement's signable bytes. The envelope domain and
//! the two payload types below are part of the IPNI protocol.

use std::collections::HashMap;
use std::fmt;

use libp2p_core::SignedEnvelope;
use libp2p_identity::{Keypair, PeerId};
use multihash::Multihash;
use sha2::{Digest, Sha256};

use crate::error::{CodecError, SigningError};

/// Multicodec code for sha2-256.
pub const SHA2_256: u64 = 0x12;

/// Multicodec code for sha2-512.
pub const SHA2_512: u64 = 0x13;

/// Envelope domain shared by all advertisement signatures.
pub const SIGNATURE_DOMAIN: &str = "indexer";

/// Payload type for the root advertisement signature.
pub const AD_SIGNATURE_CODEC: &[u8] = b"/indexer/ingest/adSignature";

/// Payload type for each extended provider signature.
pub const EXTENDED_PROVIDER_SIGNATURE_CODEC: &[u8] = b"/indexer/ingest/extendedProviderSignature";

/// Compute the sha2-256 multihash of `data`.
pub fn sha256_multihash(data: &[u8]) -> Result<Multihash<64>, CodecError> {
    let digest = Sha256::digest(data);
    Multihash::wrap(SHA2_256, &digest).map_err(|e| CodecError::Multihash(e.to_string()))
}

/// The payload that actually gets sealed: the multihash bytes of the digest
/// of `signable`, never the raw signable bytes.
pub fn signature_payload(signable: &[u8]) -> Result<Vec<u8>, CodecError> {
    Ok(sha256_multihash(signable)?.to_bytes())
}

/// Capability to seal signature payloads on behalf of peers.
///
/// The core calls this once per signer, sequentially. Implementations may
/// front a local keypair, a keyring, or a remote signer.
pub trait EnvelopeSigner {
    /// Seal `payload` with the key of `peer`, returning the marshalled
    /// envelope bytes.
    fn seal(&self, peer: &PeerId, codec: &[u8], payload: &[u8]) -> Result<Vec<u8>, SigningError>;
}

impl<T: EnvelopeSigner + ?Sized> EnvelopeSigner for &T {
    fn seal(&self, peer: &PeerId, codec: &[u8], payload: &[u8]) -> Result<Vec<u8>, SigningError> {
        (**self).seal(peer, codec, payload)
    }
}

impl<T: EnvelopeSigner + ?Sized> EnvelopeSigner for std::sync::Arc<T> {
    fn seal(&self, peer: &PeerId, codec: &[u8], payload: &[u8]) -> Result<Vec<u8>, SigningError> {
        (**self).seal(peer, codec, payload)
    }
}

/// A single keypair signs only for its own peer id.
impl EnvelopeSigner for Keypair {
    fn seal(&self, peer: &PeerId, codec: &[u8], payload: &[u8]) -> Result<Vec<u8>, SigningError> {
        if self.public().to_peer_id() != *peer {
            return Err(SigningError::MissingKey(*peer));
        }
        seal_with(self, codec, payload)
    }
}

fn seal_with(key: &Keypair, codec: &[u8], payload: &[u8]) -> Result<Vec<u8>, SigningError> {
    let envelope = SignedEnvelope::new(
        key,
        SIGNATURE_DOMAIN.to_string(),
        codec.to_vec(),
        payload.to_vec(),
    )?;
    Ok(envelope.into_protobuf_encoding())
}

/// Keypairs indexed by the peer id they derive.
///
/// Used when one process signs for several providers, e.g. an
/// extended-provider advertisement.
#[derive(Clone, Default)]
pub struct Keyring {
    keys: HashMap<PeerId, Keypair>,
}

impl Keyring {
    /// Create an empty keyring.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a keypair, returning the peer id it signs for.
    pub fn insert(&mut self, keypair: Keypair) -> PeerId {
        let peer_id = keypair.public().to_peer_id();
        self.keys.insert(peer_id, keypair);
        peer_id
    }

    /// Builder-style insert.
    pub fn with(mut self, keypair: Keypair) -> Self {
        self.insert(keypair);
        self
    }

    pub fn contains(&self, peer: &PeerId) -> bool {
        self.keys.contains_key(peer)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl FromIterator<Keypair> for Keyring {
    fn from_iter<I: IntoIterator<Item = Keypair>>(iter: I) -> Self {
        let mut ring = Keyring::new();
        for kp in iter {
            ring.insert(kp);
        }
        ring
    }
}

impl EnvelopeSigner for Keyring {
    fn seal(&self, peer: &PeerId, codec: &[u8], payload: &[u8]) -> Result<Vec<u8>, SigningError> {
        let key = self.keys.get(peer).ok_or(SigningError::MissingKey(*peer))?;
        seal_with(key, codec, payload)
    }
}

impl fmt::Debug for Keyring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.keys.keys()).finish()
    }
}
