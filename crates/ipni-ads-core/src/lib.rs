//! # IPNI Ads Core
//!
//! Pure primitives for building IPNI advertisements: providers, entry chunks,
//! advertisements, canonical DAG-CBOR encoding and signing.
//!
//! This crate contains no I/O, no storage, no networking. Signing goes
//! through the [`EnvelopeSigner`] capability supplied by the caller.
//!
//! ## Key Types
//!
//! - [`Provider`] - An endpoint (peer id, addresses, transfer protocol)
//! - [`EntryChunk`] - One page of multihashes with O(1) encoded-size tracking
//! - [`Advertisement`] - A validated, unsigned announcement
//! - [`AdvertisementRecord`] - The signed wire record
//!
//! ## Encoding
//!
//! Blocks are canonical DAG-CBOR. See the [`canonical`] module.

pub mod advertisement;
pub mod canonical;
pub mod crypto;
pub mod entry_chunk;
pub mod error;
pub mod provider;
pub mod types;
pub mod validation;

pub use advertisement::{
    Advertisement, AdvertisementBuilder, AdvertisementOptions, AdvertisementRecord,
    ExtendedProviderRecord, ProviderRecord,
};
pub use canonical::{decode_dag_cbor, encode_dag_cbor};
pub use crypto::{signature_payload, EnvelopeSigner, Keyring};
pub use entry_chunk::{
    calculate_dag_cbor_size, partial_encoding_overhead, EntryChunk, MAX_ENTRY_CHUNK_CHAIN_LENGTH,
    RECOMMENDED_MAX_BLOCK_BYTES,
};
pub use error::{CodecError, ConfigurationError, CoreError, SigningError, ValidationError};
pub use provider::{GraphsyncMetadata, ProtocolKind, Provider, TransferProtocol};
pub use types::{no_entries_cid, Block, EntriesLink};
pub use validation::{validate_advertisement, MAX_CONTEXT_LEN};

pub use cid::Cid;
pub use libp2p_identity::{Keypair, PeerId};
pub use multiaddr::Multiaddr;
