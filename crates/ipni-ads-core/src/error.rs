//! Error types for the advertisement core.

use libp2p_identity::PeerId;
use thiserror::Error;

use crate::provider::ProtocolKind;

/// Construction-time invariant violations.
///
/// These are never retried: the caller must fix its inputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("advertisement requires at least one provider")]
    NoProviders,

    #[error("provider {0} has no addresses")]
    NoAddresses(PeerId),

    #[error("context id is {len} bytes, maximum is {max}")]
    ContextTooLong { len: usize, max: usize },

    #[error("remove is not supported with extended providers ({count} providers given)")]
    RemoveWithExtendedProviders { count: usize },

    #[error("override requires a non-empty context id")]
    OverrideWithoutContext,

    #[error("override requires extended providers ({count} providers given)")]
    OverrideWithoutExtendedProviders { count: usize },

    #[error("extended provider advertisement needs at least 2 providers, got {count}")]
    NotEnoughProviders { count: usize },
}

/// Missing or unrecognised provider configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("unknown protocol {0:?}, must be one of http, bitswap, graphsync")]
    UnknownProtocol(String),

    #[error("{0} metadata is required")]
    MissingMetadata(ProtocolKind),

    #[error("invalid multiaddr {addr:?}: {reason}")]
    InvalidAddress { addr: String, reason: String },

    #[error("invalid cid {cid:?}: {reason}")]
    InvalidCid { cid: String, reason: String },

    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("peer id mismatch: configured {expected}, key derives {actual}")]
    PeerIdMismatch { expected: String, actual: PeerId },
}

/// Failures from the signing capability, surfaced to the caller as-is.
#[derive(Debug, Error)]
pub enum SigningError {
    #[error("no signing key for peer {0}")]
    MissingKey(PeerId),

    #[error("failed to seal envelope: {0}")]
    Envelope(#[from] libp2p_identity::SigningError),
}

/// DAG-CBOR encoding and decoding failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("unsupported value in canonical encoding: {0}")]
    UnsupportedValue(&'static str),

    #[error("multihash error: {0}")]
    Multihash(String),

    #[error("malformed block: {0}")]
    Malformed(String),
}

/// Any failure from the core.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("signing error: {0}")]
    Signing(#[from] SigningError),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
