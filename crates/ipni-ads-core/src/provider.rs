//! Providers: where and how advertised content can be fetched.
//!
//! A provider is one network endpoint (peer id + multiaddrs) reachable over
//! one transfer protocol. Its protocol determines the metadata bytes
//! advertised alongside it.

use std::fmt;
use std::str::FromStr;

use cid::Cid;
use ciborium::value::Value;
use libp2p_identity::PeerId;
use multiaddr::Multiaddr;
use serde::{Deserialize, Serialize};

use crate::advertisement::Advertisement;
use crate::canonical::{encode_dag_cbor, link_value};
use crate::error::{CodecError, ConfigurationError, CoreError, ValidationError};

/// Multicodec tag for HTTP retrieval metadata.
pub const HTTP_PROTOCOL_ID: u64 = 0x3D_0000;

/// Multicodec tag for Bitswap retrieval metadata.
pub const BITSWAP_PROTOCOL_ID: u64 = 0x0900;

/// Multicodec tag for Graphsync (filecoin-v1) retrieval metadata.
pub const GRAPHSYNC_PROTOCOL_ID: u64 = 0x0910;

/// Varint-encode a protocol tag.
pub fn protocol_prefix(code: u64) -> Vec<u8> {
    let mut buf = unsigned_varint::encode::u64_buffer();
    unsigned_varint::encode::u64(code, &mut buf).to_vec()
}

/// Retrieval hints for Graphsync deals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphsyncMetadata {
    pub piece_cid: Cid,
    pub verified_deal: bool,
    pub fast_retrieval: bool,
}

impl GraphsyncMetadata {
    fn to_cbor_value(&self) -> Value {
        Value::Map(vec![
            (Value::Text("PieceCID".into()), link_value(&self.piece_cid)),
            (Value::Text("VerifiedDeal".into()), Value::Bool(self.verified_deal)),
            (Value::Text("FastRetrieval".into()), Value::Bool(self.fast_retrieval)),
        ])
    }
}

/// Protocol name without payload, as found in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolKind {
    Http,
    Bitswap,
    Graphsync,
}

impl ProtocolKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProtocolKind::Http => "http",
            ProtocolKind::Bitswap => "bitswap",
            ProtocolKind::Graphsync => "graphsync",
        }
    }

    /// The multicodec tag for this protocol.
    pub fn code(self) -> u64 {
        match self {
            ProtocolKind::Http => HTTP_PROTOCOL_ID,
            ProtocolKind::Bitswap => BITSWAP_PROTOCOL_ID,
            ProtocolKind::Graphsync => GRAPHSYNC_PROTOCOL_ID,
        }
    }

    /// Look up a protocol by its multicodec tag.
    pub fn from_code(code: u64) -> Result<Self, ConfigurationError> {
        match code {
            HTTP_PROTOCOL_ID => Ok(ProtocolKind::Http),
            BITSWAP_PROTOCOL_ID => Ok(ProtocolKind::Bitswap),
            GRAPHSYNC_PROTOCOL_ID => Ok(ProtocolKind::Graphsync),
            other => Err(ConfigurationError::UnknownProtocol(format!("{:#x}", other))),
        }
    }
}

impl fmt::Display for ProtocolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProtocolKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(ProtocolKind::Http),
            "bitswap" => Ok(ProtocolKind::Bitswap),
            "graphsync" => Ok(ProtocolKind::Graphsync),
            other => Err(ConfigurationError::UnknownProtocol(other.to_string())),
        }
    }
}

/// A transfer protocol together with the payload it requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferProtocol {
    Http,
    Bitswap,
    Graphsync(GraphsyncMetadata),
}

impl TransferProtocol {
    /// Pair a protocol name with optional metadata.
    ///
    /// Graphsync fails without metadata; the other protocols carry none and
    /// ignore it.
    pub fn from_kind(
        kind: ProtocolKind,
        metadata: Option<GraphsyncMetadata>,
    ) -> Result<Self, ConfigurationError> {
        match kind {
            ProtocolKind::Http => Ok(TransferProtocol::Http),
            ProtocolKind::Bitswap => Ok(TransferProtocol::Bitswap),
            ProtocolKind::Graphsync => metadata
                .map(TransferProtocol::Graphsync)
                .ok_or(ConfigurationError::MissingMetadata(ProtocolKind::Graphsync)),
        }
    }

    pub fn kind(&self) -> ProtocolKind {
        match self {
            TransferProtocol::Http => ProtocolKind::Http,
            TransferProtocol::Bitswap => ProtocolKind::Bitswap,
            TransferProtocol::Graphsync(_) => ProtocolKind::Graphsync,
        }
    }

    /// Varint protocol tag, followed by the DAG-CBOR payload for Graphsync.
    pub fn encode_metadata(&self) -> Result<Vec<u8>, CodecError> {
        let mut out = protocol_prefix(self.kind().code());
        if let TransferProtocol::Graphsync(meta) = self {
            out.extend_from_slice(&encode_dag_cbor(&meta.to_cbor_value())?);
        }
        Ok(out)
    }
}

/// One endpoint that can serve advertised content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provider {
    peer_id: PeerId,
    addresses: Vec<Multiaddr>,
    protocol: TransferProtocol,
    /// Encoded once at construction; providers are immutable.
    metadata: Vec<u8>,
}

impl Provider {
    /// Create a provider. Addresses must not be empty.
    pub fn new(
        peer_id: PeerId,
        addresses: Vec<Multiaddr>,
        protocol: TransferProtocol,
    ) -> Result<Self, CoreError> {
        if addresses.is_empty() {
            return Err(ValidationError::NoAddresses(peer_id).into());
        }
        let metadata = protocol.encode_metadata()?;
        Ok(Self {
            peer_id,
            addresses,
            protocol,
            metadata,
        })
    }

    /// Create a provider from string addresses and a protocol name.
    pub fn parse<S: AsRef<str>>(
        peer_id: PeerId,
        addresses: &[S],
        protocol: &str,
        metadata: Option<GraphsyncMetadata>,
    ) -> Result<Self, CoreError> {
        let addresses = addresses
            .iter()
            .map(|a| parse_multiaddr(a.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        let protocol = TransferProtocol::from_kind(protocol.parse()?, metadata)?;
        Self::new(peer_id, addresses, protocol)
    }

    /// HTTP provider.
    pub fn http(peer_id: PeerId, addresses: Vec<Multiaddr>) -> Result<Self, CoreError> {
        Self::new(peer_id, addresses, TransferProtocol::Http)
    }

    /// Bitswap provider.
    pub fn bitswap(peer_id: PeerId, addresses: Vec<Multiaddr>) -> Result<Self, CoreError> {
        Self::new(peer_id, addresses, TransferProtocol::Bitswap)
    }

    /// Graphsync provider.
    pub fn graphsync(
        peer_id: PeerId,
        addresses: Vec<Multiaddr>,
        metadata: GraphsyncMetadata,
    ) -> Result<Self, CoreError> {
        Self::new(peer_id, addresses, TransferProtocol::Graphsync(metadata))
    }

    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    pub fn addresses(&self) -> &[Multiaddr] {
        &self.addresses
    }

    pub fn protocol(&self) -> &TransferProtocol {
        &self.protocol
    }

    /// The metadata bytes advertised for this provider.
    pub fn encode_metadata(&self) -> &[u8] {
        &self.metadata
    }

    /// Identity in string form, as it appears on the wire.
    pub fn id_string(&self) -> String {
        self.peer_id.to_string()
    }

    /// Addresses in string form, as they appear on the wire.
    pub fn address_strings(&self) -> Vec<String> {
        self.addresses.iter().map(ToString::to_string).collect()
    }

    /// Addresses concatenated without separator, as signed.
    pub(crate) fn joined_addresses(&self) -> String {
        self.addresses.iter().map(ToString::to_string).collect()
    }

    /// Bytes this provider signs to join `ad` as an extended provider.
    ///
    /// Order: previous link, entries link, root provider id, context id,
    /// this provider's id, its joined addresses, its metadata, override flag.
    /// Identities and addresses are signed in string form.
    pub fn signable_bytes(&self, ad: &Advertisement) -> Vec<u8> {
        let mut buf = Vec::new();
        if let Some(prev) = ad.previous() {
            buf.extend_from_slice(&prev.to_bytes());
        }
        buf.extend_from_slice(&ad.entries().to_bytes());
        buf.extend_from_slice(ad.root().id_string().as_bytes());
        buf.extend_from_slice(ad.context());
        buf.extend_from_slice(self.id_string().as_bytes());
        buf.extend_from_slice(self.joined_addresses().as_bytes());
        buf.extend_from_slice(&self.metadata);
        buf.push(u8::from(ad.is_override()));
        buf
    }
}

pub(crate) fn parse_multiaddr(addr: &str) -> Result<Multiaddr, ConfigurationError> {
    addr.parse().map_err(|e: multiaddr::Error| ConfigurationError::InvalidAddress {
        addr: addr.to_string(),
        reason: e.to_string(),
    })
}
