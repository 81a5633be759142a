//! Publisher and provider configuration.

use std::fs;
use std::path::Path;

use ipni_ads_core::{
    Cid, ConfigurationError, GraphsyncMetadata, Keypair, ProtocolKind, Provider,
    MAX_ENTRY_CHUNK_CHAIN_LENGTH, RECOMMENDED_MAX_BLOCK_BYTES,
};
use serde::{Deserialize, Serialize};

use crate::error::{PublishError, Result};

/// Limits applied when splitting entries into chunks and advertisements.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PublisherConfig {
    /// Largest encoded entry chunk, in bytes.
    #[serde(default = "PublisherConfig::default_max_block_bytes")]
    pub max_block_bytes: usize,
    /// Chunks per advertisement before a new advertisement is started.
    #[serde(default = "PublisherConfig::default_max_chain_length")]
    pub max_chain_length: usize,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            max_block_bytes: Self::default_max_block_bytes(),
            max_chain_length: Self::default_max_chain_length(),
        }
    }
}

impl PublisherConfig {
    fn default_max_block_bytes() -> usize {
        RECOMMENDED_MAX_BLOCK_BYTES
    }

    fn default_max_chain_length() -> usize {
        MAX_ENTRY_CHUNK_CHAIN_LENGTH
    }

    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_block_bytes == 0 {
            return Err(PublishError::InvalidConfig(
                "max_block_bytes must be positive".into(),
            ));
        }
        if self.max_chain_length == 0 {
            return Err(PublishError::InvalidConfig(
                "max_chain_length must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Graphsync retrieval hints as written in config files.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GraphsyncMetadataConfig {
    pub piece_cid: String,
    #[serde(default)]
    pub verified_deal: bool,
    #[serde(default)]
    pub fast_retrieval: bool,
}

impl GraphsyncMetadataConfig {
    fn parse(&self) -> std::result::Result<GraphsyncMetadata, ConfigurationError> {
        let piece_cid =
            Cid::try_from(self.piece_cid.as_str()).map_err(|e| ConfigurationError::InvalidCid {
                cid: self.piece_cid.clone(),
                reason: e.to_string(),
            })?;
        Ok(GraphsyncMetadata {
            piece_cid,
            verified_deal: self.verified_deal,
            fast_retrieval: self.fast_retrieval,
        })
    }
}

/// A provider identity with its key material.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    /// Peer id in string form. Must match the key.
    pub id: String,
    /// Hex of the libp2p protobuf encoding of the private key.
    pub private_key: String,
    pub addresses: Vec<String>,
    #[serde(default = "ProviderConfig::default_protocol")]
    pub protocol: ProtocolKind,
    #[serde(default)]
    pub metadata: Option<GraphsyncMetadataConfig>,
}

impl ProviderConfig {
    fn default_protocol() -> ProtocolKind {
        ProtocolKind::Http
    }

    /// Describe an existing keypair.
    pub fn from_keypair(
        keypair: &Keypair,
        addresses: Vec<String>,
        protocol: ProtocolKind,
    ) -> Result<Self> {
        let private_key = keypair
            .to_protobuf_encoding()
            .map_err(|e| ConfigurationError::InvalidKey(e.to_string()))?;
        Ok(Self {
            id: keypair.public().to_peer_id().to_string(),
            private_key: hex::encode(private_key),
            addresses,
            protocol,
            metadata: None,
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode the key, check it derives `id` and build the provider.
    pub fn into_provider(self) -> Result<(Provider, Keypair)> {
        let key_bytes = hex::decode(&self.private_key)
            .map_err(|e| ConfigurationError::InvalidKey(e.to_string()))?;
        let keypair = Keypair::from_protobuf_encoding(&key_bytes)
            .map_err(|e| ConfigurationError::InvalidKey(e.to_string()))?;

        let peer_id = keypair.public().to_peer_id();
        if peer_id.to_string() != self.id {
            return Err(ConfigurationError::PeerIdMismatch {
                expected: self.id,
                actual: peer_id,
            }
            .into());
        }

        let metadata = self
            .metadata
            .as_ref()
            .map(GraphsyncMetadataConfig::parse)
            .transpose()?;
        let provider = Provider::parse(peer_id, &self.addresses, self.protocol.as_str(), metadata)?;

        Ok((provider, keypair))
    }
}
