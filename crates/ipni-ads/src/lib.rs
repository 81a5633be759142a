//! # IPNI Ads
//!
//! Build, sign and publish IPNI advertisement chains.
//!
//! ## Overview
//!
//! An IPNI provider tells indexers which multihashes it serves by publishing
//! a chain of signed advertisements. Each advertisement links to the
//! previous one and to a chain of entry chunks holding the multihashes.
//!
//! - **Entry chunks**: Pages of multihashes, each kept under a block size limit
//! - **Advertisements**: Signed records linking a provider to entry chunks
//! - **Extended providers**: Extra endpoints co-signing a provider's content
//! - **Removal**: Advertisements withdrawing content under a context id
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ipni_ads::{Publisher, PublisherConfig};
//! use ipni_ads::core::{Keypair, Provider};
//! use ipni_ads::store::SqliteStore;
//!
//! async fn example() -> ipni_ads::Result<()> {
//!     let keypair = Keypair::generate_ed25519();
//!     let provider = Provider::parse(
//!         keypair.public().to_peer_id(),
//!         &["/dns4/example.org/tcp/443/https"],
//!         "http",
//!         None,
//!     )?;
//!
//!     let store = SqliteStore::open("ads.db")?;
//!     let publisher = Publisher::new(provider, keypair, store, PublisherConfig::default());
//!
//!     let multihashes: Vec<Vec<u8>> = Vec::new(); // load from a CAR index
//!     let ads = publisher.publish(b"my-context", multihashes).await?;
//!     println!("published {} advertisements", ads.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `ipni_ads::core` - Providers, entry chunks, advertisements, signing
//! - `ipni_ads::store` - Block storage and SQLite

pub mod chunker;
pub mod config;
pub mod error;
pub mod publisher;

// Re-export component crates
pub use ipni_ads_core as core;
pub use ipni_ads_store as store;

pub use chunker::{chunk_entries, ChunkChain, EntryChunker};
pub use config::{GraphsyncMetadataConfig, ProviderConfig, PublisherConfig};
pub use error::{PublishError, Result};
pub use publisher::{ExtendedScope, Publisher};

// Re-export commonly used core types
pub use ipni_ads_core::{
    Advertisement, AdvertisementBuilder, AdvertisementRecord, Cid, EntriesLink, EntryChunk,
    EnvelopeSigner, Keypair, Keyring, PeerId, Provider, TransferProtocol,
};
