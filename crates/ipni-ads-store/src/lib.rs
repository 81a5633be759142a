//! # IPNI Ads Store
//!
//! Storage abstraction for advertisement publishing. Provides a trait-based
//! interface for block and chain-head persistence with SQLite and in-memory
//! implementations.
//!
//! ## Overview
//!
//! Entry chunks and signed advertisements are content-addressed blocks. The
//! [`BlockStore`] trait stores them by CID and remembers, per provider, the
//! CID of the latest advertisement so the next one can link to it.
//!
//! ## Key Types
//!
//! - [`BlockStore`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`PutResult`] - Result of storing a block
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ipni_ads_store::{BlockStore, SqliteStore};
//! use ipni_ads_core::EntryChunk;
//!
//! async fn example() -> ipni_ads_store::Result<()> {
//!     let store = SqliteStore::open("ads.db")?;
//!
//!     let block = EntryChunk::new().export().expect("encodable");
//!     store.put_block(&block).await?;
//!     assert!(store.has_block(&block.cid).await?);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{BlockStore, PutResult};

/// Current time in Unix milliseconds.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
