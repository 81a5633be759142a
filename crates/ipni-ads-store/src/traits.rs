//! BlockStore trait: the abstract interface for block and chain-head
//! persistence.
//!
//! The publisher writes every entry chunk and signed advertisement through
//! this trait and tracks the latest advertisement per provider as a head.
//! Implementations include SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;
use ipni_ads_core::{Block, Cid, PeerId};

use crate::error::Result;

/// Result of storing a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutResult {
    /// Block was stored.
    Inserted,
    /// A block with this CID already exists (idempotent, not an error).
    AlreadyExists,
}

/// Async interface for block persistence.
///
/// Blocks are content addressed, so storing the same block twice is a no-op
/// that reports `AlreadyExists`.
#[async_trait]
pub trait BlockStore: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Block Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Store a block under its CID.
    async fn put_block(&self, block: &Block) -> Result<PutResult>;

    /// Store several blocks. Backends with transactions write them atomically.
    async fn put_blocks(&self, blocks: &[Block]) -> Result<usize> {
        let mut inserted = 0;
        for block in blocks {
            if self.put_block(block).await? == PutResult::Inserted {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    /// Get a block by CID.
    async fn get_block(&self, cid: &Cid) -> Result<Option<Block>>;

    /// Check if a block exists.
    async fn has_block(&self, cid: &Cid) -> Result<bool>;

    /// Number of stored blocks.
    async fn block_count(&self) -> Result<u64>;

    // ─────────────────────────────────────────────────────────────────────────
    // Head Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// The latest advertisement published by `provider`.
    async fn get_head(&self, provider: &PeerId) -> Result<Option<Cid>>;

    /// Move the head of `provider`'s advertisement chain.
    async fn set_head(&self, provider: &PeerId, head: &Cid) -> Result<()>;
}
