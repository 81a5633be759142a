//! In-memory implementation of the BlockStore trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use ipni_ads_core::{Block, Cid, PeerId};

use crate::error::{Result, StoreError};
use crate::traits::{BlockStore, PutResult};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Block bytes indexed by CID.
    blocks: HashMap<Cid, Vec<u8>>,

    /// Latest advertisement per provider.
    heads: HashMap<PeerId, Cid>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

#[async_trait]
impl BlockStore for MemoryStore {
    async fn put_block(&self, block: &Block) -> Result<PutResult> {
        let mut inner = self.write()?;

        if inner.blocks.contains_key(&block.cid) {
            return Ok(PutResult::AlreadyExists);
        }
        inner.blocks.insert(block.cid, block.bytes.clone());

        Ok(PutResult::Inserted)
    }

    async fn get_block(&self, cid: &Cid) -> Result<Option<Block>> {
        let inner = self.read()?;
        Ok(inner.blocks.get(cid).map(|bytes| Block {
            cid: *cid,
            bytes: bytes.clone(),
        }))
    }

    async fn has_block(&self, cid: &Cid) -> Result<bool> {
        Ok(self.read()?.blocks.contains_key(cid))
    }

    async fn block_count(&self) -> Result<u64> {
        Ok(self.read()?.blocks.len() as u64)
    }

    async fn get_head(&self, provider: &PeerId) -> Result<Option<Cid>> {
        Ok(self.read()?.heads.get(provider).copied())
    }

    async fn set_head(&self, provider: &PeerId, head: &Cid) -> Result<()> {
        self.write()?.heads.insert(*provider, *head);
        Ok(())
    }
}
