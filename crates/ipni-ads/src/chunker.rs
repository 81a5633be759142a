//! Splitting a stream of multihashes into entry chunk chains.
//!
//! Each chunk is sealed just before the next entry would push it past the
//! block size limit. A newly opened chunk links to the one sealed before it,
//! so the last sealed chunk is the head of the chain. Once a chain reaches
//! the configured length it is handed out and a fresh chain is started; each
//! chain ends up behind its own advertisement.

use bytes::Bytes;
use ipni_ads_core::{Block, Cid, CodecError, EntryChunk};

use crate::config::PublisherConfig;

/// A sealed chain of entry chunks, ready to be stored and advertised.
#[derive(Debug, Clone)]
pub struct ChunkChain {
    /// The chunk the advertisement links to.
    pub head: Cid,
    /// Encoded chunks in the order they were sealed. The last one is `head`.
    pub blocks: Vec<Block>,
    /// Multihashes across all chunks.
    pub entry_count: usize,
}

/// Incremental chunker.
#[derive(Debug)]
pub struct EntryChunker {
    max_block_bytes: usize,
    max_chain_length: usize,
    current: EntryChunk,
    sealed: Vec<Block>,
    entry_count: usize,
}

impl EntryChunker {
    pub fn new(config: &PublisherConfig) -> Self {
        Self {
            max_block_bytes: config.max_block_bytes,
            max_chain_length: config.max_chain_length.max(1),
            current: EntryChunk::new(),
            sealed: Vec::new(),
            entry_count: 0,
        }
    }

    /// Add one multihash. Returns a chain if adding it completed one.
    pub fn push(&mut self, entry: impl Into<Bytes>) -> Result<Option<ChunkChain>, CodecError> {
        let entry = entry.into();
        let mut completed = None;

        // An entry that is too large on its own still gets a chunk to itself.
        if !self.current.is_empty()
            && self.current.projected_encoded_size(entry.len()) > self.max_block_bytes
        {
            completed = self.seal()?;
        }

        self.current.add(entry);
        self.entry_count += 1;
        Ok(completed)
    }

    /// Seal whatever is pending and return the final chain, if any.
    pub fn finish(mut self) -> Result<Option<ChunkChain>, CodecError> {
        if !self.current.is_empty() {
            if let Some(chain) = self.seal()? {
                return Ok(Some(chain));
            }
        }
        Ok(self.take_chain())
    }

    /// Entries added since the last chain was handed out.
    pub fn pending_entries(&self) -> usize {
        self.entry_count
    }

    fn seal(&mut self) -> Result<Option<ChunkChain>, CodecError> {
        let block = self.current.export()?;
        let cid = block.cid;
        self.sealed.push(block);

        if self.sealed.len() >= self.max_chain_length {
            self.current = EntryChunk::new();
            Ok(self.take_chain())
        } else {
            self.current = EntryChunk::with_next(cid);
            Ok(None)
        }
    }

    fn take_chain(&mut self) -> Option<ChunkChain> {
        let head = self.sealed.last()?.cid;
        let blocks = std::mem::take(&mut self.sealed);
        // Entries in the still-open chunk belong to the next chain.
        let entry_count = self.entry_count - self.current.len();
        self.entry_count = self.current.len();
        Some(ChunkChain {
            head,
            blocks,
            entry_count,
        })
    }
}

/// Chunk a whole digest list at once.
pub fn chunk_entries<I, E>(
    config: &PublisherConfig,
    entries: I,
) -> Result<Vec<ChunkChain>, CodecError>
where
    I: IntoIterator<Item = E>,
    E: Into<Bytes>,
{
    let mut chunker = EntryChunker::new(config);
    let mut chains = Vec::new();
    for entry in entries {
        if let Some(chain) = chunker.push(entry)? {
            chains.push(chain);
        }
    }
    chains.extend(chunker.finish()?);
    Ok(chains)
}
