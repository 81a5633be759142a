//! Entry chunks: the blocks that carry an advertisement's multihashes.
//!
//! A chunk is `{Entries: [bytes...], Next?: link}`. Chains of chunks are
//! linked through `Next`, and each chunk has to stay below the block size
//! limit of the transfer protocols, so the encoded size is tracked
//! incrementally as entries are added instead of re-encoding.

use bytes::Bytes;
use cid::Cid;
use ciborium::value::Value;
use multihash::Multihash;

use crate::canonical::length::{tokens_len, Token};
use crate::canonical::{decode_dag_cbor, link_value, map_get, value_to_link, CID_TAG};
use crate::error::CodecError;
use crate::types::Block;

/// Blocks above 1 MiB are not gossiped reliably; transfer protocols accept
/// up to 2 MiB.
pub const RECOMMENDED_MAX_BLOCK_BYTES: usize = 1_048_576;

/// How many `Next` links an indexer is expected to follow.
pub const MAX_ENTRY_CHUNK_CHAIN_LENGTH: usize = 400;

const ENTRIES_KEY: &str = "Entries";
const NEXT_KEY: &str = "Next";

/// An ordered list of multihashes plus an optional link to the next chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryChunk {
    entries: Vec<Bytes>,
    next: Option<Cid>,
    /// Map header, keys and the optional Next link.
    encoding_overhead: usize,
    /// Sum of the byte-string tokens of every entry, without the array header.
    encoded_entries_len: usize,
}

impl Default for EntryChunk {
    fn default() -> Self {
        Self::new()
    }
}

impl EntryChunk {
    /// An empty chunk that ends a chain.
    pub fn new() -> Self {
        Self::from_entries(Vec::new(), None)
    }

    /// An empty chunk linking to `next`.
    pub fn with_next(next: Cid) -> Self {
        Self::from_entries(Vec::new(), Some(next))
    }

    /// A chunk holding `entries`, each the bytes of a multihash.
    pub fn from_entries(entries: Vec<Bytes>, next: Option<Cid>) -> Self {
        let encoded_entries_len = tokens_len(entries.iter().map(|e| Token::Bytes(e.len())));
        Self {
            encoding_overhead: partial_encoding_overhead(next.as_ref()),
            encoded_entries_len,
            entries,
            next,
        }
    }

    pub fn from_multihashes<'a, const S: usize, I>(multihashes: I) -> Self
    where
        I: IntoIterator<Item = &'a Multihash<S>>,
    {
        let entries = multihashes
            .into_iter()
            .map(|mh| Bytes::from(mh.to_bytes()))
            .collect();
        Self::from_entries(entries, None)
    }

    /// A chunk holding the multihash of each CID.
    pub fn from_cids<'a, I>(cids: I) -> Self
    where
        I: IntoIterator<Item = &'a Cid>,
    {
        let entries = cids
            .into_iter()
            .map(|cid| Bytes::from(cid.hash().to_bytes()))
            .collect();
        Self::from_entries(entries, None)
    }

    /// Append one multihash.
    pub fn add(&mut self, entry: impl Into<Bytes>) {
        let entry = entry.into();
        self.encoded_entries_len += Token::Bytes(entry.len()).encoded_len();
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[Bytes] {
        &self.entries
    }

    pub fn next(&self) -> Option<&Cid> {
        self.next.as_ref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact length of the DAG-CBOR encoding of this chunk.
    pub fn calculate_encoded_size(&self) -> usize {
        self.encoding_overhead
            + self.encoded_entries_len
            + Token::Array(self.entries.len()).encoded_len()
    }

    /// Encoded length this chunk would have after adding an entry of
    /// `entry_len` bytes.
    pub fn projected_encoded_size(&self, entry_len: usize) -> usize {
        self.encoding_overhead
            + self.encoded_entries_len
            + Token::Bytes(entry_len).encoded_len()
            + Token::Array(self.entries.len() + 1).encoded_len()
    }

    /// The IPLD shape of this chunk.
    pub fn to_cbor_value(&self) -> Value {
        let entries = self
            .entries
            .iter()
            .map(|e| Value::Bytes(e.to_vec()))
            .collect();
        let mut map = vec![(Value::Text(ENTRIES_KEY.into()), Value::Array(entries))];
        if let Some(next) = &self.next {
            map.push((Value::Text(NEXT_KEY.into()), link_value(next)));
        }
        Value::Map(map)
    }

    /// Encode as a DAG-CBOR block addressed by its sha2-256 CID.
    pub fn export(&self) -> Result<Block, CodecError> {
        Block::encode(&self.to_cbor_value())
    }

    /// Parse an exported chunk.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let Value::Map(map) = decode_dag_cbor(bytes)? else {
            return Err(CodecError::Malformed("entry chunk must be a map".into()));
        };

        let entries = match map_get(&map, ENTRIES_KEY) {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::Bytes(b) => Ok(Bytes::copy_from_slice(b)),
                    _ => Err(CodecError::Malformed("entry must be bytes".into())),
                })
                .collect::<Result<Vec<_>, _>>()?,
            _ => return Err(CodecError::Malformed("missing Entries array".into())),
        };
        let next = map_get(&map, NEXT_KEY).map(value_to_link).transpose()?;

        Ok(Self::from_entries(entries, next))
    }
}

/// Encoded length of a chunk with the given entries, walking every token.
pub fn calculate_dag_cbor_size<E: AsRef<[u8]>>(entries: &[E], next: Option<&Cid>) -> usize {
    let mut tokens = vec![
        Token::Map(if next.is_some() { 2 } else { 1 }),
        Token::text(ENTRIES_KEY),
        Token::Array(entries.len()),
    ];
    tokens.extend(entries.iter().map(|e| Token::Bytes(e.as_ref().len())));
    if let Some(next) = next {
        tokens.push(Token::text(NEXT_KEY));
        tokens.push(Token::Tag(CID_TAG));
        tokens.push(Token::Bytes(next.encoded_len() + 1));
    }
    tokens_len(tokens)
}

/// Fixed cost of a chunk without its entries array.
pub fn partial_encoding_overhead(next: Option<&Cid>) -> usize {
    match next {
        Some(next) => tokens_len([
            Token::Map(2),
            Token::text(NEXT_KEY),
            Token::Tag(CID_TAG),
            // link bytes carry a leading 0x00
            Token::Bytes(next.encoded_len() + 1),
            Token::text(ENTRIES_KEY),
        ]),
        None => tokens_len([Token::Map(1), Token::text(ENTRIES_KEY)]),
    }
}
