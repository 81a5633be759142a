//! SQLite implementation of the BlockStore trait.
//!
//! This is the primary storage backend. It uses rusqlite with bundled
//! SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ipni_ads_core::{Block, Cid, PeerId};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::now_millis;
use crate::traits::{BlockStore, PutResult};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file, and its parent directory, and runs migrations if it
    /// doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut conn = Connection::open(path.as_ref())?;
        migration::migrate(&mut conn)?;
        tracing::debug!(path = %path.as_ref().display(), "opened block store");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Poisoned(e.to_string()))?;
            f(&mut conn)
        })
        .await?
    }
}

fn insert_block(conn: &Connection, cid: &[u8], codec: u64, data: &[u8]) -> Result<PutResult> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO blocks (cid, codec, data, stored_at) VALUES (?1, ?2, ?3, ?4)",
        params![cid, codec as i64, data, now_millis()],
    )?;
    Ok(if changed == 0 {
        PutResult::AlreadyExists
    } else {
        PutResult::Inserted
    })
}

fn parse_cid(bytes: &[u8]) -> Result<Cid> {
    Cid::try_from(bytes).map_err(|e| StoreError::InvalidData(format!("stored cid: {}", e)))
}

#[async_trait]
impl BlockStore for SqliteStore {
    async fn put_block(&self, block: &Block) -> Result<PutResult> {
        let cid = block.cid;
        let data = block.bytes.clone();

        let result = self
            .blocking(move |conn| insert_block(conn, &cid.to_bytes(), cid.codec(), &data))
            .await?;
        tracing::debug!(%cid, ?result, "put block");
        Ok(result)
    }

    async fn put_blocks(&self, blocks: &[Block]) -> Result<usize> {
        let rows: Vec<(Vec<u8>, u64, Vec<u8>)> = blocks
            .iter()
            .map(|b| (b.cid.to_bytes(), b.cid.codec(), b.bytes.clone()))
            .collect();

        let inserted = self
            .blocking(move |conn| {
                let tx = conn.transaction()?;
                let mut inserted = 0;
                for (cid, codec, data) in &rows {
                    if insert_block(&tx, cid, *codec, data)? == PutResult::Inserted {
                        inserted += 1;
                    }
                }
                tx.commit()?;
                Ok(inserted)
            })
            .await?;
        tracing::debug!(total = blocks.len(), inserted, "put blocks");
        Ok(inserted)
    }

    async fn get_block(&self, cid: &Cid) -> Result<Option<Block>> {
        let cid = *cid;
        let data: Option<Vec<u8>> = self
            .blocking(move |conn| {
                conn.query_row(
                    "SELECT data FROM blocks WHERE cid = ?1",
                    params![cid.to_bytes()],
                    |row| row.get(0),
                )
                .optional()
                .map_err(StoreError::from)
            })
            .await?;
        Ok(data.map(|bytes| Block { cid, bytes }))
    }

    async fn has_block(&self, cid: &Cid) -> Result<bool> {
        let cid = cid.to_bytes();
        self.blocking(move |conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM blocks WHERE cid = ?1",
                    params![cid],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
        .await
    }

    async fn block_count(&self) -> Result<u64> {
        self.blocking(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM blocks", [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
    }

    async fn get_head(&self, provider: &PeerId) -> Result<Option<Cid>> {
        let provider = provider.to_bytes();
        let head: Option<Vec<u8>> = self
            .blocking(move |conn| {
                conn.query_row(
                    "SELECT head FROM heads WHERE provider = ?1",
                    params![provider],
                    |row| row.get(0),
                )
                .optional()
                .map_err(StoreError::from)
            })
            .await?;
        head.as_deref().map(parse_cid).transpose()
    }

    async fn set_head(&self, provider: &PeerId, head: &Cid) -> Result<()> {
        let provider_bytes = provider.to_bytes();
        let head_bytes = head.to_bytes();

        self.blocking(move |conn| {
            conn.execute(
                "INSERT INTO heads (provider, head, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(provider) DO UPDATE SET head = excluded.head, updated_at = excluded.updated_at",
                params![provider_bytes, head_bytes, now_millis()],
            )?;
            Ok(())
        })
        .await?;
        tracing::debug!(%provider, %head, "moved head");
        Ok(())
    }
}
