//! SQLite schema versioning.
//!
//! The schema version lives in `PRAGMA user_version`. Each entry of
//! [`MIGRATIONS`] moves the schema one version forward; pending entries are
//! applied in one transaction when a store is opened.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// One forward schema step.
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "blocks and heads",
    sql: r#"
        -- Entry chunks and signed advertisements, keyed by binary CID
        CREATE TABLE blocks (
            cid BLOB PRIMARY KEY,
            codec INTEGER NOT NULL,
            data BLOB NOT NULL,
            stored_at INTEGER NOT NULL
        );
        CREATE INDEX idx_blocks_codec ON blocks(codec);

        -- Latest advertisement per provider peer id
        CREATE TABLE heads (
            provider BLOB PRIMARY KEY,
            head BLOB NOT NULL,
            updated_at INTEGER NOT NULL
        );
    "#,
}];

/// Schema version this build writes.
pub const CURRENT_VERSION: u32 = 1;

/// Version recorded in the database file. Zero for a fresh file.
pub fn schema_version(conn: &Connection) -> Result<u32> {
    Ok(conn.query_row("PRAGMA user_version", [], |row| row.get(0))?)
}

/// Bring the schema up to [`CURRENT_VERSION`]. Safe to call on every open.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    let found = schema_version(conn)?;
    if found > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema version {} is newer than supported version {}",
            found, CURRENT_VERSION
        )));
    }

    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > found).collect();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in pending {
        tx.execute_batch(migration.sql)?;
        tx.pragma_update(None, "user_version", migration.version)?;
        tracing::debug!(
            version = migration.version,
            name = migration.name,
            "applied schema migration"
        );
    }
    tx.commit()?;
    Ok(())
}
