//! Party code storage backends
//!
//! A single table keyed by code. Stores hold no lock of their own; the
//! registry serializes every access.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;
use tracing::{debug, info};

use partycode_core::PartyCode;

/// Keyed store of party codes
pub trait CodeStore: Send {
    /// Whether an entry with `code` exists and has not expired as of `now`
    fn contains_live(&self, code: &str, now: DateTime<Utc>) -> Result<bool, StorageError>;

    /// Insert an entry, replacing any existing entry with the same code
    fn insert(&mut self, entry: &PartyCode) -> Result<(), StorageError>;

    /// Delete every entry that expired strictly before `now`
    fn purge_expired(&mut self, now: DateTime<Utc>) -> Result<usize, StorageError>;

    /// Exact-match lookup, expired or not
    fn get(&self, code: &str) -> Result<Option<PartyCode>, StorageError>;

    /// Number of stored entries, expired ones included
    fn count(&self) -> Result<usize, StorageError>;
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, PartyCode>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CodeStore for MemoryStore {
    fn contains_live(&self, code: &str, now: DateTime<Utc>) -> Result<bool, StorageError> {
        Ok(self
            .entries
            .get(code)
            .is_some_and(|entry| !entry.is_expired(now)))
    }

    fn insert(&mut self, entry: &PartyCode) -> Result<(), StorageError> {
        self.entries.insert(entry.code.clone(), entry.clone());
        Ok(())
    }

    fn purge_expired(&mut self, now: DateTime<Utc>) -> Result<usize, StorageError> {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        Ok(before - self.entries.len())
    }

    fn get(&self, code: &str) -> Result<Option<PartyCode>, StorageError> {
        Ok(self.entries.get(code).cloned())
    }

    fn count(&self) -> Result<usize, StorageError> {
        Ok(self.entries.len())
    }
}

/// SQLite store
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open or create a database file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let store = Self {
            conn: Connection::open(path)?,
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory database
    pub fn in_memory() -> Result<Self, StorageError> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StorageError> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS party_codes (
                code TEXT PRIMARY KEY,
                peer_id TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                expires_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_party_codes_expires_at ON party_codes(expires_at);
            "#,
        )?;

        info!("Storage schema initialized");
        Ok(())
    }
}

impl CodeStore for SqliteStore {
    fn contains_live(&self, code: &str, now: DateTime<Utc>) -> Result<bool, StorageError> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM party_codes WHERE code = ?1 AND expires_at >= ?2)",
            params![code, now.timestamp_micros()],
            |row| row.get(0),
        )?;

        Ok(exists)
    }

    fn insert(&mut self, entry: &PartyCode) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO party_codes (code, peer_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                entry.code,
                entry.peer_id,
                entry.created_at.timestamp_micros(),
                entry.expires_at.timestamp_micros(),
            ],
        )?;

        debug!("Party code stored: {}", entry.code);
        Ok(())
    }

    fn purge_expired(&mut self, now: DateTime<Utc>) -> Result<usize, StorageError> {
        let deleted = self.conn.execute(
            "DELETE FROM party_codes WHERE expires_at < ?1",
            params![now.timestamp_micros()],
        )?;

        Ok(deleted)
    }

    fn get(&self, code: &str) -> Result<Option<PartyCode>, StorageError> {
        let row = self
            .conn
            .query_row(
                "SELECT code, peer_id, created_at, expires_at FROM party_codes WHERE code = ?1",
                params![code],
                |row| {
                    let code: String = row.get(0)?;
                    let peer_id: String = row.get(1)?;
                    let created_at: i64 = row.get(2)?;
                    let expires_at: i64 = row.get(3)?;

                    Ok((code, peer_id, created_at, expires_at))
                },
            )
            .optional()?;

        match row {
            Some((code, peer_id, created_at, expires_at)) => Ok(Some(PartyCode {
                code,
                peer_id,
                created_at: from_micros(created_at)?,
                expires_at: from_micros(expires_at)?,
            })),
            None => Ok(None),
        }
    }

    fn count(&self) -> Result<usize, StorageError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM party_codes", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn from_micros(micros: i64) -> Result<DateTime<Utc>, StorageError> {
    DateTime::from_timestamp_micros(micros).ok_or(StorageError::CorruptTimestamp(micros))
}

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Mutex lock was poisoned (a thread panicked while holding the lock)
    #[error("Lock poisoned: a thread panicked while holding the lock")]
    LockPoisoned,

    #[error("Stored timestamp out of range: {0}")]
    CorruptTimestamp(i64),
}
