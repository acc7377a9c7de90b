//! Key/value persistence for relay state.
//!
//! Preferences are stored as opaque bytes keyed by user ID, mirroring the
//! host platform's plugin KV store. Two backends: an in-process map and a
//! PostgreSQL table.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum KvError {
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<sqlx::Error> for KvError {
    fn from(err: sqlx::Error) -> Self {
        KvError::Storage(err.to_string())
    }
}

/// Byte-oriented key/value storage.
///
/// A single `set` is atomic: readers observe either the previous value or the
/// new one, never a partial write. There is no cross-key coordination.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Get the value for a key. Returns None if the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KvError>;

    /// Insert or overwrite a key.
    async fn set(&self, key: &str, value: &[u8]) -> Result<(), KvError>;
}

/// In-memory store. The lock only covers the map operation itself.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KvError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| KvError::Storage("memory store lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), KvError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| KvError::Storage("memory store lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

/// PostgreSQL-backed store using a single `relay_kv` table.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect and create the table if it does not exist yet.
    pub async fn connect(database_url: &str) -> Result<Self, KvError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS relay_kv (
                key TEXT PRIMARY KEY,
                value BYTEA NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )",
        )
        .execute(&pool)
        .await?;

        info!("Connected to PostgreSQL key/value store");

        Ok(Self { pool })
    }
}

#[async_trait]
impl KvStore for PostgresStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KvError> {
        let value: Option<Vec<u8>> =
            sqlx::query_scalar("SELECT value FROM relay_kv WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), KvError> {
        sqlx::query(
            "INSERT INTO relay_kv (key, value, updated_at) VALUES ($1, $2, $3)
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = EXCLUDED.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// PostgreSQL when a URL is configured, otherwise a fresh in-memory store.
pub async fn open_store(database_url: Option<&str>) -> Result<Arc<dyn KvStore>, KvError> {
    match database_url {
        Some(url) => Ok(Arc::new(PostgresStore::connect(url).await?)),
        None => {
            warn!("DATABASE_URL not set, preferences will not survive a restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
