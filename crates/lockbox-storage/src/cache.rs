// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`VaultCache`] trait.
//!
//! Two tables, both keyed by namespace: `vault_cache` for opaque ciphertext
//! payloads and `sync_markers` for the last-synced content hash. Keeping the
//! marker in its own table enforces the ownership split between the vault
//! store (payloads) and the sync reconciler (markers).

use async_trait::async_trait;
use rusqlite::params;
use tracing::debug;

use lockbox_config::StorageConfig;
use lockbox_core::{LockboxError, VaultCache};

use crate::database::{Database, map_tr_err};

/// SQLite-backed local cache.
pub struct SqliteCache {
    db: Database,
}

impl SqliteCache {
    /// Open the cache database described by `config` and run migrations.
    pub async fn open(config: &StorageConfig) -> Result<Self, LockboxError> {
        let db = Database::open(&config.database_path, config.wal_mode).await?;
        Ok(Self { db })
    }

    /// Wrap an already-open database handle.
    pub fn with_database(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    async fn read_column(
        &self,
        table: &'static str,
        column: &'static str,
        namespace: &str,
    ) -> Result<Option<String>, LockboxError> {
        let namespace = namespace.to_string();
        self.db
            .connection()
            .call(move |conn| -> Result<Option<String>, rusqlite::Error> {
                let sql = format!("SELECT {column} FROM {table} WHERE namespace = ?1");
                let mut stmt = conn.prepare(&sql)?;
                match stmt.query_row(params![namespace], |row| row.get(0)) {
                    Ok(value) => Ok(Some(value)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e),
                }
            })
            .await
            .map_err(map_tr_err)
    }

    async fn upsert_column(
        &self,
        table: &'static str,
        column: &'static str,
        namespace: &str,
        value: &str,
    ) -> Result<(), LockboxError> {
        let namespace = namespace.to_string();
        let value = value.to_string();
        self.db
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                let sql = format!(
                    "INSERT INTO {table} (namespace, {column}) VALUES (?1, ?2) \
                     ON CONFLICT(namespace) DO UPDATE SET {column} = excluded.{column}, \
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')"
                );
                conn.execute(&sql, params![namespace, value])?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    async fn delete_row(&self, table: &'static str, namespace: &str) -> Result<(), LockboxError> {
        let namespace = namespace.to_string();
        self.db
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                let sql = format!("DELETE FROM {table} WHERE namespace = ?1");
                conn.execute(&sql, params![namespace])?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

#[async_trait]
impl VaultCache for SqliteCache {
    async fn read_vault(&self, namespace: &str) -> Result<Option<String>, LockboxError> {
        self.read_column("vault_cache", "ciphertext", namespace).await
    }

    async fn write_vault(&self, namespace: &str, ciphertext: &str) -> Result<(), LockboxError> {
        self.upsert_column("vault_cache", "ciphertext", namespace, ciphertext)
            .await?;
        debug!(namespace, "vault ciphertext cached");
        Ok(())
    }

    async fn clear_vault(&self, namespace: &str) -> Result<(), LockboxError> {
        self.delete_row("vault_cache", namespace).await?;
        debug!(namespace, "vault ciphertext cleared");
        Ok(())
    }

    async fn read_marker(&self, namespace: &str) -> Result<Option<String>, LockboxError> {
        self.read_column("sync_markers", "content_hash", namespace)
            .await
    }

    async fn write_marker(&self, namespace: &str, content_hash: &str) -> Result<(), LockboxError> {
        self.upsert_column("sync_markers", "content_hash", namespace, content_hash)
            .await
    }

    async fn clear_marker(&self, namespace: &str) -> Result<(), LockboxError> {
        self.delete_row("sync_markers", namespace).await
    }
}
