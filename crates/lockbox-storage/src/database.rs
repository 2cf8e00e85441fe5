// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes.

use lockbox_core::LockboxError;
use tracing::debug;

use crate::migrations;

/// Handle to the cache database.
///
/// Cloning is cheap; all clones share the single background connection.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path`, apply PRAGMAs, and run
    /// pending migrations.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, LockboxError> {
        let conn = tokio_rusqlite::Connection::open(path.to_string())
            .await
            .map_err(|e| LockboxError::Storage {
                source: Box::new(e),
            })?;

        conn.call(move |conn| -> Result<(), rusqlite::Error> {
            if wal_mode {
                conn.pragma_update(None, "journal_mode", "WAL")?;
            }
            conn.pragma_update(None, "synchronous", "NORMAL")?;
            conn.pragma_update(None, "foreign_keys", "ON")?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        conn.call(|conn| -> Result<(), LockboxMigrationError> {
            migrations::run_migrations(conn).map_err(LockboxMigrationError)
        })
        .await
        .map_err(|e| match e {
            tokio_rusqlite::Error::Error(LockboxMigrationError(inner)) => inner,
            other => LockboxError::Storage {
                source: Box::new(other),
            },
        })?;

        debug!(path, wal_mode, "cache database opened");
        Ok(Self { conn })
    }

    /// Returns the shared background connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and flush pending writes.
    pub async fn close(&self) -> Result<(), LockboxError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

/// Newtype so migration failures can travel through tokio-rusqlite's
/// generic error channel.
#[derive(Debug)]
struct LockboxMigrationError(LockboxError);

impl std::fmt::Display for LockboxMigrationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for LockboxMigrationError {}

/// Convert tokio-rusqlite errors to `LockboxError::Storage`.
pub(crate) fn map_tr_err<E>(e: tokio_rusqlite::Error<E>) -> LockboxError
where
    E: std::error::Error + Send + Sync + 'static,
{
    LockboxError::Storage {
        source: Box::new(e),
    }
}
