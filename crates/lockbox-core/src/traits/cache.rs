// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local persistent cache trait.

use async_trait::async_trait;

use crate::error::LockboxError;

/// Key-value store for encrypted vault payloads, keyed by namespace.
///
/// Values are opaque ciphertext strings. The sync marker is stored
/// separately per namespace: only the vault store may write vault payloads,
/// and only the reconciler may write markers.
#[async_trait]
pub trait VaultCache: Send + Sync {
    /// Read the cached ciphertext for a namespace, if any.
    async fn read_vault(&self, namespace: &str) -> Result<Option<String>, LockboxError>;

    /// Write (or replace) the cached ciphertext for a namespace.
    async fn write_vault(&self, namespace: &str, ciphertext: &str) -> Result<(), LockboxError>;

    /// Remove the cached ciphertext for a namespace.
    async fn clear_vault(&self, namespace: &str) -> Result<(), LockboxError>;

    /// Read the last-synced content hash for a namespace, if any.
    async fn read_marker(&self, namespace: &str) -> Result<Option<String>, LockboxError>;

    /// Persist the last-synced content hash for a namespace.
    async fn write_marker(&self, namespace: &str, content_hash: &str) -> Result<(), LockboxError>;

    /// Remove the last-synced content hash for a namespace.
    async fn clear_marker(&self, namespace: &str) -> Result<(), LockboxError>;
}
