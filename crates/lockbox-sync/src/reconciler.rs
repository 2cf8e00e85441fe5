// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Drift detection and the write-then-confirm-then-mark commit cycle.
//!
//! The reconciler owns the sync marker for the active namespace and nothing
//! else: vault payloads are written only by the vault store. In wallet mode
//! the cache and marker are updated strictly after remote confirmation, so
//! a failed or reverted remote write can never leave the cache claiming a
//! sync state the ledger does not have.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use lockbox_core::{
    LedgerContract, LockboxError, SyncStatus, Vault, VaultCache,
};
use lockbox_ledger::NetworkValidator;
use lockbox_vault::VaultStore;

/// Deterministic content hash over the canonical JSON serialization.
///
/// Used purely for change detection, not integrity: integrity lives in the
/// envelope's AEAD tag.
pub fn content_hash(vault: &Vault) -> String {
    let canonical = serde_json::to_vec(vault).expect("vault is always JSON-serializable");
    hex::encode(Sha256::digest(canonical))
}

/// Which durable stores participate in synchronization.
///
/// Selected once at authentication from the identity mode and held for the
/// session's lifetime; call sites never branch on a mode flag.
pub enum StorageBackend {
    /// Federated sessions: local cache only.
    LocalOnly,
    /// Wallet sessions: local cache plus the remote ledger.
    LocalPlusRemote {
        ledger: Arc<dyn LedgerContract>,
        validator: NetworkValidator,
        /// Wallet address used as the contract caller.
        caller: String,
    },
}

/// What a pull found on the remote ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    /// This session has no remote store (federated mode).
    NotApplicable,
    /// The remote slot is empty or below the plausible-ciphertext length.
    NoRemoteData,
    /// The remote vault decrypted cleanly; carries the record count.
    Fetched(usize),
}

/// Orchestrates drift detection and reconciliation for one namespace.
pub struct SyncReconciler {
    cache: Arc<dyn VaultCache>,
    backend: StorageBackend,
    namespace: String,
    in_flight: Mutex<()>,
}

impl std::fmt::Debug for SyncReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncReconciler")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl SyncReconciler {
    pub fn new(cache: Arc<dyn VaultCache>, backend: StorageBackend, namespace: String) -> Self {
        Self {
            cache,
            backend,
            namespace,
            in_flight: Mutex::new(()),
        }
    }

    pub fn backend(&self) -> &StorageBackend {
        &self.backend
    }

    /// Acquire the single-slot operation guard.
    ///
    /// A second mutating operation while one is awaiting remote
    /// confirmation would allow a lost-update race, so it is rejected
    /// instead of queued.
    fn try_begin(&self) -> Result<MutexGuard<'_, ()>, LockboxError> {
        self.in_flight
            .try_lock()
            .map_err(|_| LockboxError::OperationInFlight)
    }

    /// Compare the vault's content hash against the persisted marker.
    pub async fn status(&self, vault: &Vault) -> Result<SyncStatus, LockboxError> {
        let current = content_hash(vault);
        let marker = self.cache.read_marker(&self.namespace).await?;
        Ok(match marker {
            Some(last) if last == current => SyncStatus::Synced,
            _ => SyncStatus::Pending,
        })
    }

    /// Persist the in-memory vault to every participating store.
    ///
    /// Wallet mode: validate network (fail closed) → derive the contract
    /// address → remote write, blocking until confirmed → only then save
    /// the local cache and move the marker. Federated mode: save and mark
    /// immediately.
    pub async fn commit(&self, store: &mut VaultStore) -> Result<(), LockboxError> {
        let _guard = self.try_begin()?;
        let hash = content_hash(store.vault());

        match &self.backend {
            StorageBackend::LocalOnly => {
                store.save().await?;
                self.cache.write_marker(&self.namespace, &hash).await?;
                debug!(namespace = %self.namespace, "local commit complete");
            }
            StorageBackend::LocalPlusRemote {
                ledger,
                validator,
                caller,
            } => {
                let ctx = validator.validate().await?;
                let address = validator.derive_contract_address(&ctx)?;
                let sealed = store.seal_current()?;
                ledger.write_vault(&address, caller, &sealed).await?;
                // Confirmed: now, and only now, the cache may catch up.
                store.save().await?;
                self.cache.write_marker(&self.namespace, &hash).await?;
                info!(namespace = %self.namespace, records = store.vault().len(), "remote commit confirmed");
            }
        }
        Ok(())
    }

    /// Fetch the remote vault and reconcile it into the local stores.
    ///
    /// A payload below the plausible-ciphertext length is "no remote data
    /// yet", not an error. A payload that exists but cannot be decrypted is
    /// the distinct corrupted-remote-data condition: it surfaces as a
    /// [`LockboxError::Crypto`] and the local cache and marker are left
    /// exactly as they were.
    pub async fn pull(&self, store: &mut VaultStore) -> Result<PullOutcome, LockboxError> {
        let _guard = self.try_begin()?;

        let StorageBackend::LocalPlusRemote {
            ledger,
            validator,
            caller,
        } = &self.backend
        else {
            return Ok(PullOutcome::NotApplicable);
        };

        let ctx = validator.validate().await?;
        let address = validator.derive_contract_address(&ctx)?;
        let payload = ledger.read_vault(&address, caller).await?;

        if !store.is_plausible_ciphertext(&payload) {
            // Nothing durable exists remotely. An empty in-memory vault is
            // vacuously in sync; unsynced local records must stay Pending.
            if store.vault().is_empty() {
                self.cache
                    .write_marker(&self.namespace, &content_hash(store.vault()))
                    .await?;
            }
            debug!(namespace = %self.namespace, "no remote vault data yet");
            return Ok(PullOutcome::NoRemoteData);
        }

        let vault = store.open_remote(&payload).map_err(|e| {
            warn!(namespace = %self.namespace, error = %e, "remote vault is unreadable");
            LockboxError::Crypto(e)
        })?;
        let count = vault.len();
        store.replace(vault);
        store.save().await?;
        self.cache
            .write_marker(&self.namespace, &content_hash(store.vault()))
            .await?;
        info!(namespace = %self.namespace, records = count, "remote vault pulled");
        Ok(PullOutcome::Fetched(count))
    }
}
