// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The vault store: owns the in-memory record list for a session.
//!
//! Reads and writes go through the encryption envelope and the local cache
//! at the identity's namespace. Mutations (`add`, `remove`) touch only the
//! in-memory list; persistence happens exclusively through the sync
//! reconciler so the remote-confirmation ordering holds in wallet mode.

use std::sync::Arc;

use tracing::{debug, warn};

use lockbox_core::{
    CryptoError, Identity, LoadOutcome, LockboxError, Record, Vault, VaultCache, validate_entry,
};

use crate::envelope;
use crate::kdf::VaultKey;

/// In-memory vault bound to a cache namespace and a session key.
pub struct VaultStore {
    cache: Arc<dyn VaultCache>,
    namespace: String,
    key: VaultKey,
    min_ciphertext_len: usize,
    vault: Vault,
}

impl std::fmt::Debug for VaultStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultStore")
            .field("namespace", &self.namespace)
            .field("records", &self.vault.len())
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl VaultStore {
    /// Mount the store for an identity: read the namespace and decrypt.
    ///
    /// The returned [`LoadOutcome`] keeps "no data yet" and "unreadable
    /// cache" apart. On `Unreadable` the in-memory vault starts empty but
    /// nothing is written back, so a corrupted cache is never silently
    /// replaced by an empty one.
    pub async fn mount(
        cache: Arc<dyn VaultCache>,
        identity: &Identity,
        key: VaultKey,
        min_ciphertext_len: usize,
    ) -> Result<(Self, LoadOutcome), LockboxError> {
        let mut store = Self {
            cache,
            namespace: identity.cache_namespace(),
            key,
            min_ciphertext_len,
            vault: Vault::new(),
        };
        let outcome = store.reload().await?;
        Ok((store, outcome))
    }

    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Re-read the cache and replace the in-memory vault when readable.
    pub async fn reload(&mut self) -> Result<LoadOutcome, LockboxError> {
        let cached = self.cache.read_vault(&self.namespace).await?;
        let Some(ciphertext) = cached else {
            self.vault = Vault::new();
            return Ok(LoadOutcome::Empty);
        };

        match envelope::open_json::<Vault>(&ciphertext, &self.key, self.min_ciphertext_len) {
            Ok(vault) => {
                let count = vault.len();
                self.vault = vault;
                debug!(namespace = %self.namespace, records = count, "vault loaded from cache");
                Ok(LoadOutcome::Loaded(count))
            }
            Err(e) if e.is_no_data() => {
                self.vault = Vault::new();
                Ok(LoadOutcome::Empty)
            }
            Err(e) => {
                warn!(namespace = %self.namespace, error = %e, "cached vault is unreadable");
                self.vault = Vault::new();
                Ok(LoadOutcome::Unreadable)
            }
        }
    }

    /// Encrypt the in-memory vault and write it to the cache.
    pub async fn save(&self) -> Result<(), LockboxError> {
        let sealed = self.seal_current()?;
        self.cache.write_vault(&self.namespace, &sealed).await?;
        debug!(namespace = %self.namespace, records = self.vault.len(), "vault saved to cache");
        Ok(())
    }

    /// Encrypt the in-memory vault without writing it anywhere.
    ///
    /// Used by the reconciler to build the remote write payload.
    pub fn seal_current(&self) -> Result<String, LockboxError> {
        Ok(envelope::seal_json(&self.vault, &self.key)?)
    }

    /// Decrypt a remote payload with this session's key.
    pub fn open_remote(&self, ciphertext: &str) -> Result<Vault, CryptoError> {
        envelope::open_json(ciphertext, &self.key, self.min_ciphertext_len)
    }

    /// Whether a remote payload is long enough to plausibly hold data.
    pub fn is_plausible_ciphertext(&self, payload: &str) -> bool {
        payload.len() >= self.min_ciphertext_len
    }

    /// Validate and append a new record in memory. Returns the assigned id.
    pub fn add(&mut self, site: &str, user: &str, pass: &str) -> Result<u64, LockboxError> {
        validate_entry(site, user, pass)?;
        let id = self.vault.next_id();
        self.vault.push(Record {
            id,
            site: site.trim().to_string(),
            user: user.trim().to_string(),
            pass: pass.to_string(),
        })?;
        Ok(id)
    }

    /// Remove a record from memory. Returns whether one was removed.
    pub fn remove(&mut self, id: u64) -> bool {
        self.vault.remove(id)
    }

    /// Replace the in-memory vault (used when a remote pull wins).
    pub fn replace(&mut self, vault: Vault) {
        self.vault = vault;
    }
}
