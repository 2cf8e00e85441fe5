// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory cache and mock remote backends shared across Lockbox tests.
//!
//! Everything here implements the `lockbox-core` capability traits with
//! deterministic, inspectable behavior: call counters, injectable failures,
//! and a real (deterministic) Ed25519 signer for the wallet path.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use ed25519_dalek::{Signer as _, SigningKey};

use lockbox_core::{ChainProvider, LedgerContract, LockboxError, VaultCache, WalletSigner};

/// Build a JWT-shaped federated token with the given subject claim.
///
/// Only the payload segment matters to the engine; header and signature are
/// filler, as the issuer's verification happens upstream of the core.
pub fn federated_token(subject: &str) -> String {
    let payload = format!(r#"{{"sub":"{subject}","email":"{subject}@x.com","name":"{subject}"}}"#);
    format!(
        "eyJhbGciOiJSUzI1NiJ9.{}.c2lnbmF0dXJl",
        URL_SAFE_NO_PAD.encode(payload.as_bytes())
    )
}

/// In-memory [`VaultCache`] with the same payload/marker split as the
/// SQLite implementation.
#[derive(Default)]
pub struct MemoryCache {
    vaults: Mutex<HashMap<String, String>>,
    markers: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct snapshot of the stored ciphertext, for assertions.
    pub fn vault_snapshot(&self, namespace: &str) -> Option<String> {
        self.vaults.lock().unwrap().get(namespace).cloned()
    }

    /// Direct snapshot of the stored marker, for assertions.
    pub fn marker_snapshot(&self, namespace: &str) -> Option<String> {
        self.markers.lock().unwrap().get(namespace).cloned()
    }
}

#[async_trait]
impl VaultCache for MemoryCache {
    async fn read_vault(&self, namespace: &str) -> Result<Option<String>, LockboxError> {
        Ok(self.vaults.lock().unwrap().get(namespace).cloned())
    }

    async fn write_vault(&self, namespace: &str, ciphertext: &str) -> Result<(), LockboxError> {
        self.vaults
            .lock()
            .unwrap()
            .insert(namespace.to_string(), ciphertext.to_string());
        Ok(())
    }

    async fn clear_vault(&self, namespace: &str) -> Result<(), LockboxError> {
        self.vaults.lock().unwrap().remove(namespace);
        Ok(())
    }

    async fn read_marker(&self, namespace: &str) -> Result<Option<String>, LockboxError> {
        Ok(self.markers.lock().unwrap().get(namespace).cloned())
    }

    async fn write_marker(&self, namespace: &str, content_hash: &str) -> Result<(), LockboxError> {
        self.markers
            .lock()
            .unwrap()
            .insert(namespace.to_string(), content_hash.to_string());
        Ok(())
    }

    async fn clear_marker(&self, namespace: &str) -> Result<(), LockboxError> {
        self.markers.lock().unwrap().remove(namespace);
        Ok(())
    }
}

/// Mock [`LedgerContract`] holding one ciphertext slot.
#[derive(Default)]
pub struct MockLedger {
    stored: Mutex<Option<String>>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
    reads: AtomicUsize,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-load the remote slot, as if a previous session had committed.
    pub fn with_stored(ciphertext: &str) -> Self {
        let ledger = Self::default();
        *ledger.stored.lock().unwrap() = Some(ciphertext.to_string());
        ledger
    }

    /// Make every subsequent write fail as a reverted transaction.
    pub fn fail_next_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn stored(&self) -> Option<String> {
        self.stored.lock().unwrap().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerContract for MockLedger {
    async fn read_vault(&self, _contract: &str, _caller: &str) -> Result<String, LockboxError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.stored.lock().unwrap().clone().unwrap_or_default())
    }

    async fn write_vault(
        &self,
        _contract: &str,
        _caller: &str,
        ciphertext: &str,
    ) -> Result<(), LockboxError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(LockboxError::RemoteTransaction {
                message: "transaction reverted".to_string(),
            });
        }
        *self.stored.lock().unwrap() = Some(ciphertext.to_string());
        Ok(())
    }
}

/// Mock [`ChainProvider`] with a switchable chain id and a call counter,
/// so tests can prove the validator re-reads instead of caching.
pub struct MockChainProvider {
    chain_id: Mutex<Result<u64, String>>,
    calls: AtomicUsize,
}

impl MockChainProvider {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id: Mutex::new(Ok(chain_id)),
            calls: AtomicUsize::new(0),
        }
    }

    /// Simulate the wallet switching networks out-of-band.
    pub fn switch_to(&self, chain_id: u64) {
        *self.chain_id.lock().unwrap() = Ok(chain_id);
    }

    /// Simulate a provider that cannot be reached.
    pub fn go_offline(&self, message: &str) {
        *self.chain_id.lock().unwrap() = Err(message.to_string());
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainProvider for MockChainProvider {
    async fn current_chain_id(&self) -> Result<u64, LockboxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.chain_id
            .lock()
            .unwrap()
            .clone()
            .map_err(LockboxError::Configuration)
    }
}

/// Deterministic Ed25519 signer standing in for an external wallet.
///
/// Ed25519 signatures are deterministic per (key, message), which is
/// exactly the property wallet key derivation depends on.
pub struct DevSigner {
    signing_key: SigningKey,
    address: String,
    decline: AtomicBool,
}

impl DevSigner {
    /// Build a signer from a fixed 32-byte seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(&seed);
        // Derive a stable 0x-style address from the verifying key.
        let public = signing_key.verifying_key().to_bytes();
        let address = format!("0x{}", hex::encode(&public[..20]));
        Self {
            signing_key,
            address,
            decline: AtomicBool::new(false),
        }
    }

    /// Make the next sign request behave as if the user declined.
    pub fn decline_requests(&self, decline: bool) {
        self.decline.store(decline, Ordering::SeqCst);
    }
}

#[async_trait]
impl WalletSigner for DevSigner {
    fn address(&self) -> &str {
        &self.address
    }

    async fn sign_message(&self, message: &str) -> Result<Vec<u8>, LockboxError> {
        if self.decline.load(Ordering::SeqCst) {
            return Err(LockboxError::IdentityProof(
                "signature request declined".to_string(),
            ));
        }
        Ok(self.signing_key.sign(message.as_bytes()).to_bytes().to_vec())
    }
}
