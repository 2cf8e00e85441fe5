// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic key derivation from identity proofs.
//!
//! Both derivations are SHA-256 one-way hashes: the key is reproducible from
//! the same proof on every authentication, so it never needs to be stored
//! anywhere. The wallet path hashes a signature over a fixed message; the
//! federated path hashes a fixed context string plus the stable subject id.

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use lockbox_core::LockboxError;

/// The fixed message a wallet signs to derive its vault key.
///
/// This string is version-stable: changing it changes every derived key and
/// orphans all previously encrypted vaults.
pub const WALLET_KEY_MESSAGE: &str =
    "Unlock your secure vault: sign this message to derive your private encryption key.";

/// Domain-separation context for federated key derivation.
const FEDERATED_KEY_CONTEXT: &str = "lockbox/federated-key/v1:";

/// A 256-bit symmetric vault key, zeroed on drop.
#[derive(Clone)]
pub struct VaultKey(Zeroizing<[u8; 32]>);

impl VaultKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    pub fn bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("VaultKey").field(&"[REDACTED]").finish()
    }
}

impl PartialEq for VaultKey {
    fn eq(&self, other: &Self) -> bool {
        *self.0 == *other.0
    }
}

impl Eq for VaultKey {}

/// Derive the vault key from a wallet signature over [`WALLET_KEY_MESSAGE`].
///
/// Deterministic and side-effect-free: the same signature always yields the
/// same key. An empty signature means the signing step did not actually
/// happen and is rejected as an identity-proof failure.
pub fn key_from_signature(signature: &[u8]) -> Result<VaultKey, LockboxError> {
    if signature.is_empty() {
        return Err(LockboxError::IdentityProof(
            "empty signature from signing provider".to_string(),
        ));
    }
    Ok(VaultKey::from_bytes(Sha256::digest(signature).into()))
}

/// Derive the vault key for a federated subject.
///
/// No signing step is needed: the token issuer already authenticated the
/// subject. The fixed context prefix keeps these keys distinct from a bare
/// hash of the subject id.
pub fn key_from_subject(subject_id: &str) -> Result<VaultKey, LockboxError> {
    if subject_id.is_empty() {
        return Err(LockboxError::IdentityProof(
            "empty federated subject id".to_string(),
        ));
    }
    let mut hasher = Sha256::new();
    hasher.update(FEDERATED_KEY_CONTEXT.as_bytes());
    hasher.update(subject_id.as_bytes());
    Ok(VaultKey::from_bytes(hasher.finalize().into()))
}
