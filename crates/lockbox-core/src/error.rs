// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Lockbox vault engine.

use thiserror::Error;

/// The primary error type used across all Lockbox components.
///
/// Every variant is caught at the operation boundary and converted into a
/// user-visible status message; none may leave the in-memory vault or the
/// persisted cache claiming a sync state the durable store does not have.
#[derive(Debug, Error)]
pub enum LockboxError {
    /// A record field failed validation. Recovered locally, never reaches storage.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// The wallet is connected to an unsupported network.
    ///
    /// Blocks all remote operations until the user switches networks.
    #[error("wrong network: connected to chain {actual}, expected {expected_name} (chain {expected})")]
    NetworkMismatch {
        actual: u64,
        expected: u64,
        expected_name: String,
    },

    /// Unresolved or malformed configuration (contract address, network table).
    ///
    /// Fatal to the current operation; not recoverable without a config fix.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Encryption or decryption failure, with the specific kind preserved.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// A remote write was submitted but failed or reverted.
    ///
    /// The local cache and sync marker must remain at their pre-commit values.
    #[error("remote transaction failed: {message}")]
    RemoteTransaction { message: String },

    /// Signature declined, provider unavailable, or token invalid.
    ///
    /// Returns the session to `Unauthenticated`.
    #[error("identity proof rejected: {0}")]
    IdentityProof(String),

    /// Local cache errors (database connection, query failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// JSON-RPC transport or provider failure (endpoint unreachable,
    /// malformed response, provider-side error object).
    #[error("rpc error: {message}")]
    Rpc { message: String },

    /// A second commit or pull was attempted while one is awaiting remote
    /// confirmation. The single-slot guard rejects it to prevent lost updates.
    #[error("another vault operation is already in flight")]
    OperationInFlight,

    /// A bounded wait (signature request, confirmation polling) expired.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// The kind of encryption-envelope failure.
///
/// Callers must distinguish [`CryptoError::TooShort`] (benign: no data has
/// ever been written) from the remaining kinds, which mean existing data is
/// unreadable and must not be overwritten with an empty vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Input is empty or below the minimum plausible ciphertext length.
    #[error("ciphertext missing or below the minimum plausible length")]
    TooShort,

    /// Envelope framing is broken: bad prefix, undecodable base64, or too
    /// few bytes to hold a nonce and tag.
    #[error("ciphertext envelope is malformed")]
    Malformed,

    /// Authenticated decryption failed: wrong key or tampered data.
    #[error("decryption failed: wrong key or corrupted data")]
    Unreadable,

    /// Decrypted bytes were not valid UTF-8, were empty, or failed payload parsing.
    #[error("decrypted payload could not be decoded")]
    Decode,

    /// The encryption side failed (key setup or nonce generation).
    #[error("encryption failed")]
    Seal,
}

impl CryptoError {
    /// True when the failure means "no data has ever been stored here",
    /// as opposed to "existing data is unreadable".
    pub fn is_no_data(&self) -> bool {
        matches!(self, CryptoError::TooShort)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_short_is_the_only_benign_kind() {
        assert!(CryptoError::TooShort.is_no_data());
        for kind in [
            CryptoError::Malformed,
            CryptoError::Unreadable,
            CryptoError::Decode,
            CryptoError::Seal,
        ] {
            assert!(!kind.is_no_data(), "{kind:?} must not read as benign");
        }
    }

    #[test]
    fn network_mismatch_names_the_expected_network() {
        let err = LockboxError::NetworkMismatch {
            actual: 1,
            expected: 11155111,
            expected_name: "Sepolia Testnet".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Sepolia Testnet"));
        assert!(msg.contains("11155111"));
        assert!(msg.contains("chain 1"));
    }

    #[test]
    fn crypto_error_converts_into_lockbox_error() {
        let err: LockboxError = CryptoError::Unreadable.into();
        assert!(matches!(
            err,
            LockboxError::Crypto(CryptoError::Unreadable)
        ));
    }
}
