// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Encryption envelope, key derivation, and vault store for the Lockbox
//! engine.
//!
//! The vault key is derived deterministically from an identity proof (a
//! wallet signature over a fixed message, or a federated subject id), held
//! only in memory, and used to seal the record list into an opaque string
//! envelope stored in the local cache and on the remote ledger.

pub mod crypto;
pub mod envelope;
pub mod kdf;
pub mod password;
pub mod store;

pub use envelope::{ENVELOPE_PREFIX, open_json, seal_json};
pub use kdf::{VaultKey, WALLET_KEY_MESSAGE, key_from_signature, key_from_subject};
pub use password::{PasswordOptions, generate};
pub use store::VaultStore;

/// Fixed-width mask shown in place of a hidden password.
///
/// Deliberately independent of the real length so the display leaks nothing.
pub const MASKED_PASSWORD: &str = "\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}";
