// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Lockbox encrypted vault engine.
//!
//! This crate provides the data model (records, vault, identities), the
//! error taxonomy, and the capability traits at the engine's external
//! seams. Backend crates implement the traits; `lockbox-sync` orchestrates
//! them.

pub mod error;
pub mod identity;
pub mod record;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{CryptoError, LockboxError};
pub use identity::{FederatedProfile, Identity, WALLET_NAMESPACE};
pub use record::{Record, Vault, validate_entry};
pub use types::{LoadOutcome, NetworkContext, SyncStatus};

pub use traits::{ChainProvider, LedgerContract, VaultCache, WalletSigner};
