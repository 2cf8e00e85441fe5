// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capability traits at the engine's external seams.
//!
//! Implementations live in the backend crates (`lockbox-storage`,
//! `lockbox-ledger`) or are supplied by the embedding application
//! (wallet signing).

pub mod cache;
pub mod chain;
pub mod ledger;
pub mod signer;

pub use cache::VaultCache;
pub use chain::ChainProvider;
pub use ledger::LedgerContract;
pub use signer::WalletSigner;
