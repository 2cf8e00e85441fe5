// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Synchronization engine for the Lockbox encrypted vault.
//!
//! Ties the vault store, local cache, and remote ledger together: the
//! session state machine authenticates an identity and mounts the right
//! backend combination; the reconciler detects drift via content hashing
//! and runs the write-then-confirm-then-mark commit cycle.

pub mod reconciler;
pub mod restore;
pub mod reveal;
pub mod session;

pub use reconciler::{PullOutcome, StorageBackend, SyncReconciler, content_hash};
pub use restore::{SessionKeeper, SessionSnapshot};
pub use reveal::RevealTimer;
pub use session::{AuthReport, SessionHandle, SessionState, SessionStateMachine};
