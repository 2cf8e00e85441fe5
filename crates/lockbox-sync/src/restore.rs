// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process session retention for reload-without-resigning.
//!
//! A [`SessionKeeper`] holds at most one snapshot of the authenticated
//! session (identity, validated chain id, derived key) so an embedding UI
//! can remount without asking the user to sign again. It lives strictly in
//! memory, is cleared on logout, and is never consulted by the reconciler:
//! a kept session does not stand in for remote confirmation.

use std::sync::Mutex;

use lockbox_core::Identity;
use lockbox_vault::VaultKey;

/// One kept session.
pub struct SessionSnapshot {
    identity: Identity,
    chain_id: Option<u64>,
    key: VaultKey,
}

impl SessionSnapshot {
    pub fn new(identity: Identity, chain_id: Option<u64>, key: VaultKey) -> Self {
        Self {
            identity,
            chain_id,
            key,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.chain_id
    }

    pub(crate) fn into_parts(self) -> (Identity, Option<u64>, VaultKey) {
        (self.identity, self.chain_id, self.key)
    }
}

impl std::fmt::Debug for SessionSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSnapshot")
            .field("identity", &self.identity)
            .field("chain_id", &self.chain_id)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Single-slot in-memory store for the active session snapshot.
#[derive(Default)]
pub struct SessionKeeper {
    slot: Mutex<Option<SessionSnapshot>>,
}

impl SessionKeeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep a snapshot, replacing any previous one.
    pub fn stash(&self, snapshot: SessionSnapshot) {
        *self.slot.lock().unwrap() = Some(snapshot);
    }

    /// Take the kept snapshot, leaving the keeper empty.
    pub fn resume(&self) -> Option<SessionSnapshot> {
        self.slot.lock().unwrap().take()
    }

    /// Drop any kept snapshot (zeroizes the key on drop).
    pub fn clear(&self) {
        *self.slot.lock().unwrap() = None;
    }

    pub fn is_empty(&self) -> bool {
        self.slot.lock().unwrap().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockbox_vault::key_from_subject;

    fn snapshot(subject: &str) -> SessionSnapshot {
        SessionSnapshot::new(
            Identity::Federated {
                subject_id: subject.to_string(),
            },
            None,
            key_from_subject(subject).unwrap(),
        )
    }

    #[test]
    fn stash_then_resume_hands_the_snapshot_back_once() {
        let keeper = SessionKeeper::new();
        assert!(keeper.is_empty());

        keeper.stash(snapshot("alice"));
        assert!(!keeper.is_empty());

        let resumed = keeper.resume().unwrap();
        assert_eq!(
            resumed.identity(),
            &Identity::Federated {
                subject_id: "alice".to_string()
            }
        );
        // Resume is take-once.
        assert!(keeper.resume().is_none());
    }

    #[test]
    fn stash_replaces_the_previous_snapshot() {
        let keeper = SessionKeeper::new();
        keeper.stash(snapshot("alice"));
        keeper.stash(snapshot("bob"));
        let resumed = keeper.resume().unwrap();
        assert!(matches!(
            resumed.identity(),
            Identity::Federated { subject_id } if subject_id == "bob"
        ));
    }

    #[test]
    fn clear_empties_the_slot() {
        let keeper = SessionKeeper::new();
        keeper.stash(snapshot("alice"));
        keeper.clear();
        assert!(keeper.is_empty());
    }

    #[test]
    fn snapshot_debug_redacts_the_key() {
        let formatted = format!("{:?}", snapshot("alice"));
        assert!(formatted.contains("[REDACTED]"));
    }
}
