// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end session flows over in-memory backends.

use std::sync::Arc;

use lockbox_config::LockboxConfig;
use lockbox_core::{Identity, LoadOutcome, LockboxError, SyncStatus};
use lockbox_sync::{PullOutcome, SessionKeeper, SessionState, SessionStateMachine};
use lockbox_test_utils::{DevSigner, MemoryCache, MockChainProvider, MockLedger, federated_token};

fn config() -> LockboxConfig {
    LockboxConfig::default()
}

#[tokio::test]
async fn federated_add_then_reload_reports_synced() {
    let cache = Arc::new(MemoryCache::new());
    let mut machine = SessionStateMachine::new(cache.clone(), config());

    let (mut handle, profile, report) = machine
        .sign_in_federated(&federated_token("subject-1"))
        .await
        .unwrap();
    assert_eq!(report.load, LoadOutcome::Empty);
    assert_eq!(profile.email, "subject-1@x.com");

    handle.add_record("Example", "a@x.com", "abcd").await.unwrap();
    assert_eq!(handle.status().await.unwrap(), SyncStatus::Synced);

    // A fresh session sees exactly the one record, still synced.
    drop(handle);
    let mut machine2 = SessionStateMachine::new(cache, config());
    let (handle2, _, report2) = machine2
        .sign_in_federated(&federated_token("subject-1"))
        .await
        .unwrap();
    assert_eq!(report2.load, LoadOutcome::Loaded(1));
    let records = handle2.vault().records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].site, "Example");
    assert_eq!(records[0].user, "a@x.com");
    assert_eq!(records[0].pass, "abcd");
    assert_eq!(handle2.status().await.unwrap(), SyncStatus::Synced);
}

#[tokio::test]
async fn wallet_vault_round_trips_through_the_ledger() {
    let ledger = Arc::new(MockLedger::new());
    let provider = Arc::new(MockChainProvider::new(11155111));
    let signer = Arc::new(DevSigner::from_seed([3u8; 32]));

    // First session: connect, add two records, delete one.
    let cache = Arc::new(MemoryCache::new());
    let mut machine = SessionStateMachine::new(cache, config());
    let (mut handle, _) = machine
        .connect_wallet(signer.clone(), provider.clone(), ledger.clone())
        .await
        .unwrap();
    let first = handle.add_record("One", "a@x.com", "abcd").await.unwrap();
    handle.add_record("Two", "b@x.com", "efgh").await.unwrap();
    assert!(handle.remove_record(first).await.unwrap());
    assert_eq!(handle.status().await.unwrap(), SyncStatus::Synced);
    assert_eq!(ledger.write_count(), 3);

    // Second session on a different device (fresh cache), same wallet:
    // the pull during authentication restores the surviving record.
    let other_device = Arc::new(MemoryCache::new());
    let mut machine2 = SessionStateMachine::new(other_device, config());
    let (handle2, report) = machine2
        .connect_wallet(signer, provider, ledger)
        .await
        .unwrap();
    assert!(matches!(report.pull, Some(Ok(PullOutcome::Fetched(1)))));
    assert_eq!(handle2.vault().records()[0].site, "Two");
    assert_eq!(handle2.status().await.unwrap(), SyncStatus::Synced);
}

#[tokio::test]
async fn a_different_wallet_cannot_read_the_stored_vault() {
    let ledger = Arc::new(MockLedger::new());
    let provider = Arc::new(MockChainProvider::new(11155111));

    let cache = Arc::new(MemoryCache::new());
    let mut machine = SessionStateMachine::new(cache, config());
    let (mut handle, _) = machine
        .connect_wallet(
            Arc::new(DevSigner::from_seed([3u8; 32])),
            provider.clone(),
            ledger.clone(),
        )
        .await
        .unwrap();
    handle.add_record("Example", "a@x.com", "abcd").await.unwrap();
    drop(handle);

    // Another wallet signs a different signature, so its key cannot open
    // the stored ciphertext: authentication still succeeds, but the pull
    // reports corrupted remote data and nothing is cached locally.
    let intruder_cache = Arc::new(MemoryCache::new());
    let mut machine2 = SessionStateMachine::new(intruder_cache.clone(), config());
    let (_handle2, report) = machine2
        .connect_wallet(Arc::new(DevSigner::from_seed([4u8; 32])), provider, ledger)
        .await
        .unwrap();
    assert!(matches!(
        report.pull,
        Some(Err(LockboxError::Crypto(e))) if !e.is_no_data()
    ));
    assert!(intruder_cache.vault_snapshot("default").is_none());
    assert!(intruder_cache.marker_snapshot("default").is_none());
}

#[tokio::test]
async fn failed_remote_write_keeps_the_session_pending() {
    let ledger = Arc::new(MockLedger::new());
    let provider = Arc::new(MockChainProvider::new(11155111));
    let cache = Arc::new(MemoryCache::new());
    let mut machine = SessionStateMachine::new(cache.clone(), config());
    let (mut handle, _) = machine
        .connect_wallet(Arc::new(DevSigner::from_seed([3u8; 32])), provider, ledger.clone())
        .await
        .unwrap();

    ledger.fail_next_writes(true);
    let err = handle.add_record("Example", "a@x.com", "abcd").await.unwrap_err();
    assert!(matches!(err, LockboxError::RemoteTransaction { .. }));

    // The record survives in memory awaiting a retry; the cache never
    // learned about it.
    assert_eq!(handle.vault().len(), 1);
    assert_eq!(handle.status().await.unwrap(), SyncStatus::Pending);
    assert!(cache.vault_snapshot("default").is_none());

    // Retry after the network recovers.
    ledger.fail_next_writes(false);
    handle.commit().await.unwrap();
    assert_eq!(handle.status().await.unwrap(), SyncStatus::Synced);
}

#[tokio::test]
async fn keeper_resume_skips_resigning_but_revalidates_the_network() {
    let ledger = Arc::new(MockLedger::new());
    let provider = Arc::new(MockChainProvider::new(11155111));
    let signer = Arc::new(DevSigner::from_seed([5u8; 32]));
    let keeper = Arc::new(SessionKeeper::new());
    let cache = Arc::new(MemoryCache::new());

    let mut machine =
        SessionStateMachine::new(cache.clone(), config()).with_keeper(keeper.clone());
    let (mut handle, _) = machine
        .connect_wallet(signer, provider.clone(), ledger.clone())
        .await
        .unwrap();
    handle.add_record("Example", "a@x.com", "abcd").await.unwrap();
    drop(handle);
    let validations_before = provider.call_count();

    // Reload: resume from the keeper, no signature requested.
    let snapshot = keeper.resume().expect("session was kept");
    assert!(matches!(snapshot.identity(), Identity::Wallet { .. }));
    let mut machine2 = SessionStateMachine::new(cache, config());
    let (handle2, report) = machine2
        .resume(snapshot, Some((provider.clone(), ledger)))
        .await
        .unwrap();
    assert_eq!(machine2.state(), SessionState::Authenticated);
    assert_eq!(report.load, LoadOutcome::Loaded(1));
    assert!(report.pull.is_none(), "resume never substitutes for a pull");
    assert_eq!(handle2.status().await.unwrap(), SyncStatus::Synced);
    assert!(
        provider.call_count() > validations_before,
        "resume must revalidate the network"
    );
}

#[tokio::test]
async fn keeper_is_cleared_on_logout() {
    let keeper = Arc::new(SessionKeeper::new());
    let cache = Arc::new(MemoryCache::new());
    let mut machine = SessionStateMachine::new(cache, config()).with_keeper(keeper.clone());

    let (handle, _, _) = machine
        .sign_in_federated(&federated_token("alice"))
        .await
        .unwrap();
    assert!(!keeper.is_empty());

    machine.logout(handle).await.unwrap();
    assert!(keeper.is_empty(), "logout must clear the kept session");
}

#[tokio::test]
async fn resume_of_a_wallet_snapshot_fails_closed_on_wrong_network() {
    let ledger = Arc::new(MockLedger::new());
    let provider = Arc::new(MockChainProvider::new(11155111));
    let keeper = Arc::new(SessionKeeper::new());
    let cache = Arc::new(MemoryCache::new());

    let mut machine = SessionStateMachine::new(cache.clone(), config()).with_keeper(keeper.clone());
    let (handle, _) = machine
        .connect_wallet(
            Arc::new(DevSigner::from_seed([5u8; 32])),
            provider.clone(),
            ledger.clone(),
        )
        .await
        .unwrap();
    drop(handle);

    provider.switch_to(1);
    let snapshot = keeper.resume().unwrap();
    let mut machine2 = SessionStateMachine::new(cache, config());
    let err = machine2
        .resume(snapshot, Some((provider, ledger)))
        .await
        .unwrap_err();
    assert!(matches!(err, LockboxError::NetworkMismatch { .. }));
    assert_eq!(machine2.state(), SessionState::Unauthenticated);
}
