// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The authentication/session state machine.
//!
//! `Unauthenticated → NetworkValidating → Signing → Authenticated`, with a
//! hard return to `Unauthenticated` on logout or a detected network change.
//! The machine is restartable any number of times within one process.
//!
//! All session state (identity, key, network context) lives in the
//! [`SessionHandle`] the machine hands out; there are no ambient globals.
//! Because `commit`/`pull` borrow the handle mutably, a logout cannot
//! consume it while an operation is in flight — the borrow checker enforces
//! the "never clear the key under a pending remote write" rule.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{info, warn};

use lockbox_config::LockboxConfig;
use lockbox_core::{
    ChainProvider, FederatedProfile, Identity, LedgerContract, LoadOutcome, LockboxError,
    NetworkContext, SyncStatus, VaultCache, WalletSigner,
};
use lockbox_ledger::NetworkValidator;
use lockbox_vault::{VaultStore, WALLET_KEY_MESSAGE, key_from_signature, key_from_subject};

use crate::reconciler::{PullOutcome, StorageBackend, SyncReconciler};
use crate::restore::{SessionKeeper, SessionSnapshot};

/// Where the machine currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    NetworkValidating,
    Signing,
    Authenticated,
}

/// What authentication found in the local and remote stores.
#[derive(Debug)]
pub struct AuthReport {
    /// Outcome of the initial local-cache load.
    pub load: LoadOutcome,
    /// Outcome of the initial remote pull (wallet mode only). A corrupted
    /// remote store does not fail authentication, so the error rides here.
    pub pull: Option<Result<PullOutcome, LockboxError>>,
}

/// An authenticated session: identity, key-bearing store, and reconciler.
#[derive(Debug)]
pub struct SessionHandle {
    identity: Identity,
    network: NetworkContext,
    store: VaultStore,
    reconciler: SyncReconciler,
}

impl SessionHandle {
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn network(&self) -> &NetworkContext {
        &self.network
    }

    pub fn vault(&self) -> &lockbox_core::Vault {
        self.store.vault()
    }

    pub fn namespace(&self) -> &str {
        self.store.namespace()
    }

    /// Validate, append, and commit a new record. Returns the assigned id.
    ///
    /// On a failed commit the record stays in memory and the status reads
    /// `Pending`, so nothing is lost and the user can retry.
    pub async fn add_record(
        &mut self,
        site: &str,
        user: &str,
        pass: &str,
    ) -> Result<u64, LockboxError> {
        let id = self.store.add(site, user, pass)?;
        self.reconciler.commit(&mut self.store).await?;
        Ok(id)
    }

    /// Remove a record and commit. Returns whether a record was removed.
    pub async fn remove_record(&mut self, id: u64) -> Result<bool, LockboxError> {
        if !self.store.remove(id) {
            return Ok(false);
        }
        self.reconciler.commit(&mut self.store).await?;
        Ok(true)
    }

    /// Re-commit the current in-memory vault (retry after a failed commit).
    pub async fn commit(&mut self) -> Result<(), LockboxError> {
        self.reconciler.commit(&mut self.store).await
    }

    /// Fetch the remote vault (wallet mode).
    pub async fn pull(&mut self) -> Result<PullOutcome, LockboxError> {
        self.reconciler.pull(&mut self.store).await
    }

    pub async fn status(&self) -> Result<SyncStatus, LockboxError> {
        self.reconciler.status(self.store.vault()).await
    }
}

/// Drives authentication and owns the transitions between states.
pub struct SessionStateMachine {
    state: SessionState,
    cache: Arc<dyn VaultCache>,
    config: LockboxConfig,
    keeper: Option<Arc<SessionKeeper>>,
}

impl SessionStateMachine {
    pub fn new(cache: Arc<dyn VaultCache>, config: LockboxConfig) -> Self {
        Self {
            state: SessionState::Unauthenticated,
            cache,
            config,
            keeper: None,
        }
    }

    /// Attach a session keeper so authenticated sessions can be resumed
    /// without re-signing. Cleared automatically on logout.
    pub fn with_keeper(mut self, keeper: Arc<SessionKeeper>) -> Self {
        self.keeper = Some(keeper);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Wallet path: validate the network, obtain a signature over the fixed
    /// key message, derive the key, mount the store, and attempt a pull.
    ///
    /// Any failure rolls the machine back to `Unauthenticated` with all
    /// partial state discarded.
    pub async fn connect_wallet(
        &mut self,
        signer: Arc<dyn WalletSigner>,
        provider: Arc<dyn ChainProvider>,
        ledger: Arc<dyn LedgerContract>,
    ) -> Result<(SessionHandle, AuthReport), LockboxError> {
        self.state = SessionState::NetworkValidating;
        let validator = NetworkValidator::new(self.config.networks.clone(), provider);
        let network = match validator.validate().await {
            Ok(ctx) => ctx,
            Err(e) => {
                self.state = SessionState::Unauthenticated;
                return Err(e);
            }
        };

        self.state = SessionState::Signing;
        let signature_wait = Duration::from_secs(self.config.sync.signature_timeout_secs);
        let signature = match timeout(signature_wait, signer.sign_message(WALLET_KEY_MESSAGE)).await
        {
            Ok(Ok(signature)) => signature,
            Ok(Err(e)) => {
                self.state = SessionState::Unauthenticated;
                return Err(e);
            }
            Err(_) => {
                self.state = SessionState::Unauthenticated;
                return Err(LockboxError::Timeout {
                    duration: signature_wait,
                });
            }
        };

        let identity = Identity::Wallet {
            address: signer.address().to_string(),
        };
        let result = self
            .mount_wallet_session(identity, &signature, network, validator, ledger)
            .await;
        match result {
            Ok(ok) => {
                self.state = SessionState::Authenticated;
                info!(identity = %ok.0.identity.short_label(), "wallet session authenticated");
                Ok(ok)
            }
            Err(e) => {
                self.state = SessionState::Unauthenticated;
                Err(e)
            }
        }
    }

    async fn mount_wallet_session(
        &self,
        identity: Identity,
        signature: &[u8],
        network: NetworkContext,
        validator: NetworkValidator,
        ledger: Arc<dyn LedgerContract>,
    ) -> Result<(SessionHandle, AuthReport), LockboxError> {
        let key = key_from_signature(signature)?;
        if let Some(keeper) = &self.keeper {
            keeper.stash(SessionSnapshot::new(
                identity.clone(),
                network.chain_id,
                key.clone(),
            ));
        }

        let (store, load) = VaultStore::mount(
            self.cache.clone(),
            &identity,
            key,
            self.config.vault.min_ciphertext_len,
        )
        .await?;

        let caller = match &identity {
            Identity::Wallet { address } => address.clone(),
            Identity::Federated { .. } => {
                unreachable!("mount_wallet_session is only called with a wallet identity")
            }
        };
        let reconciler = SyncReconciler::new(
            self.cache.clone(),
            StorageBackend::LocalPlusRemote {
                ledger,
                validator,
                caller,
            },
            identity.cache_namespace(),
        );

        let mut handle = SessionHandle {
            identity,
            network,
            store,
            reconciler,
        };
        // The pull is attempted as part of authentication, but a corrupted
        // or unreachable remote store does not cancel the session.
        let pull = handle.pull().await;
        if let Err(e) = &pull {
            warn!(error = %e, "initial remote pull failed");
        }
        Ok((handle, AuthReport { load, pull: Some(pull) }))
    }

    /// Federated path: decode the token, derive the key from the stable
    /// subject id, and mount the per-subject namespace. No network
    /// validation and no remote participation.
    pub async fn sign_in_federated(
        &mut self,
        token: &str,
    ) -> Result<(SessionHandle, FederatedProfile, AuthReport), LockboxError> {
        self.state = SessionState::Unauthenticated;
        let profile = FederatedProfile::from_token(token)?;
        let identity = profile.identity();
        let key = key_from_subject(&profile.subject_id)?;

        if let Some(keeper) = &self.keeper {
            keeper.stash(SessionSnapshot::new(identity.clone(), None, key.clone()));
        }

        let (store, load) = VaultStore::mount(
            self.cache.clone(),
            &identity,
            key,
            self.config.vault.min_ciphertext_len,
        )
        .await?;
        let reconciler = SyncReconciler::new(
            self.cache.clone(),
            StorageBackend::LocalOnly,
            identity.cache_namespace(),
        );

        self.state = SessionState::Authenticated;
        info!(subject = %profile.subject_id, "federated session authenticated");
        Ok((
            SessionHandle {
                identity,
                network: NetworkContext::default(),
                store,
                reconciler,
            },
            profile,
            AuthReport { load, pull: None },
        ))
    }

    /// Resume a kept session without re-signing.
    ///
    /// Wallet sessions re-validate the network (a reconnect is a reconnect)
    /// but skip the pull: a resume is a convenience, never a substitute for
    /// remote confirmation, so markers are left alone.
    pub async fn resume(
        &mut self,
        snapshot: SessionSnapshot,
        remote: Option<(Arc<dyn ChainProvider>, Arc<dyn LedgerContract>)>,
    ) -> Result<(SessionHandle, AuthReport), LockboxError> {
        self.state = SessionState::Unauthenticated;
        let (identity, _, key) = snapshot.into_parts();

        let (network, backend) = match (&identity, remote) {
            (Identity::Wallet { address }, Some((provider, ledger))) => {
                self.state = SessionState::NetworkValidating;
                let validator = NetworkValidator::new(self.config.networks.clone(), provider);
                let network = match validator.validate().await {
                    Ok(ctx) => ctx,
                    Err(e) => {
                        self.state = SessionState::Unauthenticated;
                        return Err(e);
                    }
                };
                (
                    network,
                    StorageBackend::LocalPlusRemote {
                        ledger,
                        validator,
                        caller: address.clone(),
                    },
                )
            }
            (Identity::Wallet { .. }, None) => {
                return Err(LockboxError::Configuration(
                    "resuming a wallet session requires a chain provider and ledger".to_string(),
                ));
            }
            (Identity::Federated { .. }, _) => {
                (NetworkContext::default(), StorageBackend::LocalOnly)
            }
        };

        let (store, load) = VaultStore::mount(
            self.cache.clone(),
            &identity,
            key,
            self.config.vault.min_ciphertext_len,
        )
        .await?;
        let reconciler =
            SyncReconciler::new(self.cache.clone(), backend, identity.cache_namespace());

        self.state = SessionState::Authenticated;
        Ok((
            SessionHandle {
                identity,
                network,
                store,
                reconciler,
            },
            AuthReport { load, pull: None },
        ))
    }

    /// End the session with a full secure clear.
    ///
    /// The cached vault and marker for the active namespace are removed and
    /// the key material is zeroized when the handle drops. The remote store
    /// (wallet mode) remains the durable copy.
    pub async fn logout(&mut self, handle: SessionHandle) -> Result<(), LockboxError> {
        let namespace = handle.namespace().to_string();
        self.cache.clear_vault(&namespace).await?;
        self.cache.clear_marker(&namespace).await?;
        if let Some(keeper) = &self.keeper {
            keeper.clear();
        }
        drop(handle);
        self.state = SessionState::Unauthenticated;
        info!(namespace, "session ended, local state cleared");
        Ok(())
    }

    /// React to an out-of-band network change: hard logout.
    ///
    /// The remote store's identity differs per network, so continuing the
    /// session against a different chain would mix vaults.
    pub async fn network_changed(&mut self, handle: SessionHandle) -> Result<(), LockboxError> {
        warn!("network change detected, resetting session");
        self.logout(handle).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockbox_test_utils::{
        DevSigner, MemoryCache, MockChainProvider, MockLedger, federated_token,
    };

    fn config() -> LockboxConfig {
        LockboxConfig::default()
    }

    fn machine(cache: Arc<MemoryCache>) -> SessionStateMachine {
        SessionStateMachine::new(cache, config())
    }

    #[tokio::test]
    async fn federated_sign_in_reaches_authenticated() {
        let cache = Arc::new(MemoryCache::new());
        let mut machine = machine(cache);
        assert_eq!(machine.state(), SessionState::Unauthenticated);

        let (handle, profile, report) = machine
            .sign_in_federated(&federated_token("alice"))
            .await
            .unwrap();
        assert_eq!(machine.state(), SessionState::Authenticated);
        assert_eq!(profile.subject_id, "alice");
        assert_eq!(report.load, LoadOutcome::Empty);
        assert_eq!(handle.namespace(), "federated:alice");
        assert!(report.pull.is_none());
    }

    #[tokio::test]
    async fn malformed_token_stays_unauthenticated() {
        let cache = Arc::new(MemoryCache::new());
        let mut machine = machine(cache);
        assert!(machine.sign_in_federated("not-a-token").await.is_err());
        assert_eq!(machine.state(), SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn wallet_connect_happy_path() {
        let cache = Arc::new(MemoryCache::new());
        let mut machine = machine(cache);
        let signer = Arc::new(DevSigner::from_seed([1u8; 32]));
        let provider = Arc::new(MockChainProvider::new(11155111));
        let ledger = Arc::new(MockLedger::new());

        let (handle, report) = machine
            .connect_wallet(signer.clone(), provider, ledger)
            .await
            .unwrap();
        assert_eq!(machine.state(), SessionState::Authenticated);
        assert_eq!(handle.namespace(), "default");
        assert_eq!(handle.network().chain_id, Some(11155111));
        assert!(matches!(
            report.pull,
            Some(Ok(PullOutcome::NoRemoteData))
        ));
        assert!(matches!(handle.identity(), Identity::Wallet { address } if address == signer.address()));
    }

    #[tokio::test]
    async fn wrong_network_rolls_back_before_signing() {
        let cache = Arc::new(MemoryCache::new());
        let mut machine = machine(cache);
        let signer = Arc::new(DevSigner::from_seed([1u8; 32]));
        let provider = Arc::new(MockChainProvider::new(1));
        let ledger = Arc::new(MockLedger::new());

        let err = machine
            .connect_wallet(signer, provider, ledger)
            .await
            .unwrap_err();
        assert!(matches!(err, LockboxError::NetworkMismatch { .. }));
        assert_eq!(machine.state(), SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn declined_signature_rolls_back() {
        let cache = Arc::new(MemoryCache::new());
        let mut machine = machine(cache);
        let signer = Arc::new(DevSigner::from_seed([1u8; 32]));
        signer.decline_requests(true);
        let provider = Arc::new(MockChainProvider::new(11155111));
        let ledger = Arc::new(MockLedger::new());

        let err = machine
            .connect_wallet(signer, provider, ledger)
            .await
            .unwrap_err();
        assert!(matches!(err, LockboxError::IdentityProof(_)));
        assert_eq!(machine.state(), SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn reauthentication_reproduces_the_same_vault() {
        let cache = Arc::new(MemoryCache::new());
        let mut machine = machine(cache.clone());

        let (mut handle, _, _) = machine
            .sign_in_federated(&federated_token("alice"))
            .await
            .unwrap();
        handle.add_record("Example", "a@x.com", "abcd").await.unwrap();
        // Session ends without logout (process exit): cache survives.
        drop(handle);

        let mut machine2 = SessionStateMachine::new(cache, config());
        let (handle2, _, report) = machine2
            .sign_in_federated(&federated_token("alice"))
            .await
            .unwrap();
        assert_eq!(report.load, LoadOutcome::Loaded(1));
        assert_eq!(handle2.vault().records()[0].site, "Example");
    }

    #[tokio::test]
    async fn logout_clears_cache_marker_and_state() {
        let cache = Arc::new(MemoryCache::new());
        let mut machine = machine(cache.clone());
        let (mut handle, _, _) = machine
            .sign_in_federated(&federated_token("alice"))
            .await
            .unwrap();
        handle.add_record("Example", "a@x.com", "abcd").await.unwrap();
        assert!(cache.vault_snapshot("federated:alice").is_some());

        machine.logout(handle).await.unwrap();
        assert_eq!(machine.state(), SessionState::Unauthenticated);
        assert!(cache.vault_snapshot("federated:alice").is_none());
        assert!(cache.marker_snapshot("federated:alice").is_none());
    }

    #[tokio::test]
    async fn network_change_is_a_hard_logout() {
        let cache = Arc::new(MemoryCache::new());
        let mut machine = machine(cache.clone());
        let signer = Arc::new(DevSigner::from_seed([1u8; 32]));
        let provider = Arc::new(MockChainProvider::new(11155111));
        let ledger = Arc::new(MockLedger::new());

        let (handle, _) = machine
            .connect_wallet(signer, provider.clone(), ledger)
            .await
            .unwrap();
        provider.switch_to(1);
        machine.network_changed(handle).await.unwrap();
        assert_eq!(machine.state(), SessionState::Unauthenticated);
        assert!(cache.vault_snapshot("default").is_none());
    }

    #[tokio::test]
    async fn machine_is_restartable_after_logout() {
        let cache = Arc::new(MemoryCache::new());
        let mut machine = machine(cache);
        let (handle, _, _) = machine
            .sign_in_federated(&federated_token("alice"))
            .await
            .unwrap();
        machine.logout(handle).await.unwrap();

        let (handle2, _, _) = machine
            .sign_in_federated(&federated_token("bob"))
            .await
            .unwrap();
        assert_eq!(handle2.namespace(), "federated:bob");
        assert_eq!(machine.state(), SessionState::Authenticated);
    }

    #[tokio::test]
    async fn federated_vaults_never_cross_subjects() {
        let cache = Arc::new(MemoryCache::new());
        let mut machine = machine(cache.clone());

        let (mut alice, _, _) = machine
            .sign_in_federated(&federated_token("alice"))
            .await
            .unwrap();
        alice.add_record("AliceSite", "a@x.com", "abcd").await.unwrap();
        drop(alice);

        let mut machine2 = SessionStateMachine::new(cache, config());
        let (bob, _, report) = machine2
            .sign_in_federated(&federated_token("bob"))
            .await
            .unwrap();
        assert_eq!(report.load, LoadOutcome::Empty);
        assert!(bob.vault().is_empty());
    }
}
