// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Network validation and contract-address derivation.
//!
//! Every remote operation starts here: the active chain id is re-read from
//! the provider (never trusted from a cache), checked against the supported
//! table, and only then is the contract address derived. Each derivation
//! layer fails with its own error so a misconfiguration names itself.

use std::sync::Arc;

use tracing::{debug, warn};

use lockbox_config::NetworkConfig;
use lockbox_core::{ChainProvider, LockboxError, NetworkContext};

/// Placeholder value used in unconfigured network tables.
const ADDRESS_PLACEHOLDER: &str = "0x...";
/// `0x` + 20 hex-encoded bytes.
const ADDRESS_LEN: usize = 42;

/// Validates the active network against the supported table.
pub struct NetworkValidator {
    networks: Vec<NetworkConfig>,
    provider: Arc<dyn ChainProvider>,
}

impl NetworkValidator {
    pub fn new(networks: Vec<NetworkConfig>, provider: Arc<dyn ChainProvider>) -> Self {
        Self { networks, provider }
    }

    /// Re-read the active chain id and check table membership.
    ///
    /// Succeeds with a [`NetworkContext`] fixing the chain id and contract
    /// address. Fails with [`LockboxError::NetworkMismatch`] naming the
    /// expected network; the caller must treat its context as invalidated
    /// on any failure. Must run again after every reconnect and whenever an
    /// out-of-band network-change notification arrives.
    pub async fn validate(&self) -> Result<NetworkContext, LockboxError> {
        let actual = self.provider.current_chain_id().await?;

        match self.networks.iter().find(|n| n.chain_id == actual) {
            Some(network) => {
                debug!(chain_id = actual, network = %network.name, "network validated");
                Ok(NetworkContext::validated(
                    actual,
                    network.contract_address.clone(),
                ))
            }
            None => {
                let expected = self.networks.first().ok_or_else(|| {
                    LockboxError::Configuration("supported network table is empty".to_string())
                })?;
                warn!(chain_id = actual, expected = expected.chain_id, "network mismatch");
                Err(LockboxError::NetworkMismatch {
                    actual,
                    expected: expected.chain_id,
                    expected_name: expected.name.clone(),
                })
            }
        }
    }

    /// Derive the contract address for a validated context.
    ///
    /// Layered validation; every failed layer is a distinct
    /// [`LockboxError::Configuration`] naming what failed. Callers must not
    /// attempt a remote call without the address this returns.
    pub fn derive_contract_address(&self, ctx: &NetworkContext) -> Result<String, LockboxError> {
        let chain_id = ctx.chain_id.ok_or_else(|| {
            LockboxError::Configuration(
                "chain id has not been validated; run network validation first".to_string(),
            )
        })?;

        let network = self.networks.iter().find(|n| n.chain_id == chain_id).ok_or_else(|| {
            LockboxError::Configuration(format!(
                "chain {chain_id} is not in the supported network table (supported: {})",
                self.networks
                    .iter()
                    .map(|n| n.chain_id.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })?;

        let address = network.contract_address.trim();
        if address.is_empty() {
            return Err(LockboxError::Configuration(format!(
                "no contract address configured for {}",
                network.name
            )));
        }
        if address == ADDRESS_PLACEHOLDER {
            return Err(LockboxError::Configuration(format!(
                "contract address for {} is still the placeholder",
                network.name
            )));
        }
        if !address.starts_with("0x") || address.len() != ADDRESS_LEN {
            return Err(LockboxError::Configuration(format!(
                "contract address `{address}` is not a 0x-prefixed {ADDRESS_LEN}-character address"
            )));
        }
        if !address[2..].chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(LockboxError::Configuration(format!(
                "contract address `{address}` contains non-hex characters"
            )));
        }

        Ok(address.to_string())
    }
}
