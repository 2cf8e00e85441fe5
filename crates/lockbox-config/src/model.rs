// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Lockbox vault engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Lockbox configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to the reference
/// deployment values.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LockboxConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Encryption envelope and reveal-timer settings.
    #[serde(default)]
    pub vault: VaultConfig,

    /// Local cache settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Remote synchronization settings.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Supported remote networks. Adding a network is adding an entry here,
    /// never adding branching logic.
    #[serde(default = "default_networks")]
    pub networks: Vec<NetworkConfig>,
}

impl Default for LockboxConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            vault: VaultConfig::default(),
            storage: StorageConfig::default(),
            sync: SyncConfig::default(),
            networks: default_networks(),
        }
    }
}

impl LockboxConfig {
    /// Look up a supported network by chain id.
    pub fn network(&self, chain_id: u64) -> Option<&NetworkConfig> {
        self.networks.iter().find(|n| n.chain_id == chain_id)
    }

    /// All supported chain ids, in table order.
    pub fn supported_chain_ids(&self) -> Vec<u64> {
        self.networks.iter().map(|n| n.chain_id).collect()
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Encryption envelope and reveal-timer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// Minimum length for a string to be considered stored ciphertext.
    /// Anything shorter is treated as "no data yet", never decrypted.
    #[serde(default = "default_min_ciphertext_len")]
    pub min_ciphertext_len: usize,

    /// Seconds a revealed password stays visible before auto-hide.
    #[serde(default = "default_reveal_timeout_secs")]
    pub reveal_timeout_secs: u64,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            min_ciphertext_len: default_min_ciphertext_len(),
            reveal_timeout_secs: default_reveal_timeout_secs(),
        }
    }
}

fn default_min_ciphertext_len() -> usize {
    20
}

fn default_reveal_timeout_secs() -> u64 {
    30
}

/// Local cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite cache database.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Whether to enable WAL journaling mode.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    "lockbox.db".to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Remote synchronization configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Upper bound on waiting for a remote write to confirm.
    #[serde(default = "default_confirmation_timeout_secs")]
    pub confirmation_timeout_secs: u64,

    /// Interval between transaction receipt polls.
    #[serde(default = "default_receipt_poll_interval_ms")]
    pub receipt_poll_interval_ms: u64,

    /// Upper bound on waiting for the user to sign the key message.
    #[serde(default = "default_signature_timeout_secs")]
    pub signature_timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            confirmation_timeout_secs: default_confirmation_timeout_secs(),
            receipt_poll_interval_ms: default_receipt_poll_interval_ms(),
            signature_timeout_secs: default_signature_timeout_secs(),
        }
    }
}

fn default_confirmation_timeout_secs() -> u64 {
    120
}

fn default_receipt_poll_interval_ms() -> u64 {
    2000
}

fn default_signature_timeout_secs() -> u64 {
    60
}

/// One supported remote network.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkConfig {
    /// Chain id the wallet must be connected to.
    pub chain_id: u64,

    /// Display name shown in mismatch errors.
    pub name: String,

    /// Address of the vault contract deployed on this network.
    pub contract_address: String,

    /// JSON-RPC endpoint used for chain id checks and view calls.
    pub rpc_endpoint: String,
}

/// The reference deployment ships exactly one populated network entry.
fn default_networks() -> Vec<NetworkConfig> {
    vec![NetworkConfig {
        chain_id: 11155111,
        name: "Sepolia Testnet".to_string(),
        contract_address: "0x7A3f9C51b04E5dD26A6dE0F1cB8a94E2D4c0Fa19".to_string(),
        rpc_endpoint: "https://sepolia.example-rpc.io/v3/YOUR_KEY".to_string(),
    }]
}
