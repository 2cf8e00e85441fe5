// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as contract address shape and positive timeouts.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::LockboxConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &LockboxConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "log_level `{}` is not one of {}",
                config.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.vault.min_ciphertext_len == 0 {
        errors.push(ConfigError::Validation {
            message: "vault.min_ciphertext_len must be positive".to_string(),
        });
    }

    if config.sync.confirmation_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "sync.confirmation_timeout_secs must be positive".to_string(),
        });
    }

    if config.sync.receipt_poll_interval_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "sync.receipt_poll_interval_ms must be positive".to_string(),
        });
    }

    if config.networks.is_empty() {
        errors.push(ConfigError::Validation {
            message: "at least one [[networks]] entry is required".to_string(),
        });
    }

    let mut seen_ids = HashSet::new();
    for network in &config.networks {
        if !seen_ids.insert(network.chain_id) {
            errors.push(ConfigError::Validation {
                message: format!("duplicate chain_id {} in [[networks]]", network.chain_id),
            });
        }
        if network.name.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("networks[{}].name must not be empty", network.chain_id),
            });
        }
        if network.rpc_endpoint.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!(
                    "networks[{}].rpc_endpoint must not be empty",
                    network.chain_id
                ),
            });
        }
        if !is_plausible_address(&network.contract_address) {
            errors.push(ConfigError::Validation {
                message: format!(
                    "networks[{}].contract_address `{}` is not a 0x-prefixed 20-byte hex address",
                    network.chain_id, network.contract_address
                ),
            });
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Basic address shape check at config-load time.
///
/// The network validator re-checks at every remote operation; this exists so
/// an obviously broken table entry fails at startup instead of at first sync.
fn is_plausible_address(address: &str) -> bool {
    address.len() == 42
        && address.starts_with("0x")
        && address[2..].chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NetworkConfig;

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&LockboxConfig::default()).is_ok());
    }

    #[test]
    fn empty_network_table_fails() {
        let mut config = LockboxConfig::default();
        config.networks.clear();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(
            e,
            ConfigError::Validation { message } if message.contains("[[networks]]")
        )));
    }

    #[test]
    fn duplicate_chain_ids_fail() {
        let mut config = LockboxConfig::default();
        let dup = config.networks[0].clone();
        config.networks.push(dup);
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(
            e,
            ConfigError::Validation { message } if message.contains("duplicate chain_id")
        )));
    }

    #[test]
    fn placeholder_contract_address_fails() {
        let mut config = LockboxConfig::default();
        config.networks[0].contract_address = "0x...".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(
            e,
            ConfigError::Validation { message } if message.contains("contract_address")
        )));
    }

    #[test]
    fn zero_min_ciphertext_len_fails() {
        let mut config = LockboxConfig::default();
        config.vault.min_ciphertext_len = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn unknown_log_level_fails() {
        let mut config = LockboxConfig::default();
        config.log_level = "loud".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn extra_valid_network_passes() {
        let mut config = LockboxConfig::default();
        config.networks.push(NetworkConfig {
            chain_id: 31337,
            name: "Local Devnet".to_string(),
            contract_address: "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string(),
            rpc_endpoint: "http://127.0.0.1:8545".to_string(),
        });
        assert!(validate_config(&config).is_ok());
    }
}
