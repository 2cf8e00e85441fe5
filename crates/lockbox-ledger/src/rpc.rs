// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON-RPC implementations of the chain provider and ledger contract.
//!
//! Reads go through `eth_call` (view, no state change). Writes go through
//! `eth_sendTransaction` against a node-managed account, then poll
//! `eth_getTransactionReceipt` until the transaction confirms, reverts, or
//! the configured deadline passes. Once submitted, a write cannot be
//! revoked; the poll loop only decides how long the engine keeps waiting.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::time::{Instant, sleep};
use tracing::{debug, info};

use lockbox_config::SyncConfig;
use lockbox_core::{ChainProvider, LedgerContract, LockboxError};

use crate::contract::{decode_string_result, encode_fetch_call, encode_store_call};

/// Minimal JSON-RPC 2.0 client over HTTP.
#[derive(Clone)]
pub struct JsonRpcClient {
    endpoint: String,
    http: reqwest::Client,
}

impl JsonRpcClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Issue one request and return the `result` value.
    ///
    /// Provider-side error objects and transport failures both surface as
    /// [`LockboxError::Rpc`].
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, LockboxError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response: Value = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| rpc_err(format!("{method}: {e}")))?
            .json()
            .await
            .map_err(|e| rpc_err(format!("{method}: invalid response body: {e}")))?;

        if let Some(error) = response.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown provider error");
            return Err(rpc_err(format!("{method}: {message}")));
        }

        response
            .get("result")
            .cloned()
            .ok_or_else(|| rpc_err(format!("{method}: response has no result")))
    }
}

fn rpc_err(message: String) -> LockboxError {
    LockboxError::Rpc { message }
}

/// Chain provider backed by `eth_chainId`.
///
/// Issues a fresh request on every call; nothing is cached, so an
/// out-of-band network switch is visible at the next validation.
pub struct JsonRpcChainProvider {
    client: JsonRpcClient,
}

impl JsonRpcChainProvider {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: JsonRpcClient::new(endpoint),
        }
    }
}

#[async_trait]
impl ChainProvider for JsonRpcChainProvider {
    async fn current_chain_id(&self) -> Result<u64, LockboxError> {
        let result = self.client.call("eth_chainId", json!([])).await?;
        let text = result
            .as_str()
            .ok_or_else(|| rpc_err("eth_chainId: result is not a string".to_string()))?;
        parse_hex_u64(text)
            .ok_or_else(|| rpc_err(format!("eth_chainId: `{text}` is not a hex quantity")))
    }
}

/// Ledger contract client speaking the fixed two-method ABI.
pub struct RpcLedger {
    client: JsonRpcClient,
    confirmation_timeout: Duration,
    poll_interval: Duration,
}

impl RpcLedger {
    pub fn new(endpoint: &str, sync: &SyncConfig) -> Self {
        Self {
            client: JsonRpcClient::new(endpoint),
            confirmation_timeout: Duration::from_secs(sync.confirmation_timeout_secs),
            poll_interval: Duration::from_millis(sync.receipt_poll_interval_ms),
        }
    }
}

#[async_trait]
impl LedgerContract for RpcLedger {
    async fn read_vault(&self, contract: &str, caller: &str) -> Result<String, LockboxError> {
        let params = json!([
            { "from": caller, "to": contract, "data": encode_fetch_call() },
            "latest",
        ]);
        let result = self.client.call("eth_call", params).await?;
        let hex_data = result
            .as_str()
            .ok_or_else(|| rpc_err("eth_call: result is not a string".to_string()))?;
        let payload = decode_string_result(hex_data)?;
        debug!(contract, bytes = payload.len(), "remote vault read");
        Ok(payload)
    }

    async fn write_vault(
        &self,
        contract: &str,
        caller: &str,
        ciphertext: &str,
    ) -> Result<(), LockboxError> {
        let params = json!([
            { "from": caller, "to": contract, "data": encode_store_call(ciphertext) },
        ]);
        let result = self.client.call("eth_sendTransaction", params).await?;
        let tx_hash = result
            .as_str()
            .ok_or_else(|| rpc_err("eth_sendTransaction: result is not a string".to_string()))?
            .to_string();
        debug!(%tx_hash, "vault write submitted, awaiting confirmation");

        let deadline = Instant::now() + self.confirmation_timeout;
        loop {
            sleep(self.poll_interval).await;

            let receipt = self
                .client
                .call("eth_getTransactionReceipt", json!([tx_hash]))
                .await?;
            if !receipt.is_null() {
                return match receipt.get("status").and_then(Value::as_str) {
                    Some("0x0") => Err(LockboxError::RemoteTransaction {
                        message: format!("transaction {tx_hash} reverted"),
                    }),
                    // A present receipt without a parsable status field is a
                    // pre-status-era chain; presence alone confirms inclusion.
                    _ => {
                        info!(%tx_hash, "vault write confirmed");
                        Ok(())
                    }
                };
            }

            if Instant::now() >= deadline {
                return Err(LockboxError::Timeout {
                    duration: self.confirmation_timeout,
                });
            }
        }
    }
}

/// Parse a `0x`-prefixed hex quantity.
fn parse_hex_u64(text: &str) -> Option<u64> {
    let stripped = text.strip_prefix("0x")?;
    u64::from_str_radix(stripped, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_sync() -> SyncConfig {
        SyncConfig {
            confirmation_timeout_secs: 1,
            receipt_poll_interval_ms: 10,
            signature_timeout_secs: 1,
        }
    }

    fn rpc_result(value: Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": value,
        }))
    }

    const CONTRACT: &str = "0x7A3f9C51b04E5dD26A6dE0F1cB8a94E2D4c0Fa19";
    const CALLER: &str = "0x00a329c0648769A73afAc7F9381E08FB43dBEA72";

    #[test]
    fn hex_quantities_parse() {
        assert_eq!(parse_hex_u64("0xaa36a7"), Some(11155111));
        assert_eq!(parse_hex_u64("0x1"), Some(1));
        assert_eq!(parse_hex_u64("aa36a7"), None);
        assert_eq!(parse_hex_u64("0xzz"), None);
    }

    #[tokio::test]
    async fn chain_provider_parses_the_chain_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "eth_chainId"})))
            .respond_with(rpc_result(json!("0xaa36a7")))
            .mount(&server)
            .await;

        let provider = JsonRpcChainProvider::new(&server.uri());
        assert_eq!(provider.current_chain_id().await.unwrap(), 11155111);
    }

    #[tokio::test]
    async fn provider_error_objects_surface_as_rpc_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": { "code": -32000, "message": "header not found" },
            })))
            .mount(&server)
            .await;

        let provider = JsonRpcChainProvider::new(&server.uri());
        let err = provider.current_chain_id().await.unwrap_err();
        assert!(matches!(err, LockboxError::Rpc { message } if message.contains("header not found")));
    }

    #[tokio::test]
    async fn read_vault_decodes_the_stored_string() {
        let stored = "lk1.c2VhbGVkIHZhdWx0IGJsb2I=";
        let return_data = {
            let call = crate::contract::encode_store_call(stored);
            format!("0x{}", &call[10..])
        };

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "eth_call"})))
            .respond_with(rpc_result(json!(return_data)))
            .mount(&server)
            .await;

        let ledger = RpcLedger::new(&server.uri(), &fast_sync());
        assert_eq!(ledger.read_vault(CONTRACT, CALLER).await.unwrap(), stored);
    }

    #[tokio::test]
    async fn read_vault_passes_through_an_empty_slot() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "eth_call"})))
            .respond_with(rpc_result(json!("0x")))
            .mount(&server)
            .await;

        let ledger = RpcLedger::new(&server.uri(), &fast_sync());
        assert_eq!(ledger.read_vault(CONTRACT, CALLER).await.unwrap(), "");
    }

    #[tokio::test]
    async fn write_vault_polls_until_the_receipt_confirms() {
        let tx_hash = "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b";
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "eth_sendTransaction"})))
            .respond_with(rpc_result(json!(tx_hash)))
            .mount(&server)
            .await;
        // First poll: not yet mined.
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "eth_getTransactionReceipt"})))
            .respond_with(rpc_result(Value::Null))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        // Second poll: confirmed.
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "eth_getTransactionReceipt"})))
            .respond_with(rpc_result(json!({"status": "0x1", "transactionHash": tx_hash})))
            .mount(&server)
            .await;

        let ledger = RpcLedger::new(&server.uri(), &fast_sync());
        ledger.write_vault(CONTRACT, CALLER, "lk1.payload").await.unwrap();
    }

    #[tokio::test]
    async fn write_vault_reports_a_reverted_transaction() {
        let tx_hash = "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b";
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "eth_sendTransaction"})))
            .respond_with(rpc_result(json!(tx_hash)))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "eth_getTransactionReceipt"})))
            .respond_with(rpc_result(json!({"status": "0x0", "transactionHash": tx_hash})))
            .mount(&server)
            .await;

        let ledger = RpcLedger::new(&server.uri(), &fast_sync());
        let err = ledger.write_vault(CONTRACT, CALLER, "lk1.payload").await.unwrap_err();
        assert!(matches!(err, LockboxError::RemoteTransaction { .. }));
    }

    #[tokio::test]
    async fn write_vault_times_out_when_never_mined() {
        let tx_hash = "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b";
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "eth_sendTransaction"})))
            .respond_with(rpc_result(json!(tx_hash)))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "eth_getTransactionReceipt"})))
            .respond_with(rpc_result(Value::Null))
            .mount(&server)
            .await;

        let ledger = RpcLedger::new(&server.uri(), &fast_sync());
        let err = ledger.write_vault(CONTRACT, CALLER, "lk1.payload").await.unwrap_err();
        assert!(matches!(err, LockboxError::Timeout { .. }));
    }
}
