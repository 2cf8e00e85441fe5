// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote-ledger access for the Lockbox vault engine.
//!
//! Wraps the fixed two-method vault contract behind the `LedgerContract`
//! trait, validates the active network before any remote operation, and
//! derives the contract address per call so a network switch can never
//! leak a stale address into a remote request.

pub mod contract;
pub mod network;
pub mod rpc;

pub use network::NetworkValidator;
pub use rpc::{JsonRpcChainProvider, JsonRpcClient, RpcLedger};
