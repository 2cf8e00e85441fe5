// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote ledger trait: the fixed two-method contract surface.

use async_trait::async_trait;

use crate::error::LockboxError;

/// Durable off-device storage behind a fixed external contract.
///
/// The engine calls exactly these two operations; any other contract shape
/// is unsupported. The contract address is resolved per call by the network
/// validator so a stale address can never be used after a network switch.
#[async_trait]
pub trait LedgerContract: Send + Sync {
    /// Invoke the fixed read method (view call, no state change).
    ///
    /// Returns the raw ciphertext stored for `caller`, which may be empty
    /// when nothing has been written yet.
    async fn read_vault(&self, contract: &str, caller: &str) -> Result<String, LockboxError>;

    /// Invoke the fixed write method and wait for confirmation.
    ///
    /// Resolves only after the underlying transaction is confirmed; this is
    /// a slow and fallible step. A failed or reverted write surfaces as
    /// [`LockboxError::RemoteTransaction`] and must leave local state alone.
    async fn write_vault(
        &self,
        contract: &str,
        caller: &str,
        ciphertext: &str,
    ) -> Result<(), LockboxError>;
}
