// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wallet signing trait.

use async_trait::async_trait;

use crate::error::LockboxError;

/// An external signing provider controlled by the user's wallet.
///
/// The engine never sees a private key; it submits a message and receives
/// signature bytes. A declined or unavailable signer surfaces as
/// [`LockboxError::IdentityProof`], never as a corrupted key.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// The account address this signer controls.
    fn address(&self) -> &str;

    /// Sign a UTF-8 message, returning the raw signature bytes.
    async fn sign_message(&self, message: &str) -> Result<Vec<u8>, LockboxError>;
}
