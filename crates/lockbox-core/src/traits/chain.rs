// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Active-network introspection trait.

use async_trait::async_trait;

use crate::error::LockboxError;

/// Reports which chain the remote provider is currently connected to.
///
/// Implementations MUST re-read from the source on every call. The network
/// validator relies on this to detect out-of-band network switches; a cached
/// value would let a stale chain id pass validation.
#[async_trait]
pub trait ChainProvider: Send + Sync {
    async fn current_chain_id(&self) -> Result<u64, LockboxError>;
}
