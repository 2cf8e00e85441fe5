// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Auto-hide timer for revealed secrets.
//!
//! Whichever component reveals a password owns one of these. Re-arming on
//! every reveal cancels and replaces the previous timer, so revealing a
//! second record can never leave a stale timer hiding the wrong one.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::debug;

/// Cancellable scheduled task that fires a hide callback once.
pub struct RevealTimer {
    timeout: Duration,
    task: Option<JoinHandle<()>>,
}

impl RevealTimer {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            task: None,
        }
    }

    /// Schedule `on_hide` after the timeout, cancelling any previous timer.
    pub fn arm<F>(&mut self, on_hide: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();
        let timeout = self.timeout;
        self.task = Some(tokio::spawn(async move {
            sleep(timeout).await;
            debug!("reveal timer fired, hiding secret");
            on_hide();
        }));
    }

    /// Cancel the pending timer, if any.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Whether a timer is currently scheduled and has not fired.
    pub fn is_armed(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for RevealTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
