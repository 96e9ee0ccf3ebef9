// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Seconds the board waits after a confirmed submission before offering decryption
pub const DEFAULT_SYNC_DELAY_SECS: u64 = 30;
/// Days a signed decryption authorization stays valid
pub const DEFAULT_DECRYPT_DURATION_DAYS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct WorkflowConfig {
    pub sync_delay_secs: u64,
    pub decrypt_duration_days: u64,
    /// Skip straight to decryption when the connected user already has a stored value
    pub resume_existing: bool,
    /// Upper bound on any single SDK, wallet or contract call
    pub call_timeout_secs: Option<u64>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            sync_delay_secs: DEFAULT_SYNC_DELAY_SECS,
            decrypt_duration_days: DEFAULT_DECRYPT_DURATION_DAYS,
            resume_existing: true,
            call_timeout_secs: None,
        }
    }
}

impl WorkflowConfig {
    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct WalletConfig {
    /// Hex private key. Prefer `${PRIVATE_KEY}` over a literal.
    pub private_key: Option<String>,
}

impl std::fmt::Debug for WalletConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletConfig")
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
