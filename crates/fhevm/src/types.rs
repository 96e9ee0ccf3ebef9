// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::{Address, Bytes, B256};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

/// 32 byte reference to a ciphertext held by the coprocessor
pub type CiphertextHandle = B256;

/// Width of the only encrypted type the board stores
pub const EUINT32_MAX: u64 = u32::MAX as u64;

/// Seconds in one day of decryption validity
pub const SECONDS_PER_DAY: u64 = 86_400;

/// The network a wallet is connected to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub chain_id: u64,
    pub rpc_url: String,
}

/// Output of `encrypt()` on an input builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedInput {
    pub handles: Vec<CiphertextHandle>,
    pub input_proof: Bytes,
}

/// Ephemeral key pair used for a single user decryption. Keys are hex without `0x`.
#[derive(Clone)]
pub struct Keypair {
    pub public_key: String,
    pub private_key: Zeroizing<String>,
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleContractPair {
    pub handle: CiphertextHandle,
    pub contract_address: Address,
}

/// Window during which a signed decryption authorization is honoured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecryptionValidity {
    /// Unix seconds
    pub start_timestamp: u64,
    pub duration_days: u64,
}

impl DecryptionValidity {
    /// A window opening now
    pub fn starting_now(duration_days: u64) -> Self {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        Self {
            start_timestamp: now,
            duration_days,
        }
    }

    pub fn end_timestamp(&self) -> u64 {
        self.start_timestamp
            .saturating_add(self.duration_days.saturating_mul(SECONDS_PER_DAY))
    }

    pub fn contains(&self, timestamp: u64) -> bool {
        timestamp >= self.start_timestamp && timestamp < self.end_timestamp()
    }
}

/// Everything the decryption service needs to release plaintexts to a user
#[derive(Debug, Clone)]
pub struct UserDecryptRequest {
    pub handle_contract_pairs: Vec<HandleContractPair>,
    pub keypair: Keypair,
    /// 65 byte signature, hex encoded without the `0x` prefix
    pub signature: String,
    pub contract_addresses: Vec<Address>,
    pub user_address: Address,
    pub validity: DecryptionValidity,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity_window_bounds() {
        let validity = DecryptionValidity {
            start_timestamp: 1_000,
            duration_days: 10,
        };
        assert_eq!(validity.end_timestamp(), 1_000 + 864_000);
        assert!(!validity.contains(999));
        assert!(validity.contains(1_000));
        assert!(validity.contains(864_999));
        assert!(!validity.contains(865_000));
    }

    #[test]
    fn test_keypair_debug_hides_private_key() {
        let keypair = Keypair {
            public_key: "abcd".to_string(),
            private_key: Zeroizing::new("deadbeef".to_string()),
        };
        let printed = format!("{keypair:?}");
        assert!(printed.contains("abcd"));
        assert!(!printed.contains("deadbeef"));
    }
}
