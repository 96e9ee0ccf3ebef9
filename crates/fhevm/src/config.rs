// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::{address, Address};
use serde::{Deserialize, Serialize};

pub const SEPOLIA_CHAIN_ID: u64 = 11155111;
pub const SEPOLIA_GATEWAY_CHAIN_ID: u64 = 10901;
pub const SEPOLIA_RELAYER_URL: &str = "https://relayer.testnet.zama.org";

/// Protocol parameters handed to the SDK when an instance is created.
///
/// These are the seven values every FHEVM deployment publishes plus the relayer endpoint. They
/// are constants of the network, never computed by the client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FhevmConfig {
    /// Host chain the encrypted contracts live on
    pub chain_id: u64,
    /// Access control list contract
    pub acl_contract_address: Address,
    /// Key management contract
    pub kms_contract_address: Address,
    /// Input verifier contract checking input proofs
    pub input_verifier_contract_address: Address,
    /// EIP-712 verifying contract used for user decryption requests
    pub verifying_contract_address_decryption: Address,
    /// EIP-712 verifying contract used for input verification
    pub verifying_contract_address_input_verification: Address,
    /// Chain id of the gateway chain, used as the EIP-712 domain chain id
    pub gateway_chain_id: u64,
    /// Relayer endpoint for input proofs and user decryption
    pub relayer_url: String,
}

impl FhevmConfig {
    pub fn sepolia() -> Self {
        Self {
            chain_id: SEPOLIA_CHAIN_ID,
            acl_contract_address: address!("0xf0Ffdc93b7E186bC2f8CB3dAA75D86d1930A433D"),
            kms_contract_address: address!("0xbE0E383937d564D7FF0BC3b46c51f0bF8d5C311A"),
            input_verifier_contract_address: address!(
                "0xBBC1fFCdc7C316aAAd72E807D9b0272BE8F84DA0"
            ),
            verifying_contract_address_decryption: address!(
                "0x5D8BD78e2ea6bbE41f26dFe9fdaEAa349e077478"
            ),
            verifying_contract_address_input_verification: address!(
                "0x483b9dE06E4E4C7D35CCf5837A1668487406D955"
            ),
            gateway_chain_id: SEPOLIA_GATEWAY_CHAIN_ID,
            relayer_url: SEPOLIA_RELAYER_URL.to_string(),
        }
    }
}

impl Default for FhevmConfig {
    fn default() -> Self {
        Self::sepolia()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_roundtrip_uses_snake_case_keys() -> anyhow::Result<()> {
        let json = serde_json::to_value(FhevmConfig::sepolia())?;
        assert_eq!(json["gateway_chain_id"], 10901);
        assert_eq!(json["relayer_url"], SEPOLIA_RELAYER_URL);

        let parsed: FhevmConfig = serde_json::from_value(json)?;
        assert_eq!(parsed, FhevmConfig::default());
        Ok(())
    }
}
