// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::Address;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// The `SecretMessageBoard` deployment on Sepolia
pub const DEFAULT_SECRET_BOARD_ADDRESS: &str = "0x9c5f39ca7544a021d7C106c3F0d6518bF0c7bF9B";

/// A contract entry in the config file. Either a bare address or a table that also records the
/// deployment block.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Contract {
    Deployment {
        address: String,
        deploy_block: Option<u64>,
    },
    Address(String),
}

impl Contract {
    pub fn raw_address(&self) -> &str {
        match self {
            Contract::Deployment { address, .. } | Contract::Address(address) => address,
        }
    }

    pub fn deploy_block(&self) -> Option<u64> {
        match self {
            Contract::Deployment { deploy_block, .. } => *deploy_block,
            Contract::Address(_) => None,
        }
    }

    pub fn parsed_address(&self) -> Result<Address> {
        let raw = self.raw_address().trim();
        raw.parse()
            .with_context(|| format!("'{raw}' is not a contract address"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ContractAddresses {
    pub secret_board: Contract,
}

impl Default for ContractAddresses {
    fn default() -> Self {
        Self {
            secret_board: Contract::Address(DEFAULT_SECRET_BOARD_ADDRESS.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_forms_parse() -> Result<()> {
        let bare = Contract::Address(format!(" {DEFAULT_SECRET_BOARD_ADDRESS} "));
        let detailed = Contract::Deployment {
            address: DEFAULT_SECRET_BOARD_ADDRESS.to_lowercase(),
            deploy_block: Some(9_000_000),
        };

        assert_eq!(bare.parsed_address()?, detailed.parsed_address()?);
        assert_eq!(bare.deploy_block(), None);
        assert_eq!(detailed.deploy_block(), Some(9_000_000));

        let err = Contract::Address("0x12".to_string())
            .parsed_address()
            .unwrap_err();
        assert!(err.to_string().contains("'0x12'"));
        Ok(())
    }
}
