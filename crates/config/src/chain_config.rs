// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::rpc::RpcEndpoint;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use snb_fhevm::{Network, SEPOLIA_CHAIN_ID};

pub const DEFAULT_SEPOLIA_RPC_URL: &str = "https://ethereum-sepolia-rpc.publicnode.com";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChainConfig {
    pub name: String,
    pub rpc_url: String,
    /// Chain the wallet is expected on. Falls back to the FHEVM deployment's chain.
    pub chain_id: Option<u64>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            name: "sepolia".to_string(),
            rpc_url: DEFAULT_SEPOLIA_RPC_URL.to_string(),
            chain_id: Some(SEPOLIA_CHAIN_ID),
        }
    }
}

impl ChainConfig {
    pub fn rpc_endpoint(&self) -> Result<RpcEndpoint> {
        RpcEndpoint::parse(&self.rpc_url)
            .with_context(|| format!("Failed to parse RPC URL for chain {}", self.name))
    }

    /// The network a wallet configured for this chain is connected to
    pub fn network(&self, default_chain_id: u64) -> Result<Network> {
        Ok(Network {
            chain_id: self.chain_id.unwrap_or(default_chain_id),
            rpc_url: self.rpc_endpoint()?.http_url()?,
        })
    }
}
