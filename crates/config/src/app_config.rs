// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::chain_config::ChainConfig;
use crate::contract::ContractAddresses;
use crate::locate::{find_in_ancestors, locate_config};
use crate::workflow_config::{WalletConfig, WorkflowConfig};
use crate::yaml::load_yaml_with_env;
use alloy_primitives::Address;
use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use figment::{
    providers::{Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use snb_fhevm::{FhevmConfig, Network};
use std::{env, path::PathBuf};
use tracing::debug;

pub const DEFAULT_CONFIG_NAME: &str = "secret-board.config.yaml";

/// The config actually used throughout the app
#[derive(Debug, Clone)]
pub struct AppConfig {
    chain: ChainConfig,
    secret_board: Address,
    network: Network,
    fhevm: FhevmConfig,
    workflow: WorkflowConfig,
    wallet: WalletConfig,
    /// Set the Open Telemetry collector grpc endpoint. Eg. 127.0.0.1:4317
    otel: Option<String>,
    config_file: PathBuf,
}

impl AppConfig {
    pub fn try_from_file_config(config: FileConfig) -> Result<Self> {
        let secret_board = config
            .contracts
            .secret_board
            .parsed_address()
            .context("contracts.secret_board")?;

        if let Some(chain_id) = config.chain.chain_id {
            if chain_id != config.fhevm.chain_id {
                bail!(
                    "Chain '{}' has id {} but the FHEVM protocol is configured for chain {}",
                    config.chain.name,
                    chain_id,
                    config.fhevm.chain_id
                );
            }
        }

        if config.workflow.decrypt_duration_days == 0 {
            bail!("workflow.decrypt_duration_days must be at least 1");
        }

        let network = config.chain.network(config.fhevm.chain_id)?;

        Ok(AppConfig {
            chain: config.chain,
            secret_board,
            network,
            fhevm: config.fhevm,
            workflow: config.workflow,
            wallet: config.wallet,
            otel: config.otel,
            config_file: config.found_config_file.unwrap_or_default(),
        })
    }

    /// Get the chain config
    pub fn chain(&self) -> &ChainConfig {
        &self.chain
    }

    /// The network the wallet is expected to be connected to
    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Address of the deployed `SecretMessageBoard`
    pub fn secret_board(&self) -> Address {
        self.secret_board
    }

    pub fn fhevm(&self) -> &FhevmConfig {
        &self.fhevm
    }

    pub fn workflow(&self) -> &WorkflowConfig {
        &self.workflow
    }

    pub fn private_key(&self) -> Option<&str> {
        self.wallet.private_key.as_deref()
    }

    /// Get the open telemetry collector url
    pub fn otel(&self) -> Option<String> {
        self.otel.clone()
    }

    /// Get the config file path
    pub fn config_file(&self) -> PathBuf {
        self.config_file.clone()
    }
}

/// The configuration as written in the yaml file, before validation
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    chain: ChainConfig,
    contracts: ContractAddresses,
    fhevm: FhevmConfig,
    workflow: WorkflowConfig,
    wallet: WalletConfig,
    otel: Option<String>,
    /// The config file as found before initialization this is for testing purposes and you should
    /// not use this in your configurations
    found_config_file: Option<PathBuf>,
}

/// Value struct for passing configuration from the cli to the configuration
#[derive(Default, Serialize, Deserialize, Clone, Debug)]
struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    otel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    found_config_file: Option<PathBuf>,
}

pub fn load_config(found_config_file: Option<String>, otel: Option<String>) -> Result<AppConfig> {
    let found_config_file = found_config_file.map(PathBuf::from);

    let location = locate_config(
        find_in_ancestors,
        &env::current_dir()?,
        &OsDirs::config_dir()?,
        DEFAULT_CONFIG_NAME,
        found_config_file.as_deref(),
    );
    debug!(?location, "Loading configuration");
    let resolved_config_path = location.into_path();

    let loaded_yaml =
        load_yaml_with_env(&resolved_config_path).context("Could not read configuration file")?;

    let config: FileConfig = Figment::from(Serialized::defaults(&FileConfig::default()))
        .merge(Yaml::string(&loaded_yaml))
        .merge(Serialized::defaults(&CliOverrides {
            otel,
            found_config_file: Some(resolved_config_path),
        }))
        .extract()
        .context("Could not parse configuration")?;

    AppConfig::try_from_file_config(config).context("Invalid configuration")
}

pub struct OsDirs;
impl OsDirs {
    pub fn config_dir() -> Result<PathBuf> {
        let Some(dir) = dirs::config_dir() else {
            bail!("secret-board may only be run on an OS that can provide a config dir. See https://docs.rs/dirs for more information.");
        };
        Ok(dir.join("secret-board"))
    }
}
