// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::Address;
use anyhow::{anyhow, bail, Context, Result};
use snb_config::AppConfig;
use snb_evm_helpers::contracts::{SecretBoardContractFactory, SecretBoardReadContract};
use snb_evm_helpers::wallet::{LocalWallet, Wallet};

pub mod telemetry;

/// Contract helpers report with eyre. Keep the whole chain when moving to anyhow.
pub fn gateway_error(err: eyre::Report) -> anyhow::Error {
    anyhow!("{err:#}")
}

/// The wallet configured under `wallet.private_key`
pub fn local_wallet(config: &AppConfig) -> Result<LocalWallet> {
    let Some(private_key) = config.private_key() else {
        bail!(
            "No wallet configured. Set wallet.private_key in {}",
            config.config_file().display()
        );
    };
    LocalWallet::from_private_key(private_key, Some(config.network().clone()))
        .map_err(gateway_error)
        .context("Invalid wallet.private_key")
}

/// `user` if given, else the configured wallet's address
pub fn user_or_wallet(config: &AppConfig, user: Option<Address>) -> Result<Address> {
    match user {
        Some(user) => Ok(user),
        None => Ok(local_wallet(config)?.address()),
    }
}

pub async fn read_board(config: &AppConfig) -> Result<SecretBoardReadContract> {
    let rpc_url = &config.network().rpc_url;
    SecretBoardContractFactory::create_read(rpc_url, &config.secret_board().to_string())
        .await
        .map_err(gateway_error)
        .with_context(|| format!("Could not connect to {rpc_url}"))
}
