// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::helpers::{gateway_error, read_board, user_or_wallet};
use alloy::primitives::{Address, B256};
use anyhow::Result;
use snb_config::AppConfig;
use snb_evm_helpers::contracts::SecretBoardRead;
use tracing::instrument;

#[instrument(skip_all)]
pub async fn execute(config: &AppConfig, user: Option<Address>) -> Result<()> {
    let user = user_or_wallet(config, user)?;
    let board = read_board(config).await?;

    let handle = board.get_my_message(user).await.map_err(gateway_error)?;
    if handle == B256::ZERO {
        println!("No value stored for {user}");
    } else {
        println!("{handle}");
    }

    Ok(())
}
