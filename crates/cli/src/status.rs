// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::helpers::{gateway_error, read_board, user_or_wallet};
use alloy::primitives::Address;
use anyhow::Result;
use snb_config::AppConfig;
use snb_evm_helpers::contracts::SecretBoardRead;
use tracing::instrument;

#[instrument(skip_all)]
pub async fn execute(config: &AppConfig, user: Option<Address>) -> Result<()> {
    let user = user_or_wallet(config, user)?;
    let board = read_board(config).await?;

    let submitted = board
        .has_user_submitted(user)
        .await
        .map_err(gateway_error)?;
    if submitted {
        println!("{user} has a value stored on {}", config.secret_board());
    } else {
        println!("{user} has not stored a value yet");
    }

    Ok(())
}
