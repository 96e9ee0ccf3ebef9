// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::helpers::local_wallet;
use anyhow::Result;
use snb_config::AppConfig;
use snb_evm_helpers::wallet::Wallet;

pub fn execute(config: &AppConfig) -> Result<()> {
    let wallet = local_wallet(config)?;
    println!("{}", wallet.address());

    Ok(())
}
