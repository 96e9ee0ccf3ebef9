// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::helpers::local_wallet;
use anyhow::{Context, Result};
use snb_config::AppConfig;
use snb_evm_helpers::mock::MockSecretBoard;
use snb_evm_helpers::wallet::{LocalWallet, Wallet};
use snb_fhevm::mock::{MockCoprocessor, MockSdk};
use snb_workflow::{Connection, WorkflowController, WorkflowSnapshot, WorkflowState};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, instrument};

fn describe(snapshot: &WorkflowSnapshot) -> String {
    match snapshot.state {
        WorkflowState::AwaitingSync { remaining_secs } => {
            format!("waiting for permissions to sync ({remaining_secs}s)")
        }
        WorkflowState::Submitting { value } => format!("encrypting and submitting {value}"),
        WorkflowState::Decrypted { value } => format!("decrypted {value}"),
        state => state.to_string().replace('_', " "),
    }
}

async fn print_updates(mut updates: watch::Receiver<WorkflowSnapshot>) {
    while updates.changed().await.is_ok() {
        let snapshot = updates.borrow_and_update().clone();
        println!("  [{}] {}", snapshot.state, describe(&snapshot));
    }
}

async fn wait_until_eligible(controller: &WorkflowController) -> Result<()> {
    let mut updates = controller.subscribe();
    loop {
        if updates.borrow_and_update().gate().eligible {
            return Ok(());
        }
        updates
            .changed()
            .await
            .context("Workflow stopped before decryption became available")?;
    }
}

/// Store `value` on an in-process board backed by the mock coprocessor, wait out the sync delay
/// and decrypt it again.
#[instrument(skip_all)]
pub async fn execute(config: &AppConfig, value: &str, delay: Option<u64>) -> Result<()> {
    let wallet = match config.private_key() {
        Some(_) => local_wallet(config)?,
        None => LocalWallet::random(Some(config.network().clone())),
    };
    let user = wallet.address();

    let coprocessor = MockCoprocessor::new(config.fhevm().clone());
    let board = MockSecretBoard::deploy(config.secret_board(), coprocessor.clone()).with_sender(user);

    let mut settings = config.workflow().clone();
    if let Some(delay) = delay {
        settings.sync_delay_secs = delay;
    }
    info!(%user, delay = settings.sync_delay_secs, "Starting mock session");

    let controller = WorkflowController::new(
        Arc::new(MockSdk::new(coprocessor)),
        config.fhevm().clone(),
        settings,
    );
    let printer = tokio::spawn(print_updates(controller.subscribe()));

    println!("Wallet {user}");
    controller
        .connect(Connection {
            wallet: Arc::new(wallet),
            board: Arc::new(board),
        })
        .await;

    let confirmation = controller.submit(value).await?;
    println!(
        "Stored in transaction {} (block {})",
        confirmation.tx_hash,
        confirmation
            .block_number
            .map_or_else(|| "pending".to_string(), |n| n.to_string())
    );

    wait_until_eligible(&controller).await?;
    let decrypted = controller.decrypt().await?;
    println!("Your secret number is {decrypted}");

    controller.shutdown();
    printer.await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_states() {
        let mut snapshot = WorkflowSnapshot {
            state: WorkflowState::AwaitingSync { remaining_secs: 7 },
            ..Default::default()
        };
        assert_eq!(describe(&snapshot), "waiting for permissions to sync (7s)");

        snapshot.state = WorkflowState::DecryptReady;
        assert_eq!(describe(&snapshot), "decrypt ready");
    }
}
