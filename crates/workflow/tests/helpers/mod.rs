// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

#![allow(dead_code)]

use snb_config::WorkflowConfig;
use snb_test_helpers::MockEnvironment;
use snb_workflow::{Connection, WorkflowController};
use std::time::Duration;

pub fn settings(sync_delay_secs: u64) -> WorkflowConfig {
    WorkflowConfig {
        sync_delay_secs,
        ..Default::default()
    }
}

pub fn controller(env: &MockEnvironment, settings: WorkflowConfig) -> WorkflowController {
    WorkflowController::new(env.sdk.clone(), env.config.clone(), settings)
}

pub fn connection(env: &MockEnvironment) -> Connection {
    Connection {
        wallet: env.wallet.clone(),
        board: env.board.clone(),
    }
}

/// A controller with the environment's wallet already connected
pub async fn connected(env: &MockEnvironment, settings: WorkflowConfig) -> WorkflowController {
    let controller = controller(env, settings);
    controller.connect(connection(env)).await;
    controller
}

/// Sleep on the paused clock. Ticks due before the deadline run first.
pub async fn elapse(secs: f64) {
    tokio::time::sleep(Duration::from_secs_f64(secs)).await;
}
