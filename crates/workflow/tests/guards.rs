// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod helpers;

use anyhow::Result;
use helpers::{connected, connection, controller, elapse, settings};
use snb_test_helpers::MockEnvironment;
use snb_workflow::{
    DecryptionGate, Operation, TickOutcome, WorkflowError, WorkflowSnapshot, WorkflowState,
};
use std::sync::Arc;

#[tokio::test]
async fn test_nothing_runs_without_a_wallet() {
    let env = MockEnvironment::new();
    let controller = controller(&env, settings(30));

    assert_eq!(
        controller.submit("1").await,
        Err(WorkflowError::NotConnected)
    );
    assert_eq!(controller.decrypt().await, Err(WorkflowError::NotConnected));
    assert_eq!(controller.reset(), Err(WorkflowError::NotConnected));
    assert!(matches!(
        controller.initialize().await,
        Err(WorkflowError::NotConnected)
    ));

    assert_eq!(controller.snapshot(), WorkflowSnapshot::default());
    assert_eq!(env.sdk.calls.network_calls(), 0);
}

#[tokio::test]
async fn test_concurrent_initialize_creates_one_client() -> Result<()> {
    let env = MockEnvironment::new();
    let controller = connected(&env, settings(30)).await;

    env.sdk.gates.init_sdk.close();
    let (a, b, _) = tokio::join!(controller.initialize(), controller.initialize(), async {
        env.sdk.gates.init_sdk.wait_for_waiters(1).await;
        assert_eq!(controller.snapshot().state, WorkflowState::Initializing);
        assert_eq!(
            controller.submit("1").await,
            Err(WorkflowError::AlreadyInFlight(Operation::Initialize))
        );
        env.sdk.gates.init_sdk.open();
    });

    assert!(Arc::ptr_eq(&a?, &b?));
    assert_eq!(env.sdk.calls.init_sdk(), 1);

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.state, WorkflowState::AwaitingInput);
    assert!(snapshot.sdk_ready);
    assert_eq!(
        snapshot.session_view().map(|s| s.fhe_client_ready),
        Some(true)
    );

    // Already initialized
    controller.initialize().await?;
    assert_eq!(env.sdk.calls.init_sdk(), 1);
    Ok(())
}

#[tokio::test]
async fn test_second_submit_while_in_flight_is_ignored() -> Result<()> {
    let env = MockEnvironment::new();
    let controller = connected(&env, settings(0)).await;

    env.sdk.gates.encrypt.close();
    let (first, _) = tokio::join!(controller.submit("9"), async {
        env.sdk.gates.encrypt.wait_for_waiters(1).await;
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.state, WorkflowState::Submitting { value: 9 });
        assert!(!snapshot.submission().submitted);
        assert!(!snapshot.gate().eligible);

        assert_eq!(
            controller.submit("10").await,
            Err(WorkflowError::AlreadyInFlight(Operation::Submit))
        );
        assert_eq!(
            controller.reset(),
            Err(WorkflowError::AlreadyInFlight(Operation::Submit))
        );
        env.sdk.gates.encrypt.open();
    });

    first?;
    assert_eq!(env.sdk.calls.encrypt(), 1);
    assert_eq!(env.board.calls.submit_message(), 1);
    assert_eq!(controller.snapshot().raw_input, Some(9));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_decrypt_refused_before_delay_elapses() -> Result<()> {
    let env = MockEnvironment::new();
    let controller = connected(&env, settings(30)).await;

    assert_eq!(controller.decrypt().await, Err(WorkflowError::NotEligible));

    controller.submit("42").await?;
    elapse(10.5).await;
    assert_eq!(controller.decrypt().await, Err(WorkflowError::NotEligible));

    let snapshot = controller.snapshot();
    assert_eq!(
        snapshot.state,
        WorkflowState::AwaitingSync { remaining_secs: 20 }
    );
    assert_eq!(snapshot.decryption_error, None);
    assert_eq!(env.board.calls.get_my_message(), 0);
    assert_eq!(env.wallet.signatures(), 0);
    assert_eq!(env.sdk.calls.user_decrypt(), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_eligibility_flips_once_when_delay_elapses() -> Result<()> {
    let env = MockEnvironment::new();
    let controller = connected(&env, settings(5)).await;
    controller.submit("7").await?;

    let mut observed = Vec::new();
    elapse(0.5).await;
    for _ in 0..8 {
        observed.push(controller.snapshot().gate());
        elapse(1.0).await;
    }

    let counting = |remaining_delay_secs| DecryptionGate {
        eligible: false,
        remaining_delay_secs,
    };
    let ready = DecryptionGate {
        eligible: true,
        remaining_delay_secs: 0,
    };
    assert_eq!(
        observed,
        vec![
            counting(5),
            counting(4),
            counting(3),
            counting(2),
            counting(1),
            ready,
            ready,
            ready
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_manual_ticks_drive_the_delay() -> Result<()> {
    let env = MockEnvironment::new();
    let controller = connected(&env, settings(3)).await;
    assert_eq!(controller.tick(), TickOutcome::Ignored);

    controller.submit("3").await?;
    assert_eq!(
        controller.tick(),
        TickOutcome::Counting { remaining_secs: 2 }
    );
    assert_eq!(
        controller.tick(),
        TickOutcome::Counting { remaining_secs: 1 }
    );
    assert_eq!(controller.tick(), TickOutcome::Eligible);
    assert_eq!(controller.tick(), TickOutcome::Ignored);
    assert_eq!(controller.snapshot().state, WorkflowState::DecryptReady);
    Ok(())
}

#[tokio::test]
async fn test_reset_keeps_the_client() -> Result<()> {
    let env = MockEnvironment::new();
    let controller = connected(&env, settings(0)).await;
    controller.submit("888").await?;
    controller.decrypt().await?;

    controller.reset()?;
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.state, WorkflowState::AwaitingInput);
    assert!(snapshot.sdk_ready);
    assert_eq!(snapshot.raw_input, None);
    assert!(!snapshot.submission().submitted);
    assert_eq!(snapshot.result().decrypted_value, None);
    assert_eq!(
        snapshot.gate(),
        DecryptionGate {
            eligible: false,
            remaining_delay_secs: 0
        }
    );

    controller.submit("999").await?;
    assert_eq!(controller.decrypt().await?, 999);
    assert_eq!(env.sdk.calls.init_sdk(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_reset_cancels_the_countdown() -> Result<()> {
    let env = MockEnvironment::new();
    let controller = connected(&env, settings(30)).await;
    controller.submit("5").await?;
    elapse(10.5).await;

    controller.reset()?;
    assert_eq!(controller.tick(), TickOutcome::Ignored);
    elapse(60.0).await;
    assert_eq!(controller.snapshot().state, WorkflowState::AwaitingInput);
    Ok(())
}

#[tokio::test]
async fn test_reset_refused_before_initialization() {
    let env = MockEnvironment::new();
    let controller = connected(&env, settings(30)).await;
    assert!(matches!(
        controller.reset(),
        Err(WorkflowError::InvalidTransition {
            operation: Operation::Reset,
            ..
        })
    ));
}

#[tokio::test]
async fn test_decrypt_again_requires_reset() -> Result<()> {
    let env = MockEnvironment::new();
    let controller = connected(&env, settings(0)).await;
    controller.submit("1").await?;
    controller.decrypt().await?;

    let err = controller.decrypt().await.unwrap_err();
    assert!(err.is_guard());
    assert_eq!(env.sdk.calls.user_decrypt(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_stops_the_countdown() -> Result<()> {
    let env = MockEnvironment::new();
    let controller = connected(&env, settings(30)).await;
    controller.submit("5").await?;

    controller.disconnect();
    elapse(60.0).await;
    assert_eq!(controller.snapshot().state, WorkflowState::Disconnected);
    assert_eq!(controller.snapshot().wallet, None);

    // The value is still on chain
    controller.connect(connection(&env)).await;
    assert_eq!(controller.snapshot().state, WorkflowState::DecryptReady);
    assert_eq!(controller.decrypt().await?, 5);
    Ok(())
}

#[tokio::test]
async fn test_results_after_disconnect_are_dropped() {
    let env = MockEnvironment::new();
    let controller = connected(&env, settings(0)).await;
    controller.submit("5").await.unwrap();

    env.sdk.gates.user_decrypt.close();
    let (result, _) = tokio::join!(controller.decrypt(), async {
        env.sdk.gates.user_decrypt.wait_for_waiters(1).await;
        controller.disconnect();
        env.sdk.gates.user_decrypt.open();
    });

    assert_eq!(result, Err(WorkflowError::SessionEnded(Operation::Decrypt)));
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.state, WorkflowState::Disconnected);
    assert_eq!(snapshot.result().decrypted_value, None);
    assert_eq!(snapshot.decryption_error, None);
}

#[tokio::test]
async fn test_subscribers_see_transitions() -> Result<()> {
    let env = MockEnvironment::new();
    let controller = controller(&env, settings(0));
    let mut updates = controller.subscribe();
    assert!(!updates.has_changed()?);

    controller.connect(connection(&env)).await;
    assert!(updates.has_changed()?);
    let snapshot = updates.borrow_and_update().clone();
    assert_eq!(snapshot.state, WorkflowState::Uninitialized);
    assert_eq!(snapshot.wallet, Some(env.user()));

    controller.submit("64").await?;
    assert_eq!(
        updates.borrow_and_update().state,
        WorkflowState::DecryptReady
    );

    controller.decrypt().await?;
    assert_eq!(
        updates.borrow_and_update().result().decrypted_value,
        Some(64)
    );
    Ok(())
}
