// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::Gate;
use alloy::primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use eyre::Result;
use snb_evm_helpers::contracts::{SecretBoardRead, SecretBoardWrite, TxConfirmation};
use snb_evm_helpers::mock::MockSecretBoard;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
pub struct BoardCalls {
    pub submit_message: AtomicUsize,
    pub get_my_message: AtomicUsize,
    pub has_user_submitted: AtomicUsize,
}

impl BoardCalls {
    pub fn submit_message(&self) -> usize {
        self.submit_message.load(Ordering::SeqCst)
    }

    pub fn get_my_message(&self) -> usize {
        self.get_my_message.load(Ordering::SeqCst)
    }

    pub fn has_user_submitted(&self) -> usize {
        self.has_user_submitted.load(Ordering::SeqCst)
    }
}

/// [`MockSecretBoard`] with call counting, injected reverts and a gate on `submitMessage`
pub struct CountingBoard {
    inner: MockSecretBoard,
    pub calls: BoardCalls,
    pub reverts: AtomicUsize,
    pub submit_gate: Gate,
}

impl CountingBoard {
    pub fn new(inner: MockSecretBoard) -> Self {
        Self {
            inner,
            calls: BoardCalls::default(),
            reverts: AtomicUsize::new(0),
            submit_gate: Gate::default(),
        }
    }

    pub fn inner(&self) -> &MockSecretBoard {
        &self.inner
    }

    /// Make the next `n` submissions revert
    pub fn revert_next(&self, n: usize) {
        self.reverts.store(n, Ordering::SeqCst);
    }
}

#[async_trait]
impl SecretBoardRead for CountingBoard {
    fn contract_address(&self) -> Address {
        self.inner.contract_address()
    }

    async fn get_my_message(&self, caller: Address) -> Result<B256> {
        self.calls.get_my_message.fetch_add(1, Ordering::SeqCst);
        self.inner.get_my_message(caller).await
    }

    async fn has_user_submitted(&self, user: Address) -> Result<bool> {
        self.calls.has_user_submitted.fetch_add(1, Ordering::SeqCst);
        self.inner.has_user_submitted(user).await
    }
}

#[async_trait]
impl SecretBoardWrite for CountingBoard {
    async fn submit_message(&self, handle: B256, proof: Bytes) -> Result<TxConfirmation> {
        self.calls.submit_message.fetch_add(1, Ordering::SeqCst);
        self.submit_gate.pass().await;
        if self
            .reverts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            eyre::bail!("execution reverted: out of gas");
        }
        self.inner.submit_message(handle, proof).await
    }
}
