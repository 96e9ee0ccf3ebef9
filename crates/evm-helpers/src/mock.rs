// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! In-memory `SecretMessageBoard` whose `submitMessage` runs the proof through a
//! [`MockCoprocessor`] exactly like `FHE.fromExternal` would on chain.

use crate::contracts::{SecretBoardRead, SecretBoardWrite, TxConfirmation};
use alloy::primitives::{keccak256, Address, Bytes, B256};
use async_trait::async_trait;
use eyre::Result;
use snb_fhevm::mock::MockCoprocessor;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::info;

#[derive(Default)]
struct BoardStorage {
    messages: HashMap<Address, B256>,
    block_number: u64,
}

/// A deployed board seen through one sender. Clones made with [`MockSecretBoard::with_sender`]
/// share storage.
#[derive(Clone)]
pub struct MockSecretBoard {
    contract_address: Address,
    sender: Address,
    coprocessor: Arc<MockCoprocessor>,
    storage: Arc<Mutex<BoardStorage>>,
}

impl MockSecretBoard {
    pub fn deploy(contract_address: Address, coprocessor: Arc<MockCoprocessor>) -> Self {
        Self {
            contract_address,
            sender: Address::ZERO,
            coprocessor,
            storage: Arc::new(Mutex::new(BoardStorage::default())),
        }
    }

    /// The same board, sending transactions from `sender`
    pub fn with_sender(&self, sender: Address) -> Self {
        Self {
            sender,
            ..self.clone()
        }
    }

    pub fn sender(&self) -> Address {
        self.sender
    }

    pub fn coprocessor(&self) -> &Arc<MockCoprocessor> {
        &self.coprocessor
    }

    fn storage(&self) -> MutexGuard<'_, BoardStorage> {
        self.storage.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of transactions mined so far
    pub fn block_number(&self) -> u64 {
        self.storage().block_number
    }
}

#[async_trait]
impl SecretBoardRead for MockSecretBoard {
    fn contract_address(&self) -> Address {
        self.contract_address
    }

    async fn get_my_message(&self, caller: Address) -> Result<B256> {
        Ok(self
            .storage()
            .messages
            .get(&caller)
            .copied()
            .unwrap_or(B256::ZERO))
    }

    async fn has_user_submitted(&self, user: Address) -> Result<bool> {
        Ok(self.storage().messages.contains_key(&user))
    }
}

#[async_trait]
impl SecretBoardWrite for MockSecretBoard {
    async fn submit_message(&self, handle: B256, proof: Bytes) -> Result<TxConfirmation> {
        self.coprocessor
            .verify_input(handle, &proof, self.contract_address, self.sender)
            .map_err(|e| eyre::eyre!("execution reverted: {e}"))?;

        let mut storage = self.storage();
        storage.block_number += 1;
        storage.messages.insert(self.sender, handle);

        let mut preimage = Vec::with_capacity(20 + 32 + 8);
        preimage.extend_from_slice(self.sender.as_slice());
        preimage.extend_from_slice(handle.as_slice());
        preimage.extend_from_slice(&storage.block_number.to_be_bytes());
        let tx_hash = keccak256(&preimage);

        info!(sender = %self.sender, %tx_hash, "Mock board stored encrypted message");
        Ok(TxConfirmation {
            tx_hash,
            block_number: Some(storage.block_number),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;
    use snb_fhevm::FhevmConfig;

    const BOARD: Address = address!("0x9c5f39ca7544a021d7C106c3F0d6518bF0c7bF9B");
    const ALICE: Address = address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8");
    const BOB: Address = address!("0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC");

    #[tokio::test]
    async fn test_submit_stores_handle_per_sender() -> Result<()> {
        let coprocessor = MockCoprocessor::new(FhevmConfig::sepolia());
        let board = MockSecretBoard::deploy(BOARD, coprocessor.clone());
        let alice = board.with_sender(ALICE);

        assert_eq!(alice.get_my_message(ALICE).await?, B256::ZERO);
        assert!(!alice.has_user_submitted(ALICE).await?);

        let input = coprocessor.encrypt(BOARD, ALICE, &[42])?;
        let receipt = alice
            .submit_message(input.handles[0], input.input_proof)
            .await?;
        assert_eq!(receipt.block_number, Some(1));

        // Visible through any view of the same deployment
        assert_eq!(board.get_my_message(ALICE).await?, input.handles[0]);
        assert!(board.has_user_submitted(ALICE).await?);
        assert!(!board.has_user_submitted(BOB).await?);
        assert!(coprocessor.is_allowed(input.handles[0], ALICE));
        assert!(coprocessor.is_allowed(input.handles[0], BOARD));
        Ok(())
    }

    #[tokio::test]
    async fn test_proof_for_another_user_reverts() -> Result<()> {
        let coprocessor = MockCoprocessor::new(FhevmConfig::sepolia());
        let board = MockSecretBoard::deploy(BOARD, coprocessor.clone());

        let input = coprocessor.encrypt(BOARD, ALICE, &[42])?;
        let err = board
            .with_sender(BOB)
            .submit_message(input.handles[0], input.input_proof)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("execution reverted"));
        assert!(!board.has_user_submitted(BOB).await?);
        assert_eq!(board.block_number(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_resubmission_overwrites() -> Result<()> {
        let coprocessor = MockCoprocessor::new(FhevmConfig::sepolia());
        let alice = MockSecretBoard::deploy(BOARD, coprocessor.clone()).with_sender(ALICE);

        let first = coprocessor.encrypt(BOARD, ALICE, &[1])?;
        alice.submit_message(first.handles[0], first.input_proof).await?;
        let second = coprocessor.encrypt(BOARD, ALICE, &[2])?;
        alice.submit_message(second.handles[0], second.input_proof).await?;

        assert_eq!(alice.get_my_message(ALICE).await?, second.handles[0]);
        Ok(())
    }
}
