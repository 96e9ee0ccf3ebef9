// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{CountingBoard, CountingSdk, CountingWallet};
use alloy::primitives::{address, Address};
use snb_evm_helpers::mock::MockSecretBoard;
use snb_evm_helpers::wallet::{LocalWallet, Wallet};
use snb_fhevm::mock::MockCoprocessor;
use snb_fhevm::{FhevmConfig, Network};
use std::sync::Arc;

pub const BOARD_ADDRESS: Address = address!("0x9c5f39ca7544a021d7C106c3F0d6518bF0c7bF9B");

pub fn sepolia_network() -> Network {
    Network {
        chain_id: snb_fhevm::SEPOLIA_CHAIN_ID,
        rpc_url: "http://localhost:8545".to_string(),
    }
}

/// One mock deployment with an instrumented SDK, board and wallet
pub struct MockEnvironment {
    pub config: FhevmConfig,
    pub coprocessor: Arc<MockCoprocessor>,
    pub sdk: Arc<CountingSdk>,
    pub deployment: MockSecretBoard,
    pub wallet: Arc<CountingWallet>,
    pub board: Arc<CountingBoard>,
}

impl Default for MockEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEnvironment {
    pub fn new() -> Self {
        Self::with_wallet(LocalWallet::random(Some(sepolia_network())))
    }

    pub fn with_wallet(wallet: LocalWallet) -> Self {
        let config = FhevmConfig::sepolia();
        let coprocessor = MockCoprocessor::new(config.clone());
        let deployment = MockSecretBoard::deploy(BOARD_ADDRESS, coprocessor.clone());
        let sdk = Arc::new(CountingSdk::new(coprocessor.clone()));
        let board = Arc::new(CountingBoard::new(deployment.with_sender(wallet.address())));
        Self {
            config,
            coprocessor,
            sdk,
            deployment,
            wallet: Arc::new(CountingWallet::new(wallet)),
            board,
        }
    }

    /// A second user of the same deployment
    pub fn another_user(&self, wallet: LocalWallet) -> (Arc<CountingWallet>, Arc<CountingBoard>) {
        let board = Arc::new(CountingBoard::new(
            self.deployment.with_sender(wallet.address()),
        ));
        (Arc::new(CountingWallet::new(wallet)), board)
    }

    pub fn user(&self) -> Address {
        self.wallet.address()
    }
}
