// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::{Address, Signature};
use async_trait::async_trait;
use eyre::Result;
use snb_evm_helpers::wallet::{LocalWallet, Wallet};
use snb_fhevm::{Eip712Payload, Network};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// [`LocalWallet`] that counts signature prompts and can be made to reject them
pub struct CountingWallet {
    inner: LocalWallet,
    pub signatures: AtomicUsize,
    pub reject_signatures: AtomicBool,
}

impl CountingWallet {
    pub fn new(inner: LocalWallet) -> Self {
        Self {
            inner,
            signatures: AtomicUsize::new(0),
            reject_signatures: AtomicBool::new(false),
        }
    }

    pub fn signatures(&self) -> usize {
        self.signatures.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Wallet for CountingWallet {
    fn address(&self) -> Address {
        self.inner.address()
    }

    fn network(&self) -> Option<Network> {
        self.inner.network()
    }

    async fn sign_typed_data(&self, payload: &Eip712Payload) -> Result<Signature> {
        self.signatures.fetch_add(1, Ordering::SeqCst);
        if self.reject_signatures.load(Ordering::SeqCst) {
            eyre::bail!("User rejected the request");
        }
        self.inner.sign_typed_data(payload).await
    }
}
