// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::Gate;
use alloy::primitives::Address;
use async_trait::async_trait;
use snb_fhevm::mock::{MockCoprocessor, MockSdk};
use snb_fhevm::{
    DecryptedValues, EncryptedInput, EncryptedInputBuilder, FhevmConfig, FhevmError,
    FhevmInstance, FhevmSdk, Keypair, Network, UserDecryptRequest,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Calls observed by a [`CountingSdk`] and every instance it created
#[derive(Default)]
pub struct SdkCalls {
    pub init_sdk: AtomicUsize,
    pub create_instance: AtomicUsize,
    pub encrypt: AtomicUsize,
    pub generate_keypair: AtomicUsize,
    pub user_decrypt: AtomicUsize,
}

impl SdkCalls {
    pub fn init_sdk(&self) -> usize {
        self.init_sdk.load(Ordering::SeqCst)
    }

    pub fn encrypt(&self) -> usize {
        self.encrypt.load(Ordering::SeqCst)
    }

    pub fn user_decrypt(&self) -> usize {
        self.user_decrypt.load(Ordering::SeqCst)
    }

    /// Total number of calls that would reach the network
    pub fn network_calls(&self) -> usize {
        self.init_sdk()
            + self.create_instance.load(Ordering::SeqCst)
            + self.encrypt()
            + self.user_decrypt()
    }
}

/// Injected failures, consumed one per call
#[derive(Default)]
pub struct SdkFailures {
    pub init_sdk: AtomicUsize,
    pub encrypt: AtomicUsize,
    pub user_decrypt: AtomicUsize,
}

fn take_failure(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

/// Gates the slow steps of the SDK so tests can observe in-flight states
#[derive(Default)]
pub struct SdkGates {
    pub init_sdk: Gate,
    pub encrypt: Gate,
    pub user_decrypt: Gate,
}

/// [`MockSdk`] with call counting, failure injection and gates
pub struct CountingSdk {
    inner: MockSdk,
    pub calls: Arc<SdkCalls>,
    pub failures: Arc<SdkFailures>,
    pub gates: Arc<SdkGates>,
}

impl CountingSdk {
    pub fn new(coprocessor: Arc<MockCoprocessor>) -> Self {
        Self {
            inner: MockSdk::new(coprocessor),
            calls: Arc::default(),
            failures: Arc::default(),
            gates: Arc::default(),
        }
    }
}

#[async_trait]
impl FhevmSdk for CountingSdk {
    async fn init_sdk(&self) -> Result<(), FhevmError> {
        self.calls.init_sdk.fetch_add(1, Ordering::SeqCst);
        self.gates.init_sdk.pass().await;
        if take_failure(&self.failures.init_sdk) {
            return Err(FhevmError::SdkUnavailable(
                "wasm module failed to load".to_string(),
            ));
        }
        self.inner.init_sdk().await
    }

    async fn create_instance(
        &self,
        config: &FhevmConfig,
        network: &Network,
    ) -> Result<Arc<dyn FhevmInstance>, FhevmError> {
        self.calls.create_instance.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.create_instance(config, network).await?;
        Ok(Arc::new(CountingInstance {
            inner,
            calls: self.calls.clone(),
            failures: self.failures.clone(),
            gates: self.gates.clone(),
        }))
    }
}

pub struct CountingInstance {
    inner: Arc<dyn FhevmInstance>,
    calls: Arc<SdkCalls>,
    failures: Arc<SdkFailures>,
    gates: Arc<SdkGates>,
}

#[async_trait]
impl FhevmInstance for CountingInstance {
    fn config(&self) -> &FhevmConfig {
        self.inner.config()
    }

    fn create_encrypted_input(
        &self,
        contract_address: Address,
        user_address: Address,
    ) -> Box<dyn EncryptedInputBuilder> {
        Box::new(CountingInputBuilder {
            inner: self.inner.create_encrypted_input(contract_address, user_address),
            calls: self.calls.clone(),
            failures: self.failures.clone(),
            gates: self.gates.clone(),
        })
    }

    fn generate_keypair(&self) -> Keypair {
        self.calls.generate_keypair.fetch_add(1, Ordering::SeqCst);
        self.inner.generate_keypair()
    }

    async fn user_decrypt(
        &self,
        request: UserDecryptRequest,
    ) -> Result<DecryptedValues, FhevmError> {
        self.calls.user_decrypt.fetch_add(1, Ordering::SeqCst);
        self.gates.user_decrypt.pass().await;
        if take_failure(&self.failures.user_decrypt) {
            return Err(FhevmError::Decryption(
                "relayer returned 503 Service Unavailable".to_string(),
            ));
        }
        self.inner.user_decrypt(request).await
    }
}

struct CountingInputBuilder {
    inner: Box<dyn EncryptedInputBuilder>,
    calls: Arc<SdkCalls>,
    failures: Arc<SdkFailures>,
    gates: Arc<SdkGates>,
}

#[async_trait]
impl EncryptedInputBuilder for CountingInputBuilder {
    fn add32(&mut self, value: u32) {
        self.inner.add32(value);
    }

    async fn encrypt(&mut self) -> Result<EncryptedInput, FhevmError> {
        self.calls.encrypt.fetch_add(1, Ordering::SeqCst);
        self.gates.encrypt.pass().await;
        if take_failure(&self.failures.encrypt) {
            return Err(FhevmError::Encryption("proof generation failed".to_string()));
        }
        self.inner.encrypt().await
    }
}
