// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::eip712::{user_decrypt_eip712, Eip712Payload};
use crate::{
    CiphertextHandle, DecryptionValidity, EncryptedInput, FhevmConfig, FhevmError, Keypair,
    Network, UserDecryptRequest,
};
use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Plaintexts returned by a user decryption, keyed by the handle they were decrypted from
pub type DecryptedValues = HashMap<CiphertextHandle, U256>;

/// Entry point of an FHEVM client SDK
#[async_trait]
pub trait FhevmSdk: Send + Sync {
    /// Load the SDK's runtime (wasm, key material). Called before any instance is created.
    async fn init_sdk(&self) -> Result<(), FhevmError>;

    /// Create an instance bound to the given protocol deployment and wallet network
    async fn create_instance(
        &self,
        config: &FhevmConfig,
        network: &Network,
    ) -> Result<Arc<dyn FhevmInstance>, FhevmError>;
}

/// A ready-to-use SDK instance
#[async_trait]
pub trait FhevmInstance: Send + Sync {
    fn config(&self) -> &FhevmConfig;

    /// Start an encrypted input bound to `contract_address` and `user_address`
    fn create_encrypted_input(
        &self,
        contract_address: Address,
        user_address: Address,
    ) -> Box<dyn EncryptedInputBuilder>;

    fn generate_keypair(&self) -> Keypair;

    fn create_eip712(
        &self,
        public_key: &str,
        contract_addresses: &[Address],
        validity: &DecryptionValidity,
    ) -> Eip712Payload {
        user_decrypt_eip712(self.config(), public_key, contract_addresses, validity)
    }

    /// Ask the decryption service to re-encrypt and release the plaintexts of the requested
    /// handles to the signer of the request.
    async fn user_decrypt(&self, request: UserDecryptRequest)
        -> Result<DecryptedValues, FhevmError>;
}

/// Accumulates clear values and turns them into ciphertext handles plus an input proof
#[async_trait]
pub trait EncryptedInputBuilder: Send {
    fn add32(&mut self, value: u32);

    async fn encrypt(&mut self) -> Result<EncryptedInput, FhevmError>;
}
