// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! In-process stand-in for the coprocessor, input verifier, ACL and relayer.
//!
//! Nothing here is encrypted. Handles are opaque digests and plaintexts sit in a map, but every
//! authorization rule the real network applies to a user decryption is checked: the input proof
//! must bind handle, contract and user; the ACL must allow both the user and the contract; the
//! request must be inside its validity window; and the EIP-712 signature must recover to the
//! requesting user.

use crate::eip712::user_decrypt_eip712;
use crate::sdk::DecryptedValues;
use crate::{
    CiphertextHandle, EncryptedInput, EncryptedInputBuilder, FhevmConfig, FhevmError,
    FhevmInstance, FhevmSdk, Keypair, Network, UserDecryptRequest,
};
use alloy::primitives::{keccak256, Address, Bytes, Signature, B256, U256};
use async_trait::async_trait;
use rand::RngCore;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

/// FHE type tag of `euint32` in the handle metadata byte
pub const EUINT32_TYPE: u8 = 4;
const HANDLE_VERSION: u8 = 0;
const PROOF_DOMAIN: &[u8] = b"snb-mock-input-proof";
const HANDLE_DOMAIN: &[u8] = b"snb-mock-handle";

#[derive(Default)]
struct CoprocessorState {
    plaintexts: HashMap<CiphertextHandle, U256>,
    acl: HashSet<(CiphertextHandle, Address)>,
    nonce: u64,
}

pub struct MockCoprocessor {
    config: FhevmConfig,
    state: Mutex<CoprocessorState>,
}

impl MockCoprocessor {
    pub fn new(config: FhevmConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            state: Mutex::new(CoprocessorState::default()),
        })
    }

    pub fn config(&self) -> &FhevmConfig {
        &self.config
    }

    fn state(&self) -> MutexGuard<'_, CoprocessorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register clear values and produce handles plus a proof binding them to contract and user
    pub fn encrypt(
        &self,
        contract_address: Address,
        user_address: Address,
        values: &[u32],
    ) -> Result<EncryptedInput, FhevmError> {
        if values.is_empty() {
            return Err(FhevmError::Encryption("no values added to input".to_string()));
        }
        if values.len() > u8::MAX as usize {
            return Err(FhevmError::Encryption("too many values in one input".to_string()));
        }

        let mut state = self.state();
        state.nonce += 1;
        let nonce = state.nonce;

        let handles: Vec<CiphertextHandle> = values
            .iter()
            .enumerate()
            .map(|(index, value)| {
                let handle = self.derive_handle(contract_address, user_address, nonce, index as u8);
                state.plaintexts.insert(handle, U256::from(*value));
                handle
            })
            .collect();

        let input_proof = encode_proof(&handles, contract_address, user_address);
        debug!(count = handles.len(), "Mock coprocessor registered encrypted input");
        Ok(EncryptedInput {
            handles,
            input_proof,
        })
    }

    fn derive_handle(&self, contract: Address, user: Address, nonce: u64, index: u8) -> B256 {
        let mut preimage = Vec::with_capacity(HANDLE_DOMAIN.len() + 49);
        preimage.extend_from_slice(HANDLE_DOMAIN);
        preimage.extend_from_slice(contract.as_slice());
        preimage.extend_from_slice(user.as_slice());
        preimage.extend_from_slice(&nonce.to_be_bytes());
        preimage.push(index);
        let digest = keccak256(&preimage);

        // hash(21) | index(1) | chain id(8) | type(1) | version(1)
        let mut handle = [0u8; 32];
        handle[..21].copy_from_slice(&digest[..21]);
        handle[21] = index;
        handle[22..30].copy_from_slice(&self.config.chain_id.to_be_bytes());
        handle[30] = EUINT32_TYPE;
        handle[31] = HANDLE_VERSION;
        B256::from(handle)
    }

    /// What the input verifier does inside `FHE.fromExternal`: check the proof covers this
    /// handle for this contract and caller, then grant both of them access.
    pub fn verify_input(
        &self,
        handle: CiphertextHandle,
        proof: &[u8],
        contract_address: Address,
        user_address: Address,
    ) -> Result<(), FhevmError> {
        let handles = decode_proof(proof, contract_address, user_address)?;
        if !handles.contains(&handle) {
            return Err(FhevmError::InvalidProof(format!(
                "handle {handle} is not covered by the proof"
            )));
        }

        let mut state = self.state();
        if !state.plaintexts.contains_key(&handle) {
            return Err(FhevmError::InvalidProof(format!("unknown handle {handle}")));
        }
        state.acl.insert((handle, contract_address));
        state.acl.insert((handle, user_address));
        Ok(())
    }

    pub fn is_allowed(&self, handle: CiphertextHandle, account: Address) -> bool {
        self.state().acl.contains(&(handle, account))
    }

    pub fn user_decrypt(
        &self,
        request: &UserDecryptRequest,
        now: u64,
    ) -> Result<DecryptedValues, FhevmError> {
        if !request.validity.contains(now) {
            return Err(FhevmError::Unauthorized(format!(
                "request valid from {} to {}, now is {now}",
                request.validity.start_timestamp,
                request.validity.end_timestamp()
            )));
        }

        let payload = user_decrypt_eip712(
            &self.config,
            &request.keypair.public_key,
            &request.contract_addresses,
            &request.validity,
        );
        let digest = payload.signing_hash()?;
        let signer = recover_signer(&request.signature, digest)?;
        if signer != request.user_address {
            warn!(%signer, user = %request.user_address, "Decryption signature from wrong signer");
            return Err(FhevmError::Unauthorized(format!(
                "signature recovers to {signer}, expected {}",
                request.user_address
            )));
        }

        let state = self.state();
        let mut values = DecryptedValues::new();
        for pair in &request.handle_contract_pairs {
            if !request.contract_addresses.contains(&pair.contract_address) {
                return Err(FhevmError::Unauthorized(format!(
                    "contract {} is not part of the signed request",
                    pair.contract_address
                )));
            }
            if !state.acl.contains(&(pair.handle, pair.contract_address))
                || !state.acl.contains(&(pair.handle, request.user_address))
            {
                return Err(FhevmError::Unauthorized(format!(
                    "{} may not decrypt {}",
                    request.user_address, pair.handle
                )));
            }
            let value = state
                .plaintexts
                .get(&pair.handle)
                .ok_or_else(|| FhevmError::Decryption(format!("unknown handle {}", pair.handle)))?;
            values.insert(pair.handle, *value);
        }
        info!(count = values.len(), "Mock relayer released plaintexts");
        Ok(values)
    }
}

fn proof_tag(handles: &[CiphertextHandle], contract: Address, user: Address) -> B256 {
    let mut preimage = Vec::with_capacity(PROOF_DOMAIN.len() + 40 + handles.len() * 32);
    preimage.extend_from_slice(PROOF_DOMAIN);
    for handle in handles {
        preimage.extend_from_slice(handle.as_slice());
    }
    preimage.extend_from_slice(contract.as_slice());
    preimage.extend_from_slice(user.as_slice());
    keccak256(&preimage)
}

// count(1) | handles(32 * count) | tag(32)
fn encode_proof(handles: &[CiphertextHandle], contract: Address, user: Address) -> Bytes {
    let mut proof = Vec::with_capacity(1 + handles.len() * 32 + 32);
    proof.push(handles.len() as u8);
    for handle in handles {
        proof.extend_from_slice(handle.as_slice());
    }
    proof.extend_from_slice(proof_tag(handles, contract, user).as_slice());
    Bytes::from(proof)
}

fn decode_proof(
    proof: &[u8],
    contract: Address,
    user: Address,
) -> Result<Vec<CiphertextHandle>, FhevmError> {
    let Some((&count, rest)) = proof.split_first() else {
        return Err(FhevmError::InvalidProof("empty proof".to_string()));
    };
    let count = count as usize;
    if rest.len() != count * 32 + 32 {
        return Err(FhevmError::InvalidProof("malformed proof".to_string()));
    }
    let (handle_bytes, tag) = rest.split_at(count * 32);
    let handles: Vec<CiphertextHandle> = handle_bytes.chunks_exact(32).map(B256::from_slice).collect();
    if proof_tag(&handles, contract, user).as_slice() != tag {
        return Err(FhevmError::InvalidProof(
            "proof was not issued for this contract and user".to_string(),
        ));
    }
    Ok(handles)
}

fn recover_signer(signature: &str, digest: B256) -> Result<Address, FhevmError> {
    let bytes = hex::decode(signature.trim_start_matches("0x"))
        .map_err(|e| FhevmError::Unauthorized(format!("signature is not hex: {e}")))?;
    let signature = Signature::try_from(bytes.as_slice())
        .map_err(|e| FhevmError::Unauthorized(format!("bad signature: {e}")))?;
    signature
        .recover_address_from_prehash(&digest)
        .map_err(|e| FhevmError::Unauthorized(format!("could not recover signer: {e}")))
}

/// [`FhevmSdk`] backed by a [`MockCoprocessor`]
pub struct MockSdk {
    coprocessor: Arc<MockCoprocessor>,
}

impl MockSdk {
    pub fn new(coprocessor: Arc<MockCoprocessor>) -> Self {
        Self { coprocessor }
    }
}

#[async_trait]
impl FhevmSdk for MockSdk {
    async fn init_sdk(&self) -> Result<(), FhevmError> {
        Ok(())
    }

    async fn create_instance(
        &self,
        config: &FhevmConfig,
        network: &Network,
    ) -> Result<Arc<dyn FhevmInstance>, FhevmError> {
        if network.chain_id != config.chain_id {
            return Err(FhevmError::InstanceCreation(format!(
                "wallet is on chain {} but the protocol is deployed on {}",
                network.chain_id, config.chain_id
            )));
        }
        if config != self.coprocessor.config() {
            return Err(FhevmError::InstanceCreation(
                "configuration does not match the mock deployment".to_string(),
            ));
        }
        Ok(Arc::new(MockInstance {
            coprocessor: self.coprocessor.clone(),
        }))
    }
}

pub struct MockInstance {
    coprocessor: Arc<MockCoprocessor>,
}

#[async_trait]
impl FhevmInstance for MockInstance {
    fn config(&self) -> &FhevmConfig {
        self.coprocessor.config()
    }

    fn create_encrypted_input(
        &self,
        contract_address: Address,
        user_address: Address,
    ) -> Box<dyn EncryptedInputBuilder> {
        Box::new(MockInputBuilder {
            coprocessor: self.coprocessor.clone(),
            contract_address,
            user_address,
            values: vec![],
        })
    }

    fn generate_keypair(&self) -> Keypair {
        let mut rng = rand::thread_rng();
        let mut public_key = [0u8; 32];
        let mut private_key = [0u8; 32];
        rng.fill_bytes(&mut public_key);
        rng.fill_bytes(&mut private_key);
        Keypair {
            public_key: hex::encode(public_key),
            private_key: Zeroizing::new(hex::encode(private_key)),
        }
    }

    async fn user_decrypt(
        &self,
        request: UserDecryptRequest,
    ) -> Result<DecryptedValues, FhevmError> {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        self.coprocessor.user_decrypt(&request, now)
    }
}

struct MockInputBuilder {
    coprocessor: Arc<MockCoprocessor>,
    contract_address: Address,
    user_address: Address,
    values: Vec<u32>,
}

#[async_trait]
impl EncryptedInputBuilder for MockInputBuilder {
    fn add32(&mut self, value: u32) {
        self.values.push(value);
    }

    async fn encrypt(&mut self) -> Result<EncryptedInput, FhevmError> {
        self.coprocessor
            .encrypt(self.contract_address, self.user_address, &self.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DecryptionValidity, HandleContractPair};
    use alloy::primitives::address;
    use alloy::signers::{local::PrivateKeySigner, Signer};

    const BOARD: Address = address!("0x9c5f39ca7544a021d7C106c3F0d6518bF0c7bF9B");

    fn coprocessor() -> Arc<MockCoprocessor> {
        MockCoprocessor::new(FhevmConfig::sepolia())
    }

    async fn signed_request(
        coprocessor: &MockCoprocessor,
        signer: &PrivateKeySigner,
        user: Address,
        handle: CiphertextHandle,
        validity: DecryptionValidity,
    ) -> anyhow::Result<UserDecryptRequest> {
        let keypair = Keypair {
            public_key: "ab".repeat(32),
            private_key: Zeroizing::new("cd".repeat(32)),
        };
        let payload =
            user_decrypt_eip712(coprocessor.config(), &keypair.public_key, &[BOARD], &validity)
                .without_domain_type();
        let signature = signer
            .sign_dynamic_typed_data(&payload.to_typed_data()?)
            .await?;
        Ok(UserDecryptRequest {
            handle_contract_pairs: vec![HandleContractPair {
                handle,
                contract_address: BOARD,
            }],
            keypair,
            signature: hex::encode(signature.as_bytes()),
            contract_addresses: vec![BOARD],
            user_address: user,
            validity,
        })
    }

    #[test]
    fn test_handle_layout() -> anyhow::Result<()> {
        let coprocessor = coprocessor();
        let input = coprocessor.encrypt(BOARD, Address::ZERO, &[7, 8])?;
        assert_eq!(input.handles.len(), 2);
        let handle = input.handles[1];
        assert_eq!(handle[21], 1);
        assert_eq!(&handle[22..30], &11155111u64.to_be_bytes());
        assert_eq!(handle[30], EUINT32_TYPE);
        assert_ne!(input.handles[0], input.handles[1]);
        Ok(())
    }

    #[test]
    fn test_proof_is_bound_to_contract_and_user() -> anyhow::Result<()> {
        let coprocessor = coprocessor();
        let user = address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8");
        let input = coprocessor.encrypt(BOARD, user, &[42])?;
        let handle = input.handles[0];

        let wrong_user = coprocessor.verify_input(handle, &input.input_proof, BOARD, Address::ZERO);
        assert!(matches!(wrong_user, Err(FhevmError::InvalidProof(_))));
        assert!(!coprocessor.is_allowed(handle, user));

        coprocessor.verify_input(handle, &input.input_proof, BOARD, user)?;
        assert!(coprocessor.is_allowed(handle, user));
        assert!(coprocessor.is_allowed(handle, BOARD));
        Ok(())
    }

    #[test]
    fn test_truncated_proof_rejected() -> anyhow::Result<()> {
        let coprocessor = coprocessor();
        let input = coprocessor.encrypt(BOARD, Address::ZERO, &[1])?;
        let truncated = &input.input_proof[..input.input_proof.len() - 1];
        let result = coprocessor.verify_input(input.handles[0], truncated, BOARD, Address::ZERO);
        assert!(matches!(result, Err(FhevmError::InvalidProof(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_user_decrypt_checks_signature_window_and_acl() -> anyhow::Result<()> {
        let coprocessor = coprocessor();
        let signer = PrivateKeySigner::random();
        let user = signer.address();
        let input = coprocessor.encrypt(BOARD, user, &[888])?;
        let handle = input.handles[0];
        let validity = DecryptionValidity {
            start_timestamp: 1_000,
            duration_days: 1,
        };
        let request = signed_request(&coprocessor, &signer, user, handle, validity).await?;

        // Not yet on the ACL
        assert!(matches!(
            coprocessor.user_decrypt(&request, 2_000),
            Err(FhevmError::Unauthorized(_))
        ));

        coprocessor.verify_input(handle, &input.input_proof, BOARD, user)?;
        let values = coprocessor.user_decrypt(&request, 2_000)?;
        assert_eq!(values.get(&handle), Some(&U256::from(888)));

        // Outside the window
        assert!(matches!(
            coprocessor.user_decrypt(&request, 1_000 + 86_400),
            Err(FhevmError::Unauthorized(_))
        ));

        // Signed by somebody else
        let other = PrivateKeySigner::random();
        let forged = signed_request(&coprocessor, &other, user, handle, validity).await?;
        assert!(matches!(
            coprocessor.user_decrypt(&forged, 2_000),
            Err(FhevmError::Unauthorized(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_instance_rejects_wrong_network() {
        let sdk = MockSdk::new(coprocessor());
        let result = sdk
            .create_instance(
                &FhevmConfig::sepolia(),
                &Network {
                    chain_id: 1,
                    rpc_url: "http://localhost:8545".to_string(),
                },
            )
            .await;
        assert!(matches!(result, Err(FhevmError::InstanceCreation(_))));
    }
}
