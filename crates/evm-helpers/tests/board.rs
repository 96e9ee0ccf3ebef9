// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::{address, Address, U256};
use eyre::Result;
use snb_evm_helpers::contracts::{SecretBoardGateway, SecretBoardWrite};
use snb_evm_helpers::mock::MockSecretBoard;
use snb_evm_helpers::wallet::{signature_to_hex, LocalWallet, Wallet};
use snb_fhevm::mock::{MockCoprocessor, MockSdk};
use snb_fhevm::{
    DecryptionValidity, FhevmConfig, FhevmSdk, HandleContractPair, Network, UserDecryptRequest,
};
use std::sync::Arc;

const BOARD: Address = address!("0x9c5f39ca7544a021d7C106c3F0d6518bF0c7bF9B");

fn sepolia() -> Network {
    Network {
        chain_id: 11155111,
        rpc_url: "http://localhost:8545".to_string(),
    }
}

/// Store a number and read it back through the user decryption flow
#[tokio::test]
async fn test_store_and_user_decrypt() -> Result<()> {
    let coprocessor = MockCoprocessor::new(FhevmConfig::sepolia());
    let wallet = LocalWallet::random(Some(sepolia()));
    let board: Arc<dyn SecretBoardGateway> =
        Arc::new(MockSecretBoard::deploy(BOARD, coprocessor.clone()).with_sender(wallet.address()));

    let sdk = MockSdk::new(coprocessor);
    sdk.init_sdk().await?;
    let instance = sdk.create_instance(&FhevmConfig::sepolia(), &sepolia()).await?;

    let mut input = instance.create_encrypted_input(BOARD, wallet.address());
    input.add32(4_294_967_295);
    let encrypted = input.encrypt().await?;
    board
        .submit_message(encrypted.handles[0], encrypted.input_proof)
        .await?;

    let handle = board.get_my_message(wallet.address()).await?;
    assert_eq!(handle, encrypted.handles[0]);

    let keypair = instance.generate_keypair();
    let validity = DecryptionValidity::starting_now(10);
    let payload = instance
        .create_eip712(&keypair.public_key, &[BOARD], &validity)
        .without_domain_type();
    let signature = wallet.sign_typed_data(&payload).await?;

    let values = instance
        .user_decrypt(UserDecryptRequest {
            handle_contract_pairs: vec![HandleContractPair {
                handle,
                contract_address: BOARD,
            }],
            keypair,
            signature: signature_to_hex(&signature),
            contract_addresses: vec![BOARD],
            user_address: wallet.address(),
            validity,
        })
        .await?;

    assert_eq!(values.get(&handle), Some(&U256::from(u32::MAX)));
    Ok(())
}

#[tokio::test]
async fn test_other_user_cannot_decrypt() -> Result<()> {
    let coprocessor = MockCoprocessor::new(FhevmConfig::sepolia());
    let alice = LocalWallet::random(Some(sepolia()));
    let mallory = LocalWallet::random(Some(sepolia()));
    let board = MockSecretBoard::deploy(BOARD, coprocessor.clone());

    let encrypted = coprocessor.encrypt(BOARD, alice.address(), &[7])?;
    board
        .with_sender(alice.address())
        .submit_message(encrypted.handles[0], encrypted.input_proof)
        .await?;

    let instance = MockSdk::new(coprocessor)
        .create_instance(&FhevmConfig::sepolia(), &sepolia())
        .await?;
    let keypair = instance.generate_keypair();
    let validity = DecryptionValidity::starting_now(1);
    let payload = instance
        .create_eip712(&keypair.public_key, &[BOARD], &validity)
        .without_domain_type();
    let signature = mallory.sign_typed_data(&payload).await?;

    let result = instance
        .user_decrypt(UserDecryptRequest {
            handle_contract_pairs: vec![HandleContractPair {
                handle: encrypted.handles[0],
                contract_address: BOARD,
            }],
            keypair,
            signature: signature_to_hex(&signature),
            contract_addresses: vec![BOARD],
            user_address: mallory.address(),
            validity,
        })
        .await;
    assert!(result.is_err());
    Ok(())
}
