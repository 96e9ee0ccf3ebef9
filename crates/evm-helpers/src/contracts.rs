// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::retry::call_with_retry;
use alloy::providers::fillers::BlobGasFiller;
use alloy::{
    network::{Ethereum, EthereumWallet},
    primitives::{Address, Bytes, TxHash, B256},
    providers::fillers::{
        ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller, WalletFiller,
    },
    providers::{Identity, Provider, ProviderBuilder, RootProvider},
    signers::local::PrivateKeySigner,
    sol,
};
use async_trait::async_trait;
use eyre::{bail, Result};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info};

sol! {
    #[derive(Debug)]
    #[sol(rpc)]
    contract SecretMessageBoard {
        function submitMessage(bytes32 encryptedValue, bytes calldata proof) external;
        function getMyMessage() external view returns (bytes32);
        function hasUserSubmitted(address user) external view returns (bool);
    }
}

/// A mined, successful transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxConfirmation {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
}

/// Read-only operations on the board
#[async_trait]
pub trait SecretBoardRead: Send + Sync {
    fn contract_address(&self) -> Address;

    /// Handle stored for `caller`. The contract answers the zero handle when nothing was
    /// submitted.
    async fn get_my_message(&self, caller: Address) -> Result<B256>;

    async fn has_user_submitted(&self, user: Address) -> Result<bool>;
}

/// Write operations on the board
#[async_trait]
pub trait SecretBoardWrite: Send + Sync {
    /// Send `submitMessage` and wait until it is mined. A reverted transaction is an error.
    async fn submit_message(&self, handle: B256, proof: Bytes) -> Result<TxConfirmation>;
}

/// Everything the workflow needs from the deployed board
pub trait SecretBoardGateway: SecretBoardRead + SecretBoardWrite {}

impl<T: SecretBoardRead + SecretBoardWrite> SecretBoardGateway for T {}

/// Generic type to represent different provider types
pub trait ProviderType: Send {
    type Provider: Provider + Send + Sync + 'static;
}

/// Marker type for read-only provider
#[derive(Clone)]
pub struct ReadOnly;
impl ProviderType for ReadOnly {
    type Provider = BoardReadOnlyProvider;
}

/// Marker type for read-write provider
#[derive(Clone)]
pub struct ReadWrite;
impl ProviderType for ReadWrite {
    type Provider = BoardWriteProvider;
}

/// Type alias for read-only provider
pub type BoardReadOnlyProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider,
>;

/// Type alias for read-write provider
pub type BoardWriteProvider = FillProvider<
    JoinFill<
        JoinFill<
            JoinFill<
                Identity,
                JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
            >,
            WalletFiller<EthereumWallet>,
        >,
        NonceFiller,
    >,
    RootProvider<Ethereum>,
    Ethereum,
>;

#[derive(Clone)]
pub struct SecretBoardContract<T: ProviderType> {
    pub provider: Arc<T::Provider>,
    pub contract_address: Address,
    _marker: PhantomData<T>,
}

pub type SecretBoardReadContract = SecretBoardContract<ReadOnly>;
pub type SecretBoardWriteContract = SecretBoardContract<ReadWrite>;

impl SecretBoardContract<ReadWrite> {
    pub async fn new(
        http_rpc_url: &str,
        signer: PrivateKeySigner,
        contract_address: &str,
    ) -> Result<SecretBoardContract<ReadWrite>> {
        SecretBoardContractFactory::create_write(http_rpc_url, contract_address, signer).await
    }
}

impl SecretBoardContract<ReadOnly> {
    pub async fn read_only(
        http_rpc_url: &str,
        contract_address: &str,
    ) -> Result<SecretBoardContract<ReadOnly>> {
        SecretBoardContractFactory::create_read(http_rpc_url, contract_address).await
    }
}

pub struct SecretBoardContractFactory;

impl SecretBoardContractFactory {
    /// Create a contract whose provider signs and sends transactions with `signer`
    pub async fn create_write(
        http_rpc_url: &str,
        contract_address: &str,
        signer: PrivateKeySigner,
    ) -> Result<SecretBoardContract<ReadWrite>> {
        let contract_address = contract_address.parse()?;

        let wallet = EthereumWallet::from(signer);
        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .with_cached_nonce_management()
            .connect(http_rpc_url)
            .await?;

        Ok(SecretBoardContract::<ReadWrite> {
            provider: Arc::new(provider),
            contract_address,
            _marker: PhantomData,
        })
    }

    pub async fn create_read(
        http_rpc_url: &str,
        contract_address: &str,
    ) -> Result<SecretBoardContract<ReadOnly>> {
        let contract_address = contract_address.parse()?;

        let provider = ProviderBuilder::new().connect(http_rpc_url).await?;

        Ok(SecretBoardContract::<ReadOnly> {
            provider: Arc::new(provider),
            contract_address,
            _marker: PhantomData,
        })
    }
}

#[async_trait]
impl<T: Send + Sync> SecretBoardRead for SecretBoardContract<T>
where
    T: ProviderType,
{
    fn contract_address(&self) -> Address {
        self.contract_address
    }

    async fn get_my_message(&self, caller: Address) -> Result<B256> {
        let provider = self.provider.clone();
        let address = self.contract_address;
        let handle = call_with_retry("getMyMessage", &[], move || {
            let provider = provider.clone();
            async move {
                let contract = SecretMessageBoard::new(address, provider);
                Ok(contract.getMyMessage().from(caller).call().await?)
            }
        })
        .await?;
        debug!(%caller, %handle, "Fetched stored handle");
        Ok(handle)
    }

    async fn has_user_submitted(&self, user: Address) -> Result<bool> {
        let provider = self.provider.clone();
        let address = self.contract_address;
        call_with_retry("hasUserSubmitted", &[], move || {
            let provider = provider.clone();
            async move {
                let contract = SecretMessageBoard::new(address, provider);
                Ok(contract.hasUserSubmitted(user).call().await?)
            }
        })
        .await
    }
}

// Writes are never retried: each attempt would be a new transaction for the wallet to sign
#[async_trait]
impl SecretBoardWrite for SecretBoardContract<ReadWrite> {
    async fn submit_message(&self, handle: B256, proof: Bytes) -> Result<TxConfirmation> {
        let contract = SecretMessageBoard::new(self.contract_address, &self.provider);
        let pending = contract.submitMessage(handle, proof).send().await?;
        let tx_hash = *pending.tx_hash();
        info!(%tx_hash, "submitMessage sent, waiting for confirmation");

        let receipt = pending.get_receipt().await?;
        if !receipt.status() {
            bail!("submitMessage transaction {tx_hash} reverted");
        }

        Ok(TxConfirmation {
            tx_hash,
            block_number: receipt.block_number,
        })
    }
}
