// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::{Address, Signature};
use alloy::signers::{local::PrivateKeySigner, Signer};
use async_trait::async_trait;
use eyre::Result;
use snb_fhevm::{Eip712Payload, Network};
use tracing::debug;

/// The connected account: who is signing and on which network
#[async_trait]
pub trait Wallet: Send + Sync {
    fn address(&self) -> Address;

    /// Network the wallet currently points at, `None` when it has none
    fn network(&self) -> Option<Network>;

    /// Sign an EIP-712 payload. The payload must not list `EIP712Domain` among its types.
    async fn sign_typed_data(&self, payload: &Eip712Payload) -> Result<Signature>;
}

/// Hex encoding of a signature without the `0x` prefix, as the decryption relayer expects it
pub fn signature_to_hex(signature: &Signature) -> String {
    hex::encode(signature.as_bytes())
}

/// A wallet holding its private key in process
#[derive(Clone)]
pub struct LocalWallet {
    signer: PrivateKeySigner,
    network: Option<Network>,
}

impl LocalWallet {
    pub fn new(signer: PrivateKeySigner, network: Option<Network>) -> Self {
        Self { signer, network }
    }

    pub fn from_private_key(private_key: &str, network: Option<Network>) -> Result<Self> {
        let signer: PrivateKeySigner = private_key.trim().parse()?;
        Ok(Self::new(signer, network))
    }

    pub fn random(network: Option<Network>) -> Self {
        Self::new(PrivateKeySigner::random(), network)
    }

    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }
}

impl std::fmt::Debug for LocalWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalWallet")
            .field("address", &self.signer.address())
            .field("network", &self.network)
            .finish()
    }
}

#[async_trait]
impl Wallet for LocalWallet {
    fn address(&self) -> Address {
        self.signer.address()
    }

    fn network(&self) -> Option<Network> {
        self.network.clone()
    }

    async fn sign_typed_data(&self, payload: &Eip712Payload) -> Result<Signature> {
        if payload.has_domain_type() {
            eyre::bail!("EIP712Domain must be removed from the types before signing");
        }
        let typed_data = payload.to_typed_data()?;
        let signature = self.signer.sign_dynamic_typed_data(&typed_data).await?;
        debug!(signer = %self.signer.address(), "Signed typed data");
        Ok(signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;
    use snb_fhevm::eip712::user_decrypt_eip712;
    use snb_fhevm::{DecryptionValidity, FhevmConfig};

    // First default anvil account
    const ANVIL_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn payload() -> Eip712Payload {
        user_decrypt_eip712(
            &FhevmConfig::sepolia(),
            "beef",
            &[address!("0x9c5f39ca7544a021d7C106c3F0d6518bF0c7bF9B")],
            &DecryptionValidity {
                start_timestamp: 1_760_000_000,
                duration_days: 10,
            },
        )
    }

    #[test]
    fn test_from_private_key() -> eyre::Result<()> {
        let wallet = LocalWallet::from_private_key(ANVIL_KEY, None)?;
        assert_eq!(
            wallet.address(),
            address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
        );
        assert!(LocalWallet::from_private_key("not a key", None).is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_signature_recovers_to_wallet() -> eyre::Result<()> {
        let wallet = LocalWallet::random(None);
        let payload = payload().without_domain_type();
        let signature = wallet.sign_typed_data(&payload).await?;

        let recovered = signature.recover_address_from_prehash(&payload.signing_hash()?)?;
        assert_eq!(recovered, wallet.address());

        let encoded = signature_to_hex(&signature);
        assert_eq!(encoded.len(), 130);
        assert!(!encoded.starts_with("0x"));
        Ok(())
    }

    #[tokio::test]
    async fn test_refuses_payload_with_domain_type() {
        let wallet = LocalWallet::random(None);
        assert!(wallet.sign_typed_data(&payload()).await.is_err());
    }

    #[test]
    fn test_debug_does_not_leak_key() -> eyre::Result<()> {
        let wallet = LocalWallet::from_private_key(ANVIL_KEY, None)?;
        let printed = format!("{wallet:?}");
        assert!(!printed.contains("ac0974bec39a17e36ba4a6b4d238ff944bacb478"));
        Ok(())
    }
}
