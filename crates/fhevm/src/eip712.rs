// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{DecryptionValidity, FhevmConfig, FhevmError};
use alloy::dyn_abi::TypedData;
use alloy::primitives::{Address, B256, U256};
use alloy::sol_types::Eip712Domain;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;

pub const EIP712_DOMAIN_TYPE: &str = "EIP712Domain";
pub const USER_DECRYPT_PRIMARY_TYPE: &str = "UserDecryptRequestVerification";
pub const DECRYPTION_DOMAIN_NAME: &str = "Decryption";
pub const DECRYPTION_DOMAIN_VERSION: &str = "1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eip712Field {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

impl Eip712Field {
    fn new(name: &str, ty: &str) -> Self {
        Self {
            name: name.to_string(),
            ty: ty.to_string(),
        }
    }
}

/// Typed-data authorization payload as produced by `createEIP712`.
///
/// `types` carries the `EIP712Domain` entry the way the SDK emits it. Wallets expect the domain
/// separately, so strip it with [`Eip712Payload::without_domain_type`] before asking for a
/// signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Eip712Payload {
    pub domain: Eip712Domain,
    pub types: BTreeMap<String, Vec<Eip712Field>>,
    pub primary_type: String,
    pub message: serde_json::Value,
}

impl Eip712Payload {
    pub fn has_domain_type(&self) -> bool {
        self.types.contains_key(EIP712_DOMAIN_TYPE)
    }

    /// Copy of the payload with the domain separator type removed
    pub fn without_domain_type(&self) -> Self {
        let mut stripped = self.clone();
        stripped.types.remove(EIP712_DOMAIN_TYPE);
        stripped
    }

    pub fn to_typed_data(&self) -> Result<TypedData, FhevmError> {
        let value = json!({
            "domain": self.domain,
            "types": self.types,
            "primaryType": self.primary_type,
            "message": self.message,
        });
        serde_json::from_value(value).map_err(|e| FhevmError::Eip712(e.to_string()))
    }

    /// The digest a wallet signs for this payload
    pub fn signing_hash(&self) -> Result<B256, FhevmError> {
        self.to_typed_data()?
            .eip712_signing_hash()
            .map_err(|e| FhevmError::Eip712(e.to_string()))
    }
}

/// Build the `UserDecryptRequestVerification` payload authorizing `public_key` to receive
/// plaintexts of handles owned by `contract_addresses` during `validity`.
pub fn user_decrypt_eip712(
    config: &FhevmConfig,
    public_key: &str,
    contract_addresses: &[Address],
    validity: &DecryptionValidity,
) -> Eip712Payload {
    let domain = Eip712Domain::new(
        Some(DECRYPTION_DOMAIN_NAME.into()),
        Some(DECRYPTION_DOMAIN_VERSION.into()),
        Some(U256::from(config.gateway_chain_id)),
        Some(config.verifying_contract_address_decryption),
        None,
    );

    let mut types = BTreeMap::new();
    types.insert(
        EIP712_DOMAIN_TYPE.to_string(),
        vec![
            Eip712Field::new("name", "string"),
            Eip712Field::new("version", "string"),
            Eip712Field::new("chainId", "uint256"),
            Eip712Field::new("verifyingContract", "address"),
        ],
    );
    types.insert(
        USER_DECRYPT_PRIMARY_TYPE.to_string(),
        vec![
            Eip712Field::new("publicKey", "bytes"),
            Eip712Field::new("contractAddresses", "address[]"),
            Eip712Field::new("startTimestamp", "uint256"),
            Eip712Field::new("durationDays", "uint256"),
            Eip712Field::new("extraData", "bytes"),
        ],
    );

    let message = json!({
        "publicKey": format!("0x{}", public_key.trim_start_matches("0x")),
        "contractAddresses": contract_addresses,
        "startTimestamp": validity.start_timestamp.to_string(),
        "durationDays": validity.duration_days.to_string(),
        "extraData": "0x00",
    });

    Eip712Payload {
        domain,
        types,
        primary_type: USER_DECRYPT_PRIMARY_TYPE.to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, Bytes};
    use alloy::sol;
    use alloy::sol_types::SolStruct;

    sol! {
        struct UserDecryptRequestVerification {
            bytes publicKey;
            address[] contractAddresses;
            uint256 startTimestamp;
            uint256 durationDays;
            bytes extraData;
        }
    }

    const BOARD: Address = address!("0x9c5f39ca7544a021d7C106c3F0d6518bF0c7bF9B");

    fn validity() -> DecryptionValidity {
        DecryptionValidity {
            start_timestamp: 1_760_000_000,
            duration_days: 10,
        }
    }

    #[test]
    fn test_payload_shape() {
        let payload = user_decrypt_eip712(&FhevmConfig::sepolia(), "beef", &[BOARD], &validity());

        assert!(payload.has_domain_type());
        assert_eq!(payload.primary_type, USER_DECRYPT_PRIMARY_TYPE);
        assert_eq!(payload.domain.chain_id, Some(U256::from(10901)));
        assert_eq!(
            payload.domain.verifying_contract,
            Some(FhevmConfig::sepolia().verifying_contract_address_decryption)
        );
        assert_eq!(payload.message["publicKey"], "0xbeef");
        assert_eq!(payload.message["startTimestamp"], "1760000000");
        assert_eq!(payload.message["durationDays"], "10");
    }

    #[test]
    fn test_stripping_domain_type_keeps_message_types() {
        let payload = user_decrypt_eip712(&FhevmConfig::sepolia(), "beef", &[BOARD], &validity());
        let stripped = payload.without_domain_type();

        assert!(!stripped.has_domain_type());
        assert!(stripped.types.contains_key(USER_DECRYPT_PRIMARY_TYPE));
        assert_eq!(stripped.message, payload.message);
        assert_eq!(stripped.domain, payload.domain);
    }

    #[test]
    fn test_signing_hash_matches_static_struct() -> anyhow::Result<()> {
        let config = FhevmConfig::sepolia();
        let payload = user_decrypt_eip712(&config, "0xbeef", &[BOARD], &validity());

        let expected = UserDecryptRequestVerification {
            publicKey: Bytes::from(vec![0xbe, 0xef]),
            contractAddresses: vec![BOARD],
            startTimestamp: U256::from(1_760_000_000u64),
            durationDays: U256::from(10),
            extraData: Bytes::from(vec![0x00]),
        }
        .eip712_signing_hash(&payload.domain);

        assert_eq!(payload.signing_hash()?, expected);
        assert_eq!(payload.without_domain_type().signing_hash()?, expected);
        Ok(())
    }
}
