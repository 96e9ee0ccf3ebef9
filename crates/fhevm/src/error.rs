// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use thiserror::Error;

/// Errors raised by an SDK backend or by the client wrapper around it.
///
/// The type is `Clone` because a pending initialization is shared between every caller that
/// joins it, and each of them receives the same outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FhevmError {
    #[error("Relayer SDK not loaded: {0}")]
    SdkUnavailable(String),

    #[error("Wallet provider not found")]
    ProviderMissing,

    #[error("Could not create FHEVM instance: {0}")]
    InstanceCreation(String),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Invalid input proof: {0}")]
    InvalidProof(String),

    #[error("EIP-712 payload error: {0}")]
    Eip712(String),

    #[error("Unauthorized decryption: {0}")]
    Unauthorized(String),

    #[error("Decryption failed: {0}")]
    Decryption(String),

    #[error("FHEVM client was torn down while initializing")]
    TornDown,
}
