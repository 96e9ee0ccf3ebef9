// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod client;
mod config;
pub mod eip712;
mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod sdk;
mod types;

pub use client::*;
pub use config::*;
pub use eip712::Eip712Payload;
pub use error::*;
pub use sdk::{DecryptedValues, EncryptedInputBuilder, FhevmInstance, FhevmSdk};
pub use types::*;
