// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::Address;
use strum::Display;

/// Where the session is in the connect, initialize, submit, wait, decrypt cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum WorkflowState {
    /// No wallet
    Disconnected,
    /// Wallet present, FHEVM client not created yet
    Uninitialized,
    Initializing,
    /// Last initialization failed. See [`WorkflowSnapshot::initialization_error`].
    InitFailed,
    /// Ready for a number
    AwaitingInput,
    /// Encryption and transaction in flight
    Submitting { value: u32 },
    /// Submission confirmed, waiting for ACL permissions to sync
    AwaitingSync { remaining_secs: u64 },
    DecryptReady,
    Decrypting,
    Decrypted { value: u32 },
}

impl WorkflowState {
    /// A confirmed submission exists for this session
    pub fn is_submitted(&self) -> bool {
        matches!(
            self,
            WorkflowState::AwaitingSync { .. }
                | WorkflowState::DecryptReady
                | WorkflowState::Decrypting
                | WorkflowState::Decrypted { .. }
        )
    }

    pub fn is_eligible(&self) -> bool {
        matches!(
            self,
            WorkflowState::DecryptReady
                | WorkflowState::Decrypting
                | WorkflowState::Decrypted { .. }
        )
    }
}

/// Everything a presentation layer needs to render the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowSnapshot {
    /// Incremented every time a session starts or ends
    pub session: u64,
    pub wallet: Option<Address>,
    pub state: WorkflowState,
    pub sdk_ready: bool,
    pub initialization_error: Option<String>,
    /// The last value accepted for submission
    pub raw_input: Option<u32>,
    pub submission_error: Option<String>,
    pub decryption_error: Option<String>,
}

impl Default for WorkflowSnapshot {
    fn default() -> Self {
        Self {
            session: 0,
            wallet: None,
            state: WorkflowState::Disconnected,
            sdk_ready: false,
            initialization_error: None,
            raw_input: None,
            submission_error: None,
            decryption_error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub wallet_address: Address,
    pub fhe_client_ready: bool,
    pub initialization_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionState {
    pub raw_input: Option<u32>,
    /// True only once the transaction is confirmed
    pub submitted: bool,
    pub submission_error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecryptionGate {
    pub eligible: bool,
    pub remaining_delay_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptionResult {
    pub decrypted_value: Option<u32>,
    pub decryption_error: Option<String>,
}

impl WorkflowSnapshot {
    pub fn session_view(&self) -> Option<Session> {
        self.wallet.map(|wallet_address| Session {
            wallet_address,
            fhe_client_ready: self.sdk_ready,
            initialization_error: self.initialization_error.clone(),
        })
    }

    pub fn submission(&self) -> SubmissionState {
        SubmissionState {
            raw_input: self.raw_input,
            submitted: self.state.is_submitted(),
            submission_error: self.submission_error.clone(),
        }
    }

    pub fn gate(&self) -> DecryptionGate {
        DecryptionGate {
            eligible: self.state.is_eligible(),
            remaining_delay_secs: match self.state {
                WorkflowState::AwaitingSync { remaining_secs } => remaining_secs,
                _ => 0,
            },
        }
    }

    pub fn result(&self) -> DecryptionResult {
        DecryptionResult {
            decrypted_value: match self.state {
                WorkflowState::Decrypted { value } => Some(value),
                _ => None,
            },
            decryption_error: self.decryption_error.clone(),
        }
    }
}

/// What a countdown tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not counting down, or the tick belongs to a countdown that was cancelled
    Ignored,
    Counting { remaining_secs: u64 },
    /// The delay elapsed and decryption became available
    Eligible,
}
