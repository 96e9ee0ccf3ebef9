// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use strum::Display;
use thiserror::Error;

/// User triggered operations that can be refused by a guard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Operation {
    Initialize,
    Submit,
    Decrypt,
    Reset,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a number")]
    Empty,
    #[error("'{0}' is not a whole number")]
    NotAnInteger(String),
    #[error("{0} is outside 0 to 4,294,967,295")]
    OutOfRange(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    /// No wallet is connected
    #[error("Connect a wallet first")]
    NotConnected,

    /// The same kind of operation is already running
    #[error("{0} is already in progress")]
    AlreadyInFlight(Operation),

    /// Decryption was requested before the sync delay elapsed
    #[error("Decryption is not available yet")]
    NotEligible,

    #[error("Cannot {operation} while {state}")]
    InvalidTransition { operation: Operation, state: String },

    /// The wallet disconnected or the controller shut down while the call was in flight
    #[error("Session ended before {0} completed")]
    SessionEnded(Operation),

    #[error("FHEVM initialization failed: {0}")]
    Initialization(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Submission failed: {0}")]
    Submission(String),

    #[error("Decryption failed: {0}")]
    Decryption(String),
}

impl WorkflowError {
    /// Guard rejections are refused up front: no call is made and nothing is recorded
    pub fn is_guard(&self) -> bool {
        matches!(
            self,
            WorkflowError::NotConnected
                | WorkflowError::AlreadyInFlight(_)
                | WorkflowError::NotEligible
                | WorkflowError::InvalidTransition { .. }
                | WorkflowError::SessionEnded(_)
        )
    }
}
