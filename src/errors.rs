use thiserror::Error;

use crate::decimal::Money;
use crate::types::LoanId;

#[derive(Error, Debug)]
pub enum LoanError {
    #[error("invalid payment amount: {amount}")]
    InvalidAmount {
        amount: Money,
    },

    #[error("loan already completed")]
    LoanAlreadyCompleted,

    #[error("nothing outstanding on loan but it is not completed")]
    NothingOutstanding,

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("invalid state: {message}")]
    InvalidState {
        message: String,
    },

    #[error("invalid guarantor shares: {message}")]
    InvalidGuarantorShares {
        message: String,
    },

    #[error("calculation error: {message}")]
    CalculationError {
        message: String,
    },

    #[error("payment outcome was computed against a different loan state")]
    StaleOutcome,

    #[error("loan not found: {id}")]
    LoanNotFound {
        id: LoanId,
    },

    #[error("ledger posting failed: {message}")]
    LedgerPostingFailed {
        message: String,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LoanError {
    /// errors the caller can fix by resubmitting a different request
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            LoanError::InvalidAmount { .. }
                | LoanError::LoanAlreadyCompleted
                | LoanError::NothingOutstanding
        )
    }
}

pub type Result<T> = std::result::Result<T, LoanError>;
