pub mod summary;
pub mod waterfall;

use crate::decimal::Money;
use crate::errors::{LoanError, Result};
use crate::state::LoanLedgerState;

pub use summary::{summarize, LoanSummary};
pub use waterfall::{apply_payment, RepaymentBreakdown};

/// reject a payment before any allocation is attempted
pub fn validate_payment(state: &LoanLedgerState, amount: Money) -> Result<()> {
    if !amount.is_positive() {
        return Err(LoanError::InvalidAmount { amount });
    }

    if state.is_completed() {
        return Err(LoanError::LoanAlreadyCompleted);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_validation() {
        let state = LoanLedgerState::originate(
            Money::from_major(1_000),
            Money::from_major(1_100),
            Money::from_major(500),
        )
        .unwrap();

        // test zero payment
        assert!(validate_payment(&state, Money::ZERO).is_err());

        // test negative payment
        assert!(validate_payment(&state, Money::from_cents(-1)).is_err());

        // test valid payment
        assert!(validate_payment(&state, Money::CENT).is_ok());
    }
}
