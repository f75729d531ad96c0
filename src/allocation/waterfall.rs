use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{LoanError, Result};
use crate::state::LoanLedgerState;

use super::validate_payment;

/// how one payment was split
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepaymentBreakdown {
    /// amount the borrower offered
    pub requested_amount: Money,
    /// amount actually applied after clamping to the remaining balance
    pub actual_payment: Money,
    /// bank interest income recognised by this payment
    pub interest_paid: Money,
    /// amount owed back to guarantors out of this payment
    pub guarantor_reimbursement: Money,
    /// amount that reduced the borrower's own principal
    pub borrower_benefit: Money,
    pub updated_state: LoanLedgerState,
    pub remaining_balance: Money,
}

impl RepaymentBreakdown {
    /// part of the request that was not applied
    pub fn excess(&self) -> Money {
        self.requested_amount.saturating_sub(self.actual_payment)
    }

    pub fn was_clamped(&self) -> bool {
        self.excess().is_positive()
    }

    /// everything that went to the principal side, guarantor included
    pub fn principal_portion(&self) -> Money {
        self.guarantor_reimbursement + self.borrower_benefit
    }
}

/// apply one payment to a loan ledger state
///
/// Pure: `state` is never modified and the new state travels back in the
/// breakdown. Allocation order is fixed:
///
/// 1. clamp the payment to what is still owed
/// 2. split it by the loan's flat interest share
/// 3. cap interest at what is still due, redirecting the excess to principal
/// 4. reimburse the guarantor out of the principal side first
/// 5. reduce the borrower's principal with whatever is left
pub fn apply_payment(state: &LoanLedgerState, amount: Money) -> Result<RepaymentBreakdown> {
    validate_payment(state, amount)?;

    let remaining_balance = state.remaining_balance();
    if remaining_balance.is_zero() {
        return Err(LoanError::NothingOutstanding);
    }

    let actual_payment = amount.min(remaining_balance);
    let interest_due_remaining = state.interest_due_remaining();

    let share = actual_payment.share(state.interest_share());

    // rounding drift: interest still due after this payment must stay payable
    // out of the balance left, within a cent. Only near settlement does this
    // lift the plain share.
    let balance_after = remaining_balance - actual_payment;
    let drift_floor = interest_due_remaining
        .saturating_sub(balance_after + Money::EPSILON)
        .min(actual_payment);
    let interest_portion = share.max(drift_floor);
    let principal_portion = actual_payment - interest_portion;

    let interest_paid = interest_portion.min(interest_due_remaining);
    let interest_excess = interest_portion - interest_paid;

    let total_principal_portion = principal_portion + interest_excess;
    let guarantor_reimbursement = total_principal_portion.min(state.guarantor_owed());

    let borrower_benefit = total_principal_portion - guarantor_reimbursement;
    let principal_remaining = state.principal_remaining().saturating_sub(borrower_benefit);

    let updated_state = state.advance(
        state.total_paid() + actual_payment,
        state.total_interest_paid() + interest_paid,
        state.guarantor_reimbursed() + guarantor_reimbursement,
        principal_remaining,
    );
    let remaining_balance = updated_state.remaining_balance();

    Ok(RepaymentBreakdown {
        requested_amount: amount,
        actual_payment,
        interest_paid,
        guarantor_reimbursement,
        borrower_benefit,
        updated_state,
        remaining_balance,
    })
}
