use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{round2, Money};
use crate::state::LoanLedgerState;
use crate::types::LoanStatus;

/// read-only view of a loan's repayment progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanSummary {
    pub principal: Money,
    pub total_repayable: Money,
    pub guarantor_advance: Money,
    pub total_paid: Money,
    pub remaining_balance: Money,
    /// 0..=100, two decimal places
    pub percent_complete: Decimal,
    pub interest_paid: Money,
    pub remaining_interest: Money,
    pub guarantor_reimbursed: Money,
    pub remaining_guarantor_debt: Money,
    pub principal_paid: Money,
    pub principal_remaining: Money,
    pub status: LoanStatus,
}

/// project a ledger state into a summary; never fails
pub fn summarize(state: &LoanLedgerState) -> LoanSummary {
    LoanSummary {
        principal: state.principal(),
        total_repayable: state.total_repayable(),
        guarantor_advance: state.guarantor_advance(),
        total_paid: state.total_paid(),
        remaining_balance: state.remaining_balance(),
        percent_complete: percent_complete(state),
        interest_paid: state.total_interest_paid(),
        remaining_interest: state.interest_due_remaining(),
        guarantor_reimbursed: state.guarantor_reimbursed(),
        remaining_guarantor_debt: state.guarantor_owed(),
        principal_paid: state.principal_paid(),
        principal_remaining: state.principal_remaining(),
        status: state.status(),
    }
}

fn percent_complete(state: &LoanLedgerState) -> Decimal {
    if state.is_completed() || state.total_repayable().is_zero() {
        return Decimal::ONE_HUNDRED;
    }
    let pct = state.total_paid().as_decimal() / state.total_repayable().as_decimal()
        * Decimal::ONE_HUNDRED;
    round2(pct).min(Decimal::ONE_HUNDRED)
}
