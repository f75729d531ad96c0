//! serialization support for loans
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::allocation::LoanSummary;
use crate::decimal::{Money, Rate};
use crate::loan::GuaranteedLoan;
use crate::types::{GuarantorId, LoanId};

/// serializable view of a loan
#[derive(Debug, Serialize, Deserialize)]
pub struct LoanView {
    pub id: LoanId,
    pub account_number: String,
    pub customer_id: String,
    pub interest_share: Rate,
    pub summary: LoanSummary,
    pub guarantors: Vec<GuarantorView>,
    pub payment_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GuarantorView {
    pub guarantor_id: GuarantorId,
    pub name: String,
    pub account_id: String,
    pub percentage: Decimal,
    pub contributed: Money,
    pub reimbursed: Money,
    pub remaining_owed: Money,
}

impl LoanView {
    pub fn from_loan(loan: &GuaranteedLoan) -> Self {
        LoanView {
            id: loan.id,
            account_number: loan.account_number.clone(),
            customer_id: loan.customer_id.clone(),
            interest_share: loan.state().interest_share(),
            summary: loan.summary(),
            guarantors: loan
                .guarantors()
                .positions()
                .iter()
                .map(|p| GuarantorView {
                    guarantor_id: p.share.guarantor_id,
                    name: p.share.name.clone(),
                    account_id: p.share.account_id.clone(),
                    percentage: p.share.percentage,
                    contributed: p.contributed,
                    reimbursed: p.reimbursed,
                    remaining_owed: p.remaining_owed(),
                })
                .collect(),
            // the first snapshot is origination
            payment_count: loan.snapshots.len().saturating_sub(1),
        }
    }
}
