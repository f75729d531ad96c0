use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{LoanError, Result};
use crate::types::{EntryCategory, GuarantorId, LoanId};

/// a posting the bank's ledger must record for one payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerEntry {
    /// bank interest income
    InterestIncome {
        loan_id: LoanId,
        account_number: String,
        amount: Money,
        category: EntryCategory,
    },
    /// credit to a guarantor's account
    GuarantorCredit {
        loan_id: LoanId,
        guarantor_id: GuarantorId,
        account_id: String,
        amount: Money,
    },
    /// reduction of the borrower's principal
    PrincipalReduction {
        loan_id: LoanId,
        account_number: String,
        amount: Money,
    },
}

impl LedgerEntry {
    pub fn amount(&self) -> Money {
        match self {
            LedgerEntry::InterestIncome { amount, .. }
            | LedgerEntry::GuarantorCredit { amount, .. }
            | LedgerEntry::PrincipalReduction { amount, .. } => *amount,
        }
    }

    pub fn category(&self) -> EntryCategory {
        match self {
            LedgerEntry::InterestIncome { category, .. } => *category,
            LedgerEntry::GuarantorCredit { .. } => EntryCategory::GuarantorReimbursement,
            LedgerEntry::PrincipalReduction { .. } => EntryCategory::PrincipalReduction,
        }
    }

    pub fn loan_id(&self) -> LoanId {
        match self {
            LedgerEntry::InterestIncome { loan_id, .. }
            | LedgerEntry::GuarantorCredit { loan_id, .. }
            | LedgerEntry::PrincipalReduction { loan_id, .. } => *loan_id,
        }
    }
}

/// anything that can record ledger entries
///
/// Implementations must post a batch all-or-nothing: an `Err` means no
/// entry of the batch was recorded.
pub trait LedgerPoster {
    fn post(&mut self, entries: &[LedgerEntry]) -> Result<()>;
}

/// ledger that keeps entries in memory
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    entries: Vec<LedgerEntry>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn entries_for(&self, loan_id: LoanId) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.iter().filter(move |e| e.loan_id() == loan_id)
    }

    pub fn total(&self, category: EntryCategory) -> Money {
        self.entries
            .iter()
            .filter(|e| e.category() == category)
            .map(|e| e.amount())
            .sum()
    }

    /// total credited to one guarantor across all loans
    pub fn credited_to(&self, guarantor_id: GuarantorId) -> Money {
        self.entries
            .iter()
            .filter_map(|e| match e {
                LedgerEntry::GuarantorCredit {
                    guarantor_id: id,
                    amount,
                    ..
                } if *id == guarantor_id => Some(*amount),
                _ => None,
            })
            .sum()
    }
}

impl LedgerPoster for InMemoryLedger {
    fn post(&mut self, entries: &[LedgerEntry]) -> Result<()> {
        if let Some(bad) = entries.iter().find(|e| !e.amount().is_positive()) {
            return Err(LoanError::LedgerPostingFailed {
                message: format!("non-positive {} entry of {}", bad.category().as_str(), bad.amount()),
            });
        }
        self.entries.extend_from_slice(entries);
        Ok(())
    }
}
