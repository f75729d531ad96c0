use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};
use crate::types::{LoanId, LoanStatus};

/// ledger state of one guaranteed loan
///
/// Immutable value: every accepted payment produces a new state through
/// [`crate::allocation::apply_payment`]. Fields are only reachable through
/// accessors so a state can never be observed with a stale `is_completed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LedgerRecord", into = "LedgerRecord")]
pub struct LoanLedgerState {
    principal: Money,
    total_repayable: Money,
    guarantor_advance: Money,
    total_paid: Money,
    total_interest_paid: Money,
    guarantor_reimbursed: Money,
    principal_remaining: Money,
    is_completed: bool,
}

/// persisted form of a ledger state
///
/// `is_completed` is written for readers of the stored record but is
/// recomputed on restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub principal: Money,
    pub total_repayable: Money,
    pub guarantor_advance: Money,
    pub total_paid: Money,
    pub total_interest_paid: Money,
    pub guarantor_reimbursed: Money,
    pub principal_remaining: Money,
    #[serde(default)]
    pub is_completed: bool,
}

impl LoanLedgerState {
    /// create the state of a freshly originated loan
    pub fn originate(
        principal: Money,
        total_repayable: Money,
        guarantor_advance: Money,
    ) -> Result<Self> {
        validate_terms(principal, total_repayable, guarantor_advance)?;

        Ok(Self {
            principal,
            total_repayable,
            guarantor_advance,
            total_paid: Money::ZERO,
            total_interest_paid: Money::ZERO,
            guarantor_reimbursed: Money::ZERO,
            principal_remaining: principal,
            is_completed: false,
        })
    }

    /// rebuild a state from a persisted record, checking every invariant
    pub fn restore(record: LedgerRecord) -> Result<Self> {
        validate_terms(record.principal, record.total_repayable, record.guarantor_advance)?;

        let interest_due = record.total_repayable - record.principal;
        check_bounded("total_paid", record.total_paid, record.total_repayable)?;
        check_bounded("total_interest_paid", record.total_interest_paid, interest_due)?;
        check_bounded("guarantor_reimbursed", record.guarantor_reimbursed, record.guarantor_advance)?;
        check_bounded("principal_remaining", record.principal_remaining, record.principal)?;

        let mut state = Self {
            principal: record.principal,
            total_repayable: record.total_repayable,
            guarantor_advance: record.guarantor_advance,
            total_paid: record.total_paid,
            total_interest_paid: record.total_interest_paid,
            guarantor_reimbursed: record.guarantor_reimbursed,
            principal_remaining: record.principal_remaining,
            is_completed: false,
        };
        state.is_completed = state.caps_met();

        // paid in full with a cap still short could never complete
        if !state.is_completed && state.remaining_balance().is_zero() {
            return Err(LoanError::InvalidState {
                message: format!(
                    "paid in full but interest {} of {} and guarantor {} of {} are not settled",
                    state.total_interest_paid,
                    state.total_interest_due(),
                    state.guarantor_reimbursed,
                    state.guarantor_advance
                ),
            });
        }
        Ok(state)
    }

    /// next state after one allocation; completion is derived here and only here
    pub(crate) fn advance(
        &self,
        total_paid: Money,
        total_interest_paid: Money,
        guarantor_reimbursed: Money,
        principal_remaining: Money,
    ) -> Self {
        let mut next = Self {
            total_paid,
            total_interest_paid,
            guarantor_reimbursed,
            principal_remaining,
            ..self.clone()
        };
        next.is_completed = next.caps_met();

        // a completed loan carries no principal; what the borrower did not
        // repay directly was funded by the guarantor and repaid through them
        if next.is_completed {
            next.principal_remaining = Money::ZERO;
        }
        next
    }

    fn caps_met(&self) -> bool {
        self.total_paid.reaches(self.total_repayable)
            && self.total_interest_paid.reaches(self.total_interest_due())
            && self.guarantor_reimbursed.reaches(self.guarantor_advance)
    }

    pub fn principal(&self) -> Money {
        self.principal
    }

    pub fn total_repayable(&self) -> Money {
        self.total_repayable
    }

    pub fn guarantor_advance(&self) -> Money {
        self.guarantor_advance
    }

    pub fn total_paid(&self) -> Money {
        self.total_paid
    }

    pub fn total_interest_paid(&self) -> Money {
        self.total_interest_paid
    }

    pub fn guarantor_reimbursed(&self) -> Money {
        self.guarantor_reimbursed
    }

    pub fn principal_remaining(&self) -> Money {
        self.principal_remaining
    }

    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    pub fn status(&self) -> LoanStatus {
        if self.is_completed {
            LoanStatus::Completed
        } else {
            LoanStatus::Active
        }
    }

    /// interest the bank earns over the life of the loan
    pub fn total_interest_due(&self) -> Money {
        self.total_repayable - self.principal
    }

    /// fixed share of every payment that is interest
    pub fn interest_share(&self) -> Rate {
        Rate::ratio(self.total_interest_due(), self.total_repayable)
    }

    /// amount the borrower still owes, floored at zero
    pub fn remaining_balance(&self) -> Money {
        self.total_repayable.saturating_sub(self.total_paid)
    }

    pub fn interest_due_remaining(&self) -> Money {
        self.total_interest_due().saturating_sub(self.total_interest_paid)
    }

    pub fn guarantor_owed(&self) -> Money {
        self.guarantor_advance.saturating_sub(self.guarantor_reimbursed)
    }

    pub fn principal_paid(&self) -> Money {
        self.principal.saturating_sub(self.principal_remaining)
    }

    pub fn to_record(&self) -> LedgerRecord {
        LedgerRecord {
            principal: self.principal,
            total_repayable: self.total_repayable,
            guarantor_advance: self.guarantor_advance,
            total_paid: self.total_paid,
            total_interest_paid: self.total_interest_paid,
            guarantor_reimbursed: self.guarantor_reimbursed,
            principal_remaining: self.principal_remaining,
            is_completed: self.is_completed,
        }
    }
}

impl TryFrom<LedgerRecord> for LoanLedgerState {
    type Error = LoanError;

    fn try_from(record: LedgerRecord) -> Result<Self> {
        LoanLedgerState::restore(record)
    }
}

impl From<LoanLedgerState> for LedgerRecord {
    fn from(state: LoanLedgerState) -> Self {
        state.to_record()
    }
}

fn validate_terms(principal: Money, total_repayable: Money, guarantor_advance: Money) -> Result<()> {
    if !principal.is_positive() {
        return Err(LoanError::InvalidConfiguration {
            message: format!("principal must be positive, got {}", principal),
        });
    }
    if total_repayable < principal {
        return Err(LoanError::InvalidConfiguration {
            message: format!(
                "total repayable {} is below principal {}",
                total_repayable, principal
            ),
        });
    }
    if guarantor_advance.is_negative() || guarantor_advance > principal {
        return Err(LoanError::InvalidConfiguration {
            message: format!(
                "guarantor advance {} must be between 0 and principal {}",
                guarantor_advance, principal
            ),
        });
    }
    Ok(())
}

fn check_bounded(field: &str, value: Money, cap: Money) -> Result<()> {
    if value.is_negative() || value > cap {
        return Err(LoanError::InvalidState {
            message: format!("{} = {} outside 0..={}", field, value, cap),
        });
    }
    Ok(())
}

/// state snapshot for audit trail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub snapshot_id: Uuid,
    pub loan_id: LoanId,
    pub timestamp: DateTime<Utc>,
    pub state: LoanLedgerState,
    pub trigger: String,
}

impl StateSnapshot {
    pub fn capture(
        loan_id: LoanId,
        state: &LoanLedgerState,
        timestamp: DateTime<Utc>,
        trigger: impl Into<String>,
    ) -> Self {
        Self {
            snapshot_id: Uuid::new_v4(),
            loan_id,
            timestamp,
            state: state.clone(),
            trigger: trigger.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn fresh() -> LoanLedgerState {
        LoanLedgerState::originate(
            Money::from_major(1_000),
            Money::from_major(1_100),
            Money::from_major(500),
        )
        .unwrap()
    }

    #[test]
    fn test_originate_starts_at_zero() {
        let state = fresh();

        assert_eq!(state.total_paid(), Money::ZERO);
        assert_eq!(state.principal_remaining(), Money::from_major(1_000));
        assert_eq!(state.total_interest_due(), Money::from_major(100));
        assert_eq!(state.remaining_balance(), Money::from_major(1_100));
        assert_eq!(state.guarantor_owed(), Money::from_major(500));
        assert_eq!(state.status(), LoanStatus::Active);
    }

    #[test]
    fn test_originate_rejects_bad_terms() {
        let zero_principal =
            LoanLedgerState::originate(Money::ZERO, Money::from_major(100), Money::ZERO);
        assert!(matches!(zero_principal, Err(LoanError::InvalidConfiguration { .. })));

        let repayable_below_principal =
            LoanLedgerState::originate(Money::from_major(1_000), Money::from_major(900), Money::ZERO);
        assert!(repayable_below_principal.is_err());

        let advance_above_principal = LoanLedgerState::originate(
            Money::from_major(1_000),
            Money::from_major(1_100),
            Money::from_major(1_001),
        );
        assert!(advance_above_principal.is_err());
    }

    #[test]
    fn test_restore_recomputes_completion() {
        let mut record = fresh().to_record();
        record.total_paid = Money::from_major(1_100);
        record.total_interest_paid = Money::from(dec!(99.99));
        record.guarantor_reimbursed = Money::from_major(500);
        record.principal_remaining = Money::ZERO;
        record.is_completed = false;

        let state = LoanLedgerState::restore(record).unwrap();
        assert!(state.is_completed());
    }

    #[test]
    fn test_restore_rejects_paid_in_full_with_short_interest() {
        let mut record = fresh().to_record();
        record.total_paid = Money::from_major(1_100);
        record.total_interest_paid = Money::from_major(99);
        record.guarantor_reimbursed = Money::from_major(500);
        record.principal_remaining = Money::from_major(500);

        let err = LoanLedgerState::restore(record).unwrap_err();
        assert!(matches!(err, LoanError::InvalidState { .. }));
    }

    #[test]
    fn test_restore_rejects_overflowing_caps() {
        let mut record = fresh().to_record();
        record.guarantor_reimbursed = Money::from_major(501);

        let err = LoanLedgerState::restore(record).unwrap_err();
        assert!(matches!(err, LoanError::InvalidState { .. }));
    }

    #[test]
    fn test_json_round_trip_validates() {
        let state = fresh();
        let json = serde_json::to_string(&state).unwrap();
        let back: LoanLedgerState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);

        let mut record = state.to_record();
        record.total_paid = Money::from_major(5_000);
        let bad = serde_json::to_string(&record).unwrap();
        assert!(serde_json::from_str::<LoanLedgerState>(&bad).is_err());
    }
}
