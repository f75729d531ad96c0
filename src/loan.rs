use hourglass_rs::{SafeTimeProvider, TimeSource};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::allocation::{apply_payment, summarize, LoanSummary, RepaymentBreakdown};
use crate::config::LoanTerms;
use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};
use crate::events::{Event, EventStore};
use crate::guarantors::{GuarantorCredit, GuarantorRegistry, GuarantorShare};
use crate::ledger::LedgerEntry;
use crate::state::{LoanLedgerState, StateSnapshot};
use crate::types::{EntryCategory, LoanId};

/// result of allocating one payment, ready to post and commit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentOutcome {
    pub loan_id: LoanId,
    /// state the outcome was computed from
    pub prior_state: LoanLedgerState,
    pub breakdown: RepaymentBreakdown,
    pub guarantor_credits: Vec<GuarantorCredit>,
}

impl PaymentOutcome {
    pub fn updated_state(&self) -> &LoanLedgerState {
        &self.breakdown.updated_state
    }

    pub fn completes_loan(&self) -> bool {
        self.breakdown.updated_state.is_completed()
    }

    /// ledger postings for this payment, interest first
    pub fn ledger_entries(&self, account_number: &str) -> Vec<LedgerEntry> {
        let mut entries = Vec::with_capacity(self.guarantor_credits.len() + 2);

        if self.breakdown.interest_paid.is_positive() {
            entries.push(LedgerEntry::InterestIncome {
                loan_id: self.loan_id,
                account_number: account_number.to_string(),
                amount: self.breakdown.interest_paid,
                category: EntryCategory::LoanInterest,
            });
        }

        for credit in self.guarantor_credits.iter().filter(|c| c.amount.is_positive()) {
            entries.push(LedgerEntry::GuarantorCredit {
                loan_id: self.loan_id,
                guarantor_id: credit.guarantor_id,
                account_id: credit.account_id.clone(),
                amount: credit.amount,
            });
        }

        if self.breakdown.borrower_benefit.is_positive() {
            entries.push(LedgerEntry::PrincipalReduction {
                loan_id: self.loan_id,
                account_number: account_number.to_string(),
                amount: self.breakdown.borrower_benefit,
            });
        }

        entries
    }
}

/// a loan with its guarantors, events and audit snapshots
#[derive(Debug)]
pub struct GuaranteedLoan {
    pub id: LoanId,
    pub account_number: String,
    pub customer_id: String,
    pub terms: LoanTerms,
    state: LoanLedgerState,
    guarantors: GuarantorRegistry,
    pub events: EventStore,
    pub snapshots: Vec<StateSnapshot>,
}

impl GuaranteedLoan {
    /// originate a loan from validated terms
    pub fn originate(
        terms: LoanTerms,
        account_number: String,
        customer_id: String,
        time_provider: &SafeTimeProvider,
    ) -> Result<Self> {
        terms.validate()?;
        let state = terms.initial_state()?;
        let guarantors = terms.registry()?;

        let id = Uuid::new_v4();
        let now = time_provider.now();

        let mut loan = Self {
            id,
            account_number,
            customer_id,
            terms,
            state,
            guarantors,
            events: EventStore::new(),
            snapshots: Vec::new(),
        };

        loan.events.emit(Event::LoanOriginated {
            loan_id: id,
            principal: loan.state.principal(),
            total_repayable: loan.state.total_repayable(),
            guarantor_advance: loan.state.guarantor_advance(),
            timestamp: now,
        });
        loan.snapshots
            .push(StateSnapshot::capture(id, &loan.state, now, "origination"));

        info!(
            loan_id = %id,
            principal = %loan.state.principal(),
            total_repayable = %loan.state.total_repayable(),
            guarantors = loan.guarantors.positions().len(),
            "loan originated"
        );

        Ok(loan)
    }

    /// builder for guaranteed loans
    pub fn builder() -> GuaranteedLoanBuilder {
        GuaranteedLoanBuilder::new()
    }

    pub fn state(&self) -> &LoanLedgerState {
        &self.state
    }

    pub fn guarantors(&self) -> &GuarantorRegistry {
        &self.guarantors
    }

    pub fn summary(&self) -> LoanSummary {
        summarize(&self.state)
    }

    pub fn is_completed(&self) -> bool {
        self.state.is_completed()
    }

    /// allocate a payment without changing the loan
    pub fn quote_payment(&self, amount: Money) -> Result<PaymentOutcome> {
        let breakdown = apply_payment(&self.state, amount)?;
        let guarantor_credits = if self.guarantors.is_empty() {
            Vec::new()
        } else {
            self.guarantors.distribute(breakdown.guarantor_reimbursement)?
        };

        debug!(
            loan_id = %self.id,
            requested = %amount,
            applied = %breakdown.actual_payment,
            interest = %breakdown.interest_paid,
            guarantor = %breakdown.guarantor_reimbursement,
            principal = %breakdown.borrower_benefit,
            "payment quoted"
        );

        Ok(PaymentOutcome {
            loan_id: self.id,
            prior_state: self.state.clone(),
            breakdown,
            guarantor_credits,
        })
    }

    /// install a quoted outcome
    ///
    /// Fails with `StaleOutcome` if the loan changed since the quote, in
    /// which case nothing is modified and the caller must quote again.
    pub fn commit(&mut self, outcome: &PaymentOutcome, time_provider: &SafeTimeProvider) -> Result<()> {
        if outcome.loan_id != self.id || outcome.prior_state != self.state {
            return Err(LoanError::StaleOutcome);
        }

        let guarantors = self.guarantors.apply_credits(&outcome.guarantor_credits)?;
        let breakdown = &outcome.breakdown;
        let now = time_provider.now();

        self.state = breakdown.updated_state.clone();
        self.guarantors = guarantors;

        if breakdown.was_clamped() {
            warn!(
                loan_id = %self.id,
                requested = %breakdown.requested_amount,
                applied = %breakdown.actual_payment,
                "overpayment clamped to remaining balance"
            );
            self.events.emit(Event::OverpaymentClamped {
                loan_id: self.id,
                requested: breakdown.requested_amount,
                applied: breakdown.actual_payment,
                excess: breakdown.excess(),
                timestamp: now,
            });
        }

        self.events.emit(Event::PaymentReceived {
            loan_id: self.id,
            amount: breakdown.actual_payment,
            applied_to_interest: breakdown.interest_paid,
            applied_to_guarantor: breakdown.guarantor_reimbursement,
            applied_to_principal: breakdown.borrower_benefit,
            remaining_balance: breakdown.remaining_balance,
            timestamp: now,
        });

        for credit in &outcome.guarantor_credits {
            let remaining_owed = self
                .guarantors
                .position(credit.guarantor_id)
                .map(|p| p.remaining_owed())
                .unwrap_or(Money::ZERO);
            self.events.emit(Event::GuarantorReimbursed {
                loan_id: self.id,
                guarantor_id: credit.guarantor_id,
                amount: credit.amount,
                remaining_owed,
                timestamp: now,
            });
        }

        info!(
            loan_id = %self.id,
            amount = %breakdown.actual_payment,
            remaining = %breakdown.remaining_balance,
            "payment applied"
        );

        if self.state.is_completed() {
            self.events.emit(Event::LoanCompleted {
                loan_id: self.id,
                total_paid: self.state.total_paid(),
                final_payment: breakdown.actual_payment,
                timestamp: now,
            });
            info!(loan_id = %self.id, total_paid = %self.state.total_paid(), "loan completed");
        }

        self.snapshots
            .push(StateSnapshot::capture(self.id, &self.state, now, "payment"));

        Ok(())
    }

    /// quote and commit in one step
    pub fn make_payment(
        &mut self,
        amount: Money,
        time_provider: &SafeTimeProvider,
    ) -> Result<PaymentOutcome> {
        let outcome = match self.quote_payment(amount) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.reject(amount, &e, time_provider);
                return Err(e);
            }
        };
        self.commit(&outcome, time_provider)?;
        Ok(outcome)
    }

    pub(crate) fn reject(&mut self, amount: Money, error: &LoanError, time_provider: &SafeTimeProvider) {
        if !error.is_rejection() {
            return;
        }
        warn!(loan_id = %self.id, amount = %amount, error = %error, "payment rejected");
        self.events.emit(Event::PaymentRejected {
            loan_id: self.id,
            amount,
            reason: error.to_string(),
            timestamp: time_provider.now(),
        });
    }

    /// get json representation of current state
    pub fn to_json_pretty(&self) -> String {
        use crate::view::LoanView;

        serde_json::to_string_pretty(&LoanView::from_loan(self))
            .unwrap_or_else(|e| format!("JSON error: {}", e))
    }

    /// short alias for json output
    pub fn json(&self) -> String {
        self.to_json_pretty()
    }
}

/// builder for guaranteed loans
#[derive(Debug, Default)]
pub struct GuaranteedLoanBuilder {
    principal: Option<Money>,
    rate: Option<Rate>,
    total_repayable: Option<Money>,
    guarantor_advance: Option<Money>,
    guarantors: Vec<GuarantorShare>,
    account_number: Option<String>,
    customer_id: Option<String>,
}

impl GuaranteedLoanBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn principal(mut self, principal: Money) -> Self {
        self.principal = Some(principal);
        self
    }

    /// flat interest rate on the principal
    pub fn rate(mut self, rate: Rate) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn total_repayable(mut self, total: Money) -> Self {
        self.total_repayable = Some(total);
        self
    }

    pub fn guarantor_advance(mut self, advance: Money) -> Self {
        self.guarantor_advance = Some(advance);
        self
    }

    pub fn guarantor(
        mut self,
        name: impl Into<String>,
        account_id: impl Into<String>,
        percentage: Decimal,
    ) -> Self {
        self.guarantors
            .push(GuarantorShare::new(name, account_id, percentage));
        self
    }

    pub fn account_number(mut self, account: impl Into<String>) -> Self {
        self.account_number = Some(account.into());
        self
    }

    pub fn customer_id(mut self, customer: impl Into<String>) -> Self {
        self.customer_id = Some(customer.into());
        self
    }

    pub fn terms(&self) -> Result<LoanTerms> {
        let principal = self.principal.ok_or(LoanError::InvalidConfiguration {
            message: "Principal required".to_string(),
        })?;

        if self.rate.is_none() && self.total_repayable.is_none() {
            return Err(LoanError::InvalidConfiguration {
                message: "Rate or total repayable required".to_string(),
            });
        }

        Ok(LoanTerms {
            principal,
            interest_rate: self.rate.unwrap_or(Rate::ZERO),
            total_repayable: self.total_repayable,
            guarantor_advance: self.guarantor_advance.unwrap_or(Money::ZERO),
            guarantors: self.guarantors.clone(),
        })
    }

    /// build with system time
    pub fn build(self) -> Result<GuaranteedLoan> {
        let time = SafeTimeProvider::new(TimeSource::System);
        self.build_with_time(&time)
    }

    /// build with explicit time provider
    pub fn build_with_time(self, time_provider: &SafeTimeProvider) -> Result<GuaranteedLoan> {
        let terms = self.terms()?;

        let account_number = self.account_number.unwrap_or_else(|| {
            format!("LN-{}", Uuid::new_v4().to_string()[..8].to_uppercase())
        });

        let customer_id = self.customer_id.unwrap_or_else(|| {
            format!("CUST-{}", Uuid::new_v4().to_string()[..8].to_uppercase())
        });

        GuaranteedLoan::originate(terms, account_number, customer_id, time_provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn test_time() -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        ))
    }

    fn create_test_loan(time: &SafeTimeProvider) -> GuaranteedLoan {
        GuaranteedLoan::builder()
            .principal(Money::from_major(1_000))
            .rate(Rate::from_percentage(10))
            .guarantor_advance(Money::from_major(500))
            .guarantor("alice", "ACC-A", dec!(60))
            .guarantor("bob", "ACC-B", dec!(40))
            .account_number("LN-001")
            .customer_id("CUST-123")
            .build_with_time(time)
            .unwrap()
    }

    #[test]
    fn test_builder_originates() {
        let time = test_time();
        let loan = create_test_loan(&time);

        assert_eq!(loan.state().total_repayable(), Money::from_major(1_100));
        assert_eq!(loan.guarantors().total_owed(), Money::from_major(500));
        assert_eq!(loan.snapshots.len(), 1);
        assert!(matches!(loan.events.events()[0], Event::LoanOriginated { .. }));
    }

    #[test]
    fn test_builder_requires_principal_and_pricing() {
        let missing_principal = GuaranteedLoan::builder()
            .rate(Rate::from_percentage(10))
            .build_with_time(&test_time());
        assert!(missing_principal.is_err());

        let missing_rate = GuaranteedLoan::builder()
            .principal(Money::from_major(1_000))
            .build_with_time(&test_time());
        assert!(missing_rate.is_err());
    }

    #[test]
    fn test_quote_does_not_mutate() {
        let time = test_time();
        let loan = create_test_loan(&time);

        let outcome = loan.quote_payment(Money::from_major(200)).unwrap();
        assert_eq!(outcome.breakdown.guarantor_reimbursement, Money::from(dec!(181.82)));
        assert_eq!(loan.state().total_paid(), Money::ZERO);
        assert_eq!(loan.events.events().len(), 1);
    }

    #[test]
    fn test_payment_splits_across_guarantors() {
        let time = test_time();
        let mut loan = create_test_loan(&time);

        let outcome = loan.make_payment(Money::from_major(275), &time).unwrap();

        // 275 -> 25 interest, 250 to guarantors 60/40
        assert_eq!(outcome.breakdown.interest_paid, Money::from_major(25));
        assert_eq!(outcome.guarantor_credits[0].amount, Money::from_major(150));
        assert_eq!(outcome.guarantor_credits[1].amount, Money::from_major(100));
        assert_eq!(loan.guarantors().positions()[0].remaining_owed(), Money::from_major(150));
        assert_eq!(loan.guarantors().positions()[1].remaining_owed(), Money::from_major(100));

        let entries = outcome.ledger_entries(&loan.account_number);
        assert_eq!(entries.len(), 3);
        assert!(matches!(entries[0], LedgerEntry::InterestIncome { .. }));
        assert_eq!(entries[0].amount(), Money::from_major(25));
    }

    #[test]
    fn test_stale_outcome_rejected() {
        let time = test_time();
        let mut loan = create_test_loan(&time);

        let first = loan.quote_payment(Money::from_major(100)).unwrap();
        let second = loan.quote_payment(Money::from_major(100)).unwrap();

        loan.commit(&first, &time).unwrap();
        let err = loan.commit(&second, &time).unwrap_err();

        assert!(matches!(err, LoanError::StaleOutcome));
        assert_eq!(loan.state().total_paid(), Money::from_major(100));
    }

    #[test]
    fn test_rejected_payment_recorded() {
        let time = test_time();
        let mut loan = create_test_loan(&time);

        let err = loan.make_payment(Money::ZERO, &time).unwrap_err();
        assert!(matches!(err, LoanError::InvalidAmount { .. }));
        assert!(matches!(
            loan.events.events().last(),
            Some(Event::PaymentRejected { .. })
        ));
        assert_eq!(loan.state().total_paid(), Money::ZERO);
    }

    #[test]
    fn test_completion_events() {
        let time = test_time();
        let mut loan = create_test_loan(&time);

        loan.make_payment(Money::from_major(1_500), &time).unwrap();

        assert!(loan.is_completed());
        let events = loan.events.take_events();
        assert!(events.iter().any(|e| matches!(e, Event::OverpaymentClamped { .. })));
        assert!(events.iter().any(|e| matches!(e, Event::LoanCompleted { .. })));
        let reimbursed = events
            .iter()
            .filter(|e| matches!(e, Event::GuarantorReimbursed { .. }))
            .count();
        assert_eq!(reimbursed, 2);
        assert_eq!(loan.guarantors().total_owed(), Money::ZERO);

        assert!(matches!(
            loan.make_payment(Money::ONE, &time),
            Err(LoanError::LoanAlreadyCompleted)
        ));
    }

    #[test]
    fn test_json_output() {
        let time = test_time();
        let loan = create_test_loan(&time);
        let json: serde_json::Value = serde_json::from_str(&loan.json()).unwrap();

        assert_eq!(json["account_number"], "LN-001");
        assert_eq!(json["summary"]["status"], "active");
    }
}
