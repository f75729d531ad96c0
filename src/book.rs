use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use hourglass_rs::SafeTimeProvider;
use tracing::warn;

use crate::allocation::LoanSummary;
use crate::decimal::Money;
use crate::errors::{LoanError, Result};
use crate::ledger::LedgerPoster;
use crate::loan::{GuaranteedLoan, PaymentOutcome};
use crate::state::LoanLedgerState;
use crate::types::LoanId;

/// in-memory loan record store
///
/// Each loan sits behind its own mutex, so payments on one loan are applied
/// strictly one at a time while different loans proceed in parallel.
#[derive(Debug, Default)]
pub struct LoanBook {
    loans: RwLock<HashMap<LoanId, Arc<Mutex<GuaranteedLoan>>>>,
}

impl LoanBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, loan: GuaranteedLoan) -> Result<LoanId> {
        let id = loan.id;
        self.loans
            .write()
            .map_err(|_| poisoned("loan book"))?
            .insert(id, Arc::new(Mutex::new(loan)));
        Ok(id)
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.loans.read().map_err(|_| poisoned("loan book"))?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn entry(&self, id: LoanId) -> Result<Arc<Mutex<GuaranteedLoan>>> {
        self.loans
            .read()
            .map_err(|_| poisoned("loan book"))?
            .get(&id)
            .cloned()
            .ok_or(LoanError::LoanNotFound { id })
    }

    /// run `f` against a locked loan
    pub fn with_loan<R>(&self, id: LoanId, f: impl FnOnce(&GuaranteedLoan) -> R) -> Result<R> {
        let entry = self.entry(id)?;
        let loan = lock(&entry)?;
        Ok(f(&loan))
    }

    pub fn state(&self, id: LoanId) -> Result<LoanLedgerState> {
        self.with_loan(id, |loan| loan.state().clone())
    }

    pub fn summary(&self, id: LoanId) -> Result<LoanSummary> {
        self.with_loan(id, |loan| loan.summary())
    }

    /// apply a payment, posting its ledger entries before committing
    ///
    /// The loan stays locked from quote to commit. If posting fails the
    /// quoted outcome is dropped and the loan is left exactly as it was.
    pub fn apply_payment<P: LedgerPoster>(
        &self,
        id: LoanId,
        amount: Money,
        ledger: &Mutex<P>,
        time_provider: &SafeTimeProvider,
    ) -> Result<PaymentOutcome> {
        let entry = self.entry(id)?;
        let mut loan = lock(&entry)?;

        let outcome = match loan.quote_payment(amount) {
            Ok(outcome) => outcome,
            Err(e) => {
                loan.reject(amount, &e, time_provider);
                return Err(e);
            }
        };

        let entries = outcome.ledger_entries(&loan.account_number);
        if let Err(e) = lock(ledger)?.post(&entries) {
            warn!(loan_id = %id, amount = %amount, error = %e, "ledger posting failed, payment discarded");
            return Err(match e {
                LoanError::LedgerPostingFailed { .. } => e,
                other => LoanError::LedgerPostingFailed {
                    message: other.to_string(),
                },
            });
        }

        // quoted under the lock still held here, so commit sees the same
        // state and registry and cannot fail once the ledger has the entries
        debug_assert!(outcome.prior_state == *loan.state());
        loan.commit(&outcome, time_provider)?;
        Ok(outcome)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex.lock().map_err(|_| poisoned("mutex"))
}

fn poisoned(what: &str) -> LoanError {
    LoanError::InvalidState {
        message: format!("{} lock poisoned", what),
    }
}
