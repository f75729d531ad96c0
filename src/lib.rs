pub mod allocation;
pub mod book;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod guarantors;
pub mod ledger;
pub mod loan;
pub mod state;
pub mod types;
pub mod view;

// re-export key types
pub use allocation::{apply_payment, summarize, LoanSummary, RepaymentBreakdown};
pub use book::LoanBook;
pub use config::LoanTerms;
pub use decimal::{round2, Money, Rate};
pub use errors::{LoanError, Result};
pub use events::{Event, EventStore};
pub use guarantors::{GuarantorCredit, GuarantorPosition, GuarantorRegistry, GuarantorShare};
pub use ledger::{InMemoryLedger, LedgerEntry, LedgerPoster};
pub use loan::{GuaranteedLoan, GuaranteedLoanBuilder, PaymentOutcome};
pub use state::{LedgerRecord, LoanLedgerState, StateSnapshot};
pub use types::{EntryCategory, GuarantorId, LoanId, LoanStatus};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
