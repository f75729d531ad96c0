/// loan book - serialized payment application with ledger posting
use std::sync::Mutex;

use guarantor_loan_rs::{
    EntryCategory, GuaranteedLoan, InMemoryLedger, LoanBook, LoanTerms, Money, SafeTimeProvider,
    TimeSource,
};

const TERMS: &str = r#"{
    "principal": "5000",
    "interest_rate": "0.12",
    "guarantor_advance": "2000",
    "guarantors": [
        {
            "guarantor_id": "6f1c1f4e-2b0e-4c9a-9a43-6a8a2f5d7b10",
            "name": "savings group",
            "account_id": "ACC-SG-01",
            "percentage": "100"
        }
    ]
}"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let time = SafeTimeProvider::new(TimeSource::System);

    let terms = LoanTerms::from_json(TERMS)?;
    println!("total repayable: {}", terms.total_repayable()?);

    let loan = GuaranteedLoan::originate(terms, "LN-5000".to_string(), "CUST-7".to_string(), &time)?;

    let book = LoanBook::new();
    let id = book.insert(loan)?;
    let ledger = Mutex::new(InMemoryLedger::new());

    for amount in [1_000, 1_000, 1_500, 3_000] {
        let outcome = book.apply_payment(id, Money::from_major(amount), &ledger, &time)?;
        println!(
            "paid {} -> interest {}, guarantor {}, principal {}",
            outcome.breakdown.actual_payment,
            outcome.breakdown.interest_paid,
            outcome.breakdown.guarantor_reimbursement,
            outcome.breakdown.borrower_benefit,
        );
    }

    let summary = book.summary(id)?;
    println!("\n{}", serde_json::to_string_pretty(&summary)?);

    let ledger = ledger.lock().map_err(|_| "ledger lock poisoned")?;
    println!("\nledger totals:");
    for category in [
        EntryCategory::LoanInterest,
        EntryCategory::GuarantorReimbursement,
        EntryCategory::PrincipalReduction,
    ] {
        println!("  {:<24} {}", category.as_str(), ledger.total(category));
    }

    Ok(())
}
