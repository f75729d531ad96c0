/// guaranteed loan - allocate a series of payments and watch the split
use guarantor_loan_rs::{GuaranteedLoan, Money, Rate, SafeTimeProvider, TimeSource};
use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    ));

    // 1,000 at a flat 10%, half of it fronted by two guarantors
    let mut loan = GuaranteedLoan::builder()
        .principal(Money::from_major(1_000))
        .rate(Rate::from_percentage(10))
        .guarantor_advance(Money::from_major(500))
        .guarantor("chama treasurer", "ACC-G-001", dec!(60))
        .guarantor("village elder", "ACC-G-002", dec!(40))
        .customer_id("CUST-0042")
        .build_with_time(&time)?;

    println!("=== guaranteed loan ===\n");
    println!("{}\n", loan.json());

    for amount in [200, 300, 500, 250] {
        let outcome = loan.make_payment(Money::from_major(amount), &time)?;
        let b = &outcome.breakdown;

        println!("payment of {}:", b.requested_amount);
        println!("  applied:    {}", b.actual_payment);
        println!("  interest:   {}", b.interest_paid);
        println!("  guarantors: {}", b.guarantor_reimbursement);
        for credit in &outcome.guarantor_credits {
            println!("    -> {} {}", credit.account_id, credit.amount);
        }
        println!("  principal:  {}", b.borrower_benefit);
        if b.was_clamped() {
            println!("  returned:   {} (overpayment)", b.excess());
        }
        println!("  remaining:  {}\n", b.remaining_balance);
    }

    println!("final state:");
    println!("{}", loan.json());

    // completed loans refuse further payments
    if let Err(e) = loan.make_payment(Money::from_major(10), &time) {
        println!("\nextra payment rejected: {}", e);
    }

    Ok(())
}
