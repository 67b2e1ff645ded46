/// fee views - json output for display and receipt collaborators
use school_fees_rs::{
    AccountStore, ClassLevel, FeeAggregator, InMemoryFeeStructureStore, Money, PaymentMode,
    PaymentRequest, SafeTimeProvider, StudentAccount, StudentFeeProfile, StudentFeeView,
    TimeSource, Uuid,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let structures = InMemoryFeeStructureStore::new();
    let aggregator = FeeAggregator::new(&structures);
    let accounts = AccountStore::new();
    let time = SafeTimeProvider::new(TimeSource::System);

    let profile =
        StudentFeeProfile::day_scholar(Uuid::new_v4(), ClassLevel::Ukg, "2025-2026");
    let student_id = profile.student_id;
    accounts.insert(StudentAccount::new(profile))?;
    accounts.compute_annual_fee(student_id, &aggregator, &time)?;

    accounts.pay(
        student_id,
        &PaymentRequest {
            academic_year: "2025-2026".to_string(),
            term: Some(1),
            school_fee_paid: Money::from_major(10_000),
            transport_fee_paid: Money::ZERO,
            hostel_fee_paid: Money::ZERO,
            payment_mode: PaymentMode::BankTransfer,
            description: Some("Term 1 Payment".to_string()),
            received_by: "front office".to_string(),
        },
        &time,
    )?;

    let account = accounts.get(student_id)?;
    let view = StudentFeeView::from_account(&account, "2025-2026")?;
    println!("{}", view.to_json_pretty()?);

    // the ledger events feed downstream notification collaborators
    for event in accounts.drain_events(student_id)? {
        println!("{:?}", event);
    }

    Ok(())
}
