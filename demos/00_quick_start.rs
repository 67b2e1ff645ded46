/// quick start - compute a fee and take a term payment
use school_fees_rs::{
    AccountStore, ClassLevel, FeeAggregator, InMemoryFeeStructureStore, Money, PaymentMode,
    PaymentRequest, Rate, SafeTimeProvider, StudentAccount, StudentFeeProfile, TimeSource, Uuid,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let structures = InMemoryFeeStructureStore::new();
    let aggregator = FeeAggregator::new(&structures);
    let accounts = AccountStore::new();
    let time = SafeTimeProvider::new(TimeSource::System);

    // enrol a grade 5 day scholar with a 10% school fee concession
    let mut profile =
        StudentFeeProfile::day_scholar(Uuid::new_v4(), ClassLevel::Grade(5), "2025-2026");
    profile.school_fee_discount = Rate::from_percentage(10);
    let student_id = profile.student_id;
    accounts.insert(StudentAccount::new(profile))?;

    // no structures configured yet: the fee comes from flagged defaults
    let snapshot = accounts.compute_annual_fee(student_id, &aggregator, &time)?;
    println!("annual fee: {} (defaults: {})", snapshot.total_fee(), snapshot.used_defaults);

    // pay term 1
    let record = accounts.pay(
        student_id,
        &PaymentRequest {
            academic_year: "2025-2026".to_string(),
            term: Some(1),
            school_fee_paid: Money::from_major(9_000),
            transport_fee_paid: Money::ZERO,
            hostel_fee_paid: Money::ZERO,
            payment_mode: PaymentMode::Cash,
            description: None,
            received_by: "front office".to_string(),
        },
        &time,
    )?;
    println!("receipt {} for {}", record.receipt_no, record.total_amount);

    Ok(())
}
