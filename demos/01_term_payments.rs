/// term payments - configured structures, term dues, and spread payments
use rust_decimal::Decimal;
use school_fees_rs::{
    AccountStore, BusFeeStructure, ClassFeeStructure, ClassLevel, ComponentAmounts, FeeAggregator,
    InMemoryFeeStructureStore, Money, PaymentMode, PaymentRequest, SafeTimeProvider,
    StudentAccount, StudentFeeProfile, TimeSource, Uuid, VehicleType,
};

const YEAR: &str = "2025-2026";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let time = SafeTimeProvider::new(TimeSource::System);
    let now = time.now();

    // configure structures for the year
    let mut structures = InMemoryFeeStructureStore::new();
    structures.add_class_fee(ClassFeeStructure::new(
        ClassLevel::Grade(8),
        YEAR,
        Money::from_major(50_000),
        3,
        ComponentAmounts::default(),
        Some("admin".to_string()),
        now,
    )?)?;
    structures.add_bus_fee(BusFeeStructure::new(
        "Rampur",
        YEAR,
        Decimal::from(6),
        Money::from_major(9_000),
        VehicleType::Bus,
        Some("admin".to_string()),
        now,
    )?)?;

    let aggregator = FeeAggregator::new(&structures);
    let accounts = AccountStore::new();

    let mut profile = StudentFeeProfile::day_scholar(Uuid::new_v4(), ClassLevel::Grade(8), YEAR);
    profile.village = Some("Rampur".to_string());
    profile.uses_transport = true;
    let student_id = profile.student_id;
    accounts.insert(StudentAccount::new(profile))?;

    let snapshot = accounts.compute_annual_fee(student_id, &aggregator, &time)?;
    println!(
        "school {} over {} terms, transport {} over {} terms",
        snapshot.school_fee, snapshot.school_terms, snapshot.transport_fee, snapshot.transport_terms
    );

    // term 1 of 50000/3 is 16667; paying 20000 against it is rejected
    if let Err(err) = accounts.pay(student_id, &school_payment(Some(1), 20_000), &time) {
        println!("over-payment attempt: {}", err);
    }

    // pay term 1 exactly, then spread 20000 across the remaining terms
    accounts.pay(student_id, &school_payment(Some(1), 16_667), &time)?;
    let spread = accounts.pay(student_id, &school_payment(None, 20_000), &time)?;
    for allocation in &spread.allocations {
        println!(
            "  {} term {} <- {}",
            allocation.component, allocation.term, allocation.amount
        );
    }

    let account = accounts.get(student_id)?;
    let snapshot = account.snapshot(YEAR).ok_or("missing snapshot")?;
    println!("paid {} of {}", snapshot.total_paid(), snapshot.total_fee());

    Ok(())
}

fn school_payment(term: Option<u8>, amount: i64) -> PaymentRequest {
    PaymentRequest {
        academic_year: YEAR.to_string(),
        term,
        school_fee_paid: Money::from_major(amount),
        transport_fee_paid: Money::ZERO,
        hostel_fee_paid: Money::ZERO,
        payment_mode: PaymentMode::Upi,
        description: None,
        received_by: "front office".to_string(),
    }
}
