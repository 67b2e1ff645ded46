use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{FeeError, Result};
use crate::types::{FeeComponent, PaymentMode, PaymentStatus};

/// attempts before giving up on receipt-number generation
const MAX_RECEIPT_ATTEMPTS: u32 = 8;

/// how an auto-distributed payment was spread across terms. explicit
/// term-scoped payments carry their term on the record itself instead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TermAllocation {
    pub component: FeeComponent,
    pub term: u8,
    pub amount: Money,
}

/// one payment transaction, append-only. the component amounts are this
/// transaction's contribution, not cumulative totals. term attribution is
/// the structured `term` field (or `allocations` for spread payments); the
/// description text is display-only and never parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub payment_id: Uuid,
    pub academic_year: String,
    pub date: DateTime<Utc>,
    pub school_fee_paid: Money,
    pub transport_fee_paid: Money,
    pub hostel_fee_paid: Money,
    pub total_amount: Money,
    pub receipt_no: String,
    pub payment_mode: PaymentMode,
    pub description: String,
    pub term: Option<u8>,
    pub allocations: Vec<TermAllocation>,
    pub received_by: String,
    pub status: PaymentStatus,
}

impl PaymentRecord {
    pub fn component_amount(&self, component: FeeComponent) -> Money {
        match component {
            FeeComponent::School => self.school_fee_paid,
            FeeComponent::Transport => self.transport_fee_paid,
            FeeComponent::Hostel => self.hostel_fee_paid,
        }
    }
}

/// append-only payment history for one student
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentLedger {
    records: Vec<PaymentRecord>,
}

impl PaymentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: PaymentRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[PaymentRecord] {
        &self.records
    }

    pub fn for_year<'a>(&'a self, academic_year: &'a str) -> impl Iterator<Item = &'a PaymentRecord> {
        self.records
            .iter()
            .filter(move |r| r.academic_year == academic_year && r.status == PaymentStatus::Completed)
    }

    /// sum of all completed payments for a year; must always equal the
    /// snapshot's total_paid for that year
    pub fn total_paid(&self, academic_year: &str) -> Money {
        self.for_year(academic_year).map(|r| r.total_amount).sum()
    }

    /// amount already attributed to (component, term) for a year, counting
    /// both explicit term-scoped records and spread allocations
    pub fn paid_for_term(&self, academic_year: &str, component: FeeComponent, term: u8) -> Money {
        self.for_year(academic_year)
            .map(|r| {
                if r.term == Some(term) {
                    r.component_amount(component)
                } else {
                    r.allocations
                        .iter()
                        .filter(|a| a.component == component && a.term == term)
                        .map(|a| a.amount)
                        .sum()
                }
            })
            .sum()
    }

    pub fn contains_receipt(&self, receipt_no: &str) -> bool {
        self.records.iter().any(|r| r.receipt_no == receipt_no)
    }
}

/// generate a receipt number: RCPT-YYMMDD-XXXX with a random 4-digit suffix
pub fn generate_receipt_no(date: DateTime<Utc>, rng: &mut impl Rng) -> String {
    format!("RCPT-{}-{:04}", date.format("%y%m%d"), rng.gen_range(0..10_000u32))
}

/// generate a receipt number that `is_taken` does not already know. the
/// random suffix alone is not collision-safe at volume, so uniqueness is
/// checked against storage and generation retried on conflict.
pub fn unique_receipt_no<F>(date: DateTime<Utc>, is_taken: F) -> Result<String>
where
    F: Fn(&str) -> bool,
{
    let mut rng = rand::thread_rng();
    for attempt in 1..=MAX_RECEIPT_ATTEMPTS {
        let candidate = generate_receipt_no(date, &mut rng);
        if !is_taken(&candidate) {
            return Ok(candidate);
        }
        warn!(receipt_no = %candidate, attempt, "receipt number collision; regenerating");
    }
    Err(FeeError::ReceiptCollision {
        attempts: MAX_RECEIPT_ATTEMPTS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(year: &str, term: Option<u8>, school: i64, receipt: &str) -> PaymentRecord {
        PaymentRecord {
            payment_id: Uuid::new_v4(),
            academic_year: year.to_string(),
            date: Utc::now(),
            school_fee_paid: Money::from_major(school),
            transport_fee_paid: Money::ZERO,
            hostel_fee_paid: Money::ZERO,
            total_amount: Money::from_major(school),
            receipt_no: receipt.to_string(),
            payment_mode: PaymentMode::Cash,
            description: term
                .map(|t| format!("Term {} Payment", t))
                .unwrap_or_else(|| "Annual Fee Payment".to_string()),
            term,
            allocations: Vec::new(),
            received_by: "office".to_string(),
            status: PaymentStatus::Completed,
        }
    }

    #[test]
    fn test_total_paid_per_year() {
        let mut ledger = PaymentLedger::new();
        ledger.append(record("2025-2026", Some(1), 15_000, "RCPT-250601-0001"));
        ledger.append(record("2025-2026", Some(2), 15_000, "RCPT-250901-0002"));
        ledger.append(record("2024-2025", Some(3), 10_000, "RCPT-240901-0003"));

        assert_eq!(ledger.total_paid("2025-2026"), Money::from_major(30_000));
        assert_eq!(ledger.total_paid("2024-2025"), Money::from_major(10_000));
        assert_eq!(ledger.total_paid("2023-2024"), Money::ZERO);
    }

    #[test]
    fn test_paid_for_term_explicit_and_allocated() {
        let mut ledger = PaymentLedger::new();
        ledger.append(record("2025-2026", Some(1), 10_000, "RCPT-250601-0001"));

        let mut spread = record("2025-2026", None, 8_000, "RCPT-250901-0002");
        spread.allocations = vec![
            TermAllocation {
                component: FeeComponent::School,
                term: 1,
                amount: Money::from_major(5_000),
            },
            TermAllocation {
                component: FeeComponent::School,
                term: 2,
                amount: Money::from_major(3_000),
            },
        ];
        ledger.append(spread);

        assert_eq!(
            ledger.paid_for_term("2025-2026", FeeComponent::School, 1),
            Money::from_major(15_000)
        );
        assert_eq!(
            ledger.paid_for_term("2025-2026", FeeComponent::School, 2),
            Money::from_major(3_000)
        );
        assert_eq!(
            ledger.paid_for_term("2025-2026", FeeComponent::Transport, 1),
            Money::ZERO
        );
    }

    #[test]
    fn test_cancelled_records_excluded() {
        let mut ledger = PaymentLedger::new();
        let mut cancelled = record("2025-2026", Some(1), 15_000, "RCPT-250601-0001");
        cancelled.status = PaymentStatus::Cancelled;
        ledger.append(cancelled);

        assert_eq!(ledger.total_paid("2025-2026"), Money::ZERO);
        assert_eq!(
            ledger.paid_for_term("2025-2026", FeeComponent::School, 1),
            Money::ZERO
        );
    }

    #[test]
    fn test_receipt_format() {
        let date = Utc.with_ymd_and_hms(2025, 6, 14, 10, 30, 0).unwrap();
        let mut rng = rand::thread_rng();
        let receipt = generate_receipt_no(date, &mut rng);
        assert!(receipt.starts_with("RCPT-250614-"));
        assert_eq!(receipt.len(), "RCPT-250614-0000".len());
    }

    #[test]
    fn test_unique_receipt_retries_on_collision() {
        let date = Utc.with_ymd_and_hms(2025, 6, 14, 10, 30, 0).unwrap();
        // reject the first few candidates; generation must keep trying
        let seen = std::cell::RefCell::new(0u32);
        let receipt = unique_receipt_no(date, |_| {
            let mut count = seen.borrow_mut();
            *count += 1;
            *count <= 3
        })
        .unwrap();
        assert!(receipt.starts_with("RCPT-250614-"));
        assert_eq!(*seen.borrow(), 4);
    }

    #[test]
    fn test_unique_receipt_gives_up_eventually() {
        let date = Utc.with_ymd_and_hms(2025, 6, 14, 10, 30, 0).unwrap();
        let result = unique_receipt_no(date, |_| true);
        assert!(matches!(result, Err(FeeError::ReceiptCollision { .. })));
    }
}
