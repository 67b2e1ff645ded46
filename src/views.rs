/// serializable views consumed by display and receipt collaborators
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::account::StudentAccount;
use crate::decimal::{Money, Rate};
use crate::errors::{FeeError, Result};
use crate::types::{PaymentMode, PaymentStatus, StudentId};

/// a student's fee position for one academic year, shaped for display
#[derive(Debug, Serialize, Deserialize)]
pub struct StudentFeeView {
    pub student_id: StudentId,
    pub class_label: String,
    pub academic_year: String,
    pub fees: FeeAmountsView,
    pub discounts: DiscountView,
    pub used_defaults: bool,
    pub payments: Vec<PaymentEntryView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FeeAmountsView {
    pub school_fee: Money,
    pub transport_fee: Money,
    pub hostel_fee: Money,
    pub school_fee_paid: Money,
    pub transport_fee_paid: Money,
    pub hostel_fee_paid: Money,
    pub total_fee: Money,
    pub total_paid: Money,
    pub total_due: Money,
    pub school_terms: u8,
    pub transport_terms: u8,
    pub hostel_terms: u8,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DiscountView {
    pub school_fee_discount: Rate,
    pub transport_fee_discount: Rate,
    pub hostel_fee_discount: Rate,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentEntryView {
    pub payment_id: Uuid,
    pub receipt_no: String,
    pub date: DateTime<Utc>,
    pub total_amount: Money,
    pub payment_mode: PaymentMode,
    pub term: Option<u8>,
    pub description: String,
    pub received_by: String,
    pub status: PaymentStatus,
}

impl StudentFeeView {
    pub fn from_account(account: &StudentAccount, academic_year: &str) -> Result<Self> {
        let snapshot =
            account
                .snapshot(academic_year)
                .ok_or_else(|| FeeError::SnapshotNotFound {
                    academic_year: academic_year.to_string(),
                })?;

        let payments = account
            .ledger()
            .records()
            .iter()
            .filter(|r| r.academic_year == academic_year)
            .map(|r| PaymentEntryView {
                payment_id: r.payment_id,
                receipt_no: r.receipt_no.clone(),
                date: r.date,
                total_amount: r.total_amount,
                payment_mode: r.payment_mode,
                term: r.term,
                description: r.description.clone(),
                received_by: r.received_by.clone(),
                status: r.status,
            })
            .collect();

        Ok(StudentFeeView {
            student_id: account.student_id,
            class_label: account.profile.class.label(),
            academic_year: academic_year.to_string(),
            fees: FeeAmountsView {
                school_fee: snapshot.school_fee,
                transport_fee: snapshot.transport_fee,
                hostel_fee: snapshot.hostel_fee,
                school_fee_paid: snapshot.school_fee_paid,
                transport_fee_paid: snapshot.transport_fee_paid,
                hostel_fee_paid: snapshot.hostel_fee_paid,
                total_fee: snapshot.total_fee(),
                total_paid: snapshot.total_paid(),
                total_due: snapshot.total_due(),
                school_terms: snapshot.school_terms,
                transport_terms: snapshot.transport_terms,
                hostel_terms: snapshot.hostel_terms,
            },
            discounts: DiscountView {
                school_fee_discount: snapshot.school_fee_discount,
                transport_fee_discount: snapshot.transport_fee_discount,
                hostel_fee_discount: snapshot.hostel_fee_discount,
            },
            used_defaults: snapshot.used_defaults,
            payments,
        })
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
