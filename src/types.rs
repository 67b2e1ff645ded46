use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::class::ClassLevel;
use crate::decimal::Rate;

/// unique identifier for a student
pub type StudentId = Uuid;

/// boarding status of a student
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StudentType {
    DayScholar,
    Hosteller,
}

/// vehicle type on a transport route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleType {
    Bus,
    Van,
    Auto,
    Other,
}

/// how a payment was made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMode {
    Cash,
    Card,
    Upi,
    BankTransfer,
    Cheque,
}

/// payment record status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Completed,
    Cancelled,
}

/// the three billable fee components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeeComponent {
    School,
    Transport,
    Hostel,
}

impl FeeComponent {
    pub const ALL: [FeeComponent; 3] = [
        FeeComponent::School,
        FeeComponent::Transport,
        FeeComponent::Hostel,
    ];
}

impl fmt::Display for FeeComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeeComponent::School => write!(f, "school fee"),
            FeeComponent::Transport => write!(f, "transport fee"),
            FeeComponent::Hostel => write!(f, "hostel fee"),
        }
    }
}

/// the student attributes fee computation reads. this is an input record
/// owned by the student-record collaborator; the aggregator never writes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentFeeProfile {
    pub student_id: StudentId,
    pub class: ClassLevel,
    pub academic_year: String,
    pub village: Option<String>,
    pub uses_transport: bool,
    pub student_type: StudentType,
    pub school_fee_discount: Rate,
    pub transport_fee_discount: Rate,
    pub hostel_fee_discount: Rate,
}

impl StudentFeeProfile {
    /// plain profile with no transport, no hostel, no discounts
    pub fn day_scholar(student_id: StudentId, class: ClassLevel, academic_year: &str) -> Self {
        Self {
            student_id,
            class,
            academic_year: academic_year.to_string(),
            village: None,
            uses_transport: false,
            student_type: StudentType::DayScholar,
            school_fee_discount: Rate::ZERO,
            transport_fee_discount: Rate::ZERO,
            hostel_fee_discount: Rate::ZERO,
        }
    }

    pub fn discount_for(&self, component: FeeComponent) -> Rate {
        match component {
            FeeComponent::School => self.school_fee_discount,
            FeeComponent::Transport => self.transport_fee_discount,
            FeeComponent::Hostel => self.hostel_fee_discount,
        }
    }
}
