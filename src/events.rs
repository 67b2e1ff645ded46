use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::types::{FeeComponent, StudentId};

/// all events emitted by fee computation and payment application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// a student's annual fee snapshot was created
    FeeSnapshotCreated {
        student_id: StudentId,
        academic_year: String,
        total_fee: Money,
        used_defaults: bool,
        timestamp: DateTime<Utc>,
    },

    /// no configured structure was found for a component; the documented
    /// default was used instead
    DefaultFeeApplied {
        student_id: StudentId,
        academic_year: String,
        component: FeeComponent,
        amount: Money,
        timestamp: DateTime<Utc>,
    },

    /// a payment was applied to the snapshot and appended to the ledger
    PaymentRecorded {
        student_id: StudentId,
        academic_year: String,
        payment_id: Uuid,
        receipt_no: String,
        amount: Money,
        term: Option<u8>,
        timestamp: DateTime<Utc>,
    },

    /// the year's outstanding balance reached zero
    SnapshotSettled {
        student_id: StudentId,
        academic_year: String,
        total_paid: Money,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
