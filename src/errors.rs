use thiserror::Error;

use crate::decimal::Money;
use crate::types::{FeeComponent, StudentId};

#[derive(Error, Debug)]
pub enum FeeError {
    #[error("invalid class label: {label:?}")]
    InvalidClassLabel { label: String },

    #[error("invalid payment amount: {amount}")]
    InvalidPaymentAmount { amount: Money },

    #[error("payment must include at least one component amount")]
    NoPaymentComponents,

    #[error("invalid term {term}: {component} is billed over {terms} terms")]
    InvalidTerm {
        component: FeeComponent,
        term: u8,
        terms: u8,
    },

    #[error("over-payment for {component}: due {due}, requested {requested}")]
    OverPayment {
        component: FeeComponent,
        term: Option<u8>,
        due: Money,
        requested: Money,
    },

    #[error("fee snapshot already exists for {academic_year}")]
    SnapshotExists { academic_year: String },

    #[error("no fee snapshot for {academic_year}")]
    SnapshotNotFound { academic_year: String },

    #[error("account not found: {student_id}")]
    AccountNotFound { student_id: StudentId },

    #[error("account already exists: {student_id}")]
    AccountExists { student_id: StudentId },

    #[error("an active {kind} structure already exists for {key} in {academic_year}")]
    DuplicateStructure {
        kind: &'static str,
        key: String,
        academic_year: String,
    },

    #[error("could not issue a unique receipt number after {attempts} attempts")]
    ReceiptCollision { attempts: u32 },

    #[error("concurrent update detected: expected revision {expected}, found {found}")]
    RevisionConflict { expected: u64, found: u64 },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("storage error: {message}")]
    Storage { message: String },
}

pub type Result<T> = std::result::Result<T, FeeError>;
