pub mod account;
pub mod aggregator;
pub mod calc;
pub mod class;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod payments;
pub mod resolver;
pub mod state;
pub mod types;
pub mod views;

// re-export key types
pub use account::{AccountStore, StudentAccount};
pub use aggregator::{
    ComponentBreakdown, FeeAggregator, FeeBreakdown, FeeComputation, TRANSPORT_TERMS,
};
pub use calc::{apply_discount, split_evenly, TermDistribution};
pub use class::{label_for_code, ClassLevel};
pub use config::{BusFeeStructure, ClassFeeStructure, ComponentAmounts, HostelFeeStructure};
pub use decimal::{Money, Rate};
pub use errors::{FeeError, Result};
pub use events::{Event, EventStore};
pub use ledger::{PaymentLedger, PaymentRecord, TermAllocation};
pub use payments::{PaymentDistributor, PaymentPlan, PaymentRequest};
pub use resolver::{FeeResolver, FeeStructureStore, InMemoryFeeStructureStore};
pub use state::FeeSnapshot;
pub use types::{
    FeeComponent, PaymentMode, PaymentStatus, StudentFeeProfile, StudentId, StudentType,
    VehicleType,
};
pub use views::StudentFeeView;

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
