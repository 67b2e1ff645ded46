use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::RwLock;

use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregator::FeeAggregator;
use crate::errors::{FeeError, Result};
use crate::events::{Event, EventStore};
use crate::ledger::{unique_receipt_no, PaymentLedger, PaymentRecord};
use crate::payments::{PaymentDistributor, PaymentRequest};
use crate::resolver::FeeStructureStore;
use crate::state::FeeSnapshot;
use crate::types::{StudentFeeProfile, StudentId};

/// commit attempts before a concurrent-write conflict is surfaced
const MAX_COMMIT_RETRIES: u32 = 3;

/// a student's fee position: profile, one snapshot per academic year, the
/// append-only payment ledger, and collected events. the revision counter
/// backs the store's optimistic concurrency check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentAccount {
    pub student_id: StudentId,
    pub profile: StudentFeeProfile,
    snapshots: BTreeMap<String, FeeSnapshot>,
    ledger: PaymentLedger,
    events: EventStore,
    revision: u64,
}

impl StudentAccount {
    pub fn new(profile: StudentFeeProfile) -> Self {
        Self {
            student_id: profile.student_id,
            profile,
            snapshots: BTreeMap::new(),
            ledger: PaymentLedger::new(),
            events: EventStore::new(),
            revision: 0,
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn bump_revision(&mut self) {
        self.revision += 1;
    }

    pub fn snapshot(&self, academic_year: &str) -> Option<&FeeSnapshot> {
        self.snapshots.get(academic_year)
    }

    pub fn ledger(&self) -> &PaymentLedger {
        &self.ledger
    }

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }

    /// compute and install the snapshot for the profile's academic year.
    /// idempotence guard: a year is computed once; recomputation is rejected
    /// so payment counters are never silently reset.
    pub fn compute_annual_fee<S: FeeStructureStore>(
        &mut self,
        aggregator: &FeeAggregator<S>,
        time_provider: &SafeTimeProvider,
    ) -> Result<FeeSnapshot> {
        let academic_year = self.profile.academic_year.clone();
        if self.snapshots.contains_key(&academic_year) {
            return Err(FeeError::SnapshotExists { academic_year });
        }

        let computation = aggregator.compute(&self.profile, time_provider);
        let now = time_provider.now();

        for component in &computation.breakdown.components {
            if component.from_default {
                self.events.emit(Event::DefaultFeeApplied {
                    student_id: self.student_id,
                    academic_year: academic_year.clone(),
                    component: component.component,
                    amount: component.discounted_amount,
                    timestamp: now,
                });
            }
        }
        self.events.emit(Event::FeeSnapshotCreated {
            student_id: self.student_id,
            academic_year: academic_year.clone(),
            total_fee: computation.snapshot.total_fee(),
            used_defaults: computation.snapshot.used_defaults,
            timestamp: now,
        });

        let snapshot = computation.snapshot.clone();
        self.snapshots.insert(academic_year, computation.snapshot);
        Ok(snapshot)
    }

    /// apply a payment against the year's snapshot. planning validates
    /// everything up front, so the snapshot counters and the ledger entry
    /// land together or not at all.
    pub fn apply_payment(
        &mut self,
        request: &PaymentRequest,
        payment_id: Uuid,
        receipt_no: String,
        time_provider: &SafeTimeProvider,
    ) -> Result<PaymentRecord> {
        let plan = {
            let snapshot = self.snapshots.get(&request.academic_year).ok_or_else(|| {
                FeeError::SnapshotNotFound {
                    academic_year: request.academic_year.clone(),
                }
            })?;
            PaymentDistributor::plan(snapshot, &self.ledger, request)?
        };

        let now = time_provider.now();
        let snapshot = self.snapshots.get_mut(&request.academic_year).ok_or_else(|| {
            FeeError::SnapshotNotFound {
                academic_year: request.academic_year.clone(),
            }
        })?;
        let record =
            PaymentDistributor::apply(plan, snapshot, &mut self.ledger, payment_id, receipt_no, now);
        let settled = snapshot.is_settled();
        let total_paid = snapshot.total_paid();

        self.events.emit(Event::PaymentRecorded {
            student_id: self.student_id,
            academic_year: record.academic_year.clone(),
            payment_id: record.payment_id,
            receipt_no: record.receipt_no.clone(),
            amount: record.total_amount,
            term: record.term,
            timestamp: now,
        });
        if settled {
            self.events.emit(Event::SnapshotSettled {
                student_id: self.student_id,
                academic_year: record.academic_year.clone(),
                total_paid,
                timestamp: now,
            });
        }

        Ok(record)
    }
}

/// in-memory account storage with optimistic concurrency.
///
/// mutations go through load-modify-commit: the commit re-checks the
/// account's revision under the write lock and rejects a conflicting
/// concurrent write, so two simultaneous payments can never silently
/// overwrite each other's paid counters. receipt-number uniqueness is
/// enforced here too, across all students.
#[derive(Debug, Default)]
pub struct AccountStore {
    accounts: RwLock<HashMap<StudentId, StudentAccount>>,
    receipts: RwLock<HashSet<String>>,
}

impl AccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, account: StudentAccount) -> Result<()> {
        let mut accounts = self.write_accounts()?;
        if accounts.contains_key(&account.student_id) {
            return Err(FeeError::AccountExists {
                student_id: account.student_id,
            });
        }
        let mut receipts = self.write_receipts()?;
        for record in account.ledger().records() {
            receipts.insert(record.receipt_no.clone());
        }
        accounts.insert(account.student_id, account);
        Ok(())
    }

    /// snapshot copy of an account for reads
    pub fn get(&self, student_id: StudentId) -> Result<StudentAccount> {
        self.read_accounts()?
            .get(&student_id)
            .cloned()
            .ok_or(FeeError::AccountNotFound { student_id })
    }

    /// compute a student's annual fee through the load-modify-commit cycle
    pub fn compute_annual_fee<S: FeeStructureStore>(
        &self,
        student_id: StudentId,
        aggregator: &FeeAggregator<S>,
        time_provider: &SafeTimeProvider,
    ) -> Result<FeeSnapshot> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut account = self.get(student_id)?;
            let loaded_revision = account.revision();
            let snapshot = account.compute_annual_fee(aggregator, time_provider)?;
            match self.commit(account, loaded_revision, None) {
                Ok(()) => return Ok(snapshot),
                Err(err) if attempt < MAX_COMMIT_RETRIES && err.is_commit_conflict() => continue,
                Err(err) => return Err(err),
            }
        }
    }

    /// the single payment entry point: load the account, issue ids, plan and
    /// apply the payment, then commit with the revision check. a concurrent
    /// conflict retries the whole cycle against fresh state; domain
    /// rejections (over-payment, bad term) propagate immediately.
    pub fn pay(
        &self,
        student_id: StudentId,
        request: &PaymentRequest,
        time_provider: &SafeTimeProvider,
    ) -> Result<PaymentRecord> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut account = self.get(student_id)?;
            let loaded_revision = account.revision();
            let now = time_provider.now();

            let receipt_no = {
                let receipts = self.read_receipts()?;
                unique_receipt_no(now, |candidate| receipts.contains(candidate))?
            };
            let payment_id = Uuid::new_v4();

            let record =
                account.apply_payment(request, payment_id, receipt_no.clone(), time_provider)?;

            match self.commit(account, loaded_revision, Some(&receipt_no)) {
                Ok(()) => return Ok(record),
                Err(err) if attempt < MAX_COMMIT_RETRIES && err.is_commit_conflict() => continue,
                Err(err) => return Err(err),
            }
        }
    }

    /// drain a student's collected events
    pub fn drain_events(&self, student_id: StudentId) -> Result<Vec<Event>> {
        let mut accounts = self.write_accounts()?;
        let account = accounts
            .get_mut(&student_id)
            .ok_or(FeeError::AccountNotFound { student_id })?;
        Ok(account.take_events())
    }

    fn commit(
        &self,
        mut account: StudentAccount,
        loaded_revision: u64,
        new_receipt: Option<&str>,
    ) -> Result<()> {
        let mut accounts = self.write_accounts()?;
        let slot = accounts
            .get_mut(&account.student_id)
            .ok_or(FeeError::AccountNotFound {
                student_id: account.student_id,
            })?;
        if slot.revision() != loaded_revision {
            return Err(FeeError::RevisionConflict {
                expected: loaded_revision,
                found: slot.revision(),
            });
        }
        if let Some(receipt_no) = new_receipt {
            // a racing payment may have claimed the number after generation;
            // the insert is the authoritative check
            let mut receipts = self.write_receipts()?;
            if !receipts.insert(receipt_no.to_string()) {
                return Err(FeeError::ReceiptCollision { attempts: 1 });
            }
        }
        account.bump_revision();
        *slot = account;
        Ok(())
    }

    fn read_accounts(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<StudentId, StudentAccount>>> {
        self.accounts.read().map_err(|_| FeeError::Storage {
            message: "account store lock poisoned".to_string(),
        })
    }

    fn write_accounts(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<StudentId, StudentAccount>>> {
        self.accounts.write().map_err(|_| FeeError::Storage {
            message: "account store lock poisoned".to_string(),
        })
    }

    fn read_receipts(&self) -> Result<std::sync::RwLockReadGuard<'_, HashSet<String>>> {
        self.receipts.read().map_err(|_| FeeError::Storage {
            message: "receipt registry lock poisoned".to_string(),
        })
    }

    fn write_receipts(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashSet<String>>> {
        self.receipts.write().map_err(|_| FeeError::Storage {
            message: "receipt registry lock poisoned".to_string(),
        })
    }
}

impl FeeError {
    /// conflicts worth retrying at the store commit boundary
    fn is_commit_conflict(&self) -> bool {
        matches!(
            self,
            FeeError::RevisionConflict { .. } | FeeError::ReceiptCollision { .. }
        )
    }
}
