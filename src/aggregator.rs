use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calc::{apply_discount, split_evenly, TermDistribution};
use crate::config::{BusFeeStructure, ClassFeeStructure, HostelFeeStructure};
use crate::decimal::{Money, Rate};
use crate::errors::Result;
use crate::resolver::{FeeResolver, FeeStructureStore};
use crate::state::FeeSnapshot;
use crate::types::{FeeComponent, StudentFeeProfile, StudentType};

/// transport is billed over a fixed three terms, independent of the class
/// fee structure's configured term count
pub const TRANSPORT_TERMS: u8 = 3;

/// audit/display breakdown for one included component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentBreakdown {
    pub component: FeeComponent,
    pub base_amount: Money,
    pub discount: Rate,
    pub discounted_amount: Money,
    pub terms: u8,
    pub term_amounts: TermDistribution,
    pub from_default: bool,
}

/// full per-component breakdown of a computed annual fee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub components: Vec<ComponentBreakdown>,
    pub total_fee: Money,
    pub used_defaults: bool,
}

/// result of an annual fee computation. `success: false` marks a degraded
/// computation (resolver/storage failure, documented defaults used); the
/// snapshot is still usable so student-creation flows never hard-fail here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeComputation {
    pub snapshot: FeeSnapshot,
    pub breakdown: FeeBreakdown,
    pub success: bool,
    pub error: Option<String>,
}

/// combines class/transport/hostel structures into a student's annual fee
/// snapshot with a full breakdown
pub struct FeeAggregator<'a, S: FeeStructureStore> {
    resolver: FeeResolver<'a, S>,
}

impl<'a, S: FeeStructureStore> FeeAggregator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            resolver: FeeResolver::new(store),
        }
    }

    /// compute the annual fee for a student. never hard-fails: a storage
    /// failure degrades to the documented default structures with
    /// `success: false` and the error message attached.
    pub fn compute(
        &self,
        profile: &StudentFeeProfile,
        time_provider: &SafeTimeProvider,
    ) -> FeeComputation {
        let now = time_provider.now();
        match self.compute_resolved(profile, now) {
            Ok(computation) => computation,
            Err(err) => {
                warn!(
                    student_id = %profile.student_id,
                    error = %err,
                    "fee resolution failed; computing from defaults"
                );
                let message = err.to_string();
                Self::compute_degraded(profile, now, message)
            }
        }
    }

    fn compute_resolved(
        &self,
        profile: &StudentFeeProfile,
        now: DateTime<Utc>,
    ) -> Result<FeeComputation> {
        let class_fee =
            self.resolver
                .resolve_class_fee(profile.class, &profile.academic_year, now)?;

        let bus_fee = if profile.uses_transport {
            Some(self.resolver.resolve_bus_fee(
                profile.village.as_deref(),
                &profile.academic_year,
                now,
            )?)
        } else {
            None
        };

        let hostel_fee = if profile.student_type == StudentType::Hosteller {
            Some(self.resolver.resolve_hostel_fee(
                profile.class,
                &profile.academic_year,
                now,
            )?)
        } else {
            None
        };

        Self::compute_from(profile, &class_fee, bus_fee.as_ref(), hostel_fee.as_ref(), now)
    }

    fn compute_degraded(
        profile: &StudentFeeProfile,
        now: DateTime<Utc>,
        message: String,
    ) -> FeeComputation {
        let class_fee = ClassFeeStructure::fallback(profile.class, &profile.academic_year, now);
        let bus_fee = profile.uses_transport.then(|| {
            BusFeeStructure::fallback(
                profile.village.as_deref().unwrap_or(""),
                &profile.academic_year,
                now,
            )
        });
        let hostel_fee = (profile.student_type == StudentType::Hosteller)
            .then(|| HostelFeeStructure::fallback(profile.class, &profile.academic_year, now));

        match Self::compute_from(profile, &class_fee, bus_fee.as_ref(), hostel_fee.as_ref(), now) {
            Ok(mut computation) => {
                computation.success = false;
                computation.error = Some(message);
                computation
            }
            // fallback structures always carry valid term counts; this arm
            // keeps the function total anyway
            Err(inner) => FeeComputation {
                snapshot: FeeSnapshot {
                    academic_year: profile.academic_year.clone(),
                    school_fee: Money::ZERO,
                    transport_fee: Money::ZERO,
                    hostel_fee: Money::ZERO,
                    school_fee_paid: Money::ZERO,
                    transport_fee_paid: Money::ZERO,
                    hostel_fee_paid: Money::ZERO,
                    school_terms: 1,
                    transport_terms: TRANSPORT_TERMS,
                    hostel_terms: 1,
                    school_fee_discount: profile.school_fee_discount,
                    transport_fee_discount: profile.transport_fee_discount,
                    hostel_fee_discount: profile.hostel_fee_discount,
                    used_defaults: true,
                    created_at: now,
                },
                breakdown: FeeBreakdown {
                    components: Vec::new(),
                    total_fee: Money::ZERO,
                    used_defaults: true,
                },
                success: false,
                error: Some(inner.to_string()),
            },
        }
    }

    fn compute_from(
        profile: &StudentFeeProfile,
        class_fee: &ClassFeeStructure,
        bus_fee: Option<&BusFeeStructure>,
        hostel_fee: Option<&HostelFeeStructure>,
        now: DateTime<Utc>,
    ) -> Result<FeeComputation> {
        let mut components = Vec::new();

        let school_discount = profile.discount_for(FeeComponent::School);
        let school_amount = apply_discount(class_fee.total_annual_fee, school_discount);
        components.push(ComponentBreakdown {
            component: FeeComponent::School,
            base_amount: class_fee.total_annual_fee,
            discount: school_discount,
            discounted_amount: school_amount,
            terms: class_fee.total_terms,
            term_amounts: split_evenly(school_amount, class_fee.total_terms)?,
            from_default: class_fee.is_default,
        });

        let mut transport_amount = Money::ZERO;
        if let Some(bus) = bus_fee {
            let transport_discount = profile.discount_for(FeeComponent::Transport);
            transport_amount = apply_discount(bus.fee_amount, transport_discount);
            components.push(ComponentBreakdown {
                component: FeeComponent::Transport,
                base_amount: bus.fee_amount,
                discount: transport_discount,
                discounted_amount: transport_amount,
                terms: TRANSPORT_TERMS,
                term_amounts: split_evenly(transport_amount, TRANSPORT_TERMS)?,
                from_default: bus.is_default,
            });
        }

        let mut hostel_amount = Money::ZERO;
        let mut hostel_terms = crate::config::DEFAULT_TERMS;
        if let Some(hostel) = hostel_fee {
            let hostel_discount = profile.discount_for(FeeComponent::Hostel);
            hostel_amount = apply_discount(hostel.total_annual_fee, hostel_discount);
            hostel_terms = hostel.total_terms;
            components.push(ComponentBreakdown {
                component: FeeComponent::Hostel,
                base_amount: hostel.total_annual_fee,
                discount: hostel_discount,
                discounted_amount: hostel_amount,
                terms: hostel.total_terms,
                term_amounts: split_evenly(hostel_amount, hostel.total_terms)?,
                from_default: hostel.is_default,
            });
        }

        let used_defaults = components.iter().any(|c| c.from_default);
        let total_fee = school_amount + transport_amount + hostel_amount;

        debug!(
            student_id = %profile.student_id,
            academic_year = %profile.academic_year,
            %total_fee,
            used_defaults,
            "annual fee computed"
        );

        let snapshot = FeeSnapshot {
            academic_year: profile.academic_year.clone(),
            school_fee: school_amount,
            transport_fee: transport_amount,
            hostel_fee: hostel_amount,
            school_fee_paid: Money::ZERO,
            transport_fee_paid: Money::ZERO,
            hostel_fee_paid: Money::ZERO,
            school_terms: class_fee.total_terms,
            transport_terms: TRANSPORT_TERMS,
            hostel_terms,
            school_fee_discount: profile.school_fee_discount,
            transport_fee_discount: profile.transport_fee_discount,
            hostel_fee_discount: profile.hostel_fee_discount,
            used_defaults,
            created_at: now,
        };

        Ok(FeeComputation {
            snapshot,
            breakdown: FeeBreakdown {
                components,
                total_fee,
                used_defaults,
            },
            success: true,
            error: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ClassLevel;
    use crate::config::{ComponentAmounts, DEFAULT_CLASS_ANNUAL_FEE};
    use crate::errors::FeeError;
    use crate::resolver::InMemoryFeeStructureStore;
    use crate::types::VehicleType;
    use hourglass_rs::TimeSource;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    const YEAR: &str = "2025-2026";

    fn time() -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(Utc::now()))
    }

    fn configured_store() -> InMemoryFeeStructureStore {
        let now = Utc::now();
        let mut store = InMemoryFeeStructureStore::new();
        store
            .add_class_fee(
                ClassFeeStructure::new(
                    ClassLevel::Grade(5),
                    YEAR,
                    Money::from_major(50_000),
                    3,
                    ComponentAmounts::default(),
                    None,
                    now,
                )
                .unwrap(),
            )
            .unwrap();
        store
            .add_bus_fee(
                BusFeeStructure::new(
                    "Rampur",
                    YEAR,
                    Decimal::from(5),
                    Money::from_major(9_000),
                    VehicleType::Bus,
                    None,
                    now,
                )
                .unwrap(),
            )
            .unwrap();
        store
            .add_hostel_fee(
                HostelFeeStructure::new(
                    ClassLevel::Grade(5),
                    YEAR,
                    Money::from_major(36_000),
                    4,
                    None,
                    now,
                )
                .unwrap(),
            )
            .unwrap();
        store
    }

    fn profile() -> StudentFeeProfile {
        StudentFeeProfile {
            student_id: Uuid::new_v4(),
            class: ClassLevel::Grade(5),
            academic_year: YEAR.to_string(),
            village: Some("Rampur".to_string()),
            uses_transport: false,
            student_type: StudentType::DayScholar,
            school_fee_discount: Rate::ZERO,
            transport_fee_discount: Rate::ZERO,
            hostel_fee_discount: Rate::ZERO,
        }
    }

    #[test]
    fn test_discounted_school_fee_scenario() {
        let store = configured_store();
        let aggregator = FeeAggregator::new(&store);
        let mut profile = profile();
        profile.school_fee_discount = Rate::from_percentage(10);

        let computation = aggregator.compute(&profile, &time());
        assert!(computation.success);
        assert_eq!(computation.snapshot.school_fee, Money::from_major(45_000));

        let school = &computation.breakdown.components[0];
        assert_eq!(school.term_amounts.amount_for(1), Some(Money::from_major(15_000)));
        assert_eq!(school.term_amounts.amount_for(3), Some(Money::from_major(15_000)));
    }

    #[test]
    fn test_day_scholar_without_transport_gets_school_fee_only() {
        let store = configured_store();
        let aggregator = FeeAggregator::new(&store);
        let mut profile = profile();
        // discounts configured but the components are excluded entirely
        profile.transport_fee_discount = Rate::from_percentage(50);
        profile.hostel_fee_discount = Rate::from_percentage(50);

        let computation = aggregator.compute(&profile, &time());
        assert_eq!(computation.snapshot.transport_fee, Money::ZERO);
        assert_eq!(computation.snapshot.hostel_fee, Money::ZERO);
        assert_eq!(
            computation.snapshot.total_fee(),
            computation.snapshot.school_fee
        );
        assert_eq!(computation.breakdown.components.len(), 1);
    }

    #[test]
    fn test_total_is_additive_across_components() {
        let store = configured_store();
        let aggregator = FeeAggregator::new(&store);
        let mut profile = profile();
        profile.uses_transport = true;
        profile.student_type = StudentType::Hosteller;

        let computation = aggregator.compute(&profile, &time());
        let snap = &computation.snapshot;
        assert_eq!(
            snap.total_fee(),
            snap.school_fee + snap.transport_fee + snap.hostel_fee
        );
        assert_eq!(snap.school_fee, Money::from_major(50_000));
        assert_eq!(snap.transport_fee, Money::from_major(9_000));
        assert_eq!(snap.hostel_fee, Money::from_major(36_000));
        // hostel uses its own structure's term count; transport is fixed
        assert_eq!(snap.hostel_terms, 4);
        assert_eq!(snap.transport_terms, TRANSPORT_TERMS);
    }

    #[test]
    fn test_missing_structures_use_flagged_defaults() {
        let store = InMemoryFeeStructureStore::new();
        let aggregator = FeeAggregator::new(&store);

        let computation = aggregator.compute(&profile(), &time());
        // configuration-missing is not a failure, just a flagged default
        assert!(computation.success);
        assert!(computation.snapshot.used_defaults);
        assert_eq!(
            computation.snapshot.school_fee,
            Money::from_major(DEFAULT_CLASS_ANNUAL_FEE)
        );
        assert!(computation.breakdown.components[0].from_default);
    }

    #[test]
    fn test_storage_failure_degrades_to_defaults() {
        struct FailingStore;
        impl FeeStructureStore for FailingStore {
            fn active_class_fee(
                &self,
                _class: ClassLevel,
                _academic_year: &str,
            ) -> crate::errors::Result<Option<ClassFeeStructure>> {
                Err(FeeError::Storage {
                    message: "connection lost".to_string(),
                })
            }
            fn active_bus_fee(
                &self,
                _village: &str,
                _academic_year: &str,
            ) -> crate::errors::Result<Option<BusFeeStructure>> {
                Err(FeeError::Storage {
                    message: "connection lost".to_string(),
                })
            }
            fn active_hostel_fee(
                &self,
                _class: ClassLevel,
                _academic_year: &str,
            ) -> crate::errors::Result<Option<HostelFeeStructure>> {
                Err(FeeError::Storage {
                    message: "connection lost".to_string(),
                })
            }
        }

        let store = FailingStore;
        let aggregator = FeeAggregator::new(&store);
        let computation = aggregator.compute(&profile(), &time());

        assert!(!computation.success);
        assert!(computation.error.is_some());
        assert!(computation.snapshot.used_defaults);
        assert_eq!(
            computation.snapshot.school_fee,
            Money::from_major(DEFAULT_CLASS_ANNUAL_FEE)
        );
    }

    #[test]
    fn test_snapshot_freezes_discounts() {
        let store = configured_store();
        let aggregator = FeeAggregator::new(&store);
        let mut profile = profile();
        profile.school_fee_discount = Rate::from_percentage(25);

        let computation = aggregator.compute(&profile, &time());
        // a later change to the profile must not affect the snapshot
        profile.school_fee_discount = Rate::from_percentage(50);
        assert_eq!(
            computation.snapshot.school_fee_discount,
            Rate::from_percentage(25)
        );
        assert_eq!(computation.snapshot.school_fee, Money::from_major(37_500));
    }
}
