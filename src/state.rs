use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::types::FeeComponent;

/// a student's fee position for one academic year.
///
/// created once, when the year's fee is first computed (admission or
/// academic-year rollover); mutated only by payment application; never
/// deleted while payment history references it. the discount rates are
/// frozen at computation time and do not track later changes to the
/// student's discount settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeSnapshot {
    pub academic_year: String,

    // post-discount annual totals per component
    pub school_fee: Money,
    pub transport_fee: Money,
    pub hostel_fee: Money,

    // cumulative paid counters per component
    pub school_fee_paid: Money,
    pub transport_fee_paid: Money,
    pub hostel_fee_paid: Money,

    // term counts per component
    pub school_terms: u8,
    pub transport_terms: u8,
    pub hostel_terms: u8,

    // discount rates applied at computation time, frozen
    pub school_fee_discount: Rate,
    pub transport_fee_discount: Rate,
    pub hostel_fee_discount: Rate,

    /// whether any component was computed from a fallback default structure
    pub used_defaults: bool,

    pub created_at: DateTime<Utc>,
}

impl FeeSnapshot {
    pub fn total_fee(&self) -> Money {
        self.school_fee + self.transport_fee + self.hostel_fee
    }

    pub fn total_paid(&self) -> Money {
        self.school_fee_paid + self.transport_fee_paid + self.hostel_fee_paid
    }

    /// outstanding balance, floored at zero
    pub fn total_due(&self) -> Money {
        (self.total_fee() - self.total_paid()).max(Money::ZERO)
    }

    pub fn component_total(&self, component: FeeComponent) -> Money {
        match component {
            FeeComponent::School => self.school_fee,
            FeeComponent::Transport => self.transport_fee,
            FeeComponent::Hostel => self.hostel_fee,
        }
    }

    pub fn component_paid(&self, component: FeeComponent) -> Money {
        match component {
            FeeComponent::School => self.school_fee_paid,
            FeeComponent::Transport => self.transport_fee_paid,
            FeeComponent::Hostel => self.hostel_fee_paid,
        }
    }

    pub fn component_terms(&self, component: FeeComponent) -> u8 {
        match component {
            FeeComponent::School => self.school_terms,
            FeeComponent::Transport => self.transport_terms,
            FeeComponent::Hostel => self.hostel_terms,
        }
    }

    /// outstanding balance for one component, floored at zero
    pub fn component_due(&self, component: FeeComponent) -> Money {
        (self.component_total(component) - self.component_paid(component)).max(Money::ZERO)
    }

    /// increment a component's paid counter. callers validate the amount
    /// against the remaining due before reaching this point.
    pub fn record_component_payment(&mut self, component: FeeComponent, amount: Money) {
        match component {
            FeeComponent::School => self.school_fee_paid += amount,
            FeeComponent::Transport => self.transport_fee_paid += amount,
            FeeComponent::Hostel => self.hostel_fee_paid += amount,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.total_due().is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> FeeSnapshot {
        FeeSnapshot {
            academic_year: "2025-2026".to_string(),
            school_fee: Money::from_major(45_000),
            transport_fee: Money::from_major(6_000),
            hostel_fee: Money::ZERO,
            school_fee_paid: Money::ZERO,
            transport_fee_paid: Money::ZERO,
            hostel_fee_paid: Money::ZERO,
            school_terms: 3,
            transport_terms: 3,
            hostel_terms: 3,
            school_fee_discount: Rate::from_percentage(10),
            transport_fee_discount: Rate::ZERO,
            hostel_fee_discount: Rate::ZERO,
            used_defaults: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_totals_are_additive() {
        let snap = snapshot();
        assert_eq!(snap.total_fee(), Money::from_major(51_000));
        assert_eq!(snap.total_due(), Money::from_major(51_000));
    }

    #[test]
    fn test_due_floors_at_zero() {
        let mut snap = snapshot();
        snap.record_component_payment(FeeComponent::School, Money::from_major(45_000));
        snap.record_component_payment(FeeComponent::Transport, Money::from_major(6_000));
        assert!(snap.is_settled());
        assert_eq!(snap.total_due(), Money::ZERO);
        assert!(!snap.total_due().is_negative());
    }

    #[test]
    fn test_component_accessors() {
        let mut snap = snapshot();
        snap.record_component_payment(FeeComponent::School, Money::from_major(15_000));
        assert_eq!(
            snap.component_due(FeeComponent::School),
            Money::from_major(30_000)
        );
        assert_eq!(
            snap.component_paid(FeeComponent::School),
            Money::from_major(15_000)
        );
        assert_eq!(snap.component_terms(FeeComponent::Transport), 3);
    }
}
