pub mod distributor;

use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{FeeError, Result};
use crate::types::{FeeComponent, PaymentMode};

pub use distributor::{ComponentApplication, PaymentDistributor, PaymentPlan};

/// an incoming payment, already split by the caller into component
/// sub-amounts for this transaction. `term` scopes the payment to one term;
/// without it the amount is spread across terms by the distributor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub academic_year: String,
    pub term: Option<u8>,
    pub school_fee_paid: Money,
    pub transport_fee_paid: Money,
    pub hostel_fee_paid: Money,
    pub payment_mode: PaymentMode,
    pub description: Option<String>,
    pub received_by: String,
}

impl PaymentRequest {
    pub fn total(&self) -> Money {
        self.school_fee_paid + self.transport_fee_paid + self.hostel_fee_paid
    }

    pub fn component_amount(&self, component: FeeComponent) -> Money {
        match component {
            FeeComponent::School => self.school_fee_paid,
            FeeComponent::Transport => self.transport_fee_paid,
            FeeComponent::Hostel => self.hostel_fee_paid,
        }
    }

    /// components carrying a positive amount, in canonical order
    pub fn components(&self) -> impl Iterator<Item = (FeeComponent, Money)> + '_ {
        FeeComponent::ALL
            .into_iter()
            .map(|c| (c, self.component_amount(c)))
            .filter(|(_, amount)| amount.is_positive())
    }

    pub fn validate(&self) -> Result<()> {
        for component in FeeComponent::ALL {
            let amount = self.component_amount(component);
            if amount.is_negative() {
                return Err(FeeError::InvalidPaymentAmount { amount });
            }
        }
        if !self.total().is_positive() {
            return Err(FeeError::NoPaymentComponents);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(school: i64, transport: i64) -> PaymentRequest {
        PaymentRequest {
            academic_year: "2025-2026".to_string(),
            term: None,
            school_fee_paid: Money::from_major(school),
            transport_fee_paid: Money::from_major(transport),
            hostel_fee_paid: Money::ZERO,
            payment_mode: PaymentMode::Cash,
            description: None,
            received_by: "office".to_string(),
        }
    }

    #[test]
    fn test_rejects_all_zero_amounts() {
        assert!(matches!(
            request(0, 0).validate(),
            Err(FeeError::NoPaymentComponents)
        ));
    }

    #[test]
    fn test_rejects_negative_amount() {
        assert!(matches!(
            request(-100, 500).validate(),
            Err(FeeError::InvalidPaymentAmount { .. })
        ));
    }

    #[test]
    fn test_positive_components_only() {
        let req = request(15_000, 0);
        let components: Vec<_> = req.components().collect();
        assert_eq!(
            components,
            vec![(FeeComponent::School, Money::from_major(15_000))]
        );
        assert!(req.validate().is_ok());
    }
}
