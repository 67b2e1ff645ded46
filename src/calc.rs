use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::decimal::{Money, Rate};
use crate::errors::{FeeError, Result};

/// per-term amounts for one fee component, keyed by 1-based term index.
/// always sums exactly to the total it was split from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermDistribution {
    amounts: BTreeMap<u8, Money>,
}

impl TermDistribution {
    pub fn amount_for(&self, term: u8) -> Option<Money> {
        self.amounts.get(&term).copied()
    }

    pub fn terms(&self) -> u8 {
        self.amounts.len() as u8
    }

    pub fn total(&self) -> Money {
        self.amounts.values().copied().sum()
    }

    /// iterate in ascending term order
    pub fn iter(&self) -> impl Iterator<Item = (u8, Money)> + '_ {
        self.amounts.iter().map(|(t, m)| (*t, *m))
    }
}

/// split an annual amount into terms as evenly as possible. every term gets
/// `floor(total/terms)`; the first `total mod terms` terms (ascending) get
/// one extra unit. deterministic, and exact: the distribution sums to
/// `total` with no drift, which matters because term amounts are recomputed
/// on demand rather than stored.
pub fn split_evenly(total: Money, terms: u8) -> Result<TermDistribution> {
    if terms == 0 {
        return Err(FeeError::InvalidConfiguration {
            message: "cannot split across zero terms".to_string(),
        });
    }
    if total.is_negative() {
        return Err(FeeError::InvalidConfiguration {
            message: format!("cannot split a negative amount: {}", total),
        });
    }

    let divisor = Decimal::from(terms);
    let base = (total.as_decimal() / divisor).floor();
    let remainder = total.as_decimal() - base * divisor;

    let mut amounts = BTreeMap::new();
    for term in 1..=terms {
        let extra = if Decimal::from(term) <= remainder {
            Decimal::ONE
        } else {
            Decimal::ZERO
        };
        amounts.insert(term, Money::from_decimal(base + extra));
    }

    Ok(TermDistribution { amounts })
}

/// apply a percentage discount to a base annual amount, rounding to the
/// nearest whole currency unit
pub fn apply_discount(base: Money, discount: Rate) -> Money {
    base.discounted(discount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_exact_division() {
        let dist = split_evenly(Money::from_major(45_000), 3).unwrap();
        assert_eq!(dist.amount_for(1), Some(Money::from_major(15_000)));
        assert_eq!(dist.amount_for(2), Some(Money::from_major(15_000)));
        assert_eq!(dist.amount_for(3), Some(Money::from_major(15_000)));
    }

    #[test]
    fn test_split_remainder_goes_to_earliest_terms() {
        let dist = split_evenly(Money::from_major(50_000), 3).unwrap();
        assert_eq!(dist.amount_for(1), Some(Money::from_major(16_667)));
        assert_eq!(dist.amount_for(2), Some(Money::from_major(16_667)));
        assert_eq!(dist.amount_for(3), Some(Money::from_major(16_666)));
        assert_eq!(dist.total(), Money::from_major(50_000));
    }

    #[test]
    fn test_split_exactness_over_range() {
        for total in [1i64, 2, 3, 7, 99, 1_000, 33_333, 50_001, 123_457] {
            for terms in 1..=4u8 {
                let dist = split_evenly(Money::from_major(total), terms).unwrap();
                assert_eq!(
                    dist.total(),
                    Money::from_major(total),
                    "sum mismatch for {}/{}",
                    total,
                    terms
                );
                assert_eq!(dist.terms(), terms);
            }
        }
    }

    #[test]
    fn test_split_deterministic() {
        let first = split_evenly(Money::from_major(10_001), 4).unwrap();
        let second = split_evenly(Money::from_major(10_001), 4).unwrap();
        assert_eq!(first, second);
        // remainder 1 lands on term 1 only
        assert_eq!(first.amount_for(1), Some(Money::from_major(2_501)));
        assert_eq!(first.amount_for(4), Some(Money::from_major(2_500)));
    }

    #[test]
    fn test_split_zero_terms_rejected() {
        assert!(split_evenly(Money::from_major(100), 0).is_err());
    }

    #[test]
    fn test_split_zero_total() {
        let dist = split_evenly(Money::ZERO, 3).unwrap();
        assert_eq!(dist.total(), Money::ZERO);
        assert_eq!(dist.amount_for(2), Some(Money::ZERO));
    }

    #[test]
    fn test_discount_then_split_scenario() {
        // 50000 at 10% discount -> 45000, split into 3 equal terms
        let discounted = apply_discount(Money::from_major(50_000), Rate::from_percentage(10));
        assert_eq!(discounted, Money::from_major(45_000));
        let dist = split_evenly(discounted, 3).unwrap();
        assert_eq!(dist.amount_for(1), Some(Money::from_major(15_000)));
    }
}
