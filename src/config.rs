use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::class::ClassLevel;
use crate::decimal::Money;
use crate::errors::{FeeError, Result};
use crate::types::VehicleType;

/// documented fallback constants, used when no active structure is
/// configured for a lookup key. every record built from these carries
/// `is_default: true` so audits can tell fallback data from configured data.
pub const DEFAULT_CLASS_ANNUAL_FEE: i64 = 30_000;
pub const DEFAULT_TRANSPORT_ANNUAL_FEE: i64 = 6_000;
pub const DEFAULT_HOSTEL_ANNUAL_FEE: i64 = 40_000;
pub const DEFAULT_TERMS: u8 = 3;

/// valid term-count range for any fee structure
pub const MIN_TERMS: u8 = 1;
pub const MAX_TERMS: u8 = 4;

fn validate_terms(terms: u8) -> Result<()> {
    if !(MIN_TERMS..=MAX_TERMS).contains(&terms) {
        return Err(FeeError::InvalidConfiguration {
            message: format!("total_terms must be {}..={}, got {}", MIN_TERMS, MAX_TERMS, terms),
        });
    }
    Ok(())
}

fn validate_amount(name: &str, amount: Money) -> Result<()> {
    if amount.is_negative() || amount.is_zero() {
        return Err(FeeError::InvalidConfiguration {
            message: format!("{} must be positive, got {}", name, amount),
        });
    }
    Ok(())
}

/// informational per-head breakdown of a class fee. the amounts are
/// display-only; their sum need not equal the structure's annual total.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentAmounts {
    pub tuition_fee: Money,
    pub exam_fee: Money,
    pub activity_fee: Money,
    pub library_fee: Money,
    pub sports_fee: Money,
    pub lab_fee: Money,
    pub computer_fee: Money,
    pub other_charges: Money,
}

/// class fee structure, unique per (class, academic year) among active rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassFeeStructure {
    pub class: ClassLevel,
    pub academic_year: String,
    pub total_annual_fee: Money,
    pub total_terms: u8,
    pub components: ComponentAmounts,
    pub is_active: bool,
    pub is_default: bool,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ClassFeeStructure {
    pub fn new(
        class: ClassLevel,
        academic_year: &str,
        total_annual_fee: Money,
        total_terms: u8,
        components: ComponentAmounts,
        created_by: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        validate_amount("total_annual_fee", total_annual_fee)?;
        validate_terms(total_terms)?;

        Ok(Self {
            class,
            academic_year: academic_year.to_string(),
            total_annual_fee,
            total_terms,
            components,
            is_active: true,
            is_default: false,
            created_by,
            updated_by: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// in-memory fallback for a class with no configured structure
    pub fn fallback(class: ClassLevel, academic_year: &str, now: DateTime<Utc>) -> Self {
        Self {
            class,
            academic_year: academic_year.to_string(),
            total_annual_fee: Money::from_major(DEFAULT_CLASS_ANNUAL_FEE),
            total_terms: DEFAULT_TERMS,
            components: ComponentAmounts {
                tuition_fee: Money::from_major(DEFAULT_CLASS_ANNUAL_FEE),
                ..ComponentAmounts::default()
            },
            is_active: true,
            is_default: true,
            created_by: None,
            updated_by: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// bus fee structure, unique per (village, academic year) among active rows.
/// villages are matched case-insensitively at lookup time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusFeeStructure {
    pub village: String,
    pub academic_year: String,
    pub distance_km: Decimal,
    pub fee_amount: Money,
    pub vehicle_type: VehicleType,
    pub is_active: bool,
    pub is_default: bool,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BusFeeStructure {
    pub fn new(
        village: &str,
        academic_year: &str,
        distance_km: Decimal,
        fee_amount: Money,
        vehicle_type: VehicleType,
        created_by: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        validate_amount("fee_amount", fee_amount)?;
        if village.trim().is_empty() {
            return Err(FeeError::InvalidConfiguration {
                message: "village must not be empty".to_string(),
            });
        }

        Ok(Self {
            village: village.trim().to_string(),
            academic_year: academic_year.to_string(),
            distance_km,
            fee_amount,
            vehicle_type,
            is_active: true,
            is_default: false,
            created_by,
            updated_by: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// flat fallback transport fee for an unconfigured (or missing) village
    pub fn fallback(village: &str, academic_year: &str, now: DateTime<Utc>) -> Self {
        Self {
            village: village.to_string(),
            academic_year: academic_year.to_string(),
            distance_km: Decimal::ZERO,
            fee_amount: Money::from_major(DEFAULT_TRANSPORT_ANNUAL_FEE),
            vehicle_type: VehicleType::Bus,
            is_active: true,
            is_default: true,
            created_by: None,
            updated_by: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// hostel fee structure, unique per (class, academic year) among active rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostelFeeStructure {
    pub class: ClassLevel,
    pub academic_year: String,
    pub total_annual_fee: Money,
    pub total_terms: u8,
    pub is_active: bool,
    pub is_default: bool,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HostelFeeStructure {
    pub fn new(
        class: ClassLevel,
        academic_year: &str,
        total_annual_fee: Money,
        total_terms: u8,
        created_by: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        validate_amount("total_annual_fee", total_annual_fee)?;
        validate_terms(total_terms)?;

        Ok(Self {
            class,
            academic_year: academic_year.to_string(),
            total_annual_fee,
            total_terms,
            is_active: true,
            is_default: false,
            created_by,
            updated_by: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn fallback(class: ClassLevel, academic_year: &str, now: DateTime<Utc>) -> Self {
        Self {
            class,
            academic_year: academic_year.to_string(),
            total_annual_fee: Money::from_major(DEFAULT_HOSTEL_ANNUAL_FEE),
            total_terms: DEFAULT_TERMS,
            is_active: true,
            is_default: true,
            created_by: None,
            updated_by: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_fee() {
        let result = ClassFeeStructure::new(
            ClassLevel::Grade(5),
            "2025-2026",
            Money::ZERO,
            3,
            ComponentAmounts::default(),
            None,
            Utc::now(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_bad_term_count() {
        let result = HostelFeeStructure::new(
            ClassLevel::Grade(5),
            "2025-2026",
            Money::from_major(40_000),
            5,
            None,
            Utc::now(),
        );
        assert!(matches!(
            result,
            Err(FeeError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_fallbacks_are_flagged() {
        let now = Utc::now();
        assert!(ClassFeeStructure::fallback(ClassLevel::Lkg, "2025-2026", now).is_default);
        assert!(BusFeeStructure::fallback("Rampur", "2025-2026", now).is_default);
        assert!(HostelFeeStructure::fallback(ClassLevel::Lkg, "2025-2026", now).is_default);
    }

    #[test]
    fn test_rejects_empty_village() {
        let result = BusFeeStructure::new(
            "  ",
            "2025-2026",
            Decimal::from(4),
            Money::from_major(6_000),
            VehicleType::Van,
            None,
            Utc::now(),
        );
        assert!(result.is_err());
    }
}
