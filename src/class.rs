use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// school class level, from pre-primary through grade 12.
///
/// the legacy records encode these as numeric codes (0, 0.25, 0.5, 0.75,
/// 1..12); `class_code`/`from_code` bridge to that encoding. ordering follows
/// promotion order, so `PreNursery < Nursery < Lkg < Ukg < Grade(1) < ..`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ClassLevel {
    PreNursery,
    Nursery,
    Lkg,
    Ukg,
    Grade(u8),
}

const WORD_GRADES: [&str; 12] = [
    "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten", "eleven",
    "twelve",
];

const ROMAN_GRADES: [&str; 12] = [
    "i", "ii", "iii", "iv", "v", "vi", "vii", "viii", "ix", "x", "xi", "xii",
];

impl ClassLevel {
    /// parse a human class label. normalizes case and whitespace, checks the
    /// alias table (word forms, roman numerals, digits, pre-primary names),
    /// then falls back to a numeric parse so labels like "0.5" resolve via
    /// the legacy codes. `None` means the label is invalid and the calling
    /// operation must be rejected.
    pub fn parse(label: &str) -> Option<ClassLevel> {
        let normalized = label
            .trim()
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        let normalized = normalized
            .strip_prefix("class ")
            .unwrap_or(&normalized)
            .to_string();

        match normalized.as_str() {
            "pre nursery" | "pre-nursery" | "prenursery" => return Some(ClassLevel::PreNursery),
            "nursery" => return Some(ClassLevel::Nursery),
            "lkg" | "l.k.g" | "l.k.g." | "lower kg" | "lower kindergarten" => {
                return Some(ClassLevel::Lkg)
            }
            "ukg" | "u.k.g" | "u.k.g." | "upper kg" | "upper kindergarten" => {
                return Some(ClassLevel::Ukg)
            }
            _ => {}
        }

        if let Some(idx) = WORD_GRADES.iter().position(|w| *w == normalized) {
            return Some(ClassLevel::Grade(idx as u8 + 1));
        }
        if let Some(idx) = ROMAN_GRADES.iter().position(|r| *r == normalized) {
            return Some(ClassLevel::Grade(idx as u8 + 1));
        }

        // numeric fallback covers both plain digits and legacy codes
        Decimal::from_str(&normalized)
            .ok()
            .and_then(ClassLevel::from_code)
    }

    /// parse a label for record intake, where an invalid class must reject
    /// the whole operation
    pub fn parse_required(label: &str) -> crate::errors::Result<ClassLevel> {
        ClassLevel::parse(label).ok_or_else(|| crate::errors::FeeError::InvalidClassLabel {
            label: label.to_string(),
        })
    }

    /// canonical display label, matching the configured fee-structure keys
    pub fn label(&self) -> String {
        match self {
            ClassLevel::PreNursery => "Pre Nursery".to_string(),
            ClassLevel::Nursery => "Nursery".to_string(),
            ClassLevel::Lkg => "LKG".to_string(),
            ClassLevel::Ukg => "UKG".to_string(),
            ClassLevel::Grade(n) => n.to_string(),
        }
    }

    /// legacy numeric code used by stored records
    pub fn class_code(&self) -> Decimal {
        match self {
            ClassLevel::PreNursery => Decimal::ZERO,
            ClassLevel::Nursery => dec!(0.25),
            ClassLevel::Lkg => dec!(0.5),
            ClassLevel::Ukg => dec!(0.75),
            ClassLevel::Grade(n) => Decimal::from(*n),
        }
    }

    /// inverse of `class_code`
    pub fn from_code(code: Decimal) -> Option<ClassLevel> {
        if code == Decimal::ZERO {
            return Some(ClassLevel::PreNursery);
        }
        if code == dec!(0.25) {
            return Some(ClassLevel::Nursery);
        }
        if code == dec!(0.5) {
            return Some(ClassLevel::Lkg);
        }
        if code == dec!(0.75) {
            return Some(ClassLevel::Ukg);
        }
        if code.fract().is_zero() && code >= Decimal::ONE && code <= Decimal::from(12) {
            return code.to_u8().map(ClassLevel::Grade);
        }
        None
    }

    /// next level for promotion; `None` after grade 12
    pub fn next(&self) -> Option<ClassLevel> {
        match self {
            ClassLevel::PreNursery => Some(ClassLevel::Nursery),
            ClassLevel::Nursery => Some(ClassLevel::Lkg),
            ClassLevel::Lkg => Some(ClassLevel::Ukg),
            ClassLevel::Ukg => Some(ClassLevel::Grade(1)),
            ClassLevel::Grade(n) if *n < 12 => Some(ClassLevel::Grade(n + 1)),
            ClassLevel::Grade(_) => None,
        }
    }
}

impl fmt::Display for ClassLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// render a stored numeric code for display. unknown codes degrade to
/// "Class {code}" rather than erroring; display paths never reject data.
pub fn label_for_code(code: Decimal) -> String {
    match ClassLevel::from_code(code) {
        Some(level) => level.label(),
        None => format!("Class {}", code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!(ClassLevel::parse("Pre Nursery"), Some(ClassLevel::PreNursery));
        assert_eq!(ClassLevel::parse("  nursery "), Some(ClassLevel::Nursery));
        assert_eq!(ClassLevel::parse("LKG"), Some(ClassLevel::Lkg));
        assert_eq!(ClassLevel::parse("upper kg"), Some(ClassLevel::Ukg));
        assert_eq!(ClassLevel::parse("Seven"), Some(ClassLevel::Grade(7)));
        assert_eq!(ClassLevel::parse("IX"), Some(ClassLevel::Grade(9)));
        assert_eq!(ClassLevel::parse("12"), Some(ClassLevel::Grade(12)));
        assert_eq!(ClassLevel::parse("Class 5"), Some(ClassLevel::Grade(5)));
    }

    #[test]
    fn test_parse_numeric_codes() {
        // "0.5" is not in the alias table verbatim; the numeric fallback
        // must still resolve it
        assert_eq!(ClassLevel::parse("0.5"), Some(ClassLevel::Lkg));
        assert_eq!(ClassLevel::parse("0.25"), Some(ClassLevel::Nursery));
        assert_eq!(ClassLevel::parse("0"), Some(ClassLevel::PreNursery));
        assert_eq!(ClassLevel::parse("0.75"), Some(ClassLevel::Ukg));
    }

    #[test]
    fn test_parse_invalid() {
        assert_eq!(ClassLevel::parse("thirteen"), None);
        assert_eq!(ClassLevel::parse("13"), None);
        assert_eq!(ClassLevel::parse("0.3"), None);
        assert_eq!(ClassLevel::parse(""), None);
        assert_eq!(ClassLevel::parse("kindergarten b"), None);
    }

    #[test]
    fn test_parse_required_rejects() {
        assert!(ClassLevel::parse_required("VII").is_ok());
        assert!(matches!(
            ClassLevel::parse_required("playgroup"),
            Err(crate::errors::FeeError::InvalidClassLabel { .. })
        ));
    }

    #[test]
    fn test_code_round_trip() {
        for level in [
            ClassLevel::PreNursery,
            ClassLevel::Nursery,
            ClassLevel::Lkg,
            ClassLevel::Ukg,
            ClassLevel::Grade(1),
            ClassLevel::Grade(12),
        ] {
            assert_eq!(ClassLevel::from_code(level.class_code()), Some(level));
        }
    }

    #[test]
    fn test_label_for_unknown_code() {
        assert_eq!(label_for_code(Decimal::from(13)), "Class 13");
        assert_eq!(label_for_code(Decimal::from(10)), "10");
    }

    #[test]
    fn test_promotion_ordering() {
        assert!(ClassLevel::PreNursery < ClassLevel::Nursery);
        assert!(ClassLevel::Ukg < ClassLevel::Grade(1));
        assert!(ClassLevel::Grade(3) < ClassLevel::Grade(11));

        let mut level = ClassLevel::PreNursery;
        let mut steps = 0;
        while let Some(next) = level.next() {
            assert!(next > level);
            level = next;
            steps += 1;
        }
        assert_eq!(level, ClassLevel::Grade(12));
        assert_eq!(steps, 15);
    }
}
