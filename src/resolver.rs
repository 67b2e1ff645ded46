use chrono::{DateTime, Utc};
use tracing::warn;

use crate::class::ClassLevel;
use crate::config::{BusFeeStructure, ClassFeeStructure, HostelFeeStructure};
use crate::errors::{FeeError, Result};

/// lookup surface over configured fee structures. the in-memory store below
/// is the reference implementation; a database-backed store plugs in here.
pub trait FeeStructureStore {
    fn active_class_fee(&self, class: ClassLevel, academic_year: &str)
        -> Result<Option<ClassFeeStructure>>;

    fn active_bus_fee(&self, village: &str, academic_year: &str)
        -> Result<Option<BusFeeStructure>>;

    fn active_hostel_fee(&self, class: ClassLevel, academic_year: &str)
        -> Result<Option<HostelFeeStructure>>;
}

/// in-memory store enforcing the at-most-one-active-record invariant per
/// (key, academic year) at insert time
#[derive(Debug, Default)]
pub struct InMemoryFeeStructureStore {
    class_fees: Vec<ClassFeeStructure>,
    bus_fees: Vec<BusFeeStructure>,
    hostel_fees: Vec<HostelFeeStructure>,
}

impl InMemoryFeeStructureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_class_fee(&mut self, structure: ClassFeeStructure) -> Result<()> {
        if structure.is_active
            && self.class_fees.iter().any(|s| {
                s.is_active
                    && s.class == structure.class
                    && s.academic_year == structure.academic_year
            })
        {
            return Err(FeeError::DuplicateStructure {
                kind: "class fee",
                key: structure.class.label(),
                academic_year: structure.academic_year,
            });
        }
        self.class_fees.push(structure);
        Ok(())
    }

    pub fn add_bus_fee(&mut self, structure: BusFeeStructure) -> Result<()> {
        if structure.is_active
            && self.bus_fees.iter().any(|s| {
                s.is_active
                    && s.village.eq_ignore_ascii_case(&structure.village)
                    && s.academic_year == structure.academic_year
            })
        {
            return Err(FeeError::DuplicateStructure {
                kind: "bus fee",
                key: structure.village,
                academic_year: structure.academic_year,
            });
        }
        self.bus_fees.push(structure);
        Ok(())
    }

    pub fn add_hostel_fee(&mut self, structure: HostelFeeStructure) -> Result<()> {
        if structure.is_active
            && self.hostel_fees.iter().any(|s| {
                s.is_active
                    && s.class == structure.class
                    && s.academic_year == structure.academic_year
            })
        {
            return Err(FeeError::DuplicateStructure {
                kind: "hostel fee",
                key: structure.class.label(),
                academic_year: structure.academic_year,
            });
        }
        self.hostel_fees.push(structure);
        Ok(())
    }

    /// deactivate the active class-fee row for (class, year); returns whether
    /// a row was deactivated
    pub fn deactivate_class_fee(&mut self, class: ClassLevel, academic_year: &str) -> bool {
        let mut changed = false;
        for s in self.class_fees.iter_mut() {
            if s.is_active && s.class == class && s.academic_year == academic_year {
                s.is_active = false;
                changed = true;
            }
        }
        changed
    }
}

impl FeeStructureStore for InMemoryFeeStructureStore {
    fn active_class_fee(
        &self,
        class: ClassLevel,
        academic_year: &str,
    ) -> Result<Option<ClassFeeStructure>> {
        Ok(self
            .class_fees
            .iter()
            .find(|s| s.is_active && s.class == class && s.academic_year == academic_year)
            .cloned())
    }

    fn active_bus_fee(
        &self,
        village: &str,
        academic_year: &str,
    ) -> Result<Option<BusFeeStructure>> {
        let needle = village.trim().to_lowercase();
        // exact case-insensitive match first, then substring
        let exact = self.bus_fees.iter().find(|s| {
            s.is_active
                && s.academic_year == academic_year
                && s.village.to_lowercase() == needle
        });
        if exact.is_some() {
            return Ok(exact.cloned());
        }
        Ok(self
            .bus_fees
            .iter()
            .find(|s| {
                s.is_active
                    && s.academic_year == academic_year
                    && s.village.to_lowercase().contains(&needle)
            })
            .cloned())
    }

    fn active_hostel_fee(
        &self,
        class: ClassLevel,
        academic_year: &str,
    ) -> Result<Option<HostelFeeStructure>> {
        Ok(self
            .hostel_fees
            .iter()
            .find(|s| s.is_active && s.class == class && s.academic_year == academic_year)
            .cloned())
    }
}

/// resolves fee structures with the defaults-on-missing policy: a missing
/// structure is never fatal, because structures may be configured after
/// students are already enrolled. storage errors still propagate; only the
/// aggregator decides whether to degrade on those.
pub struct FeeResolver<'a, S: FeeStructureStore> {
    store: &'a S,
}

impl<'a, S: FeeStructureStore> FeeResolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn resolve_class_fee(
        &self,
        class: ClassLevel,
        academic_year: &str,
        now: DateTime<Utc>,
    ) -> Result<ClassFeeStructure> {
        match self.store.active_class_fee(class, academic_year)? {
            Some(structure) => Ok(structure),
            None => {
                warn!(
                    class = %class.label(),
                    academic_year,
                    "no active class fee structure; using default"
                );
                Ok(ClassFeeStructure::fallback(class, academic_year, now))
            }
        }
    }

    pub fn resolve_bus_fee(
        &self,
        village: Option<&str>,
        academic_year: &str,
        now: DateTime<Utc>,
    ) -> Result<BusFeeStructure> {
        let village = match village.map(str::trim) {
            Some(v) if !v.is_empty() => v,
            // no village on record: flat default without querying
            _ => return Ok(BusFeeStructure::fallback("", academic_year, now)),
        };

        match self.store.active_bus_fee(village, academic_year)? {
            Some(structure) => Ok(structure),
            None => {
                warn!(village, academic_year, "no active bus fee structure; using default");
                Ok(BusFeeStructure::fallback(village, academic_year, now))
            }
        }
    }

    pub fn resolve_hostel_fee(
        &self,
        class: ClassLevel,
        academic_year: &str,
        now: DateTime<Utc>,
    ) -> Result<HostelFeeStructure> {
        match self.store.active_hostel_fee(class, academic_year)? {
            Some(structure) => Ok(structure),
            None => {
                warn!(
                    class = %class.label(),
                    academic_year,
                    "no active hostel fee structure; using default"
                );
                Ok(HostelFeeStructure::fallback(class, academic_year, now))
            }
        }
    }
}
