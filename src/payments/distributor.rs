use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calc::split_evenly;
use crate::decimal::Money;
use crate::errors::{FeeError, Result};
use crate::ledger::{PaymentLedger, PaymentRecord, TermAllocation};
use crate::state::FeeSnapshot;
use crate::types::{FeeComponent, PaymentMode, PaymentStatus};

use super::PaymentRequest;

/// how one component of a planned payment will be applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentApplication {
    pub component: FeeComponent,
    pub amount: Money,
    /// per-term spread for payments without an explicit term; empty when the
    /// record's own `term` field carries the attribution
    pub allocations: Vec<TermAllocation>,
}

/// a validated payment, ready to apply. building the plan performs every
/// check (term bounds, over-payment) so that applying it cannot fail and
/// cannot leave totals and history out of step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentPlan {
    pub academic_year: String,
    pub term: Option<u8>,
    pub applications: Vec<ComponentApplication>,
    pub total: Money,
    pub payment_mode: PaymentMode,
    pub description: String,
    pub received_by: String,
}

/// allocates payments against a fee snapshot. one distribution policy is
/// used everywhere: an explicit term pays down exactly that term's due; an
/// unscoped payment spreads greedily, largest remaining due first.
pub struct PaymentDistributor;

impl PaymentDistributor {
    /// validate a request against the snapshot and ledger and compute the
    /// application. pure: rejection here leaves no trace anywhere.
    pub fn plan(
        snapshot: &FeeSnapshot,
        ledger: &PaymentLedger,
        request: &PaymentRequest,
    ) -> Result<PaymentPlan> {
        request.validate()?;

        let mut applications = Vec::new();
        for (component, amount) in request.components() {
            let application = match request.term {
                Some(term) => {
                    Self::plan_term_scoped(snapshot, ledger, component, term, amount)?
                }
                None => Self::plan_spread(snapshot, ledger, component, amount)?,
            };
            applications.push(application);
        }

        let description = request.description.clone().unwrap_or_else(|| match request.term {
            Some(term) => format!("Term {} Payment", term),
            None => "Annual Fee Payment".to_string(),
        });

        Ok(PaymentPlan {
            academic_year: request.academic_year.clone(),
            term: request.term,
            applications,
            total: request.total(),
            payment_mode: request.payment_mode,
            description,
            received_by: request.received_by.clone(),
        })
    }

    fn plan_term_scoped(
        snapshot: &FeeSnapshot,
        ledger: &PaymentLedger,
        component: FeeComponent,
        term: u8,
        amount: Money,
    ) -> Result<ComponentApplication> {
        let terms = snapshot.component_terms(component);
        if term == 0 || term > terms {
            return Err(FeeError::InvalidTerm {
                component,
                term,
                terms,
            });
        }

        let distribution = split_evenly(snapshot.component_total(component), terms)?;
        let term_amount = distribution.amount_for(term).unwrap_or(Money::ZERO);
        let already_paid = ledger.paid_for_term(&snapshot.academic_year, component, term);
        let due = (term_amount - already_paid).max(Money::ZERO);

        if amount > due {
            return Err(FeeError::OverPayment {
                component,
                term: Some(term),
                due,
                requested: amount,
            });
        }

        Ok(ComponentApplication {
            component,
            amount,
            allocations: Vec::new(),
        })
    }

    fn plan_spread(
        snapshot: &FeeSnapshot,
        ledger: &PaymentLedger,
        component: FeeComponent,
        amount: Money,
    ) -> Result<ComponentApplication> {
        let due = snapshot.component_due(component);
        if amount > due {
            return Err(FeeError::OverPayment {
                component,
                term: None,
                due,
                requested: amount,
            });
        }

        let allocations = Self::distribute_across_terms(snapshot, ledger, component, amount)?;
        Ok(ComponentApplication {
            component,
            amount,
            allocations,
        })
    }

    /// spread an amount across terms: largest remaining due first, ties
    /// broken by ascending term index. every applied payment attributes its
    /// full amount to terms, so the per-term dues always sum to the
    /// component due and the amount is fully absorbed.
    fn distribute_across_terms(
        snapshot: &FeeSnapshot,
        ledger: &PaymentLedger,
        component: FeeComponent,
        amount: Money,
    ) -> Result<Vec<TermAllocation>> {
        let terms = snapshot.component_terms(component);
        let distribution = split_evenly(snapshot.component_total(component), terms)?;

        let mut dues: Vec<(u8, Money)> = distribution
            .iter()
            .map(|(term, term_amount)| {
                let paid = ledger.paid_for_term(&snapshot.academic_year, component, term);
                (term, (term_amount - paid).max(Money::ZERO))
            })
            .collect();
        dues.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        let mut remaining = amount;
        let mut allocations = Vec::new();
        for (term, due) in dues {
            if remaining.is_zero() {
                break;
            }
            let take = remaining.min(due);
            if take.is_positive() {
                allocations.push(TermAllocation {
                    component,
                    term,
                    amount: take,
                });
                remaining -= take;
            }
        }
        allocations.sort_by_key(|a| a.term);

        Ok(allocations)
    }

    /// apply a plan: increment the snapshot counters and append exactly one
    /// ledger record. infallible by construction; `plan` did the rejecting.
    pub fn apply(
        plan: PaymentPlan,
        snapshot: &mut FeeSnapshot,
        ledger: &mut PaymentLedger,
        payment_id: Uuid,
        receipt_no: String,
        now: DateTime<Utc>,
    ) -> PaymentRecord {
        let mut allocations = Vec::new();
        for application in &plan.applications {
            snapshot.record_component_payment(application.component, application.amount);
            allocations.extend(application.allocations.iter().copied());
        }

        let amount_for = |component: FeeComponent| {
            plan.applications
                .iter()
                .find(|a| a.component == component)
                .map(|a| a.amount)
                .unwrap_or(Money::ZERO)
        };

        let record = PaymentRecord {
            payment_id,
            academic_year: plan.academic_year,
            date: now,
            school_fee_paid: amount_for(FeeComponent::School),
            transport_fee_paid: amount_for(FeeComponent::Transport),
            hostel_fee_paid: amount_for(FeeComponent::Hostel),
            total_amount: plan.total,
            receipt_no,
            payment_mode: plan.payment_mode,
            description: plan.description,
            term: plan.term,
            allocations,
            received_by: plan.received_by,
            status: PaymentStatus::Completed,
        };

        ledger.append(record.clone());
        record
    }
}
