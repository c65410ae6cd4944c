//! Effective-date reconciliation.
//!
//! A newly calculated month does not always take effect immediately. Walking
//! the period month by month, each freshly calculated candidate is compared
//! with the amount in effect the month before:
//!
//! - An increase of 10% or more takes effect in the same month.
//! - A decrease of 10% or more takes effect from the following month; the
//!   month itself keeps the previous calculation.
//! - Smaller changes are suppressed and the previous calculation continues.
//!
//! Carrying a calculation into a new month re-derives its rate, base unit and
//! spouse free amount for that month, so base unit adjustments always pass
//! through regardless of the 10% rule.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::debug;

use crate::config::RateTable;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    Annotation, Deduction, DeductionStrategy, DeductionType, Month, MonthCalculation, Period,
    RateCategory,
};

use super::{apply_minimum_threshold, calculate_month, periodize_deductions, spouse_free_amount};

/// The change in percent at which a new amount takes effect.
pub const CHANGE_THRESHOLD_PERCENT: Decimal = Decimal::from_parts(10, 0, 0, false, 0);

const ONE_HUNDRED: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// How a candidate benefit relates to the benefit in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BenefitChange {
    /// Rose by at least [`CHANGE_THRESHOLD_PERCENT`].
    Increase,
    /// Fell by at least [`CHANGE_THRESHOLD_PERCENT`].
    Decrease,
    /// Changed by less than [`CHANGE_THRESHOLD_PERCENT`] either way.
    BelowThreshold,
}

/// Returns the change from `effective` to `candidate` in percent.
///
/// Going from zero to zero is no change; going from zero to any positive
/// amount counts as +100% and any positive amount to zero as -100%.
///
/// # Examples
///
/// ```
/// use benefit_engine::calculation::percent_change;
/// use rust_decimal::Decimal;
///
/// assert_eq!(percent_change(1000, 1100), Decimal::from(10));
/// assert_eq!(percent_change(0, 500), Decimal::from(100));
/// assert_eq!(percent_change(500, 0), Decimal::from(-100));
/// ```
pub fn percent_change(effective: u64, candidate: u64) -> Decimal {
    match (effective, candidate) {
        (0, 0) => Decimal::ZERO,
        (0, _) => ONE_HUNDRED,
        (_, 0) => -ONE_HUNDRED,
        (effective, candidate) => {
            let effective = Decimal::from(effective);
            (Decimal::from(candidate) - effective) / effective * ONE_HUNDRED
        }
    }
}

/// Classifies the change from `effective` to `candidate`.
pub fn classify_change(effective: u64, candidate: u64) -> BenefitChange {
    let change = percent_change(effective, candidate);
    if change >= CHANGE_THRESHOLD_PERCENT {
        BenefitChange::Increase
    } else if change <= -CHANGE_THRESHOLD_PERCENT {
        BenefitChange::Decrease
    } else {
        BenefitChange::BelowThreshold
    }
}

/// Calculates every month of `period` and decides which amount takes effect.
///
/// `carry_in` is the calculation in effect for the month before `period`, if
/// any. Without it the first month is adopted as a new benefit.
///
/// # Errors
///
/// - `CarryInNotAdjacent` if `carry_in` is not for the month before `period`
/// - Any error from periodizing deductions or calculating a month
pub fn reconcile(
    period: Period,
    rate_category: RateCategory,
    deductions: &[Deduction],
    strategy: &DeductionStrategy,
    carry_in: Option<&MonthCalculation>,
    rates: &RateTable,
) -> EngineResult<BTreeMap<Month, MonthCalculation>> {
    if let Some(carry_in) = carry_in {
        if carry_in.month() != period.month_before()? {
            return Err(EngineError::CarryInNotAdjacent {
                carry_in: carry_in.month(),
                period,
            });
        }
    }

    let by_month = periodize_deductions(strategy, deductions, period, rates)?;

    let (_, reconciled) = by_month.into_iter().try_fold(
        (carry_in.cloned(), BTreeMap::new()),
        |(baseline, mut reconciled), (month, deductions)| -> EngineResult<_> {
            let candidate = apply_minimum_threshold(
                calculate_month(
                    month,
                    rate_category,
                    deductions,
                    spouse_free_amount(strategy, month, rates)?,
                    rates,
                )?,
                rates,
            )?;

            let (effective, next_baseline) = match baseline {
                None => adopt_new_benefit(candidate)?,
                Some(baseline) => decide(&baseline, candidate, strategy, rates)?,
            };

            reconciled.insert(month, effective);
            Ok((Some(next_baseline), reconciled))
        },
    )?;

    Ok(reconciled)
}

/// Returns the month's effective calculation and the baseline for the next month.
fn adopt_new_benefit(
    candidate: MonthCalculation,
) -> EngineResult<(MonthCalculation, MonthCalculation)> {
    let mut adopted = candidate;
    adopted.add_annotation(Annotation::NewBenefit {
        adopted: adopted.snapshot(),
    })?;
    debug!(
        month = %adopted.month(),
        benefit = adopted.benefit_amount(),
        "Adopting new benefit"
    );
    Ok((adopted.clone(), adopted))
}

fn decide(
    baseline: &MonthCalculation,
    candidate: MonthCalculation,
    strategy: &DeductionStrategy,
    rates: &RateTable,
) -> EngineResult<(MonthCalculation, MonthCalculation)> {
    let month = candidate.month();
    let mut carried = shift_forward(baseline, month, strategy, rates)?;
    let change = classify_change(baseline.benefit_amount(), candidate.benefit_amount());

    debug!(
        %month,
        candidate = candidate.benefit_amount(),
        baseline = baseline.benefit_amount(),
        carried = carried.benefit_amount(),
        ?change,
        "Reconciling month"
    );

    match change {
        BenefitChange::Increase => {
            let mut adopted = candidate;
            adopted.add_annotation(Annotation::IncreasedBenefit {
                adopted: adopted.snapshot(),
                rejected: carried.snapshot(),
            })?;
            Ok((adopted.clone(), adopted))
        }
        BenefitChange::Decrease => {
            carried.add_annotation(Annotation::DecreasedBenefit {
                adopted: carried.snapshot(),
                rejected: candidate.snapshot(),
            })?;
            Ok((carried, candidate))
        }
        BenefitChange::BelowThreshold => {
            if !carried.is_equivalent_to(&candidate) {
                carried.add_annotation(Annotation::ChangeBelowTenPercent {
                    adopted: carried.snapshot(),
                    rejected: candidate.snapshot(),
                })?;
            }
            Ok((carried.clone(), carried))
        }
    }
}

/// Moves `calculation` into `month`, re-deriving the rate, base unit and
/// spouse free amount and re-applying the payout minimum.
///
/// Synthesized `BelowMinimum` deductions are dropped before the move.
pub fn shift_forward(
    calculation: &MonthCalculation,
    month: Month,
    strategy: &DeductionStrategy,
    rates: &RateTable,
) -> EngineResult<MonthCalculation> {
    let deductions = calculation
        .deductions()
        .iter()
        .filter(|d| d.deduction_type() != DeductionType::BelowMinimum)
        .map(|d| d.with_period(month.period()))
        .collect();

    apply_minimum_threshold(
        calculate_month(
            month,
            calculation.rate_category(),
            deductions,
            spouse_free_amount(strategy, month, rates)?,
            rates,
        )?,
        rates,
    )
}
