//! Minimum payout threshold.
//!
//! Benefits below two percent of the high monthly rate are not paid out. This
//! module classifies every month calculation against that threshold and
//! cancels small benefits with a synthesized [`DeductionType::BelowMinimum`]
//! deduction, unless the low amount is caused by social assistance or a
//! foreign-stay reduction.

use rust_decimal::Decimal;
use tracing::debug;

use crate::config::RateTable;
use crate::error::EngineResult;
use crate::models::{
    Annotation, Deduction, DeductionOwner, DeductionType, Month, MonthCalculation, RateCategory,
};

/// The payout minimum as a fraction of the high monthly rate (2%).
pub const MINIMUM_PAYOUT_FRACTION: Decimal = Decimal::from_parts(2, 0, 0, false, 2);

/// Returns the smallest benefit paid out in `month`.
pub fn minimum_payout_threshold(month: Month, rates: &RateTable) -> EngineResult<Decimal> {
    Ok(rates.monthly_rate(RateCategory::High, month.start())? * MINIMUM_PAYOUT_FRACTION)
}

/// Applies the payout minimum to a freshly calculated month.
///
/// - A benefit of zero is annotated [`Annotation::ZeroBenefit`].
/// - A benefit at or above the threshold is returned unchanged.
/// - A benefit that would reach the threshold without social assistance is
///   kept and annotated [`Annotation::SocialAssistanceCausesBelowTwoPercent`].
/// - Otherwise, a benefit that would reach the threshold without foreign-stay
///   reductions is kept and annotated
///   [`Annotation::ForeignStayReductionCausesBelowTwoPercent`].
/// - Any other benefit is cancelled by a `BelowMinimum` deduction equal to the
///   benefit and annotated
///   [`Annotation::BenefitBetweenZeroAndTwoPercentOfHighRate`].
///
/// Annotations already on `calculation` are preserved.
pub fn apply_minimum_threshold(
    calculation: MonthCalculation,
    rates: &RateTable,
) -> EngineResult<MonthCalculation> {
    let mut calculation = calculation;
    let month = calculation.month();
    let benefit = calculation.benefit_amount();

    if benefit == 0 {
        calculation.add_annotation(Annotation::ZeroBenefit)?;
        return Ok(calculation);
    }

    let threshold = minimum_payout_threshold(month, rates)?;
    if Decimal::from(benefit) >= threshold {
        return Ok(calculation);
    }

    if benefit_without(&calculation, DeductionType::SocialAssistance)? >= threshold {
        debug!(%month, benefit, %threshold, "Social assistance causes benefit below minimum");
        calculation.add_annotation(Annotation::SocialAssistanceCausesBelowTwoPercent)?;
        return Ok(calculation);
    }

    if benefit_without(&calculation, DeductionType::ForeignStayReduction)? >= threshold {
        debug!(%month, benefit, %threshold, "Foreign-stay reduction causes benefit below minimum");
        calculation.add_annotation(Annotation::ForeignStayReductionCausesBelowTwoPercent)?;
        return Ok(calculation);
    }

    debug!(%month, benefit, %threshold, "Cancelling benefit below minimum");

    let mut deductions = calculation.deductions().to_vec();
    deductions.push(Deduction::for_month(
        DeductionType::BelowMinimum,
        Decimal::from(benefit),
        month,
        DeductionOwner::Applicant,
    )?);

    let mut cancelled = MonthCalculation::new(
        month,
        calculation.rate_category(),
        calculation.base_unit(),
        calculation.rate_amount(),
        deductions,
        calculation.spouse_free_amount(),
    )?;
    for annotation in calculation.annotations() {
        cancelled.add_annotation(annotation.clone())?;
    }
    cancelled.add_annotation(Annotation::BenefitBetweenZeroAndTwoPercentOfHighRate)?;

    Ok(cancelled)
}

/// The benefit the month would have had without deductions of `excluded` type.
fn benefit_without(
    calculation: &MonthCalculation,
    excluded: DeductionType,
) -> EngineResult<Decimal> {
    let remaining: Vec<Deduction> = calculation
        .deductions()
        .iter()
        .filter(|d| d.deduction_type() != excluded)
        .cloned()
        .collect();

    if remaining.len() == calculation.deductions().len() {
        return Ok(Decimal::from(calculation.benefit_amount()));
    }

    let recalculated = MonthCalculation::new(
        calculation.month(),
        calculation.rate_category(),
        calculation.base_unit(),
        calculation.rate_amount(),
        remaining,
        calculation.spouse_free_amount(),
    )?;
    Ok(Decimal::from(recalculated.benefit_amount()))
}
