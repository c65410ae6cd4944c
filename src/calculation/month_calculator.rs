//! Single-month benefit calculation.
//!
//! This module turns a month, a rate category and the month's periodized
//! deductions into a [`MonthCalculation`], looking the rate up in the
//! [`RateTable`].

use rust_decimal::Decimal;

use crate::config::RateTable;
use crate::error::EngineResult;
use crate::models::{Annotation, BaseUnitDetail, Deduction, Month, MonthCalculation, RateCategory};

/// Calculates the benefit for one month.
///
/// The rate amount is the monthly rate for `rate_category` on the first day
/// of `month`. If the base unit took effect on that day and replaced an
/// earlier one, the result carries an [`Annotation::BaseRateChanged`].
///
/// # Errors
///
/// - `DeductionOutsideMonth` if any deduction does not cover exactly `month`
/// - `RateNotFound` if the rate table has no entry for the month
///
/// # Examples
///
/// ```no_run
/// use benefit_engine::calculation::calculate_month;
/// use benefit_engine::config::ConfigLoader;
/// use benefit_engine::models::{Month, RateCategory};
/// use rust_decimal::Decimal;
///
/// let loader = ConfigLoader::load("config/supplementary").unwrap();
/// let january = Month::new(2020, 1).unwrap();
/// let result = calculate_month(
///     january,
///     RateCategory::High,
///     vec![],
///     Decimal::ZERO,
///     loader.rate_table(),
/// )
/// .unwrap();
///
/// assert_eq!(result.benefit_amount(), 20637);
/// ```
pub fn calculate_month(
    month: Month,
    rate_category: RateCategory,
    deductions: Vec<Deduction>,
    spouse_free_amount: Decimal,
    rates: &RateTable,
) -> EngineResult<MonthCalculation> {
    let rate_amount = rates.monthly_rate(rate_category, month.start())?;
    let base_unit = rates.base_unit_at(month.start())?;

    let mut calculation = MonthCalculation::new(
        month,
        rate_category,
        base_unit.base_unit,
        rate_amount,
        deductions,
        spouse_free_amount,
    )?;

    if base_unit.effective_date == month.start() {
        if let Some(previous) = rates.previous_base_unit(base_unit) {
            calculation.add_annotation(Annotation::BaseRateChanged {
                previous: BaseUnitDetail {
                    date: previous.effective_date,
                    base_unit: previous.base_unit,
                },
                new: BaseUnitDetail {
                    date: base_unit.effective_date,
                    base_unit: base_unit.base_unit,
                },
            })?;
        }
    }

    Ok(calculation)
}
