//! Construction of complete benefit calculations.

use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::RateTable;
use crate::error::{EngineError, EngineResult};
use crate::models::{BenefitCalculation, CalculationRequest};

use super::reconcile;

/// Builds [`BenefitCalculation`]s from requests.
///
/// # Example
///
/// ```no_run
/// use benefit_engine::calculation::CalculationFactory;
/// use benefit_engine::config::ConfigLoader;
/// use benefit_engine::models::{
///     BenefitKind, CalculationRequest, DeductionStrategy, Household, Month, Period, RateCategory,
/// };
///
/// let loader = ConfigLoader::load("config/supplementary").unwrap();
/// let request = CalculationRequest {
///     period: Period::from_months(Month::new(2020, 1).unwrap(), Month::new(2020, 12).unwrap())
///         .unwrap(),
///     rate_category: RateCategory::High,
///     deductions: vec![],
///     strategy: DeductionStrategy::new(BenefitKind::Retirement, Household::Single),
///     carry_in: None,
///     justification: None,
/// };
///
/// let calculation = CalculationFactory::create(request, loader.rate_table()).unwrap();
/// assert_eq!(calculation.months().len(), 12);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CalculationFactory;

impl CalculationFactory {
    /// Calculates every month of the request period and assembles the result.
    ///
    /// # Errors
    ///
    /// - `DeductionOutsidePeriod` if a raw deduction is not contained in the period
    /// - `CarryInNotAdjacent` if the carry-in is not for the month before the period
    /// - `MissingExpectedIncome` for disability calculations without expected income
    /// - `RateNotFound` if the rate table does not cover a month
    pub fn create(
        request: CalculationRequest,
        rates: &RateTable,
    ) -> EngineResult<BenefitCalculation> {
        let start_time = Instant::now();
        let id = Uuid::new_v4();

        if let Some(outside) = request
            .deductions
            .iter()
            .find(|d| !request.period.contains(&d.period()))
        {
            warn!(
                calculation_id = %id,
                period = %request.period,
                deduction_period = %outside.period(),
                "Deduction outside calculation period"
            );
            return Err(EngineError::DeductionOutsidePeriod {
                period: request.period,
                deduction_period: outside.period(),
            });
        }

        let months = reconcile(
            request.period,
            request.rate_category,
            &request.deductions,
            &request.strategy,
            request.carry_in.as_ref(),
            rates,
        )
        .inspect_err(|err| {
            warn!(calculation_id = %id, error = %err, "Calculation failed");
        })?;

        let calculation = BenefitCalculation::new(
            id,
            Utc::now(),
            request.period,
            request.rate_category,
            request.strategy,
            request.justification,
            request.deductions,
            months.into_values().collect(),
        )?;

        info!(
            calculation_id = %id,
            period = %calculation.period(),
            months = calculation.months().len(),
            total_benefit = calculation.total_benefit(),
            total_deduction = %calculation.total_deduction(),
            duration_us = start_time.elapsed().as_micros(),
            "Calculation completed successfully"
        );

        Ok(calculation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::fixtures::rate_table;
    use crate::models::{
        Annotation, BenefitKind, Deduction, DeductionOwner, DeductionStrategy, DeductionType,
        Household, Month, Period, RateCategory,
    };
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn month(y: i32, m: u32) -> Month {
        Month::new(y, m).unwrap()
    }

    fn year_2020() -> Period {
        Period::from_months(month(2020, 1), month(2020, 12)).unwrap()
    }

    fn request(deductions: Vec<Deduction>) -> CalculationRequest {
        CalculationRequest {
            period: year_2020(),
            rate_category: RateCategory::High,
            deductions,
            strategy: DeductionStrategy::new(BenefitKind::Retirement, Household::Single),
            carry_in: None,
            justification: Some("annual review".to_string()),
        }
    }

    #[test]
    fn test_create_without_deductions() {
        let calculation = CalculationFactory::create(request(vec![]), &rate_table()).unwrap();

        assert_eq!(calculation.months().len(), 12);
        assert_eq!(calculation.period(), year_2020());
        assert_eq!(calculation.justification(), Some("annual review"));
        // Four months at 20637 and eight at 20946.
        assert_eq!(calculation.total_benefit(), 250116);
        assert_eq!(calculation.total_deduction(), Decimal::ZERO);
        assert!(matches!(
            calculation.months()[0].annotations().as_slice()[0],
            Annotation::NewBenefit { .. }
        ));
    }

    #[test]
    fn test_raw_deductions_are_kept() {
        let deductions = vec![
            Deduction::new(
                DeductionType::EmploymentIncome,
                dec("1000"),
                year_2020(),
                DeductionOwner::Applicant,
                None,
            )
            .unwrap(),
        ];
        let calculation = CalculationFactory::create(request(deductions.clone()), &rate_table())
            .unwrap();

        assert_eq!(calculation.deductions(), deductions.as_slice());
        assert_eq!(calculation.total_benefit(), 250116 - 12 * 1000);
    }

    #[test]
    fn test_deduction_outside_period_is_rejected() {
        let outside = Period::from_months(month(2020, 6), month(2021, 1)).unwrap();
        let deductions = vec![
            Deduction::new(
                DeductionType::CapitalIncome,
                dec("100"),
                outside,
                DeductionOwner::Applicant,
                None,
            )
            .unwrap(),
        ];

        let result = CalculationFactory::create(request(deductions), &rate_table());
        assert!(matches!(
            result,
            Err(EngineError::DeductionOutsidePeriod { deduction_period, .. }) if deduction_period == outside
        ));
    }

    #[test]
    fn test_each_calculation_gets_a_fresh_id() {
        let rates = rate_table();
        let first = CalculationFactory::create(request(vec![]), &rates).unwrap();
        let second = CalculationFactory::create(request(vec![]), &rates).unwrap();

        assert_ne!(first.id(), second.id());
        assert!(first.is_equivalent_to(&second));
    }

    #[test]
    fn test_period_before_rate_table_fails() {
        let mut request = request(vec![]);
        request.period = Period::from_months(month(2019, 1), month(2019, 12)).unwrap();

        let result = CalculationFactory::create(request, &rate_table());
        assert!(matches!(result, Err(EngineError::RateNotFound { .. })));
    }
}
