//! Household deduction rules.
//!
//! Raw deductions are split into months and filtered per household: which of
//! the applicant's incomes count, how much of the spouse's income is
//! disregarded, and how the spouse's remaining deductions are merged.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::config::{GuaranteePensionLevel, RateTable};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    Deduction, DeductionOwner, DeductionStrategy, DeductionType, Household, Month, Period,
    RateCategory, sum_monthly,
};

/// Returns the amount of spouse deductions disregarded in `month`.
///
/// - Spouse over 67: the ordinary guarantee pension, monthly
/// - Spouse under 67 and disabled refugee: the ordinary monthly rate
/// - Otherwise zero
pub fn spouse_free_amount(
    strategy: &DeductionStrategy,
    month: Month,
    rates: &RateTable,
) -> EngineResult<Decimal> {
    match strategy.household {
        Household::SpouseOver67 => {
            rates.guarantee_pension_monthly(GuaranteePensionLevel::Ordinary, month.start())
        }
        Household::SpouseUnder67AndDisabledRefugee => {
            rates.monthly_rate(RateCategory::Ordinary, month.start())
        }
        Household::Single | Household::SpouseUnder67 => Ok(Decimal::ZERO),
    }
}

/// Splits `deductions` into months of `period` and applies the household rules.
///
/// The result has one entry per month of `period`, possibly with an empty
/// list. Parts of deductions falling outside `period` are ignored.
///
/// # Errors
///
/// - `MissingExpectedIncome` if a disability calculation month does not have
///   exactly one applicant expected income
/// - `RateNotFound` if a spouse free amount cannot be looked up
///
/// # Examples
///
/// ```
/// use benefit_engine::calculation::periodize_deductions;
/// use benefit_engine::config::{BaseUnitConfig, RateFactorConfig, RateTable, SchemeMetadata};
/// use benefit_engine::models::{
///     BenefitKind, Deduction, DeductionOwner, DeductionStrategy, DeductionType, Household, Month,
///     Period,
/// };
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let rates = RateTable::new(
///     SchemeMetadata {
///         code: "supplementary".to_string(),
///         name: "Supplementary Benefit".to_string(),
///         version: "2021".to_string(),
///         source_url: "https://example.org".to_string(),
///     },
///     vec![RateFactorConfig {
///         effective_date: NaiveDate::from_ymd_opt(2015, 1, 1).unwrap(),
///         ordinary: Decimal::new(228, 2),
///         high: Decimal::new(248, 2),
///     }],
///     vec![BaseUnitConfig {
///         effective_date: NaiveDate::from_ymd_opt(2020, 5, 1).unwrap(),
///         base_unit: 101351,
///         guarantee_pension: None,
///     }],
/// )
/// .unwrap();
///
/// let period = Period::from_months(Month::new(2021, 1).unwrap(), Month::new(2021, 3).unwrap())
///     .unwrap();
/// let deductions = vec![
///     Deduction::new(DeductionType::CapitalIncome, Decimal::from(500), period, DeductionOwner::Applicant, None)
///         .unwrap(),
///     Deduction::new(DeductionType::CapitalIncome, Decimal::from(900), period, DeductionOwner::Spouse, None)
///         .unwrap(),
/// ];
/// let strategy = DeductionStrategy::new(BenefitKind::Retirement, Household::Single);
///
/// let by_month = periodize_deductions(&strategy, &deductions, period, &rates).unwrap();
/// assert_eq!(by_month.len(), 3);
/// assert!(by_month.values().all(|d| d.len() == 1 && d[0].is_applicant()));
/// ```
pub fn periodize_deductions(
    strategy: &DeductionStrategy,
    deductions: &[Deduction],
    period: Period,
    rates: &RateTable,
) -> EngineResult<BTreeMap<Month, Vec<Deduction>>> {
    let mut by_month: BTreeMap<Month, Vec<Deduction>> = period
        .months()
        .into_iter()
        .map(|month| (month, Vec::new()))
        .collect();

    for deduction in deductions {
        for monthly in deduction.periodize() {
            let month = Month::try_from(monthly.period())?;
            if let Some(list) = by_month.get_mut(&month) {
                list.push(monthly);
            }
        }
    }

    by_month
        .into_iter()
        .map(|(month, deductions)| {
            let counted = deductions_for_month(strategy, month, deductions, rates)?;
            Ok((month, counted))
        })
        .collect()
}

/// Applies the household rules to the periodized deductions of one month.
pub fn deductions_for_month(
    strategy: &DeductionStrategy,
    month: Month,
    deductions: Vec<Deduction>,
    rates: &RateTable,
) -> EngineResult<Vec<Deduction>> {
    let deductions = if strategy.requires_expected_income() {
        keep_larger_of_employment_and_expected_income(month, deductions)?
    } else {
        deductions
    };

    let (mut counted, spouse): (Vec<Deduction>, Vec<Deduction>) =
        deductions.into_iter().partition(Deduction::is_applicant);

    match strategy.household {
        Household::Single => {}
        Household::SpouseOver67 | Household::SpouseUnder67AndDisabledRefugee => {
            let free_amount = spouse_free_amount(strategy, month, rates)?;
            counted.extend(reduce_by_free_amount(month, &spouse, free_amount)?);
        }
        Household::SpouseUnder67 => {
            if !spouse.is_empty() {
                counted.push(calculated_spouse_deduction(month, sum_monthly(&spouse))?);
            }
        }
    }

    Ok(counted)
}

fn is_applicant_income(deduction: &Deduction, deduction_type: DeductionType) -> bool {
    deduction.is_applicant() && deduction.deduction_type() == deduction_type
}

/// Only the larger of the applicant's employment income and expected income counts.
fn keep_larger_of_employment_and_expected_income(
    month: Month,
    deductions: Vec<Deduction>,
) -> EngineResult<Vec<Deduction>> {
    let expected_incomes = deductions
        .iter()
        .filter(|d| is_applicant_income(d, DeductionType::ExpectedIncome))
        .count();
    if expected_incomes != 1 {
        return Err(EngineError::MissingExpectedIncome { month });
    }

    let total_of = |deduction_type: DeductionType| -> Decimal {
        deductions
            .iter()
            .filter(|d| is_applicant_income(d, deduction_type))
            .map(Deduction::monthly_amount)
            .sum()
    };
    let dropped = if total_of(DeductionType::EmploymentIncome) > total_of(DeductionType::ExpectedIncome)
    {
        DeductionType::ExpectedIncome
    } else {
        DeductionType::EmploymentIncome
    };

    Ok(deductions
        .into_iter()
        .filter(|d| !is_applicant_income(d, dropped))
        .collect())
}

/// Disregards spouse deductions up to `free_amount`; social assistance always counts.
fn reduce_by_free_amount(
    month: Month,
    spouse: &[Deduction],
    free_amount: Decimal,
) -> EngineResult<Option<Deduction>> {
    let (social_assistance, other): (Vec<Deduction>, Vec<Deduction>) = spouse
        .iter()
        .cloned()
        .partition(|d| d.deduction_type() == DeductionType::SocialAssistance);

    let above_free_amount = (sum_monthly(&other) - free_amount).max(Decimal::ZERO);
    let social_assistance = sum_monthly(&social_assistance);

    if above_free_amount.is_zero() && social_assistance.is_zero() {
        return Ok(None);
    }
    calculated_spouse_deduction(month, above_free_amount + social_assistance).map(Some)
}

fn calculated_spouse_deduction(month: Month, amount: Decimal) -> EngineResult<Deduction> {
    Deduction::for_month(
        DeductionType::CalculatedSpouseDeduction,
        amount,
        month,
        DeductionOwner::Spouse,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::fixtures::rate_table;
    use crate::models::BenefitKind;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn january() -> Month {
        Month::new(2020, 1).unwrap()
    }

    fn deduction(deduction_type: DeductionType, amount: &str, owner: DeductionOwner) -> Deduction {
        Deduction::for_month(deduction_type, dec(amount), january(), owner).unwrap()
    }

    fn strategy(benefit_kind: BenefitKind, household: Household) -> DeductionStrategy {
        DeductionStrategy::new(benefit_kind, household)
    }

    fn apply(strategy: DeductionStrategy, deductions: Vec<Deduction>) -> EngineResult<Vec<Deduction>> {
        deductions_for_month(&strategy, january(), deductions, &rate_table())
    }

    #[test]
    fn test_single_ignores_spouse_deductions() {
        let result = apply(
            strategy(BenefitKind::Retirement, Household::Single),
            vec![
                deduction(DeductionType::PublicPension, "3000", DeductionOwner::Applicant),
                deduction(DeductionType::PublicPension, "9000", DeductionOwner::Spouse),
            ],
        )
        .unwrap();

        assert_eq!(result.len(), 1);
        assert!(result[0].is_applicant());
    }

    #[test]
    fn test_disability_requires_exactly_one_expected_income() {
        let disability = strategy(BenefitKind::Disability, Household::Single);

        let none = apply(disability, vec![]);
        assert!(matches!(none, Err(EngineError::MissingExpectedIncome { .. })));

        let two = apply(
            disability,
            vec![
                deduction(DeductionType::ExpectedIncome, "1000", DeductionOwner::Applicant),
                deduction(DeductionType::ExpectedIncome, "2000", DeductionOwner::Applicant),
            ],
        );
        assert!(matches!(two, Err(EngineError::MissingExpectedIncome { .. })));

        let spouse_only = apply(
            disability,
            vec![deduction(DeductionType::ExpectedIncome, "1000", DeductionOwner::Spouse)],
        );
        assert!(matches!(
            spouse_only,
            Err(EngineError::MissingExpectedIncome { .. })
        ));
    }

    #[test]
    fn test_retirement_does_not_require_expected_income() {
        let result = apply(strategy(BenefitKind::Retirement, Household::Single), vec![]).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_larger_employment_income_replaces_expected_income() {
        let result = apply(
            strategy(BenefitKind::Disability, Household::Single),
            vec![
                deduction(DeductionType::ExpectedIncome, "1000", DeductionOwner::Applicant),
                deduction(DeductionType::EmploymentIncome, "800", DeductionOwner::Applicant),
                deduction(DeductionType::EmploymentIncome, "700", DeductionOwner::Applicant),
            ],
        )
        .unwrap();

        assert_eq!(result.len(), 2);
        assert!(
            result
                .iter()
                .all(|d| d.deduction_type() == DeductionType::EmploymentIncome)
        );
    }

    #[test]
    fn test_larger_expected_income_replaces_employment_income() {
        let result = apply(
            strategy(BenefitKind::Disability, Household::Single),
            vec![
                deduction(DeductionType::ExpectedIncome, "2000", DeductionOwner::Applicant),
                deduction(DeductionType::EmploymentIncome, "1500", DeductionOwner::Applicant),
                deduction(DeductionType::CapitalIncome, "100", DeductionOwner::Applicant),
            ],
        )
        .unwrap();

        let types: Vec<DeductionType> = result.iter().map(Deduction::deduction_type).collect();
        assert_eq!(
            types,
            vec![DeductionType::ExpectedIncome, DeductionType::CapitalIncome]
        );
    }

    #[test]
    fn test_spouse_over_67_disregards_guarantee_pension() {
        // Ordinary guarantee pension 176099 a year is 14674.92 a month.
        let result = apply(
            strategy(BenefitKind::Retirement, Household::SpouseOver67),
            vec![deduction(DeductionType::PublicPension, "20000", DeductionOwner::Spouse)],
        )
        .unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(
            result[0].deduction_type(),
            DeductionType::CalculatedSpouseDeduction
        );
        assert_eq!(result[0].owner(), DeductionOwner::Spouse);
        assert_eq!(
            result[0].monthly_amount(),
            dec("20000") - dec("176099") / dec("12")
        );
    }

    #[test]
    fn test_spouse_income_below_free_amount_is_dropped() {
        let result = apply(
            strategy(BenefitKind::Retirement, Household::SpouseOver67),
            vec![deduction(DeductionType::PublicPension, "10000", DeductionOwner::Spouse)],
        )
        .unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_spouse_social_assistance_always_counts() {
        let result = apply(
            strategy(BenefitKind::Retirement, Household::SpouseOver67),
            vec![
                deduction(DeductionType::PublicPension, "10000", DeductionOwner::Spouse),
                deduction(DeductionType::SocialAssistance, "2500", DeductionOwner::Spouse),
            ],
        )
        .unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].monthly_amount(), dec("2500"));
    }

    #[test]
    fn test_disabled_refugee_spouse_disregards_ordinary_rate() {
        // Ordinary rate in January 2020 is 18973.02 a month.
        let result = apply(
            strategy(BenefitKind::Disability, Household::SpouseUnder67AndDisabledRefugee),
            vec![
                deduction(DeductionType::ExpectedIncome, "0", DeductionOwner::Applicant),
                deduction(DeductionType::DisabilityPension, "20000", DeductionOwner::Spouse),
            ],
        )
        .unwrap();

        let spouse: Vec<&Deduction> = result.iter().filter(|d| !d.is_applicant()).collect();
        assert_eq!(spouse.len(), 1);
        assert_eq!(spouse[0].monthly_amount(), dec("1026.98"));
    }

    #[test]
    fn test_spouse_under_67_deductions_are_merged() {
        let result = apply(
            strategy(BenefitKind::Retirement, Household::SpouseUnder67),
            vec![
                deduction(DeductionType::PublicPension, "1000", DeductionOwner::Applicant),
                deduction(DeductionType::EmploymentIncome, "3000", DeductionOwner::Spouse),
                deduction(DeductionType::CapitalIncome, "250.5", DeductionOwner::Spouse),
            ],
        )
        .unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(
            result[1].deduction_type(),
            DeductionType::CalculatedSpouseDeduction
        );
        assert_eq!(result[1].monthly_amount(), dec("3250.5"));
    }

    #[test]
    fn test_spouse_free_amount() {
        let rates = rate_table();
        let amount = |household: Household| {
            spouse_free_amount(
                &strategy(BenefitKind::Retirement, household),
                january(),
                &rates,
            )
            .unwrap()
        };

        assert_eq!(amount(Household::Single), Decimal::ZERO);
        assert_eq!(amount(Household::SpouseUnder67), Decimal::ZERO);
        assert_eq!(amount(Household::SpouseOver67), dec("176099") / dec("12"));
        assert_eq!(
            amount(Household::SpouseUnder67AndDisabledRefugee),
            dec("18973.02")
        );
    }

    #[test]
    fn test_periodize_covers_every_month() {
        let period =
            Period::from_months(Month::new(2020, 1).unwrap(), Month::new(2020, 6).unwrap())
                .unwrap();
        let first_quarter =
            Period::from_months(Month::new(2020, 1).unwrap(), Month::new(2020, 3).unwrap())
                .unwrap();
        let deductions = vec![
            Deduction::new(
                DeductionType::CapitalIncome,
                dec("100"),
                first_quarter,
                DeductionOwner::Applicant,
                None,
            )
            .unwrap(),
        ];

        let by_month = periodize_deductions(
            &strategy(BenefitKind::Retirement, Household::Single),
            &deductions,
            period,
            &rate_table(),
        )
        .unwrap();

        assert_eq!(by_month.len(), 6);
        let counts: Vec<usize> = by_month.values().map(Vec::len).collect();
        assert_eq!(counts, vec![1, 1, 1, 0, 0, 0]);
        for (month, deductions) in &by_month {
            assert!(deductions.iter().all(|d| d.period() == month.period()));
        }
    }
}
