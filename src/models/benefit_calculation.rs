//! The benefit calculation aggregate.
//!
//! A [`BenefitCalculation`] is the persisted, auditable result of calculating a
//! benefit over a period: one [`MonthCalculation`] per month plus metadata and
//! totals. It is built by [`crate::calculation::CalculationFactory`] and never
//! mutated afterwards.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

use super::{Annotation, Deduction, DeductionStrategy, Month, MonthCalculation, Period, RateCategory};

/// The input to a benefit calculation.
///
/// `carry_in` is the effective calculation for the month before `period`, if
/// the benefit was already being paid then.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationRequest {
    /// The period to calculate.
    pub period: Period,
    /// The rate category for the whole period.
    pub rate_category: RateCategory,
    /// Raw deductions, each contained in `period`.
    pub deductions: Vec<Deduction>,
    /// The household deduction rules.
    pub strategy: DeductionStrategy,
    /// The effective calculation for the month before `period`.
    #[serde(default)]
    pub carry_in: Option<MonthCalculation>,
    /// Free-text reason for the calculation.
    #[serde(default)]
    pub justification: Option<String>,
}

/// A complete benefit calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BenefitCalculationFields")]
pub struct BenefitCalculation {
    id: Uuid,
    created_at: DateTime<Utc>,
    period: Period,
    rate_category: RateCategory,
    strategy: DeductionStrategy,
    justification: Option<String>,
    deductions: Vec<Deduction>,
    months: Vec<MonthCalculation>,
    total_benefit: u64,
    total_deduction: Decimal,
}

#[derive(Deserialize)]
struct BenefitCalculationFields {
    id: Uuid,
    created_at: DateTime<Utc>,
    period: Period,
    rate_category: RateCategory,
    strategy: DeductionStrategy,
    #[serde(default)]
    justification: Option<String>,
    deductions: Vec<Deduction>,
    months: Vec<MonthCalculation>,
}

impl TryFrom<BenefitCalculationFields> for BenefitCalculation {
    type Error = EngineError;

    fn try_from(fields: BenefitCalculationFields) -> EngineResult<Self> {
        BenefitCalculation::new(
            fields.id,
            fields.created_at,
            fields.period,
            fields.rate_category,
            fields.strategy,
            fields.justification,
            fields.deductions,
            fields.months,
        )
    }
}

impl BenefitCalculation {
    /// Assembles a calculation, checking that `months` cover `period` exactly
    /// and in order.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: Uuid,
        created_at: DateTime<Utc>,
        period: Period,
        rate_category: RateCategory,
        strategy: DeductionStrategy,
        justification: Option<String>,
        deductions: Vec<Deduction>,
        months: Vec<MonthCalculation>,
    ) -> EngineResult<Self> {
        let expected = period.months();
        let actual: Vec<Month> = months.iter().map(MonthCalculation::month).collect();
        if expected != actual {
            return Err(EngineError::InvalidPeriod {
                from: period.start(),
                to: period.end(),
                message: format!(
                    "expected one calculation per month, got {} calculations for {} months",
                    actual.len(),
                    expected.len()
                ),
            });
        }

        let total_benefit = months.iter().map(MonthCalculation::benefit_amount).sum();
        let total_deduction = months.iter().map(MonthCalculation::total_deduction).sum();

        Ok(Self {
            id,
            created_at,
            period,
            rate_category,
            strategy,
            justification,
            deductions,
            months,
            total_benefit,
            total_deduction,
        })
    }

    /// The calculation identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// When the calculation was made.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The calculated period.
    pub fn period(&self) -> Period {
        self.period
    }

    /// The rate category used for the period.
    pub fn rate_category(&self) -> RateCategory {
        self.rate_category
    }

    /// The household deduction rules used.
    pub fn strategy(&self) -> DeductionStrategy {
        self.strategy
    }

    /// The reason given for the calculation.
    pub fn justification(&self) -> Option<&str> {
        self.justification.as_deref()
    }

    /// The raw deductions the calculation was made from.
    pub fn deductions(&self) -> &[Deduction] {
        &self.deductions
    }

    /// The month calculations in chronological order.
    pub fn months(&self) -> &[MonthCalculation] {
        &self.months
    }

    /// The calculation for `month`, if it lies inside the period.
    pub fn month(&self, month: Month) -> Option<&MonthCalculation> {
        self.months.iter().find(|m| m.month() == month)
    }

    /// The sum of all monthly benefit amounts.
    pub fn total_benefit(&self) -> u64 {
        self.total_benefit
    }

    /// The sum of all monthly total deductions.
    pub fn total_deduction(&self) -> Decimal {
        self.total_deduction
    }

    /// Every month carrying a clamp-cause annotation, with that annotation.
    ///
    /// Reconciliation and base-rate annotations are not included.
    pub fn months_with_clamp_cause(&self) -> Vec<(Month, &Annotation)> {
        self.months
            .iter()
            .filter_map(|m| m.annotations().clamp_cause().map(|a| (m.month(), a)))
            .collect()
    }

    /// Every month where no benefit is paid because of a rejection annotation.
    pub fn months_with_rejection_annotations(&self) -> Vec<(Month, &Annotation)> {
        self.months_with_clamp_cause()
            .into_iter()
            .filter(|(_, annotation)| annotation.is_rejection_cause())
            .collect()
    }

    /// The earliest month with a rejection annotation.
    pub fn first_month_with_rejection_annotation(&self) -> Option<(Month, &Annotation)> {
        self.months_with_rejection_annotations().into_iter().next()
    }

    /// Returns true if every month carries a rejection annotation.
    pub fn all_months_rejected(&self) -> bool {
        self.months.iter().all(|m| {
            m.annotations()
                .clamp_cause()
                .is_some_and(Annotation::is_rejection_cause)
        })
    }

    /// Returns true if both calculations have the same inputs and results,
    /// ignoring identity, creation time, justification and annotations.
    pub fn is_equivalent_to(&self, other: &BenefitCalculation) -> bool {
        self.period == other.period
            && self.rate_category == other.rate_category
            && self.strategy == other.strategy
            && self.deductions == other.deductions
            && self.months.len() == other.months.len()
            && self
                .months
                .iter()
                .zip(&other.months)
                .all(|(a, b)| a.month() == b.month() && a.is_equivalent_to(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BenefitKind, DeductionOwner, DeductionType, Household};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn quarter() -> Period {
        Period::from_months(Month::new(2021, 1).unwrap(), Month::new(2021, 3).unwrap()).unwrap()
    }

    fn month_calculation(month: Month, deduction: &str) -> MonthCalculation {
        let deductions = vec![
            Deduction::for_month(
                DeductionType::EmploymentIncome,
                dec(deduction),
                month,
                DeductionOwner::Applicant,
            )
            .unwrap(),
        ];
        MonthCalculation::new(
            month,
            RateCategory::High,
            101351,
            dec("20000"),
            deductions,
            Decimal::ZERO,
        )
        .unwrap()
    }

    fn calculation(months: Vec<MonthCalculation>) -> EngineResult<BenefitCalculation> {
        BenefitCalculation::new(
            Uuid::new_v4(),
            Utc::now(),
            quarter(),
            RateCategory::High,
            DeductionStrategy::new(BenefitKind::Retirement, Household::Single),
            Some("new application".to_string()),
            Vec::new(),
            months,
        )
    }

    fn three_months(deductions: [&str; 3]) -> Vec<MonthCalculation> {
        quarter()
            .months()
            .into_iter()
            .zip(deductions)
            .map(|(month, amount)| month_calculation(month, amount))
            .collect()
    }

    #[test]
    fn test_totals_are_sums_of_months() {
        let calculation = calculation(three_months(["1000", "2000", "3000.5"])).unwrap();
        assert_eq!(calculation.total_benefit(), 19000 + 18000 + 17000);
        assert_eq!(calculation.total_deduction(), dec("6000.5"));
    }

    #[test]
    fn test_months_must_cover_period() {
        let mut months = three_months(["0", "0", "0"]);
        months.pop();
        assert!(matches!(
            calculation(months),
            Err(EngineError::InvalidPeriod { .. })
        ));
    }

    #[test]
    fn test_rejection_queries() {
        let mut months = three_months(["20000", "0", "20000"]);
        months[0].add_annotation(Annotation::ZeroBenefit).unwrap();
        months[1]
            .add_annotation(Annotation::SocialAssistanceCausesBelowTwoPercent)
            .unwrap();
        months[2]
            .add_annotation(Annotation::BenefitBetweenZeroAndTwoPercentOfHighRate)
            .unwrap();
        let calculation = calculation(months).unwrap();

        assert_eq!(calculation.months_with_clamp_cause().len(), 3);
        assert_eq!(calculation.months_with_rejection_annotations().len(), 2);
        assert_eq!(
            calculation.first_month_with_rejection_annotation(),
            Some((Month::new(2021, 1).unwrap(), &Annotation::ZeroBenefit))
        );
        assert!(!calculation.all_months_rejected());
    }

    #[test]
    fn test_all_months_rejected() {
        let mut months = three_months(["20000", "20000", "20000"]);
        for month in &mut months {
            month.add_annotation(Annotation::ZeroBenefit).unwrap();
        }
        assert!(calculation(months).unwrap().all_months_rejected());
    }

    #[test]
    fn test_equivalence_ignores_identity() {
        let a = calculation(three_months(["100", "200", "300"])).unwrap();
        let b = calculation(three_months(["100", "200", "300"])).unwrap();
        let c = calculation(three_months(["100", "200", "301"])).unwrap();
        assert_ne!(a.id(), b.id());
        assert!(a.is_equivalent_to(&b));
        assert!(!a.is_equivalent_to(&c));
    }

    #[test]
    fn test_serialization_round_trip() {
        let mut months = three_months(["100", "20000", "300"]);
        months[1].add_annotation(Annotation::ZeroBenefit).unwrap();
        let calculation = calculation(months).unwrap();

        let json = serde_json::to_string(&calculation).unwrap();
        let parsed: BenefitCalculation = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, calculation);
        assert_eq!(parsed.total_benefit(), calculation.total_benefit());
    }
}
