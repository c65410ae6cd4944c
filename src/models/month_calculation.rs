//! The result of calculating a single month.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

use super::{
    Annotation, Annotations, CalculationSnapshot, Deduction, Month, RateCategory, sum_monthly,
};

/// The benefit calculated for one calendar month.
///
/// The total deduction and the benefit amount are derived from the rate amount
/// and the deductions when the value is constructed and cannot be set directly:
///
/// - `total_deduction` is the sum of the monthly deduction amounts, capped at
///   `rate_amount`
/// - `benefit_amount` is `rate_amount - total_deduction`, rounded half away
///   from zero to whole currency units and floored at zero
///
/// # Example
///
/// ```
/// use benefit_engine::models::{Month, MonthCalculation, RateCategory};
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let calculation = MonthCalculation::new(
///     Month::new(2020, 1).unwrap(),
///     RateCategory::High,
///     99858,
///     Decimal::from_str("20637.32").unwrap(),
///     vec![],
///     Decimal::ZERO,
/// )
/// .unwrap();
///
/// assert_eq!(calculation.benefit_amount(), 20637);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MonthCalculationFields")]
pub struct MonthCalculation {
    month: Month,
    rate_category: RateCategory,
    base_unit: u32,
    rate_amount: Decimal,
    deductions: Vec<Deduction>,
    total_deduction: Decimal,
    benefit_amount: u64,
    spouse_free_amount: Decimal,
    annotations: Annotations,
}

/// Persisted fields; derived amounts are recomputed on load.
#[derive(Deserialize)]
struct MonthCalculationFields {
    month: Month,
    rate_category: RateCategory,
    base_unit: u32,
    rate_amount: Decimal,
    deductions: Vec<Deduction>,
    spouse_free_amount: Decimal,
    #[serde(default)]
    annotations: Annotations,
}

impl TryFrom<MonthCalculationFields> for MonthCalculation {
    type Error = EngineError;

    fn try_from(fields: MonthCalculationFields) -> EngineResult<Self> {
        let mut calculation = MonthCalculation::new(
            fields.month,
            fields.rate_category,
            fields.base_unit,
            fields.rate_amount,
            fields.deductions,
            fields.spouse_free_amount,
        )?;
        calculation.annotations = fields.annotations;
        Ok(calculation)
    }
}

impl MonthCalculation {
    /// Creates a month calculation, deriving the total deduction and benefit amount.
    ///
    /// Fails with [`EngineError::DeductionOutsideMonth`] if any deduction does
    /// not cover exactly `month`.
    pub fn new(
        month: Month,
        rate_category: RateCategory,
        base_unit: u32,
        rate_amount: Decimal,
        deductions: Vec<Deduction>,
        spouse_free_amount: Decimal,
    ) -> EngineResult<Self> {
        if let Some(outside) = deductions.iter().find(|d| d.period() != month.period()) {
            return Err(EngineError::DeductionOutsideMonth {
                month,
                deduction_period: outside.period(),
            });
        }

        let total_deduction = sum_monthly(&deductions).min(rate_amount);
        let benefit_amount = (rate_amount - total_deduction)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .max(Decimal::ZERO)
            .to_u64()
            .ok_or_else(|| EngineError::InvalidDeduction {
                message: format!(
                    "benefit for {} does not fit a whole currency amount: {} - {}",
                    month, rate_amount, total_deduction
                ),
            })?;

        Ok(Self {
            month,
            rate_category,
            base_unit,
            rate_amount,
            deductions,
            total_deduction,
            benefit_amount,
            spouse_free_amount,
            annotations: Annotations::new(),
        })
    }

    /// The calculated month.
    pub fn month(&self) -> Month {
        self.month
    }

    /// The rate category used.
    pub fn rate_category(&self) -> RateCategory {
        self.rate_category
    }

    /// The annual base unit in effect for the month.
    pub fn base_unit(&self) -> u32 {
        self.base_unit
    }

    /// The monthly rate amount before deductions.
    pub fn rate_amount(&self) -> Decimal {
        self.rate_amount
    }

    /// The deductions applied in the month.
    pub fn deductions(&self) -> &[Deduction] {
        &self.deductions
    }

    /// The sum of all deductions, capped at the rate amount.
    pub fn total_deduction(&self) -> Decimal {
        self.total_deduction
    }

    /// The benefit paid for the month in whole currency units.
    pub fn benefit_amount(&self) -> u64 {
        self.benefit_amount
    }

    /// The amount of spouse deductions disregarded by household rules.
    pub fn spouse_free_amount(&self) -> Decimal {
        self.spouse_free_amount
    }

    /// The annotations recorded for the month.
    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    /// Records an annotation, rejecting a second clamp cause.
    pub fn add_annotation(&mut self, annotation: Annotation) -> EngineResult<()> {
        self.annotations.add(annotation)
    }

    /// Captures the calculation without its annotations.
    pub fn snapshot(&self) -> CalculationSnapshot {
        CalculationSnapshot {
            month: self.month,
            rate_category: self.rate_category,
            base_unit: self.base_unit,
            rate_amount: self.rate_amount,
            benefit_amount: self.benefit_amount,
            deductions: self.deductions.clone(),
            spouse_free_amount: self.spouse_free_amount,
        }
    }

    /// Returns true if both months would pay out identically.
    ///
    /// Compares benefit, total deduction, base unit, rate category, rate amount
    /// and the deductions as an unordered collection ignoring their periods.
    /// The month itself and the annotations are not compared.
    pub fn is_equivalent_to(&self, other: &MonthCalculation) -> bool {
        self.benefit_amount == other.benefit_amount
            && self.total_deduction == other.total_deduction
            && self.base_unit == other.base_unit
            && self.rate_category == other.rate_category
            && self.rate_amount == other.rate_amount
            && same_deductions(&self.deductions, &other.deductions)
    }
}

fn same_deductions(left: &[Deduction], right: &[Deduction]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let mut matched = vec![false; right.len()];
    left.iter().all(|deduction| {
        let candidate = right
            .iter()
            .enumerate()
            .position(|(i, other)| !matched[i] && deduction.is_equivalent_to(other));
        match candidate {
            Some(i) => {
                matched[i] = true;
                true
            }
            None => false,
        }
    })
}
