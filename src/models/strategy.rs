//! Household deduction strategies.

use serde::{Deserialize, Serialize};

/// The benefit variant being calculated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenefitKind {
    /// Supplementary benefit for people receiving a disability benefit.
    Disability,
    /// Supplementary benefit for people over retirement age.
    Retirement,
}

/// The applicant's household situation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Household {
    /// Lives alone or with adults who are not a spouse.
    Single,
    /// Lives with a spouse aged 67 or older.
    SpouseOver67,
    /// Lives with a spouse under 67 who is a disabled refugee.
    SpouseUnder67AndDisabledRefugee,
    /// Lives with a spouse under 67.
    SpouseUnder67,
}

/// The rules deciding which deductions count in each month.
///
/// # Example
///
/// ```
/// use benefit_engine::models::{BenefitKind, DeductionStrategy, Household};
///
/// let strategy = DeductionStrategy::new(BenefitKind::Disability, Household::Single);
/// assert!(strategy.requires_expected_income());
/// assert!(!strategy.has_spouse());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeductionStrategy {
    /// The benefit variant.
    pub benefit_kind: BenefitKind,
    /// The household situation.
    pub household: Household,
}

impl DeductionStrategy {
    /// Creates a strategy.
    pub fn new(benefit_kind: BenefitKind, household: Household) -> Self {
        Self {
            benefit_kind,
            household,
        }
    }

    /// Disability calculations need exactly one expected income per month.
    pub fn requires_expected_income(&self) -> bool {
        self.benefit_kind == BenefitKind::Disability
    }

    /// Returns true if spouse deductions may count.
    pub fn has_spouse(&self) -> bool {
        self.household != Household::Single
    }
}
