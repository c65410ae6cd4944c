//! Deduction models.
//!
//! A [`Deduction`] is a monthly amount subtracted from the rate amount, owned by
//! either the applicant or the applicant's spouse. Raw deductions may cover many
//! months; [`Deduction::periodize`] splits them into one deduction per month
//! before they reach the month calculator.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

use super::{Month, Period};

/// The kind of income, asset or reduction a deduction represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeductionType {
    /// Income the applicant is expected to earn.
    ExpectedIncome,
    /// Income from employment.
    EmploymentIncome,
    /// Income from capital.
    CapitalIncome,
    /// Pension from a public scheme.
    PublicPension,
    /// Pension from a private scheme.
    PrivatePension,
    /// Retirement pension.
    RetirementPension,
    /// Disability pension.
    DisabilityPension,
    /// Cash-for-care benefit.
    CashForCareBenefit,
    /// Introduction programme benefit.
    IntroductionBenefit,
    /// Unemployment benefit.
    UnemploymentBenefit,
    /// Maintenance paid under marriage law.
    SpousalMaintenance,
    /// Foster care allowance.
    FosterCareAllowance,
    /// Municipal social assistance.
    SocialAssistance,
    /// Reduction recovering benefit paid during a stay abroad.
    ForeignStayReduction,
    /// Any other counted resource.
    Other,
    /// The spouse's deductions after household rules have been applied.
    CalculatedSpouseDeduction,
    /// Synthesized deduction that cancels a benefit below the payout minimum.
    BelowMinimum,
}

/// Who a deduction belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeductionOwner {
    /// The person applying for the benefit.
    Applicant,
    /// The applicant's spouse or cohabiting partner.
    Spouse,
}

/// Details of an income originally paid in a foreign currency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignIncome {
    /// The yearly amount in the original currency.
    pub amount_in_original_currency: i64,
    /// The ISO currency code.
    pub currency: String,
    /// The exchange rate used to convert the amount.
    pub exchange_rate: Decimal,
}

/// A deduction over a month-aligned period.
///
/// # Example
///
/// ```
/// use benefit_engine::models::{Deduction, DeductionOwner, DeductionType, Month};
/// use rust_decimal::Decimal;
///
/// let january = Month::new(2021, 1).unwrap();
/// let march = Month::new(2021, 3).unwrap();
/// let deduction = Deduction::new(
///     DeductionType::EmploymentIncome,
///     Decimal::from(5000),
///     benefit_engine::models::Period::from_months(january, march).unwrap(),
///     DeductionOwner::Applicant,
///     None,
/// )
/// .unwrap();
///
/// assert_eq!(deduction.periodize().len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Deduction {
    deduction_type: DeductionType,
    monthly_amount: Decimal,
    period: Period,
    owner: DeductionOwner,
    foreign_income: Option<ForeignIncome>,
}

impl Deduction {
    /// Creates a deduction, rejecting negative amounts.
    pub fn new(
        deduction_type: DeductionType,
        monthly_amount: Decimal,
        period: Period,
        owner: DeductionOwner,
        foreign_income: Option<ForeignIncome>,
    ) -> EngineResult<Self> {
        if monthly_amount < Decimal::ZERO {
            return Err(EngineError::InvalidDeduction {
                message: format!(
                    "monthly amount for {:?} must not be negative, got {}",
                    deduction_type, monthly_amount
                ),
            });
        }
        Ok(Self {
            deduction_type,
            monthly_amount,
            period,
            owner,
            foreign_income,
        })
    }

    /// Creates a deduction covering a single month.
    pub fn for_month(
        deduction_type: DeductionType,
        monthly_amount: Decimal,
        month: Month,
        owner: DeductionOwner,
    ) -> EngineResult<Self> {
        Self::new(deduction_type, monthly_amount, month.period(), owner, None)
    }

    /// The kind of deduction.
    pub fn deduction_type(&self) -> DeductionType {
        self.deduction_type
    }

    /// The amount deducted per month.
    pub fn monthly_amount(&self) -> Decimal {
        self.monthly_amount
    }

    /// The covered period.
    pub fn period(&self) -> Period {
        self.period
    }

    /// Who the deduction belongs to.
    pub fn owner(&self) -> DeductionOwner {
        self.owner
    }

    /// Foreign currency details, if the income was paid abroad.
    pub fn foreign_income(&self) -> Option<&ForeignIncome> {
        self.foreign_income.as_ref()
    }

    /// Returns true if the deduction belongs to the applicant.
    pub fn is_applicant(&self) -> bool {
        self.owner == DeductionOwner::Applicant
    }

    /// Splits the deduction into one deduction per covered month.
    pub fn periodize(&self) -> Vec<Deduction> {
        self.period
            .months()
            .into_iter()
            .map(|month| Deduction {
                period: month.period(),
                ..self.clone()
            })
            .collect()
    }

    /// Returns the same deduction moved to `period`.
    pub fn with_period(&self, period: Period) -> Deduction {
        Deduction {
            period,
            ..self.clone()
        }
    }

    /// Returns true if both deductions are equal apart from their periods.
    pub fn is_equivalent_to(&self, other: &Deduction) -> bool {
        self.deduction_type == other.deduction_type
            && self.owner == other.owner
            && self.monthly_amount == other.monthly_amount
            && self.foreign_income == other.foreign_income
    }
}

/// Sums the monthly amounts of `deductions`.
pub fn sum_monthly(deductions: &[Deduction]) -> Decimal {
    deductions.iter().map(|d| d.monthly_amount).sum()
}
