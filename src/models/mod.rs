//! Core data models for the benefit engine.
//!
//! This module contains all the domain models used throughout the engine.

mod annotation;
mod benefit_calculation;
mod deduction;
mod grant;
mod month_calculation;
mod period;
mod rate_category;
mod strategy;

pub use annotation::{Annotation, Annotations, BaseUnitDetail, CalculationSnapshot};
pub use benefit_calculation::{BenefitCalculation, CalculationRequest};
pub use deduction::{Deduction, DeductionOwner, DeductionType, ForeignIncome, sum_monthly};
pub use grant::GrantPeriod;
pub use month_calculation::MonthCalculation;
pub use period::{Month, Period};
pub use rate_category::RateCategory;
pub use strategy::{BenefitKind, DeductionStrategy, Household};
