//! Calculation logic for the supplementary benefit engine.
//!
//! This module contains the single-month calculator, the payout minimum,
//! household deduction rules, effective-date reconciliation across a period,
//! grouping of equivalent months and the factory that assembles a complete
//! [`crate::models::BenefitCalculation`].

mod deduction_strategy;
mod effective_date;
mod equivalence;
mod factory;
mod minimum_threshold;
mod month_calculator;

pub use deduction_strategy::{deductions_for_month, periodize_deductions, spouse_free_amount};
pub use effective_date::{
    BenefitChange, CHANGE_THRESHOLD_PERCENT, classify_change, percent_change, reconcile,
    shift_forward,
};
pub use equivalence::{GroupedCalculation, group_equivalent, group_equivalent_with_grants};
pub use factory::CalculationFactory;
pub use minimum_threshold::{
    MINIMUM_PAYOUT_FRACTION, apply_minimum_threshold, minimum_payout_threshold,
};
pub use month_calculator::calculate_month;
