//! Error types for the benefit engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every contract violation and configuration failure the engine reports.

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{Month, Period, RateCategory};

/// The main error type for the benefit engine.
///
/// Calculations either succeed for their whole period or fail with one of
/// these variants; there are no partial results.
///
/// # Example
///
/// ```
/// use benefit_engine::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/scheme.yaml".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/scheme.yaml");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// No base unit entry is effective on the requested date.
    #[error("Rate not found for category '{category}' on date {date}")]
    RateNotFound {
        /// The requested rate category.
        category: RateCategory,
        /// The date for which the rate was requested.
        date: NaiveDate,
    },

    /// Two rate table entries share the same effective date.
    #[error("Duplicate rate table entry effective {date}")]
    DuplicateRateEntry {
        /// The duplicated effective date.
        date: NaiveDate,
    },

    /// A period was not aligned to calendar months or had its ends reversed.
    #[error("Invalid period {from}..={to}: {message}")]
    InvalidPeriod {
        /// The requested start date.
        from: NaiveDate,
        /// The requested end date.
        to: NaiveDate,
        /// What made the period invalid.
        message: String,
    },

    /// A deduction handed to the month calculator belongs to another month.
    #[error("Deduction for {deduction_period} does not belong to month {month}")]
    DeductionOutsideMonth {
        /// The month being calculated.
        month: Month,
        /// The period of the offending deduction.
        deduction_period: Period,
    },

    /// A raw deduction extends beyond the calculation period.
    #[error("Deduction for {deduction_period} is outside the calculation period {period}")]
    DeductionOutsidePeriod {
        /// The calculation period.
        period: Period,
        /// The period of the offending deduction.
        deduction_period: Period,
    },

    /// A deduction value was malformed.
    #[error("Invalid deduction: {message}")]
    InvalidDeduction {
        /// A description of what made the deduction invalid.
        message: String,
    },

    /// A disability calculation month lacked exactly one expected income deduction.
    #[error("Month {month} must contain exactly one expected income deduction for the applicant")]
    MissingExpectedIncome {
        /// The month without a unique expected income.
        month: Month,
    },

    /// The carry-in calculation does not cover the month before the period.
    #[error("Carry-in for {carry_in} must cover the month before {period}")]
    CarryInNotAdjacent {
        /// The month covered by the supplied carry-in.
        carry_in: Month,
        /// The period being calculated.
        period: Period,
    },

    /// A second clamp-cause annotation was added to the same month.
    #[error("Annotation '{attempted}' conflicts with existing '{existing}'")]
    ConflictingAnnotation {
        /// The clamp cause already present.
        existing: String,
        /// The clamp cause that was rejected.
        attempted: String,
    },

    /// A grant record was malformed.
    #[error("Invalid grant: {message}")]
    InvalidGrant {
        /// A description of what made the grant invalid.
        message: String,
    },

    /// No grant covers a month that must be grouped with grants.
    #[error("No grant covers month {month}")]
    GrantNotFound {
        /// The month without a grant.
        month: Month,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
