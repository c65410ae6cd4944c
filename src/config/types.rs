//! Configuration types for benefit calculation.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files, and the [`RateTable`]
//! snapshot assembled from them.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::RateCategory;

/// Number of months the annual amounts are divided by.
const MONTHS_PER_YEAR: Decimal = Decimal::from_parts(12, 0, 0, false, 0);

/// Metadata about the benefit scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeMetadata {
    /// A short identifier for the scheme.
    pub code: String,
    /// The human-readable name of the scheme.
    pub name: String,
    /// The version of the configuration.
    pub version: String,
    /// URL to the governing legislation.
    pub source_url: String,
}

/// The rate factors applying from an effective date.
///
/// The annual rate for a category is the base unit multiplied by its factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateFactorConfig {
    /// The date the factors take effect.
    pub effective_date: NaiveDate,
    /// Factor for [`RateCategory::Ordinary`].
    pub ordinary: Decimal,
    /// Factor for [`RateCategory::High`].
    pub high: Decimal,
}

impl RateFactorConfig {
    /// Returns the factor for `category`.
    pub fn factor(&self, category: RateCategory) -> Decimal {
        match category {
            RateCategory::Ordinary => self.ordinary,
            RateCategory::High => self.high,
        }
    }
}

/// Scheme configuration file structure (`scheme.yaml`).
#[derive(Debug, Clone, Deserialize)]
pub struct SchemeConfig {
    /// Scheme metadata.
    pub scheme: SchemeMetadata,
    /// Rate factors by effective date.
    pub rate_factors: Vec<RateFactorConfig>,
}

/// The two guarantee pension levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuaranteePensionLevel {
    /// Level for people living with a spouse.
    Ordinary,
    /// Level for people living alone.
    High,
}

/// Annual guarantee pension amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuaranteePension {
    /// The ordinary level.
    pub ordinary: Decimal,
    /// The high level.
    pub high: Decimal,
}

impl GuaranteePension {
    /// Returns the annual amount for `level`.
    pub fn amount(&self, level: GuaranteePensionLevel) -> Decimal {
        match level {
            GuaranteePensionLevel::Ordinary => self.ordinary,
            GuaranteePensionLevel::High => self.high,
        }
    }
}

/// A base unit entry (`base_units/<date>.yaml`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseUnitConfig {
    /// The date the base unit takes effect.
    pub effective_date: NaiveDate,
    /// The annual base unit amount.
    pub base_unit: u32,
    /// Guarantee pension amounts adjusted on the same date, if any.
    #[serde(default)]
    pub guarantee_pension: Option<GuaranteePension>,
}

/// An immutable snapshot of every rate the engine looks up.
///
/// Entries are sorted oldest first. All lookups pick the latest entry whose
/// effective date is on or before the requested date.
///
/// # Example
///
/// ```
/// use benefit_engine::config::{BaseUnitConfig, RateFactorConfig, RateTable, SchemeMetadata};
/// use benefit_engine::models::RateCategory;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let table = RateTable::new(
///     SchemeMetadata {
///         code: "supplementary".to_string(),
///         name: "Supplementary Benefit".to_string(),
///         version: "2020-05-01".to_string(),
///         source_url: "https://example.org".to_string(),
///     },
///     vec![RateFactorConfig {
///         effective_date: NaiveDate::from_ymd_opt(2015, 1, 1).unwrap(),
///         ordinary: Decimal::from_str("2.28").unwrap(),
///         high: Decimal::from_str("2.48").unwrap(),
///     }],
///     vec![BaseUnitConfig {
///         effective_date: NaiveDate::from_ymd_opt(2019, 5, 1).unwrap(),
///         base_unit: 99858,
///         guarantee_pension: None,
///     }],
/// )
/// .unwrap();
///
/// let january = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
/// let rate = table.monthly_rate(RateCategory::High, january).unwrap();
/// assert_eq!(rate, Decimal::from_str("20637.32").unwrap());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateTable {
    metadata: SchemeMetadata,
    factors: Vec<RateFactorConfig>,
    base_units: Vec<BaseUnitConfig>,
}

impl RateTable {
    /// Creates a rate table, sorting the entries and rejecting duplicate dates.
    pub fn new(
        metadata: SchemeMetadata,
        factors: Vec<RateFactorConfig>,
        base_units: Vec<BaseUnitConfig>,
    ) -> EngineResult<Self> {
        let mut factors = factors;
        factors.sort_by(|a, b| a.effective_date.cmp(&b.effective_date));
        reject_duplicates(factors.iter().map(|f| f.effective_date))?;

        let mut base_units = base_units;
        base_units.sort_by(|a, b| a.effective_date.cmp(&b.effective_date));
        reject_duplicates(base_units.iter().map(|b| b.effective_date))?;

        Ok(Self {
            metadata,
            factors,
            base_units,
        })
    }

    /// Returns the scheme metadata.
    pub fn scheme(&self) -> &SchemeMetadata {
        &self.metadata
    }

    /// Returns all base unit entries, oldest first.
    pub fn base_units(&self) -> &[BaseUnitConfig] {
        &self.base_units
    }

    /// Returns all rate factor entries, oldest first.
    pub fn factors(&self) -> &[RateFactorConfig] {
        &self.factors
    }

    /// Finds the base unit entry in effect on `date`.
    ///
    /// Fails with `RateNotFound` (reported for the high category) if `date`
    /// precedes every entry.
    pub fn base_unit_at(&self, date: NaiveDate) -> EngineResult<&BaseUnitConfig> {
        self.base_units
            .iter()
            .rfind(|b| b.effective_date <= date)
            .ok_or(EngineError::RateNotFound {
                category: RateCategory::High,
                date,
            })
    }

    /// Returns the entry immediately before `entry`, if any.
    pub fn previous_base_unit(&self, entry: &BaseUnitConfig) -> Option<&BaseUnitConfig> {
        self.base_units
            .iter()
            .rfind(|b| b.effective_date < entry.effective_date)
    }

    /// Returns the factor for `category` in effect on `date`.
    pub fn factor(&self, category: RateCategory, date: NaiveDate) -> EngineResult<Decimal> {
        self.factors
            .iter()
            .rfind(|f| f.effective_date <= date)
            .map(|f| f.factor(category))
            .ok_or(EngineError::RateNotFound { category, date })
    }

    /// Returns the unrounded monthly rate for `category` on `date`.
    ///
    /// This is `base_unit * factor / 12`.
    pub fn monthly_rate(&self, category: RateCategory, date: NaiveDate) -> EngineResult<Decimal> {
        let base_unit = self.base_unit_at(date).map_err(|_| EngineError::RateNotFound {
            category,
            date,
        })?;
        let factor = self.factor(category, date)?;
        Ok(Decimal::from(base_unit.base_unit) * factor / MONTHS_PER_YEAR)
    }

    /// Returns the monthly guarantee pension for `level` on `date`.
    ///
    /// Uses the latest entry on or before `date` that carries guarantee
    /// pension amounts.
    pub fn guarantee_pension_monthly(
        &self,
        level: GuaranteePensionLevel,
        date: NaiveDate,
    ) -> EngineResult<Decimal> {
        self.base_units
            .iter()
            .filter(|b| b.effective_date <= date)
            .rev()
            .find_map(|b| b.guarantee_pension)
            .map(|g| g.amount(level) / MONTHS_PER_YEAR)
            .ok_or(EngineError::RateNotFound {
                category: match level {
                    GuaranteePensionLevel::Ordinary => RateCategory::Ordinary,
                    GuaranteePensionLevel::High => RateCategory::High,
                },
                date,
            })
    }
}

fn reject_duplicates(dates: impl Iterator<Item = NaiveDate>) -> EngineResult<()> {
    let mut previous: Option<NaiveDate> = None;
    for date in dates {
        if previous == Some(date) {
            return Err(EngineError::DuplicateRateEntry { date });
        }
        previous = Some(date);
    }
    Ok(())
}
