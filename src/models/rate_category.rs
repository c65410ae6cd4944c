//! Rate categories.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Selects which rate column of the rate table applies to a household.
///
/// The category is derived from the applicant's living situation: people living
/// alone receive the high rate, people sharing a household receive the ordinary
/// rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateCategory {
    /// Rate for applicants sharing a household with other adults.
    Ordinary,
    /// Rate for applicants living alone.
    High,
}

impl fmt::Display for RateCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateCategory::Ordinary => write!(f, "ordinary"),
            RateCategory::High => write!(f, "high"),
        }
    }
}
