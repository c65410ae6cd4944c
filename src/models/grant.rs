//! Grant periods.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

use super::{Month, Period};

/// A decision granting the benefit over a period at a given grade.
///
/// Grants are consulted when grouping months for presentation. When several
/// grants cover the same month, the most recently created one applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GrantPeriodFields")]
pub struct GrantPeriod {
    id: Uuid,
    created_at: DateTime<Utc>,
    period: Period,
    grade: u8,
}

#[derive(Deserialize)]
struct GrantPeriodFields {
    id: Uuid,
    created_at: DateTime<Utc>,
    period: Period,
    grade: u8,
}

impl TryFrom<GrantPeriodFields> for GrantPeriod {
    type Error = EngineError;

    fn try_from(fields: GrantPeriodFields) -> EngineResult<Self> {
        GrantPeriod::with_id(fields.id, fields.created_at, fields.period, fields.grade)
    }
}

impl GrantPeriod {
    /// Creates a grant with a fresh identifier, rejecting grades outside 1..=100.
    pub fn new(created_at: DateTime<Utc>, period: Period, grade: u8) -> EngineResult<Self> {
        Self::with_id(Uuid::new_v4(), created_at, period, grade)
    }

    /// Creates a grant with a known identifier.
    pub fn with_id(
        id: Uuid,
        created_at: DateTime<Utc>,
        period: Period,
        grade: u8,
    ) -> EngineResult<Self> {
        if !(1..=100).contains(&grade) {
            return Err(EngineError::InvalidGrant {
                message: format!("grade must be between 1 and 100, got {}", grade),
            });
        }
        Ok(Self {
            id,
            created_at,
            period,
            grade,
        })
    }

    /// The grant identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// When the grant was made.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The granted period.
    pub fn period(&self) -> Period {
        self.period
    }

    /// The granted grade in percent.
    pub fn grade(&self) -> u8 {
        self.grade
    }

    /// Finds the most recently created grant covering `month`.
    pub fn applicable<'a>(grants: &'a [GrantPeriod], month: Month) -> Option<&'a GrantPeriod> {
        grants
            .iter()
            .filter(|grant| grant.period.contains(&month.period()))
            .max_by_key(|grant| grant.created_at)
    }
}
