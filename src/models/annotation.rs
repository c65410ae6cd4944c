//! Annotations explaining calculation decisions.
//!
//! Every month calculation carries a list of [`Annotation`]s recording why the
//! emitted amount was chosen. Annotations are part of the auditable record and
//! are persisted together with the calculation.
//!
//! The clamp-cause annotations ([`Annotation::is_clamp_cause`]) explain why a
//! month ended up at or near zero. At most one of them may be present on a
//! month; [`Annotations::add`] is the only way to extend a list and rejects a
//! second one, including when a list is deserialized.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

use super::{Deduction, Month, RateCategory};

/// A month calculation as it looked when a decision was made, without annotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationSnapshot {
    /// The calculated month.
    pub month: Month,
    /// The rate category used.
    pub rate_category: RateCategory,
    /// The base unit in effect for the month.
    pub base_unit: u32,
    /// The monthly rate amount before deductions.
    pub rate_amount: Decimal,
    /// The resulting benefit amount.
    pub benefit_amount: u64,
    /// The deductions applied in the month.
    pub deductions: Vec<Deduction>,
    /// The spouse free amount for the month.
    pub spouse_free_amount: Decimal,
}

/// A base unit together with the date it took effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseUnitDetail {
    /// The effective date of the base unit.
    pub date: NaiveDate,
    /// The annual base unit amount.
    pub base_unit: u32,
}

/// A single audit annotation on a month calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Annotation {
    /// First month of a calculation without a preceding effective amount.
    NewBenefit {
        /// The adopted calculation.
        adopted: CalculationSnapshot,
    },
    /// The benefit rose by 10% or more and took effect immediately.
    IncreasedBenefit {
        /// The adopted calculation.
        adopted: CalculationSnapshot,
        /// The previous effective calculation moved to this month.
        rejected: CalculationSnapshot,
    },
    /// The benefit fell by 10% or more; the decrease takes effect next month.
    DecreasedBenefit {
        /// The previous effective calculation moved to this month.
        adopted: CalculationSnapshot,
        /// The calculation that was deferred.
        rejected: CalculationSnapshot,
    },
    /// The change was below 10% so the previous effective calculation was kept.
    ChangeBelowTenPercent {
        /// The previous effective calculation moved to this month.
        adopted: CalculationSnapshot,
        /// The calculation that was suppressed.
        rejected: CalculationSnapshot,
    },
    /// The base unit changed at the start of this month.
    BaseRateChanged {
        /// The base unit before the change.
        previous: BaseUnitDetail,
        /// The base unit from this month.
        new: BaseUnitDetail,
    },
    /// Deductions consumed the whole rate amount.
    ZeroBenefit,
    /// The benefit was below the payout minimum and was cancelled.
    BenefitBetweenZeroAndTwoPercentOfHighRate,
    /// The benefit is below the payout minimum only because of social assistance.
    SocialAssistanceCausesBelowTwoPercent,
    /// The benefit is below the payout minimum only because of a foreign-stay reduction.
    ForeignStayReductionCausesBelowTwoPercent,
}

impl Annotation {
    /// Returns true for the mutually exclusive annotations explaining a low amount.
    pub fn is_clamp_cause(&self) -> bool {
        matches!(
            self,
            Annotation::ZeroBenefit
                | Annotation::BenefitBetweenZeroAndTwoPercentOfHighRate
                | Annotation::SocialAssistanceCausesBelowTwoPercent
                | Annotation::ForeignStayReductionCausesBelowTwoPercent
        )
    }

    /// Returns true for clamp causes that mean no benefit is paid for the month.
    pub fn is_rejection_cause(&self) -> bool {
        matches!(
            self,
            Annotation::ZeroBenefit | Annotation::BenefitBetweenZeroAndTwoPercentOfHighRate
        )
    }

    /// A stable identifier for the annotation kind.
    pub fn name(&self) -> &'static str {
        match self {
            Annotation::NewBenefit { .. } => "new_benefit",
            Annotation::IncreasedBenefit { .. } => "increased_benefit",
            Annotation::DecreasedBenefit { .. } => "decreased_benefit",
            Annotation::ChangeBelowTenPercent { .. } => "change_below_ten_percent",
            Annotation::BaseRateChanged { .. } => "base_rate_changed",
            Annotation::ZeroBenefit => "zero_benefit",
            Annotation::BenefitBetweenZeroAndTwoPercentOfHighRate => {
                "benefit_between_zero_and_two_percent_of_high_rate"
            }
            Annotation::SocialAssistanceCausesBelowTwoPercent => {
                "social_assistance_causes_below_two_percent"
            }
            Annotation::ForeignStayReductionCausesBelowTwoPercent => {
                "foreign_stay_reduction_causes_below_two_percent"
            }
        }
    }
}

/// An ordered annotation list holding at most one clamp cause.
///
/// # Example
///
/// ```
/// use benefit_engine::models::{Annotation, Annotations};
///
/// let mut annotations = Annotations::new();
/// annotations.add(Annotation::ZeroBenefit).unwrap();
/// assert!(annotations.add(Annotation::SocialAssistanceCausesBelowTwoPercent).is_err());
/// assert_eq!(annotations.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Annotation>", into = "Vec<Annotation>")]
pub struct Annotations(Vec<Annotation>);

impl Annotations {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends `annotation`, rejecting a second clamp cause.
    pub fn add(&mut self, annotation: Annotation) -> EngineResult<()> {
        if annotation.is_clamp_cause() {
            if let Some(existing) = self.clamp_cause() {
                return Err(EngineError::ConflictingAnnotation {
                    existing: existing.name().to_string(),
                    attempted: annotation.name().to_string(),
                });
            }
        }
        self.0.push(annotation);
        Ok(())
    }

    /// The clamp cause, if one has been recorded.
    pub fn clamp_cause(&self) -> Option<&Annotation> {
        self.0.iter().find(|a| a.is_clamp_cause())
    }

    /// Iterates over the annotations in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Annotation> {
        self.0.iter()
    }

    /// The number of annotations.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no annotations.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the annotations as a slice.
    pub fn as_slice(&self) -> &[Annotation] {
        &self.0
    }
}

impl TryFrom<Vec<Annotation>> for Annotations {
    type Error = EngineError;

    fn try_from(annotations: Vec<Annotation>) -> EngineResult<Self> {
        let mut list = Annotations::new();
        for annotation in annotations {
            list.add(annotation)?;
        }
        Ok(list)
    }
}

impl From<Annotations> for Vec<Annotation> {
    fn from(annotations: Annotations) -> Self {
        annotations.0
    }
}

impl<'a> IntoIterator for &'a Annotations {
    type Item = &'a Annotation;
    type IntoIter = std::slice::Iter<'a, Annotation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_rate_changed() -> Annotation {
        Annotation::BaseRateChanged {
            previous: BaseUnitDetail {
                date: NaiveDate::from_ymd_opt(2020, 5, 1).unwrap(),
                base_unit: 101351,
            },
            new: BaseUnitDetail {
                date: NaiveDate::from_ymd_opt(2021, 5, 1).unwrap(),
                base_unit: 106399,
            },
        }
    }

    #[test]
    fn test_clamp_causes_are_mutually_exclusive() {
        let clamp_causes = [
            Annotation::ZeroBenefit,
            Annotation::BenefitBetweenZeroAndTwoPercentOfHighRate,
            Annotation::SocialAssistanceCausesBelowTwoPercent,
            Annotation::ForeignStayReductionCausesBelowTwoPercent,
        ];

        for first in &clamp_causes {
            for second in &clamp_causes {
                let mut annotations = Annotations::new();
                annotations.add(first.clone()).unwrap();
                let result = annotations.add(second.clone());
                assert!(
                    matches!(result, Err(EngineError::ConflictingAnnotation { .. })),
                    "{} followed by {} should conflict",
                    first.name(),
                    second.name()
                );
            }
        }
    }

    #[test]
    fn test_non_clamp_annotations_can_accompany_a_clamp_cause() {
        let mut annotations = Annotations::new();
        annotations.add(base_rate_changed()).unwrap();
        annotations.add(Annotation::ZeroBenefit).unwrap();
        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations.clamp_cause(), Some(&Annotation::ZeroBenefit));
    }

    #[test]
    fn test_rejection_causes() {
        assert!(Annotation::ZeroBenefit.is_rejection_cause());
        assert!(Annotation::BenefitBetweenZeroAndTwoPercentOfHighRate.is_rejection_cause());
        assert!(!Annotation::SocialAssistanceCausesBelowTwoPercent.is_rejection_cause());
        assert!(!base_rate_changed().is_rejection_cause());
    }

    #[test]
    fn test_serialization_is_tagged() {
        let json = serde_json::to_value(Annotation::ZeroBenefit).unwrap();
        assert_eq!(json["type"], "zero_benefit");

        let json = serde_json::to_value(base_rate_changed()).unwrap();
        assert_eq!(json["type"], "base_rate_changed");
        assert_eq!(json["new"]["base_unit"], 106399);
    }

    #[test]
    fn test_deserialize_rejects_two_clamp_causes() {
        let json = r#"[{"type":"zero_benefit"},{"type":"social_assistance_causes_below_two_percent"}]"#;
        assert!(serde_json::from_str::<Annotations>(json).is_err());
    }

    #[test]
    fn test_annotations_round_trip() {
        let mut annotations = Annotations::new();
        annotations.add(base_rate_changed()).unwrap();
        annotations
            .add(Annotation::SocialAssistanceCausesBelowTwoPercent)
            .unwrap();

        let json = serde_json::to_string(&annotations).unwrap();
        let parsed: Annotations = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, annotations);
    }
}
