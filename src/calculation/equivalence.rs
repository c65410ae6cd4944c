//! Grouping of equivalent months.
//!
//! Consecutive months that pay out identically are collapsed into a single
//! [`GroupedCalculation`] for presentation and payment orders.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::{
    Deduction, GrantPeriod, Month, MonthCalculation, Period, RateCategory,
};

/// A run of adjacent, equivalent months.
///
/// Every accessor reports the values shared by all months in the run; the
/// period spans the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupedCalculation {
    representative: MonthCalculation,
    period: Period,
}

impl GroupedCalculation {
    fn start(month: &MonthCalculation) -> Self {
        Self {
            representative: month.clone(),
            period: month.month().period(),
        }
    }

    fn extend(&mut self, month: Month) {
        if let Some(period) = Period::span([&self.period, &month.period()]) {
            self.period = period;
        }
    }

    /// The first month of the run.
    pub fn representative(&self) -> &MonthCalculation {
        &self.representative
    }

    /// The period covered by the run.
    pub fn period(&self) -> Period {
        self.period
    }

    /// The months covered by the run.
    pub fn months(&self) -> Vec<Month> {
        self.period.months()
    }

    /// Expands the run back into one `(month, benefit)` pair per month.
    pub fn expand(&self) -> Vec<(Month, u64)> {
        self.months()
            .into_iter()
            .map(|month| (month, self.representative.benefit_amount()))
            .collect()
    }

    /// The monthly benefit shared by every month of the run.
    pub fn benefit_amount(&self) -> u64 {
        self.representative.benefit_amount()
    }

    /// The benefit summed over the run.
    pub fn total_benefit(&self) -> u64 {
        self.representative.benefit_amount() * u64::from(self.period.month_count())
    }

    /// The monthly total deduction.
    pub fn total_deduction(&self) -> Decimal {
        self.representative.total_deduction()
    }

    /// The base unit.
    pub fn base_unit(&self) -> u32 {
        self.representative.base_unit()
    }

    /// The rate category.
    pub fn rate_category(&self) -> RateCategory {
        self.representative.rate_category()
    }

    /// The monthly rate amount.
    pub fn rate_amount(&self) -> Decimal {
        self.representative.rate_amount()
    }

    /// The deductions of the representative month.
    pub fn deductions(&self) -> &[Deduction] {
        self.representative.deductions()
    }

    /// The spouse free amount of the representative month.
    pub fn spouse_free_amount(&self) -> Decimal {
        self.representative.spouse_free_amount()
    }
}

/// Groups adjacent equivalent months.
///
/// Months are sorted chronologically first. Two neighbours share a group when
/// they are calendar-adjacent and [`MonthCalculation::is_equivalent_to`] holds.
pub fn group_equivalent(calculations: &[MonthCalculation]) -> Vec<GroupedCalculation> {
    group_by(calculations, |_, _| true)
}

/// Groups adjacent equivalent months that also share the same grant grade.
///
/// The grant for a month is the most recently created grant covering it.
///
/// # Errors
///
/// Fails with `GrantNotFound` if any month has no covering grant.
pub fn group_equivalent_with_grants(
    calculations: &[MonthCalculation],
    grants: &[GrantPeriod],
) -> EngineResult<Vec<GroupedCalculation>> {
    let grades = calculations
        .iter()
        .map(|calculation| {
            let month = calculation.month();
            GrantPeriod::applicable(grants, month)
                .map(|grant| (month, grant.grade()))
                .ok_or(EngineError::GrantNotFound { month })
        })
        .collect::<EngineResult<BTreeMap<Month, u8>>>()?;

    Ok(group_by(calculations, |previous, next| {
        grades.get(&previous) == grades.get(&next)
    }))
}

fn group_by<F>(calculations: &[MonthCalculation], same_group: F) -> Vec<GroupedCalculation>
where
    F: Fn(Month, Month) -> bool,
{
    let mut sorted: Vec<&MonthCalculation> = calculations.iter().collect();
    sorted.sort_by_key(|c| c.month());

    let mut groups: Vec<GroupedCalculation> = Vec::new();
    let mut previous: Option<&MonthCalculation> = None;

    for calculation in sorted {
        let joins = previous.is_some_and(|previous| {
            previous.month().is_adjacent_to(&calculation.month())
                && previous.is_equivalent_to(calculation)
                && same_group(previous.month(), calculation.month())
        });

        match groups.last_mut() {
            Some(group) if joins => group.extend(calculation.month()),
            _ => groups.push(GroupedCalculation::start(calculation)),
        }
        previous = Some(calculation);
    }

    groups
}
