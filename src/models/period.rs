//! Month-aligned periods.
//!
//! This module contains the [`Period`] and [`Month`] value types. Every period the
//! engine works with starts on the first day of a month and ends on the last day
//! of a month; a [`Month`] is a period covering exactly one calendar month.

use std::fmt;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// A closed date range aligned to calendar-month boundaries.
///
/// # Example
///
/// ```
/// use benefit_engine::models::Period;
/// use chrono::NaiveDate;
///
/// let period = Period::new(
///     NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2021, 3, 31).unwrap(),
/// )
/// .unwrap();
///
/// assert_eq!(period.month_count(), 3);
/// assert_eq!(period.months().len(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "PeriodFields")]
pub struct Period {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Deserialize)]
struct PeriodFields {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<PeriodFields> for Period {
    type Error = EngineError;

    fn try_from(fields: PeriodFields) -> EngineResult<Self> {
        Period::new(fields.start, fields.end)
    }
}

fn last_day_of_month(date: NaiveDate) -> Option<NaiveDate> {
    first_day_of_month(date)
        .checked_add_months(Months::new(1))
        .and_then(|d| d.pred_opt())
}

fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn shift_months(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    if months >= 0 {
        date.checked_add_months(Months::new(months.unsigned_abs()))
    } else {
        date.checked_sub_months(Months::new(months.unsigned_abs()))
    }
}

impl Period {
    /// Creates a period, rejecting ranges that are not month aligned.
    pub fn new(start: NaiveDate, end: NaiveDate) -> EngineResult<Self> {
        let invalid = |message: &str| EngineError::InvalidPeriod {
            from: start,
            to: end,
            message: message.to_string(),
        };

        if start.day() != 1 {
            return Err(invalid("must start on the first day of a month"));
        }
        if last_day_of_month(end) != Some(end) {
            return Err(invalid("must end on the last day of a month"));
        }
        if start > end {
            return Err(invalid("start must not be after end"));
        }
        Ok(Self { start, end })
    }

    /// Creates the period spanning `from_month` through `to_month` inclusive.
    pub fn from_months(from_month: Month, to_month: Month) -> EngineResult<Self> {
        Self::new(from_month.start(), to_month.end())
    }

    /// The first day of the period.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// The last day of the period.
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// The number of calendar months covered.
    pub fn month_count(&self) -> u32 {
        let years = self.end.year() - self.start.year();
        let months = years * 12 + self.end.month() as i32 - self.start.month() as i32 + 1;
        months.unsigned_abs()
    }

    /// Decomposes the period into its months, in chronological order.
    pub fn months(&self) -> Vec<Month> {
        (0..self.month_count())
            .filter_map(|offset| {
                let start = self.start.checked_add_months(Months::new(offset))?;
                let end = last_day_of_month(start)?;
                Some(Month(Period { start, end }))
            })
            .collect()
    }

    /// Returns true if `date` falls inside the period (inclusive).
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Returns true if `other` lies completely inside this period.
    pub fn contains(&self, other: &Period) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Returns true if the two periods touch without overlapping, in either order.
    pub fn is_adjacent_to(&self, other: &Period) -> bool {
        self.end.succ_opt() == Some(other.start) || other.end.succ_opt() == Some(self.start)
    }

    /// Returns the period moved by `months` calendar months (negative moves backwards).
    pub fn shifted(&self, months: i32) -> EngineResult<Period> {
        let start = shift_months(self.start, months);
        let end = shift_months(first_day_of_month(self.end), months).and_then(last_day_of_month);
        match (start, end) {
            (Some(start), Some(end)) => Period::new(start, end),
            _ => Err(EngineError::InvalidPeriod {
                from: self.start,
                to: self.end,
                message: format!("cannot shift by {} months", months),
            }),
        }
    }

    /// The month immediately before the period starts.
    pub fn month_before(&self) -> EngineResult<Month> {
        Month::containing(self.start)?.previous()
    }

    /// The smallest period covering every period in `periods`.
    pub fn span<'a>(periods: impl IntoIterator<Item = &'a Period>) -> Option<Period> {
        periods.into_iter().fold(None, |acc: Option<Period>, p| {
            Some(match acc {
                None => *p,
                Some(acc) => Period {
                    start: acc.start.min(p.start),
                    end: acc.end.max(p.end),
                },
            })
        })
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// A period covering exactly one calendar month.
///
/// # Example
///
/// ```
/// use benefit_engine::models::Month;
///
/// let january = Month::new(2021, 1).unwrap();
/// assert_eq!(january.next().unwrap(), Month::new(2021, 2).unwrap());
/// assert_eq!(january.to_string(), "2021-01");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Period", into = "Period")]
pub struct Month(Period);

impl Month {
    /// Creates the month `month` (1-12) of `year`.
    pub fn new(year: i32, month: u32) -> EngineResult<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
            EngineError::InvalidPeriod {
                from: NaiveDate::MIN,
                to: NaiveDate::MIN,
                message: format!("{}-{:02} is not a calendar month", year, month),
            }
        })?;
        Self::containing(start)
    }

    /// The month that contains `date`.
    pub fn containing(date: NaiveDate) -> EngineResult<Self> {
        let start = first_day_of_month(date);
        let end = last_day_of_month(start).ok_or_else(|| EngineError::InvalidPeriod {
            from: start,
            to: start,
            message: "month end is out of range".to_string(),
        })?;
        Ok(Month(Period { start, end }))
    }

    /// The month as a plain period.
    pub fn period(&self) -> Period {
        self.0
    }

    /// The first day of the month.
    pub fn start(&self) -> NaiveDate {
        self.0.start
    }

    /// The last day of the month.
    pub fn end(&self) -> NaiveDate {
        self.0.end
    }

    /// The month moved by `months` calendar months.
    pub fn shifted(&self, months: i32) -> EngineResult<Month> {
        self.0.shifted(months).map(Month)
    }

    /// The following month.
    pub fn next(&self) -> EngineResult<Month> {
        self.shifted(1)
    }

    /// The preceding month.
    pub fn previous(&self) -> EngineResult<Month> {
        self.shifted(-1)
    }

    /// Returns true if `other` is the month directly before or after this one.
    pub fn is_adjacent_to(&self, other: &Month) -> bool {
        self.0.is_adjacent_to(&other.0)
    }
}

impl TryFrom<Period> for Month {
    type Error = EngineError;

    fn try_from(period: Period) -> EngineResult<Self> {
        if period.month_count() != 1 {
            return Err(EngineError::InvalidPeriod {
                from: period.start,
                to: period.end,
                message: "a month must cover exactly one calendar month".to_string(),
            });
        }
        Ok(Month(period))
    }
}

impl From<Month> for Period {
    fn from(month: Month) -> Self {
        month.0
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.start.format("%Y-%m"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn year(y: i32) -> Period {
        Period::new(date(y, 1, 1), date(y, 12, 31)).unwrap()
    }

    #[test]
    fn test_new_rejects_start_not_first_of_month() {
        let result = Period::new(date(2021, 1, 2), date(2021, 1, 31));
        assert!(matches!(result, Err(EngineError::InvalidPeriod { .. })));
    }

    #[test]
    fn test_new_rejects_end_not_last_of_month() {
        let result = Period::new(date(2021, 1, 1), date(2021, 2, 27));
        assert!(matches!(result, Err(EngineError::InvalidPeriod { .. })));
    }

    #[test]
    fn test_new_accepts_leap_day_end() {
        assert!(Period::new(date(2020, 2, 1), date(2020, 2, 29)).is_ok());
    }

    #[test]
    fn test_new_rejects_reversed_period() {
        let result = Period::new(date(2021, 3, 1), date(2021, 1, 31));
        assert!(matches!(result, Err(EngineError::InvalidPeriod { .. })));
    }

    #[test]
    fn test_month_count_across_year_boundary() {
        let period = Period::new(date(2020, 11, 1), date(2021, 2, 28)).unwrap();
        assert_eq!(period.month_count(), 4);
    }

    #[test]
    fn test_months_decomposes_in_order() {
        let months = year(2020).months();
        assert_eq!(months.len(), 12);
        assert_eq!(months[0], Month::new(2020, 1).unwrap());
        assert_eq!(months[1].end(), date(2020, 2, 29));
        assert_eq!(months[11], Month::new(2020, 12).unwrap());
    }

    #[test]
    fn test_adjacency_in_both_directions() {
        let january = Month::new(2021, 1).unwrap();
        let february = Month::new(2021, 2).unwrap();
        let march = Month::new(2021, 3).unwrap();

        assert!(january.is_adjacent_to(&february));
        assert!(february.is_adjacent_to(&january));
        assert!(!january.is_adjacent_to(&march));
        assert!(!january.is_adjacent_to(&january));
    }

    #[test]
    fn test_contains() {
        let period = year(2021);
        assert!(period.contains(&Month::new(2021, 6).unwrap().period()));
        assert!(!period.contains(&Month::new(2022, 1).unwrap().period()));
        assert!(period.contains_date(date(2021, 12, 31)));
    }

    #[test]
    fn test_shifted_keeps_month_alignment() {
        let january = Month::new(2021, 1).unwrap();
        let february = january.next().unwrap();
        assert_eq!(february.end(), date(2021, 2, 28));

        let period = Period::new(date(2021, 1, 1), date(2021, 2, 28)).unwrap();
        let shifted = period.shifted(1).unwrap();
        assert_eq!(shifted.start(), date(2021, 2, 1));
        assert_eq!(shifted.end(), date(2021, 3, 31));

        let back = period.shifted(-2).unwrap();
        assert_eq!(back.start(), date(2020, 11, 1));
        assert_eq!(back.end(), date(2020, 12, 31));
    }

    #[test]
    fn test_month_before() {
        assert_eq!(
            year(2020).month_before().unwrap(),
            Month::new(2019, 12).unwrap()
        );
    }

    #[test]
    fn test_next_and_previous_cross_year_boundary() {
        let january = Month::new(2021, 1).unwrap();
        let december = Month::new(2020, 12).unwrap();

        assert_eq!(january.previous().unwrap(), december);
        assert_eq!(december.next().unwrap(), january);
        assert_eq!(january.previous().unwrap().end(), date(2020, 12, 31));
    }

    #[test]
    fn test_span() {
        let periods = [
            Month::new(2021, 3).unwrap().period(),
            Month::new(2021, 1).unwrap().period(),
            Month::new(2021, 2).unwrap().period(),
        ];
        let span = Period::span(periods.iter()).unwrap();
        assert_eq!(span.start(), date(2021, 1, 1));
        assert_eq!(span.end(), date(2021, 3, 31));
        assert!(Period::span(std::iter::empty()).is_none());
    }

    #[test]
    fn test_month_try_from_multi_month_period_fails() {
        assert!(Month::try_from(year(2021)).is_err());
    }

    #[test]
    fn test_serialize_period() {
        let json = serde_json::to_string(&year(2021)).unwrap();
        assert_eq!(json, r#"{"start":"2021-01-01","end":"2021-12-31"}"#);
    }

    #[test]
    fn test_deserialize_rejects_unaligned_period() {
        let json = r#"{"start":"2021-01-15","end":"2021-12-31"}"#;
        assert!(serde_json::from_str::<Period>(json).is_err());
    }

    #[test]
    fn test_month_round_trips_through_json() {
        let month = Month::new(2021, 5).unwrap();
        let json = serde_json::to_string(&month).unwrap();
        let parsed: Month = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, month);
    }
}
