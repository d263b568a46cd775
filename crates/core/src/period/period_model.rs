//! Monthly budget period.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::constants::WIRE_DATE_FORMAT;
use crate::errors::{Error, Result, ValidationError};

/// A calendar month, identified by its first day.
///
/// Always built from calendar components, never from a timestamp, so the
/// `YYYY-MM-01` key cannot drift across timezones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BudgetPeriod {
    start: NaiveDate,
    next_start: NaiveDate,
}

impl BudgetPeriod {
    /// Creates the period for `month` (1-12) of `year`.
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Month must be between 1 and 12, got {}",
                month
            ))));
        }
        let (next_year, next_month) = if month == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        };
        let start = NaiveDate::from_ymd_opt(year, month, 1);
        let next_start = NaiveDate::from_ymd_opt(next_year, next_month, 1);
        match (start, next_start) {
            (Some(start), Some(next_start)) => Ok(Self { start, next_start }),
            _ => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Year {} is out of range",
                year
            )))),
        }
    }

    /// The period containing `date`.
    pub fn from_date(date: NaiveDate) -> Result<Self> {
        Self::new(date.year(), date.month())
    }

    /// Parses `YYYY-MM` or a full `YYYY-MM-DD` date.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, WIRE_DATE_FORMAT) {
            return Self::from_date(date);
        }
        let (year, month) = trimmed.split_once('-').ok_or_else(|| {
            Error::Validation(ValidationError::InvalidInput(format!(
                "Expected YYYY-MM, got '{}'",
                input
            )))
        })?;
        let year: i32 = year.parse().map_err(|_| {
            Error::Validation(ValidationError::InvalidInput(format!(
                "Invalid year in '{}'",
                input
            )))
        })?;
        let month: u32 = month.parse().map_err(|_| {
            Error::Validation(ValidationError::InvalidInput(format!(
                "Invalid month in '{}'",
                input
            )))
        })?;
        Self::new(year, month)
    }

    pub fn year(&self) -> i32 {
        self.start.year()
    }

    pub fn month(&self) -> u32 {
        self.start.month()
    }

    /// First day of the period.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// First day of the following period (exclusive upper bound).
    pub fn next_start(&self) -> NaiveDate {
        self.next_start
    }

    /// Canonical `YYYY-MM-01` string written to and filtered on in the store.
    pub fn start_key(&self) -> String {
        self.start.format(WIRE_DATE_FORMAT).to_string()
    }

    /// Wire form of the exclusive upper bound.
    pub fn next_start_key(&self) -> String {
        self.next_start.format(WIRE_DATE_FORMAT).to_string()
    }

    /// Whether `date` falls inside `[start, next_start)`.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.next_start
    }

    pub fn next(&self) -> Result<Self> {
        Self::from_date(self.next_start)
    }

    pub fn previous(&self) -> Result<Self> {
        let last_day_before = self.start.pred_opt().ok_or_else(|| {
            Error::Validation(ValidationError::InvalidInput(format!(
                "No period before {}",
                self
            )))
        })?;
        Self::from_date(last_day_before)
    }
}

impl fmt::Display for BudgetPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl From<BudgetPeriod> for String {
    fn from(period: BudgetPeriod) -> Self {
        period.to_string()
    }
}

impl TryFrom<String> for BudgetPeriod {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_key_is_first_of_month() {
        let period = BudgetPeriod::new(2026, 3).unwrap();
        assert_eq!(period.start_key(), "2026-03-01");
        assert_eq!(period.next_start_key(), "2026-04-01");
    }

    #[test]
    fn test_december_rolls_into_next_year() {
        let period = BudgetPeriod::new(2025, 12).unwrap();
        assert_eq!(period.next_start(), NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert_eq!(period.next().unwrap(), BudgetPeriod::new(2026, 1).unwrap());
        assert_eq!(
            BudgetPeriod::new(2026, 1).unwrap().previous().unwrap(),
            period
        );
    }

    #[test]
    fn test_rejects_invalid_month() {
        assert!(BudgetPeriod::new(2026, 0).is_err());
        assert!(BudgetPeriod::new(2026, 13).is_err());
    }

    #[test]
    fn test_parse_accepts_month_and_date_forms() {
        let expected = BudgetPeriod::new(2026, 7).unwrap();
        assert_eq!(BudgetPeriod::parse("2026-07").unwrap(), expected);
        assert_eq!(BudgetPeriod::parse("2026-7").unwrap(), expected);
        assert_eq!(BudgetPeriod::parse("2026-07-19").unwrap(), expected);
        assert!(BudgetPeriod::parse("July 2026").is_err());
    }

    #[test]
    fn test_contains_uses_half_open_range() {
        let period = BudgetPeriod::new(2026, 2).unwrap();
        assert!(period.contains(NaiveDate::from_ymd_opt(2026, 2, 1).unwrap()));
        assert!(period.contains(NaiveDate::from_ymd_opt(2026, 2, 28).unwrap()));
        assert!(!period.contains(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()));
        assert!(!period.contains(NaiveDate::from_ymd_opt(2026, 1, 31).unwrap()));
    }

    #[test]
    fn test_serializes_as_year_month() {
        let period = BudgetPeriod::new(2026, 10).unwrap();
        let json = serde_json::to_string(&period).unwrap();
        assert_eq!(json, "\"2026-10\"");
        let back: BudgetPeriod = serde_json::from_str(&json).unwrap();
        assert_eq!(back, period);
    }
}
