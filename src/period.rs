//! Month-granularity dates in the `MM-YYYY` form used by subscriptions.

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid date format: {0:?}, expected MM-YYYY")]
pub struct InvalidDateFormat(pub String);

const MAX_YEAR: i32 = 9999;

/// A calendar month, anchored at its first instant in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthYear {
    first_day: NaiveDate,
}

impl MonthYear {
    pub fn parse(input: &str) -> Result<Self, InvalidDateFormat> {
        let invalid = || InvalidDateFormat(input.to_string());

        let bytes = input.as_bytes();
        if bytes.len() != 7 || bytes[2] != b'-' {
            return Err(invalid());
        }
        let (month, year) = (&input[..2], &input[3..]);
        if !month.bytes().chain(year.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let month: u32 = month.parse().map_err(|_| invalid())?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let first_day = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        Ok(Self { first_day })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.first_day.and_time(chrono::NaiveTime::MIN).and_utc()
    }

    /// Same month one calendar year later. `None` when the year no longer fits
    /// in four digits.
    pub fn plus_one_year(&self) -> Option<Self> {
        self.first_day
            .checked_add_months(Months::new(12))
            .filter(|first_day| first_day.year() <= MAX_YEAR)
            .map(|first_day| Self { first_day })
    }

    pub fn month(&self) -> u32 {
        self.first_day.month()
    }

    pub fn year(&self) -> i32 {
        self.first_day.year()
    }
}

impl fmt::Display for MonthYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:04}", self.month(), self.year())
    }
}

/// Derived lifetime of a subscription starting in `start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionTerm {
    pub created_at: DateTime<Utc>,
    pub ended: DateTime<Utc>,
    pub end_time: String,
}

impl SubscriptionTerm {
    pub fn from_start_date(start_date: &str) -> Result<Self, InvalidDateFormat> {
        let start = MonthYear::parse(start_date)?;
        let end = start
            .plus_one_year()
            .ok_or_else(|| InvalidDateFormat(start_date.to_string()))?;
        Ok(Self {
            created_at: start.start(),
            ended: end.start(),
            end_time: end.to_string(),
        })
    }
}

/// Closed interval `[begin, end]` of month starts used to filter sums.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub begin: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// `begin > end` is accepted as-is; such a range simply matches nothing.
    pub fn parse(start_date: &str, end_date: &str) -> Result<Self, InvalidDateFormat> {
        Ok(Self {
            begin: MonthYear::parse(start_date)?.start(),
            end: MonthYear::parse(end_date)?.start(),
        })
    }
}
