//! Calendar helpers
//!
//! Entries are keyed by zero-padded `YYYY-MM-DD` strings, so lexical order of
//! keys equals chronological order. Calendar arithmetic goes through
//! [`chrono::NaiveDate`]; the engines never read the clock themselves and take
//! the reference "today" as a parameter.

use crate::error::ComputeError;
use crate::types::DateKey;
use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// strftime format of a [`DateKey`]
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Parse a date key, rejecting anything that is not zero-padded `YYYY-MM-DD`
pub fn parse_date_key(key: &str) -> Result<NaiveDate, ComputeError> {
    let date = NaiveDate::parse_from_str(key, DATE_KEY_FORMAT)
        .map_err(|e| ComputeError::InvalidDate(format!("{key}: {e}")))?;

    // chrono accepts unpadded fields; keys must sort lexically
    if format_date_key(date) != key {
        return Err(ComputeError::InvalidDate(format!(
            "{key}: expected zero-padded YYYY-MM-DD"
        )));
    }

    Ok(date)
}

pub fn format_date_key(date: NaiveDate) -> DateKey {
    date.format(DATE_KEY_FORMAT).to_string()
}

pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    date + Duration::days(days)
}

/// Every calendar day from `start` to `end`, both inclusive
pub fn days_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|d| *d <= end).collect()
}

/// Current local calendar date
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Whether `key` falls in `[start, end]` by lexical comparison
pub fn key_in_range(key: &str, start: Option<&str>, end: &str) -> bool {
    start.map_or(true, |s| key >= s) && key <= end
}

/// Lookback period for trends, heatmaps and per-habit rates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimePeriod {
    #[serde(rename = "7d")]
    Week,
    #[default]
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "90d")]
    Quarter,
    #[serde(rename = "all")]
    All,
}

impl TimePeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimePeriod::Week => "7d",
            TimePeriod::Month => "30d",
            TimePeriod::Quarter => "90d",
            TimePeriod::All => "all",
        }
    }

    /// Days to look back from today, `None` for no lower bound
    pub fn lookback_days(&self) -> Option<i64> {
        match self {
            TimePeriod::Week => Some(7),
            TimePeriod::Month => Some(30),
            TimePeriod::Quarter => Some(90),
            TimePeriod::All => None,
        }
    }

    /// Inclusive `(start, end)` range ending today.
    ///
    /// The start is `today - lookback`, so "7d" covers eight calendar days.
    pub fn range(&self, today: NaiveDate) -> (Option<NaiveDate>, NaiveDate) {
        let start = self.lookback_days().map(|days| add_days(today, -days));
        (start, today)
    }

    /// Same as [`TimePeriod::range`] with formatted keys
    pub fn key_range(&self, today: NaiveDate) -> (Option<DateKey>, DateKey) {
        let (start, end) = self.range(today);
        (start.map(format_date_key), format_date_key(end))
    }
}

impl fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimePeriod {
    type Err = ComputeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "7d" => Ok(TimePeriod::Week),
            "30d" => Ok(TimePeriod::Month),
            "90d" => Ok(TimePeriod::Quarter),
            "all" => Ok(TimePeriod::All),
            other => Err(ComputeError::ParseError(format!(
                "unknown period '{other}', expected 7d, 30d, 90d or all"
            ))),
        }
    }
}
