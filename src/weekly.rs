//! Week-over-week aggregation
//!
//! "This week" is the last seven calendar days including today; "last week"
//! is the seven days before that. Rates use the number of days that have an
//! entry as the denominator, so days without a check-in neither help nor hurt.

use crate::dates::{add_days, days_between, format_date_key};
use crate::types::{DailyEntry, DateKey, Habit, HabitType, WeeklySummary};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Days in one aggregation window
pub const WEEK_DAYS: i64 = 7;

/// The current and prior seven-day windows relative to a reference day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekWindow {
    pub this_start: NaiveDate,
    pub this_end: NaiveDate,
    pub last_start: NaiveDate,
    pub last_end: NaiveDate,
}

impl WeekWindow {
    pub fn ending(today: NaiveDate) -> Self {
        let this_start = add_days(today, -(WEEK_DAYS - 1));
        let last_end = add_days(this_start, -1);
        Self {
            this_start,
            this_end: today,
            last_start: add_days(last_end, -(WEEK_DAYS - 1)),
            last_end,
        }
    }

    pub fn this_week_keys(&self) -> Vec<DateKey> {
        days_between(self.this_start, self.this_end)
            .into_iter()
            .map(format_date_key)
            .collect()
    }

    pub fn last_week_keys(&self) -> Vec<DateKey> {
        days_between(self.last_start, self.last_end)
            .into_iter()
            .map(format_date_key)
            .collect()
    }

    /// Entries that fall in the current week, ascending
    pub fn this_week<'a>(&self, entries: &'a [DailyEntry]) -> Vec<&'a DailyEntry> {
        collect_window(entries, &self.this_week_keys())
    }

    /// Entries that fall in the prior week, ascending
    pub fn last_week<'a>(&self, entries: &'a [DailyEntry]) -> Vec<&'a DailyEntry> {
        collect_window(entries, &self.last_week_keys())
    }
}

fn collect_window<'a>(entries: &'a [DailyEntry], keys: &[DateKey]) -> Vec<&'a DailyEntry> {
    let by_date: HashMap<&str, &DailyEntry> =
        entries.iter().map(|e| (e.date.as_str(), e)).collect();
    keys.iter()
        .filter_map(|k| by_date.get(k.as_str()).copied())
        .collect()
}

/// Arithmetic mean, 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Whole percentage of `hits / total`, 0 when `total` is 0
pub fn percent(hits: usize, total: usize) -> u32 {
    if total == 0 {
        0
    } else {
        (hits as f64 / total as f64 * 100.0).round() as u32
    }
}

/// Good-habit completion rate over the given days, in whole percent
pub fn good_habit_rate(habits: &[Habit], days: &[&DailyEntry]) -> u32 {
    let good: Vec<&Habit> = active_of_type(habits, HabitType::Good);
    let hits = days
        .iter()
        .map(|e| good.iter().filter(|h| e.is_completed(&h.id)).count())
        .sum();
    percent(hits, good.len() * days.len())
}

/// Bad-habit avoidance rate over the given days, in whole percent
pub fn avoidance_rate(habits: &[Habit], days: &[&DailyEntry]) -> u32 {
    let bad: Vec<&Habit> = active_of_type(habits, HabitType::Bad);
    let hits = days
        .iter()
        .map(|e| bad.iter().filter(|h| !e.is_completed(&h.id)).count())
        .sum();
    percent(hits, bad.len() * days.len())
}

fn active_of_type(habits: &[Habit], habit_type: HabitType) -> Vec<&Habit> {
    habits
        .iter()
        .filter(|h| h.active && h.habit_type == habit_type)
        .collect()
}

/// Compare this week against last week.
///
/// Returns `None` when the current week holds no entries. Deltas are `None`
/// when the prior week holds none, rather than reporting a false zero change.
pub fn weekly_summary(
    habits: &[Habit],
    entries: &[DailyEntry],
    today: NaiveDate,
) -> Option<WeeklySummary> {
    let window = WeekWindow::ending(today);
    let this_week = window.this_week(entries);
    if this_week.is_empty() {
        return None;
    }
    let last_week = window.last_week(entries);

    let this_avg_score = mean(&this_week.iter().map(|e| e.health_score).collect::<Vec<_>>());
    let this_avg_mood = mean(&this_week.iter().map(|e| e.mood).collect::<Vec<_>>());

    let (last_avg_score, last_avg_mood) = if last_week.is_empty() {
        (None, None)
    } else {
        (
            Some(mean(&last_week.iter().map(|e| e.health_score).collect::<Vec<_>>())),
            Some(mean(&last_week.iter().map(|e| e.mood).collect::<Vec<_>>())),
        )
    };

    Some(WeeklySummary {
        week_start: format_date_key(window.this_start),
        week_end: format_date_key(window.this_end),
        checkin_days: this_week.len() as u32,
        this_avg_score,
        last_avg_score,
        score_delta: last_avg_score.map(|last| this_avg_score - last),
        this_avg_mood,
        last_avg_mood,
        mood_delta: last_avg_mood.map(|last| this_avg_mood - last),
        good_rate: good_habit_rate(habits, &this_week),
        avoid_rate: avoidance_rate(habits, &this_week),
    })
}
