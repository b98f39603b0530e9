//! Period trends
//!
//! Views over a lookback period: the consistency score trend with a rolling
//! mean, per-habit completion rates, the habit heatmap, and today's summary.

use crate::dates::{days_between, format_date_key, key_in_range, parse_date_key, TimePeriod};
use crate::scoring::wellbeing_score;
use crate::types::{
    CellState, DailyEntry, DayInsight, Habit, HabitRate, HabitType, HealthScoreDataPoint,
    HeatmapCell, HeatmapRow, ScoreTier, TodaySummary,
};
use chrono::NaiveDate;
use std::collections::{HashMap, VecDeque};

/// Default number of entries in the rolling score window
pub const DEFAULT_ROLLING_WINDOW: usize = 7;

/// Fixed-size window of the most recent values
#[derive(Debug, Clone)]
pub struct RollingWindow {
    values: VecDeque<f64>,
    window_size: usize,
}

impl Default for RollingWindow {
    fn default() -> Self {
        Self::new(DEFAULT_ROLLING_WINDOW)
    }
}

impl RollingWindow {
    /// A window of at least one value
    pub fn new(window_size: usize) -> Self {
        let window_size = window_size.max(1);
        Self {
            values: VecDeque::with_capacity(window_size),
            window_size,
        }
    }

    pub fn push(&mut self, value: f64) {
        self.values.push_back(value);
        while self.values.len() > self.window_size {
            self.values.pop_front();
        }
    }

    /// Mean of the values currently held, `None` when empty
    pub fn average(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        let sum: f64 = self.values.iter().sum();
        Some(sum / self.values.len() as f64)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Entries inside the period, ascending by date
pub fn entries_in_period<'a>(
    entries: &'a [DailyEntry],
    period: TimePeriod,
    today: NaiveDate,
) -> Vec<&'a DailyEntry> {
    let (start, end) = period.key_range(today);
    let mut selected: Vec<&DailyEntry> = entries
        .iter()
        .filter(|e| key_in_range(&e.date, start.as_deref(), &end))
        .collect();
    selected.sort_by(|a, b| a.date.cmp(&b.date));
    selected
}

/// One data point per entry in the period with a trailing score average.
///
/// The rolling window only sees entries inside the period.
pub fn trend_series(
    entries: &[DailyEntry],
    period: TimePeriod,
    today: NaiveDate,
    rolling_window: usize,
) -> Vec<HealthScoreDataPoint> {
    let mut window = RollingWindow::new(rolling_window);

    entries_in_period(entries, period, today)
        .into_iter()
        .map(|entry| {
            window.push(entry.health_score);
            HealthScoreDataPoint {
                date: entry.date.clone(),
                score: entry.health_score,
                mood: entry.mood,
                energy: entry.energy,
                sleep: entry.sleep,
                rolling_score: window.average().unwrap_or(entry.health_score),
            }
        })
        .collect()
}

fn active_by_sort_order(habits: &[Habit]) -> Vec<&Habit> {
    let mut active: Vec<&Habit> = habits.iter().filter(|h| h.active).collect();
    active.sort_by_key(|h| h.sort_order);
    active
}

/// Share of period entries on which each active habit was completed.
///
/// Empty when the period holds no entries.
pub fn habit_period_rates(
    habits: &[Habit],
    entries: &[DailyEntry],
    period: TimePeriod,
    today: NaiveDate,
) -> Vec<HabitRate> {
    let in_period = entries_in_period(entries, period, today);
    if in_period.is_empty() {
        return Vec::new();
    }

    active_by_sort_order(habits)
        .into_iter()
        .map(|habit| {
            let completed = in_period.iter().filter(|e| e.is_completed(&habit.id)).count();
            HabitRate {
                habit_id: habit.id.clone(),
                habit_name: habit.name.clone(),
                habit_type: habit.habit_type,
                rate: completed as f64 / in_period.len() as f64,
            }
        })
        .collect()
}

/// Per active habit, one cell per calendar day of the period.
///
/// For [`TimePeriod::All`] the first day is the earliest entry.
pub fn heatmap(
    habits: &[Habit],
    entries: &[DailyEntry],
    period: TimePeriod,
    today: NaiveDate,
) -> Vec<HeatmapRow> {
    let (start, end) = period.range(today);
    let start = start.unwrap_or_else(|| earliest_entry(entries).unwrap_or(today));
    let days: Vec<String> = days_between(start, end)
        .into_iter()
        .map(format_date_key)
        .collect();

    let by_date: HashMap<&str, &DailyEntry> =
        entries.iter().map(|e| (e.date.as_str(), e)).collect();

    active_by_sort_order(habits)
        .into_iter()
        .map(|habit| HeatmapRow {
            habit_id: habit.id.clone(),
            habit_name: habit.name.clone(),
            cells: days
                .iter()
                .map(|date| {
                    let state = match by_date.get(date.as_str()) {
                        None => CellState::NoEntry,
                        Some(e) if e.is_completed(&habit.id) => CellState::Completed,
                        Some(_) => CellState::Missed,
                    };
                    HeatmapCell {
                        date: date.clone(),
                        state,
                    }
                })
                .collect(),
        })
        .collect()
}

fn earliest_entry(entries: &[DailyEntry]) -> Option<NaiveDate> {
    entries
        .iter()
        .filter_map(|e| parse_date_key(&e.date).ok())
        .min()
}

/// Today's consistency and wellbeing, `None` without an entry for today
pub fn today_summary(
    habits: &[Habit],
    entries: &[DailyEntry],
    today: NaiveDate,
) -> Option<TodaySummary> {
    let date = format_date_key(today);
    let entry = entries.iter().find(|e| e.date == date)?;

    let mut good_done = 0;
    let mut good_total = 0;
    let mut bad_done = 0;
    let mut bad_total = 0;
    for habit in habits.iter().filter(|h| h.active) {
        let done = entry.is_completed(&habit.id);
        match habit.habit_type {
            HabitType::Good => {
                good_total += 1;
                good_done += u32::from(done);
            }
            HabitType::Bad => {
                bad_total += 1;
                bad_done += u32::from(done);
            }
        }
    }

    let consistency_score = entry.health_score;
    let wellbeing = wellbeing_score(entry);

    Some(TodaySummary {
        date,
        consistency_score,
        wellbeing_score: wellbeing,
        good_done,
        good_total,
        bad_done,
        bad_total,
        insight: DayInsight::from_tiers(
            ScoreTier::from_value(consistency_score),
            ScoreTier::from_value(wellbeing),
        ),
    })
}
