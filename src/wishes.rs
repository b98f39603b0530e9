//! Weekly wish progress
//!
//! Wishes are measured over the same seven-day window as the weekly summary.
//! Habit wishes count completion days of the linked habit against a weekly
//! target; metric wishes compare a week average against a target value.

use crate::dates::format_date_key;
use crate::types::{
    DailyEntry, Habit, HabitWishProgress, HabitWishTotals, MetricWishProgress, Wish, WishKind,
    WishMetric, WishReport,
};
use crate::weekly::{mean, WeekWindow};
use chrono::NaiveDate;

/// `actual / target` clamped to [0, 1], 0 for a non-positive target
pub fn progress_ratio(actual: f64, target: f64) -> f64 {
    if target > 0.0 {
        (actual / target).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Progress of every active habit wish, most completions first
pub fn habit_wish_progress(
    wishes: &[Wish],
    habits: &[Habit],
    week: &[&DailyEntry],
) -> Vec<HabitWishProgress> {
    let mut progress: Vec<HabitWishProgress> = wishes
        .iter()
        .filter(|w| w.active && w.kind == WishKind::Habit)
        .filter_map(|w| {
            let habit_id = w.habit_id.as_deref()?;
            let actual = week.iter().filter(|e| e.is_completed(habit_id)).count() as u32;
            let target = w.target_per_week.unwrap_or(0);

            Some(HabitWishProgress {
                wish_id: w.id.clone(),
                title: w.title.clone(),
                habit_id: habit_id.to_string(),
                habit_name: habits
                    .iter()
                    .find(|h| h.id == habit_id)
                    .map(|h| h.name.clone()),
                actual,
                target,
                ratio: progress_ratio(f64::from(actual), f64::from(target)),
                exceeded: actual > target,
            })
        })
        .collect();

    progress.sort_by(|a, b| b.actual.cmp(&a.actual));
    progress
}

pub fn habit_wish_totals(progress: &[HabitWishProgress]) -> HabitWishTotals {
    let total_actual: u32 = progress.iter().map(|p| p.actual).sum();
    let total_target: u32 = progress.iter().map(|p| p.target).sum();

    HabitWishTotals {
        total_actual,
        total_target,
        ratio: progress_ratio(f64::from(total_actual), f64::from(total_target)),
    }
}

/// Week average of a metric, 0 for an empty week
pub fn metric_average(week: &[&DailyEntry], metric: WishMetric) -> f64 {
    mean(&week.iter().map(|e| e.metric(metric)).collect::<Vec<_>>())
}

/// Progress of every active metric wish, highest average first
pub fn metric_wish_progress(wishes: &[Wish], week: &[&DailyEntry]) -> Vec<MetricWishProgress> {
    let mut progress: Vec<MetricWishProgress> = wishes
        .iter()
        .filter(|w| w.active && w.kind == WishKind::Metric)
        .filter_map(|w| {
            let metric = w.metric?;
            let actual = metric_average(week, metric);
            let target = w.target_value.unwrap_or(0.0);
            let ratio = progress_ratio(actual, target);

            Some(MetricWishProgress {
                wish_id: w.id.clone(),
                title: w.title.clone(),
                metric,
                actual,
                target,
                delta: actual - target,
                ratio,
                reached: ratio >= 1.0,
            })
        })
        .collect();

    progress.sort_by(|a, b| b.actual.total_cmp(&a.actual));
    progress
}

/// Goal-vs-actual report for the week ending `today`
pub fn wish_report(
    wishes: &[Wish],
    habits: &[Habit],
    entries: &[DailyEntry],
    today: NaiveDate,
) -> WishReport {
    let window = WeekWindow::ending(today);
    let week = window.this_week(entries);

    let habit_wishes = habit_wish_progress(wishes, habits, &week);
    let habit_totals = habit_wish_totals(&habit_wishes);

    WishReport {
        week_start: format_date_key(window.this_start),
        week_end: format_date_key(window.this_end),
        habit_wishes,
        habit_totals,
        metric_wishes: metric_wish_progress(wishes, &week),
    }
}
