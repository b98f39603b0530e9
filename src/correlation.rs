//! Habit correlation insights
//!
//! For every active habit, a binary completion series (1 = completed that
//! day, 0 otherwise, missing records included) is correlated against the
//! mood, energy and consistency-score series of the same days.

use crate::types::{DailyEntry, Habit, HabitCorrelation};
use tracing::debug;

/// Fewer entries than this yields no correlations at all
pub const MIN_CORRELATION_ENTRIES: usize = 3;

/// Pearson correlation coefficient of two equal-length series.
///
/// Returns 0 for series shorter than [`MIN_CORRELATION_ENTRIES`], of unequal
/// length, or with zero variance in either series, so the result is always
/// a finite value in [-1, 1] for finite inputs.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len();
    if n < MIN_CORRELATION_ENTRIES || n != y.len() {
        return 0.0;
    }

    let mean_x = x.iter().sum::<f64>() / n as f64;
    let mean_y = y.iter().sum::<f64>() / n as f64;

    let mut numerator = 0.0;
    let mut denom_x = 0.0;
    let mut denom_y = 0.0;

    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        numerator += dx * dy;
        denom_x += dx * dx;
        denom_y += dy * dy;
    }

    let denom = (denom_x * denom_y).sqrt();
    if denom == 0.0 {
        return 0.0;
    }

    // Guard against rounding drift just past ±1
    (numerator / denom).clamp(-1.0, 1.0)
}

/// Correlate each active habit with mood, energy and consistency score.
///
/// Returns an empty list below [`MIN_CORRELATION_ENTRIES`] entries. The
/// result is sorted by `|correlation_with_mood|`, strongest first.
pub fn calculate_correlations(habits: &[Habit], entries: &[DailyEntry]) -> Vec<HabitCorrelation> {
    let mut sorted: Vec<&DailyEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| a.date.cmp(&b.date));

    if sorted.len() < MIN_CORRELATION_ENTRIES {
        debug!(
            entries = sorted.len(),
            "not enough entries for correlation"
        );
        return Vec::new();
    }

    let total_days = sorted.len();
    let moods: Vec<f64> = sorted.iter().map(|e| e.mood).collect();
    let energies: Vec<f64> = sorted.iter().map(|e| e.energy).collect();
    let scores: Vec<f64> = sorted.iter().map(|e| e.health_score).collect();

    let mut correlations: Vec<HabitCorrelation> = habits
        .iter()
        .filter(|h| h.active)
        .map(|habit| {
            let completions: Vec<f64> = sorted
                .iter()
                .map(|e| if e.is_completed(&habit.id) { 1.0 } else { 0.0 })
                .collect();
            let completion_count = completions.iter().filter(|v| **v == 1.0).count();

            HabitCorrelation {
                habit_id: habit.id.clone(),
                habit_name: habit.name.clone(),
                habit_type: habit.habit_type,
                correlation_with_mood: pearson(&completions, &moods),
                correlation_with_energy: pearson(&completions, &energies),
                correlation_with_health_score: pearson(&completions, &scores),
                completion_count: completion_count as u32,
                total_days: total_days as u32,
                completion_rate: completion_count as f64 / total_days as f64 * 100.0,
            }
        })
        .collect();

    correlations.sort_by(|a, b| {
        b.correlation_with_mood
            .abs()
            .total_cmp(&a.correlation_with_mood.abs())
    });

    correlations
}
