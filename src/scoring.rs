//! Consistency score computation
//!
//! A day's score blends the subjective ratings (mood, energy, sleep) with the
//! weighted completion of the user's active habits:
//!
//! ```text
//! base  = (mood + energy + sleep) / 3
//! delta = (Σ weight·direction over completed) / (Σ weight over recorded) · 5
//! score = round1(clamp(base + delta, 0, 10))
//! ```
//!
//! The habit delta is normalized by the total weight of the habits recorded
//! that day, so completion rate (not habit count) drives the score.

use crate::types::{DailyEntry, Habit, HabitCompletion};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Half-width of the range the habit contribution is mapped into
pub const HABIT_DELTA_RANGE: f64 = 5.0;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 10.0;

/// Weight and sign of one active habit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HabitImpact {
    pub weight: f64,
    /// +1 for good habits, -1 for bad habits
    pub direction: f64,
}

/// `habit_id -> impact` table built once from the active habit set.
///
/// Inactive and unknown habits are absent and therefore ignored by scoring.
#[derive(Debug, Clone, Default)]
pub struct HabitImpactMap {
    impacts: HashMap<String, HabitImpact>,
}

impl HabitImpactMap {
    pub fn from_habits(habits: &[Habit]) -> Self {
        let impacts = habits
            .iter()
            .filter(|h| h.active)
            .map(|h| {
                (
                    h.id.clone(),
                    HabitImpact {
                        weight: f64::from(h.weight),
                        direction: h.habit_type.direction(),
                    },
                )
            })
            .collect();

        Self { impacts }
    }

    pub fn insert(&mut self, habit_id: impl Into<String>, impact: HabitImpact) {
        self.impacts.insert(habit_id.into(), impact);
    }

    pub fn get(&self, habit_id: &str) -> Option<&HabitImpact> {
        self.impacts.get(habit_id)
    }

    pub fn len(&self) -> usize {
        self.impacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.impacts.is_empty()
    }
}

/// Compute a day's consistency score in [0, 10], rounded to one decimal.
///
/// Ratings are not clamped on input; out-of-range or NaN values propagate
/// arithmetically and only the final composite is clamped.
pub fn health_score(
    mood: f64,
    energy: f64,
    sleep: f64,
    completions: &[HabitCompletion],
    impacts: &HabitImpactMap,
) -> f64 {
    let subjective_base = (mood + energy + sleep) / 3.0;
    let raw = subjective_base + normalized_habit_delta(completions, impacts);
    round_to_tenth(raw.clamp(MIN_SCORE, MAX_SCORE))
}

/// Habit contribution mapped into [-5, +5]; 0 when no known habit was recorded
pub fn normalized_habit_delta(completions: &[HabitCompletion], impacts: &HabitImpactMap) -> f64 {
    let mut habit_delta = 0.0;
    let mut max_possible_delta = 0.0;

    for completion in completions {
        let Some(impact) = impacts.get(&completion.habit_id) else {
            continue;
        };

        max_possible_delta += impact.weight;
        if completion.completed {
            habit_delta += impact.weight * impact.direction;
        }
    }

    if max_possible_delta > 0.0 {
        (habit_delta / max_possible_delta) * HABIT_DELTA_RANGE
    } else {
        0.0
    }
}

/// Score a stored entry against the given impact table
pub fn score_entry(entry: &DailyEntry, impacts: &HabitImpactMap) -> f64 {
    health_score(
        entry.mood,
        entry.energy,
        entry.sleep,
        &entry.habit_completions,
        impacts,
    )
}

/// Re-run scoring over every entry with the current habit definitions.
///
/// Returns how many stored scores changed. Call this after any edit to a
/// habit's weight, type or active flag; it is never done lazily.
pub fn recalculate_scores(entries: &mut [DailyEntry], habits: &[Habit]) -> usize {
    let impacts = HabitImpactMap::from_habits(habits);
    let mut changed = 0;

    for entry in entries.iter_mut() {
        let score = score_entry(entry, &impacts);
        if !same_score(score, entry.health_score) {
            changed += 1;
        }
        entry.health_score = score;
    }

    debug!(
        entries = entries.len(),
        changed, "recalculated consistency scores"
    );
    changed
}

/// Unrounded mean of the three subjective ratings
pub fn wellbeing_score(entry: &DailyEntry) -> f64 {
    (entry.mood + entry.energy + entry.sleep) / 3.0
}

/// Whether two stored scores are the same value at one-decimal precision
pub fn same_score(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

/// Round half away from zero at 0.1 granularity
fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
