//! Boundary validation
//!
//! The engines are total over well-typed input and never validate. Data
//! crossing into the store, or handed to the CLI, is checked here instead.

use crate::dates::parse_date_key;
use crate::scoring::{same_score, score_entry, HabitImpactMap};
use crate::types::{DailyEntry, Habit, Snapshot, Wish, WishKind};
use std::collections::HashSet;

pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 10.0;
pub const MIN_WEIGHT: u8 = 1;
pub const MAX_WEIGHT: u8 = 10;

/// A contract violation found at the boundary
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} rating {value} on {date} is outside [1, 10]")]
    RatingOutOfRange {
        date: String,
        field: String,
        value: f64,
    },

    #[error("habit {habit_id} has weight {weight}, expected 1..=10")]
    WeightOutOfRange { habit_id: String, weight: u8 },

    #[error("invalid date key '{0}', expected YYYY-MM-DD")]
    InvalidDateKey(String),

    #[error("more than one entry for {0}")]
    DuplicateDate(String),

    #[error("habit {habit_id} is recorded more than once on {date}")]
    DuplicateCompletion { date: String, habit_id: String },

    #[error("stored score {stored} on {date} is stale, expected {expected}")]
    StaleScore {
        date: String,
        stored: f64,
        expected: f64,
    },

    #[error("habit wish {wish_id} has no linked habit")]
    WishMissingHabit { wish_id: String },

    #[error("habit wish {wish_id} links unknown habit {habit_id}")]
    WishUnknownHabit { wish_id: String, habit_id: String },

    #[error("metric wish {wish_id} has no metric")]
    WishMissingMetric { wish_id: String },

    #[error("metric wish {wish_id} target {value} is outside [1, 10]")]
    WishTargetOutOfRange { wish_id: String, value: f64 },
}

/// Where a finding was made, e.g. `entries[3]` or `habits[0]`
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationFinding {
    pub location: String,
    pub error: ValidationError,
}

fn first(errors: Vec<ValidationError>) -> Result<(), ValidationError> {
    match errors.into_iter().next() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn rating_in_range(value: f64) -> bool {
    value.is_finite() && (MIN_RATING..=MAX_RATING).contains(&value)
}

/// Every problem with a single entry, in field order
pub fn entry_errors(entry: &DailyEntry) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if parse_date_key(&entry.date).is_err() {
        errors.push(ValidationError::InvalidDateKey(entry.date.clone()));
    }

    for (field, value) in [
        ("mood", entry.mood),
        ("energy", entry.energy),
        ("sleep", entry.sleep),
    ] {
        if !rating_in_range(value) {
            errors.push(ValidationError::RatingOutOfRange {
                date: entry.date.clone(),
                field: field.to_string(),
                value,
            });
        }
    }

    let mut seen = HashSet::new();
    for completion in &entry.habit_completions {
        if !seen.insert(completion.habit_id.as_str()) {
            errors.push(ValidationError::DuplicateCompletion {
                date: entry.date.clone(),
                habit_id: completion.habit_id.clone(),
            });
        }
    }

    errors
}

pub fn validate_entry(entry: &DailyEntry) -> Result<(), ValidationError> {
    first(entry_errors(entry))
}

pub fn validate_habit(habit: &Habit) -> Result<(), ValidationError> {
    if !(MIN_WEIGHT..=MAX_WEIGHT).contains(&habit.weight) {
        return Err(ValidationError::WeightOutOfRange {
            habit_id: habit.id.clone(),
            weight: habit.weight,
        });
    }
    Ok(())
}

/// Every problem with a wish. `habits` resolves the linked habit.
pub fn wish_errors(wish: &Wish, habits: &[Habit]) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    match wish.kind {
        WishKind::Habit => match wish.habit_id.as_deref() {
            None | Some("") => errors.push(ValidationError::WishMissingHabit {
                wish_id: wish.id.clone(),
            }),
            Some(habit_id) if !habits.iter().any(|h| h.id == habit_id) => {
                errors.push(ValidationError::WishUnknownHabit {
                    wish_id: wish.id.clone(),
                    habit_id: habit_id.to_string(),
                })
            }
            Some(_) => {}
        },
        WishKind::Metric => {
            if wish.metric.is_none() {
                errors.push(ValidationError::WishMissingMetric {
                    wish_id: wish.id.clone(),
                });
            }
            if let Some(value) = wish.target_value {
                if !rating_in_range(value) {
                    errors.push(ValidationError::WishTargetOutOfRange {
                        wish_id: wish.id.clone(),
                        value,
                    });
                }
            }
        }
    }

    errors
}

pub fn validate_wish(wish: &Wish, habits: &[Habit]) -> Result<(), ValidationError> {
    first(wish_errors(wish, habits))
}

/// Check a whole snapshot, returning every finding with its location.
///
/// Stored scores are compared against a fresh computation with the current
/// habit table; any mismatch means a recalculation was missed.
pub fn validate_snapshot(snapshot: &Snapshot) -> Vec<ValidationFinding> {
    let mut findings = Vec::new();

    for (idx, habit) in snapshot.habits.iter().enumerate() {
        if let Err(error) = validate_habit(habit) {
            findings.push(ValidationFinding {
                location: format!("habits[{idx}]"),
                error,
            });
        }
    }

    for (idx, wish) in snapshot.wishes.iter().enumerate() {
        for error in wish_errors(wish, &snapshot.habits) {
            findings.push(ValidationFinding {
                location: format!("wishes[{idx}]"),
                error,
            });
        }
    }

    let impacts = HabitImpactMap::from_habits(&snapshot.habits);
    let mut dates = HashSet::new();
    for (idx, entry) in snapshot.entries.iter().enumerate() {
        let location = format!("entries[{idx}]");

        if !dates.insert(entry.date.as_str()) {
            findings.push(ValidationFinding {
                location: location.clone(),
                error: ValidationError::DuplicateDate(entry.date.clone()),
            });
        }

        for error in entry_errors(entry) {
            findings.push(ValidationFinding {
                location: location.clone(),
                error,
            });
        }

        let expected = score_entry(entry, &impacts);
        if !same_score(expected, entry.health_score) {
            findings.push(ValidationFinding {
                location,
                error: ValidationError::StaleScore {
                    date: entry.date.clone(),
                    stored: entry.health_score,
                    expected,
                },
            });
        }
    }

    findings
}
