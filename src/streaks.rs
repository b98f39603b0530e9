//! Habit streaks
//!
//! Streaks are computed fresh from the full entry history on every call. A
//! streak counts consecutive *entries* on which the habit was completed: days
//! without any entry are skipped rather than treated as a break, and only an
//! entry that exists with the habit not completed resets the run.
//!
//! A run stays current while its last completion is today or yesterday.

use crate::dates::{add_days, format_date_key};
use crate::types::{DailyEntry, Habit, HabitType, StreakInfo};
use chrono::NaiveDate;

/// Days after the last completion during which a streak is still current
pub const GRACE_DAYS: i64 = 1;

/// Current and longest streak of one habit as of `today`
pub fn calculate_streak(
    habit_id: &str,
    habit_name: &str,
    entries: &[DailyEntry],
    today: NaiveDate,
) -> StreakInfo {
    let mut sorted: Vec<&DailyEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| a.date.cmp(&b.date));

    let mut longest_streak = 0u32;
    let mut temp_streak = 0u32;
    let mut last_active_date: Option<&str> = None;

    for entry in sorted {
        if entry.is_completed(habit_id) {
            temp_streak += 1;
            longest_streak = longest_streak.max(temp_streak);
            last_active_date = Some(entry.date.as_str());
        } else {
            temp_streak = 0;
        }
    }

    let earliest_current = format_date_key(add_days(today, -GRACE_DAYS));
    let today_key = format_date_key(today);
    let current_streak = match last_active_date {
        Some(date) if date >= earliest_current.as_str() && date <= today_key.as_str() => {
            temp_streak
        }
        _ => 0,
    };

    StreakInfo {
        habit_id: habit_id.to_string(),
        habit_name: habit_name.to_string(),
        current_streak,
        longest_streak,
        last_active_date: last_active_date.map(str::to_string),
    }
}

/// Streaks for every active good habit, in habit order.
///
/// Bad habits are skipped; avoidance streaks are a separate concept.
pub fn calculate_all_streaks(
    habits: &[Habit],
    entries: &[DailyEntry],
    today: NaiveDate,
) -> Vec<StreakInfo> {
    habits
        .iter()
        .filter(|h| h.active && h.habit_type == HabitType::Good)
        .map(|h| calculate_streak(&h.id, &h.name, entries, today))
        .collect()
}

/// Drop streaks that have never started
pub fn with_history(streaks: Vec<StreakInfo>) -> Vec<StreakInfo> {
    streaks
        .into_iter()
        .filter(|s| s.current_streak > 0 || s.longest_streak > 0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::parse_date_key;
    use crate::types::HabitCompletion;

    const TODAY: &str = "2024-03-10";

    fn today() -> NaiveDate {
        parse_date_key(TODAY).unwrap()
    }

    fn day(offset: i64) -> String {
        format_date_key(add_days(today(), offset))
    }

    fn entry(offset: i64, completed: bool) -> DailyEntry {
        DailyEntry::new(day(offset), 6.0, 6.0, 6.0)
            .with_completions(vec![HabitCompletion::new("run", completed)])
    }

    #[test]
    fn test_yesterday_keeps_streak_current() {
        let entries = vec![entry(-2, true), entry(-1, true)];
        let info = calculate_streak("run", "Run", &entries, today());

        assert_eq!(info.current_streak, 2);
        assert_eq!(info.longest_streak, 2);
        assert_eq!(info.last_active_date, Some(day(-1)));
    }

    #[test]
    fn test_streak_lapses_after_grace_window() {
        let entries = vec![entry(-4, true), entry(-3, true)];
        let info = calculate_streak("run", "Run", &entries, today());

        assert_eq!(info.current_streak, 0);
        assert_eq!(info.longest_streak, 2);
    }

    #[test]
    fn test_explicit_miss_breaks_streak() {
        let entries = vec![entry(-2, true), entry(-1, false), entry(0, true)];
        let info = calculate_streak("run", "Run", &entries, today());

        assert_eq!(info.current_streak, 1);
        assert_eq!(info.longest_streak, 1);
    }

    #[test]
    fn test_missing_days_do_not_break_streak() {
        // No entries on -5, -4, -2
        let entries = vec![entry(-6, true), entry(-3, true), entry(0, true)];
        let info = calculate_streak("run", "Run", &entries, today());

        assert_eq!(info.current_streak, 3);
        assert_eq!(info.longest_streak, 3);
    }

    #[test]
    fn test_entry_without_record_breaks_streak() {
        let mut entries = vec![entry(-2, true), entry(0, true)];
        entries.push(DailyEntry::new(day(-1), 5.0, 5.0, 5.0));
        let info = calculate_streak("run", "Run", &entries, today());

        assert_eq!(info.current_streak, 1);
        assert_eq!(info.longest_streak, 1);
    }

    #[test]
    fn test_longest_is_historical_maximum() {
        let entries = vec![
            entry(-9, true),
            entry(-8, true),
            entry(-7, true),
            entry(-6, true),
            entry(-5, false),
            entry(-1, true),
            entry(0, true),
        ];
        let info = calculate_streak("run", "Run", &entries, today());

        assert_eq!(info.current_streak, 2);
        assert_eq!(info.longest_streak, 4);
    }

    #[test]
    fn test_unsorted_input() {
        let entries = vec![entry(0, true), entry(-2, true), entry(-1, false)];
        let info = calculate_streak("run", "Run", &entries, today());

        assert_eq!(info.current_streak, 1);
        assert_eq!(info.longest_streak, 1);
    }

    #[test]
    fn test_never_completed() {
        let entries = vec![entry(-1, false), entry(0, false)];
        let info = calculate_streak("run", "Run", &entries, today());

        assert_eq!(info.current_streak, 0);
        assert_eq!(info.longest_streak, 0);
        assert_eq!(info.last_active_date, None);

        let empty = calculate_streak("run", "Run", &[], today());
        assert_eq!(empty.longest_streak, 0);
    }

    #[test]
    fn test_all_streaks_only_active_good_habits() {
        let mut archived = Habit::new("old", "Old", HabitType::Good, 5);
        archived.active = false;
        let habits = vec![
            Habit::new("run", "Run", HabitType::Good, 8),
            Habit::new("phone", "Phone", HabitType::Bad, 4),
            archived,
            Habit::new("read", "Read", HabitType::Good, 3),
        ];
        let entries = vec![entry(-1, true), entry(0, true)];

        let streaks = calculate_all_streaks(&habits, &entries, today());
        let ids: Vec<&str> = streaks.iter().map(|s| s.habit_id.as_str()).collect();
        assert_eq!(ids, vec!["run", "read"]);

        let visible = with_history(streaks);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].current_streak, 2);
    }
}
