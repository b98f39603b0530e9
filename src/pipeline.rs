//! Pipeline orchestration
//!
//! This module provides the public JSON-in / JSON-out API of the engine. It
//! runs a snapshot through every engine and assembles one `InsightsReport`.

use crate::config::EngineConfig;
use crate::correlation::calculate_correlations;
use crate::dates::format_date_key;
use crate::error::ComputeError;
use crate::scoring::{score_entry, HabitImpactMap};
use crate::store::LifeflowStore;
use crate::streaks::{calculate_all_streaks, with_history};
use crate::trends::{habit_period_rates, heatmap, today_summary, trend_series};
use crate::types::{DailyEntry, Habit, InsightsReport, Snapshot};
use crate::validation::validate_entry;
use crate::weekly::weekly_summary;
use crate::wishes::wish_report;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

/// Parse a snapshot or export document
pub fn parse_snapshot(json: &str) -> Result<Snapshot, ComputeError> {
    Ok(serde_json::from_str(json)?)
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String, ComputeError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

/// Compute the full insights report for `today` as JSON.
///
/// # Arguments
/// * `snapshot_json` - Snapshot or export document JSON
/// * `today` - Reference date for streaks, weeks and periods
/// * `config` - Engine configuration
///
/// # Example
/// ```ignore
/// let report = snapshot_to_insights(json, today(), &EngineConfig::default())?;
/// ```
pub fn snapshot_to_insights(
    snapshot_json: &str,
    today: NaiveDate,
    config: &EngineConfig,
) -> Result<String, ComputeError> {
    InsightsProcessor::with_config(config.clone()).process_json(snapshot_json, today)
}

/// Re-score every entry of a snapshot with its current habits.
///
/// Returns the snapshot JSON with entries sorted and deduplicated by date,
/// and how many stored scores changed.
pub fn recalculate_snapshot(snapshot_json: &str) -> Result<(String, usize), ComputeError> {
    let mut store = LifeflowStore::from_snapshot(parse_snapshot(snapshot_json)?);
    let changed = store.recalculate_scores();
    let json = to_json(store.snapshot(), true)?;
    Ok((json, changed))
}

/// Score one check-in against a habit list.
///
/// Unlike [`score_entry`], the entry is validated first: ratings must be
/// finite and within [1, 10], the date a valid key, and each habit recorded
/// at most once.
pub fn score_checkin(entry: &DailyEntry, habits: &[Habit]) -> Result<f64, ComputeError> {
    validate_entry(entry)?;
    Ok(score_entry(entry, &HabitImpactMap::from_habits(habits)))
}

/// Score one entry against a habit list, both given as JSON
pub fn score_entry_json(entry_json: &str, habits_json: &str) -> Result<f64, ComputeError> {
    let entry: DailyEntry = serde_json::from_str(entry_json)?;
    let habits: Vec<Habit> = serde_json::from_str(habits_json)?;
    score_checkin(&entry, &habits)
}

/// Insights computation bound to a configuration.
///
/// Input snapshots are never modified: scores are refreshed in a working
/// copy so stale stored values cannot leak into the report.
#[derive(Debug, Clone, Default)]
pub struct InsightsProcessor {
    config: EngineConfig,
}

impl InsightsProcessor {
    /// Create a new processor with default settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn process(&self, snapshot: &Snapshot, today: NaiveDate) -> InsightsReport {
        let mut store = LifeflowStore::from_snapshot(snapshot.clone());
        let stale_scores = store.recalculate_scores();
        if stale_scores > 0 {
            warn!(stale_scores, "snapshot had stale consistency scores");
        }

        let data = store.snapshot();
        let insights = &self.config.insights;

        let mut streaks = calculate_all_streaks(&data.habits, &data.entries, today);
        if insights.hide_empty_streaks {
            streaks = with_history(streaks);
        }

        let report = InsightsReport {
            generated_for: format_date_key(today),
            period: insights.period,
            stale_scores,
            today: today_summary(&data.habits, &data.entries, today),
            weekly: weekly_summary(&data.habits, &data.entries, today),
            streaks,
            correlations: calculate_correlations(&data.habits, &data.entries),
            wishes: wish_report(&data.wishes, &data.habits, &data.entries, today),
            trend: trend_series(&data.entries, insights.period, today, insights.rolling_window),
            habit_rates: habit_period_rates(&data.habits, &data.entries, insights.period, today),
            heatmap: heatmap(&data.habits, &data.entries, insights.period, today),
        };

        debug!(
            entries = data.entries.len(),
            habits = data.habits.len(),
            correlations = report.correlations.len(),
            streaks = report.streaks.len(),
            "built insights report"
        );
        report
    }

    pub fn process_json(&self, snapshot_json: &str, today: NaiveDate) -> Result<String, ComputeError> {
        let snapshot = parse_snapshot(snapshot_json)?;
        let report = self.process(&snapshot, today);
        to_json(&report, self.config.output.pretty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::{parse_date_key, TimePeriod};
    use crate::types::{CellState, HabitCompletion};
    use crate::validation::ValidationError;

    /// One good habit, five consecutive days, `run` skipped on day 3
    fn scenario_json() -> String {
        let moods = [6, 7, 5, 8, 9];
        let completed = [true, true, false, true, true];
        let entries: Vec<serde_json::Value> = (0..5)
            .map(|i| {
                serde_json::json!({
                    "date": format!("2024-04-{:02}", i + 1),
                    "mood": moods[i],
                    "energy": 3,
                    "sleep": 3,
                    "habitCompletions": [{"habitId": "run", "completed": completed[i]}],
                    "notes": "",
                    "healthScore": 0
                })
            })
            .collect();

        serde_json::json!({
            "habits": [{"id": "run", "name": "Run", "type": "good", "weight": 8, "active": true}],
            "entries": entries
        })
        .to_string()
    }

    fn today() -> NaiveDate {
        parse_date_key("2024-04-05").unwrap()
    }

    #[test]
    fn test_end_to_end_scenario() {
        let config = EngineConfig::default();
        let json = snapshot_to_insights(&scenario_json(), today(), &config).unwrap();
        let report: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(report["generatedFor"], "2024-04-05");
        assert_eq!(report["staleScores"], 5);

        // (6 + 3 + 3) / 3 + 5
        assert_eq!(report["trend"][0]["score"], 9.0);

        let streak = &report["streaks"][0];
        assert_eq!(streak["currentStreak"], 2);
        assert_eq!(streak["longestStreak"], 2);

        let mood_r = report["correlations"][0]["correlationWithMood"]
            .as_f64()
            .unwrap();
        assert!(mood_r > 0.5);
    }

    #[test]
    fn test_process_does_not_mutate_input() {
        let snapshot = parse_snapshot(&scenario_json()).unwrap();
        let report = InsightsProcessor::new().process(&snapshot, today());

        assert_eq!(report.stale_scores, 5);
        assert!(snapshot.entries.iter().all(|e| e.health_score == 0.0));
        assert_eq!(report.weekly.unwrap().checkin_days, 5);
        assert_eq!(report.today.unwrap().consistency_score, 10.0);
    }

    #[test]
    fn test_config_controls_period_and_streak_filter() {
        let mut snapshot = parse_snapshot(&scenario_json()).unwrap();
        snapshot
            .habits
            .push(Habit::new("read", "Read", crate::types::HabitType::Good, 3));

        let mut config = EngineConfig::default();
        config.insights.period = TimePeriod::Week;
        config.insights.hide_empty_streaks = false;
        let report = InsightsProcessor::with_config(config).process(&snapshot, today());
        assert_eq!(report.period, TimePeriod::Week);
        assert_eq!(report.streaks.len(), 2);

        let report = InsightsProcessor::new().process(&snapshot, today());
        assert_eq!(report.streaks.len(), 1);
    }

    #[test]
    fn test_report_includes_heatmap() {
        let snapshot = parse_snapshot(&scenario_json()).unwrap();
        let report = InsightsProcessor::new().process(&snapshot, today());

        assert_eq!(report.heatmap.len(), 1);
        let cells = &report.heatmap[0].cells;
        // 2024-03-06 through 2024-04-05
        assert_eq!(cells.len(), 31);
        assert_eq!(cells[0].state, CellState::NoEntry);

        let missed = cells.iter().find(|c| c.date == "2024-04-03").unwrap();
        assert_eq!(missed.state, CellState::Missed);
        assert_eq!(cells[30].state, CellState::Completed);
    }

    #[test]
    fn test_recalculate_snapshot() {
        let (json, changed) = recalculate_snapshot(&scenario_json()).unwrap();
        assert_eq!(changed, 5);

        let (_, changed_again) = recalculate_snapshot(&json).unwrap();
        assert_eq!(changed_again, 0);
    }

    #[test]
    fn test_score_entry_json() {
        let score = score_entry_json(
            r#"{"date": "2024-04-01", "mood": 5, "energy": 5, "sleep": 5,
                "habitCompletions": [{"habitId": "phone", "completed": true}]}"#,
            r#"[{"id": "phone", "name": "Phone", "type": "bad", "weight": 4}]"#,
        )
        .unwrap();
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_score_entry_json_rejects_out_of_range_ratings() {
        let result = score_entry_json(
            r#"{"date": "2024-04-01", "mood": 50, "energy": -3, "sleep": 5}"#,
            "[]",
        );
        assert!(matches!(
            result,
            Err(ComputeError::Validation(ValidationError::RatingOutOfRange { .. }))
        ));
    }

    #[test]
    fn test_score_checkin_rejects_nan() {
        let entry = DailyEntry::new("2024-04-01", f64::NAN, 5.0, 5.0);
        let result = score_checkin(&entry, &[]);

        match result {
            Err(ComputeError::Validation(ValidationError::RatingOutOfRange { field, .. })) => {
                assert_eq!(field, "mood");
            }
            other => panic!("expected mood rating error, got {:?}", other),
        }
    }

    #[test]
    fn test_score_checkin_rejects_duplicate_habit() {
        let habits = vec![Habit::new("run", "Run", crate::types::HabitType::Good, 8)];
        let entry = DailyEntry::new("2024-04-01", 5.0, 5.0, 5.0).with_completions(vec![
            HabitCompletion::new("run", true),
            HabitCompletion::new("run", false),
        ]);

        assert!(matches!(
            score_checkin(&entry, &habits),
            Err(ComputeError::Validation(ValidationError::DuplicateCompletion { .. }))
        ));
    }

    #[test]
    fn test_score_checkin_valid() {
        let habits = vec![Habit::new("run", "Run", crate::types::HabitType::Good, 8)];
        let entry = DailyEntry::new("2024-04-01", 6.0, 3.0, 3.0)
            .with_completions(vec![HabitCompletion::new("run", true)]);

        // (6 + 3 + 3) / 3 + 5
        assert_eq!(score_checkin(&entry, &habits).unwrap(), 9.0);
    }

    #[test]
    fn test_empty_snapshot() {
        let json = snapshot_to_insights("{}", today(), &EngineConfig::default()).unwrap();
        let report: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert!(report["today"].is_null());
        assert!(report["weekly"].is_null());
        assert_eq!(report["correlations"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_invalid_json() {
        let result = snapshot_to_insights("not json", today(), &EngineConfig::default());
        assert!(matches!(result, Err(ComputeError::JsonError(_))));
    }
}
