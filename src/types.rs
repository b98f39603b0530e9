//! Core types for the Lifeflow engine
//!
//! This module defines the records the engines consume (habits, wishes, daily
//! entries) and the derived values they produce (correlations, streaks,
//! weekly summaries, wish progress, trends). Field names serialize in the
//! application's camelCase interchange format.

use crate::dates::TimePeriod;
use serde::{Deserialize, Serialize};

/// Date string in `YYYY-MM-DD` format, used as the primary key of an entry
pub type DateKey = String;

/// Whether a habit helps or hurts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HabitType {
    Good,
    Bad,
}

impl HabitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HabitType::Good => "good",
            HabitType::Bad => "bad",
        }
    }

    /// Sign of the habit's contribution to the consistency score
    pub fn direction(&self) -> f64 {
        match self {
            HabitType::Good => 1.0,
            HabitType::Bad => -1.0,
        }
    }
}

fn default_true() -> bool {
    true
}

/// A trackable behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub habit_type: HabitType,
    /// Subjective impact weight: 1 (minimal) to 10 (life-changing)
    pub weight: u8,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub color: String,
    /// Display ordering only
    #[serde(default)]
    pub sort_order: i32,
    /// Inactive habits are archived, not deleted
    #[serde(default = "default_true")]
    pub active: bool,
    /// Epoch millis
    #[serde(default)]
    pub created_at: i64,
    /// Epoch millis
    #[serde(default)]
    pub updated_at: i64,
}

impl Habit {
    /// Create an active habit with empty display metadata
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        habit_type: HabitType,
        weight: u8,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            habit_type,
            weight,
            icon: String::new(),
            color: String::new(),
            sort_order: 0,
            active: true,
            created_at: 0,
            updated_at: 0,
        }
    }
}

/// One habit's record within a daily entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitCompletion {
    pub habit_id: String,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub emotional_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl HabitCompletion {
    pub fn new(habit_id: impl Into<String>, completed: bool) -> Self {
        Self {
            habit_id: habit_id.into(),
            completed,
            emotional_tags: Vec::new(),
            energy: None,
            mood: None,
            note: None,
        }
    }
}

/// One user's record for one calendar date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyEntry {
    pub date: DateKey,
    /// Overall mood rating 1-10
    pub mood: f64,
    /// Energy level 1-10
    pub energy: f64,
    /// Sleep quality 1-10
    pub sleep: f64,
    #[serde(default)]
    pub habit_completions: Vec<HabitCompletion>,
    #[serde(default)]
    pub notes: String,
    /// Consistency score persisted at save time (0-10)
    #[serde(default)]
    pub health_score: f64,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

impl DailyEntry {
    /// Create an entry with no completions and a zero score
    pub fn new(date: impl Into<DateKey>, mood: f64, energy: f64, sleep: f64) -> Self {
        Self {
            date: date.into(),
            mood,
            energy,
            sleep,
            habit_completions: Vec::new(),
            notes: String::new(),
            health_score: 0.0,
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn with_completions(mut self, completions: Vec<HabitCompletion>) -> Self {
        self.habit_completions = completions;
        self
    }

    /// The first completion record for a habit, if one was logged
    pub fn completion(&self, habit_id: &str) -> Option<&HabitCompletion> {
        self.habit_completions
            .iter()
            .find(|c| c.habit_id == habit_id)
    }

    /// Total completion lookup: a missing record counts as not completed.
    ///
    /// Every engine goes through this so absent records are treated the same
    /// way by scoring, correlation, streaks and aggregation.
    pub fn is_completed(&self, habit_id: &str) -> bool {
        self.completion(habit_id).is_some_and(|c| c.completed)
    }

    /// Value of a wish metric on this day
    pub fn metric(&self, metric: WishMetric) -> f64 {
        match metric {
            WishMetric::Mood => self.mood,
            WishMetric::Energy => self.energy,
            WishMetric::Sleep => self.sleep,
            WishMetric::HealthScore => self.health_score,
        }
    }
}

/// Kind of weekly goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WishKind {
    Habit,
    Metric,
}

/// Metric a metric wish targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WishMetric {
    Mood,
    Energy,
    Sleep,
    HealthScore,
}

impl WishMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            WishMetric::Mood => "mood",
            WishMetric::Energy => "energy",
            WishMetric::Sleep => "sleep",
            WishMetric::HealthScore => "healthScore",
        }
    }
}

/// A user-declared weekly target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wish {
    pub id: String,
    pub title: String,
    pub kind: WishKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub habit_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<WishMetric>,
    /// Weekly completion target for habit wishes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_per_week: Option<u32>,
    /// Target average for metric wishes (1-10)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_value: Option<f64>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

impl Wish {
    pub fn habit(
        id: impl Into<String>,
        title: impl Into<String>,
        habit_id: impl Into<String>,
        target_per_week: u32,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind: WishKind::Habit,
            habit_id: Some(habit_id.into()),
            metric: None,
            target_per_week: Some(target_per_week),
            target_value: None,
            active: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn metric(
        id: impl Into<String>,
        title: impl Into<String>,
        metric: WishMetric,
        target_value: f64,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind: WishKind::Metric,
            habit_id: None,
            metric: Some(metric),
            target_per_week: None,
            target_value: Some(target_value),
            active: true,
            created_at: 0,
            updated_at: 0,
        }
    }
}

/// Immutable view of one user's data handed to the engines.
///
/// Also accepts the export document, whose extra `version` and `exportedAt`
/// fields are ignored on read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub habits: Vec<Habit>,
    #[serde(default)]
    pub wishes: Vec<Wish>,
    #[serde(default)]
    pub entries: Vec<DailyEntry>,
}

impl Snapshot {
    pub fn habit(&self, habit_id: &str) -> Option<&Habit> {
        self.habits.iter().find(|h| h.id == habit_id)
    }

    pub fn entry(&self, date: &str) -> Option<&DailyEntry> {
        self.entries.iter().find(|e| e.date == date)
    }
}

// ============================================================================
// Derived values
// ============================================================================

/// Relationship between one habit's completion pattern and the daily ratings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitCorrelation {
    pub habit_id: String,
    pub habit_name: String,
    pub habit_type: HabitType,
    /// Pearson r in [-1, 1]
    pub correlation_with_mood: f64,
    pub correlation_with_energy: f64,
    pub correlation_with_health_score: f64,
    pub completion_count: u32,
    pub total_days: u32,
    /// Percentage of days completed (0-100)
    pub completion_rate: f64,
}

/// Current and best run of completions for one habit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakInfo {
    pub habit_id: String,
    pub habit_name: String,
    pub current_streak: u32,
    pub longest_streak: u32,
    /// Last date the habit was completed, `None` if never
    pub last_active_date: Option<DateKey>,
}

/// One point of the consistency score trend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthScoreDataPoint {
    pub date: DateKey,
    pub score: f64,
    pub mood: f64,
    pub energy: f64,
    pub sleep: f64,
    /// Mean of the trailing window of stored scores, this day included
    pub rolling_score: f64,
}

/// This week versus the week before
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySummary {
    pub week_start: DateKey,
    pub week_end: DateKey,
    /// Days in the current week with an entry (0-7)
    pub checkin_days: u32,
    pub this_avg_score: f64,
    pub last_avg_score: Option<f64>,
    /// `None` when the prior week holds no entries
    pub score_delta: Option<f64>,
    pub this_avg_mood: f64,
    pub last_avg_mood: Option<f64>,
    pub mood_delta: Option<f64>,
    /// Good habits completed, whole percent of (habits x check-in days)
    pub good_rate: u32,
    /// Bad habits avoided, whole percent of (habits x check-in days)
    pub avoid_rate: u32,
}

/// Weekly progress of a habit-frequency wish
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitWishProgress {
    pub wish_id: String,
    pub title: String,
    pub habit_id: String,
    pub habit_name: Option<String>,
    /// Completions this week, unclamped
    pub actual: u32,
    pub target: u32,
    /// actual / target clamped to [0, 1]
    pub ratio: f64,
    pub exceeded: bool,
}

/// Sum over all habit wishes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitWishTotals {
    pub total_actual: u32,
    pub total_target: u32,
    pub ratio: f64,
}

/// Weekly progress of a metric-average wish
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricWishProgress {
    pub wish_id: String,
    pub title: String,
    pub metric: WishMetric,
    /// Week average of the metric
    pub actual: f64,
    pub target: f64,
    /// actual - target, signed
    pub delta: f64,
    pub ratio: f64,
    pub reached: bool,
}

/// Goal-vs-actual view for the current week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishReport {
    pub week_start: DateKey,
    pub week_end: DateKey,
    pub habit_wishes: Vec<HabitWishProgress>,
    pub habit_totals: HabitWishTotals,
    pub metric_wishes: Vec<MetricWishProgress>,
}

/// Fraction of period days a habit was completed on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitRate {
    pub habit_id: String,
    pub habit_name: String,
    pub habit_type: HabitType,
    /// 0-1
    pub rate: f64,
}

/// State of one heatmap cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellState {
    Completed,
    Missed,
    NoEntry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapCell {
    pub date: DateKey,
    pub state: CellState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapRow {
    pub habit_id: String,
    pub habit_name: String,
    pub cells: Vec<HeatmapCell>,
}

/// Low / mid / high band of a 0-10 value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreTier {
    Low,
    Mid,
    High,
}

impl ScoreTier {
    pub fn from_value(value: f64) -> Self {
        if value >= 7.0 {
            ScoreTier::High
        } else if value <= 4.0 {
            ScoreTier::Low
        } else {
            ScoreTier::Mid
        }
    }
}

/// What you did (consistency) against how you felt (wellbeing)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayInsight {
    Aligned,
    PushingHard,
    Recovery,
    Drift,
    Mixed,
}

impl DayInsight {
    pub fn from_tiers(consistency: ScoreTier, wellbeing: ScoreTier) -> Self {
        match (consistency, wellbeing) {
            (ScoreTier::High, ScoreTier::High) => DayInsight::Aligned,
            (ScoreTier::High, ScoreTier::Low) => DayInsight::PushingHard,
            (ScoreTier::Low, ScoreTier::High) => DayInsight::Recovery,
            (ScoreTier::Low, ScoreTier::Low) => DayInsight::Drift,
            _ => DayInsight::Mixed,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            DayInsight::Aligned => "Aligned: strong consistency and strong wellbeing.",
            DayInsight::PushingHard => "Pushing hard: consistency is high, wellbeing is low.",
            DayInsight::Recovery => "Recovery day: wellbeing is high with low consistency.",
            DayInsight::Drift => "Drift phase: low consistency and low wellbeing.",
            DayInsight::Mixed => "Mixed signals today. Notice what supported or drained you.",
        }
    }
}

/// Snapshot of today's entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodaySummary {
    pub date: DateKey,
    pub consistency_score: f64,
    pub wellbeing_score: f64,
    pub good_done: u32,
    pub good_total: u32,
    pub bad_done: u32,
    pub bad_total: u32,
    pub insight: DayInsight,
}

/// Everything the presentation layer renders, computed in one pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightsReport {
    pub generated_for: DateKey,
    pub period: TimePeriod,
    /// Entries whose stored score disagreed with the current habit table
    pub stale_scores: usize,
    pub today: Option<TodaySummary>,
    pub weekly: Option<WeeklySummary>,
    pub streaks: Vec<StreakInfo>,
    pub correlations: Vec<HabitCorrelation>,
    pub wishes: WishReport,
    pub trend: Vec<HealthScoreDataPoint>,
    pub habit_rates: Vec<HabitRate>,
    #[serde(default)]
    pub heatmap: Vec<HeatmapRow>,
}
