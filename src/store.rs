//! In-memory state for one user's data
//!
//! `LifeflowStore` is the only place habits, wishes and entries are mutated.
//! Entries are kept sorted by date with at most one entry per date, and every
//! edit that changes how habits score re-runs scoring over the full history
//! before returning, so stored scores never go stale.

use crate::correlation::calculate_correlations;
use crate::error::ComputeError;
use crate::scoring::{self, score_entry, HabitImpactMap};
use crate::streaks::calculate_all_streaks;
use crate::types::{
    DailyEntry, DateKey, Habit, HabitCompletion, HabitCorrelation, HabitType, Snapshot,
    StreakInfo, WeeklySummary, Wish, WishReport,
};
use crate::validation::{validate_entry, validate_habit, validate_wish};
use crate::weekly::weekly_summary;
use crate::wishes::wish_report;
use chrono::{NaiveDate, Utc};
use tracing::debug;

/// Fields supplied when creating a habit
#[derive(Debug, Clone)]
pub struct NewHabit {
    pub name: String,
    pub habit_type: HabitType,
    pub weight: u8,
    pub icon: String,
    pub color: String,
}

impl NewHabit {
    pub fn new(name: impl Into<String>, habit_type: HabitType, weight: u8) -> Self {
        Self {
            name: name.into(),
            habit_type,
            weight,
            icon: String::new(),
            color: String::new(),
        }
    }
}

/// Partial habit edit; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct HabitUpdate {
    pub name: Option<String>,
    pub habit_type: Option<HabitType>,
    pub weight: Option<u8>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub active: Option<bool>,
}

/// A check-in as submitted; the score is computed on save
#[derive(Debug, Clone)]
pub struct EntryInput {
    pub date: DateKey,
    pub mood: f64,
    pub energy: f64,
    pub sleep: f64,
    pub habit_completions: Vec<HabitCompletion>,
    pub notes: String,
}

impl EntryInput {
    pub fn new(date: impl Into<DateKey>, mood: f64, energy: f64, sleep: f64) -> Self {
        Self {
            date: date.into(),
            mood,
            energy,
            sleep,
            habit_completions: Vec::new(),
            notes: String::new(),
        }
    }

    pub fn with_completions(mut self, completions: Vec<HabitCompletion>) -> Self {
        self.habit_completions = completions;
        self
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, Default)]
pub struct LifeflowStore {
    data: Snapshot,
}

impl LifeflowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a snapshot, see [`LifeflowStore::load`]
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut store = Self::new();
        store.load(snapshot);
        store
    }

    pub fn habits(&self) -> &[Habit] {
        &self.data.habits
    }

    pub fn wishes(&self) -> &[Wish] {
        &self.data.wishes
    }

    /// Entries ascending by date
    pub fn entries(&self) -> &[DailyEntry] {
        &self.data.entries
    }

    pub fn habit(&self, id: &str) -> Option<&Habit> {
        self.data.habit(id)
    }

    pub fn entry(&self, date: &str) -> Option<&DailyEntry> {
        self.entry_index(date).ok().map(|idx| &self.data.entries[idx])
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.data
    }

    pub fn into_snapshot(self) -> Snapshot {
        self.data
    }

    fn entry_index(&self, date: &str) -> Result<usize, usize> {
        self.data
            .entries
            .binary_search_by(|e| e.date.as_str().cmp(date))
    }

    fn habit_mut(&mut self, id: &str) -> Result<&mut Habit, ComputeError> {
        self.data
            .habits
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or_else(|| ComputeError::HabitNotFound(id.to_string()))
    }

    // ------------------------------------------------------------------
    // Habits
    // ------------------------------------------------------------------

    /// Create an active habit placed after every existing habit
    pub fn add_habit(&mut self, params: NewHabit) -> Result<Habit, ComputeError> {
        let now = now_millis();
        let habit = Habit {
            id: new_id(),
            name: params.name,
            habit_type: params.habit_type,
            weight: params.weight,
            icon: params.icon,
            color: params.color,
            sort_order: self.data.habits.len() as i32 + 1,
            active: true,
            created_at: now,
            updated_at: now,
        };
        validate_habit(&habit)?;

        debug!(habit_id = %habit.id, name = %habit.name, "added habit");
        self.data.habits.push(habit.clone());
        Ok(habit)
    }

    /// Apply a partial edit.
    ///
    /// Changing weight, type or the active flag re-scores every entry.
    pub fn update_habit(&mut self, id: &str, update: HabitUpdate) -> Result<Habit, ComputeError> {
        let habit = self.habit_mut(id)?;
        let mut edited = habit.clone();

        if let Some(name) = update.name {
            edited.name = name;
        }
        if let Some(habit_type) = update.habit_type {
            edited.habit_type = habit_type;
        }
        if let Some(weight) = update.weight {
            edited.weight = weight;
        }
        if let Some(icon) = update.icon {
            edited.icon = icon;
        }
        if let Some(color) = update.color {
            edited.color = color;
        }
        if let Some(active) = update.active {
            edited.active = active;
        }
        validate_habit(&edited)?;

        let rescore = edited.weight != habit.weight
            || edited.habit_type != habit.habit_type
            || edited.active != habit.active;
        edited.updated_at = now_millis();
        *habit = edited.clone();

        debug!(habit_id = %id, rescore, "updated habit");
        if rescore {
            self.recalculate_scores();
        }
        Ok(edited)
    }

    /// Soft-delete: the habit stays for history but stops counting
    pub fn archive_habit(&mut self, id: &str) -> Result<Habit, ComputeError> {
        self.update_habit(
            id,
            HabitUpdate {
                active: Some(false),
                ..HabitUpdate::default()
            },
        )
    }

    /// Assign sort orders 1..=n following `ordered_ids`; unknown ids are skipped
    pub fn reorder_habits(&mut self, ordered_ids: &[&str]) {
        for (idx, id) in ordered_ids.iter().enumerate() {
            if let Ok(habit) = self.habit_mut(id) {
                habit.sort_order = idx as i32 + 1;
            }
        }
        debug!(count = ordered_ids.len(), "reordered habits");
    }

    // ------------------------------------------------------------------
    // Wishes
    // ------------------------------------------------------------------

    /// Store a new wish under a fresh id
    pub fn add_wish(&mut self, mut wish: Wish) -> Result<Wish, ComputeError> {
        validate_wish(&wish, &self.data.habits)?;

        let now = now_millis();
        wish.id = new_id();
        wish.created_at = now;
        wish.updated_at = now;

        debug!(wish_id = %wish.id, title = %wish.title, "added wish");
        self.data.wishes.push(wish.clone());
        Ok(wish)
    }

    /// Replace the wish with the same id, keeping its creation time
    pub fn update_wish(&mut self, mut wish: Wish) -> Result<Wish, ComputeError> {
        validate_wish(&wish, &self.data.habits)?;

        let existing = self
            .data
            .wishes
            .iter_mut()
            .find(|w| w.id == wish.id)
            .ok_or_else(|| ComputeError::WishNotFound(wish.id.clone()))?;
        wish.created_at = existing.created_at;
        wish.updated_at = now_millis();
        *existing = wish.clone();

        debug!(wish_id = %wish.id, "updated wish");
        Ok(wish)
    }

    pub fn delete_wish(&mut self, id: &str) -> Result<Wish, ComputeError> {
        let idx = self
            .data
            .wishes
            .iter()
            .position(|w| w.id == id)
            .ok_or_else(|| ComputeError::WishNotFound(id.to_string()))?;

        debug!(wish_id = %id, "deleted wish");
        Ok(self.data.wishes.remove(idx))
    }

    // ------------------------------------------------------------------
    // Entries
    // ------------------------------------------------------------------

    /// Create or overwrite the entry for `input.date`.
    ///
    /// The score is computed against the current habits. Overwriting keeps
    /// the original `created_at`.
    pub fn save_entry(&mut self, input: EntryInput) -> Result<DailyEntry, ComputeError> {
        let now = now_millis();
        let mut entry = DailyEntry {
            date: input.date,
            mood: input.mood,
            energy: input.energy,
            sleep: input.sleep,
            habit_completions: input.habit_completions,
            notes: input.notes,
            health_score: 0.0,
            created_at: now,
            updated_at: now,
        };
        validate_entry(&entry)?;

        let impacts = HabitImpactMap::from_habits(&self.data.habits);
        entry.health_score = score_entry(&entry, &impacts);

        match self.entry_index(&entry.date) {
            Ok(idx) => {
                entry.created_at = self.data.entries[idx].created_at;
                debug!(date = %entry.date, score = entry.health_score, "updated entry");
                self.data.entries[idx] = entry.clone();
            }
            Err(idx) => {
                debug!(date = %entry.date, score = entry.health_score, "saved entry");
                self.data.entries.insert(idx, entry.clone());
            }
        }
        Ok(entry)
    }

    pub fn delete_entry(&mut self, date: &str) -> Result<DailyEntry, ComputeError> {
        let idx = self
            .entry_index(date)
            .map_err(|_| ComputeError::EntryNotFound(date.to_string()))?;

        debug!(date, "deleted entry");
        Ok(self.data.entries.remove(idx))
    }

    // ------------------------------------------------------------------
    // Bulk
    // ------------------------------------------------------------------

    /// Replace all data. Entries sharing a date collapse to the last one.
    ///
    /// Stored scores are taken as-is; call
    /// [`LifeflowStore::recalculate_scores`] to refresh them.
    pub fn load(&mut self, snapshot: Snapshot) {
        let Snapshot {
            habits,
            wishes,
            entries,
        } = snapshot;

        let mut by_date: Vec<DailyEntry> = Vec::with_capacity(entries.len());
        for entry in entries {
            match by_date.binary_search_by(|e| e.date.cmp(&entry.date)) {
                Ok(idx) => by_date[idx] = entry,
                Err(idx) => by_date.insert(idx, entry),
            }
        }

        debug!(
            habits = habits.len(),
            wishes = wishes.len(),
            entries = by_date.len(),
            "loaded snapshot"
        );
        self.data = Snapshot {
            habits,
            wishes,
            entries: by_date,
        };
    }

    pub fn clear(&mut self) {
        debug!("cleared all data");
        self.data = Snapshot::default();
    }

    /// Re-score every entry with the current habits; returns how many changed
    pub fn recalculate_scores(&mut self) -> usize {
        scoring::recalculate_scores(&mut self.data.entries, &self.data.habits)
    }

    // ------------------------------------------------------------------
    // Derived views
    // ------------------------------------------------------------------

    pub fn correlations(&self) -> Vec<HabitCorrelation> {
        calculate_correlations(&self.data.habits, &self.data.entries)
    }

    pub fn streaks(&self, today: NaiveDate) -> Vec<StreakInfo> {
        calculate_all_streaks(&self.data.habits, &self.data.entries, today)
    }

    pub fn weekly_summary(&self, today: NaiveDate) -> Option<WeeklySummary> {
        weekly_summary(&self.data.habits, &self.data.entries, today)
    }

    pub fn wish_report(&self, today: NaiveDate) -> WishReport {
        wish_report(
            &self.data.wishes,
            &self.data.habits,
            &self.data.entries,
            today,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::parse_date_key;
    use crate::types::WishMetric;
    use pretty_assertions::assert_eq;

    fn done(id: &str) -> HabitCompletion {
        HabitCompletion::new(id, true)
    }

    fn store_with_run() -> (LifeflowStore, String) {
        let mut store = LifeflowStore::new();
        let run = store
            .add_habit(NewHabit::new("Run", HabitType::Good, 8))
            .unwrap();
        (store, run.id)
    }

    #[test]
    fn test_add_habit_assigns_id_and_order() {
        let mut store = LifeflowStore::new();
        let a = store
            .add_habit(NewHabit::new("Run", HabitType::Good, 8))
            .unwrap();
        let b = store
            .add_habit(NewHabit::new("Phone", HabitType::Bad, 4))
            .unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(a.sort_order, 1);
        assert_eq!(b.sort_order, 2);
        assert!(b.active);
        assert!(b.created_at > 0);
    }

    #[test]
    fn test_add_habit_rejects_bad_weight() {
        let mut store = LifeflowStore::new();
        let result = store.add_habit(NewHabit::new("Run", HabitType::Good, 0));
        assert!(matches!(result, Err(ComputeError::Validation(_))));
        assert!(store.habits().is_empty());
    }

    #[test]
    fn test_save_entry_scores_and_keeps_order() {
        let (mut store, run) = store_with_run();

        store
            .save_entry(EntryInput::new("2024-03-02", 6.0, 6.0, 6.0))
            .unwrap();
        let saved = store
            .save_entry(
                EntryInput::new("2024-03-01", 6.0, 3.0, 3.0)
                    .with_completions(vec![done(&run)]),
            )
            .unwrap();

        assert_eq!(saved.health_score, 9.0);
        let dates: Vec<&str> = store.entries().iter().map(|e| e.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-03-01", "2024-03-02"]);
    }

    #[test]
    fn test_save_entry_overwrite_keeps_created_at() {
        let (mut store, _) = store_with_run();
        let first = store
            .save_entry(EntryInput::new("2024-03-01", 5.0, 5.0, 5.0))
            .unwrap();
        let second = store
            .save_entry(EntryInput::new("2024-03-01", 8.0, 8.0, 8.0))
            .unwrap();

        assert_eq!(store.entries().len(), 1);
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(store.entry("2024-03-01").unwrap().mood, 8.0);
    }

    #[test]
    fn test_save_entry_rejects_invalid_input() {
        let (mut store, _) = store_with_run();
        assert!(store
            .save_entry(EntryInput::new("2024-03-01", 0.0, 5.0, 5.0))
            .is_err());
        assert!(store
            .save_entry(EntryInput::new("03/01/2024", 5.0, 5.0, 5.0))
            .is_err());
        assert!(store.entries().is_empty());
    }

    #[test]
    fn test_weight_change_rescores_history() {
        let mut store = LifeflowStore::new();
        let run = store
            .add_habit(NewHabit::new("Run", HabitType::Good, 8))
            .unwrap();
        let read = store
            .add_habit(NewHabit::new("Read", HabitType::Good, 8))
            .unwrap();
        store
            .save_entry(
                EntryInput::new("2024-03-01", 5.0, 5.0, 5.0).with_completions(vec![
                    done(&run.id),
                    HabitCompletion::new(&read.id, false),
                ]),
            )
            .unwrap();
        assert_eq!(store.entries()[0].health_score, 7.5);

        store
            .update_habit(
                &run.id,
                HabitUpdate {
                    weight: Some(2),
                    ..HabitUpdate::default()
                },
            )
            .unwrap();

        // 2 / 10 * 5 = 1
        assert_eq!(store.entries()[0].health_score, 6.0);
        let impacts = HabitImpactMap::from_habits(store.habits());
        for entry in store.entries() {
            assert_eq!(entry.health_score, score_entry(entry, &impacts));
        }
    }

    #[test]
    fn test_archive_removes_habit_from_engines() {
        let (mut store, run) = store_with_run();
        for (date, mood) in [("2024-03-08", 5.0), ("2024-03-09", 7.0), ("2024-03-10", 8.0)] {
            store
                .save_entry(
                    EntryInput::new(date, mood, 5.0, 5.0).with_completions(vec![done(&run)]),
                )
                .unwrap();
        }
        let today = parse_date_key("2024-03-10").unwrap();
        assert_eq!(store.streaks(today).len(), 1);
        assert_eq!(store.correlations().len(), 1);

        let archived = store.archive_habit(&run).unwrap();
        assert!(!archived.active);
        assert!(store.streaks(today).is_empty());
        assert!(store.correlations().is_empty());
        assert_eq!(store.entry("2024-03-10").unwrap().health_score, 6.0);
    }

    #[test]
    fn test_update_unknown_habit() {
        let mut store = LifeflowStore::new();
        let result = store.update_habit("ghost", HabitUpdate::default());
        assert!(matches!(result, Err(ComputeError::HabitNotFound(id)) if id == "ghost"));
    }

    #[test]
    fn test_reorder_habits() {
        let mut store = LifeflowStore::new();
        let a = store.add_habit(NewHabit::new("A", HabitType::Good, 3)).unwrap();
        let b = store.add_habit(NewHabit::new("B", HabitType::Good, 3)).unwrap();

        store.reorder_habits(&[&b.id, "ghost", &a.id]);
        assert_eq!(store.habit(&b.id).unwrap().sort_order, 1);
        assert_eq!(store.habit(&a.id).unwrap().sort_order, 3);
    }

    #[test]
    fn test_wish_lifecycle() {
        let (mut store, run) = store_with_run();
        let wish = store
            .add_wish(Wish::habit("draft", "Run more", &run, 3))
            .unwrap();
        assert_ne!(wish.id, "draft");

        let mut edited = wish.clone();
        edited.target_per_week = Some(5);
        let updated = store.update_wish(edited).unwrap();
        assert_eq!(updated.created_at, wish.created_at);
        assert_eq!(store.wishes()[0].target_per_week, Some(5));

        store.delete_wish(&wish.id).unwrap();
        assert!(store.wishes().is_empty());
        assert!(matches!(
            store.delete_wish(&wish.id),
            Err(ComputeError::WishNotFound(_))
        ));
    }

    #[test]
    fn test_metric_wish_report_from_store() {
        let mut store = LifeflowStore::new();
        store
            .add_wish(Wish::metric("m", "Mood", WishMetric::Mood, 8.0))
            .unwrap();
        store
            .save_entry(EntryInput::new("2024-03-10", 6.0, 5.0, 5.0))
            .unwrap();

        let report = store.wish_report(parse_date_key("2024-03-10").unwrap());
        assert_eq!(report.metric_wishes[0].delta, -2.0);
    }

    #[test]
    fn test_delete_entry() {
        let (mut store, _) = store_with_run();
        store
            .save_entry(EntryInput::new("2024-03-01", 5.0, 5.0, 5.0))
            .unwrap();

        assert_eq!(store.delete_entry("2024-03-01").unwrap().date, "2024-03-01");
        assert!(matches!(
            store.delete_entry("2024-03-01"),
            Err(ComputeError::EntryNotFound(_))
        ));
    }

    #[test]
    fn test_load_dedupes_and_sorts_then_clear() {
        let snapshot = Snapshot {
            habits: vec![Habit::new("run", "Run", HabitType::Good, 8)],
            wishes: Vec::new(),
            entries: vec![
                DailyEntry::new("2024-03-02", 5.0, 5.0, 5.0),
                DailyEntry::new("2024-03-01", 4.0, 4.0, 4.0),
                DailyEntry::new("2024-03-02", 9.0, 9.0, 9.0),
            ],
        };

        let mut store = LifeflowStore::from_snapshot(snapshot);
        assert_eq!(store.entries().len(), 2);
        assert_eq!(store.entries()[0].date, "2024-03-01");
        assert_eq!(store.entry("2024-03-02").unwrap().mood, 9.0);

        assert_eq!(store.recalculate_scores(), 2);
        assert_eq!(store.recalculate_scores(), 0);

        store.clear();
        assert!(store.snapshot().habits.is_empty());
        assert!(store.entries().is_empty());
    }
}
