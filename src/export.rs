//! CSV and JSON export
//!
//! Both formats write stored values verbatim, including each entry's stored
//! consistency score; nothing is recomputed here.

use crate::error::ComputeError;
use crate::types::{DailyEntry, Habit, Snapshot, Wish};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// Version tag written into JSON exports
pub const EXPORT_VERSION: &str = "1.0";

/// Top-level JSON export document
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument<'a> {
    pub version: &'static str,
    pub exported_at: String,
    pub habits: &'a [Habit],
    pub wishes: &'a [Wish],
    pub entries: Vec<&'a DailyEntry>,
}

impl<'a> ExportDocument<'a> {
    pub fn new(snapshot: &'a Snapshot, exported_at: DateTime<Utc>) -> Self {
        Self {
            version: EXPORT_VERSION,
            exported_at: exported_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            habits: &snapshot.habits,
            wishes: &snapshot.wishes,
            entries: sorted_entries(snapshot),
        }
    }
}

fn sorted_entries(snapshot: &Snapshot) -> Vec<&DailyEntry> {
    let mut entries: Vec<&DailyEntry> = snapshot.entries.iter().collect();
    entries.sort_by(|a, b| a.date.cmp(&b.date));
    entries
}

fn csv_error(err: impl std::fmt::Display) -> ComputeError {
    ComputeError::EncodingError(format!("CSV export failed: {err}"))
}

/// One row per entry, one `true`/`false` column per active habit.
///
/// Habit columns follow `sort_order`; the header uses habit names.
pub fn export_csv(snapshot: &Snapshot) -> Result<String, ComputeError> {
    let mut habits: Vec<&Habit> = snapshot.habits.iter().filter(|h| h.active).collect();
    habits.sort_by_key(|h| h.sort_order);

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    let mut header = vec![
        "Date".to_string(),
        "Mood".to_string(),
        "Energy".to_string(),
        "Sleep".to_string(),
        "Consistency Score".to_string(),
    ];
    header.extend(habits.iter().map(|h| h.name.clone()));
    header.push("Notes".to_string());
    writer.write_record(&header).map_err(csv_error)?;

    for entry in sorted_entries(snapshot) {
        let mut row = vec![
            entry.date.clone(),
            entry.mood.to_string(),
            entry.energy.to_string(),
            entry.sleep.to_string(),
            entry.health_score.to_string(),
        ];
        row.extend(habits.iter().map(|h| entry.is_completed(&h.id).to_string()));
        row.push(entry.notes.clone());
        writer.write_record(&row).map_err(csv_error)?;
    }

    let bytes = writer.into_inner().map_err(csv_error)?;
    String::from_utf8(bytes).map_err(csv_error)
}

/// Pretty-printed JSON export document
pub fn export_json(snapshot: &Snapshot, exported_at: DateTime<Utc>) -> Result<String, ComputeError> {
    let document = ExportDocument::new(snapshot, exported_at);
    Ok(serde_json::to_string_pretty(&document)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HabitCompletion, HabitType};
    use chrono::TimeZone;

    fn snapshot() -> Snapshot {
        let mut run = Habit::new("run", "Run", HabitType::Good, 8);
        run.sort_order = 2;
        let mut phone = Habit::new("phone", "Phone, late", HabitType::Bad, 4);
        phone.sort_order = 1;
        let mut old = Habit::new("old", "Old", HabitType::Good, 2);
        old.active = false;

        let mut later = DailyEntry::new("2024-03-02", 7.0, 6.5, 8.0)
            .with_completions(vec![HabitCompletion::new("run", true)]);
        later.health_score = 9.3;
        later.notes = "long run, felt \"great\"\nslept early".to_string();
        let mut earlier = DailyEntry::new("2024-03-01", 5.0, 5.0, 5.0)
            .with_completions(vec![HabitCompletion::new("phone", true)]);
        earlier.health_score = 0.0;

        Snapshot {
            habits: vec![run, phone, old],
            wishes: Vec::new(),
            entries: vec![later, earlier],
        }
    }

    #[test]
    fn test_csv_header_and_rows() {
        let csv = export_csv(&snapshot()).unwrap();
        let mut lines = csv.lines();

        assert_eq!(
            lines.next().unwrap(),
            "Date,Mood,Energy,Sleep,Consistency Score,\"Phone, late\",Run,Notes"
        );
        assert_eq!(lines.next().unwrap(), "2024-03-01,5,5,5,0,true,false,");
    }

    #[test]
    fn test_csv_quotes_notes() {
        let csv = export_csv(&snapshot()).unwrap();
        assert!(csv.contains(
            "2024-03-02,7,6.5,8,9.3,false,true,\"long run, felt \"\"great\"\"\nslept early\"\n"
        ));

        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[1][7], "long run, felt \"great\"\nslept early");
    }

    #[test]
    fn test_json_document() {
        let at = Utc.with_ymd_and_hms(2024, 3, 3, 12, 0, 0).unwrap();
        let json = export_json(&snapshot(), at).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["version"], "1.0");
        assert_eq!(value["exportedAt"], "2024-03-03T12:00:00.000Z");
        assert_eq!(value["habits"].as_array().unwrap().len(), 3);
        assert_eq!(value["entries"][0]["date"], "2024-03-01");
        assert_eq!(value["entries"][1]["healthScore"], 9.3);
    }

    #[test]
    fn test_json_export_reads_back_as_snapshot() {
        let original = snapshot();
        let json = export_json(&original, Utc::now()).unwrap();
        let restored: Snapshot = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.habits, original.habits);
        assert_eq!(restored.entries[0].date, "2024-03-01");
    }
}
