use std::fmt::{Display, Formatter};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::domain::DayRecord;

const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
    JsonEncode(serde_json::Error),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(err) => write!(f, "io error: {err}"),
            StorageError::JsonEncode(err) => write!(f, "failed to encode day record: {err}"),
        }
    }
}

impl std::error::Error for StorageError {}

pub fn date_key(day: NaiveDate) -> String {
    day.format(DATE_KEY_FORMAT).to_string()
}

pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, DATE_KEY_FORMAT).ok()
}

pub fn day_path(dir: &Path, day: NaiveDate) -> PathBuf {
    dir.join(format!("{}.json", date_key(day)))
}

pub fn load_day(dir: &Path, day: NaiveDate) -> Result<DayRecord, StorageError> {
    let raw = match fs::read_to_string(day_path(dir, day)) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(DayRecord::default()),
        Err(err) => return Err(StorageError::Io(err)),
    };

    if raw.trim().is_empty() {
        return Ok(DayRecord::default());
    }

    // A malformed record resets to empty; callers never learn why data was gone.
    Ok(serde_json::from_str(&raw).unwrap_or_default())
}

pub fn save_day(dir: &Path, day: NaiveDate, record: &DayRecord) -> Result<(), StorageError> {
    fs::create_dir_all(dir).map_err(StorageError::Io)?;
    let json = serde_json::to_string_pretty(record).map_err(StorageError::JsonEncode)?;
    fs::write(day_path(dir, day), json).map_err(StorageError::Io)
}

pub fn saved_days(dir: &Path) -> Result<Vec<NaiveDate>, StorageError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(StorageError::Io(err)),
    };

    let mut days = Vec::new();
    for entry in entries {
        let entry = entry.map_err(StorageError::Io)?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let Some(stem) = name.strip_suffix(".json") else {
            continue;
        };
        if let Some(day) = parse_date_key(stem) {
            days.push(day);
        }
    }

    days.sort_unstable();
    Ok(days)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use chrono::NaiveDate;

    use crate::domain::{Day, DayRecord, Priority};

    use super::{date_key, day_path, load_day, save_day, saved_days};

    fn temp_dir(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("{}_{}", name, std::process::id()));
        path
    }

    fn sample_day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).expect("date should be valid")
    }

    #[test]
    fn derives_date_keys() {
        assert_eq!(date_key(sample_day()), "2026-03-14");
        assert_eq!(
            day_path(&PathBuf::from("/tmp/plan"), sample_day()),
            PathBuf::from("/tmp/plan/2026-03-14.json")
        );
    }

    #[test]
    fn round_trips_a_day_record() {
        let mut day = Day::new(DayRecord::default());
        day.add_task(
            "Deep work".to_string(),
            "no meetings".to_string(),
            "09:00",
            "11:00",
            Priority::High,
            "blue".to_string(),
        )
        .expect("task should be created");
        day.add_note("Ship release".to_string(), "14:00", Priority::Urgent)
            .expect("note should be created");

        let dir = temp_dir("slotplan_storage_roundtrip");
        save_day(&dir, sample_day(), day.record()).expect("save should succeed");
        let loaded = load_day(&dir, sample_day()).expect("load should succeed");

        assert_eq!(loaded.tasks.len(), 1);
        assert_eq!(loaded.tasks[0].id, day.tasks()[0].id);
        assert_eq!(loaded.tasks[0].start, "09:00");
        assert_eq!(loaded.tasks[0].end, "11:00");
        assert_eq!(loaded.tasks[0].priority, Priority::High);
        assert_eq!(loaded.notes.len(), 1);
        assert_eq!(loaded.notes[0].time, "14:00");
        assert_eq!(loaded.notes[0].priority, Priority::Urgent);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn unset_key_loads_the_empty_record() {
        let dir = temp_dir("slotplan_storage_unset");
        let record = load_day(&dir, sample_day()).expect("load should succeed");
        assert!(record.tasks.is_empty());
        assert!(record.notes.is_empty());
    }

    #[test]
    fn malformed_record_resets_to_empty() {
        let dir = temp_dir("slotplan_storage_malformed");
        fs::create_dir_all(&dir).expect("dir should be created");
        fs::write(day_path(&dir, sample_day()), "{not json").expect("write should succeed");

        let record = load_day(&dir, sample_day()).expect("load should succeed");
        assert!(record.tasks.is_empty());
        assert!(record.notes.is_empty());
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn parses_the_persisted_wire_shape() {
        let raw = r#"{
            "tasks": [{"id": "a1b2c3d4", "title": "Standup", "description": "",
                       "start": "09:00", "end": "09:30",
                       "color": "green", "priority": "normal"}],
            "notes": [{"id": "e5f6a7b8", "time": "12:00", "title": "Lunch order",
                       "priority": "low"}]
        }"#;

        let dir = temp_dir("slotplan_storage_wire");
        fs::create_dir_all(&dir).expect("dir should be created");
        fs::write(day_path(&dir, sample_day()), raw).expect("write should succeed");

        let record = load_day(&dir, sample_day()).expect("load should succeed");
        assert_eq!(record.tasks[0].title, "Standup");
        assert_eq!(record.tasks[0].priority, Priority::Normal);
        assert_eq!(record.notes[0].time, "12:00");
        assert_eq!(record.notes[0].priority, Priority::Low);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn lists_saved_days_in_order() {
        let dir = temp_dir("slotplan_storage_saved_days");
        let first = NaiveDate::from_ymd_opt(2026, 1, 2).expect("date should be valid");
        let second = NaiveDate::from_ymd_opt(2026, 1, 10).expect("date should be valid");
        save_day(&dir, second, &DayRecord::default()).expect("save should succeed");
        save_day(&dir, first, &DayRecord::default()).expect("save should succeed");
        fs::write(dir.join("notes.txt"), "not a day").expect("write should succeed");

        assert_eq!(saved_days(&dir).expect("listing should succeed"), vec![first, second]);
        let _ = fs::remove_dir_all(dir);
    }
}
