use std::fmt::{Display, Formatter};
use std::sync::LazyLock;

use rand::{Rng, distributions::Alphanumeric, thread_rng};
use serde::{Deserialize, Serialize};

const ID_LEN: usize = 8;

pub const SLOT_MINUTES: u32 = 30;
pub const SLOTS_PER_DAY: usize = 48;
pub const DAY_MINUTES: u32 = 24 * 60;

static SLOT_TIMES: LazyLock<Vec<String>> = LazyLock::new(|| {
    (0..SLOTS_PER_DAY)
        .map(|slot| format!("{:02}:{:02}", slot / 2, (slot % 2) as u32 * SLOT_MINUTES))
        .collect()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeError {
    InvalidFormat(String),
}

impl Display for TimeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeError::InvalidFormat(raw) => write!(f, "not a valid HH:MM time: '{raw}'"),
        }
    }
}

impl std::error::Error for TimeError {}

pub fn slot_times() -> &'static [String] {
    &SLOT_TIMES
}

pub fn slot_time(slot: usize) -> &'static str {
    &SLOT_TIMES[slot]
}

pub fn slot_of_minutes(minutes: u32) -> usize {
    ((minutes / SLOT_MINUTES) as usize).min(SLOTS_PER_DAY - 1)
}

fn split_time(raw: &str) -> Result<(u32, u32), TimeError> {
    let invalid = || TimeError::InvalidFormat(raw.to_string());
    let (hour, minute) = raw.trim().split_once(':').ok_or_else(invalid)?;
    let hour = hour.trim().parse::<u32>().map_err(|_| invalid())?;
    let minute = minute.trim().parse::<u32>().map_err(|_| invalid())?;
    Ok((hour, minute))
}

pub fn to_minutes(time: &str) -> Result<u32, TimeError> {
    let (hour, minute) = split_time(time)?;
    if hour > 23 || minute > 59 {
        return Err(TimeError::InvalidFormat(time.to_string()));
    }
    Ok(hour * 60 + minute)
}

pub fn to_12_hour(time: &str) -> Result<String, TimeError> {
    let minutes = to_minutes(time)?;
    let (hour, minute) = (minutes / 60, minutes % 60);
    let suffix = if hour < 12 { "AM" } else { "PM" };
    let display_hour = match hour % 12 {
        0 => 12,
        other => other,
    };
    Ok(format!("{display_hour}:{minute:02} {suffix}"))
}

pub fn clamp_to_slot(raw: &str) -> Result<String, TimeError> {
    let (hour, minute) = split_time(raw)?;
    let hour = hour.min(23);
    let minute = if minute < SLOT_MINUTES { 0 } else { SLOT_MINUTES };
    Ok(format!("{hour:02}:{minute:02}"))
}

pub fn normalize_interval(raw_start: &str, raw_end: &str) -> Result<(String, String), TimeError> {
    let start = clamp_to_slot(raw_start)?;
    let end = clamp_to_slot(raw_end)?;
    if to_minutes(&start)? > to_minutes(&end)? {
        Ok((end, start))
    } else {
        Ok((start, end))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Urgent,
    High,
    Normal,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Urgent,
        Priority::High,
        Priority::Normal,
        Priority::Low,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Priority::Urgent => "Urgent",
            Priority::High => "High",
            Priority::Normal => "Normal",
            Priority::Low => "Low",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Priority::Urgent => "urgent",
            Priority::High => "high",
            Priority::Normal => "normal",
            Priority::Low => "low",
        }
    }

    pub fn from_key(key: &str) -> Option<Priority> {
        Priority::ALL
            .into_iter()
            .find(|priority| priority.key() == key)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub start: String,
    pub end: String,
    pub color: String,
    pub priority: Priority,
}

impl Task {
    pub fn short_title(&self) -> String {
        self.title
            .lines()
            .next()
            .unwrap_or("(untitled)")
            .to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub time: String,
    pub title: String,
    pub priority: Priority,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DayRecord {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub notes: Vec<Note>,
}

#[derive(Debug, Clone)]
pub struct Day {
    record: DayRecord,
    version: u64,
}

impl Day {
    pub fn new(record: DayRecord) -> Self {
        Self { record, version: 0 }
    }

    pub fn record(&self) -> &DayRecord {
        &self.record
    }

    pub fn tasks(&self) -> &[Task] {
        &self.record.tasks
    }

    pub fn notes(&self) -> &[Note] {
        &self.record.notes
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.record.tasks.iter().find(|task| task.id == id)
    }

    pub fn note(&self, id: &str) -> Option<&Note> {
        self.record.notes.iter().find(|note| note.id == id)
    }

    pub fn notes_in_slot(&self, slot: usize) -> Vec<&Note> {
        self.record
            .notes
            .iter()
            .filter(|note| {
                to_minutes(&note.time)
                    .map(|minutes| slot_of_minutes(minutes) == slot)
                    .unwrap_or(false)
            })
            .collect()
    }

    pub fn add_task(
        &mut self,
        title: String,
        description: String,
        raw_start: &str,
        raw_end: &str,
        priority: Priority,
        color: String,
    ) -> Result<String, TimeError> {
        let (start, end) = normalize_interval(raw_start, raw_end)?;
        let id = generate_id();
        self.record.tasks.push(Task {
            id: id.clone(),
            title,
            description,
            start,
            end,
            color,
            priority,
        });
        self.version += 1;
        Ok(id)
    }

    pub fn add_note(
        &mut self,
        title: String,
        raw_time: &str,
        priority: Priority,
    ) -> Result<String, TimeError> {
        let time = clamp_to_slot(raw_time)?;
        let id = generate_id();
        self.record.notes.push(Note {
            id: id.clone(),
            time,
            title,
            priority,
        });
        self.version += 1;
        Ok(id)
    }

    pub fn remove_task(&mut self, id: &str) -> Result<(), String> {
        let before = self.record.tasks.len();
        self.record.tasks.retain(|task| task.id != id);
        if self.record.tasks.len() == before {
            return Err(format!("task not found: {id}"));
        }
        self.version += 1;
        Ok(())
    }

    pub fn remove_note(&mut self, id: &str) -> Result<(), String> {
        let before = self.record.notes.len();
        self.record.notes.retain(|note| note.id != id);
        if self.record.notes.len() == before {
            return Err(format!("note not found: {id}"));
        }
        self.version += 1;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageIndex {
    by_slot: Vec<Vec<String>>,
}

impl CoverageIndex {
    pub fn build(tasks: &[Task]) -> Self {
        let mut by_slot = vec![Vec::new(); SLOTS_PER_DAY];
        for task in tasks {
            let Ok(start) = to_minutes(&task.start) else {
                continue;
            };
            let Ok(end) = to_minutes(&task.end) else {
                continue;
            };
            // Both endpoints inclusive: a task is shown in the slot its end
            // time lands on, so start == end still occupies one slot.
            for (slot, ids) in by_slot.iter_mut().enumerate() {
                let slot_minutes = slot as u32 * SLOT_MINUTES;
                if slot_minutes >= start && slot_minutes <= end && !ids.contains(&task.id) {
                    ids.push(task.id.clone());
                }
            }
        }
        Self { by_slot }
    }

    pub fn tasks_in_slot(&self, slot: usize) -> &[String] {
        &self.by_slot[slot]
    }

    pub fn is_covered(&self, slot: usize) -> bool {
        !self.by_slot[slot].is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDuration {
    pub task_id: String,
    pub minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayStats {
    pub scheduled_minutes: u32,
    pub free_minutes: u32,
    pub by_priority: Vec<(Priority, u32)>,
    pub durations: Vec<TaskDuration>,
}

fn occupied_slots<'a>(tasks: impl Iterator<Item = &'a Task>) -> [bool; SLOTS_PER_DAY] {
    let mut occupied = [false; SLOTS_PER_DAY];
    for task in tasks {
        let Ok(start) = to_minutes(&task.start) else {
            continue;
        };
        let Ok(end) = to_minutes(&task.end) else {
            continue;
        };
        // Half-open [start, end): a task ending exactly on a slot boundary
        // does not count toward that slot, and start == end counts nowhere.
        if end <= start {
            continue;
        }
        let first = slot_of_minutes(start);
        let last = slot_of_minutes(end - 1);
        for slot in occupied.iter_mut().take(last + 1).skip(first) {
            *slot = true;
        }
    }
    occupied
}

pub fn scheduled_minutes(tasks: &[Task]) -> u32 {
    let occupied = occupied_slots(tasks.iter());
    occupied.iter().filter(|slot| **slot).count() as u32 * SLOT_MINUTES
}

pub fn free_minutes(tasks: &[Task]) -> u32 {
    DAY_MINUTES.saturating_sub(scheduled_minutes(tasks))
}

pub fn by_priority_minutes(tasks: &[Task]) -> Vec<(Priority, u32)> {
    Priority::ALL
        .into_iter()
        .map(|priority| {
            let occupied = occupied_slots(tasks.iter().filter(|task| task.priority == priority));
            let minutes = occupied.iter().filter(|slot| **slot).count() as u32 * SLOT_MINUTES;
            (priority, minutes)
        })
        .collect()
}

pub fn per_task_durations(tasks: &[Task]) -> Vec<TaskDuration> {
    let mut indexed = tasks.iter().collect::<Vec<_>>();
    indexed.sort_by_key(|task| to_minutes(&task.start).unwrap_or(0));
    indexed
        .into_iter()
        .map(|task| {
            let start = to_minutes(&task.start).unwrap_or(0);
            let end = to_minutes(&task.end).unwrap_or(0);
            TaskDuration {
                task_id: task.id.clone(),
                minutes: end.saturating_sub(start),
            }
        })
        .collect()
}

pub fn day_stats(tasks: &[Task]) -> DayStats {
    DayStats {
        scheduled_minutes: scheduled_minutes(tasks),
        free_minutes: free_minutes(tasks),
        by_priority: by_priority_minutes(tasks),
        durations: per_task_durations(tasks),
    }
}

pub fn generate_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_LEN)
        .map(char::from)
        .collect()
}

pub fn format_minutes(minutes: u32) -> String {
    format!("{}:{:02}", minutes / 60, minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, start: &str, end: &str, priority: Priority) -> Task {
        Task {
            id: id.to_string(),
            title: format!("task {id}"),
            description: String::new(),
            start: start.to_string(),
            end: end.to_string(),
            color: "blue".to_string(),
            priority,
        }
    }

    #[test]
    fn enumerates_all_slot_times() {
        let times = slot_times();
        assert_eq!(times.len(), SLOTS_PER_DAY);
        assert_eq!(times[0], "00:00");
        assert_eq!(times[1], "00:30");
        assert_eq!(times[47], "23:30");
    }

    #[test]
    fn converts_to_minutes_and_rejects_garbage() {
        assert_eq!(to_minutes("09:30").expect("valid time"), 570);
        assert_eq!(to_minutes("00:00").expect("valid time"), 0);
        assert_eq!(to_minutes("23:59").expect("valid time"), 1439);
        assert!(to_minutes("24:00").is_err());
        assert!(to_minutes("09:60").is_err());
        assert!(to_minutes("nine o'clock").is_err());
        assert!(to_minutes("0930").is_err());
    }

    #[test]
    fn renders_12_hour_clock() {
        assert_eq!(to_12_hour("09:00").expect("valid time"), "9:00 AM");
        assert_eq!(to_12_hour("00:30").expect("valid time"), "12:30 AM");
        assert_eq!(to_12_hour("12:00").expect("valid time"), "12:00 PM");
        assert_eq!(to_12_hour("15:30").expect("valid time"), "3:30 PM");
        assert_eq!(to_12_hour("23:30").expect("valid time"), "11:30 PM");
    }

    #[test]
    fn clamps_out_of_range_components_instead_of_rejecting() {
        assert_eq!(clamp_to_slot("9:14").expect("parseable"), "09:00");
        assert_eq!(clamp_to_slot("9:45").expect("parseable"), "09:30");
        assert_eq!(clamp_to_slot("23:59").expect("parseable"), "23:30");
        assert_eq!(clamp_to_slot("99:99").expect("parseable"), "23:30");
        assert!(clamp_to_slot("not a time").is_err());
    }

    #[test]
    fn normalize_orders_and_aligns_the_pair() {
        let (start, end) = normalize_interval("10:15", "09:40").expect("parseable");
        assert_eq!(start, "09:30");
        assert_eq!(end, "10:00");
        assert!(to_minutes(&start).expect("aligned") <= to_minutes(&end).expect("aligned"));
    }

    #[test]
    fn normalize_is_idempotent() {
        let (start, end) = normalize_interval("08:10", "11:50").expect("parseable");
        let again = normalize_interval(&start, &end).expect("parseable");
        assert_eq!(again, (start, end));
    }

    #[test]
    fn coverage_includes_both_endpoints() {
        let tasks = vec![task("a", "09:00", "10:00", Priority::Normal)];
        let index = CoverageIndex::build(&tasks);
        let covered = (0..SLOTS_PER_DAY)
            .filter(|slot| index.is_covered(*slot))
            .collect::<Vec<_>>();
        assert_eq!(covered, vec![18, 19, 20]);
    }

    #[test]
    fn zero_length_task_covers_one_slot_but_schedules_nothing() {
        let tasks = vec![task("a", "12:00", "12:00", Priority::Normal)];
        let index = CoverageIndex::build(&tasks);
        assert!(index.is_covered(24));
        assert!(!index.is_covered(23));
        assert!(!index.is_covered(25));
        assert_eq!(scheduled_minutes(&tasks), 0);
        assert_eq!(per_task_durations(&tasks)[0].minutes, 0);
    }

    #[test]
    fn overlapping_tasks_do_not_double_count() {
        let tasks = vec![
            task("a", "09:00", "10:00", Priority::Normal),
            task("b", "09:30", "10:30", Priority::Normal),
        ];
        assert_eq!(scheduled_minutes(&tasks), 90);
        assert_eq!(free_minutes(&tasks), DAY_MINUTES - 90);
    }

    #[test]
    fn scheduled_and_free_minutes_complement() {
        let tasks = vec![
            task("a", "00:00", "08:00", Priority::High),
            task("b", "07:00", "09:30", Priority::Low),
            task("c", "22:00", "23:30", Priority::Normal),
        ];
        assert_eq!(scheduled_minutes(&tasks) + free_minutes(&tasks), DAY_MINUTES);
    }

    #[test]
    fn priorities_de_overlap_independently() {
        let tasks = vec![
            task("a", "09:00", "10:00", Priority::Urgent),
            task("b", "09:00", "10:00", Priority::Normal),
        ];
        assert_eq!(scheduled_minutes(&tasks), 60);
        let by_priority = by_priority_minutes(&tasks);
        assert_eq!(by_priority[0], (Priority::Urgent, 60));
        assert_eq!(by_priority[1], (Priority::High, 0));
        assert_eq!(by_priority[2], (Priority::Normal, 60));
        assert_eq!(by_priority[3], (Priority::Low, 0));
    }

    #[test]
    fn durations_sort_by_start_with_stable_ties() {
        let tasks = vec![
            task("late", "14:00", "15:00", Priority::Normal),
            task("first_tie", "09:00", "09:30", Priority::Normal),
            task("second_tie", "09:00", "11:00", Priority::Normal),
        ];
        let durations = per_task_durations(&tasks);
        let order = durations
            .iter()
            .map(|entry| entry.task_id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(order, vec!["first_tie", "second_tie", "late"]);
        assert_eq!(durations[0].minutes, 30);
        assert_eq!(durations[1].minutes, 120);
        assert_eq!(durations[2].minutes, 60);
    }

    #[test]
    fn day_mutations_bump_version_and_normalize_input() {
        let mut day = Day::new(DayRecord::default());
        let task_id = day
            .add_task(
                "Standup".to_string(),
                String::new(),
                "9:05",
                "8:40",
                Priority::High,
                "green".to_string(),
            )
            .expect("task should be created");
        assert_eq!(day.version(), 1);

        let stored = day.task(&task_id).expect("task should be stored");
        assert_eq!(stored.start, "08:30");
        assert_eq!(stored.end, "09:00");

        let note_id = day
            .add_note("Call back".to_string(), "13:40", Priority::Urgent)
            .expect("note should be created");
        assert_eq!(
            day.note(&note_id).expect("note should be stored").time,
            "13:30"
        );
        assert_eq!(day.notes_in_slot(27).len(), 1);
        assert_eq!(day.version(), 2);

        day.remove_task(&task_id).expect("task should be removed");
        assert!(day.remove_task(&task_id).is_err());
        day.remove_note(&note_id).expect("note should be removed");
        assert_eq!(day.version(), 4);
        assert!(day.tasks().is_empty());
        assert!(day.notes().is_empty());
    }

    #[test]
    fn empty_day_degrades_to_zero() {
        let stats = day_stats(&[]);
        assert_eq!(stats.scheduled_minutes, 0);
        assert_eq!(stats.free_minutes, DAY_MINUTES);
        assert!(stats.durations.is_empty());
        assert!(stats.by_priority.iter().all(|(_, minutes)| *minutes == 0));
    }
}
