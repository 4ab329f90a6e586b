use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::Priority;

const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClockFormat {
    #[default]
    Hour24,
    Hour12,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityColors {
    #[serde(default = "default_urgent_color")]
    pub urgent: String,
    #[serde(default = "default_high_color")]
    pub high: String,
    #[serde(default = "default_normal_color")]
    pub normal: String,
    #[serde(default = "default_low_color")]
    pub low: String,
}

impl PriorityColors {
    pub fn for_priority(&self, priority: Priority) -> &str {
        match priority {
            Priority::Urgent => &self.urgent,
            Priority::High => &self.high,
            Priority::Normal => &self.normal,
            Priority::Low => &self.low,
        }
    }
}

impl Default for PriorityColors {
    fn default() -> Self {
        Self {
            urgent: default_urgent_color(),
            high: default_high_color(),
            normal: default_normal_color(),
            low: default_low_color(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub clock: ClockFormat,
    #[serde(default = "default_day_start_hour")]
    pub day_start_hour: u8,
    #[serde(default = "default_task_color")]
    pub default_task_color: String,
    #[serde(default)]
    pub priority_colors: PriorityColors,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            clock: ClockFormat::Hour24,
            day_start_hour: default_day_start_hour(),
            default_task_color: default_task_color(),
            priority_colors: PriorityColors::default(),
        }
    }
}

impl Config {
    pub fn day_start_slot(&self) -> usize {
        self.day_start_hour.min(23) as usize * 2
    }
}

fn default_day_start_hour() -> u8 {
    8
}

fn default_task_color() -> String {
    "blue".to_string()
}

fn default_urgent_color() -> String {
    "light_red".to_string()
}

fn default_high_color() -> String {
    "light_yellow".to_string()
}

fn default_normal_color() -> String {
    "light_blue".to_string()
}

fn default_low_color() -> String {
    "dark_gray".to_string()
}

pub fn load_config(dir: &Path) -> Config {
    let path = dir.join(CONFIG_FILE);
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(_) => return Config::default(),
    };

    // Same silent-reset policy as the day store.
    toml::from_str(&raw).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use crate::domain::Priority;

    use super::{ClockFormat, Config, load_config};

    fn temp_dir(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("{}_{}", name, std::process::id()));
        path
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = load_config(&temp_dir("slotplan_config_missing"));
        assert_eq!(config, Config::default());
        assert_eq!(config.clock, ClockFormat::Hour24);
        assert_eq!(config.day_start_slot(), 16);
        assert_eq!(config.priority_colors.for_priority(Priority::Urgent), "light_red");
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = temp_dir("slotplan_config_partial");
        fs::create_dir_all(&dir).expect("dir should be created");
        fs::write(
            dir.join("config.toml"),
            "clock = \"hour12\"\nday_start_hour = 6\n\n[priority_colors]\nurgent = \"red\"\n",
        )
        .expect("write should succeed");

        let config = load_config(&dir);
        assert_eq!(config.clock, ClockFormat::Hour12);
        assert_eq!(config.day_start_slot(), 12);
        assert_eq!(config.priority_colors.for_priority(Priority::Urgent), "red");
        assert_eq!(config.priority_colors.for_priority(Priority::Low), "dark_gray");
        assert_eq!(config.default_task_color, "blue");
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn malformed_file_yields_defaults() {
        let dir = temp_dir("slotplan_config_malformed");
        fs::create_dir_all(&dir).expect("dir should be created");
        fs::write(dir.join("config.toml"), "clock = [broken").expect("write should succeed");

        assert_eq!(load_config(&dir), Config::default());
        let _ = fs::remove_dir_all(dir);
    }
}
