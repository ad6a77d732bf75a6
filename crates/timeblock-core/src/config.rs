//! TOML-based application configuration.
//!
//! Stores:
//! - Scheduling parameters (planning horizon, slot length, day range)
//! - Calendar store coordinates (collection URL, username)
//! - Task source settings (TaskWarrior binary)
//!
//! Configuration is stored at `~/.config/timeblock/config.toml`. The
//! calendar password is never written here; it lives in the OS keyring
//! (see [`crate::secrets`]).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Returns `~/.config/timeblock[-dev]/` based on TIMEBLOCK_ENV.
///
/// Set TIMEBLOCK_ENV=dev to use a separate development data directory.
///
/// # Errors
/// Returns an error if the config directory cannot be created.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("TIMEBLOCK_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("timeblock-dev")
    } else {
        base_dir.join("timeblock")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::LoadFailed {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}

/// Scheduling parameters.
///
/// `day_start_hour`/`day_end_hour` bound the schedulable range within a day;
/// the number of slots per day is `day_end_hour - day_start_hour + 1`, each
/// `slot_minutes` long, starting at the start hour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Informational for now; no energy-budget constraint is enforced yet.
    #[serde(default = "default_ideal_energy")]
    pub ideal_energy_per_day: u32,
    /// How far ahead to plan, in days.
    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,
    /// Length of one schedulable slot, in minutes.
    #[serde(default = "default_slot_minutes")]
    pub slot_minutes: u32,
    /// First schedulable hour of the day (0-23).
    #[serde(default = "default_day_start_hour")]
    pub day_start_hour: u8,
    /// Last schedulable hour of the day (0-23), inclusive.
    #[serde(default = "default_day_end_hour")]
    pub day_end_hour: u8,
}

/// Calendar store coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// Absolute URL of the CalDAV collection holding the scheduled todos.
    #[serde(default)]
    pub collection_url: String,
    /// Username for HTTP basic auth. The password lives in the keyring.
    #[serde(default)]
    pub username: String,
}

/// Task source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    /// TaskWarrior binary to invoke for the pending-task export.
    #[serde(default = "default_taskwarrior_bin")]
    pub taskwarrior_bin: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/timeblock/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub tasks: TasksConfig,
}

// Default functions
fn default_ideal_energy() -> u32 {
    100
}
fn default_horizon_days() -> u32 {
    14
}
fn default_slot_minutes() -> u32 {
    60
}
fn default_day_start_hour() -> u8 {
    10
}
fn default_day_end_hour() -> u8 {
    16
}
fn default_taskwarrior_bin() -> String {
    "task".into()
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            ideal_energy_per_day: default_ideal_energy(),
            horizon_days: default_horizon_days(),
            slot_minutes: default_slot_minutes(),
            day_start_hour: default_day_start_hour(),
            day_end_hour: default_day_end_hour(),
        }
    }
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            collection_url: String::new(),
            username: String::new(),
        }
    }
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            taskwarrior_bin: default_taskwarrior_bin(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            calendar: CalendarConfig::default(),
            tasks: TasksConfig::default(),
        }
    }
}

impl SchedulerConfig {
    /// Number of schedulable slots in one day.
    pub fn slots_per_day(&self) -> u32 {
        (self.day_end_hour - self.day_start_hour) as u32 + 1
    }

    /// Maximum number of tasks that fit in the planning horizon.
    pub fn max_assignable(&self) -> usize {
        (self.horizon_days * self.slots_per_day()) as usize
    }

    /// Reject malformed scheduling parameters before any planning attempt.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.day_start_hour >= self.day_end_hour {
            return Err(ConfigError::InvalidValue {
                key: "scheduler.day_start_hour".into(),
                message: format!(
                    "start hour ({}) must be before end hour ({})",
                    self.day_start_hour, self.day_end_hour
                ),
            });
        }
        if self.day_end_hour > 23 {
            return Err(ConfigError::InvalidValue {
                key: "scheduler.day_end_hour".into(),
                message: format!("hour {} out of range (0-23)", self.day_end_hour),
            });
        }
        if self.horizon_days == 0 {
            return Err(ConfigError::InvalidValue {
                key: "scheduler.horizon_days".into(),
                message: "planning horizon must be at least one day".into(),
            });
        }
        if self.slot_minutes == 0 {
            return Err(ConfigError::InvalidValue {
                key: "scheduler.slot_minutes".into(),
                message: "slot length must be at least one minute".into(),
            });
        }
        // Slots of one day must not spill past midnight, or slot instants
        // would collide with the next day's.
        if (self.slots_per_day() - 1) * self.slot_minutes >= 24 * 60 {
            return Err(ConfigError::InvalidValue {
                key: "scheduler.slot_minutes".into(),
                message: format!(
                    "{} slots of {} minutes do not fit within one day",
                    self.slots_per_day(),
                    self.slot_minutes
                ),
            });
        }
        Ok(())
    }
}

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(_) => Self::load_from(&path),
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(&path)?;
                Ok(cfg)
            }
        }
    }

    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let root = toml::Value::try_from(self).ok()?;
        let mut current = &root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(match current {
            toml::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Set a config value by dot-separated key, parsing the raw string
    /// according to the existing value's type.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn set(&mut self, key: &str, raw: &str) -> Result<(), ConfigError> {
        let mut root = toml::Value::try_from(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;

        {
            let mut current = &mut root;
            let mut parts = key.split('.').peekable();
            loop {
                let part = parts.next().ok_or_else(|| ConfigError::UnknownKey(key.into()))?;
                let is_leaf = parts.peek().is_none();
                let entry = current
                    .get_mut(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.into()))?;
                if is_leaf {
                    *entry = parse_as(entry, raw).ok_or_else(|| ConfigError::InvalidValue {
                        key: key.to_string(),
                        message: format!("cannot parse '{raw}' as {}", entry.type_str()),
                    })?;
                    break;
                }
                current = entry;
            }
        }

        *self = root.try_into().map_err(|e: toml::de::Error| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }
}

/// Parse `raw` into the same TOML type as `existing`.
fn parse_as(existing: &toml::Value, raw: &str) -> Option<toml::Value> {
    match existing {
        toml::Value::String(_) => Some(toml::Value::String(raw.to_string())),
        toml::Value::Integer(_) => raw.parse::<i64>().ok().map(toml::Value::Integer),
        toml::Value::Float(_) => raw.parse::<f64>().ok().map(toml::Value::Float),
        toml::Value::Boolean(_) => raw.parse::<bool>().ok().map(toml::Value::Boolean),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.scheduler.horizon_days, 14);
        assert_eq!(parsed.scheduler.slot_minutes, 60);
        assert_eq!(parsed.tasks.taskwarrior_bin, "task");
    }

    #[test]
    fn derived_capacity_invariant() {
        let cfg = SchedulerConfig::default();
        // hours 10..=16 -> 7 slots per day, 14 days -> 98 assignable tasks
        assert_eq!(cfg.slots_per_day(), 7);
        assert_eq!(cfg.max_assignable(), 98);
    }

    #[test]
    fn validate_rejects_inverted_day_range() {
        let cfg = SchedulerConfig {
            day_start_hour: 16,
            day_end_hour: 10,
            ..SchedulerConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidValue { key, .. }) if key == "scheduler.day_start_hour"
        ));
    }

    #[test]
    fn validate_rejects_zero_horizon() {
        let cfg = SchedulerConfig {
            horizon_days: 0,
            ..SchedulerConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_slots_spilling_past_midnight() {
        let cfg = SchedulerConfig {
            day_start_hour: 0,
            day_end_hour: 23,
            slot_minutes: 90,
            ..SchedulerConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(SchedulerConfig::default().validate().is_ok());
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("scheduler.horizon_days").as_deref(), Some("14"));
        assert_eq!(cfg.get("tasks.taskwarrior_bin").as_deref(), Some("task"));
        assert!(cfg.get("scheduler.missing_key").is_none());
    }

    #[test]
    fn set_parses_according_to_existing_type() {
        let mut cfg = Config::default();
        cfg.set("scheduler.horizon_days", "7").unwrap();
        assert_eq!(cfg.scheduler.horizon_days, 7);

        cfg.set("calendar.username", "alice").unwrap();
        assert_eq!(cfg.calendar.username, "alice");
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("scheduler.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn set_rejects_unparsable_value() {
        let mut cfg = Config::default();
        assert!(cfg.set("scheduler.horizon_days", "not_a_number").is_err());
    }

    #[test]
    fn save_and_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut cfg = Config::default();
        cfg.scheduler.horizon_days = 3;
        cfg.calendar.collection_url = "https://dav.example.net/cal/".into();
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.scheduler.horizon_days, 3);
        assert_eq!(loaded.calendar.collection_url, "https://dav.example.net/cal/");
    }
}
