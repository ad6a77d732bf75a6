//! TaskWarrior task source.
//!
//! Shells out to the `task` binary and parses its JSON export. Only
//! pending tasks are requested, so completed work never reaches the
//! planner.

use std::process::Command;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use super::{Task, TaskSource};
use crate::error::TaskSourceError;

/// TaskWarrior export timestamp format, e.g. `20260314T093000Z`.
const EXPORT_TIME_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Task source backed by a local TaskWarrior installation.
#[derive(Debug, Clone)]
pub struct TaskWarrior {
    binary: String,
}

impl TaskWarrior {
    pub fn new() -> Self {
        Self {
            binary: "task".into(),
        }
    }

    /// Use a non-default `task` binary.
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for TaskWarrior {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskSource for TaskWarrior {
    fn pending_tasks(&self) -> Result<Vec<Task>, TaskSourceError> {
        let output = Command::new(&self.binary)
            .args([
                "rc.json.array=on",
                "rc.verbose=nothing",
                "rc.confirmation=off",
                "export",
                "status:pending",
            ])
            .output()
            .map_err(|e| TaskSourceError::Launch {
                command: self.binary.clone(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(TaskSourceError::ExitStatus {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_export(&stdout, Utc::now())
    }
}

/// One record of the TaskWarrior JSON export; only the fields the planner
/// reads.
#[derive(Debug, Deserialize)]
struct ExportRecord {
    uuid: String,
    description: String,
    #[serde(default)]
    urgency: f64,
    entry: Option<String>,
    due: Option<String>,
}

/// Parse a TaskWarrior JSON export into task snapshots.
///
/// Age is derived from the `entry` timestamp against `now`; records
/// without one are treated as brand new.
fn parse_export(json: &str, now: DateTime<Utc>) -> Result<Vec<Task>, TaskSourceError> {
    let records: Vec<ExportRecord> =
        serde_json::from_str(json).map_err(|e| TaskSourceError::Parse(e.to_string()))?;

    Ok(records
        .into_iter()
        .map(|record| {
            let age_days = record
                .entry
                .as_deref()
                .and_then(parse_export_time)
                .map(|entry| (now - entry).num_seconds() as f64 / 86_400.0)
                .map(|days| days.max(0.0))
                .unwrap_or(0.0);

            Task {
                uuid: record.uuid,
                description: record.description,
                urgency: record.urgency.max(0.0),
                age_days,
                due: record.due.as_deref().and_then(parse_export_time),
            }
        })
        .collect())
}

fn parse_export_time(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, EXPORT_TIME_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}
