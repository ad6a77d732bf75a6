//! Pending work items and the source they come from.
//!
//! A [`Task`] is an immutable snapshot taken at the start of a planning
//! run; the core never writes back to the source.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TaskSourceError;

pub mod taskwarrior;

pub use taskwarrior::TaskWarrior;

/// A pending work item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    /// Stable, opaque identifier; doubles as the calendar correlation key.
    pub uuid: String,
    /// Display text.
    pub description: String,
    /// Non-negative urgency score from the source.
    pub urgency: f64,
    /// Days since the task was created.
    pub age_days: f64,
    /// Optional deadline. Carried through but not yet weighted.
    pub due: Option<DateTime<Utc>>,
}

impl Task {
    /// Construct a task with no deadline.
    pub fn new(uuid: impl Into<String>, description: impl Into<String>, urgency: f64, age_days: f64) -> Self {
        Self {
            uuid: uuid.into(),
            description: description.into(),
            urgency,
            age_days,
            due: None,
        }
    }
}

/// Source of pending tasks.
///
/// Implementations must return only tasks that still need doing; completed
/// tasks never reach the planner.
pub trait TaskSource {
    /// Snapshot of the currently pending tasks, in source order.
    fn pending_tasks(&self) -> Result<Vec<Task>, TaskSourceError>;
}
