//! The external calendar store interface.
//!
//! Calendar items are owned by the store; the core reads, creates, and
//! deletes them only through [`CalendarStore`]. Each managed item embeds
//! the originating task's identifier under [`TASK_UUID_PROPERTY`], which
//! must survive round-trips through the store unmodified.

use chrono::{DateTime, Utc};

use crate::error::CalendarError;
use crate::plan::ScheduleItem;

pub mod caldav;
pub mod ics;

pub use caldav::CaldavStore;

/// Custom property carrying the correlation key in each calendar entry.
pub const TASK_UUID_PROPERTY: &str = "X-TASKWARRIOR-UUID";

/// A calendar entry as the store currently holds it.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarItem {
    /// Store-side address of the entry, used for deletion.
    pub href: String,
    /// Correlation key, if the entry is managed by this system.
    pub task_uuid: Option<String>,
    pub summary: String,
    pub start: Option<DateTime<Utc>>,
    pub duration_minutes: Option<u32>,
    pub completed: bool,
}

/// Everything needed to create one managed calendar entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDraft {
    pub correlation_key: String,
    pub start: DateTime<Utc>,
    pub duration_minutes: u32,
    pub summary: String,
}

impl ItemDraft {
    pub fn from_schedule_item(item: &ScheduleItem) -> Self {
        Self {
            correlation_key: item.task.uuid.clone(),
            start: item.planned_at,
            duration_minutes: item.duration_minutes,
            summary: item.task.description.clone(),
        }
    }
}

/// The calendar store capability.
pub trait CalendarStore {
    /// Current entries. Completed entries still occupy their correlation
    /// key, so reconciliation always asks for them.
    fn list_items(&self, include_completed: bool) -> Result<Vec<CalendarItem>, CalendarError>;

    /// Create an entry. Must fail with [`CalendarError::AlreadyExists`]
    /// rather than overwrite when the correlation key is already present.
    fn create_item(&self, draft: &ItemDraft) -> Result<CalendarItem, CalendarError>;

    /// Delete an entry; deleting an already-absent entry is success.
    fn delete_item(&self, item: &CalendarItem) -> Result<(), CalendarError>;
}
