//! Materialization of a solved assignment into concrete timestamps.
//!
//! A [`SchedulingPlan`] is constructed once per planning run and read-only
//! afterward. The raw solver assignment is retained for diagnostics.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::PlanError;
use crate::grid::{Slot, SlotGrid};
use crate::solver::{Assignment, AssignmentModel};
use crate::task::Task;

/// A committed (task, slot) pairing with its resolved wall-clock time.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleItem {
    pub task: Task,
    pub slot: Slot,
    pub planned_at: DateTime<Utc>,
    pub duration_minutes: u32,
}

impl ScheduleItem {
    /// The correlation key this item carries into the calendar.
    pub fn correlation_key(&self) -> &str {
        &self.task.uuid
    }
}

/// The solved schedule: one item per scheduled task, ordered by planned
/// time.
#[derive(Debug, Clone, Default)]
pub struct SchedulingPlan {
    items: Vec<ScheduleItem>,
    assignment: Option<Assignment>,
}

impl SchedulingPlan {
    /// The valid result of planning zero pending tasks.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Resolve a solved assignment to timestamps.
    ///
    /// Re-validates the serial-capacity invariant before exposing the
    /// plan; a violation here means the solving engine broke its
    /// contract.
    ///
    /// # Errors
    ///
    /// [`PlanError::InvalidAssignment`] on any constraint violation.
    pub fn from_assignment(
        tasks: &[Task],
        assignment: Assignment,
        grid: &SlotGrid,
    ) -> Result<Self, PlanError> {
        let model = AssignmentModel::new(
            grid.horizon_days(),
            grid.slots_per_day(),
            vec![0.0; tasks.len()],
            vec![0.0; tasks.len()],
        )?;
        model.check(&assignment)?;

        let mut items: Vec<ScheduleItem> = assignment
            .iter()
            .map(|(task, slot)| ScheduleItem {
                task: tasks[task].clone(),
                slot,
                planned_at: grid.instant(slot),
                duration_minutes: grid.slot_minutes(),
            })
            .collect();
        items.sort_by_key(|item| item.planned_at);

        Ok(Self {
            items,
            assignment: Some(assignment),
        })
    }

    pub fn items(&self) -> &[ScheduleItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The raw solver output this plan was materialized from, if any.
    pub fn assignment(&self) -> Option<&Assignment> {
        self.assignment.as_ref()
    }
}
