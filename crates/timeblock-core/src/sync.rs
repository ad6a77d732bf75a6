//! Reconciliation of a desired schedule against the calendar store.
//!
//! The order is always list, then diff, then apply: every current item is
//! read first (completed ones included, since a completed entry still
//! occupies its correlation key), the diff produces the minimal step
//! sequence, and only applying the plan mutates the store. Items the
//! store holds that match a desired item are left untouched, which is
//! what makes a repeated run converge to an empty plan.
//!
//! There is no transaction across steps. An interrupted apply leaves the
//! store partially updated; recomputing the diff from fresh store state
//! picks up exactly the remaining work.

use std::collections::{HashMap, HashSet};

use crate::calendar::{CalendarItem, CalendarStore, ItemDraft};
use crate::error::{CalendarError, SyncError};
use crate::plan::{ScheduleItem, SchedulingPlan};

/// One calendar mutation.
#[derive(Debug, Clone)]
pub enum SyncStep {
    /// Create an entry for a newly scheduled task.
    Add(ScheduleItem),
    /// Remove an entry whose task is no longer in the schedule.
    Delete(CalendarItem),
}

impl SyncStep {
    /// Human-readable, side-effect-free rendering of the step.
    pub fn describe(&self) -> String {
        match self {
            SyncStep::Add(item) => format!(
                "Adding {} at {}",
                item.task.description,
                item.planned_at.format("%Y-%m-%d %H:%M")
            ),
            SyncStep::Delete(item) => format!("Removing {}", item.summary),
        }
    }

    /// The correlation key this step acts on.
    pub fn correlation_key(&self) -> &str {
        match self {
            SyncStep::Add(item) => item.correlation_key(),
            SyncStep::Delete(item) => item.task_uuid.as_deref().unwrap_or(""),
        }
    }

    fn apply(&self, store: &dyn CalendarStore) -> Result<(), CalendarError> {
        match self {
            SyncStep::Add(item) => {
                match store.create_item(&ItemDraft::from_schedule_item(item)) {
                    Ok(_) => Ok(()),
                    // Someone else created it since the diff; the entry is
                    // there, which is all this step wanted.
                    Err(CalendarError::AlreadyExists { .. }) => Ok(()),
                    Err(e) => Err(e),
                }
            }
            SyncStep::Delete(item) => store.delete_item(item),
        }
    }
}

/// Ordered, single-use sequence of calendar mutations.
#[derive(Debug, Clone, Default)]
pub struct SyncPlan {
    steps: Vec<SyncStep>,
}

impl SyncPlan {
    pub fn steps(&self) -> &[SyncStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Preview: one line per step, no store access at all.
    pub fn diagnose(&self) -> Vec<String> {
        self.steps.iter().map(SyncStep::describe).collect()
    }

    /// Perform each step against the store, one at a time, in order.
    ///
    /// Returns the number of steps applied.
    ///
    /// # Errors
    ///
    /// [`SyncError::StepFailed`] with the failing step's description and
    /// correlation key. Steps already applied stay applied; rerunning
    /// reconciliation afterwards converges.
    pub fn apply(&self, store: &dyn CalendarStore) -> Result<usize, SyncError> {
        for step in &self.steps {
            step.apply(store).map_err(|source| SyncError::StepFailed {
                step: step.describe(),
                key: step.correlation_key().to_string(),
                source,
            })?;
        }
        Ok(self.steps.len())
    }
}

/// Computes the minimal mutation sequence for a desired schedule.
pub struct Reconciler;

impl Reconciler {
    /// Pure diff of a desired plan against the store's current items.
    ///
    /// - desired task with no current entry: `Add`
    /// - current entry whose task is still desired: no step
    /// - current entry whose task is not desired: `Delete`
    /// - current entry without a correlation key: not ours, never touched
    ///
    /// Adds come out in plan order, deletes in store order; the two act
    /// on disjoint keys, so relative order between them carries no
    /// meaning.
    pub fn plan(desired: &SchedulingPlan, current: &[CalendarItem]) -> SyncPlan {
        let current_keys: HashMap<&str, &CalendarItem> = current
            .iter()
            .filter_map(|item| item.task_uuid.as_deref().map(|key| (key, item)))
            .collect();

        let mut steps = Vec::new();
        let mut still_desired: HashSet<&str> = HashSet::new();

        for item in desired.items() {
            let key = item.correlation_key();
            if current_keys.contains_key(key) {
                still_desired.insert(key);
            } else {
                steps.push(SyncStep::Add(item.clone()));
            }
        }

        for item in current {
            if let Some(key) = item.task_uuid.as_deref() {
                if !still_desired.contains(key) {
                    steps.push(SyncStep::Delete(item.clone()));
                }
            }
        }

        SyncPlan { steps }
    }

    /// List the store (completed included), then diff.
    ///
    /// # Errors
    ///
    /// [`SyncError::ListFailed`] if the store cannot be read; no diff is
    /// attempted against partial state.
    pub fn plan_against_store(
        desired: &SchedulingPlan,
        store: &dyn CalendarStore,
    ) -> Result<SyncPlan, SyncError> {
        let current = store.list_items(true).map_err(SyncError::ListFailed)?;
        Ok(Self::plan(desired, &current))
    }
}
