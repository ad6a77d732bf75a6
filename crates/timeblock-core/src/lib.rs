//! # Timeblock Core Library
//!
//! Core business logic for Timeblock: plan pending work items into
//! discrete calendar slots, then reconcile the result against a CalDAV
//! collection. The CLI binary is a thin layer over this library.
//!
//! ## Pipeline
//!
//! TaskSource -> [`WeightModel`] -> [`Scheduler`] (over a [`SlotGrid`])
//! -> [`SchedulingPlan`] -> [`Reconciler`] -> [`CalendarStore`]
//!
//! One invocation is one synchronous planning run: the task and calendar
//! snapshots are read once and treated as immutable for the run.
//!
//! ## Key Components
//!
//! - [`Scheduler`]: builds the slot-assignment model and drives a
//!   [`SlotSolver`] engine
//! - [`Reconciler`]: diffs a plan against the store and emits a minimal,
//!   idempotent sequence of mutations
//! - [`CaldavStore`]: CalDAV VTODO implementation of [`CalendarStore`]
//! - [`Config`]: TOML configuration management

pub mod calendar;
pub mod config;
pub mod error;
pub mod grid;
pub mod plan;
pub mod scheduler;
pub mod secrets;
pub mod solver;
pub mod sync;
pub mod task;
pub mod weight;

pub use calendar::{CaldavStore, CalendarItem, CalendarStore, ItemDraft, TASK_UUID_PROPERTY};
pub use config::{CalendarConfig, Config, SchedulerConfig, TasksConfig};
pub use error::{
    CalendarError, ConfigError, CoreError, PlanError, SyncError, TaskSourceError,
};
pub use grid::{next_planning_start, Slot, SlotGrid};
pub use plan::{ScheduleItem, SchedulingPlan};
pub use scheduler::{CapacityPolicy, Scheduler};
pub use solver::{Assignment, AssignmentModel, ExhaustiveSolver, GreedySolver, SlotSolver};
pub use sync::{Reconciler, SyncPlan, SyncStep};
pub use task::{Task, TaskSource, TaskWarrior};
pub use weight::WeightModel;
