//! Core error types for timeblock-core.
//!
//! One enum per concern, aggregated into [`CoreError`] so callers can take
//! the whole pipeline behind a single error type when they do not care
//! which stage failed.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for timeblock-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Planning / optimization errors
    #[error("Planning error: {0}")]
    Plan(#[from] PlanError),

    /// Calendar store errors
    #[error("Calendar error: {0}")]
    Calendar(#[from] CalendarError),

    /// Reconciliation errors
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// Task source errors
    #[error("Task source error: {0}")]
    TaskSource(#[from] TaskSourceError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
///
/// All of these are surfaced before any planning attempt.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key (get/set by dot path)
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}

/// Errors from building or solving the slot-assignment model.
#[derive(Error, Debug)]
pub enum PlanError {
    /// More pending tasks than assignable slots.
    #[error("Capacity exceeded: {pending} pending tasks but only {capacity} assignable slots")]
    CapacityExceeded { pending: usize, capacity: usize },

    /// The model admits no assignment. Distinct from "zero pending tasks",
    /// which is a valid empty plan.
    #[error("No feasible assignment exists for the current model")]
    Infeasible,

    /// The solver returned an assignment that violates the model invariants.
    #[error("Solver contract violation: {reason}")]
    InvalidAssignment { reason: String },

    /// Instance too large for the selected solving engine.
    #[error("Model too large for this solver: {tasks} tasks (limit {limit})")]
    ModelTooLarge { tasks: usize, limit: usize },
}

/// Calendar store operation errors.
#[derive(Error, Debug)]
pub enum CalendarError {
    /// HTTP transport failure
    #[error("Calendar request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with an unexpected status
    #[error("Calendar server returned {status} for {operation}")]
    UnexpectedStatus { operation: String, status: u16 },

    /// An item with this correlation key already exists; creates never
    /// overwrite.
    #[error("Calendar item for task {key} already exists")]
    AlreadyExists { key: String },

    /// Response body could not be interpreted
    #[error("Failed to parse calendar response: {0}")]
    Parse(String),

    /// Credential lookup failed
    #[error("Calendar credentials unavailable: {0}")]
    Credentials(String),

    /// Client-side setup failure (runtime, URL construction)
    #[error("Calendar client error: {0}")]
    Client(String),
}

/// Reconciliation errors.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Listing the store's current items failed before any diff was made.
    #[error("Failed to list calendar items: {0}")]
    ListFailed(#[source] CalendarError),

    /// A mutation step failed mid-apply. The store is left partially
    /// updated; rerunning reconciliation from fresh store state converges.
    #[error("Sync step failed ({step}, task {key}): {source}")]
    StepFailed {
        step: String,
        key: String,
        #[source]
        source: CalendarError,
    },
}

/// Task source errors.
#[derive(Error, Debug)]
pub enum TaskSourceError {
    /// The source process could not be launched
    #[error("Failed to launch task source '{command}': {message}")]
    Launch { command: String, message: String },

    /// The source process exited with a failure status
    #[error("Task source exited with {status}: {stderr}")]
    ExitStatus { status: String, stderr: String },

    /// Export payload could not be parsed
    #[error("Failed to parse task export: {0}")]
    Parse(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
