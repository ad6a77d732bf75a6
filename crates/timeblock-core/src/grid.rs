//! The discrete time grid the optimizer assigns into.
//!
//! A [`SlotGrid`] is a pure function of the scheduler configuration and a
//! planning-start instant: `horizon_days * slots_per_day` slots, ordered by
//! day then by index within the day, each mapping to a distinct wall-clock
//! instant.

use chrono::{DateTime, Days, Duration, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::config::SchedulerConfig;

/// One discrete, fixed-duration unit of schedulable time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    /// Day offset from the planning start, in `[0, horizon_days)`.
    pub day: u32,
    /// Position within the day, in `[0, slots_per_day)`.
    pub index: u32,
}

/// Finite ordered set of schedulable slots over the planning horizon.
#[derive(Debug, Clone)]
pub struct SlotGrid {
    start: DateTime<Utc>,
    horizon_days: u32,
    slots_per_day: u32,
    slot_minutes: u32,
}

impl SlotGrid {
    /// Build the grid for `config`, anchored at `start` (the instant of
    /// day 0, slot 0 — typically "tomorrow at the configured start hour").
    pub fn new(config: &SchedulerConfig, start: DateTime<Utc>) -> Self {
        Self {
            start,
            horizon_days: config.horizon_days,
            slots_per_day: config.slots_per_day(),
            slot_minutes: config.slot_minutes,
        }
    }

    /// Total number of slots in the grid.
    pub fn len(&self) -> usize {
        (self.horizon_days * self.slots_per_day) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn horizon_days(&self) -> u32 {
        self.horizon_days
    }

    pub fn slots_per_day(&self) -> u32 {
        self.slots_per_day
    }

    pub fn slot_minutes(&self) -> u32 {
        self.slot_minutes
    }

    /// All slots, ordered by day ascending then index ascending.
    pub fn slots(&self) -> impl Iterator<Item = Slot> + '_ {
        (0..self.horizon_days).flat_map(move |day| {
            (0..self.slots_per_day).map(move |index| Slot { day, index })
        })
    }

    /// Wall-clock instant of a slot:
    /// `start + day * 24h + index * slot_minutes`.
    pub fn instant(&self, slot: Slot) -> DateTime<Utc> {
        self.start
            + Duration::days(slot.day as i64)
            + Duration::minutes((slot.index * self.slot_minutes) as i64)
    }
}

/// The planning start used by the CLI: tomorrow at the configured start
/// hour, resolved in local time and converted to UTC.
///
/// Returns `None` only when the local wall-clock time does not exist
/// (a DST gap covering the start hour).
pub fn next_planning_start(config: &SchedulerConfig, now: DateTime<Local>) -> Option<DateTime<Utc>> {
    let tomorrow = now.date_naive().checked_add_days(Days::new(1))?;
    let naive = tomorrow.and_hms_opt(config.day_start_hour as u32, 0, 0)?;
    naive
        .and_local_timezone(Local)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}
