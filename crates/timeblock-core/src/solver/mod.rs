//! Slot-assignment model and the solving capability behind it.
//!
//! The model encodes the scheduling problem declaratively:
//! - **C1**: every task is assigned to exactly one slot.
//! - **C2**: processing is serial per day — for every day and every slot
//!   prefix `[0, t]`, at most `t + 1` tasks occupy that prefix.
//! - **Objective**: minimize `sum_j weight_j * (slot_index_in_day + energy_j)`,
//!   which rewards placing heavier tasks in earlier in-day positions.
//!
//! Engines implement [`SlotSolver`]; swapping the engine does not change the
//! model. [`GreedySolver`] is the default and is optimal under the current
//! constraint set; [`ExhaustiveSolver`] searches the same model directly and
//! is the natural seat for future side constraints.

use crate::error::PlanError;
use crate::grid::Slot;

mod exhaustive;
mod greedy;

pub use exhaustive::ExhaustiveSolver;
pub use greedy::GreedySolver;

/// A solved task-to-slot mapping; index `j` holds task `j`'s slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    slots: Vec<Slot>,
}

impl Assignment {
    pub fn new(slots: Vec<Slot>) -> Self {
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot assigned to task `j`. Panics if out of range; callers index
    /// with task indices from the same model.
    pub fn slot_of(&self, task: usize) -> Slot {
        self.slots[task]
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, Slot)> + '_ {
        self.slots.iter().copied().enumerate()
    }
}

/// Declarative form of one planning run: grid dimensions plus per-task
/// weights and energy costs.
#[derive(Debug, Clone)]
pub struct AssignmentModel {
    n_days: u32,
    slots_per_day: u32,
    weights: Vec<f64>,
    energy: Vec<f64>,
}

impl AssignmentModel {
    /// Build a model.
    ///
    /// # Errors
    ///
    /// [`PlanError::CapacityExceeded`] when more tasks than slots reach the
    /// model — the caller must truncate or fail, the model never solves
    /// over-subscribed. [`PlanError::InvalidAssignment`] when the weight and
    /// energy vectors disagree in length.
    pub fn new(
        n_days: u32,
        slots_per_day: u32,
        weights: Vec<f64>,
        energy: Vec<f64>,
    ) -> Result<Self, PlanError> {
        if weights.len() != energy.len() {
            return Err(PlanError::InvalidAssignment {
                reason: format!(
                    "{} weights but {} energy costs",
                    weights.len(),
                    energy.len()
                ),
            });
        }
        let capacity = (n_days * slots_per_day) as usize;
        if weights.len() > capacity {
            return Err(PlanError::CapacityExceeded {
                pending: weights.len(),
                capacity,
            });
        }
        Ok(Self {
            n_days,
            slots_per_day,
            weights,
            energy,
        })
    }

    pub fn n_tasks(&self) -> usize {
        self.weights.len()
    }

    pub fn n_days(&self) -> u32 {
        self.n_days
    }

    pub fn slots_per_day(&self) -> u32 {
        self.slots_per_day
    }

    pub fn capacity(&self) -> usize {
        (self.n_days * self.slots_per_day) as usize
    }

    pub fn weight(&self, task: usize) -> f64 {
        self.weights[task]
    }

    pub fn energy(&self, task: usize) -> f64 {
        self.energy[task]
    }

    /// Objective value of an assignment under this model.
    pub fn objective(&self, assignment: &Assignment) -> f64 {
        assignment
            .iter()
            .map(|(task, slot)| self.weights[task] * (slot.index as f64 + self.energy[task]))
            .sum()
    }

    /// Verify C1 and C2 over an assignment.
    ///
    /// # Errors
    ///
    /// [`PlanError::InvalidAssignment`] naming the violated constraint.
    pub fn check(&self, assignment: &Assignment) -> Result<(), PlanError> {
        if assignment.len() != self.n_tasks() {
            return Err(PlanError::InvalidAssignment {
                reason: format!(
                    "assignment covers {} tasks, model has {}",
                    assignment.len(),
                    self.n_tasks()
                ),
            });
        }

        // Per-day slot occupancy.
        let mut occupancy = vec![vec![0usize; self.slots_per_day as usize]; self.n_days as usize];
        for (task, slot) in assignment.iter() {
            if slot.day >= self.n_days || slot.index >= self.slots_per_day {
                return Err(PlanError::InvalidAssignment {
                    reason: format!(
                        "task {task} assigned to slot (day {}, index {}) outside the grid",
                        slot.day, slot.index
                    ),
                });
            }
            occupancy[slot.day as usize][slot.index as usize] += 1;
        }

        // C2: prefix [0, t] of any day holds at most t + 1 tasks.
        for (day, slots) in occupancy.iter().enumerate() {
            let mut prefix = 0usize;
            for (t, count) in slots.iter().enumerate() {
                prefix += count;
                if prefix > t + 1 {
                    return Err(PlanError::InvalidAssignment {
                        reason: format!(
                            "day {day}: {prefix} tasks in slot prefix [0, {t}] (capacity {})",
                            t + 1
                        ),
                    });
                }
            }
        }

        Ok(())
    }
}

/// A solving capability: given a model, return an optimal assignment or
/// report why none exists.
pub trait SlotSolver {
    fn solve(&self, model: &AssignmentModel) -> Result<Assignment, PlanError>;
}
