//! Branch-and-bound search over the assignment model.
//!
//! Searches injective task-to-slot mappings with partial-cost pruning.
//! Restricting to one task per slot loses no optimality: C2 caps prefix
//! occupancy by prefix length, so any feasible assignment can be
//! rearranged onto distinct slots at equal or lower cost.
//!
//! Exponential in the task count; guarded by `max_tasks`. Exists as the
//! reference engine behind the same [`SlotSolver`] seam the greedy fill
//! uses, and as the place where availability and deadline side
//! constraints would slot in.

use super::{Assignment, AssignmentModel, SlotSolver};
use crate::error::PlanError;
use crate::grid::Slot;

const DEFAULT_MAX_TASKS: usize = 8;

/// Exact engine for small instances.
#[derive(Debug, Clone, Copy)]
pub struct ExhaustiveSolver {
    max_tasks: usize,
}

impl ExhaustiveSolver {
    pub fn new() -> Self {
        Self {
            max_tasks: DEFAULT_MAX_TASKS,
        }
    }

    /// Raise or lower the instance-size guard.
    pub fn with_max_tasks(max_tasks: usize) -> Self {
        Self { max_tasks }
    }
}

impl Default for ExhaustiveSolver {
    fn default() -> Self {
        Self::new()
    }
}

struct Search<'a> {
    model: &'a AssignmentModel,
    slots: Vec<Slot>,
    used: Vec<bool>,
    current: Vec<Slot>,
    best_cost: f64,
    best: Option<Vec<Slot>>,
}

impl Search<'_> {
    fn run(&mut self, task: usize, cost: f64) {
        if cost >= self.best_cost {
            return;
        }
        if task == self.model.n_tasks() {
            self.best_cost = cost;
            self.best = Some(self.current.clone());
            return;
        }

        for i in 0..self.slots.len() {
            if self.used[i] {
                continue;
            }
            let slot = self.slots[i];
            let step =
                self.model.weight(task) * (slot.index as f64 + self.model.energy(task));

            self.used[i] = true;
            self.current.push(slot);
            self.run(task + 1, cost + step);
            self.current.pop();
            self.used[i] = false;
        }
    }
}

impl SlotSolver for ExhaustiveSolver {
    fn solve(&self, model: &AssignmentModel) -> Result<Assignment, PlanError> {
        let n = model.n_tasks();
        if n == 0 {
            return Ok(Assignment::new(Vec::new()));
        }
        if n > self.max_tasks {
            return Err(PlanError::ModelTooLarge {
                tasks: n,
                limit: self.max_tasks,
            });
        }

        // Cheapest slots first so the bound tightens early.
        let mut slots: Vec<Slot> = (0..model.n_days())
            .flat_map(|day| (0..model.slots_per_day()).map(move |index| Slot { day, index }))
            .collect();
        slots.sort_by_key(|slot| (slot.index, slot.day));

        let used = vec![false; slots.len()];
        let mut search = Search {
            model,
            slots,
            used,
            current: Vec::with_capacity(n),
            best_cost: f64::INFINITY,
            best: None,
        };
        search.run(0, 0.0);

        match search.best {
            Some(slots) => Ok(Assignment::new(slots)),
            None => Err(PlanError::Infeasible),
        }
    }
}
