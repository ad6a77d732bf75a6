//! Sort-and-fill solving engine.
//!
//! The objective charges a slot only by its index within its day, so the
//! grid factors into `n_days` parallel unit-capacity lines and equal-index
//! slots on different days cost the same. The exchange argument for
//! weighted completion time on parallel lines then gives the optimum
//! directly: rank tasks by descending weight and hand out slots by
//! ascending in-day index, sweeping the days at each index. Ties take the
//! earlier day, keeping the fill deterministic and chronological among
//! equal-cost slots.

use super::{Assignment, AssignmentModel, SlotSolver};
use crate::error::PlanError;
use crate::grid::Slot;

/// Direct sort-and-fill engine. Optimal while no availability or deadline
/// side constraints are active.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedySolver;

impl SlotSolver for GreedySolver {
    fn solve(&self, model: &AssignmentModel) -> Result<Assignment, PlanError> {
        let n = model.n_tasks();

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            model
                .weight(b)
                .total_cmp(&model.weight(a))
                .then(a.cmp(&b))
        });

        // Slots by ascending cost: index-major, then day for determinism.
        let mut fill = (0..model.slots_per_day())
            .flat_map(|index| (0..model.n_days()).map(move |day| Slot { day, index }));

        let mut slots = vec![Slot { day: 0, index: 0 }; n];
        for &task in &order {
            // Model construction caps n_tasks at capacity, so the fill
            // cannot run dry.
            let slot = fill.next().ok_or(PlanError::Infeasible)?;
            slots[task] = slot;
        }

        Ok(Assignment::new(slots))
    }
}
