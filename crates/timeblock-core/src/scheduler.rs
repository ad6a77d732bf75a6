//! Planning pipeline: tasks in, scheduling plan out.
//!
//! The [`Scheduler`] owns a validated configuration, a weight model, a
//! solving engine, and the capacity policy. One call to [`Scheduler::plan`]
//! is one synchronous planning run over an immutable task snapshot.

use chrono::{DateTime, Utc};

use crate::config::SchedulerConfig;
use crate::error::{ConfigError, PlanError};
use crate::grid::SlotGrid;
use crate::plan::SchedulingPlan;
use crate::solver::{AssignmentModel, GreedySolver, SlotSolver};
use crate::task::Task;
use crate::weight::WeightModel;

/// What to do when more tasks are pending than the horizon can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CapacityPolicy {
    /// Keep the highest-weight tasks up to capacity; ties keep source
    /// order. Deterministic, never drops high-priority work for low.
    #[default]
    TruncateByWeight,
    /// Refuse to plan and surface [`PlanError::CapacityExceeded`].
    Fail,
}

/// The slot-assignment planner.
pub struct Scheduler {
    config: SchedulerConfig,
    weight_model: WeightModel,
    solver: Box<dyn SlotSolver>,
    capacity_policy: CapacityPolicy,
}

impl Scheduler {
    /// Build a planner over a validated configuration, with the greedy
    /// engine and weight-ordered truncation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for malformed scheduling parameters.
    pub fn new(config: SchedulerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            weight_model: WeightModel::default(),
            solver: Box::new(GreedySolver),
            capacity_policy: CapacityPolicy::default(),
        })
    }

    /// Swap the solving engine.
    pub fn with_solver(mut self, solver: Box<dyn SlotSolver>) -> Self {
        self.solver = solver;
        self
    }

    pub fn with_weight_model(mut self, weight_model: WeightModel) -> Self {
        self.weight_model = weight_model;
        self
    }

    pub fn with_capacity_policy(mut self, policy: CapacityPolicy) -> Self {
        self.capacity_policy = policy;
        self
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// One planning run: weigh, select, solve, materialize.
    ///
    /// Zero pending tasks is success with an empty plan, never an error.
    ///
    /// # Errors
    ///
    /// [`PlanError::CapacityExceeded`] under [`CapacityPolicy::Fail`] when
    /// the task set outgrows the horizon; [`PlanError::Infeasible`] when
    /// the model admits no assignment.
    pub fn plan(&self, tasks: &[Task], start: DateTime<Utc>) -> Result<SchedulingPlan, PlanError> {
        if tasks.is_empty() {
            return Ok(SchedulingPlan::empty());
        }

        let selected = self.select(tasks)?;
        let weights: Vec<f64> = selected
            .iter()
            .map(|task| self.weight_model.weight(task))
            .collect();
        let energy: Vec<f64> = selected
            .iter()
            .map(|task| self.weight_model.energy_cost(task))
            .collect();

        let model = AssignmentModel::new(
            self.config.horizon_days,
            self.config.slots_per_day(),
            weights,
            energy,
        )?;
        let assignment = self.solver.solve(&model)?;

        let grid = SlotGrid::new(&self.config, start);
        SchedulingPlan::from_assignment(&selected, assignment, &grid)
    }

    /// Apply the capacity policy to the pending snapshot.
    fn select(&self, tasks: &[Task]) -> Result<Vec<Task>, PlanError> {
        let capacity = self.config.max_assignable();
        if tasks.len() <= capacity {
            return Ok(tasks.to_vec());
        }

        match self.capacity_policy {
            CapacityPolicy::Fail => Err(PlanError::CapacityExceeded {
                pending: tasks.len(),
                capacity,
            }),
            CapacityPolicy::TruncateByWeight => {
                let mut order: Vec<usize> = (0..tasks.len()).collect();
                order.sort_by(|&a, &b| {
                    self.weight_model
                        .weight(&tasks[b])
                        .total_cmp(&self.weight_model.weight(&tasks[a]))
                        .then(a.cmp(&b))
                });
                order.truncate(capacity);
                // Keep source order among the survivors.
                order.sort_unstable();
                Ok(order.into_iter().map(|i| tasks[i].clone()).collect())
            }
        }
    }
}
