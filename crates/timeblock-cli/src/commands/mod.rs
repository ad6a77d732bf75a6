pub mod apply;
pub mod auth;
pub mod completions;
pub mod config;
pub mod plan;

use chrono::Local;
use timeblock_core::{
    next_planning_start, CapacityPolicy, Config, Scheduler, SchedulingPlan, TaskSource,
    TaskWarrior,
};

/// Run the planning half of the pipeline: tasks in, schedule out.
///
/// Returns the plan and the pending-task count; fewer items than pending
/// tasks means the capacity policy truncated.
pub(crate) fn compute_plan(
    config: &Config,
    strict_capacity: bool,
) -> Result<(SchedulingPlan, usize), Box<dyn std::error::Error>> {
    config.scheduler.validate()?;

    let source = TaskWarrior::with_binary(&config.tasks.taskwarrior_bin);
    let tasks = source.pending_tasks()?;
    let pending = tasks.len();

    let start = next_planning_start(&config.scheduler, Local::now())
        .ok_or("cannot resolve tomorrow's planning start in the local timezone")?;

    let policy = if strict_capacity {
        CapacityPolicy::Fail
    } else {
        CapacityPolicy::TruncateByWeight
    };
    let scheduler = Scheduler::new(config.scheduler.clone())?.with_capacity_policy(policy);
    let plan = scheduler.plan(&tasks, start)?;
    Ok((plan, pending))
}

/// Print the schedule in local time, one line per item.
pub(crate) fn print_schedule(plan: &SchedulingPlan, pending: usize) {
    if plan.is_empty() {
        println!("no pending tasks, nothing to plan");
        return;
    }
    if plan.len() < pending {
        println!(
            "planning the {} highest-weight of {} pending tasks",
            plan.len(),
            pending
        );
    }
    for item in plan.items() {
        let local = item.planned_at.with_timezone(&Local);
        println!("{}  {}", local.format("%a %Y-%m-%d %H:%M"), item.task.description);
    }
}
