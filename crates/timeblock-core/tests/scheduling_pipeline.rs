//! End-to-end pipeline tests over an in-memory calendar store:
//! tasks -> scheduler -> plan -> reconciliation -> store.

use std::cell::{Cell, RefCell};

use chrono::{DateTime, TimeZone, Utc};
use timeblock_core::{
    CalendarError, CalendarItem, CalendarStore, CapacityPolicy, ItemDraft, PlanError, Reconciler,
    Scheduler, SchedulerConfig, SyncStep, Task,
};

/// In-memory store honoring the CalendarStore contract; `fail_after`
/// makes the (n+1)-th create fail to simulate a mid-apply interruption.
#[derive(Default)]
struct MemoryStore {
    items: RefCell<Vec<CalendarItem>>,
    creates: Cell<usize>,
    fail_after: Cell<Option<usize>>,
}

impl MemoryStore {
    fn with_items(items: Vec<CalendarItem>) -> Self {
        Self {
            items: RefCell::new(items),
            ..Self::default()
        }
    }
}

impl CalendarStore for MemoryStore {
    fn list_items(&self, include_completed: bool) -> Result<Vec<CalendarItem>, CalendarError> {
        Ok(self
            .items
            .borrow()
            .iter()
            .filter(|item| include_completed || !item.completed)
            .cloned()
            .collect())
    }

    fn create_item(&self, draft: &ItemDraft) -> Result<CalendarItem, CalendarError> {
        if let Some(limit) = self.fail_after.get() {
            if self.creates.get() >= limit {
                return Err(CalendarError::UnexpectedStatus {
                    operation: format!("create {}", draft.correlation_key),
                    status: 503,
                });
            }
        }
        let mut items = self.items.borrow_mut();
        if items
            .iter()
            .any(|item| item.task_uuid.as_deref() == Some(draft.correlation_key.as_str()))
        {
            return Err(CalendarError::AlreadyExists {
                key: draft.correlation_key.clone(),
            });
        }
        self.creates.set(self.creates.get() + 1);
        let item = CalendarItem {
            href: format!("/cal/{}.ics", draft.correlation_key),
            task_uuid: Some(draft.correlation_key.clone()),
            summary: draft.summary.clone(),
            start: Some(draft.start),
            duration_minutes: Some(draft.duration_minutes),
            completed: false,
        };
        items.push(item.clone());
        Ok(item)
    }

    fn delete_item(&self, item: &CalendarItem) -> Result<(), CalendarError> {
        self.items.borrow_mut().retain(|i| i.href != item.href);
        Ok(())
    }
}

fn config_1day_2slots() -> SchedulerConfig {
    SchedulerConfig {
        ideal_energy_per_day: 5,
        horizon_days: 1,
        slot_minutes: 60,
        day_start_hour: 10,
        day_end_hour: 11,
    }
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 17, 10, 0, 0).unwrap()
}

/// Zero-age tasks weigh `1 + urgency`, so urgency pins the weight.
fn task(uuid: &str, description: &str, urgency: f64) -> Task {
    Task::new(uuid, description, urgency, 0.0)
}

fn stored_item(key: &str, summary: &str, at: DateTime<Utc>) -> CalendarItem {
    CalendarItem {
        href: format!("/cal/{key}.ics"),
        task_uuid: Some(key.to_string()),
        summary: summary.to_string(),
        start: Some(at),
        duration_minutes: Some(60),
        completed: false,
    }
}

#[test]
fn heavier_task_lands_in_the_earlier_slot() {
    // Scenario A.
    let scheduler = Scheduler::new(config_1day_2slots()).unwrap();
    let tasks = vec![task("t1", "urgent thing", 9.0), task("t2", "casual thing", 0.0)];

    let plan = scheduler.plan(&tasks, start()).unwrap();

    assert_eq!(plan.len(), 2);
    assert_eq!(plan.items()[0].task.uuid, "t1");
    assert_eq!(plan.items()[0].planned_at, start());
    assert_eq!(plan.items()[1].task.uuid, "t2");
    assert_eq!(
        plan.items()[1].planned_at,
        Utc.with_ymd_and_hms(2026, 3, 17, 11, 0, 0).unwrap()
    );
}

#[test]
fn oversubscription_fails_under_strict_policy() {
    // Scenario B: 3 tasks into 2 slots.
    let scheduler = Scheduler::new(config_1day_2slots())
        .unwrap()
        .with_capacity_policy(CapacityPolicy::Fail);
    let tasks = vec![
        task("a", "one", 1.0),
        task("b", "two", 2.0),
        task("c", "three", 3.0),
    ];

    let err = scheduler.plan(&tasks, start()).unwrap_err();
    assert!(matches!(
        err,
        PlanError::CapacityExceeded {
            pending: 3,
            capacity: 2
        }
    ));
}

#[test]
fn no_pending_tasks_means_empty_plan_and_no_sync_steps() {
    // Scenario C.
    let scheduler = Scheduler::new(config_1day_2slots()).unwrap();
    let plan = scheduler.plan(&[], start()).unwrap();
    assert!(plan.is_empty());

    let store = MemoryStore::default();
    let sync = Reconciler::plan_against_store(&plan, &store).unwrap();
    assert!(sync.is_empty());
}

#[test]
fn stale_entry_is_the_only_mutation() {
    // Scenario D: T1 already in the store and still desired, T3 stale.
    let scheduler = Scheduler::new(config_1day_2slots()).unwrap();
    let plan = scheduler
        .plan(&[task("t1", "urgent thing", 9.0)], start())
        .unwrap();

    let store = MemoryStore::with_items(vec![
        stored_item("t1", "urgent thing", start()),
        stored_item("t3", "old thing", start()),
    ]);

    let sync = Reconciler::plan_against_store(&plan, &store).unwrap();
    assert_eq!(sync.len(), 1);
    match &sync.steps()[0] {
        SyncStep::Delete(item) => assert_eq!(item.task_uuid.as_deref(), Some("t3")),
        other => panic!("expected a single delete, got {other:?}"),
    }

    sync.apply(&store).unwrap();
    let left = store.list_items(true).unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].task_uuid.as_deref(), Some("t1"));
}

#[test]
fn full_run_then_rerun_converges_to_no_steps() {
    let scheduler = Scheduler::new(config_1day_2slots()).unwrap();
    let tasks = vec![task("t1", "urgent thing", 9.0), task("t2", "casual thing", 0.0)];
    let plan = scheduler.plan(&tasks, start()).unwrap();

    let store = MemoryStore::default();
    let first = Reconciler::plan_against_store(&plan, &store).unwrap();
    assert_eq!(first.apply(&store).unwrap(), 2);

    // Correlation keys round-tripped through the store.
    let listed = store.list_items(true).unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().any(|i| i.task_uuid.as_deref() == Some("t1")));
    assert!(listed.iter().any(|i| i.task_uuid.as_deref() == Some("t2")));

    let second = Reconciler::plan_against_store(&plan, &store).unwrap();
    assert!(second.is_empty());
}

#[test]
fn interrupted_apply_converges_on_the_next_run() {
    let scheduler = Scheduler::new(config_1day_2slots()).unwrap();
    let tasks = vec![task("t1", "urgent thing", 9.0), task("t2", "casual thing", 0.0)];
    let plan = scheduler.plan(&tasks, start()).unwrap();

    let store = MemoryStore::default();
    store.fail_after.set(Some(1));

    let first = Reconciler::plan_against_store(&plan, &store).unwrap();
    let err = first.apply(&store).unwrap_err();
    let err_text = err.to_string();
    assert!(err_text.contains("casual thing"), "unexpected error: {err_text}");

    // One entry made it in before the failure.
    assert_eq!(store.list_items(true).unwrap().len(), 1);

    // Next run picks up exactly the remaining work.
    store.fail_after.set(None);
    let second = Reconciler::plan_against_store(&plan, &store).unwrap();
    assert_eq!(second.len(), 1);
    assert_eq!(second.steps()[0].correlation_key(), "t2");
    second.apply(&store).unwrap();

    let third = Reconciler::plan_against_store(&plan, &store).unwrap();
    assert!(third.is_empty());
}

#[test]
fn replanning_a_shrunk_task_set_deletes_the_leftovers() {
    let scheduler = Scheduler::new(config_1day_2slots()).unwrap();
    let store = MemoryStore::default();

    let full = scheduler
        .plan(
            &[task("t1", "urgent thing", 9.0), task("t2", "casual thing", 0.0)],
            start(),
        )
        .unwrap();
    Reconciler::plan_against_store(&full, &store)
        .unwrap()
        .apply(&store)
        .unwrap();

    // t2 got completed upstream; the next snapshot no longer carries it.
    let shrunk = scheduler
        .plan(&[task("t1", "urgent thing", 9.0)], start())
        .unwrap();
    let sync = Reconciler::plan_against_store(&shrunk, &store).unwrap();
    assert_eq!(sync.len(), 1);
    sync.apply(&store).unwrap();

    let listed = store.list_items(true).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].task_uuid.as_deref(), Some("t1"));
}

#[test]
fn empty_plan_is_distinct_from_infeasibility() {
    let scheduler = Scheduler::new(config_1day_2slots()).unwrap();
    let empty = scheduler.plan(&[], start()).unwrap();
    assert!(empty.is_empty());
    assert!(empty.assignment().is_none());

    // A solved plan retains its raw assignment for diagnostics.
    let solved = scheduler
        .plan(&[task("t1", "urgent thing", 9.0)], start())
        .unwrap();
    assert!(solved.assignment().is_some());
}

#[test]
fn plan_preview_never_mutates_the_store() {
    let scheduler = Scheduler::new(config_1day_2slots()).unwrap();
    let plan = scheduler
        .plan(&[task("t1", "urgent thing", 9.0)], start())
        .unwrap();

    let store = MemoryStore::with_items(vec![stored_item("t3", "old thing", start())]);
    let sync = Reconciler::plan_against_store(&plan, &store).unwrap();

    let lines = sync.diagnose();
    assert_eq!(lines.len(), 2);

    // Both entries untouched after the preview.
    assert_eq!(store.list_items(true).unwrap().len(), 1);
    assert_eq!(store.creates.get(), 0);
}
