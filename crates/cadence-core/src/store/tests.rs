use std::time::Duration;

use jiff::civil::{date, time, DateTime};
use tempfile::TempDir;

use super::*;
use crate::{
    db::Database,
    models::{BusyWindow, Category, Constraints, EnergyProfile, Priority},
    params::{EdgeParams, ScheduleParams},
};

fn essay() -> WorkItem {
    WorkItem {
        id: "essay".into(),
        title: "History essay".into(),
        category: Category::Homework,
        due: date(2026, 3, 6).at(17, 0, 0, 0),
        priority: Priority::High,
        estimated_minutes: 120,
        start_date: date(2026, 3, 2),
        user_steps: Vec::new(),
    }
}

fn now() -> DateTime {
    date(2026, 3, 2).at(8, 0, 0, 0)
}

fn params() -> ScheduleParams {
    ScheduleParams {
        now: now(),
        fixed_events: Vec::new(),
        constraints: Constraints {
            day_start: time(9, 0, 0, 0),
            day_end: time(12, 0, 0, 0),
            ..Constraints::default()
        },
        energy: EnergyProfile::flat(0.5),
    }
}

async fn memory_store() -> PlanStore {
    StoreBuilder::new().in_memory().build().await.unwrap()
}

fn step_ids(plan: &AssignmentPlan) -> Vec<String> {
    plan.graph.steps().iter().map(|s| s.id.clone()).collect()
}

#[tokio::test]
async fn test_generate_publishes_snapshot() {
    let store = memory_store().await;
    let mut updates = store.subscribe();
    let before = store.snapshot().version;

    let plan = store.generate_plan(essay()).await.unwrap();

    assert!(updates.has_changed().unwrap());
    let snapshot = updates.borrow_and_update().clone();
    assert_eq!(snapshot.version, before + 1);
    assert_eq!(snapshot.plan("essay"), Some(&plan));
    assert_eq!(store.list_plans().len(), 1);
}

#[tokio::test]
async fn test_rejected_edge_leaves_plan_unchanged() {
    let store = memory_store().await;
    let plan = store.generate_plan(essay()).await.unwrap();
    let ids = step_ids(&plan);
    let edge = |from: &str, to: &str| EdgeParams {
        work_item_id: "essay".into(),
        from: from.into(),
        to: to.into(),
    };

    store.add_edge(&edge(&ids[0], &ids[1])).await.unwrap();
    let version = store.snapshot().version;
    let before = store.snapshot().plan("essay").cloned();

    let err = store.add_edge(&edge(&ids[1], &ids[0])).await.unwrap_err();

    assert!(err.is_validation());
    assert_eq!(store.snapshot().version, version);
    assert_eq!(store.snapshot().plan("essay").cloned(), before);
}

#[tokio::test]
async fn test_completion_unblocks_and_drops_blocks() {
    let store = memory_store().await;
    let plan = store.generate_plan(essay()).await.unwrap();
    let ids = step_ids(&plan);
    store
        .add_edge(&EdgeParams {
            work_item_id: "essay".into(),
            from: ids[0].clone(),
            to: ids[1].clone(),
        })
        .await
        .unwrap();

    let result = store.schedule(&params()).await.unwrap();
    assert!(result.blocks_for(&ids[0]).next().is_some());
    assert!(result.blocks_for(&ids[1]).next().is_none());
    let title = &plan.graph.step(&ids[0]).unwrap().title;
    assert_eq!(
        store.snapshot().blocked_reason("essay", &ids[1]),
        Some(format!("Waiting on \"{title}\""))
    );

    let unblocked = store
        .complete_step(&StepRef {
            work_item_id: "essay".into(),
            step_id: ids[0].clone(),
        })
        .await
        .unwrap();

    assert_eq!(unblocked, vec![ids[1].clone()]);
    let schedule = store.current_schedule();
    assert!(schedule.blocks_for(&ids[0]).next().is_none());
    assert!(store.snapshot().blocked_reason("essay", &ids[1]).is_none());
}

#[tokio::test]
async fn test_reopen_drops_blocks_of_reblocked_dependents() {
    let store = memory_store().await;
    let plan = store.generate_plan(essay()).await.unwrap();
    let ids = step_ids(&plan);
    let first = StepRef {
        work_item_id: "essay".into(),
        step_id: ids[0].clone(),
    };
    store
        .add_edge(&EdgeParams {
            work_item_id: "essay".into(),
            from: ids[0].clone(),
            to: ids[1].clone(),
        })
        .await
        .unwrap();
    store.complete_step(&first).await.unwrap();
    let result = store.schedule(&params()).await.unwrap();
    assert!(result.blocks_for(&ids[1]).next().is_some());

    store.reopen_step(&first).await.unwrap();

    assert!(store.current_schedule().blocks_for(&ids[1]).next().is_none());
}

#[tokio::test]
async fn test_disabling_enforcement_schedules_everything() {
    let store = memory_store().await;
    let plan = store.generate_plan(essay()).await.unwrap();
    let ids = step_ids(&plan);
    store
        .add_edge(&EdgeParams {
            work_item_id: "essay".into(),
            from: ids[0].clone(),
            to: ids[1].clone(),
        })
        .await
        .unwrap();
    store
        .set_enforcement(&SetEnforcement {
            work_item_id: "essay".into(),
            enforce: false,
        })
        .await
        .unwrap();

    let result = store.schedule(&params()).await.unwrap();

    assert!(result.blocks_for(&ids[1]).next().is_some());
    assert_eq!(store.snapshot().schedulable_tasks().len(), ids.len());
}

#[tokio::test]
async fn test_locked_and_edited_steps_survive_regeneration() {
    let store = memory_store().await;
    let plan = store.generate_plan(essay()).await.unwrap();
    let ids = step_ids(&plan);
    store
        .edit_step(&EditStep {
            step: StepRef {
                work_item_id: "essay".into(),
                step_id: ids[0].clone(),
            },
            title: Some("Read sources".into()),
            ..EditStep::default()
        })
        .await
        .unwrap();
    store
        .lock_step(&LockStep {
            step: StepRef {
                work_item_id: "essay".into(),
                step_id: ids[1].clone(),
            },
            locked: true,
        })
        .await
        .unwrap();

    let regenerated = store.generate_plan(essay()).await.unwrap();

    let edited = regenerated.graph.step(&ids[0]).unwrap();
    assert_eq!(edited.title, "Read sources");
    assert!(edited.user_edited);
    assert!(regenerated.graph.step(&ids[1]).unwrap().locked);
}

#[tokio::test]
async fn test_empty_edit_is_rejected() {
    let store = memory_store().await;
    store.generate_plan(essay()).await.unwrap();
    let err = store.edit_step(&EditStep::default()).await.unwrap_err();
    assert!(matches!(err, CadenceError::InvalidInput { .. }));
}

#[tokio::test]
async fn test_unknown_step_is_reported_once() {
    let store = memory_store().await;
    store.generate_plan(essay()).await.unwrap();
    let ghost = StepRef {
        work_item_id: "essay".into(),
        step_id: "essay/ghost".into(),
    };

    for _ in 0..3 {
        let err = store.complete_step(&ghost).await.unwrap_err();
        assert!(matches!(err, CadenceError::StepNotFound { .. }));
    }
    assert_eq!(store.stale_reference_count().await, 1);
}

#[tokio::test]
async fn test_newer_request_supersedes_running_schedule() {
    let store = memory_store().await;
    store.generate_plan(essay()).await.unwrap();
    let version = store.snapshot().version;

    let older = store.begin_run(&params());
    let newer = store.begin_run(&params());
    let older_result =
        generate_dependency_aware_schedule(&older.request, &older.snapshot.plans).unwrap();
    let newer_result =
        generate_dependency_aware_schedule(&newer.request, &newer.snapshot.plans).unwrap();

    let committed = store.commit_run(newer.generation, newer_result).await.unwrap();
    let late = store.commit_run(older.generation, older_result).await;

    assert!(matches!(late, Err(CadenceError::Superseded { .. })));
    assert_eq!(store.snapshot().version, version + 1);
    assert_eq!(store.current_schedule(), committed);
}

#[tokio::test]
async fn test_cancel_discards_in_flight_run() {
    let store = memory_store().await;
    store.generate_plan(essay()).await.unwrap();

    let run = store.begin_run(&params());
    store.cancel_scheduling();
    let result = generate_dependency_aware_schedule(&run.request, &run.snapshot.plans).unwrap();

    assert!(matches!(
        store.commit_run(run.generation, result).await,
        Err(CadenceError::Superseded { .. })
    ));
    assert!(store.current_schedule().blocks.is_empty());

    let fresh = store.schedule(&params()).await.unwrap();
    assert!(!fresh.blocks.is_empty());
}

#[tokio::test]
async fn test_move_block_locks_and_survives_rescheduling() {
    let store = memory_store().await;
    store.generate_plan(essay()).await.unwrap();
    let result = store.schedule(&params()).await.unwrap();
    let block = result.blocks[0].clone();

    let moved = store
        .move_block(&MoveBlock {
            task_id: block.task_id.clone(),
            day: block.day,
            start: block.start,
            to_day: date(2026, 3, 3),
            to_start: time(9, 0, 0, 0),
            constraints: params().constraints,
            fixed_events: Vec::new(),
        })
        .await
        .unwrap();
    assert!(moved.locked);

    let rerun = store.schedule(&params()).await.unwrap();
    assert!(rerun.blocks.contains(&moved));
}

fn move_first_block(block: &ScheduledBlock) -> MoveBlock {
    MoveBlock {
        task_id: block.task_id.clone(),
        day: block.day,
        start: block.start,
        to_day: date(2026, 3, 3),
        to_start: time(9, 0, 0, 0),
        constraints: params().constraints,
        fixed_events: Vec::new(),
    }
}

#[tokio::test]
async fn test_manual_move_supersedes_in_flight_run() {
    let store = memory_store().await;
    store.generate_plan(essay()).await.unwrap();
    let block = store.schedule(&params()).await.unwrap().blocks[0].clone();

    let run = store.begin_run(&params());
    let moved = store.move_block(&move_first_block(&block)).await.unwrap();
    let result = generate_dependency_aware_schedule(&run.request, &run.snapshot.plans).unwrap();

    assert!(matches!(
        store.commit_run(run.generation, result).await,
        Err(CadenceError::Superseded { .. })
    ));
    let current = store.current_schedule();
    assert!(current.blocks.contains(&moved));
    assert!(!current.blocks.contains(&block));
}

#[tokio::test]
async fn test_lock_block_keeps_position_across_runs() {
    let store = memory_store().await;
    store.generate_plan(essay()).await.unwrap();
    let block = store.schedule(&params()).await.unwrap().blocks[0].clone();

    let run = store.begin_run(&params());
    let locked = store
        .lock_block(&BlockParams {
            task_id: block.task_id.clone(),
            day: block.day,
            start: block.start,
        })
        .await
        .unwrap();
    assert!(locked.locked);
    assert_eq!((locked.day, locked.start), (block.day, block.start));

    let result = generate_dependency_aware_schedule(&run.request, &run.snapshot.plans).unwrap();
    assert!(matches!(
        store.commit_run(run.generation, result).await,
        Err(CadenceError::Superseded { .. })
    ));

    let busy = ScheduleParams {
        fixed_events: vec![BusyWindow::new(
            "Assembly",
            date(2026, 3, 2).at(9, 0, 0, 0),
            date(2026, 3, 2).at(9, 30, 0, 0),
        )],
        ..params()
    };
    let rerun = store.schedule(&busy).await.unwrap();
    assert!(rerun.blocks.contains(&locked));
}

#[tokio::test]
async fn test_lock_unknown_block_is_stale() {
    let store = memory_store().await;
    store.generate_plan(essay()).await.unwrap();

    let err = store
        .lock_block(&BlockParams {
            task_id: "essay/ghost".into(),
            day: date(2026, 3, 2),
            start: time(9, 0, 0, 0),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, CadenceError::BlockNotFound { .. }));
    assert_eq!(store.stale_reference_count().await, 1);
}

#[tokio::test]
async fn test_completing_unscheduled_step_clears_its_entry() {
    let store = memory_store().await;
    store
        .generate_plan(WorkItem {
            due: date(2026, 3, 2).at(17, 0, 0, 0),
            ..essay()
        })
        .await
        .unwrap();
    let packed = ScheduleParams {
        fixed_events: vec![BusyWindow::new(
            "Field trip",
            date(2026, 3, 2).at(9, 0, 0, 0),
            date(2026, 3, 2).at(12, 0, 0, 0),
        )],
        ..params()
    };

    let result = store.schedule(&packed).await.unwrap();
    let step_id = result.unscheduled_task_ids()[0].to_string();

    store
        .complete_step(&StepRef {
            work_item_id: "essay".into(),
            step_id: step_id.clone(),
        })
        .await
        .unwrap();

    let current = store.current_schedule();
    assert!(!current.unscheduled_task_ids().contains(&step_id.as_str()));
}

#[tokio::test]
async fn test_delete_plan_removes_blocks() {
    let store = memory_store().await;
    store.generate_plan(essay()).await.unwrap();
    store.schedule(&params()).await.unwrap();

    store
        .delete_plan(&PlanId {
            work_item_id: "essay".into(),
        })
        .await
        .unwrap();

    assert!(store.list_plans().is_empty());
    assert!(store.current_schedule().blocks.is_empty());
    assert!(matches!(
        store
            .get_plan(&PlanId {
                work_item_id: "essay".into()
            })
            .await,
        Err(CadenceError::PlanNotFound { .. })
    ));
}

#[tokio::test]
async fn test_flush_persists_and_reload_restores() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.db");
    let store = StoreBuilder::new()
        .with_database_path(Some(&path))
        .build()
        .await
        .unwrap();

    let plan = store.generate_plan(essay()).await.unwrap();
    let result = store.schedule(&params()).await.unwrap();
    store.close().await.unwrap();

    let reopened = StoreBuilder::new()
        .with_database_path(Some(&path))
        .build()
        .await
        .unwrap();
    let snapshot = reopened.snapshot();
    assert_eq!(snapshot.plan("essay"), Some(&plan));
    assert_eq!(snapshot.schedule.blocks, result.blocks);
}

#[tokio::test]
async fn test_debounced_write_happens_after_quiet_period() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("debounce.db");
    let store = StoreBuilder::new()
        .with_database_path(Some(&path))
        .with_debounce(Duration::from_millis(20))
        .build()
        .await
        .unwrap();

    store.generate_plan(essay()).await.unwrap();
    store
        .set_enforcement(&SetEnforcement {
            work_item_id: "essay".into(),
            enforce: false,
        })
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;

    let db = Database::new(&path).unwrap();
    let stored = db.load_plan("essay").unwrap().unwrap();
    assert!(!stored.enforce_dependencies);
}
