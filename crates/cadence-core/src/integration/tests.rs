use jiff::civil::{date, time, DateTime};

use super::*;
use crate::models::{
    Category, Constraints, EnergyProfile, PlanNode, Priority, StepKind, UnscheduledTask,
};

fn due() -> DateTime {
    date(2026, 3, 6).at(17, 0, 0, 0)
}

fn now() -> DateTime {
    date(2026, 3, 2).at(8, 0, 0, 0)
}

/// A -> B, A -> C, B -> D, C -> D
fn diamond() -> AssignmentPlan {
    let mut plan = AssignmentPlan::new("hw");
    for (i, id) in ["a", "b", "c", "d"].iter().enumerate() {
        plan.graph
            .add_step(
                PlanNode::new(*id, "hw", id.to_uppercase(), StepKind::Chunk, i as i64 * 10)
                    .with_minutes(30),
            )
            .unwrap();
    }
    for (from, to) in [("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")] {
        plan.graph.add_edge(from, to).unwrap();
    }
    plan
}

fn tasks_for(plan: &AssignmentPlan) -> Vec<ScheduleTask> {
    plan.graph
        .steps()
        .iter()
        .map(|step| ScheduleTask {
            id: step.id.clone(),
            work_item_id: Some(plan.work_item_id.clone()),
            title: step.title.clone(),
            category: Category::Homework,
            priority: Priority::Medium,
            due: due(),
            duration_minutes: 30,
            completed: step.completed,
        })
        .collect()
}

fn ids(tasks: &[ScheduleTask]) -> Vec<&str> {
    tasks.iter().map(|t| t.id.as_str()).collect()
}

#[test]
fn test_diamond_unblocks_only_when_all_prerequisites_complete() {
    let mut plan = diamond();
    let mut tasks = tasks_for(&plan);

    assert_eq!(ids(&get_schedulable_tasks(&tasks, &plan)), vec!["a"]);

    let unblocked = complete_task_and_auto_unblock(&mut plan, "a", &mut tasks).unwrap();
    assert_eq!(unblocked, vec!["b", "c"]);
    assert_eq!(ids(&get_schedulable_tasks(&tasks, &plan)), vec!["b", "c"]);

    let unblocked = complete_task_and_auto_unblock(&mut plan, "b", &mut tasks).unwrap();
    assert!(unblocked.is_empty());
    assert!(plan.graph.is_blocked("d"));

    let unblocked = complete_task_and_auto_unblock(&mut plan, "c", &mut tasks).unwrap();
    assert_eq!(unblocked, vec!["d"]);
    assert_eq!(ids(&get_schedulable_tasks(&tasks, &plan)), vec!["d"]);
}

#[test]
fn test_completing_twice_unblocks_nothing_new() {
    let mut plan = diamond();
    let mut tasks = tasks_for(&plan);
    complete_task_and_auto_unblock(&mut plan, "a", &mut tasks).unwrap();
    let again = complete_task_and_auto_unblock(&mut plan, "a", &mut tasks).unwrap();
    assert!(again.is_empty());
}

#[test]
fn test_completed_dependents_are_not_reported() {
    let mut plan = diamond();
    plan.graph.mark_completed("b").unwrap();
    let mut tasks = tasks_for(&plan);

    let unblocked = complete_task_and_auto_unblock(&mut plan, "a", &mut tasks).unwrap();
    assert_eq!(unblocked, vec!["c"]);
}

#[test]
fn test_completion_flags_task_records() {
    let mut plan = diamond();
    let mut tasks = tasks_for(&plan);
    complete_task_and_auto_unblock(&mut plan, "a", &mut tasks).unwrap();
    assert!(tasks.iter().find(|t| t.id == "a").unwrap().completed);
}

#[test]
fn test_unknown_step_is_an_error() {
    let mut plan = diamond();
    assert!(matches!(
        complete_task_and_auto_unblock(&mut plan, "zzz", &mut []),
        Err(CadenceError::StepNotFound { .. })
    ));
}

#[test]
fn test_enforcement_off_schedules_everything() {
    let mut plan = diamond();
    plan.enforce_dependencies = false;
    let mut tasks = tasks_for(&plan);

    assert_eq!(get_schedulable_tasks(&tasks, &plan).len(), 4);
    assert_eq!(blocked_reason(&plan, "d"), None);
    let unblocked = complete_task_and_auto_unblock(&mut plan, "a", &mut tasks).unwrap();
    assert!(unblocked.is_empty());
}

#[test]
fn test_blocked_reason_names_single_prerequisite() {
    let mut plan = diamond();
    assert_eq!(blocked_reason(&plan, "a"), None);
    assert_eq!(blocked_reason(&plan, "b").as_deref(), Some("Waiting on \"A\""));
    assert_eq!(
        blocked_reason(&plan, "d").as_deref(),
        Some("Waiting on 2 prerequisites")
    );

    plan.graph.mark_completed("b").unwrap();
    assert_eq!(blocked_reason(&plan, "d").as_deref(), Some("Waiting on \"C\""));
}

#[test]
fn test_standalone_tasks_are_schedulable() {
    let plan = diamond();
    let mut tasks = tasks_for(&plan);
    let errand = ScheduleTask {
        id: "errand".into(),
        work_item_id: None,
        ..tasks[0].clone()
    };
    tasks.push(errand);
    let schedulable = get_schedulable_tasks(&tasks, &plan);
    assert_eq!(ids(&schedulable), vec!["a", "errand"]);
}

#[test]
fn test_lookup_over_many_plans() {
    let first = diamond();
    let mut second = AssignmentPlan::new("exam");
    second
        .graph
        .add_step(PlanNode::new("a", "exam", "Other A", StepKind::StudySession, 0))
        .unwrap();
    let plans = vec![first, second];

    let found = plans.owning_plan(Some("exam"), "a").unwrap();
    assert_eq!(found.work_item_id, "exam");
    assert_eq!(plans.owning_plan(None, "d").unwrap().work_item_id, "hw");
    assert!(plans.owning_plan(Some("exam"), "d").is_none());

    let map: BTreeMap<String, AssignmentPlan> = plans
        .into_iter()
        .map(|p| (p.work_item_id.clone(), p))
        .collect();
    assert_eq!(map.owning_plan(Some("hw"), "c").unwrap().work_item_id, "hw");
}

#[test]
fn test_invalid_blocks_are_removed_after_mutations() {
    let mut plan = diamond();
    let mut tasks = tasks_for(&plan);
    let day = date(2026, 3, 3);
    let block = |id: &str, h: i8| {
        ScheduledBlock::new(id, day, time(h, 0, 0, 0), time(h, 30, 0, 0))
    };
    let result = ScheduleResult {
        blocks: vec![block("a", 9), block("b", 10), block("gone", 11)],
        ..ScheduleResult::default()
    };

    assert!(is_scheduled_block_valid(&result.blocks[0], &tasks, &plan));
    assert!(!is_scheduled_block_valid(&result.blocks[1], &tasks, &plan));
    assert!(!is_scheduled_block_valid(&result.blocks[2], &tasks, &plan));

    complete_task_and_auto_unblock(&mut plan, "a", &mut tasks).unwrap();
    let cleaned = remove_invalid_blocks(result.clone(), &tasks, &plan);
    assert_eq!(cleaned.blocks, vec![block("b", 10)]);

    plan.graph.add_edge("c", "b").unwrap();
    let cleaned = remove_invalid_blocks(result, &tasks, &plan);
    assert!(cleaned.blocks.is_empty());
}

#[test]
fn test_unscheduled_entries_follow_step_state() {
    let mut plan = diamond();
    let mut tasks = tasks_for(&plan);
    let entry = |id: &str| UnscheduledTask {
        task_id: id.into(),
        remaining_minutes: 30,
        reason: "No free slot before due date".into(),
    };
    let result = ScheduleResult {
        unscheduled: vec![entry("a"), entry("gone")],
        ..ScheduleResult::default()
    };

    let cleaned = remove_invalid_blocks(result.clone(), &tasks, &plan);
    assert_eq!(cleaned.unscheduled_task_ids(), vec!["a"]);

    complete_task_and_auto_unblock(&mut plan, "a", &mut tasks).unwrap();
    let cleaned = remove_invalid_blocks(result, &tasks, &plan);
    assert!(cleaned.unscheduled.is_empty());
}

#[test]
fn test_dependency_aware_schedule_filters_blocked_steps() {
    let plan = diamond();
    let request = ScheduleRequest::new(now(), tasks_for(&plan))
        .with_constraints(Constraints {
            day_start: time(9, 0, 0, 0),
            day_end: time(12, 0, 0, 0),
            ..Constraints::default()
        })
        .with_energy(EnergyProfile::flat(0.5));

    let result = generate_dependency_aware_schedule(&request, &plan).unwrap();

    let placed: Vec<&str> = result.blocks.iter().map(|b| b.task_id.as_str()).collect();
    assert_eq!(placed, vec!["a"]);
    let excluded = result
        .decisions
        .iter()
        .filter(|d| matches!(d, Decision::Excluded { .. }))
        .count();
    assert_eq!(excluded, 3);
}

#[test]
fn test_dependency_aware_schedule_releases_locked_blocks_of_blocked_steps() {
    let plan = diamond();
    let day = date(2026, 3, 2);
    let stale = ScheduledBlock::new("d", day, time(9, 0, 0, 0), time(9, 30, 0, 0)).locked();
    let request = ScheduleRequest::new(now(), tasks_for(&plan))
        .with_energy(EnergyProfile::flat(0.5))
        .with_locked_blocks(vec![stale.clone()]);

    let result = generate_dependency_aware_schedule(&request, &plan).unwrap();

    assert!(!result.blocks.contains(&stale));
    assert_eq!(result.blocks[0].task_id, "a");
    assert_eq!(result.blocks[0].start, time(9, 0, 0, 0));
}
