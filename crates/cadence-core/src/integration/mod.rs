//! Dependency-aware filtering on top of the packing engine.
//!
//! Scheduler tasks carry the step id they were built from and, usually, the
//! id of the owning work item. [`PlanLookup`] resolves a task to the plan
//! holding its step; tasks that resolve to no plan are scheduled as
//! standalone work.

use std::collections::BTreeMap;

use log::{debug, info};

use crate::{
    error::{CadenceError, Result},
    models::{AssignmentPlan, Decision, ScheduleResult, ScheduleTask, ScheduledBlock, StepId},
    scheduler::{generate_schedule, ScheduleRequest},
};

#[cfg(test)]
mod tests;

/// Resolves scheduler tasks to the plans that own them.
pub trait PlanLookup {
    /// Plan containing `step_id`, narrowed to `work_item_id` when given.
    fn owning_plan(&self, work_item_id: Option<&str>, step_id: &str) -> Option<&AssignmentPlan>;

    /// Plan owning the step behind `task`.
    fn plan_for(&self, task: &ScheduleTask) -> Option<&AssignmentPlan> {
        self.owning_plan(task.work_item_id.as_deref(), &task.id)
    }
}

impl PlanLookup for AssignmentPlan {
    fn owning_plan(&self, work_item_id: Option<&str>, step_id: &str) -> Option<&AssignmentPlan> {
        let same_item = work_item_id.map_or(true, |id| id == self.work_item_id);
        (same_item && self.graph.contains(step_id)).then_some(self)
    }
}

impl PlanLookup for [AssignmentPlan] {
    fn owning_plan(&self, work_item_id: Option<&str>, step_id: &str) -> Option<&AssignmentPlan> {
        self.iter()
            .find_map(|plan| plan.owning_plan(work_item_id, step_id))
    }
}

impl PlanLookup for Vec<AssignmentPlan> {
    fn owning_plan(&self, work_item_id: Option<&str>, step_id: &str) -> Option<&AssignmentPlan> {
        self.as_slice().owning_plan(work_item_id, step_id)
    }
}

impl PlanLookup for BTreeMap<String, AssignmentPlan> {
    fn owning_plan(&self, work_item_id: Option<&str>, step_id: &str) -> Option<&AssignmentPlan> {
        match work_item_id {
            Some(id) => self
                .get(id)
                .and_then(|plan| plan.owning_plan(Some(id), step_id)),
            None => self
                .values()
                .find_map(|plan| plan.owning_plan(None, step_id)),
        }
    }
}

/// Why `task` may not be scheduled right now, if anything prevents it.
fn exclusion_reason<L>(task: &ScheduleTask, plans: &L) -> Option<String>
where
    L: PlanLookup + ?Sized,
{
    if task.completed {
        return Some("task is completed".to_string());
    }
    let plan = plans.plan_for(task)?;
    if plan.graph.is_completed(&task.id) {
        return Some("step is completed".to_string());
    }
    blocked_reason(plan, &task.id)
}

/// Tasks that are neither completed nor held back by an enforced
/// dependency.
pub fn get_schedulable_tasks<L>(tasks: &[ScheduleTask], plans: &L) -> Vec<ScheduleTask>
where
    L: PlanLookup + ?Sized,
{
    tasks
        .iter()
        .filter(|task| exclusion_reason(task, plans).is_none())
        .cloned()
        .collect()
}

/// Completes `task_id` in `plan` and returns the dependents that went from
/// blocked to unblocked.
///
/// Matching entries in `tasks` are flagged completed as well. Dependents that
/// still wait on another prerequisite, or are already completed, are never
/// returned. With enforcement off nothing is ever blocked, so the result is
/// empty.
pub fn complete_task_and_auto_unblock(
    plan: &mut AssignmentPlan,
    task_id: &str,
    tasks: &mut [ScheduleTask],
) -> Result<Vec<StepId>> {
    if !plan.graph.contains(task_id) {
        return Err(CadenceError::StepNotFound { id: task_id.into() });
    }

    let waiting: Vec<StepId> = plan
        .graph
        .dependents_of(task_id)
        .iter()
        .filter(|id| !plan.graph.is_completed(id) && plan.blocks(id))
        .cloned()
        .collect();

    plan.graph.mark_completed(task_id)?;
    for task in tasks.iter_mut().filter(|t| t.id == task_id) {
        task.completed = true;
    }

    let unblocked: Vec<StepId> = waiting
        .into_iter()
        .filter(|id| !plan.blocks(id))
        .collect();

    info!(
        "Completed step '{}' in plan '{}', unblocked {} dependents",
        task_id,
        plan.work_item_id,
        unblocked.len()
    );
    Ok(unblocked)
}

/// Whether `block` still refers to an existing, incomplete, unblocked task.
pub fn is_scheduled_block_valid<L>(block: &ScheduledBlock, tasks: &[ScheduleTask], plans: &L) -> bool
where
    L: PlanLookup + ?Sized,
{
    is_task_schedulable(&block.task_id, tasks, plans)
}

fn is_task_schedulable<L>(task_id: &str, tasks: &[ScheduleTask], plans: &L) -> bool
where
    L: PlanLookup + ?Sized,
{
    tasks
        .iter()
        .find(|task| task.id == task_id)
        .is_some_and(|task| exclusion_reason(task, plans).is_none())
}

/// Drops blocks and unscheduled entries whose task was deleted, completed,
/// or became blocked.
pub fn remove_invalid_blocks<L>(
    mut result: ScheduleResult,
    tasks: &[ScheduleTask],
    plans: &L,
) -> ScheduleResult
where
    L: PlanLookup + ?Sized,
{
    result.blocks.retain(|block| {
        let valid = is_scheduled_block_valid(block, tasks, plans);
        if !valid {
            debug!(
                "Dropping block for '{}' on {} at {}",
                block.task_id, block.day, block.start
            );
        }
        valid
    });
    result.unscheduled.retain(|entry| {
        let valid = is_task_schedulable(&entry.task_id, tasks, plans);
        if !valid {
            debug!("Dropping unscheduled entry for '{}'", entry.task_id);
        }
        valid
    });
    result
}

/// Human-readable reason `step_id` is blocked, or `None` when it is not.
pub fn blocked_reason(plan: &AssignmentPlan, step_id: &str) -> Option<String> {
    if !plan.blocks(step_id) {
        return None;
    }
    match plan.graph.incomplete_prerequisites(step_id).as_slice() {
        [only] => Some(format!("Waiting on \"{}\"", only.title)),
        many => Some(format!("Waiting on {} prerequisites", many.len())),
    }
}

/// Runs the packing engine over the tasks that dependencies currently allow.
///
/// Filtered tasks appear as `Excluded` decisions. Locked blocks for tasks
/// that are now completed or blocked are released before packing.
pub fn generate_dependency_aware_schedule<L>(
    request: &ScheduleRequest,
    plans: &L,
) -> Result<ScheduleResult>
where
    L: PlanLookup + ?Sized,
{
    let mut exclusions = Vec::new();
    let mut tasks = Vec::with_capacity(request.tasks.len());
    for task in &request.tasks {
        match exclusion_reason(task, plans) {
            Some(reason) => {
                debug!("Excluding '{}': {}", task.id, reason);
                exclusions.push(Decision::Excluded {
                    task_id: task.id.clone(),
                    reason,
                });
            }
            None => tasks.push(task.clone()),
        }
    }

    let locked_blocks = request
        .locked_blocks
        .iter()
        .filter(|block| {
            request
                .tasks
                .iter()
                .find(|task| task.id == block.task_id)
                .map_or(true, |task| exclusion_reason(task, plans).is_none())
        })
        .cloned()
        .collect();

    let filtered = ScheduleRequest {
        tasks,
        locked_blocks,
        ..request.clone()
    };
    let mut result = generate_schedule(&filtered)?;
    exclusions.append(&mut result.decisions);
    result.decisions = exclusions;
    Ok(result)
}
