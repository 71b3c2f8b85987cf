//! The plan store: the single owner of plans and the current schedule.
//!
//! Every mutation goes through one `tokio::sync::Mutex`, is computed on a
//! copy of the affected plan and committed all at once. After each commit
//! an immutable [`StoreSnapshot`] is published on a `watch` channel; readers
//! work off snapshots and never take the writer lock.
//!
//! Schedule runs are computed on a blocking thread from a snapshot. Each run
//! takes a generation number; only the most recently requested run may
//! commit its result, so an older run that finishes late is discarded with
//! [`CadenceError::Superseded`].
//!
//! ```no_run
//! use cadence_core::{params::ScheduleParams, StoreBuilder};
//! use jiff::civil::date;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = StoreBuilder::new().in_memory().build().await?;
//! let result = store
//!     .schedule(&ScheduleParams::at(date(2026, 3, 2).at(8, 0, 0, 0)))
//!     .await?;
//! println!("{} blocks", result.blocks.len());
//! # Ok(())
//! # }
//! ```

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use log::{debug, info, warn};
use tokio::{
    sync::{mpsc, oneshot, watch, Mutex},
    task::{self, JoinHandle},
};

pub mod builder;
pub(crate) mod persister;
pub mod stale;

#[cfg(test)]
mod tests;

pub use builder::StoreBuilder;
pub use stale::StaleReferenceLog;

use persister::{PersistCommand, PersisterConfig};

use crate::{
    error::{CadenceError, Result},
    generator::PlanGenerator,
    integration::{
        blocked_reason, complete_task_and_auto_unblock, generate_dependency_aware_schedule,
        get_schedulable_tasks, remove_invalid_blocks,
    },
    models::{AssignmentPlan, ScheduleResult, ScheduleTask, ScheduledBlock, StepId, WorkItem},
    params::{
        BlockParams, EdgeParams, EditStep, LockStep, MoveBlock, PlanId, ScheduleParams,
        SetEnforcement, StepRef,
    },
    scheduler::{BlockRef, ScheduleRequest},
};

/// Immutable view of the store after a commit.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    /// Plans keyed by work item id
    pub plans: BTreeMap<String, AssignmentPlan>,
    /// The committed schedule
    pub schedule: ScheduleResult,
    /// Incremented by every commit
    pub version: u64,
}

impl StoreSnapshot {
    pub fn plan(&self, work_item_id: &str) -> Option<&AssignmentPlan> {
        self.plans.get(work_item_id)
    }

    /// Scheduler tasks for every incomplete step of every plan.
    pub fn tasks(&self) -> Vec<ScheduleTask> {
        self.plans
            .values()
            .flat_map(AssignmentPlan::schedule_tasks)
            .collect()
    }

    /// Tasks not held back by completion or an enforced dependency.
    pub fn schedulable_tasks(&self) -> Vec<ScheduleTask> {
        get_schedulable_tasks(&self.tasks(), &self.plans)
    }

    /// Why a step is blocked, if it is.
    pub fn blocked_reason(&self, work_item_id: &str, step_id: &str) -> Option<String> {
        self.plan(work_item_id)
            .and_then(|plan| blocked_reason(plan, step_id))
    }
}

/// Mutable state guarded by the writer lock.
#[derive(Debug, Default)]
pub(crate) struct StoreState {
    plans: BTreeMap<String, AssignmentPlan>,
    schedule: ScheduleResult,
    version: u64,
    stale: StaleReferenceLog,
}

impl StoreState {
    pub(crate) fn loaded(plans: Vec<AssignmentPlan>, schedule: ScheduleResult) -> Self {
        Self {
            plans: plans
                .into_iter()
                .map(|plan| (plan.work_item_id.clone(), plan))
                .collect(),
            schedule,
            version: 0,
            stale: StaleReferenceLog::new(),
        }
    }

    fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            plans: self.plans.clone(),
            schedule: self.schedule.clone(),
            version: self.version,
        }
    }

    fn tasks(&self) -> Vec<ScheduleTask> {
        self.plans
            .values()
            .flat_map(AssignmentPlan::schedule_tasks)
            .collect()
    }

    fn plan(&mut self, work_item_id: &str) -> Result<AssignmentPlan> {
        match self.plans.get(work_item_id) {
            Some(plan) => Ok(plan.clone()),
            None => {
                self.stale.report("plan", work_item_id);
                Err(CadenceError::PlanNotFound {
                    id: work_item_id.into(),
                })
            }
        }
    }

    /// Drops blocks and unscheduled entries whose step no longer exists, is
    /// completed, or is blocked. Returns the number of blocks removed.
    fn purge_blocks(&mut self) -> usize {
        let before = self.schedule.blocks.len();
        let tasks = self.tasks();
        for block in &self.schedule.blocks {
            let exists = self
                .plans
                .values()
                .any(|plan| plan.graph.contains(&block.task_id));
            if !exists {
                self.stale.report("block", &block.task_id);
            }
        }
        let schedule = std::mem::take(&mut self.schedule);
        self.schedule = remove_invalid_blocks(schedule, &tasks, &self.plans);
        before - self.schedule.blocks.len()
    }
}

/// Inputs of one schedule run, captured at request time.
pub(crate) struct ScheduleRun {
    pub(crate) generation: u64,
    pub(crate) snapshot: Arc<StoreSnapshot>,
    pub(crate) request: ScheduleRequest,
}

/// Owner of all plans and the current schedule.
///
/// Construct one with [`StoreBuilder`] and share it by reference (or `Arc`).
pub struct PlanStore {
    state: Mutex<StoreState>,
    snapshots: watch::Sender<Arc<StoreSnapshot>>,
    generation: AtomicU64,
    generator: PlanGenerator,
    persister: Option<mpsc::UnboundedSender<PersistCommand>>,
    persister_task: Option<JoinHandle<()>>,
}

impl PlanStore {
    pub(crate) fn new(
        state: StoreState,
        generator: PlanGenerator,
        persistence: Option<PersisterConfig>,
    ) -> Self {
        let (snapshots, receiver) = watch::channel(Arc::new(state.snapshot()));
        let (persister, persister_task) = match persistence {
            Some(config) => {
                let (tx, handle) = persister::spawn(config, receiver);
                (Some(tx), Some(handle))
            }
            None => (None, None),
        };

        Self {
            state: Mutex::new(state),
            snapshots,
            generation: AtomicU64::new(0),
            generator,
            persister,
            persister_task,
        }
    }

    /// Latest committed snapshot.
    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified after every commit.
    pub fn subscribe(&self) -> watch::Receiver<Arc<StoreSnapshot>> {
        self.snapshots.subscribe()
    }

    /// Publishes the state and queues the given persistence commands.
    fn commit(&self, state: &mut StoreState, commands: Vec<PersistCommand>) {
        state.version += 1;
        self.snapshots.send_replace(Arc::new(state.snapshot()));
        if let Some(persister) = &self.persister {
            for command in commands {
                if persister.send(command).is_err() {
                    warn!("Persistence task is gone; change not saved");
                    break;
                }
            }
        }
    }

    /// Generates the plan of `item`, or regenerates it when one exists.
    ///
    /// Regeneration keeps locked, edited and custom steps.
    pub async fn generate_plan(&self, item: WorkItem) -> Result<AssignmentPlan> {
        let mut state = self.state.lock().await;
        let plan = match state.plans.get(&item.id) {
            Some(existing) => self.generator.regenerate(existing, &item)?,
            None => self.generator.generate(&item)?,
        };

        state.plans.insert(item.id.clone(), plan.clone());
        let purged = state.purge_blocks();
        let mut commands = vec![PersistCommand::Plan(item.id.clone())];
        if purged > 0 {
            commands.push(PersistCommand::Schedule);
        }
        self.commit(&mut state, commands);
        Ok(plan)
    }

    /// Stored plan of a work item.
    pub async fn get_plan(&self, params: &PlanId) -> Result<AssignmentPlan> {
        self.snapshot()
            .plan(&params.work_item_id)
            .cloned()
            .ok_or_else(|| CadenceError::PlanNotFound {
                id: params.work_item_id.clone(),
            })
    }

    /// All stored plans ordered by work item id.
    pub fn list_plans(&self) -> Vec<AssignmentPlan> {
        self.snapshot().plans.values().cloned().collect()
    }

    /// Deletes a plan together with its blocks.
    pub async fn delete_plan(&self, params: &PlanId) -> Result<AssignmentPlan> {
        let mut state = self.state.lock().await;
        let plan = state.plan(&params.work_item_id)?;
        state.plans.remove(&params.work_item_id);
        for step in plan.graph.steps() {
            state.schedule.remove_blocks_for(&step.id);
        }

        info!("Deleted plan '{}'", plan.work_item_id);
        self.commit(
            &mut state,
            vec![PersistCommand::Delete(plan.clone()), PersistCommand::Schedule],
        );
        Ok(plan)
    }

    /// Applies `mutate` to a copy of one plan and commits it on success.
    async fn mutate_plan<T>(
        &self,
        work_item_id: &str,
        mutate: impl FnOnce(&mut AssignmentPlan) -> Result<T>,
    ) -> Result<T> {
        let mut state = self.state.lock().await;
        let mut plan = state.plan(work_item_id)?;
        let outcome = match mutate(&mut plan) {
            Ok(outcome) => outcome,
            Err(e) => {
                if let CadenceError::StepNotFound { id } = &e {
                    state.stale.report("step", id);
                    if state.purge_blocks() > 0 {
                        self.commit(&mut state, vec![PersistCommand::Schedule]);
                    }
                }
                return Err(e);
            }
        };

        state.plans.insert(work_item_id.to_string(), plan);
        let mut commands = vec![PersistCommand::Plan(work_item_id.to_string())];
        if state.purge_blocks() > 0 {
            commands.push(PersistCommand::Schedule);
        }
        self.commit(&mut state, commands);
        Ok(outcome)
    }

    /// Adds a dependency. Structural violations leave the plan unchanged.
    pub async fn add_edge(&self, params: &EdgeParams) -> Result<()> {
        self.mutate_plan(&params.work_item_id, |plan| {
            plan.graph.add_edge(&params.from, &params.to)
        })
        .await?;
        info!(
            "Added dependency {} -> {} in '{}'",
            params.from, params.to, params.work_item_id
        );
        Ok(())
    }

    /// Removes a dependency; absent edges are ignored.
    pub async fn remove_edge(&self, params: &EdgeParams) -> Result<()> {
        self.mutate_plan(&params.work_item_id, |plan| {
            plan.graph.remove_edge(&params.from, &params.to);
            Ok(())
        })
        .await
    }

    /// Turns dependency enforcement on or off.
    pub async fn set_enforcement(&self, params: &SetEnforcement) -> Result<()> {
        self.mutate_plan(&params.work_item_id, |plan| {
            plan.enforce_dependencies = params.enforce;
            Ok(())
        })
        .await
    }

    /// Completes a step, drops its blocks and returns the dependents it
    /// unblocked.
    pub async fn complete_step(&self, params: &StepRef) -> Result<Vec<StepId>> {
        self.mutate_plan(&params.work_item_id, |plan| {
            let mut tasks = plan.schedule_tasks();
            complete_task_and_auto_unblock(plan, &params.step_id, &mut tasks)
        })
        .await
    }

    /// Clears a step's completion flag. Blocks of dependents that become
    /// blocked again are dropped.
    pub async fn reopen_step(&self, params: &StepRef) -> Result<()> {
        self.mutate_plan(&params.work_item_id, |plan| {
            plan.graph.mark_incomplete(&params.step_id)
        })
        .await
    }

    /// Locks or unlocks a step against regeneration.
    pub async fn lock_step(&self, params: &LockStep) -> Result<()> {
        self.mutate_plan(&params.step.work_item_id, |plan| {
            let step = plan.graph.step_mut(&params.step.step_id).ok_or_else(|| {
                CadenceError::StepNotFound {
                    id: params.step.step_id.clone(),
                }
            })?;
            step.locked = params.locked;
            Ok(())
        })
        .await
    }

    /// Edits a step and marks it as user-edited.
    pub async fn edit_step(&self, params: &EditStep) -> Result<()> {
        if params.is_empty() {
            return Err(CadenceError::invalid_input("edit")
                .with_reason("at least one of title, date or minutes is required"));
        }
        if params.expected_minutes == Some(0) {
            return Err(CadenceError::invalid_input("expected_minutes")
                .with_reason("duration must be positive"));
        }
        self.mutate_plan(&params.step.work_item_id, |plan| {
            let step = plan.graph.step_mut(&params.step.step_id).ok_or_else(|| {
                CadenceError::StepNotFound {
                    id: params.step.step_id.clone(),
                }
            })?;
            if let Some(title) = &params.title {
                step.title = title.clone();
            }
            if let Some(date) = params.expected_date {
                step.expected_date = Some(date);
            }
            if let Some(minutes) = params.expected_minutes {
                step.expected_minutes = Some(minutes);
            }
            step.user_edited = true;
            Ok(())
        })
        .await
    }

    /// Runs the dependency-aware scheduler over the current plans and
    /// commits the result, keeping locked blocks in place.
    ///
    /// If another run is requested (or [`cancel_scheduling`] is called)
    /// before this one finishes, this run is discarded with
    /// [`CadenceError::Superseded`].
    ///
    /// [`cancel_scheduling`]: PlanStore::cancel_scheduling
    pub async fn schedule(&self, params: &ScheduleParams) -> Result<ScheduleResult> {
        let run = self.begin_run(params);
        let generation = run.generation;
        let result = task::spawn_blocking(move || {
            generate_dependency_aware_schedule(&run.request, &run.snapshot.plans)
        })
        .await
        .map_err(CadenceError::join)??;

        self.commit_run(generation, result).await
    }

    /// Takes a generation number and captures the inputs of a run.
    pub(crate) fn begin_run(&self, params: &ScheduleParams) -> ScheduleRun {
        let generation = self.invalidate_runs();
        let snapshot = self.snapshot();
        let request = ScheduleRequest {
            now: params.now,
            tasks: snapshot.tasks(),
            fixed_events: params.fixed_events.clone(),
            locked_blocks: snapshot.schedule.locked_blocks(),
            constraints: params.constraints.clone(),
            energy: params.energy.clone(),
        };
        ScheduleRun {
            generation,
            snapshot,
            request,
        }
    }

    /// Commits `result` if no newer run was requested in the meantime.
    pub(crate) async fn commit_run(
        &self,
        generation: u64,
        result: ScheduleResult,
    ) -> Result<ScheduleResult> {
        let mut state = self.state.lock().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("Discarding schedule run {generation}");
            return Err(CadenceError::Superseded { generation });
        }

        state.schedule = result;
        state.purge_blocks();
        let committed = state.schedule.clone();
        self.commit(&mut state, vec![PersistCommand::Schedule]);
        Ok(committed)
    }

    /// Discards every schedule run still in flight.
    pub fn cancel_scheduling(&self) {
        let generation = self.invalidate_runs();
        debug!("Cancelled schedule runs before generation {generation}");
    }

    /// Bumps the generation so no run requested so far can commit.
    fn invalidate_runs(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Committed schedule.
    pub fn current_schedule(&self) -> ScheduleResult {
        self.snapshot().schedule.clone()
    }

    /// Moves a block by hand; the moved block becomes locked.
    pub async fn move_block(&self, params: &MoveBlock) -> Result<ScheduledBlock> {
        let mut state = self.state.lock().await;
        let target = BlockRef::new(params.task_id.clone(), params.day, params.start);
        let mut schedule = state.schedule.clone();
        let moved = match schedule.reschedule(
            &target,
            params.to_day,
            params.to_start,
            &params.constraints,
            &params.fixed_events,
        ) {
            Ok(moved) => moved,
            Err(e) => {
                if matches!(e, CadenceError::BlockNotFound { .. }) {
                    state.stale.report("block", &params.task_id);
                }
                return Err(e);
            }
        };

        // Runs computed before the move would drop the new locked block.
        self.invalidate_runs();
        state.schedule = schedule;
        self.commit(&mut state, vec![PersistCommand::Schedule]);
        Ok(moved)
    }

    /// Pins a block where it is so later runs keep it.
    pub async fn lock_block(&self, params: &BlockParams) -> Result<ScheduledBlock> {
        let mut state = self.state.lock().await;
        let target = BlockRef::new(params.task_id.clone(), params.day, params.start);
        let locked = match state.schedule.lock_block(&target) {
            Ok(locked) => locked,
            Err(e) => {
                state.stale.report("block", &params.task_id);
                return Err(e);
            }
        };

        self.invalidate_runs();
        self.commit(&mut state, vec![PersistCommand::Schedule]);
        Ok(locked)
    }

    /// Drops stale references from the schedule and republishes when
    /// anything changed. Returns the number of blocks removed.
    pub async fn reconcile(&self) -> usize {
        let mut state = self.state.lock().await;
        let removed = state.purge_blocks();
        if removed > 0 {
            info!("Reconciled schedule, dropped {removed} blocks");
            self.commit(&mut state, vec![PersistCommand::Schedule]);
        }
        removed
    }

    /// Number of distinct stale references reported so far.
    pub async fn stale_reference_count(&self) -> usize {
        self.state.lock().await.stale.len()
    }

    /// Writes all pending changes now and waits for the write.
    pub async fn flush(&self) -> Result<()> {
        let Some(persister) = &self.persister else {
            return Ok(());
        };
        let (reply, done) = oneshot::channel();
        persister
            .send(PersistCommand::Flush(reply))
            .map_err(|_| CadenceError::Configuration {
                message: "Persistence task is not running".to_string(),
            })?;
        done.await.map_err(|_| CadenceError::Configuration {
            message: "Persistence task stopped before flushing".to_string(),
        })?
    }

    /// Flushes pending changes and stops the persistence task.
    pub async fn close(mut self) -> Result<()> {
        self.flush().await?;
        self.persister = None;
        if let Some(handle) = self.persister_task.take() {
            handle.await.map_err(CadenceError::join)?;
        }
        Ok(())
    }
}
