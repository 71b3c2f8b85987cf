//! Command handlers: call the store, then render the outcome as markdown.

use anyhow::{Context, Result};
use cadence_core::{
    display::{
        CompletionResult, DeleteResult, GenerateResult, MoveResult, OperationStatus,
        PlanSummaries, ScheduleView,
    },
    params::{
        BlockParams, EditStep, EdgeParams, GeneratePlan, LockStep, MoveBlock, PlanId,
        ScheduleParams, SetEnforcement, StepRef,
    },
    PlanStore,
};
use jiff::Zoned;
use log::debug;

use crate::{
    cli::{EdgeCommands, PlanCommands, ScheduleCommands, StepCommands},
    renderer::TerminalRenderer,
};

pub struct Cli {
    store: PlanStore,
    renderer: TerminalRenderer,
}

impl Cli {
    pub fn new(store: PlanStore, renderer: TerminalRenderer) -> Self {
        Self { store, renderer }
    }

    /// Writes pending changes and shuts the store down.
    pub async fn finish(self) -> Result<()> {
        self.store.close().await.context("Failed to save changes")
    }

    pub async fn handle_plan_command(&self, command: PlanCommands) -> Result<()> {
        match command {
            PlanCommands::Generate(args) => {
                let params: GeneratePlan = args.into();
                let id = params.id.clone();
                let regenerated = self.store.snapshot().plan(&id).is_some();
                let item = params.into_work_item(Zoned::now().date());
                let plan = self
                    .store
                    .generate_plan(item)
                    .await
                    .with_context(|| format!("Failed to generate plan '{id}'"))?;
                self.renderer.show(&GenerateResult { plan, regenerated })
            }
            PlanCommands::List => self.list_plans(),
            PlanCommands::Show(args) => {
                let params: PlanId = args.into();
                let plan = self.store.get_plan(&params).await?;
                self.renderer.show(&plan)
            }
            PlanCommands::Delete(args) => {
                let params: PlanId = args.into();
                let plan = self.store.delete_plan(&params).await?;
                self.renderer.show(&DeleteResult { plan })
            }
            PlanCommands::Enforce(args) => {
                let params: SetEnforcement = args.into();
                self.store.set_enforcement(&params).await?;
                let state = if params.enforce {
                    "enforced"
                } else {
                    "informational"
                };
                self.renderer.show(&OperationStatus::success(format!(
                    "Dependencies of '{}' are now {state}",
                    params.work_item_id
                )))
            }
        }
    }

    pub async fn handle_edge_command(&self, command: EdgeCommands) -> Result<()> {
        match command {
            EdgeCommands::Add(args) => {
                let params: EdgeParams = args.into();
                self.store.add_edge(&params).await?;
                self.renderer.show(&OperationStatus::success(format!(
                    "Added dependency `{}` -> `{}`",
                    params.from, params.to
                )))
            }
            EdgeCommands::Remove(args) => {
                let params: EdgeParams = args.into();
                self.store.remove_edge(&params).await?;
                self.renderer.show(&OperationStatus::success(format!(
                    "Removed dependency `{}` -> `{}`",
                    params.from, params.to
                )))
            }
        }
    }

    pub async fn handle_step_command(&self, command: StepCommands) -> Result<()> {
        match command {
            StepCommands::Complete(args) => {
                let params: StepRef = args.into();
                let unblocked = self.store.complete_step(&params).await?;
                self.renderer.show(&CompletionResult {
                    step_id: params.step_id,
                    unblocked,
                })
            }
            StepCommands::Reopen(args) => {
                let params: StepRef = args.into();
                self.store.reopen_step(&params).await?;
                self.renderer.show(&OperationStatus::success(format!(
                    "Reopened step `{}`",
                    params.step_id
                )))
            }
            StepCommands::Lock(args) => {
                let params: LockStep = args.into();
                self.store.lock_step(&params).await?;
                let verb = if params.locked { "Locked" } else { "Unlocked" };
                self.renderer.show(&OperationStatus::success(format!(
                    "{verb} step `{}`",
                    params.step.step_id
                )))
            }
            StepCommands::Edit(args) => {
                let params: EditStep = args.into();
                self.store.edit_step(&params).await?;
                self.renderer.show(&OperationStatus::success(format!(
                    "Updated step `{}`",
                    params.step.step_id
                )))
            }
        }
    }

    pub async fn handle_schedule_command(&self, command: ScheduleCommands) -> Result<()> {
        match command {
            ScheduleCommands::Run(args) => {
                let decisions = args.decisions;
                let params: ScheduleParams = args.into();
                debug!("Scheduling from {}", params.now);
                let result = self
                    .store
                    .schedule(&params)
                    .await
                    .context("Failed to build the schedule")?;
                let plans = self.store.list_plans();
                self.renderer.show(
                    &ScheduleView::new(&result)
                        .with_plans(&plans)
                        .with_decisions(decisions),
                )
            }
            ScheduleCommands::Show => {
                let result = self.store.current_schedule();
                let plans = self.store.list_plans();
                self.renderer.show(&ScheduleView::new(&result).with_plans(&plans))
            }
            ScheduleCommands::Move(args) => {
                let params: MoveBlock = args.into();
                let block = self.store.move_block(&params).await?;
                self.renderer.show(&MoveResult { block })
            }
            ScheduleCommands::Lock(args) => {
                let params: BlockParams = args.into();
                let block = self.store.lock_block(&params).await?;
                self.renderer.show(&OperationStatus::success(format!(
                    "Locked block `{}` on {} at {}",
                    block.task_id,
                    block.day,
                    block.start.strftime("%H:%M")
                )))
            }
        }
    }

    pub fn list_plans(&self) -> Result<()> {
        self.renderer.show(&PlanSummaries(self.store.list_plans()))
    }
}
