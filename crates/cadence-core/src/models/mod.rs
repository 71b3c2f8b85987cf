//! Data models for plans, steps and scheduling.
//!
//! Plain records shared by the graph, the plan generator, the scheduler and
//! the store. Markdown rendering lives in [`crate::display`].

pub mod plan;
pub mod schedule;
pub mod step;
pub mod work_item;


pub use plan::{AssignmentPlan, PlanRecord, PLAN_RECORD_VERSION};
pub use schedule::{
    BusyWindow, Constraints, DailyWindow, Decision, EnergyProfile, Priority, ScheduleResult,
    ScheduleTask, ScheduledBlock, UnscheduledTask,
};
pub use step::{PlanEdge, PlanNode, StepId, StepKind};
pub use work_item::{Category, UserStep, WorkItem};
