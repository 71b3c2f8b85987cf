//! Parameter structures for Cadence operations.
//!
//! These structures are shared by every front end (currently the CLI) and
//! carry no framework-specific derives. Interface layers define their own
//! argument types and convert into these with `From`.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │   CLI Args      │───▶│  Core Params    │───▶│   PlanStore     │
//! │  (clap derives) │    │ (serde derives) │    │                 │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```

use jiff::civil::{Date, DateTime, Time};
use serde::{Deserialize, Serialize};

use crate::models::{
    BusyWindow, Category, Constraints, EnergyProfile, Priority, UserStep, WorkItem,
};

/// Parameters for generating (or regenerating) the plan of a work item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratePlan {
    /// Work item ID; also the plan ID
    pub id: String,
    /// Human-readable title
    pub title: String,
    pub category: Category,
    /// Local due date and time
    pub due: DateTime,
    /// Estimated total effort in minutes
    pub estimated_minutes: u32,
    #[serde(default)]
    pub priority: Priority,
    /// First day steps may be planned on; defaults to `today`
    pub start_date: Option<Date>,
    /// Author-specified steps
    #[serde(default)]
    pub steps: Vec<UserStep>,
}

impl GeneratePlan {
    /// Builds the work item, starting on `today` unless a start date was
    /// given.
    pub fn into_work_item(self, today: Date) -> WorkItem {
        WorkItem {
            id: self.id,
            title: self.title,
            category: self.category,
            due: self.due,
            priority: self.priority,
            estimated_minutes: self.estimated_minutes,
            start_date: self.start_date.unwrap_or(today),
            user_steps: self.steps,
        }
    }
}

/// Identifies a plan by its work item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanId {
    pub work_item_id: String,
}

/// Parameters for adding or removing a dependency.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EdgeParams {
    pub work_item_id: String,
    /// Prerequisite step
    pub from: String,
    /// Dependent step
    pub to: String,
}

/// Identifies a step within a plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepRef {
    pub work_item_id: String,
    pub step_id: String,
}

/// Parameters for toggling dependency enforcement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetEnforcement {
    pub work_item_id: String,
    pub enforce: bool,
}

/// Parameters for locking or unlocking a step against regeneration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockStep {
    #[serde(flatten)]
    pub step: StepRef,
    pub locked: bool,
}

/// Partial update of a step. Any change marks the step as user-edited.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditStep {
    #[serde(flatten)]
    pub step: StepRef,
    pub title: Option<String>,
    pub expected_date: Option<Date>,
    pub expected_minutes: Option<u32>,
}

impl EditStep {
    /// Whether the edit changes anything.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.expected_date.is_none() && self.expected_minutes.is_none()
    }
}

/// Inputs of a dependency-aware schedule run besides the stored plans.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleParams {
    /// Nothing is placed before this moment
    pub now: DateTime,
    /// External busy windows
    #[serde(default)]
    pub fixed_events: Vec<BusyWindow>,
    #[serde(default)]
    pub constraints: Constraints,
    #[serde(default)]
    pub energy: EnergyProfile,
}

impl ScheduleParams {
    /// Run at `now` with default constraints and energy profile.
    pub fn at(now: DateTime) -> Self {
        Self {
            now,
            fixed_events: Vec::new(),
            constraints: Constraints::default(),
            energy: EnergyProfile::default(),
        }
    }
}

/// Identifies a scheduled block by its step and position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockParams {
    pub task_id: String,
    pub day: Date,
    pub start: Time,
}

/// Parameters for manually moving a scheduled block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveBlock {
    pub task_id: String,
    /// Current day of the block
    pub day: Date,
    /// Current start of the block
    pub start: Time,
    pub to_day: Date,
    pub to_start: Time,
    #[serde(default)]
    pub constraints: Constraints,
    #[serde(default)]
    pub fixed_events: Vec<BusyWindow>,
}
