//! Command-line argument definitions using clap.
//!
//! Every command has its own argument struct with clap derives and a `From`
//! conversion into the matching core parameter type, so the core stays free
//! of CLI concerns:
//!
//! ```text
//! User Input → CLI Args (clap) → Core Params → PlanStore
//! ```
//!
//! Values that need more than `FromStr` (busy windows, blackouts, energy
//! profiles, author steps) are parsed by the `parse_*` functions at the end
//! of this module.

use cadence_core::{
    models::{BusyWindow, Category, Constraints, DailyWindow, EnergyProfile, Priority, UserStep},
    params::*,
};
use clap::{Args, Subcommand};
use jiff::{
    civil::{Date, DateTime, Time},
    Zoned,
};

// ============================================================================
// Plans
// ============================================================================

/// Generate the plan for a work item
///
/// Running it again for the same id regenerates the plan, keeping completed,
/// locked and edited steps.
#[derive(Args)]
pub struct GeneratePlanArgs {
    #[arg(help = "Unique identifier of the work item, also used as the plan id")]
    pub id: String,
    /// Title of the work item
    pub title: String,
    #[arg(
        short,
        long,
        help = "Category: exam, quiz, homework, reading, project or review"
    )]
    pub category: Category,
    #[arg(short, long, help = "Due date and time, e.g. 2026-03-12T09:00")]
    pub due: DateTime,
    #[arg(short, long, help = "Estimated total effort in minutes")]
    pub minutes: u32,
    #[arg(short, long, default_value = "medium", help = "low, medium, high or urgent")]
    pub priority: Priority,
    #[arg(long, help = "First day steps may be planned on (defaults to today)")]
    pub start: Option<Date>,
    #[arg(
        long = "step",
        value_parser = parse_user_step,
        help = "Project step as TITLE or TITLE:MINUTES; repeat for more steps"
    )]
    pub steps: Vec<UserStep>,
}

impl From<GeneratePlanArgs> for GeneratePlan {
    fn from(val: GeneratePlanArgs) -> Self {
        GeneratePlan {
            id: val.id,
            title: val.title,
            category: val.category,
            due: val.due,
            estimated_minutes: val.minutes,
            priority: val.priority,
            start_date: val.start,
            steps: val.steps,
        }
    }
}

/// Identify a plan by its work item id
#[derive(Args)]
pub struct PlanIdArgs {
    #[arg(help = "Work item id of the plan")]
    pub id: String,
}

impl From<PlanIdArgs> for PlanId {
    fn from(val: PlanIdArgs) -> Self {
        PlanId {
            work_item_id: val.id,
        }
    }
}

/// Toggle dependency enforcement for a plan
///
/// With enforcement off, dependencies are shown but every incomplete step
/// may be scheduled.
#[derive(Args)]
pub struct EnforceArgs {
    #[arg(help = "Work item id of the plan")]
    pub id: String,
    #[arg(long, help = "Treat dependencies as informational only")]
    pub off: bool,
}

impl From<EnforceArgs> for SetEnforcement {
    fn from(val: EnforceArgs) -> Self {
        SetEnforcement {
            work_item_id: val.id,
            enforce: !val.off,
        }
    }
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Generate or regenerate the plan of a work item
    #[command(aliases = ["g", "gen"])]
    Generate(GeneratePlanArgs),
    /// List all plans
    #[command(aliases = ["l", "ls"])]
    List,
    /// Show a plan with its steps and dependencies
    #[command(alias = "s")]
    Show(PlanIdArgs),
    /// Delete a plan and its scheduled blocks
    #[command(aliases = ["d", "rm"])]
    Delete(PlanIdArgs),
    /// Turn dependency enforcement on or off
    #[command(alias = "e")]
    Enforce(EnforceArgs),
}

// ============================================================================
// Dependencies
// ============================================================================

/// A dependency between two steps of one plan
#[derive(Args)]
pub struct EdgeArgs {
    #[arg(help = "Work item id of the plan")]
    pub plan: String,
    #[arg(help = "Prerequisite step id")]
    pub from: String,
    #[arg(help = "Dependent step id")]
    pub to: String,
}

impl From<EdgeArgs> for EdgeParams {
    fn from(val: EdgeArgs) -> Self {
        EdgeParams {
            work_item_id: val.plan,
            from: val.from,
            to: val.to,
        }
    }
}

#[derive(Subcommand)]
pub enum EdgeCommands {
    /// Add a dependency; rejected if it would create a cycle
    #[command(alias = "a")]
    Add(EdgeArgs),
    /// Remove a dependency
    #[command(aliases = ["r", "rm"])]
    Remove(EdgeArgs),
}

// ============================================================================
// Steps
// ============================================================================

/// Identify a step within a plan
#[derive(Args)]
pub struct StepRefArgs {
    #[arg(help = "Work item id of the plan")]
    pub plan: String,
    #[arg(help = "Step id, e.g. essay/chunk-1")]
    pub step: String,
}

impl From<StepRefArgs> for StepRef {
    fn from(val: StepRefArgs) -> Self {
        StepRef {
            work_item_id: val.plan,
            step_id: val.step,
        }
    }
}

/// Lock a step so regeneration keeps it unchanged
#[derive(Args)]
pub struct LockStepArgs {
    #[command(flatten)]
    pub step: StepRefArgs,
    #[arg(long, help = "Remove the lock instead")]
    pub unlock: bool,
}

impl From<LockStepArgs> for LockStep {
    fn from(val: LockStepArgs) -> Self {
        LockStep {
            step: val.step.into(),
            locked: !val.unlock,
        }
    }
}

/// Edit a step's title, date or effort
#[derive(Args)]
pub struct EditStepArgs {
    #[command(flatten)]
    pub step: StepRefArgs,
    #[arg(short, long, help = "New title")]
    pub title: Option<String>,
    #[arg(short, long, help = "New expected date")]
    pub date: Option<Date>,
    #[arg(short, long, help = "New expected effort in minutes")]
    pub minutes: Option<u32>,
}

impl From<EditStepArgs> for EditStep {
    fn from(val: EditStepArgs) -> Self {
        EditStep {
            step: val.step.into(),
            title: val.title,
            expected_date: val.date,
            expected_minutes: val.minutes,
        }
    }
}

#[derive(Subcommand)]
pub enum StepCommands {
    /// Mark a step as completed and unblock its dependents
    #[command(aliases = ["c", "done"])]
    Complete(StepRefArgs),
    /// Mark a completed step as incomplete again
    #[command(alias = "r")]
    Reopen(StepRefArgs),
    /// Lock or unlock a step against regeneration
    #[command(alias = "l")]
    Lock(LockStepArgs),
    /// Edit a step
    #[command(alias = "e")]
    Edit(EditStepArgs),
}

// ============================================================================
// Schedule
// ============================================================================

/// Working window, blackouts and fixed events shared by scheduling commands
#[derive(Args)]
pub struct CalendarArgs {
    #[arg(long, default_value = "09:00", help = "Earliest start of a block")]
    pub day_start: Time,
    #[arg(long, default_value = "17:00", help = "Latest end of a block")]
    pub day_end: Time,
    #[arg(long, default_value_t = 30, help = "Block granularity in minutes")]
    pub granularity: u32,
    #[arg(
        long = "blackout",
        value_parser = parse_blackout,
        help = "Daily blackout as HH:MM-HH:MM; repeat for more"
    )]
    pub blackouts: Vec<DailyWindow>,
    #[arg(
        long = "event",
        value_parser = parse_event,
        help = "Fixed event as [TITLE=]START..END, e.g. Lecture=2026-03-02T10:00..2026-03-02T11:00"
    )]
    pub events: Vec<BusyWindow>,
    #[arg(long, help = "Allow blocks to overlap fixed events")]
    pub allow_overlap: bool,
}

impl CalendarArgs {
    pub fn constraints(&self) -> Constraints {
        Constraints {
            day_start: self.day_start,
            day_end: self.day_end,
            granularity_minutes: self.granularity,
            blackouts: self.blackouts.clone(),
            allow_overlap: self.allow_overlap,
        }
    }
}

/// Run the dependency-aware scheduler over all plans
#[derive(Args)]
pub struct RunScheduleArgs {
    #[arg(long, help = "Schedule from this moment instead of now")]
    pub now: Option<DateTime>,
    #[command(flatten)]
    pub calendar: CalendarArgs,
    #[arg(
        long,
        value_parser = parse_energy,
        help = "Energy as MORNING,AFTERNOON,EVENING,NIGHT in [0, 1]"
    )]
    pub energy: Option<EnergyProfile>,
    #[arg(long, help = "Also print why each task was placed or skipped")]
    pub decisions: bool,
}

impl From<RunScheduleArgs> for ScheduleParams {
    fn from(val: RunScheduleArgs) -> Self {
        ScheduleParams {
            now: val.now.unwrap_or_else(|| Zoned::now().datetime()),
            constraints: val.calendar.constraints(),
            fixed_events: val.calendar.events,
            energy: val.energy.unwrap_or_default(),
        }
    }
}

/// Move a scheduled block by hand; the block becomes locked
#[derive(Args)]
pub struct MoveBlockArgs {
    #[arg(help = "Step id of the block")]
    pub task_id: String,
    #[arg(help = "Current day of the block")]
    pub day: Date,
    #[arg(help = "Current start of the block")]
    pub start: Time,
    #[arg(help = "New day")]
    pub to_day: Date,
    #[arg(help = "New start")]
    pub to_start: Time,
    #[command(flatten)]
    pub calendar: CalendarArgs,
}

impl From<MoveBlockArgs> for MoveBlock {
    fn from(val: MoveBlockArgs) -> Self {
        MoveBlock {
            task_id: val.task_id,
            day: val.day,
            start: val.start,
            to_day: val.to_day,
            to_start: val.to_start,
            constraints: val.calendar.constraints(),
            fixed_events: val.calendar.events,
        }
    }
}

/// Lock a scheduled block where it is
#[derive(Args)]
pub struct LockBlockArgs {
    #[arg(help = "Step id of the block")]
    pub task_id: String,
    #[arg(help = "Day of the block")]
    pub day: Date,
    #[arg(help = "Start of the block")]
    pub start: Time,
}

impl From<LockBlockArgs> for BlockParams {
    fn from(val: LockBlockArgs) -> Self {
        BlockParams {
            task_id: val.task_id,
            day: val.day,
            start: val.start,
        }
    }
}

#[derive(Subcommand)]
pub enum ScheduleCommands {
    /// Schedule every ready step, keeping locked blocks
    #[command(alias = "r")]
    Run(RunScheduleArgs),
    /// Show the current schedule
    #[command(alias = "s")]
    Show,
    /// Move a block to another day or time
    #[command(alias = "m")]
    Move(MoveBlockArgs),
    /// Keep a block in place on later runs
    #[command(alias = "l")]
    Lock(LockBlockArgs),
}

// ============================================================================
// Value parsers
// ============================================================================

/// Parses `TITLE` or `TITLE:MINUTES`.
pub fn parse_user_step(value: &str) -> Result<UserStep, String> {
    if let Some((title, minutes)) = value.rsplit_once(':') {
        if let Ok(minutes) = minutes.trim().parse::<u32>() {
            return Ok(UserStep {
                title: title.trim().to_string(),
                minutes: Some(minutes),
            });
        }
    }
    Ok(UserStep {
        title: value.trim().to_string(),
        minutes: None,
    })
}

/// Parses `HH:MM-HH:MM`.
pub fn parse_blackout(value: &str) -> Result<DailyWindow, String> {
    let (start, end) = value
        .split_once('-')
        .ok_or_else(|| format!("expected HH:MM-HH:MM, got '{value}'"))?;
    let start: Time = start
        .trim()
        .parse()
        .map_err(|e| format!("invalid start '{start}': {e}"))?;
    let end: Time = end
        .trim()
        .parse()
        .map_err(|e| format!("invalid end '{end}': {e}"))?;
    if start >= end {
        return Err(format!("blackout '{value}' must end after it starts"));
    }
    Ok(DailyWindow::new(start, end))
}

/// Parses `[TITLE=]START..END` with local date-times.
pub fn parse_event(value: &str) -> Result<BusyWindow, String> {
    let (title, range) = match value.split_once('=') {
        Some((title, range)) => (title.trim(), range),
        None => ("Busy", value),
    };
    let (start, end) = range
        .split_once("..")
        .ok_or_else(|| format!("expected START..END, got '{range}'"))?;
    let start: DateTime = start
        .trim()
        .parse()
        .map_err(|e| format!("invalid start '{start}': {e}"))?;
    let end: DateTime = end
        .trim()
        .parse()
        .map_err(|e| format!("invalid end '{end}': {e}"))?;
    if start >= end {
        return Err(format!("event '{value}' must end after it starts"));
    }
    Ok(BusyWindow::new(title, start, end))
}

/// Parses `MORNING,AFTERNOON,EVENING,NIGHT`.
pub fn parse_energy(value: &str) -> Result<EnergyProfile, String> {
    let scores = value
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .map_err(|e| format!("invalid energy '{part}': {e}"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    match scores[..] {
        [morning, afternoon, evening, night] => Ok(EnergyProfile::from_day_parts(
            morning, afternoon, evening, night,
        )),
        _ => Err(format!(
            "expected four comma-separated scores, got {}",
            scores.len()
        )),
    }
}
