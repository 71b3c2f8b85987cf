//! Scheduling records: tasks, busy windows, constraints and results.

use std::str::FromStr;

use jiff::civil::{self, Date, DateTime, Time};
use serde::{Deserialize, Serialize};

use super::{Category, StepId};
use crate::error::{CadenceError, Result};

/// Relative importance of a task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// Normalized weight in (0, 1].
    pub fn factor(&self) -> f64 {
        match self {
            Priority::Low => 0.25,
            Priority::Medium => 0.5,
            Priority::High => 0.75,
            Priority::Urgent => 1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" | "normal" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "urgent" | "critical" => Ok(Priority::Urgent),
            _ => Err(format!("Invalid priority: {s}")),
        }
    }
}

/// A schedulable unit handed to the packing engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleTask {
    /// Same id as the corresponding plan step
    pub id: StepId,

    /// Owning work item, when the task comes from a plan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_item_id: Option<String>,

    pub title: String,

    pub category: Category,

    #[serde(default)]
    pub priority: Priority,

    /// Latest moment any block may end
    pub due: DateTime,

    /// Total minutes to place
    pub duration_minutes: u32,

    #[serde(default)]
    pub completed: bool,
}

/// A fixed external commitment, read-only from the scheduler's perspective.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BusyWindow {
    #[serde(default)]
    pub title: String,
    pub start: DateTime,
    pub end: DateTime,
}

impl BusyWindow {
    pub fn new(title: impl Into<String>, start: DateTime, end: DateTime) -> Self {
        Self {
            title: title.into(),
            start,
            end,
        }
    }
}

/// A time-of-day range repeated every day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyWindow {
    pub start: Time,
    pub end: Time,
}

impl DailyWindow {
    pub fn new(start: Time, end: Time) -> Self {
        Self { start, end }
    }
}

/// Placement limits applied to every scheduling day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Constraints {
    /// Earliest time-of-day a block may start
    pub day_start: Time,

    /// Latest time-of-day a block may end
    pub day_end: Time,

    /// Minimum block granularity in minutes
    pub granularity_minutes: u32,

    /// Additional daily blackout windows
    #[serde(default)]
    pub blackouts: Vec<DailyWindow>,

    /// Allow blocks to overlap fixed external events
    #[serde(default)]
    pub allow_overlap: bool,
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            day_start: civil::time(9, 0, 0, 0),
            day_end: civil::time(17, 0, 0, 0),
            granularity_minutes: 30,
            blackouts: Vec::new(),
            allow_overlap: false,
        }
    }
}

impl Constraints {
    /// Checks that the window is non-empty and the granularity fits in it.
    pub fn validate(&self) -> Result<()> {
        if self.day_start >= self.day_end {
            return Err(CadenceError::invalid_input("day_end")
                .with_reason("day window must end after it starts"));
        }
        if self.granularity_minutes == 0 {
            return Err(CadenceError::invalid_input("granularity_minutes")
                .with_reason("granularity must be positive"));
        }
        for blackout in &self.blackouts {
            if blackout.start >= blackout.end {
                return Err(CadenceError::invalid_input("blackouts")
                    .with_reason("blackout window must end after it starts"));
            }
        }
        Ok(())
    }
}

/// Relative energy per hour of day, each in `[0, 1]`.
///
/// Only used to break ties between otherwise valid placements.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnergyProfile {
    pub hourly: [f64; 24],
}

impl Default for EnergyProfile {
    /// Morning peak, post-lunch dip, moderate evening.
    fn default() -> Self {
        Self::from_day_parts(0.9, 0.6, 0.7, 0.2)
    }
}

impl EnergyProfile {
    /// The same score for every hour.
    pub fn flat(score: f64) -> Self {
        Self {
            hourly: [score.clamp(0.0, 1.0); 24],
        }
    }

    /// Builds a profile from four day parts: morning (06-12), afternoon
    /// (12-17), evening (17-22) and night.
    pub fn from_day_parts(morning: f64, afternoon: f64, evening: f64, night: f64) -> Self {
        let mut hourly = [0.0; 24];
        for (hour, slot) in hourly.iter_mut().enumerate() {
            let score = match hour {
                6..=11 => morning,
                12..=16 => afternoon,
                17..=21 => evening,
                _ => night,
            };
            *slot = score.clamp(0.0, 1.0);
        }
        Self { hourly }
    }

    /// Energy score at the given hour; out-of-range hours score zero.
    pub fn at_hour(&self, hour: i8) -> f64 {
        usize::try_from(hour)
            .ok()
            .and_then(|h| self.hourly.get(h))
            .map_or(0.0, |score| score.clamp(0.0, 1.0))
    }
}

/// A placed time block for one step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduledBlock {
    pub task_id: StepId,
    pub day: Date,
    pub start: Time,
    pub end: Time,

    /// Protected from automatic regeneration
    #[serde(default)]
    pub locked: bool,
}

impl ScheduledBlock {
    pub fn new(task_id: impl Into<StepId>, day: Date, start: Time, end: Time) -> Self {
        Self {
            task_id: task_id.into(),
            day,
            start,
            end,
            locked: false,
        }
    }

    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    /// Length of the block in whole minutes.
    pub fn minutes(&self) -> u32 {
        let start = i32::from(self.start.hour()) * 60 + i32::from(self.start.minute());
        let end = i32::from(self.end.hour()) * 60 + i32::from(self.end.minute());
        u32::try_from(end - start).unwrap_or(0)
    }

    pub fn start_datetime(&self) -> DateTime {
        self.day.to_datetime(self.start)
    }

    pub fn end_datetime(&self) -> DateTime {
        self.day.to_datetime(self.end)
    }

    /// Whether two blocks on the same day share any time.
    pub fn overlaps(&self, other: &ScheduledBlock) -> bool {
        self.day == other.day && self.start < other.end && other.start < self.end
    }

    /// Whether the block intersects a busy window.
    pub fn overlaps_window(&self, window: &BusyWindow) -> bool {
        self.start_datetime() < window.end && window.start < self.end_datetime()
    }
}

/// Part of a task that could not be placed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnscheduledTask {
    pub task_id: StepId,
    pub remaining_minutes: u32,
    pub reason: String,
}

/// One entry of the diagnostic log produced by a schedule run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    /// Task was filtered out before packing
    Excluded { task_id: StepId, reason: String },
    /// A locked block was kept as an obstacle
    KeptLocked { task_id: StepId, day: Date, start: Time },
    /// Task was placed in full
    Placed {
        task_id: StepId,
        schedule_index: f64,
        minutes: u32,
        blocks: usize,
    },
    /// Only part of the task fit before its due date
    Partial {
        task_id: StepId,
        schedule_index: f64,
        placed_minutes: u32,
        remaining_minutes: u32,
    },
    /// Nothing could be placed
    Unplaced { task_id: StepId, reason: String },
}

/// Output of one schedule run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScheduleResult {
    /// Placed blocks, ordered by day and start time
    pub blocks: Vec<ScheduledBlock>,

    /// Tasks (or remainders) that did not fit
    pub unscheduled: Vec<UnscheduledTask>,

    /// Exclusion and placement decisions in processing order
    #[serde(default)]
    pub decisions: Vec<Decision>,
}

impl ScheduleResult {
    /// Blocks belonging to `task_id`.
    pub fn blocks_for<'a>(&'a self, task_id: &'a str) -> impl Iterator<Item = &'a ScheduledBlock> {
        self.blocks.iter().filter(move |b| b.task_id == task_id)
    }

    /// Total minutes placed for `task_id`.
    pub fn scheduled_minutes(&self, task_id: &str) -> u32 {
        self.blocks_for(task_id).map(ScheduledBlock::minutes).sum()
    }

    /// IDs of tasks with an unscheduled remainder.
    pub fn unscheduled_task_ids(&self) -> Vec<&str> {
        self.unscheduled.iter().map(|u| u.task_id.as_str()).collect()
    }

    /// Drops every block and unscheduled entry for `task_id`, returning the
    /// number of blocks removed.
    pub fn remove_blocks_for(&mut self, task_id: &str) -> usize {
        let before = self.blocks.len();
        self.blocks.retain(|b| b.task_id != task_id);
        self.unscheduled.retain(|u| u.task_id != task_id);
        before - self.blocks.len()
    }

    /// Orders blocks by day, start time and task id.
    pub fn sort_blocks(&mut self) {
        self.blocks.sort_by(|a, b| {
            (a.day, a.start, &a.task_id).cmp(&(b.day, b.start, &b.task_id))
        });
    }

    /// Locked blocks only.
    pub fn locked_blocks(&self) -> Vec<ScheduledBlock> {
        self.blocks.iter().filter(|b| b.locked).cloned().collect()
    }
}
