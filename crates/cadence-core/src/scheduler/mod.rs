//! Packing engine: places schedulable steps into day-bounded time blocks.
//!
//! A run is a pure function of a [`ScheduleRequest`]. Tasks are scored with
//! [`scoring::schedule_index`] and packed in descending score order. Each
//! task is cut into granularity-sized chunks; the candidate slots of the day
//! grid (from `day_start` in steps of `granularity_minutes`) between `now`
//! and the task's due date are ranked by [`scoring::placement_score`], so the
//! energy profile only decides between otherwise valid slots. Ties fall back
//! to the earliest slot.
//!
//! Fixed events, blackouts, locked blocks and blocks placed earlier in the
//! run are obstacles. Whatever does not fit before the due date is reported
//! in [`ScheduleResult::unscheduled`]; a run never fails because a task does
//! not fit.

use std::collections::HashMap;

use jiff::{
    civil::{Date, DateTime},
    ToSpan,
};
use log::{debug, info};

use crate::{
    error::Result,
    models::{
        BusyWindow, Constraints, Decision, EnergyProfile, ScheduleResult, ScheduleTask,
        ScheduledBlock, UnscheduledTask,
    },
};

pub mod manual;
pub mod scoring;
pub(crate) mod timeline;


pub use manual::{check_placement, BlockRef};
pub use scoring::{placement_score, schedule_index};

use timeline::{minute_of_day, time_at, within_constraints, Occupancy};

/// Days after `now` a run looks at, however distant a due date is.
pub const MAX_HORIZON_DAYS: i64 = 366;

/// Reason recorded when a task does not fully fit.
pub const INSUFFICIENT_CAPACITY: &str = "insufficient capacity before due date";

/// Snapshot of everything one schedule run depends on.
#[derive(Debug, Clone)]
pub struct ScheduleRequest {
    /// Nothing is placed before this moment
    pub now: DateTime,
    pub tasks: Vec<ScheduleTask>,
    /// External busy windows
    pub fixed_events: Vec<BusyWindow>,
    /// Blocks the run must keep where they are
    pub locked_blocks: Vec<ScheduledBlock>,
    pub constraints: Constraints,
    pub energy: EnergyProfile,
}

impl ScheduleRequest {
    /// Request with default constraints and energy profile.
    pub fn new(now: DateTime, tasks: Vec<ScheduleTask>) -> Self {
        Self {
            now,
            tasks,
            fixed_events: Vec::new(),
            locked_blocks: Vec::new(),
            constraints: Constraints::default(),
            energy: EnergyProfile::default(),
        }
    }

    pub fn with_fixed_events(mut self, events: Vec<BusyWindow>) -> Self {
        self.fixed_events = events;
        self
    }

    pub fn with_locked_blocks(mut self, blocks: Vec<ScheduledBlock>) -> Self {
        self.locked_blocks = blocks;
        self
    }

    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_energy(mut self, energy: EnergyProfile) -> Self {
        self.energy = energy;
        self
    }
}

/// A grid slot a task could occupy.
#[derive(Debug, Clone, Copy)]
struct Slot {
    day: Date,
    start: i32,
    score: f64,
}

/// Packs the request's tasks into non-overlapping blocks.
///
/// Only invalid constraints produce an error.
pub fn generate_schedule(request: &ScheduleRequest) -> Result<ScheduleResult> {
    request.constraints.validate()?;

    let mut result = ScheduleResult::default();
    let mut occupancy = Occupancy::new(
        &request.fixed_events,
        &request.locked_blocks,
        &request.constraints,
    );

    let mut locked_minutes: HashMap<&str, u32> = HashMap::new();
    for block in &request.locked_blocks {
        *locked_minutes.entry(block.task_id.as_str()).or_default() += block.minutes();
        result.blocks.push(ScheduledBlock {
            locked: true,
            ..block.clone()
        });
        result.decisions.push(Decision::KeptLocked {
            task_id: block.task_id.clone(),
            day: block.day,
            start: block.start,
        });
    }

    let mut queue: Vec<(f64, &ScheduleTask)> = Vec::with_capacity(request.tasks.len());
    for task in &request.tasks {
        let reason = if task.completed {
            Some("task is completed")
        } else if task.duration_minutes == 0 {
            Some("task has no duration")
        } else {
            None
        };
        match reason {
            Some(reason) => result.decisions.push(Decision::Excluded {
                task_id: task.id.clone(),
                reason: reason.to_string(),
            }),
            None => queue.push((scoring::schedule_index(task, request.now), task)),
        }
    }

    queue.sort_by(|a, b| {
        b.0.total_cmp(&a.0)
            .then_with(|| a.1.due.cmp(&b.1.due))
            .then_with(|| a.1.id.cmp(&b.1.id))
    });

    for (index, task) in queue {
        let covered = locked_minutes.get(task.id.as_str()).copied().unwrap_or(0);
        let needed = task.duration_minutes.saturating_sub(covered);
        if needed == 0 {
            result.decisions.push(Decision::Excluded {
                task_id: task.id.clone(),
                reason: "already covered by locked blocks".to_string(),
            });
            continue;
        }

        if task.due <= request.now {
            record_unplaced(
                &mut result,
                task,
                needed,
                "due date has already passed".to_string(),
            );
            continue;
        }

        let chunks = pack_task(request, task, index, needed, &mut occupancy);
        let placed: u32 = chunks
            .iter()
            .map(|(_, start, end)| u32::try_from(end - start).unwrap_or(0))
            .sum();
        let blocks = merge_chunks(&task.id, chunks);
        record_outcome(&mut result, task, index, needed, placed, blocks.len());
        result.blocks.extend(blocks);
    }

    result.sort_blocks();
    info!(
        "Schedule run placed {} blocks, {} tasks unscheduled",
        result.blocks.len(),
        result.unscheduled.len()
    );
    Ok(result)
}

/// Records a placement decision for `task`, plus an unscheduled entry when
/// part of it did not fit.
fn record_outcome(
    result: &mut ScheduleResult,
    task: &ScheduleTask,
    index: f64,
    needed: u32,
    placed: u32,
    blocks: usize,
) {
    let remaining = needed - placed;
    debug!(
        "Task '{}' (index {index:.3}): placed {placed} of {needed} minutes in {blocks} blocks",
        task.id
    );

    if remaining == 0 {
        result.decisions.push(Decision::Placed {
            task_id: task.id.clone(),
            schedule_index: index,
            minutes: placed,
            blocks,
        });
        return;
    }

    let reason = format!(
        "{INSUFFICIENT_CAPACITY} ({remaining} of {} minutes unplaced)",
        task.duration_minutes
    );
    if placed == 0 {
        record_unplaced(result, task, remaining, reason);
        return;
    }
    result.unscheduled.push(UnscheduledTask {
        task_id: task.id.clone(),
        remaining_minutes: remaining,
        reason,
    });
    result.decisions.push(Decision::Partial {
        task_id: task.id.clone(),
        schedule_index: index,
        placed_minutes: placed,
        remaining_minutes: remaining,
    });
}

fn record_unplaced(result: &mut ScheduleResult, task: &ScheduleTask, minutes: u32, reason: String) {
    result.unscheduled.push(UnscheduledTask {
        task_id: task.id.clone(),
        remaining_minutes: minutes,
        reason: reason.clone(),
    });
    result.decisions.push(Decision::Unplaced {
        task_id: task.id.clone(),
        reason,
    });
}

/// Claims the best-scoring free slots for `task` until `needed` minutes are
/// covered or no slot is left. Returns `(day, start, end)` chunks.
fn pack_task(
    request: &ScheduleRequest,
    task: &ScheduleTask,
    index: f64,
    needed: u32,
    occupancy: &mut Occupancy,
) -> Vec<(Date, i32, i32)> {
    let constraints = &request.constraints;
    let granularity = i32::try_from(constraints.granularity_minutes).unwrap_or(i32::MAX);
    let day_start = minute_of_day(constraints.day_start);
    let day_end = minute_of_day(constraints.day_end);
    let now_day = request.now.date();
    let now_minute = minute_of_day(request.now.time());
    let due_day = task.due.date();
    let due_minute = minute_of_day(task.due.time());

    // Scores depend only on the position within the day, so each position
    // contributes at most one slot per chunk, earliest days first.
    let positions: Vec<(i32, f64)> = (day_start..)
        .step_by(usize::try_from(granularity).unwrap_or(usize::MAX))
        .take_while(|start| start + granularity <= day_end)
        .filter(|start| within_constraints(constraints, *start, start + granularity))
        .map(|start| {
            let energy = request.energy.at_hour((start / 60) as i8);
            (start, scoring::placement_score(index, energy))
        })
        .collect();
    let per_position = chunk_count(needed, constraints.granularity_minutes);
    let mut found = vec![0usize; positions.len()];
    let last_day = now_day
        .checked_add(MAX_HORIZON_DAYS.days())
        .map_or(due_day, |cap| cap.min(due_day));

    let mut slots = Vec::new();
    let mut day = now_day;
    while day <= last_day && found.iter().any(|n| *n < per_position) {
        for (&(start, score), count) in positions.iter().zip(found.iter_mut()) {
            let end = start + granularity;
            let after_now = day > now_day || start >= now_minute;
            let before_due = day < due_day || end <= due_minute;
            if *count < per_position && after_now && before_due && occupancy.is_free(day, start, end)
            {
                slots.push(Slot { day, start, score });
                *count += 1;
            }
        }
        match day.tomorrow() {
            Ok(next) => day = next,
            Err(_) => break,
        }
    }

    slots.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| (a.day, a.start).cmp(&(b.day, b.start)))
    });

    let mut remaining = i32::try_from(needed).unwrap_or(i32::MAX);
    let mut chunks = Vec::new();
    for slot in slots {
        if remaining == 0 {
            break;
        }
        let length = remaining.min(granularity);
        occupancy.occupy(slot.day, slot.start, slot.start + length);
        chunks.push((slot.day, slot.start, slot.start + length));
        remaining -= length;
    }
    chunks
}

/// Number of granularity-sized chunks covering `minutes`.
fn chunk_count(minutes: u32, granularity: u32) -> usize {
    let granularity = granularity.max(1);
    let chunks = minutes / granularity + u32::from(minutes % granularity != 0);
    usize::try_from(chunks).unwrap_or(usize::MAX)
}

/// Joins back-to-back chunks on the same day into single blocks.
fn merge_chunks(task_id: &str, mut chunks: Vec<(Date, i32, i32)>) -> Vec<ScheduledBlock> {
    chunks.sort();
    let mut merged: Vec<(Date, i32, i32)> = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        if let Some(last) = merged.last_mut() {
            if last.0 == chunk.0 && last.2 == chunk.1 {
                last.2 = chunk.2;
                continue;
            }
        }
        merged.push(chunk);
    }
    merged
        .into_iter()
        .map(|(day, start, end)| ScheduledBlock::new(task_id, day, time_at(start), time_at(end)))
        .collect()
}
