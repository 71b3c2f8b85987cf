//! Manual edits to a generated schedule.

use jiff::civil::{Date, Time};
use log::info;
use serde::{Deserialize, Serialize};

use super::timeline::{minute_of_day, time_at, within_constraints, END_OF_DAY};
use crate::{
    error::{CadenceError, Result},
    models::{BusyWindow, Constraints, ScheduleResult, ScheduledBlock, StepId},
};

/// Identifies a block by its task and its current position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRef {
    pub task_id: StepId,
    pub day: Date,
    pub start: Time,
}

impl BlockRef {
    pub fn new(task_id: impl Into<StepId>, day: Date, start: Time) -> Self {
        Self {
            task_id: task_id.into(),
            day,
            start,
        }
    }

    fn matches(&self, block: &ScheduledBlock) -> bool {
        block.task_id == self.task_id && block.day == self.day && block.start == self.start
    }
}

impl From<&ScheduledBlock> for BlockRef {
    fn from(block: &ScheduledBlock) -> Self {
        Self::new(block.task_id.clone(), block.day, block.start)
    }
}

fn hhmm(time: Time) -> String {
    time.strftime("%H:%M").to_string()
}

/// Checks that `block` may sit where it is given the other blocks and fixed
/// events. Returns a human-readable reason when it may not.
pub fn check_placement<'a>(
    block: &ScheduledBlock,
    others: impl IntoIterator<Item = &'a ScheduledBlock>,
    constraints: &Constraints,
    fixed_events: &[BusyWindow],
) -> std::result::Result<(), String> {
    let start = minute_of_day(block.start);
    let end = minute_of_day(block.end);
    if !within_constraints(constraints, start, end) {
        return Err(format!(
            "{}-{} is outside the {}-{} day window or inside a blackout",
            hhmm(block.start),
            hhmm(block.end),
            hhmm(constraints.day_start),
            hhmm(constraints.day_end)
        ));
    }

    if let Some(other) = others.into_iter().find(|other| block.overlaps(other)) {
        return Err(format!(
            "overlaps the block for '{}' at {}-{}",
            other.task_id,
            hhmm(other.start),
            hhmm(other.end)
        ));
    }

    if !constraints.allow_overlap {
        if let Some(event) = fixed_events.iter().find(|e| block.overlaps_window(e)) {
            return Err(format!("overlaps fixed event '{}'", event.title));
        }
    }
    Ok(())
}

impl ScheduleResult {
    /// Moves the block identified by `target` to `day` at `start`, keeping
    /// its duration. The moved block becomes locked.
    ///
    /// On conflict the result is left unchanged.
    pub fn reschedule(
        &mut self,
        target: &BlockRef,
        day: Date,
        start: Time,
        constraints: &Constraints,
        fixed_events: &[BusyWindow],
    ) -> Result<ScheduledBlock> {
        let position = self
            .blocks
            .iter()
            .position(|b| target.matches(b))
            .ok_or_else(|| CadenceError::BlockNotFound {
                task_id: target.task_id.clone(),
                day: target.day.to_string(),
                start: hhmm(target.start),
            })?;

        let current = &self.blocks[position];
        let length = minute_of_day(current.end) - minute_of_day(current.start);
        let end = minute_of_day(start) + length;
        if end >= END_OF_DAY {
            return Err(CadenceError::conflict("block would run past midnight"));
        }

        let moved = ScheduledBlock {
            task_id: current.task_id.clone(),
            day,
            start,
            end: time_at(end),
            locked: true,
        };
        let others = self
            .blocks
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != position)
            .map(|(_, b)| b);
        check_placement(&moved, others, constraints, fixed_events)
            .map_err(CadenceError::conflict)?;

        info!(
            "Moved block for '{}' from {} {} to {} {}",
            moved.task_id,
            target.day,
            hhmm(target.start),
            day,
            hhmm(start)
        );
        self.blocks[position] = moved.clone();
        self.sort_blocks();
        Ok(moved)
    }

    /// Marks the block identified by `target` as locked in place and
    /// returns it.
    pub fn lock_block(&mut self, target: &BlockRef) -> Result<ScheduledBlock> {
        let block = self
            .blocks
            .iter_mut()
            .find(|b| target.matches(b))
            .ok_or_else(|| CadenceError::BlockNotFound {
                task_id: target.task_id.clone(),
                day: target.day.to_string(),
                start: hhmm(target.start),
            })?;
        block.locked = true;
        Ok(block.clone())
    }
}
