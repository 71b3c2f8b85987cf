//! Collection wrapper types for displaying groups of domain objects.

use std::{collections::HashMap, fmt};

use super::datetime::{ClockTime, DayHeading, LocalDateTime, Minutes};
use crate::models::{AssignmentPlan, Decision, ScheduleResult};

/// Newtype wrapper for displaying a list of plans with their progress.
pub struct PlanSummaries(pub Vec<AssignmentPlan>);

impl PlanSummaries {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for PlanSummaries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No plans found.");
        }
        for plan in &self.0 {
            let title = plan
                .work_item
                .as_ref()
                .map_or(plan.work_item_id.as_str(), |item| item.title.as_str());
            writeln!(
                f,
                "## {} (ID: {}) ({}/{})",
                title,
                plan.work_item_id,
                plan.completed_count(),
                plan.graph.len()
            )?;
            writeln!(f)?;
            if let Some(item) = &plan.work_item {
                writeln!(f, "- **Category**: {}", item.category)?;
                writeln!(f, "- **Due**: {}", LocalDateTime(&item.due))?;
            }
            let ready = plan.graph.ready_steps().len();
            writeln!(f, "- **Ready steps**: {ready}")?;
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Markdown rendering of a schedule: blocks grouped by day, then the
/// unscheduled remainders.
///
/// Step titles are shown when known; otherwise the step id is used.
pub struct ScheduleView<'a> {
    pub result: &'a ScheduleResult,
    titles: HashMap<&'a str, &'a str>,
    show_decisions: bool,
}

impl<'a> ScheduleView<'a> {
    pub fn new(result: &'a ScheduleResult) -> Self {
        Self {
            result,
            titles: HashMap::new(),
            show_decisions: false,
        }
    }

    /// Uses step titles from `plans`.
    pub fn with_plans(mut self, plans: impl IntoIterator<Item = &'a AssignmentPlan>) -> Self {
        for plan in plans {
            for step in plan.graph.steps() {
                self.titles.insert(step.id.as_str(), step.title.as_str());
            }
        }
        self
    }

    /// Appends the decision log.
    pub fn with_decisions(mut self, show: bool) -> Self {
        self.show_decisions = show;
        self
    }

    fn title<'s>(&'s self, id: &'s str) -> &'s str {
        self.titles.get(id).copied().unwrap_or(id)
    }
}

impl fmt::Display for ScheduleView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.result.blocks.is_empty() {
            writeln!(f, "No blocks scheduled.")?;
        }

        let mut current = None;
        for block in &self.result.blocks {
            if current != Some(block.day) {
                if current.is_some() {
                    writeln!(f)?;
                }
                writeln!(f, "## {}", DayHeading(&block.day))?;
                writeln!(f)?;
                current = Some(block.day);
            }
            write!(
                f,
                "- {}-{} **{}** `{}`",
                ClockTime(&block.start),
                ClockTime(&block.end),
                self.title(&block.task_id),
                block.task_id
            )?;
            if block.locked {
                write!(f, " (locked)")?;
            }
            writeln!(f)?;
        }

        if !self.result.unscheduled.is_empty() {
            writeln!(f, "\n## Unscheduled")?;
            writeln!(f)?;
            for task in &self.result.unscheduled {
                writeln!(
                    f,
                    "- **{}** `{}`: {} left, {}",
                    self.title(&task.task_id),
                    task.task_id,
                    Minutes(task.remaining_minutes),
                    task.reason
                )?;
            }
        }

        if self.show_decisions && !self.result.decisions.is_empty() {
            writeln!(f, "\n## Decisions")?;
            writeln!(f)?;
            for decision in &self.result.decisions {
                writeln!(f, "- {}", DecisionLine(decision))?;
            }
        }
        Ok(())
    }
}

struct DecisionLine<'a>(&'a Decision);

impl fmt::Display for DecisionLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Decision::Excluded { task_id, reason } => write!(f, "excluded `{task_id}`: {reason}"),
            Decision::KeptLocked { task_id, day, start } => {
                write!(f, "kept locked `{task_id}` at {day} {}", ClockTime(start))
            }
            Decision::Placed {
                task_id,
                schedule_index,
                minutes,
                blocks,
            } => write!(
                f,
                "placed `{task_id}` (index {schedule_index:.3}): {} in {blocks} blocks",
                Minutes(*minutes)
            ),
            Decision::Partial {
                task_id,
                schedule_index,
                placed_minutes,
                remaining_minutes,
            } => write!(
                f,
                "partially placed `{task_id}` (index {schedule_index:.3}): {} placed, {} left",
                Minutes(*placed_minutes),
                Minutes(*remaining_minutes)
            ),
            Decision::Unplaced { task_id, reason } => write!(f, "unplaced `{task_id}`: {reason}"),
        }
    }
}
