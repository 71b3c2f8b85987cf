//! Display implementations for domain models.
//!
//! Plans render as markdown: a heading, a metadata list and the steps in
//! dependency order with their blocked status.

use std::fmt;

use super::datetime::{ClockTime, LocalDateTime, Minutes};
use crate::{
    integration::blocked_reason,
    models::{AssignmentPlan, PlanNode, Priority, ScheduledBlock, StepKind},
};

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl AssignmentPlan {
    /// Steps in topological order, falling back to insertion order if the
    /// graph cannot be sorted.
    pub(crate) fn ordered_steps(&self) -> Vec<&PlanNode> {
        match self.graph.topological_sort() {
            Ok(order) => order.iter().filter_map(|id| self.graph.step(id)).collect(),
            Err(_) => self.graph.steps().iter().collect(),
        }
    }

    /// Number of completed steps.
    pub fn completed_count(&self) -> usize {
        self.graph.steps().iter().filter(|s| s.completed).count()
    }

    fn fmt_step(&self, step: &PlanNode, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let check = if step.completed { "x" } else { " " };
        write!(f, "- [{check}] **{}** `{}`", step.title, step.id)?;

        let mut details = vec![step.kind.to_string()];
        if let Some(date) = step.expected_date {
            details.push(date.to_string());
        }
        if let Some(minutes) = step.expected_minutes {
            details.push(Minutes(minutes).to_string());
        }
        if step.locked {
            details.push("locked".to_string());
        }
        if step.user_edited {
            details.push("edited".to_string());
        }
        write!(f, " ({})", details.join(", "))?;

        if !step.completed {
            if let Some(reason) = blocked_reason(self, &step.id) {
                write!(f, " - blocked: {reason}")?;
            }
        }
        writeln!(f)
    }
}

impl fmt::Display for AssignmentPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.work_item {
            Some(item) => writeln!(f, "# {} ({})", item.title, self.work_item_id)?,
            None => writeln!(f, "# {}", self.work_item_id)?,
        }
        writeln!(f)?;

        if let Some(item) = &self.work_item {
            writeln!(f, "- Category: {}", item.category)?;
            writeln!(f, "- Due: {}", LocalDateTime(&item.due))?;
            writeln!(f, "- Priority: {}", item.priority)?;
            writeln!(f, "- Effort: {}", Minutes(item.estimated_minutes))?;
        }
        writeln!(
            f,
            "- Dependencies: {}",
            if self.enforce_dependencies {
                "enforced"
            } else {
                "informational"
            }
        )?;
        writeln!(
            f,
            "- Progress: {}/{}",
            self.completed_count(),
            self.graph.len()
        )?;

        if self.graph.is_empty() {
            return writeln!(f, "\nNo steps in this plan.");
        }

        writeln!(f, "\n## Steps")?;
        writeln!(f)?;
        for step in self.ordered_steps() {
            self.fmt_step(step, f)?;
        }

        if !self.graph.edges().is_empty() {
            writeln!(f, "\n## Dependencies")?;
            writeln!(f)?;
            for edge in self.graph.edges() {
                writeln!(f, "- `{}` -> `{}`", edge.from, edge.to)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for ScheduledBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}-{} `{}`",
            self.day,
            ClockTime(&self.start),
            ClockTime(&self.end),
            self.task_id
        )?;
        if self.locked {
            write!(f, " (locked)")?;
        }
        Ok(())
    }
}
