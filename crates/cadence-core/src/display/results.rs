//! Result wrapper types for displaying operation outcomes.

use std::fmt;

use crate::models::{AssignmentPlan, ScheduledBlock, StepId};

/// Outcome of generating or regenerating a plan.
pub struct GenerateResult {
    pub plan: AssignmentPlan,
    pub regenerated: bool,
}

impl fmt::Display for GenerateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.regenerated {
            "Regenerated"
        } else {
            "Generated"
        };
        writeln!(
            f,
            "{verb} plan '{}' with {} steps",
            self.plan.work_item_id,
            self.plan.graph.len()
        )?;
        writeln!(f)?;
        write!(f, "{}", self.plan)
    }
}

/// Outcome of completing a step.
pub struct CompletionResult {
    pub step_id: StepId,
    pub unblocked: Vec<StepId>,
}

impl fmt::Display for CompletionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Completed step `{}`", self.step_id)?;
        if self.unblocked.is_empty() {
            return Ok(());
        }
        writeln!(f)?;
        writeln!(f, "Now unblocked:")?;
        writeln!(f)?;
        for id in &self.unblocked {
            writeln!(f, "- `{id}`")?;
        }
        Ok(())
    }
}

/// Outcome of a manual block move.
pub struct MoveResult {
    pub block: ScheduledBlock,
}

impl fmt::Display for MoveResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Moved block to {}", self.block)
    }
}

/// Outcome of deleting a plan.
pub struct DeleteResult {
    pub plan: AssignmentPlan,
}

impl fmt::Display for DeleteResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Deleted plan '{}' and its {} steps",
            self.plan.work_item_id,
            self.plan.graph.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_lists_unblocked_steps() {
        let result = CompletionResult {
            step_id: "a".into(),
            unblocked: vec!["b".into(), "c".into()],
        };
        let output = result.to_string();
        assert!(output.starts_with("Completed step `a`"));
        assert!(output.contains("- `b`\n- `c`"));

        let quiet = CompletionResult {
            step_id: "d".into(),
            unblocked: Vec::new(),
        };
        assert_eq!(quiet.to_string(), "Completed step `d`\n");
    }
}
