//! Per-category generation table.
//!
//! Adding a category means adding a [`Category`] variant and one row here.

use crate::models::{Category, StepKind};

/// How a category expands into steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Strategy {
    /// Chained study sessions, spaced closer together near the due date
    SpacedSessions { max_steps: usize },
    /// Equal slices capped at the configured chunk length
    Chunks { ordered: bool },
    /// Author steps when given, otherwise the default milestone chain
    Milestones,
    /// One or two short steps right before the due date
    Review,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Recipe {
    pub category: Category,
    pub strategy: Strategy,
    pub kind: StepKind,
    pub label: &'static str,
}

/// Indexed by `Category as usize`.
pub(crate) static RECIPES: [Recipe; 6] = [
    Recipe {
        category: Category::Exam,
        strategy: Strategy::SpacedSessions { max_steps: 6 },
        kind: StepKind::StudySession,
        label: "Study session",
    },
    Recipe {
        category: Category::Quiz,
        strategy: Strategy::SpacedSessions { max_steps: 3 },
        kind: StepKind::StudySession,
        label: "Practice session",
    },
    Recipe {
        category: Category::Homework,
        strategy: Strategy::Chunks { ordered: false },
        kind: StepKind::Chunk,
        label: "Work block",
    },
    Recipe {
        category: Category::Reading,
        strategy: Strategy::Chunks { ordered: true },
        kind: StepKind::Reading,
        label: "Reading part",
    },
    Recipe {
        category: Category::Project,
        strategy: Strategy::Milestones,
        kind: StepKind::Milestone,
        label: "Milestone",
    },
    Recipe {
        category: Category::Review,
        strategy: Strategy::Review,
        kind: StepKind::Review,
        label: "Review",
    },
];

/// Default project milestones with their share of the effort in percent.
pub(crate) const DEFAULT_MILESTONES: [(&str, u32); 4] = [
    ("Research and outline", 20),
    ("First draft", 40),
    ("Revise", 25),
    ("Final polish", 15),
];

pub(crate) fn recipe_for(category: Category) -> &'static Recipe {
    &RECIPES[category as usize]
}
