//! Step (plan node) and dependency edge definitions.

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

/// Opaque step identifier, unique within a graph.
pub type StepId = String;

/// Closed set of step kinds.
///
/// Unknown kinds written by a newer version decode as [`StepKind::Other`] so
/// that older builds can still load the plan.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Spaced study session ahead of an exam or quiz
    StudySession,
    /// Fixed-size slice of homework
    Chunk,
    /// Ordered reading segment
    Reading,
    /// Project milestone
    Milestone,
    /// Short review shortly before the due date
    Review,
    /// Step written by the user
    Custom,
    /// Kind not known to this build
    #[serde(other)]
    Other,
}

impl StepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::StudySession => "study_session",
            StepKind::Chunk => "chunk",
            StepKind::Reading => "reading",
            StepKind::Milestone => "milestone",
            StepKind::Review => "review",
            StepKind::Custom => "custom",
            StepKind::Other => "other",
        }
    }
}

/// One concrete unit of work derived from a work item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanNode {
    /// Unique identifier for the step
    pub id: StepId,

    /// ID of the owning work item
    pub work_item_id: String,

    /// Brief title of the step
    pub title: String,

    /// Kind of step
    pub kind: StepKind,

    /// Whether the step has been completed
    #[serde(default)]
    pub completed: bool,

    /// Day the step is expected to happen on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_date: Option<Date>,

    /// Expected effort in minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_minutes: Option<u32>,

    /// Author-assigned tie-break key for ordering
    pub sort_index: i64,

    /// Protected from regeneration
    #[serde(default)]
    pub locked: bool,

    /// Manually edited after generation
    #[serde(default)]
    pub user_edited: bool,
}

impl PlanNode {
    /// Creates an incomplete, unlocked step.
    pub fn new(
        id: impl Into<StepId>,
        work_item_id: impl Into<String>,
        title: impl Into<String>,
        kind: StepKind,
        sort_index: i64,
    ) -> Self {
        Self {
            id: id.into(),
            work_item_id: work_item_id.into(),
            title: title.into(),
            kind,
            completed: false,
            expected_date: None,
            expected_minutes: None,
            sort_index,
            locked: false,
            user_edited: false,
        }
    }

    pub fn with_date(mut self, date: Date) -> Self {
        self.expected_date = Some(date);
        self
    }

    pub fn with_minutes(mut self, minutes: u32) -> Self {
        self.expected_minutes = Some(minutes);
        self
    }

    /// Whether regeneration must keep this step as-is.
    pub fn is_user_owned(&self) -> bool {
        self.locked || self.user_edited || self.kind == StepKind::Custom
    }
}

/// Directed dependency: `to` cannot start before `from` completes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PlanEdge {
    pub from: StepId,
    pub to: StepId,
}

impl PlanEdge {
    pub fn new(from: impl Into<StepId>, to: impl Into<StepId>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}
