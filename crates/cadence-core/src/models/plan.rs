//! Work-item plans and their persisted record form.

use log::warn;
use serde::{Deserialize, Serialize};

use super::{PlanEdge, PlanNode, ScheduleTask, WorkItem};
use crate::{error::Result, graph::PlanGraph};

/// Current version written into every [`PlanRecord`].
pub const PLAN_RECORD_VERSION: u32 = 1;

/// The full step/edge set of one work item plus its enforcement flag.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentPlan {
    /// ID of the owning work item
    pub work_item_id: String,

    /// Steps and dependencies
    pub graph: PlanGraph,

    /// When false, dependencies are informational and never block scheduling
    pub enforce_dependencies: bool,

    /// Metadata the plan was generated from, when known
    pub work_item: Option<WorkItem>,
}

impl AssignmentPlan {
    /// Creates an empty plan with dependency enforcement enabled.
    pub fn new(work_item_id: impl Into<String>) -> Self {
        Self {
            work_item_id: work_item_id.into(),
            graph: PlanGraph::new(),
            enforce_dependencies: true,
            work_item: None,
        }
    }

    /// Returns a copy of the plan's graph.
    pub fn to_graph(&self) -> PlanGraph {
        self.graph.clone()
    }

    /// Replaces the plan's steps and edges with `graph`.
    pub fn apply_graph(&mut self, graph: PlanGraph) {
        self.graph = graph;
    }

    /// Whether `step_id` is blocked for scheduling purposes.
    ///
    /// Always false when enforcement is off.
    pub fn blocks(&self, step_id: &str) -> bool {
        self.enforce_dependencies && self.graph.is_blocked(step_id)
    }

    /// Builds scheduler task records for every incomplete step.
    ///
    /// Steps inherit the work item's due date, category and priority. Steps
    /// without an expected duration, or plans without work-item metadata,
    /// produce no task.
    pub fn schedule_tasks(&self) -> Vec<ScheduleTask> {
        let Some(item) = &self.work_item else {
            return Vec::new();
        };

        self.graph
            .steps()
            .iter()
            .filter(|step| !step.completed)
            .filter_map(|step| {
                let minutes = step.expected_minutes?;
                Some(ScheduleTask {
                    id: step.id.clone(),
                    work_item_id: Some(self.work_item_id.clone()),
                    title: step.title.clone(),
                    category: item.category,
                    priority: item.priority,
                    due: item.due,
                    duration_minutes: minutes,
                    completed: false,
                })
            })
            .collect()
    }

    /// Converts the plan into its persisted form.
    pub fn to_record(&self) -> PlanRecord {
        PlanRecord {
            version: PLAN_RECORD_VERSION,
            work_item_id: self.work_item_id.clone(),
            steps: self.graph.steps().to_vec(),
            edges: self.graph.edges().to_vec(),
            enforce_dependencies: self.enforce_dependencies,
            work_item: self.work_item.clone(),
        }
    }

    /// Rebuilds a plan from a persisted record, re-validating every step and
    /// edge. Duplicate steps and invalid edges are an error.
    pub fn from_record(record: PlanRecord) -> Result<Self> {
        if record.version > PLAN_RECORD_VERSION {
            warn!(
                "Plan '{}' was written by a newer format (v{}); loading known fields only",
                record.work_item_id, record.version
            );
        }

        let mut graph = PlanGraph::new();
        for step in record.steps {
            graph.add_step(step)?;
        }
        for edge in record.edges {
            graph.add_edge(&edge.from, &edge.to)?;
        }

        Ok(Self {
            work_item_id: record.work_item_id,
            graph,
            enforce_dependencies: record.enforce_dependencies,
            work_item: record.work_item,
        })
    }
}

fn default_enforce() -> bool {
    true
}

fn default_version() -> u32 {
    PLAN_RECORD_VERSION
}

/// Versioned, forward-compatible persisted layout of an [`AssignmentPlan`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanRecord {
    #[serde(default = "default_version")]
    pub version: u32,

    pub work_item_id: String,

    #[serde(default)]
    pub steps: Vec<PlanNode>,

    #[serde(default)]
    pub edges: Vec<PlanEdge>,

    #[serde(default = "default_enforce")]
    pub enforce_dependencies: bool,

    /// Added after the first release; absent in older records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_item: Option<WorkItem>,
}
