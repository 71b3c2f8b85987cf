//! Deterministic plan generation.
//!
//! [`PlanGenerator::generate`] expands one [`WorkItem`] into an
//! [`AssignmentPlan`]. Dispatch on the category goes through the table in
//! [`recipes`]; each strategy is a pure function of the work item and the
//! generator configuration, so the same input always yields the same step
//! ids, titles, dates, durations and edges.
//!
//! | Category | Strategy | Edges |
//! |---|---|---|
//! | exam, quiz | spaced study sessions, at least two | chained |
//! | homework | chunks capped at `max_chunk_minutes` | none |
//! | reading | chunks capped at `max_chunk_minutes` | chained |
//! | project | author steps, else default milestones | chained |
//! | review | one step, two for longer reviews | chained |
//!
//! Regeneration ([`PlanGenerator::regenerate`]) keeps every user-owned step
//! (locked, edited or custom) and every existing dependency, and replaces
//! only algorithmically owned steps.

use jiff::{civil::Date, ToSpan};
use log::{debug, info};

use crate::{
    error::{CadenceError, Result},
    graph::PlanGraph,
    models::{AssignmentPlan, PlanNode, WorkItem},
};

pub(crate) mod recipes;


use recipes::{recipe_for, Recipe, Strategy, DEFAULT_MILESTONES};

/// Tunables of the plan generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Upper bound for a homework or reading chunk
    pub max_chunk_minutes: u32,
    /// Preferred upper bound for one study session
    pub max_session_minutes: u32,
    /// Reviews longer than this are split in two
    pub review_split_minutes: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_chunk_minutes: 60,
            max_session_minutes: 90,
            review_split_minutes: 60,
        }
    }
}

/// Generates and regenerates plans for work items.
#[derive(Debug, Clone, Default)]
pub struct PlanGenerator {
    config: GeneratorConfig,
}

/// Generates a plan with the default configuration.
pub fn generate_plan(item: &WorkItem) -> Result<AssignmentPlan> {
    PlanGenerator::default().generate(item)
}

/// Regenerates a plan with the default configuration.
pub fn regenerate_plan(existing: &AssignmentPlan, item: &WorkItem) -> Result<AssignmentPlan> {
    PlanGenerator::default().regenerate(existing, item)
}

/// One step before it becomes a [`PlanNode`].
#[derive(Debug, Clone)]
struct StepDraft {
    title: String,
    minutes: Option<u32>,
    date: Date,
}

/// Plannable days for a work item: `start` up to the day before `due`.
#[derive(Debug, Clone, Copy)]
struct Horizon {
    start: Date,
    due: Date,
    /// Number of days strictly before the due date, may be zero or negative
    days: i64,
}

impl Horizon {
    fn new(item: &WorkItem) -> Result<Self> {
        let due = item.due.date();
        let days = i64::from(
            item.start_date
                .until(due)
                .map_err(|e| CadenceError::invalid_input("due").with_reason(e.to_string()))?
                .get_days(),
        );
        Ok(Self {
            start: item.start_date,
            due,
            days,
        })
    }

    /// The date `offset` days before the due date, kept inside the horizon.
    fn before_due(&self, offset: i64) -> Result<Date> {
        if self.days <= 0 {
            return Ok(self.start);
        }
        shift(self.due, -offset.clamp(1, self.days))
    }

    /// The date at `percent` of the way from the start to the last day
    /// before the due date.
    fn at_percent(&self, percent: u32) -> Result<Date> {
        if self.days <= 0 {
            return Ok(self.start);
        }
        let offset = (self.days - 1) * i64::from(percent.min(100)) / 100;
        shift(self.start, offset)
    }
}

fn shift(date: Date, days: i64) -> Result<Date> {
    date.checked_add(days.days())
        .map_err(|e| CadenceError::invalid_input("due").with_reason(e.to_string()))
}

fn div_ceil(value: u32, divisor: u32) -> u32 {
    value / divisor + u32::from(value % divisor != 0)
}

/// `percent` of `minutes`, rounded down.
fn percent_of(minutes: u32, percent: u32) -> u32 {
    let share = u64::from(minutes) * u64::from(percent) / 100;
    u32::try_from(share).unwrap_or(minutes)
}

/// Splits `total` into `parts` amounts that differ by at most one minute.
fn split_even(total: u32, parts: usize) -> Vec<u32> {
    let parts_u32 = u32::try_from(parts.max(1)).unwrap_or(u32::MAX);
    let base = total / parts_u32;
    let extra = (total % parts_u32) as usize;
    (0..parts.max(1))
        .map(|i| if i < extra { base + 1 } else { base })
        .collect()
}

/// Days-before-due offsets for `n` sessions inside a `window` of days.
///
/// Offsets strictly decrease and the gaps between them shrink towards the
/// due date. Requires `window >= n`.
fn spaced_offsets(n: usize, window: i64) -> Vec<i64> {
    let mut offsets = Vec::with_capacity(n);
    let mut previous = window + 1;
    for i in 0..n {
        let remaining = (n - i) as i64;
        let share = remaining as f64 / n as f64;
        let raw = (window as f64 * share * share).round() as i64;
        let offset = raw.min(previous - 1).max(remaining);
        offsets.push(offset);
        previous = offset;
    }
    offsets
}

impl PlanGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Expands a work item into a fresh plan with enforcement enabled.
    pub fn generate(&self, item: &WorkItem) -> Result<AssignmentPlan> {
        if item.estimated_minutes == 0 {
            return Err(CadenceError::invalid_input("estimated_minutes")
                .with_reason("estimated effort must be positive"));
        }
        if item.id.trim().is_empty() {
            return Err(CadenceError::invalid_input("id").with_reason("work item id is empty"));
        }

        let recipe = recipe_for(item.category);
        let horizon = Horizon::new(item)?;
        let (drafts, chained) = match recipe.strategy {
            Strategy::SpacedSessions { max_steps } => {
                (self.spaced_sessions(item, recipe, &horizon, max_steps)?, true)
            }
            Strategy::Chunks { ordered } => (self.chunks(item, recipe, &horizon)?, ordered),
            Strategy::Milestones => (self.milestones(item, recipe, &horizon)?, true),
            Strategy::Review => (self.review(item, recipe, &horizon)?, true),
        };

        let mut graph = PlanGraph::new();
        let mut previous: Option<String> = None;
        for (i, draft) in drafts.into_iter().enumerate() {
            let ordinal = i + 1;
            let id = format!("{}/{}-{ordinal}", item.id, recipe.kind.as_str());
            let mut node = PlanNode::new(
                id.clone(),
                item.id.clone(),
                draft.title,
                recipe.kind,
                (ordinal as i64) * 10,
            )
            .with_date(draft.date);
            node.expected_minutes = draft.minutes;
            graph.add_step(node)?;

            if chained {
                if let Some(prev) = &previous {
                    graph.add_edge(prev, &id)?;
                }
            }
            previous = Some(id);
        }

        debug!(
            "Generated {} steps for {} '{}'",
            graph.len(),
            item.category,
            item.id
        );

        Ok(AssignmentPlan {
            work_item_id: item.id.clone(),
            graph,
            enforce_dependencies: true,
            work_item: Some(item.clone()),
        })
    }

    /// Rebuilds a plan from `item` while keeping user-owned steps.
    ///
    /// Generated steps that still exist keep their completion flag. Existing
    /// dependencies are re-applied after the generated ones; those that are
    /// no longer valid are dropped.
    pub fn regenerate(&self, existing: &AssignmentPlan, item: &WorkItem) -> Result<AssignmentPlan> {
        let fresh = self.generate(item)?;
        let mut graph = PlanGraph::new();

        for step in fresh.graph.steps() {
            let merged = match existing.graph.step(&step.id) {
                Some(old) if old.is_user_owned() => old.clone(),
                Some(old) => PlanNode {
                    completed: old.completed,
                    ..step.clone()
                },
                None => step.clone(),
            };
            graph.add_step(merged)?;
        }
        for old in existing.graph.steps() {
            if old.is_user_owned() && !graph.contains(&old.id) {
                graph.add_step(old.clone())?;
            }
        }

        for edge in fresh.graph.edges().iter().chain(existing.graph.edges()) {
            if !graph.contains(&edge.from) || !graph.contains(&edge.to) {
                continue;
            }
            if graph.has_edge(&edge.from, &edge.to) {
                continue;
            }
            if let Err(e) = graph.add_edge(&edge.from, &edge.to) {
                debug!("Dropping dependency during regeneration: {e}");
            }
        }

        info!(
            "Regenerated plan '{}' with {} steps",
            item.id,
            graph.len()
        );

        Ok(AssignmentPlan {
            work_item_id: item.id.clone(),
            graph,
            enforce_dependencies: existing.enforce_dependencies,
            work_item: Some(item.clone()),
        })
    }

    fn spaced_sessions(
        &self,
        item: &WorkItem,
        recipe: &Recipe,
        horizon: &Horizon,
        max_steps: usize,
    ) -> Result<Vec<StepDraft>> {
        let wanted = div_ceil(item.estimated_minutes, self.config.max_session_minutes.max(1));
        let mut count = (wanted as usize).clamp(2, max_steps.max(2));
        if horizon.days >= 2 {
            count = count.min(horizon.days as usize);
        }

        let window = horizon.days.max(count as i64);
        let offsets = spaced_offsets(count, window);
        let minutes = split_even(item.estimated_minutes, count);

        offsets
            .into_iter()
            .zip(minutes)
            .enumerate()
            .map(|(i, (offset, minutes))| {
                Ok(StepDraft {
                    title: format!("{} {}", recipe.label, i + 1),
                    minutes: Some(minutes),
                    date: horizon.before_due(offset)?,
                })
            })
            .collect()
    }

    fn chunks(&self, item: &WorkItem, recipe: &Recipe, horizon: &Horizon) -> Result<Vec<StepDraft>> {
        let count = div_ceil(item.estimated_minutes, self.config.max_chunk_minutes.max(1)) as usize;
        split_even(item.estimated_minutes, count)
            .into_iter()
            .enumerate()
            .map(|(i, minutes)| {
                Ok(StepDraft {
                    title: format!("{} {}", recipe.label, i + 1),
                    minutes: Some(minutes),
                    date: horizon.before_due((count - i) as i64)?,
                })
            })
            .collect()
    }

    fn milestones(
        &self,
        item: &WorkItem,
        recipe: &Recipe,
        horizon: &Horizon,
    ) -> Result<Vec<StepDraft>> {
        if item.user_steps.is_empty() {
            let mut cumulative = 0;
            let mut assigned = 0;
            let last = DEFAULT_MILESTONES.len() - 1;
            return DEFAULT_MILESTONES
                .iter()
                .enumerate()
                .map(|(i, (title, percent))| {
                    cumulative += percent;
                    let minutes = if i == last {
                        item.estimated_minutes - assigned
                    } else {
                        percent_of(item.estimated_minutes, *percent)
                    };
                    assigned += minutes;
                    Ok(StepDraft {
                        title: (*title).to_string(),
                        minutes: Some(minutes),
                        date: horizon.at_percent(cumulative)?,
                    })
                })
                .collect();
        }

        let count = item.user_steps.len();
        let specified = item
            .user_steps
            .iter()
            .filter_map(|s| s.minutes)
            .fold(0u32, u32::saturating_add);
        let unspecified = item.user_steps.iter().filter(|s| s.minutes.is_none()).count();
        let mut spread = split_even(
            item.estimated_minutes.saturating_sub(specified),
            unspecified,
        )
        .into_iter();

        item.user_steps
            .iter()
            .enumerate()
            .map(|(i, step)| {
                let minutes = match step.minutes {
                    Some(m) => Some(m),
                    None => spread.next().filter(|m| *m > 0),
                };
                let title = if step.title.trim().is_empty() {
                    format!("{} {}", recipe.label, i + 1)
                } else {
                    step.title.clone()
                };
                let percent = u32::try_from((i + 1) * 100 / count).unwrap_or(100);
                Ok(StepDraft {
                    title,
                    minutes,
                    date: horizon.at_percent(percent)?,
                })
            })
            .collect()
    }

    fn review(&self, item: &WorkItem, recipe: &Recipe, horizon: &Horizon) -> Result<Vec<StepDraft>> {
        let count = if item.estimated_minutes > self.config.review_split_minutes {
            2
        } else {
            1
        };
        split_even(item.estimated_minutes, count)
            .into_iter()
            .enumerate()
            .map(|(i, minutes)| {
                let title = if count == 1 {
                    recipe.label.to_string()
                } else {
                    format!("{} {}", recipe.label, i + 1)
                };
                Ok(StepDraft {
                    title,
                    minutes: Some(minutes),
                    date: horizon.before_due((count - i) as i64)?,
                })
            })
            .collect()
    }
}
