//! Dependency graph of plan steps.
//!
//! [`PlanGraph`] stores steps and prerequisite edges as id-referenced
//! collections with adjacency indexes in both directions. Every mutation is
//! validated up front; a rejected mutation leaves the graph untouched.
//!
//! Acyclicity is checked with Kahn's in-degree queue, the same pass that
//! produces the deterministic topological order: ties between ready steps are
//! broken by ascending `sort_index`, then by insertion order.
//!
//! ```rust
//! use cadence_core::{graph::PlanGraph, models::{PlanNode, StepKind}};
//!
//! let mut graph = PlanGraph::new();
//! for (i, id) in ["a", "b", "c"].iter().enumerate() {
//!     graph.add_step(PlanNode::new(*id, "hw-1", *id, StepKind::Chunk, i as i64)).unwrap();
//! }
//! graph.add_edge("a", "b").unwrap();
//! graph.add_edge("b", "c").unwrap();
//! assert!(graph.add_edge("c", "a").is_err());
//! assert_eq!(graph.edges().len(), 2);
//! assert_eq!(graph.topological_sort().unwrap(), vec!["a", "b", "c"]);
//! ```

use std::{
    cmp::Reverse,
    collections::{BinaryHeap, HashMap, HashSet, VecDeque},
};

use log::debug;

use crate::{
    error::{CadenceError, Result, ValidationError},
    models::{PlanEdge, PlanNode, StepId},
};

#[cfg(test)]
mod tests;

/// Directed acyclic graph of steps and prerequisite edges.
#[derive(Debug, Clone, Default)]
pub struct PlanGraph {
    nodes: Vec<PlanNode>,
    index: HashMap<StepId, usize>,
    edges: Vec<PlanEdge>,
    prerequisites: HashMap<StepId, Vec<StepId>>,
    dependents: HashMap<StepId, Vec<StepId>>,
}

impl PartialEq for PlanGraph {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes && self.edges == other.edges
    }
}

/// Outcome of one Kahn pass.
struct KahnPass {
    order: Vec<StepId>,
    leftover: Vec<StepId>,
}

impl PlanGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a step. Ids must be unique.
    pub fn add_step(&mut self, step: PlanNode) -> Result<()> {
        if self.index.contains_key(&step.id) {
            return Err(ValidationError::DuplicateId { id: step.id }.into());
        }
        self.index.insert(step.id.clone(), self.nodes.len());
        self.nodes.push(step);
        Ok(())
    }

    /// Removes a step and every edge touching it.
    pub fn remove_step(&mut self, id: &str) -> Option<PlanNode> {
        let position = self.index.remove(id)?;
        let removed = self.nodes.remove(position);
        for (i, node) in self.nodes.iter().enumerate().skip(position) {
            self.index.insert(node.id.clone(), i);
        }

        self.edges.retain(|e| e.from != id && e.to != id);
        self.prerequisites.remove(id);
        self.dependents.remove(id);
        for list in self
            .prerequisites
            .values_mut()
            .chain(self.dependents.values_mut())
        {
            list.retain(|other| other != id);
        }
        Some(removed)
    }

    /// Adds the dependency `from -> to` after validating it.
    ///
    /// On any error the graph is left exactly as it was.
    pub fn add_edge(&mut self, from: &str, to: &str) -> Result<()> {
        if from == to {
            return Err(ValidationError::SelfLoop { id: from.into() }.into());
        }
        for endpoint in [from, to] {
            if !self.index.contains_key(endpoint) {
                return Err(ValidationError::OrphanEdge {
                    from: from.into(),
                    to: to.into(),
                    missing: endpoint.into(),
                }
                .into());
            }
        }
        if self.has_edge(from, to) {
            return Err(ValidationError::DuplicateEdge {
                from: from.into(),
                to: to.into(),
            }
            .into());
        }

        self.push_edge(from, to);
        let pass = self.kahn();
        if pass.leftover.is_empty() {
            debug!("Added dependency {from} -> {to}");
            return Ok(());
        }

        let path = self.cycle_path(from, to, &pass.leftover);
        self.pop_edge(from, to);
        debug!("Rejected dependency {from} -> {to}: cycle {path:?}");
        Err(ValidationError::CycleDetected { path }.into())
    }

    /// Removes the dependency `from -> to`; absent edges are ignored.
    pub fn remove_edge(&mut self, from: &str, to: &str) {
        if !self.has_edge(from, to) {
            return;
        }
        self.edges.retain(|e| !(e.from == from && e.to == to));
        if let Some(list) = self.dependents.get_mut(from) {
            list.retain(|d| d != to);
        }
        if let Some(list) = self.prerequisites.get_mut(to) {
            list.retain(|p| p != from);
        }
    }

    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        self.dependents
            .get(from)
            .is_some_and(|list| list.iter().any(|d| d == to))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn step(&self, id: &str) -> Option<&PlanNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn step_mut(&mut self, id: &str) -> Option<&mut PlanNode> {
        let i = *self.index.get(id)?;
        self.nodes.get_mut(i)
    }

    /// Steps in insertion order.
    pub fn steps(&self) -> &[PlanNode] {
        &self.nodes
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> &[PlanEdge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Direct prerequisites of `id` (sources of edges into it).
    pub fn prerequisites_of(&self, id: &str) -> &[StepId] {
        self.prerequisites.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Direct dependents of `id` (targets of edges out of it).
    pub fn dependents_of(&self, id: &str) -> &[StepId] {
        self.dependents.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_completed(&self, id: &str) -> bool {
        self.step(id).is_some_and(|s| s.completed)
    }

    /// True iff at least one direct prerequisite is incomplete.
    ///
    /// Evaluated from the prerequisites' current flags on every call.
    pub fn is_blocked(&self, id: &str) -> bool {
        self.prerequisites_of(id)
            .iter()
            .any(|p| !self.is_completed(p))
    }

    /// Direct prerequisites of `id` that are still incomplete.
    pub fn incomplete_prerequisites(&self, id: &str) -> Vec<&PlanNode> {
        self.prerequisites_of(id)
            .iter()
            .filter_map(|p| self.step(p))
            .filter(|s| !s.completed)
            .collect()
    }

    /// Sets the completion flag. Dependents are not touched.
    pub fn mark_completed(&mut self, id: &str) -> Result<()> {
        self.set_completed(id, true)
    }

    /// Clears the completion flag.
    pub fn mark_incomplete(&mut self, id: &str) -> Result<()> {
        self.set_completed(id, false)
    }

    fn set_completed(&mut self, id: &str, completed: bool) -> Result<()> {
        let step = self
            .step_mut(id)
            .ok_or_else(|| CadenceError::StepNotFound { id: id.into() })?;
        step.completed = completed;
        Ok(())
    }

    /// Deterministic topological order of all steps.
    ///
    /// Errors with `CycleDetected` if the graph somehow holds a cycle, which
    /// `add_edge` never allows.
    pub fn topological_sort(&self) -> Result<Vec<StepId>> {
        let pass = self.kahn();
        if pass.leftover.is_empty() {
            Ok(pass.order)
        } else {
            Err(ValidationError::CycleDetected {
                path: pass.leftover,
            }
            .into())
        }
    }

    /// Incomplete, unblocked steps in topological order.
    pub fn ready_steps(&self) -> Vec<&PlanNode> {
        self.kahn()
            .order
            .iter()
            .filter_map(|id| self.step(id))
            .filter(|s| !s.completed && !self.is_blocked(&s.id))
            .collect()
    }

    fn push_edge(&mut self, from: &str, to: &str) {
        self.edges.push(PlanEdge::new(from, to));
        self.dependents
            .entry(from.to_string())
            .or_default()
            .push(to.to_string());
        self.prerequisites
            .entry(to.to_string())
            .or_default()
            .push(from.to_string());
    }

    /// Undoes the most recent `push_edge(from, to)`.
    fn pop_edge(&mut self, from: &str, to: &str) {
        self.edges.pop();
        if let Some(list) = self.dependents.get_mut(from) {
            list.pop();
            if list.is_empty() {
                self.dependents.remove(from);
            }
        }
        if let Some(list) = self.prerequisites.get_mut(to) {
            list.pop();
            if list.is_empty() {
                self.prerequisites.remove(to);
            }
        }
    }

    fn kahn(&self) -> KahnPass {
        let mut in_degree: Vec<usize> = self
            .nodes
            .iter()
            .map(|n| self.prerequisites_of(&n.id).len())
            .collect();

        let mut ready: BinaryHeap<Reverse<(i64, usize)>> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(i, _)| in_degree[*i] == 0)
            .map(|(i, n)| Reverse((n.sort_index, i)))
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(Reverse((_, position))) = ready.pop() {
            let id = &self.nodes[position].id;
            for dependent in self.dependents_of(id) {
                let Some(&j) = self.index.get(dependent) else {
                    continue;
                };
                in_degree[j] -= 1;
                if in_degree[j] == 0 {
                    ready.push(Reverse((self.nodes[j].sort_index, j)));
                }
            }
            order.push(id.clone());
        }

        let emitted: HashSet<&str> = order.iter().map(String::as_str).collect();
        let leftover = self
            .nodes
            .iter()
            .filter(|n| !emitted.contains(n.id.as_str()))
            .map(|n| n.id.clone())
            .collect();

        KahnPass { order, leftover }
    }

    /// Path `from -> to -> ... -> from` closed by the edge just inserted,
    /// searched within the Kahn leftover set.
    fn cycle_path(&self, from: &str, to: &str, leftover: &[StepId]) -> Vec<StepId> {
        let allowed: HashSet<&str> = leftover.iter().map(String::as_str).collect();
        let mut parent: HashMap<&str, &str> = HashMap::new();
        let mut queue = VecDeque::from([to]);
        let mut seen = HashSet::from([to]);

        while let Some(current) = queue.pop_front() {
            if current == from {
                break;
            }
            for next in self.dependents_of(current) {
                let next = next.as_str();
                if allowed.contains(next) && seen.insert(next) {
                    parent.insert(next, current);
                    queue.push_back(next);
                }
            }
        }

        let mut path = vec![from.to_string()];
        let mut cursor = from;
        let mut back = Vec::new();
        while let Some(&prev) = parent.get(cursor) {
            back.push(prev.to_string());
            cursor = prev;
        }
        back.reverse();
        path.extend(back);
        path.push(from.to_string());
        path
    }
}
