//! Tests for the dependency graph.

use super::*;
use crate::models::StepKind;

fn node(id: &str, sort_index: i64) -> PlanNode {
    PlanNode::new(id, "work-1", format!("Step {id}"), StepKind::Chunk, sort_index)
}

fn graph_with(ids: &[&str]) -> PlanGraph {
    let mut graph = PlanGraph::new();
    for (i, id) in ids.iter().enumerate() {
        graph.add_step(node(id, i as i64)).expect("Failed to add step");
    }
    graph
}

fn diamond() -> PlanGraph {
    let mut graph = graph_with(&["a", "b", "c", "d"]);
    graph.add_edge("a", "b").unwrap();
    graph.add_edge("a", "c").unwrap();
    graph.add_edge("b", "d").unwrap();
    graph.add_edge("c", "d").unwrap();
    graph
}

fn validation(err: CadenceError) -> ValidationError {
    match err {
        CadenceError::Validation(v) => v,
        other => panic!("Expected validation error, got {other:?}"),
    }
}

#[test]
fn test_add_step_rejects_duplicate_id() {
    let mut graph = graph_with(&["a"]);
    let err = graph.add_step(node("a", 5)).unwrap_err();
    assert_eq!(validation(err), ValidationError::DuplicateId { id: "a".into() });
    assert_eq!(graph.len(), 1);
    assert_eq!(graph.step("a").unwrap().sort_index, 0);
}

#[test]
fn test_add_edge_rejects_self_loop() {
    let mut graph = graph_with(&["a"]);
    let err = graph.add_edge("a", "a").unwrap_err();
    assert_eq!(validation(err), ValidationError::SelfLoop { id: "a".into() });
    assert!(graph.edges().is_empty());
}

#[test]
fn test_add_edge_rejects_duplicate() {
    let mut graph = graph_with(&["a", "b"]);
    graph.add_edge("a", "b").unwrap();
    let err = graph.add_edge("a", "b").unwrap_err();
    assert!(matches!(
        validation(err),
        ValidationError::DuplicateEdge { .. }
    ));
    assert_eq!(graph.edges().len(), 1);
    assert_eq!(graph.prerequisites_of("b"), ["a".to_string()]);
}

#[test]
fn test_add_edge_rejects_unknown_endpoint() {
    let mut graph = graph_with(&["a"]);
    let err = graph.add_edge("a", "ghost").unwrap_err();
    assert_eq!(
        validation(err),
        ValidationError::OrphanEdge {
            from: "a".into(),
            to: "ghost".into(),
            missing: "ghost".into(),
        }
    );
}

#[test]
fn test_cycle_rejection_leaves_graph_unchanged() {
    let mut graph = graph_with(&["a", "b", "c"]);
    graph.add_edge("a", "b").unwrap();
    graph.add_edge("b", "c").unwrap();
    let before = graph.clone();

    let err = graph.add_edge("c", "a").unwrap_err();
    assert_eq!(
        validation(err),
        ValidationError::CycleDetected {
            path: vec!["c".into(), "a".into(), "b".into(), "c".into()],
        }
    );

    assert_eq!(graph, before);
    assert_eq!(
        graph.edges(),
        [PlanEdge::new("a", "b"), PlanEdge::new("b", "c")]
    );
    assert!(graph.dependents_of("c").is_empty());
    assert_eq!(graph.prerequisites_of("a").len(), 0);
}

#[test]
fn test_two_node_cycle_rejected() {
    let mut graph = graph_with(&["a", "b"]);
    graph.add_edge("a", "b").unwrap();
    let err = graph.add_edge("b", "a").unwrap_err();
    assert_eq!(
        validation(err),
        ValidationError::CycleDetected {
            path: vec!["b".into(), "a".into(), "b".into()],
        }
    );
    assert_eq!(graph.topological_sort().unwrap(), vec!["a", "b"]);
}

#[test]
fn test_random_edge_attempts_keep_graph_acyclic() {
    let ids = ["s0", "s1", "s2", "s3", "s4", "s5"];
    let mut graph = graph_with(&ids);

    // Deterministic pseudo-random pairs.
    let mut seed: u64 = 42;
    for _ in 0..200 {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let u = ids[(seed >> 33) as usize % ids.len()];
        let v = ids[(seed >> 13) as usize % ids.len()];
        let before = graph.clone();
        match graph.add_edge(u, v) {
            Ok(()) => assert!(graph.topological_sort().is_ok()),
            Err(_) => assert_eq!(graph, before),
        }
    }
    assert!(graph.topological_sort().is_ok());
}

#[test]
fn test_remove_edge_is_noop_when_absent() {
    let mut graph = graph_with(&["a", "b"]);
    graph.remove_edge("a", "b");
    graph.remove_edge("ghost", "a");
    assert!(graph.edges().is_empty());

    graph.add_edge("a", "b").unwrap();
    graph.remove_edge("a", "b");
    assert!(graph.edges().is_empty());
    assert!(!graph.is_blocked("b"));
    // Re-adding after removal works
    graph.add_edge("a", "b").unwrap();
    assert!(graph.is_blocked("b"));
}

#[test]
fn test_topological_sort_orders_ties_by_sort_index() {
    let mut graph = PlanGraph::new();
    graph.add_step(node("late", 30)).unwrap();
    graph.add_step(node("early", 10)).unwrap();
    graph.add_step(node("middle", 20)).unwrap();

    let first = graph.topological_sort().unwrap();
    assert_eq!(first, vec!["early", "middle", "late"]);
    assert_eq!(graph.topological_sort().unwrap(), first);
}

#[test]
fn test_topological_sort_equal_sort_index_uses_insertion_order() {
    let mut graph = PlanGraph::new();
    for id in ["zeta", "alpha", "mu"] {
        graph.add_step(node(id, 0)).unwrap();
    }
    assert_eq!(
        graph.topological_sort().unwrap(),
        vec!["zeta", "alpha", "mu"]
    );
}

#[test]
fn test_topological_sort_respects_edges_over_sort_index() {
    let mut graph = PlanGraph::new();
    graph.add_step(node("a", 5)).unwrap();
    graph.add_step(node("b", 1)).unwrap();
    graph.add_step(node("c", 0)).unwrap();
    graph.add_edge("a", "b").unwrap();

    // c and a are ready first; b waits for a despite its low sort index
    assert_eq!(graph.topological_sort().unwrap(), vec!["c", "a", "b"]);
}

#[test]
fn test_diamond_blocking() {
    let mut graph = diamond();
    assert!(!graph.is_blocked("a"));
    assert!(graph.is_blocked("b"));
    assert!(graph.is_blocked("c"));
    assert!(graph.is_blocked("d"));

    graph.mark_completed("a").unwrap();
    assert!(!graph.is_blocked("b"));
    assert!(!graph.is_blocked("c"));
    assert!(graph.is_blocked("d"));

    graph.mark_completed("b").unwrap();
    assert!(graph.is_blocked("d"), "partial completion must not unblock");

    graph.mark_completed("c").unwrap();
    assert!(!graph.is_blocked("d"));
}

#[test]
fn test_blocked_status_follows_completion_order() {
    let mut graph = diamond();
    graph.mark_completed("c").unwrap();
    graph.mark_completed("b").unwrap();
    // a is incomplete but only direct prerequisites count for d
    assert!(!graph.is_blocked("d"));

    graph.mark_incomplete("b").unwrap();
    assert!(graph.is_blocked("d"));
}

#[test]
fn test_ready_steps_in_topological_order() {
    let mut graph = diamond();
    let ready: Vec<&str> = graph.ready_steps().iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ready, vec!["a"]);

    graph.mark_completed("a").unwrap();
    let ready: Vec<&str> = graph.ready_steps().iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ready, vec!["b", "c"]);
}

#[test]
fn test_neighbor_queries() {
    let graph = diamond();
    assert_eq!(graph.dependents_of("a"), ["b".to_string(), "c".to_string()]);
    assert_eq!(graph.prerequisites_of("d"), ["b".to_string(), "c".to_string()]);
    assert!(graph.prerequisites_of("a").is_empty());
    assert!(graph.dependents_of("unknown").is_empty());
    assert!(!graph.is_blocked("unknown"));
}

#[test]
fn test_mark_completed_unknown_step() {
    let mut graph = graph_with(&["a"]);
    let err = graph.mark_completed("nope").unwrap_err();
    assert!(matches!(err, CadenceError::StepNotFound { .. }));
}

#[test]
fn test_remove_step_drops_incident_edges() {
    let mut graph = diamond();
    let removed = graph.remove_step("b").expect("step exists");
    assert_eq!(removed.id, "b");
    assert_eq!(graph.len(), 3);
    assert_eq!(
        graph.edges(),
        [PlanEdge::new("a", "c"), PlanEdge::new("c", "d")]
    );
    assert_eq!(graph.prerequisites_of("d"), ["c".to_string()]);
    assert_eq!(graph.step("d").unwrap().id, "d");
    assert_eq!(graph.topological_sort().unwrap(), vec!["a", "c", "d"]);
    assert!(graph.remove_step("b").is_none());
}
