//! Multi-hop path discovery between concepts.
//!
//! Breadth-first search over the forward adjacency index only, bounded by a
//! hop limit. BFS guarantees the returned path is shortest by hop count;
//! ties break by discovery order, which callers must not rely on. Path
//! confidence is the product of the traversed edge confidences, so a single
//! weak link dominates the whole path's trustworthiness.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::concept::{ConceptId, EdgeId, InferenceKind};
use crate::graph::store::GraphStore;

/// A discovered path through the knowledge graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticPath {
    /// Visited concepts, source first, target last.
    pub concepts: Vec<ConceptId>,
    /// Traversed edges, one per hop.
    pub edges: Vec<EdgeId>,
    /// Relation of each traversed edge, aligned with `edges`.
    pub kinds: Vec<InferenceKind>,
    /// Number of hops (`edges.len()`).
    pub hops: usize,
    /// Product of the traversed edge confidences.
    pub confidence: f32,
}

/// Find a shortest path (by hop count) from `source` to `target`.
///
/// Only outgoing edges are traversed. Returns `None` when either endpoint
/// is unknown or the target is unreachable within `max_hops` — absence of
/// a path is a value, not an error. A query where source equals target
/// yields the trivial zero-hop path at confidence 1.0.
pub fn find_path(
    store: &GraphStore,
    source: ConceptId,
    target: ConceptId,
    max_hops: usize,
) -> Option<SemanticPath> {
    if store.concept(source).is_none() || store.concept(target).is_none() {
        return None;
    }
    if source == target {
        return Some(SemanticPath {
            concepts: vec![source],
            edges: Vec::new(),
            kinds: Vec::new(),
            hops: 0,
            confidence: 1.0,
        });
    }

    // parent[n] = (predecessor, edge taken to reach n)
    let mut parent: HashMap<ConceptId, (ConceptId, EdgeId)> = HashMap::new();
    let mut queue: VecDeque<(ConceptId, usize)> = VecDeque::new();
    queue.push_back((source, 0));

    while let Some((node, depth)) = queue.pop_front() {
        if depth >= max_hops {
            continue;
        }
        for edge in store.edges_from(node) {
            if edge.target == source || parent.contains_key(&edge.target) {
                continue;
            }
            parent.insert(edge.target, (node, edge.id));
            if edge.target == target {
                return Some(reconstruct(store, source, target, &parent));
            }
            queue.push_back((edge.target, depth + 1));
        }
    }
    None
}

fn reconstruct(
    store: &GraphStore,
    source: ConceptId,
    target: ConceptId,
    parent: &HashMap<ConceptId, (ConceptId, EdgeId)>,
) -> SemanticPath {
    let mut concepts = vec![target];
    let mut edges = Vec::new();
    let mut cursor = target;
    while cursor != source {
        let (prev, edge) = parent[&cursor];
        edges.push(edge);
        concepts.push(prev);
        cursor = prev;
    }
    concepts.reverse();
    edges.reverse();

    let kinds: Vec<InferenceKind> = edges
        .iter()
        .filter_map(|id| store.edge(*id).map(|e| e.kind))
        .collect();
    let confidence = edges
        .iter()
        .filter_map(|id| store.edge(*id).map(|e| e.confidence))
        .product();
    let hops = edges.len();

    SemanticPath {
        concepts,
        edges,
        kinds,
        hops,
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EdgeDraft;

    fn chain() -> GraphStore {
        // a --IsA(0.9)--> b --IsA(0.5)--> c
        let mut s = GraphStore::new(4);
        s.upsert_edge(EdgeDraft::new("a", "b", InferenceKind::IsA).with_confidence(0.9))
            .unwrap();
        s.upsert_edge(EdgeDraft::new("b", "c", InferenceKind::IsA).with_confidence(0.5))
            .unwrap();
        s
    }

    fn id(s: &GraphStore, name: &str) -> ConceptId {
        s.concept_id_by_name(name).unwrap()
    }

    #[test]
    fn path_confidence_is_multiplicative() {
        let s = chain();
        let path = find_path(&s, id(&s, "a"), id(&s, "c"), 5).unwrap();
        assert_eq!(path.hops, 2);
        assert_eq!(path.concepts, vec![id(&s, "a"), id(&s, "b"), id(&s, "c")]);
        assert_eq!(path.kinds, vec![InferenceKind::IsA, InferenceKind::IsA]);
        // 0.9 * 0.5, not the 0.7 average.
        assert!((path.confidence - 0.45).abs() < 1e-6);
    }

    #[test]
    fn bfs_prefers_fewest_hops() {
        let mut s = chain();
        s.upsert_edge(EdgeDraft::new("a", "c", InferenceKind::AssociatedWith).with_confidence(0.2))
            .unwrap();
        let path = find_path(&s, id(&s, "a"), id(&s, "c"), 5).unwrap();
        // The direct edge wins even though its confidence is lower.
        assert_eq!(path.hops, 1);
        assert!((path.confidence - 0.2).abs() < 1e-6);
    }

    #[test]
    fn hop_bound_is_respected() {
        let s = chain();
        assert!(find_path(&s, id(&s, "a"), id(&s, "c"), 1).is_none());
        assert!(find_path(&s, id(&s, "a"), id(&s, "c"), 2).is_some());
    }

    #[test]
    fn search_is_directional() {
        let s = chain();
        // Edges point a -> b -> c; nothing leads back.
        assert!(find_path(&s, id(&s, "c"), id(&s, "a"), 5).is_none());
    }

    #[test]
    fn unknown_endpoint_is_none_not_error() {
        let s = chain();
        let ghost = ConceptId::new(999).unwrap();
        assert!(find_path(&s, id(&s, "a"), ghost, 5).is_none());
        assert!(find_path(&s, ghost, id(&s, "a"), 5).is_none());
    }

    #[test]
    fn trivial_self_path() {
        let s = chain();
        let path = find_path(&s, id(&s, "a"), id(&s, "a"), 5).unwrap();
        assert_eq!(path.hops, 0);
        assert!((path.confidence - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn cycles_do_not_loop_forever() {
        let mut s = GraphStore::new(4);
        s.upsert_edge(EdgeDraft::new("a", "b", InferenceKind::Causes)).unwrap();
        s.upsert_edge(EdgeDraft::new("b", "a", InferenceKind::Causes)).unwrap();
        s.upsert_concept(crate::graph::ConceptDraft::new(
            "island",
            crate::concept::ConceptKind::Entity,
        ))
        .unwrap();
        assert!(find_path(&s, id(&s, "a"), id(&s, "island"), 10).is_none());
    }
}
