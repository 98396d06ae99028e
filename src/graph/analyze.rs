//! Read-only concept metrics and component analysis.
//!
//! All functions operate on a [`GraphStore`] snapshot and never mutate it,
//! so they run under the facade's shared lock. Scores are normalized to
//! [0.0, 1.0].

use std::collections::HashSet;

use crate::concept::{ConceptId, ConceptNode, now_secs};

use super::store::GraphStore;

/// Normalization caps for [`ConceptAnalyzer::semantic_richness`]. A node at
/// or beyond a cap saturates that channel.
const RICHNESS_DESCRIPTION_CAP: f32 = 200.0;
const RICHNESS_PROPERTY_CAP: f32 = 10.0;
const RICHNESS_FREQUENCY_CAP: f32 = 20.0;
const RICHNESS_DIMENSION_CAP: f32 = 100.0;

/// Read-only metrics over a graph snapshot.
///
/// The recency window is fixed at construction; callers needing a different
/// decay horizon build a differently parameterized analyzer.
#[derive(Debug, Clone)]
pub struct ConceptAnalyzer {
    window_days: f32,
}

impl ConceptAnalyzer {
    /// Analyzer with the given recency window in days.
    pub fn new(window_days: u32) -> Self {
        Self {
            window_days: window_days.max(1) as f32,
        }
    }

    /// Degree centrality: (in-degree + out-degree) / total node count.
    ///
    /// 0.0 for an unknown id or an empty graph.
    pub fn centrality(&self, store: &GraphStore, id: ConceptId) -> f32 {
        let total = store.concept_count();
        if total == 0 || store.concept(id).is_none() {
            return 0.0;
        }
        let degree = store.edges_from(id).len() + store.edges_to(id).len();
        degree as f32 / total as f32
    }

    /// Connectivity: distinct neighbors in either direction / total node count.
    pub fn connectivity(&self, store: &GraphStore, id: ConceptId) -> f32 {
        let total = store.concept_count();
        if total == 0 || store.concept(id).is_none() {
            return 0.0;
        }
        let mut neighbors = store.neighbors_out(id);
        neighbors.extend(store.neighbors_in(id));
        neighbors.len() as f32 / total as f32
    }

    /// Semantic richness: normalized blend of description length, property
    /// count, assertion frequency, and embedding dimensionality.
    pub fn semantic_richness(&self, node: &ConceptNode) -> f32 {
        let description = (node.description.len() as f32 / RICHNESS_DESCRIPTION_CAP).min(1.0);
        let properties = (node.properties.len() as f32 / RICHNESS_PROPERTY_CAP).min(1.0);
        let frequency = (node.frequency as f32 / RICHNESS_FREQUENCY_CAP).min(1.0);
        let dimension = node
            .semantic_vector
            .as_ref()
            .map(|v| (v.len() as f32 / RICHNESS_DIMENSION_CAP).min(1.0))
            .unwrap_or(0.0);
        ((description + properties + frequency + dimension) / 4.0).clamp(0.0, 1.0)
    }

    /// Recency of the last update, decayed linearly over the window:
    /// `max(0, 1 - days_since(last_updated) / window_days)`.
    pub fn temporal_activity(&self, node: &ConceptNode) -> f32 {
        self.temporal_activity_at(node, now_secs())
    }

    /// As [`Self::temporal_activity`], against an explicit clock.
    pub fn temporal_activity_at(&self, node: &ConceptNode, now: u64) -> f32 {
        let elapsed_days = now.saturating_sub(node.last_updated) as f32 / 86_400.0;
        (1.0 - elapsed_days / self.window_days).max(0.0)
    }
}

impl Default for ConceptAnalyzer {
    fn default() -> Self {
        Self::new(30)
    }
}

/// Count weakly connected components: iterative DFS over the union of
/// forward and reverse adjacency.
pub fn connected_components(store: &GraphStore) -> usize {
    let mut visited: HashSet<ConceptId> = HashSet::new();
    let mut components = 0;

    for start in store.concept_ids() {
        if !visited.insert(start) {
            continue;
        }
        components += 1;
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            for next in store.neighbors_out(node).into_iter().chain(store.neighbors_in(node)) {
                if visited.insert(next) {
                    stack.push(next);
                }
            }
        }
    }
    components
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concept::{ConceptKind, InferenceKind};
    use crate::graph::{ConceptDraft, EdgeDraft};

    fn star_store() -> GraphStore {
        // hub --AssociatedWith--> s1..s4
        let mut s = GraphStore::new(4);
        for spoke in ["s1", "s2", "s3", "s4"] {
            s.upsert_edge(EdgeDraft::new("hub", spoke, InferenceKind::AssociatedWith))
                .unwrap();
        }
        s
    }

    #[test]
    fn centrality_of_hub() {
        let s = star_store();
        let analyzer = ConceptAnalyzer::default();
        let hub = s.concept_id_by_name("hub").unwrap();
        let spoke = s.concept_id_by_name("s1").unwrap();
        // 4 edges / 5 nodes vs 1 edge / 5 nodes.
        assert!((analyzer.centrality(&s, hub) - 0.8).abs() < 1e-6);
        assert!((analyzer.centrality(&s, spoke) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn centrality_unknown_id_is_zero() {
        let s = star_store();
        let analyzer = ConceptAnalyzer::default();
        let ghost = ConceptId::new(999).unwrap();
        assert_eq!(analyzer.centrality(&s, ghost), 0.0);
    }

    #[test]
    fn connectivity_counts_distinct_neighbors() {
        let mut s = star_store();
        // A second relation to an existing neighbor adds an edge but no
        // new neighbor: centrality moves, connectivity does not.
        s.upsert_edge(EdgeDraft::new("hub", "s1", InferenceKind::SimilarTo))
            .unwrap();
        let analyzer = ConceptAnalyzer::default();
        let hub = s.concept_id_by_name("hub").unwrap();
        assert!((analyzer.connectivity(&s, hub) - 0.8).abs() < 1e-6);
        assert!((analyzer.centrality(&s, hub) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn richness_saturates_at_caps() {
        let mut s = GraphStore::new(100);
        let id = s
            .upsert_concept(
                ConceptDraft::new("dense", ConceptKind::Abstract)
                    .with_description("d".repeat(500))
                    .with_vector(vec![0.1; 100]),
            )
            .unwrap();
        let mut node = s.concept(id).unwrap().clone();
        for i in 0..12 {
            node.properties.insert(format!("p{i}"), true.into());
        }
        node.frequency = 50;

        let analyzer = ConceptAnalyzer::default();
        let richness = analyzer.semantic_richness(&node);
        assert!((richness - 1.0).abs() < 1e-6);
    }

    #[test]
    fn richness_of_bare_node_is_low() {
        let mut s = GraphStore::new(4);
        let id = s
            .upsert_concept(ConceptDraft::new("bare", ConceptKind::Entity))
            .unwrap();
        let analyzer = ConceptAnalyzer::default();
        let richness = analyzer.semantic_richness(s.concept(id).unwrap());
        assert!(richness < 0.1);
    }

    #[test]
    fn temporal_activity_decays_over_window() {
        let mut s = GraphStore::new(4);
        let id = s
            .upsert_concept(ConceptDraft::new("x", ConceptKind::Entity))
            .unwrap();
        let node = s.concept(id).unwrap();
        let analyzer = ConceptAnalyzer::new(30);

        let fresh = analyzer.temporal_activity_at(node, node.last_updated);
        assert!((fresh - 1.0).abs() < 1e-6);

        let half = analyzer.temporal_activity_at(node, node.last_updated + 15 * 86_400);
        assert!((half - 0.5).abs() < 1e-6);

        let stale = analyzer.temporal_activity_at(node, node.last_updated + 60 * 86_400);
        assert_eq!(stale, 0.0);
    }

    #[test]
    fn component_count() {
        let mut s = GraphStore::new(4);
        s.upsert_edge(EdgeDraft::new("a", "b", InferenceKind::IsA)).unwrap();
        s.upsert_edge(EdgeDraft::new("b", "c", InferenceKind::IsA)).unwrap();
        s.upsert_edge(EdgeDraft::new("x", "y", InferenceKind::Causes)).unwrap();
        s.upsert_concept(ConceptDraft::new("lonely", ConceptKind::Entity)).unwrap();

        assert_eq!(connected_components(&s), 3);
    }

    #[test]
    fn empty_graph_has_zero_components() {
        let s = GraphStore::new(4);
        assert_eq!(connected_components(&s), 0);
    }
}
