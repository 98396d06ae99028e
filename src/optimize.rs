//! Graph maintenance: pruning and near-duplicate merging.
//!
//! The pass runs three ordered steps under the facade's exclusive lock:
//! prune low-confidence nodes (cascading to their edges), prune remaining
//! low-confidence edges, then merge near-duplicate concepts. Pruning runs
//! first so the pairwise similarity scan never wastes comparisons on nodes
//! that are about to be discarded.

use std::collections::HashSet;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::concept::ConceptId;
use crate::graph::store::GraphStore;
use crate::similarity::SimilarityCache;

/// Thresholds governing a maintenance pass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Nodes and edges below this confidence are pruned.
    pub min_confidence: f32,
    /// Concept pairs at or above this similarity are merged.
    pub similarity_threshold: f32,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.3,
            similarity_threshold: 0.7,
        }
    }
}

/// What a maintenance pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizeReport {
    /// Nodes removed by the confidence prune.
    pub nodes_pruned: usize,
    /// Edges removed, counting both cascades and the direct edge prune.
    pub edges_pruned: usize,
    /// Concept pairs merged.
    pub merges: usize,
}

impl std::fmt::Display for OptimizeReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "pruned {} node(s) and {} edge(s), merged {} pair(s)",
            self.nodes_pruned, self.edges_pruned, self.merges
        )
    }
}

/// The maintenance pass. Stateless apart from its thresholds; safe to run
/// periodically or after bulk ingestion.
#[derive(Debug, Clone)]
pub struct SemanticOptimizer {
    config: OptimizerConfig,
}

impl SemanticOptimizer {
    /// Optimizer with the given thresholds.
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    /// The configured thresholds.
    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Run one full pass: prune nodes, prune edges, merge near-duplicates.
    ///
    /// Each node participates in at most one merge per pass (first match
    /// wins), so merge chains cannot form within a single invocation;
    /// repeated passes converge. Cache entries for removed concepts are
    /// dropped before returning.
    pub fn run(&self, store: &mut GraphStore, cache: &SimilarityCache) -> OptimizeReport {
        let mut report = OptimizeReport::default();
        let mut removed: HashSet<ConceptId> = HashSet::new();

        // Step 1: prune low-confidence nodes, cascading to their edges.
        let doomed_nodes: Vec<ConceptId> = store
            .all_concepts()
            .filter(|n| n.confidence < self.config.min_confidence)
            .map(|n| n.id)
            .collect();
        for id in doomed_nodes {
            report.edges_pruned += store.remove_concept(id);
            report.nodes_pruned += 1;
            removed.insert(id);
        }

        // Step 2: prune remaining low-confidence edges.
        let doomed_edges: Vec<_> = store
            .all_edges()
            .filter(|e| e.confidence < self.config.min_confidence)
            .map(|e| e.id)
            .collect();
        for id in doomed_edges {
            if store.remove_edge(id) {
                report.edges_pruned += 1;
            }
        }

        // Step 3: merge near-duplicates. Scoring is read-only and runs in
        // parallel; merges apply serially afterward. Candidates are ordered
        // by id so the pass is deterministic regardless of table iteration.
        let mut nodes: Vec<&_> = store.all_concepts().collect();
        nodes.sort_by_key(|n| n.id);

        let threshold = self.config.similarity_threshold;
        let mut candidates: Vec<(ConceptId, ConceptId, f32)> = (0..nodes.len())
            .into_par_iter()
            .flat_map_iter(|i| {
                let nodes = &nodes;
                (i + 1..nodes.len()).filter_map(move |j| {
                    let score = cache.score(nodes[i], nodes[j]);
                    (score >= threshold).then_some((nodes[i].id, nodes[j].id, score))
                })
            })
            .collect();
        candidates.sort_by_key(|(a, b, _)| (*a, *b));

        let mut merged: HashSet<ConceptId> = HashSet::new();
        for (keep, absorbed, score) in candidates {
            if merged.contains(&keep) || merged.contains(&absorbed) {
                continue;
            }
            if store.merge_concepts(keep, absorbed) {
                tracing::debug!(%keep, %absorbed, score, "merged near-duplicate concepts");
                merged.insert(keep);
                merged.insert(absorbed);
                removed.insert(absorbed);
                report.merges += 1;
            }
        }

        cache.forget(&removed);
        tracing::info!(
            nodes_pruned = report.nodes_pruned,
            edges_pruned = report.edges_pruned,
            merges = report.merges,
            "optimizer pass complete"
        );
        report
    }
}

impl Default for SemanticOptimizer {
    fn default() -> Self {
        Self::new(OptimizerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concept::{ConceptKind, InferenceKind};
    use crate::graph::{ConceptDraft, EdgeDraft};

    fn run(store: &mut GraphStore) -> OptimizeReport {
        let cache = SimilarityCache::new();
        SemanticOptimizer::default().run(store, &cache)
    }

    #[test]
    fn prunes_low_confidence_nodes_with_cascade() {
        let mut s = GraphStore::new(4);
        s.upsert_concept(ConceptDraft::new("weak", ConceptKind::Entity).with_confidence(0.1))
            .unwrap();
        s.upsert_edge(EdgeDraft::new("strong", "weak", InferenceKind::IsA).with_confidence(0.9))
            .unwrap();

        let report = run(&mut s);
        assert_eq!(report.nodes_pruned, 1);
        assert_eq!(report.edges_pruned, 1);
        assert!(s.concept_by_name("weak").is_none());
        assert!(s.concept_by_name("strong").is_some());
    }

    #[test]
    fn prunes_low_confidence_edges() {
        let mut s = GraphStore::new(4);
        s.upsert_edge(EdgeDraft::new("a", "b", InferenceKind::Causes).with_confidence(0.1))
            .unwrap();
        s.upsert_edge(EdgeDraft::new("a", "c", InferenceKind::Causes).with_confidence(0.8))
            .unwrap();

        let report = run(&mut s);
        assert_eq!(report.edges_pruned, 1);
        assert_eq!(s.edge_count(), 1);
    }

    #[test]
    fn pruning_is_monotone_at_threshold() {
        let mut s = GraphStore::new(4);
        for (name, conf) in [("a", 0.29), ("b", 0.3), ("c", 0.95)] {
            s.upsert_concept(
                ConceptDraft::new(name, ConceptKind::Entity).with_confidence(conf),
            )
            .unwrap();
        }

        run(&mut s);
        // Strictly-below is pruned; exactly-at survives.
        assert!(s.concept_by_name("a").is_none());
        assert!(s.concept_by_name("b").is_some());
        for node in s.all_concepts() {
            assert!(node.confidence >= 0.3);
        }
    }

    #[test]
    fn merges_near_duplicates_and_preserves_reachability() {
        let mut s = GraphStore::new(3);
        let vector = vec![0.2, 0.9, 0.4];
        s.upsert_concept(ConceptDraft::new("car", ConceptKind::Entity).with_vector(vector.clone()))
            .unwrap();
        s.upsert_concept(
            ConceptDraft::new("automobile", ConceptKind::Entity).with_vector(vector),
        )
        .unwrap();
        s.upsert_edge(
            EdgeDraft::new("wheel", "automobile", InferenceKind::PartOf).with_confidence(0.9),
        )
        .unwrap();

        let car = s.concept_id_by_name("car").unwrap();
        let wheel = s.concept_id_by_name("wheel").unwrap();

        let report = run(&mut s);
        assert_eq!(report.merges, 1);
        // car was created first, so it survives and absorbs automobile.
        assert!(s.concept(car).is_some());
        assert!(s.concept_by_name("automobile").is_none());
        // The wheel edge now ends at car: reachability preserved.
        assert!(s.neighbors_out(wheel).contains(&car));
    }

    #[test]
    fn one_merge_per_node_per_pass() {
        let mut s = GraphStore::new(2);
        let vector = vec![1.0, 0.0];
        for name in ["alpha", "beta", "gamma"] {
            s.upsert_concept(
                ConceptDraft::new(name, ConceptKind::Entity).with_vector(vector.clone()),
            )
            .unwrap();
        }

        let report = run(&mut s);
        // alpha absorbs beta; gamma must wait for the next pass.
        assert_eq!(report.merges, 1);
        assert_eq!(s.concept_count(), 2);

        let cache = SimilarityCache::new();
        let second = SemanticOptimizer::default().run(&mut s, &cache);
        assert_eq!(second.merges, 1);
        assert_eq!(s.concept_count(), 1);
    }

    #[test]
    fn concepts_without_vectors_never_merge() {
        let mut s = GraphStore::new(4);
        s.upsert_concept(ConceptDraft::new("twin-a", ConceptKind::Entity)).unwrap();
        s.upsert_concept(ConceptDraft::new("twin-b", ConceptKind::Entity)).unwrap();

        let report = run(&mut s);
        assert_eq!(report.merges, 0);
        assert_eq!(s.concept_count(), 2);
    }

    #[test]
    fn empty_graph_pass_is_clean() {
        let mut s = GraphStore::new(4);
        let report = run(&mut s);
        assert_eq!(report, OptimizeReport::default());
    }

    #[test]
    fn report_display() {
        let report = OptimizeReport {
            nodes_pruned: 2,
            edges_pruned: 5,
            merges: 1,
        };
        assert_eq!(
            report.to_string(),
            "pruned 2 node(s) and 5 edge(s), merged 1 pair(s)"
        );
    }
}
