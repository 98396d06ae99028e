//! Engine facade: the public API of the noema knowledge graph.
//!
//! [`KnowledgeEngine`] owns the single [`GraphStore`] instance and its
//! concurrency discipline: a coarse `RwLock` taken exclusively for upserts
//! and the optimizer pass, and shared for analyzers, inference, and path
//! finding. Merge cascades are therefore observed atomically or not at all.

use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::concept::{ConceptId, ConceptNode, EdgeId, InferenceKind};
use crate::error::{EngineError, NoemaResult};
use crate::graph::analyze::{ConceptAnalyzer, connected_components};
use crate::graph::store::GraphStore;
use crate::graph::{ConceptDraft, EdgeDraft};
use crate::infer::{InferenceCandidate, InferenceEngine};
use crate::optimize::{OptimizeReport, OptimizerConfig, SemanticOptimizer};
use crate::paths::{self, SemanticPath};
use crate::similarity::SimilarityCache;

/// Configuration for the knowledge engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Dimension every supplied semantic vector must match (default: 100).
    pub vector_dim: usize,
    /// Thresholds for the maintenance pass.
    pub optimizer: OptimizerConfig,
    /// Recency window for temporal activity, in days (default: 30).
    pub activity_window_days: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            vector_dim: 100,
            optimizer: OptimizerConfig::default(),
            activity_window_days: 30,
        }
    }
}

/// A single item in a batch ingest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Assertion {
    /// Assert a concept.
    Concept(ConceptDraft),
    /// Assert a relation between two concepts.
    Edge(EdgeDraft),
}

/// The id produced by a successful assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssertionId {
    Concept(ConceptId),
    Edge(EdgeId),
}

/// Per-concept metrics bundle, computed on demand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConceptReport {
    /// Degree centrality in [0, 1].
    pub centrality: f32,
    /// Neighbor connectivity in [0, 1].
    pub connectivity: f32,
    /// Semantic richness in [0, 1].
    pub richness: f32,
    /// Recency of the last update in [0, 1].
    pub activity: f32,
}

/// Summary of the graph's current shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineStatus {
    /// Live concept count.
    pub concept_count: usize,
    /// Live edge count.
    pub edge_count: usize,
    /// Mean confidence over all live concepts (0 on an empty graph).
    pub mean_confidence: f32,
    /// Directed density: edges / (n * (n - 1)), 0 for fewer than two nodes.
    pub density: f32,
    /// Weakly connected component count.
    pub components: usize,
}

impl std::fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "noema engine status")?;
        writeln!(f, "  concepts:        {}", self.concept_count)?;
        writeln!(f, "  edges:           {}", self.edge_count)?;
        writeln!(f, "  mean confidence: {:.3}", self.mean_confidence)?;
        writeln!(f, "  density:         {:.4}", self.density)?;
        writeln!(f, "  components:      {}", self.components)?;
        Ok(())
    }
}

/// The semantic knowledge graph engine.
///
/// Owns the graph store, the similarity cache, the analyzer, and the
/// optimizer. All methods take `&self`; internal locking provides the
/// single-writer/many-reader discipline.
pub struct KnowledgeEngine {
    config: EngineConfig,
    store: RwLock<GraphStore>,
    cache: SimilarityCache,
    analyzer: ConceptAnalyzer,
    optimizer: SemanticOptimizer,
}

impl KnowledgeEngine {
    /// Create a new engine with the given configuration.
    pub fn new(config: EngineConfig) -> NoemaResult<Self> {
        if config.vector_dim == 0 {
            return Err(EngineError::InvalidConfig {
                message: "vector_dim must be > 0".into(),
            }
            .into());
        }
        tracing::info!(
            vector_dim = config.vector_dim,
            min_confidence = config.optimizer.min_confidence,
            similarity_threshold = config.optimizer.similarity_threshold,
            "initializing noema engine"
        );
        Ok(Self {
            store: RwLock::new(GraphStore::new(config.vector_dim)),
            cache: SimilarityCache::new(),
            analyzer: ConceptAnalyzer::new(config.activity_window_days),
            optimizer: SemanticOptimizer::new(config.optimizer),
            config,
        })
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Ingestion
    // -----------------------------------------------------------------------

    /// Create or merge a concept; see `GraphStore::upsert_concept`.
    pub fn upsert_concept(&self, draft: ConceptDraft) -> NoemaResult<ConceptId> {
        let mut store = self.store.write().expect("graph lock poisoned");
        Ok(store.upsert_concept(draft)?)
    }

    /// Create or reinforce an edge; see `GraphStore::upsert_edge`.
    pub fn upsert_edge(&self, draft: EdgeDraft) -> NoemaResult<EdgeId> {
        let mut store = self.store.write().expect("graph lock poisoned");
        Ok(store.upsert_edge(draft)?)
    }

    /// Ingest a batch of assertions, returning one outcome per item.
    ///
    /// A failing item never aborts the rest of the batch: callers get a
    /// per-item result, not all-or-nothing.
    pub fn ingest(&self, batch: Vec<Assertion>) -> Vec<NoemaResult<AssertionId>> {
        let mut store = self.store.write().expect("graph lock poisoned");
        batch
            .into_iter()
            .map(|assertion| {
                let outcome = match assertion {
                    Assertion::Concept(draft) => {
                        store.upsert_concept(draft).map(AssertionId::Concept)
                    }
                    Assertion::Edge(draft) => store.upsert_edge(draft).map(AssertionId::Edge),
                };
                match outcome {
                    Ok(id) => Ok(id),
                    Err(err) => {
                        tracing::debug!(%err, "skipping invalid batch item");
                        Err(err.into())
                    }
                }
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Snapshot of a concept by name (case-insensitive). `None` if unknown.
    pub fn concept(&self, name: &str) -> Option<ConceptNode> {
        let store = self.store.read().expect("graph lock poisoned");
        store.concept_by_name(name).cloned()
    }

    /// Shortest path (by hop count) between two named concepts.
    ///
    /// `None` when either name is unknown or the target is unreachable
    /// within `max_hops` — never an error.
    pub fn find_path(&self, source: &str, target: &str, max_hops: usize) -> Option<SemanticPath> {
        let store = self.store.read().expect("graph lock poisoned");
        let source = store.concept_id_by_name(source)?;
        let target = store.concept_id_by_name(target)?;
        paths::find_path(&store, source, target, max_hops)
    }

    /// All inference candidates for a named concept, optionally filtered by
    /// relation. Empty if the name is unknown.
    pub fn infer(&self, name: &str, filter: Option<InferenceKind>) -> Vec<InferenceCandidate> {
        let store = self.store.read().expect("graph lock poisoned");
        let Some(id) = store.concept_id_by_name(name) else {
            return Vec::new();
        };
        InferenceEngine::new(&store, &self.cache).infer(id, filter)
    }

    /// Similarity of two named concepts in [0, 1]. `None` if either name
    /// is unknown.
    pub fn similarity(&self, a: &str, b: &str) -> Option<f32> {
        let store = self.store.read().expect("graph lock poisoned");
        let a = store.concept_by_name(a)?;
        let b = store.concept_by_name(b)?;
        Some(self.cache.score(a, b))
    }

    /// Per-concept metrics bundle. `None` if the name is unknown.
    pub fn analyze(&self, name: &str) -> Option<ConceptReport> {
        let store = self.store.read().expect("graph lock poisoned");
        let node = store.concept_by_name(name)?;
        Some(ConceptReport {
            centrality: self.analyzer.centrality(&store, node.id),
            connectivity: self.analyzer.connectivity(&store, node.id),
            richness: self.analyzer.semantic_richness(node),
            activity: self.analyzer.temporal_activity(node),
        })
    }

    /// Summary of the graph's current shape.
    pub fn status(&self) -> EngineStatus {
        let store = self.store.read().expect("graph lock poisoned");
        let n = store.concept_count();
        let mean_confidence = if n == 0 {
            0.0
        } else {
            store.all_concepts().map(|c| c.confidence).sum::<f32>() / n as f32
        };
        let density = if n < 2 {
            0.0
        } else {
            store.edge_count() as f32 / (n * (n - 1)) as f32
        };
        EngineStatus {
            concept_count: n,
            edge_count: store.edge_count(),
            mean_confidence,
            density,
            components: connected_components(&store),
        }
    }

    // -----------------------------------------------------------------------
    // Maintenance
    // -----------------------------------------------------------------------

    /// Run the maintenance pass synchronously under the exclusive lock.
    pub fn optimize(&self) -> OptimizeReport {
        let mut store = self.store.write().expect("graph lock poisoned");
        self.optimizer.run(&mut store, &self.cache)
    }
}

impl std::fmt::Debug for KnowledgeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = self.status();
        f.debug_struct("KnowledgeEngine")
            .field("config", &self.config)
            .field("concepts", &status.concept_count)
            .field("edges", &status.edge_count)
            .finish()
    }
}
