//! Three-pass inference over the knowledge graph.
//!
//! Candidates come from three independent strategies, concatenated in trust
//! order: **direct** facts (existing edges, at their own confidence),
//! **indirect** facts (one intermediate hop, confidence decayed by a fixed
//! factor), and **pattern** facts (relations copied from highly similar
//! concepts, discounted by both similarity and a fixed factor). Candidates
//! are not deduplicated against existing edges; the caller decides which
//! ones to materialize.

use serde::{Deserialize, Serialize};

use crate::concept::{ConceptId, InferenceKind};
use crate::graph::store::GraphStore;
use crate::similarity::SimilarityCache;

/// Confidence multiplier applied per inference hop beyond the first.
pub const HOP_DECAY: f32 = 0.8;
/// Minimum similarity for a concept to serve as a pattern analog.
pub const PATTERN_THRESHOLD: f32 = 0.7;
/// Confidence discount applied to facts copied from an analog.
pub const PATTERN_DISCOUNT: f32 = 0.7;

/// How a candidate was derived.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CandidateOrigin {
    /// Read directly off an existing edge.
    Direct,
    /// Reached through intermediate concepts.
    Indirect {
        /// Hop distance from the query concept.
        hops: usize,
    },
    /// Copied from a similar concept's outgoing edges.
    Pattern {
        /// The analog the fact was copied from.
        analog: ConceptId,
        /// Similarity of the analog to the query concept.
        similarity: f32,
    },
}

/// A derived fact the caller may choose to materialize as an edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceCandidate {
    /// Human-readable rendering, e.g. `"사람 is a 동물"`.
    pub description: String,
    /// The relation asserted.
    pub kind: InferenceKind,
    /// Source concept of the candidate relation.
    pub source: ConceptId,
    /// Target concept of the candidate relation.
    pub target: ConceptId,
    /// Derived confidence in [0.0, 1.0].
    pub confidence: f32,
    /// Which strategy produced this candidate.
    pub origin: CandidateOrigin,
}

/// Borrowing view over the store and similarity cache; per-query state
/// lives on the stack of [`InferenceEngine::infer`].
pub struct InferenceEngine<'a> {
    store: &'a GraphStore,
    cache: &'a SimilarityCache,
}

impl<'a> InferenceEngine<'a> {
    /// Create an engine over a store snapshot.
    pub fn new(store: &'a GraphStore, cache: &'a SimilarityCache) -> Self {
        Self { store, cache }
    }

    /// Run all three passes for a concept, optionally filtered by relation.
    ///
    /// Returns direct candidates first, then indirect, then pattern-based.
    /// Empty if the id is not live.
    pub fn infer(
        &self,
        id: ConceptId,
        filter: Option<InferenceKind>,
    ) -> Vec<InferenceCandidate> {
        if self.store.concept(id).is_none() {
            return Vec::new();
        }
        let mut candidates = self.direct(id, filter);
        candidates.extend(self.indirect(id, filter));
        candidates.extend(self.pattern(id, filter));
        candidates
    }

    fn matches(filter: Option<InferenceKind>, kind: InferenceKind) -> bool {
        filter.is_none_or(|f| f == kind)
    }

    fn describe(&self, source: ConceptId, kind: InferenceKind, target: ConceptId) -> String {
        let name = |id: ConceptId| {
            self.store
                .concept(id)
                .map(|n| n.name.clone())
                .unwrap_or_else(|| id.to_string())
        };
        format!("{} {} {}", name(source), kind.phrase(), name(target))
    }

    /// Pass 1: every outgoing and incoming edge, at its own confidence.
    fn direct(&self, id: ConceptId, filter: Option<InferenceKind>) -> Vec<InferenceCandidate> {
        let mut out = Vec::new();
        for edge in self.store.edges_from(id).into_iter().chain(self.store.edges_to(id)) {
            if !Self::matches(filter, edge.kind) {
                continue;
            }
            out.push(InferenceCandidate {
                description: self.describe(edge.source, edge.kind, edge.target),
                kind: edge.kind,
                source: edge.source,
                target: edge.target,
                confidence: edge.confidence,
                origin: CandidateOrigin::Direct,
            });
        }
        out
    }

    /// Pass 2: two-hop expansion through each direct successor. The derived
    /// relation connects the query concept to the far endpoint, carrying the
    /// far edge's confidence decayed by [`HOP_DECAY`].
    fn indirect(&self, id: ConceptId, filter: Option<InferenceKind>) -> Vec<InferenceCandidate> {
        let mut out = Vec::new();
        for first in self.store.edges_from(id) {
            for second in self.store.edges_from(first.target) {
                if second.target == id || !Self::matches(filter, second.kind) {
                    continue;
                }
                out.push(InferenceCandidate {
                    description: self.describe(id, second.kind, second.target),
                    kind: second.kind,
                    source: id,
                    target: second.target,
                    confidence: second.confidence * HOP_DECAY,
                    origin: CandidateOrigin::Indirect { hops: 2 },
                });
            }
        }
        out
    }

    /// Pass 3: copy outgoing facts from every concept whose similarity to
    /// the query exceeds [`PATTERN_THRESHOLD`], discounting confidence by
    /// similarity and [`PATTERN_DISCOUNT`].
    fn pattern(&self, id: ConceptId, filter: Option<InferenceKind>) -> Vec<InferenceCandidate> {
        let Some(query) = self.store.concept(id) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for analog in self.store.all_concepts() {
            if analog.id == id {
                continue;
            }
            let similarity = self.cache.score(query, analog);
            if similarity <= PATTERN_THRESHOLD {
                continue;
            }
            for edge in self.store.edges_from(analog.id) {
                if edge.target == id || !Self::matches(filter, edge.kind) {
                    continue;
                }
                out.push(InferenceCandidate {
                    description: self.describe(id, edge.kind, edge.target),
                    kind: edge.kind,
                    source: id,
                    target: edge.target,
                    confidence: edge.confidence * similarity * PATTERN_DISCOUNT,
                    origin: CandidateOrigin::Pattern {
                        analog: analog.id,
                        similarity,
                    },
                });
            }
        }
        out
    }
}
