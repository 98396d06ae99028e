//! Semantic similarity scoring between concepts.
//!
//! The score is a weighted blend of three channels: cosine similarity of the
//! externally supplied embedding vectors, kind agreement, and property-key
//! overlap. Scoring is pure; [`SimilarityCache`] memoizes pair scores and
//! invalidates them through per-node revision stamps, so a mutated node
//! never serves a stale score.

use dashmap::DashMap;

use crate::concept::{ConceptId, ConceptNode};

/// Weight of the embedding-cosine channel.
pub const VECTOR_WEIGHT: f32 = 0.5;
/// Weight of the kind-agreement channel.
pub const KIND_WEIGHT: f32 = 0.3;
/// Weight of the property-overlap channel.
pub const PROPERTY_WEIGHT: f32 = 0.2;

/// Cosine similarity of two vectors.
///
/// Defined as 0 when either norm is 0 or the lengths differ, so concepts
/// without an embedding (or with a mismatched one) contribute nothing on
/// the vector channel rather than poisoning the score with NaN.
fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Property-key overlap: |A ∩ B| / max(|A|, |B|), 0 when both sets are empty.
fn property_overlap(a: &ConceptNode, b: &ConceptNode) -> f32 {
    let larger = a.properties.len().max(b.properties.len());
    if larger == 0 {
        return 0.0;
    }
    let shared = a
        .properties
        .keys()
        .filter(|k| b.properties.contains_key(*k))
        .count();
    shared as f32 / larger as f32
}

/// Compute the similarity of two concepts, clamped to [0.0, 1.0].
///
/// Symmetric: `score(a, b) == score(b, a)` for all pairs.
pub fn score(a: &ConceptNode, b: &ConceptNode) -> f32 {
    let vector_term = match (&a.semantic_vector, &b.semantic_vector) {
        (Some(va), Some(vb)) => cosine(va, vb),
        _ => 0.0,
    };
    let kind_term = if a.kind == b.kind { 1.0 } else { 0.5 };
    let property_term = property_overlap(a, b);

    (VECTOR_WEIGHT * vector_term + KIND_WEIGHT * kind_term + PROPERTY_WEIGHT * property_term)
        .clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    rev_lo: u64,
    rev_hi: u64,
    score: f32,
}

/// Revision-stamped memoization of pair scores.
///
/// Keys are canonically ordered (lower id first) so a lookup for (a, b)
/// and (b, a) hits the same entry. Each entry records the revision of both
/// nodes at compute time; a stamp mismatch on lookup forces a recompute.
#[derive(Debug, Default)]
pub struct SimilarityCache {
    entries: DashMap<(ConceptId, ConceptId), CacheEntry>,
}

impl SimilarityCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Cached similarity of two concepts, recomputing if either node has
    /// been mutated since the entry was written.
    pub fn score(&self, a: &ConceptNode, b: &ConceptNode) -> f32 {
        let (lo, hi) = if a.id <= b.id { (a, b) } else { (b, a) };
        let key = (lo.id, hi.id);

        if let Some(entry) = self.entries.get(&key) {
            if entry.rev_lo == lo.revision && entry.rev_hi == hi.revision {
                return entry.score;
            }
        }

        let score = score(lo, hi);
        self.entries.insert(
            key,
            CacheEntry {
                rev_lo: lo.revision,
                rev_hi: hi.revision,
                score,
            },
        );
        score
    }

    /// Drop every entry touching any of the given concepts. Called after
    /// pruning or merging removes nodes for good.
    pub fn forget(&self, removed: &std::collections::HashSet<ConceptId>) {
        self.entries
            .retain(|(a, b), _| !removed.contains(a) && !removed.contains(b));
    }

    /// Number of live cache entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no entries are cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
