//! Knowledge graph: arena-backed store plus read-only analytics.
//!
//! Nodes and edges live in id-keyed tables owned by [`GraphStore`];
//! adjacency indexes store bare ids only, never references, so merge and
//! prune cascades cannot leave dangling pointers behind.
//!
//! - **Store** ([`store::GraphStore`]): single-writer mutation surface
//! - **Analytics** ([`analyze::ConceptAnalyzer`]): centrality, connectivity,
//!   richness, recency, and weakly connected components

pub mod analyze;
pub mod store;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::concept::{ConceptKind, InferenceKind, PropertyValue};
use crate::error::ConceptError;

/// An assertion of a concept, ready to be upserted into the store.
///
/// Drafts are plain data: validation happens at upsert time, so a draft
/// with an out-of-range confidence can be built freely but never enters
/// the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptDraft {
    /// Case-insensitive lookup name.
    pub name: String,
    /// Kind of the concept.
    pub kind: ConceptKind,
    /// Free-text description; empty keeps the existing one on reassertion.
    pub description: String,
    /// Properties to merge into the concept.
    pub properties: HashMap<String, PropertyValue>,
    /// Confidence in [0.0, 1.0].
    pub confidence: f32,
    /// Externally produced embedding; `None` leaves any existing vector alone.
    pub semantic_vector: Option<Vec<f32>>,
}

impl ConceptDraft {
    /// Start a draft with full confidence and no description.
    pub fn new(name: impl Into<String>, kind: ConceptKind) -> Self {
        Self {
            name: name.into(),
            kind,
            description: String::new(),
            properties: HashMap::new(),
            confidence: 1.0,
            semantic_vector: None,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the confidence. Out-of-range values are rejected at upsert.
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    /// Attach a property.
    pub fn with_property(
        mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Attach an embedding vector.
    pub fn with_vector(mut self, vector: Vec<f32>) -> Self {
        self.semantic_vector = Some(vector);
        self
    }

    pub(crate) fn validate(&self, vector_dim: usize) -> Result<(), ConceptError> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(ConceptError::InvalidConfidence {
                field: "concept.confidence",
                value: self.confidence,
            });
        }
        if let Some(ref v) = self.semantic_vector {
            if v.len() != vector_dim {
                return Err(ConceptError::DimensionMismatch {
                    expected: vector_dim,
                    actual: v.len(),
                });
            }
        }
        Ok(())
    }
}

/// An assertion of a relation between two concepts, resolved by name.
///
/// Endpoints that do not exist yet are created on the fly with a
/// suffix-heuristic kind guess (see [`crate::concept::guess_kind`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeDraft {
    /// Source concept name.
    pub source: String,
    /// Target concept name.
    pub target: String,
    /// The relation asserted.
    pub kind: InferenceKind,
    /// Confidence in [0.0, 1.0].
    pub confidence: f32,
    /// Free-text justifications to append.
    pub evidence: Vec<String>,
}

impl EdgeDraft {
    /// Start a draft with full confidence and no evidence.
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        kind: InferenceKind,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind,
            confidence: 1.0,
            evidence: Vec::new(),
        }
    }

    /// Set the confidence. Out-of-range values are rejected at upsert.
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    /// Append a piece of evidence.
    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence.push(evidence.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ConceptError> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(ConceptError::InvalidConfidence {
                field: "edge.confidence",
                value: self.confidence,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concept_draft_builder() {
        let draft = ConceptDraft::new("Sun", ConceptKind::Entity)
            .with_description("the local star")
            .with_confidence(0.9)
            .with_property("class", "G2V")
            .with_vector(vec![0.0; 4]);
        assert_eq!(draft.name, "Sun");
        assert!((draft.confidence - 0.9).abs() < f32::EPSILON);
        assert_eq!(draft.properties.len(), 1);
        assert_eq!(draft.semantic_vector.as_ref().unwrap().len(), 4);
    }

    #[test]
    fn concept_draft_rejects_bad_confidence() {
        let draft = ConceptDraft::new("Sun", ConceptKind::Entity).with_confidence(1.5);
        assert!(matches!(
            draft.validate(4),
            Err(ConceptError::InvalidConfidence { .. })
        ));
    }

    #[test]
    fn concept_draft_rejects_wrong_dimension() {
        let draft = ConceptDraft::new("Sun", ConceptKind::Entity).with_vector(vec![0.0; 3]);
        assert!(matches!(
            draft.validate(4),
            Err(ConceptError::DimensionMismatch {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn edge_draft_rejects_negative_confidence() {
        let draft = EdgeDraft::new("a", "b", InferenceKind::IsA).with_confidence(-0.1);
        assert!(matches!(
            draft.validate(),
            Err(ConceptError::InvalidConfidence { .. })
        ));
    }
}
