//! Core data model for the noema engine.
//!
//! Concepts are the nodes of the knowledge graph and inference edges the
//! typed, confidence-weighted relations between them. Both are identified
//! by niche-optimized ids handed out by [`AtomicIdAllocator`] — ids are
//! assigned once and never reused, so adjacency sets can store bare ids
//! without dangling-reference hazards.

use std::collections::HashMap;
use std::num::NonZeroU64;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::ConceptError;

/// Seconds since the UNIX epoch, saturating to 0 on clock skew.
pub(crate) fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Unique, niche-optimized identifier for a concept node.
///
/// Uses `NonZeroU64` so that `Option<ConceptId>` is the same size as
/// `ConceptId` (0 serves as the `None` discriminant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct ConceptId(NonZeroU64);

impl ConceptId {
    /// Create a `ConceptId` from a raw `u64`. Returns `None` if `raw` is zero.
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(ConceptId)
    }

    /// Get the underlying `u64` value.
    pub fn get(self) -> u64 {
        self.0.get()
    }

    pub(crate) fn from_nonzero(raw: NonZeroU64) -> Self {
        ConceptId(raw)
    }
}

impl std::fmt::Display for ConceptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "concept:{}", self.0)
    }
}

/// Unique identifier for an inference edge. Same niche layout as [`ConceptId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct EdgeId(NonZeroU64);

impl EdgeId {
    /// Create an `EdgeId` from a raw `u64`. Returns `None` if `raw` is zero.
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(EdgeId)
    }

    /// Get the underlying `u64` value.
    pub fn get(self) -> u64 {
        self.0.get()
    }

    pub(crate) fn from_nonzero(raw: NonZeroU64) -> Self {
        EdgeId(raw)
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "edge:{}", self.0)
    }
}

/// Classification of a concept node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConceptKind {
    /// A concrete entity (person, place, thing).
    Entity,
    /// An action or process.
    Action,
    /// A property or attribute.
    Property,
    /// A relation reified as a concept of its own.
    Relation,
    /// An abstract notion not directly observable.
    Abstract,
}

impl std::fmt::Display for ConceptKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConceptKind::Entity => "Entity",
            ConceptKind::Action => "Action",
            ConceptKind::Property => "Property",
            ConceptKind::Relation => "Relation",
            ConceptKind::Abstract => "Abstract",
        };
        write!(f, "{s}")
    }
}

impl FromStr for ConceptKind {
    type Err = ConceptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "entity" => Ok(ConceptKind::Entity),
            "action" => Ok(ConceptKind::Action),
            "property" => Ok(ConceptKind::Property),
            "relation" => Ok(ConceptKind::Relation),
            "abstract" => Ok(ConceptKind::Abstract),
            other => Err(ConceptError::InvalidKind { kind: other.into() }),
        }
    }
}

/// Best-effort guess of a concept's kind from its name alone.
///
/// Used when an edge assertion references a concept that does not exist yet
/// and the caller supplied no kind. Derivational suffixes are checked on the
/// lowercased name; anything unrecognized falls back to `Entity`.
pub fn guess_kind(name: &str) -> ConceptKind {
    let lower = name.trim().to_lowercase();
    const ACTION: &[&str] = &["ing", "ize", "ise", "ate", "fy"];
    const PROPERTY: &[&str] = &["ness", "ity", "able", "ible", "ful", "less", "ous"];
    const ABSTRACT: &[&str] = &["ism", "tion", "sion", "ment", "ance", "ence"];

    // Property and Abstract suffixes are longer, so test them first:
    // "-ity" must not be shadowed by a shorter Action suffix.
    if PROPERTY.iter().any(|s| lower.ends_with(s)) {
        ConceptKind::Property
    } else if ABSTRACT.iter().any(|s| lower.ends_with(s)) {
        ConceptKind::Abstract
    } else if ACTION.iter().any(|s| lower.ends_with(s)) {
        ConceptKind::Action
    } else {
        ConceptKind::Entity
    }
}

/// The typed relation carried by an inference edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InferenceKind {
    IsA,
    PartOf,
    HasProperty,
    Causes,
    SimilarTo,
    OppositeOf,
    AssociatedWith,
}

impl InferenceKind {
    /// Human-readable verb phrase for candidate descriptions.
    pub fn phrase(self) -> &'static str {
        match self {
            InferenceKind::IsA => "is a",
            InferenceKind::PartOf => "is part of",
            InferenceKind::HasProperty => "has property",
            InferenceKind::Causes => "causes",
            InferenceKind::SimilarTo => "is similar to",
            InferenceKind::OppositeOf => "is opposite of",
            InferenceKind::AssociatedWith => "is associated with",
        }
    }
}

impl std::fmt::Display for InferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            InferenceKind::IsA => "IsA",
            InferenceKind::PartOf => "PartOf",
            InferenceKind::HasProperty => "HasProperty",
            InferenceKind::Causes => "Causes",
            InferenceKind::SimilarTo => "SimilarTo",
            InferenceKind::OppositeOf => "OppositeOf",
            InferenceKind::AssociatedWith => "AssociatedWith",
        };
        write!(f, "{s}")
    }
}

impl FromStr for InferenceKind {
    type Err = ConceptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect();
        match normalized.as_str() {
            "isa" => Ok(InferenceKind::IsA),
            "partof" => Ok(InferenceKind::PartOf),
            "hasproperty" => Ok(InferenceKind::HasProperty),
            "causes" => Ok(InferenceKind::Causes),
            "similarto" => Ok(InferenceKind::SimilarTo),
            "oppositeof" => Ok(InferenceKind::OppositeOf),
            "associatedwith" => Ok(InferenceKind::AssociatedWith),
            _ => Err(ConceptError::InvalidRelation { kind: s.trim().into() }),
        }
    }
}

/// A scalar property value attached to a concept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Text(String),
    Number(f64),
    Flag(bool),
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Text(s.into())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::Text(s)
    }
}

impl From<f64> for PropertyValue {
    fn from(n: f64) -> Self {
        PropertyValue::Number(n)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Flag(b)
    }
}

/// A node in the knowledge graph.
///
/// At most one live node exists per case-insensitive name; re-asserting an
/// existing name merges into the live node instead of creating a duplicate
/// (see `GraphStore::upsert_concept`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptNode {
    /// Unique identifier, never reused.
    pub id: ConceptId,
    /// Human-readable label; lookup key (case-insensitive).
    pub name: String,
    /// What kind of concept this is.
    pub kind: ConceptKind,
    /// Free-text description.
    pub description: String,
    /// Arbitrary scalar properties.
    pub properties: HashMap<String, PropertyValue>,
    /// Trust in this concept, in [0.0, 1.0]. Monotonically non-decreasing
    /// under reassertion.
    pub confidence: f32,
    /// How many times this name has been asserted. Starts at 1.
    pub frequency: u32,
    /// Creation timestamp (seconds since UNIX epoch).
    pub created_at: u64,
    /// Last mutation timestamp.
    pub last_updated: u64,
    /// Externally supplied embedding, used only for similarity scoring.
    /// Absent means the vector channel of similarity scores zero — the
    /// engine never fabricates a placeholder.
    pub semantic_vector: Option<Vec<f32>>,
    /// Mutation counter; bumped on every change, drives cache invalidation.
    pub revision: u64,
}

impl ConceptNode {
    /// Create a fresh node with frequency 1 and the current timestamp.
    pub fn new(id: ConceptId, name: impl Into<String>, kind: ConceptKind) -> Self {
        let now = now_secs();
        Self {
            id,
            name: name.into(),
            kind,
            description: String::new(),
            properties: HashMap::new(),
            confidence: 1.0,
            frequency: 1,
            created_at: now,
            last_updated: now,
            semantic_vector: None,
            revision: 0,
        }
    }

    /// Mark the node mutated: bump revision and refresh `last_updated`.
    pub(crate) fn touch(&mut self) {
        self.revision += 1;
        self.last_updated = now_secs();
    }
}

/// Fixed strength gain applied each time an existing edge is re-asserted.
pub const REINFORCE_INCREMENT: f32 = 0.1;

/// A typed, confidence-weighted directed relation between two concepts.
///
/// At most one live edge exists per (source, target, kind) triple;
/// re-asserting the same triple reinforces the live edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceEdge {
    /// Unique identifier, never reused.
    pub id: EdgeId,
    /// Source concept.
    pub source: ConceptId,
    /// Target concept.
    pub target: ConceptId,
    /// The relation this edge asserts.
    pub kind: InferenceKind,
    /// Trust in this relation, in [0.0, 1.0].
    pub confidence: f32,
    /// Free-text justifications, append-only.
    pub evidence: Vec<String>,
    /// Reinforcement weight; grows by [`REINFORCE_INCREMENT`] per reassertion.
    pub strength: f32,
    /// Creation timestamp (seconds since UNIX epoch).
    pub created_at: u64,
    /// Last reassertion timestamp.
    pub last_used: u64,
}

impl InferenceEdge {
    /// Create a fresh edge with strength 1.0 and the current timestamp.
    pub fn new(
        id: EdgeId,
        source: ConceptId,
        target: ConceptId,
        kind: InferenceKind,
        confidence: f32,
    ) -> Self {
        let now = now_secs();
        Self {
            id,
            source,
            target,
            kind,
            confidence,
            evidence: Vec::new(),
            strength: 1.0,
            created_at: now,
            last_used: now,
        }
    }

    /// Fold a reassertion into this edge: bump strength, raise confidence to
    /// the max of old and new, append evidence, refresh `last_used`.
    pub(crate) fn reinforce(&mut self, confidence: f32, evidence: Vec<String>) {
        self.strength += REINFORCE_INCREMENT;
        self.confidence = self.confidence.max(confidence);
        self.evidence.extend(evidence);
        self.last_used = now_secs();
    }
}

/// Thread-safe id allocator.
///
/// Produces monotonically increasing raw ids starting from 1. Safe to share
/// across threads; used for both concept and edge id spaces.
#[derive(Debug)]
pub struct AtomicIdAllocator {
    next: AtomicU64,
}

impl AtomicIdAllocator {
    /// Create an allocator that starts from id 1.
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Create an allocator that resumes from a given id.
    pub fn starting_from(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start.max(1)),
        }
    }

    /// Allocate the next raw id.
    ///
    /// Returns an error if the id space is exhausted (after 2^64 - 1
    /// allocations).
    pub fn next_id(&self) -> Result<NonZeroU64, ConceptError> {
        let raw = self.next.fetch_add(1, Ordering::Relaxed);
        NonZeroU64::new(raw).ok_or(ConceptError::IdSpaceExhausted)
    }

    /// Return the next id that *would* be allocated, without consuming it.
    pub fn peek_next(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

impl Default for AtomicIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concept_id_niche_optimization() {
        assert_eq!(
            std::mem::size_of::<Option<ConceptId>>(),
            std::mem::size_of::<ConceptId>()
        );
    }

    #[test]
    fn concept_id_zero_is_none() {
        assert!(ConceptId::new(0).is_none());
        assert_eq!(ConceptId::new(42).unwrap().get(), 42);
    }

    #[test]
    fn allocator_produces_sequential_ids() {
        let alloc = AtomicIdAllocator::new();
        assert_eq!(alloc.next_id().unwrap().get(), 1);
        assert_eq!(alloc.next_id().unwrap().get(), 2);
        assert_eq!(alloc.next_id().unwrap().get(), 3);
    }

    #[test]
    fn allocator_starting_from() {
        let alloc = AtomicIdAllocator::starting_from(100);
        assert_eq!(alloc.next_id().unwrap().get(), 100);
        assert_eq!(alloc.peek_next(), 101);
    }

    #[test]
    fn kind_parses_case_insensitive() {
        assert_eq!("entity".parse::<ConceptKind>().unwrap(), ConceptKind::Entity);
        assert_eq!("Abstract".parse::<ConceptKind>().unwrap(), ConceptKind::Abstract);
        assert!("thing".parse::<ConceptKind>().is_err());
    }

    #[test]
    fn relation_parses_snake_and_kebab() {
        assert_eq!("is-a".parse::<InferenceKind>().unwrap(), InferenceKind::IsA);
        assert_eq!(
            "part_of".parse::<InferenceKind>().unwrap(),
            InferenceKind::PartOf
        );
        assert_eq!(
            "AssociatedWith".parse::<InferenceKind>().unwrap(),
            InferenceKind::AssociatedWith
        );
        assert!("loves".parse::<InferenceKind>().is_err());
    }

    #[test]
    fn invalid_relation_error_names_value() {
        let err = "loves".parse::<InferenceKind>().unwrap_err();
        assert!(format!("{err}").contains("loves"));
    }

    #[test]
    fn guess_kind_suffixes() {
        assert_eq!(guess_kind("melting"), ConceptKind::Action);
        assert_eq!(guess_kind("darkness"), ConceptKind::Property);
        assert_eq!(guess_kind("gravity"), ConceptKind::Property);
        assert_eq!(guess_kind("evolution"), ConceptKind::Abstract);
        assert_eq!(guess_kind("ice"), ConceptKind::Entity);
        assert_eq!(guess_kind("사람"), ConceptKind::Entity);
    }

    #[test]
    fn node_creation_defaults() {
        let node = ConceptNode::new(ConceptId::new(1).unwrap(), "Sun", ConceptKind::Entity);
        assert_eq!(node.frequency, 1);
        assert_eq!(node.revision, 0);
        assert!(node.semantic_vector.is_none());
        assert!((node.confidence - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn edge_reinforce_accumulates() {
        let mut edge = InferenceEdge::new(
            EdgeId::new(1).unwrap(),
            ConceptId::new(1).unwrap(),
            ConceptId::new(2).unwrap(),
            InferenceKind::IsA,
            0.6,
        );
        edge.reinforce(0.4, vec!["weaker evidence".into()]);
        assert!((edge.strength - 1.1).abs() < f32::EPSILON);
        // Confidence is monotonic max, not last-write-wins.
        assert!((edge.confidence - 0.6).abs() < f32::EPSILON);
        assert_eq!(edge.evidence.len(), 1);
    }

    #[test]
    fn kind_display_roundtrip() {
        for kind in [
            InferenceKind::IsA,
            InferenceKind::PartOf,
            InferenceKind::HasProperty,
            InferenceKind::Causes,
            InferenceKind::SimilarTo,
            InferenceKind::OppositeOf,
            InferenceKind::AssociatedWith,
        ] {
            assert_eq!(kind.to_string().parse::<InferenceKind>().unwrap(), kind);
        }
    }

    #[test]
    fn property_value_untagged_serde() {
        let v: PropertyValue = serde_json::from_str("\"red\"").unwrap();
        assert_eq!(v, PropertyValue::Text("red".into()));
        let v: PropertyValue = serde_json::from_str("3.5").unwrap();
        assert_eq!(v, PropertyValue::Number(3.5));
        let v: PropertyValue = serde_json::from_str("true").unwrap();
        assert_eq!(v, PropertyValue::Flag(true));
    }
}
