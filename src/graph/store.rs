//! Arena-backed graph store with forward/reverse adjacency indexes.
//!
//! The store is the sole owner and sole writer of the node and edge tables.
//! Adjacency sets hold edge ids only; source and target resolve through the
//! edge table, so every edge appears in exactly one forward entry and one
//! reverse entry. Removal is idempotent: deleting an id that is already gone
//! is a no-op, never an error.

use std::collections::{HashMap, HashSet};

use crate::concept::{
    AtomicIdAllocator, ConceptId, ConceptNode, EdgeId, InferenceEdge, InferenceKind, guess_kind,
};
use crate::error::ConceptError;

use super::{ConceptDraft, EdgeDraft};

/// Owns all concept nodes and inference edges.
///
/// Not internally synchronized: mutation takes `&mut self` and the facade
/// serializes writers behind a coarse `RwLock` (see `engine::KnowledgeEngine`).
#[derive(Debug)]
pub struct GraphStore {
    concepts: HashMap<ConceptId, ConceptNode>,
    edges: HashMap<EdgeId, InferenceEdge>,
    /// Outgoing edge ids per concept.
    forward: HashMap<ConceptId, HashSet<EdgeId>>,
    /// Incoming edge ids per concept.
    reverse: HashMap<ConceptId, HashSet<EdgeId>>,
    /// Lowercased name → live concept id.
    name_index: HashMap<String, ConceptId>,
    concept_ids: AtomicIdAllocator,
    edge_ids: AtomicIdAllocator,
    /// Dimension every supplied semantic vector must match.
    vector_dim: usize,
}

impl GraphStore {
    /// Create an empty store whose semantic vectors have `vector_dim` entries.
    pub fn new(vector_dim: usize) -> Self {
        Self {
            concepts: HashMap::new(),
            edges: HashMap::new(),
            forward: HashMap::new(),
            reverse: HashMap::new(),
            name_index: HashMap::new(),
            concept_ids: AtomicIdAllocator::new(),
            edge_ids: AtomicIdAllocator::new(),
            vector_dim,
        }
    }

    /// The configured semantic vector dimension.
    pub fn vector_dim(&self) -> usize {
        self.vector_dim
    }

    // -----------------------------------------------------------------------
    // Upserts
    // -----------------------------------------------------------------------

    /// Create or merge a concept per the one-node-per-name invariant.
    ///
    /// A new name creates a fresh node. Re-asserting an existing name (case
    /// insensitive) bumps `frequency`, raises `confidence` to the max of old
    /// and new, merges properties (draft wins on key conflicts), replaces the
    /// description and vector when the draft supplies them, and refreshes
    /// `last_updated`. Never creates a duplicate.
    pub fn upsert_concept(&mut self, draft: ConceptDraft) -> Result<ConceptId, ConceptError> {
        draft.validate(self.vector_dim)?;
        let key = draft.name.trim().to_lowercase();

        if let Some(&id) = self.name_index.get(&key) {
            if let Some(node) = self.concepts.get_mut(&id) {
                node.frequency += 1;
                node.confidence = node.confidence.max(draft.confidence);
                node.properties.extend(draft.properties);
                if !draft.description.is_empty() {
                    node.description = draft.description;
                }
                if let Some(vector) = draft.semantic_vector {
                    node.semantic_vector = Some(vector);
                }
                node.touch();
                return Ok(id);
            }
            // Name index pointing at a dead node breaks the §3 invariant.
            debug_assert!(false, "name index references missing concept {id}");
            tracing::warn!(%id, name = %key, "name index references missing concept; rebinding");
        }

        let id = ConceptId::from_nonzero(self.concept_ids.next_id()?);
        let mut node = ConceptNode::new(id, draft.name, draft.kind);
        node.description = draft.description;
        node.properties = draft.properties;
        node.confidence = draft.confidence;
        node.semantic_vector = draft.semantic_vector;

        self.name_index.insert(key, id);
        self.forward.insert(id, HashSet::new());
        self.reverse.insert(id, HashSet::new());
        self.concepts.insert(id, node);
        Ok(id)
    }

    /// Create or reinforce an edge per the one-edge-per-triple invariant.
    ///
    /// Endpoints are resolved by name and auto-created when missing, with a
    /// suffix-heuristic kind guess that fails soft to `Entity`. Re-asserting
    /// an existing (source, target, kind) triple reinforces the live edge
    /// instead of duplicating it.
    pub fn upsert_edge(&mut self, draft: EdgeDraft) -> Result<EdgeId, ConceptError> {
        draft.validate()?;
        let source = self.resolve_or_create(&draft.source, draft.confidence)?;
        let target = self.resolve_or_create(&draft.target, draft.confidence)?;

        if let Some(existing) = self.find_edge(source, target, draft.kind) {
            if let Some(edge) = self.edges.get_mut(&existing) {
                edge.reinforce(draft.confidence, draft.evidence);
            }
            return Ok(existing);
        }

        let id = EdgeId::from_nonzero(self.edge_ids.next_id()?);
        let mut edge = InferenceEdge::new(id, source, target, draft.kind, draft.confidence);
        edge.evidence = draft.evidence;
        self.forward.entry(source).or_default().insert(id);
        self.reverse.entry(target).or_default().insert(id);
        self.edges.insert(id, edge);
        Ok(id)
    }

    fn resolve_or_create(
        &mut self,
        name: &str,
        confidence: f32,
    ) -> Result<ConceptId, ConceptError> {
        if let Some(id) = self.concept_id_by_name(name) {
            return Ok(id);
        }
        self.upsert_concept(
            ConceptDraft::new(name, guess_kind(name)).with_confidence(confidence),
        )
    }

    /// Live edge id for an exact (source, target, kind) triple, if any.
    pub fn find_edge(
        &self,
        source: ConceptId,
        target: ConceptId,
        kind: InferenceKind,
    ) -> Option<EdgeId> {
        let out = self.forward.get(&source)?;
        out.iter()
            .find(|id| {
                self.edges
                    .get(id)
                    .is_some_and(|e| e.target == target && e.kind == kind)
            })
            .copied()
    }

    // -----------------------------------------------------------------------
    // Removal
    // -----------------------------------------------------------------------

    /// Remove an edge, keeping both adjacency indexes consistent.
    ///
    /// Returns false (no-op) if the id is not live.
    pub fn remove_edge(&mut self, id: EdgeId) -> bool {
        let Some(edge) = self.edges.remove(&id) else {
            return false;
        };
        self.unindex(id, edge.source, edge.target);
        true
    }

    /// Drop an edge id from both adjacency sets, warning on inconsistency.
    fn unindex(&mut self, id: EdgeId, source: ConceptId, target: ConceptId) {
        let in_forward = self
            .forward
            .get_mut(&source)
            .is_some_and(|set| set.remove(&id));
        let in_reverse = self
            .reverse
            .get_mut(&target)
            .is_some_and(|set| set.remove(&id));
        // Every live edge must appear in exactly one forward and one reverse
        // entry. A miss here is an internal bug: assert in debug, log and
        // carry on in release.
        debug_assert!(in_forward && in_reverse, "adjacency index out of sync for {id}");
        if !(in_forward && in_reverse) {
            tracing::warn!(%id, %source, %target, "adjacency index out of sync; skipping");
        }
    }

    /// Remove a concept, cascading to every edge touching it.
    ///
    /// Returns the number of edges removed; 0 and no-op if the id is not live.
    pub fn remove_concept(&mut self, id: ConceptId) -> usize {
        let Some(node) = self.concepts.remove(&id) else {
            return 0;
        };
        self.name_index.remove(&node.name.trim().to_lowercase());

        let mut touching: HashSet<EdgeId> = self.forward.remove(&id).unwrap_or_default();
        touching.extend(self.reverse.remove(&id).unwrap_or_default());

        let mut removed = 0;
        for edge_id in touching {
            if let Some(edge) = self.edges.remove(&edge_id) {
                // The entries under `id` itself are already gone; clean up
                // the far endpoint's side only.
                if edge.source != id {
                    if let Some(set) = self.forward.get_mut(&edge.source) {
                        set.remove(&edge_id);
                    }
                }
                if edge.target != id {
                    if let Some(set) = self.reverse.get_mut(&edge.target) {
                        set.remove(&edge_id);
                    }
                }
                removed += 1;
            }
        }
        removed
    }

    // -----------------------------------------------------------------------
    // Merge
    // -----------------------------------------------------------------------

    /// Merge concept `absorbed` into `keep`: sum frequency, take the max
    /// confidence, union properties, re-point every edge referencing
    /// `absorbed` to `keep`, then delete `absorbed`.
    ///
    /// Re-pointed edges that collide with an existing (source, target, kind)
    /// triple are folded into the survivor so the edge-identity invariant
    /// holds after the merge. No-op if either id is not live or the ids are
    /// equal.
    pub fn merge_concepts(&mut self, keep: ConceptId, absorbed: ConceptId) -> bool {
        if keep == absorbed || !self.concepts.contains_key(&keep) {
            return false;
        }
        let Some(dying) = self.concepts.remove(&absorbed) else {
            return false;
        };
        self.name_index.remove(&dying.name.trim().to_lowercase());

        let mut touching: HashSet<EdgeId> = self.forward.remove(&absorbed).unwrap_or_default();
        touching.extend(self.reverse.remove(&absorbed).unwrap_or_default());

        for edge_id in touching {
            let Some(mut edge) = self.edges.remove(&edge_id) else {
                continue;
            };
            // Detach from the surviving endpoint's indexes before rewriting.
            if edge.source != absorbed {
                if let Some(set) = self.forward.get_mut(&edge.source) {
                    set.remove(&edge_id);
                }
            }
            if edge.target != absorbed {
                if let Some(set) = self.reverse.get_mut(&edge.target) {
                    set.remove(&edge_id);
                }
            }
            if edge.source == absorbed {
                edge.source = keep;
            }
            if edge.target == absorbed {
                edge.target = keep;
            }

            match self.find_edge(edge.source, edge.target, edge.kind) {
                Some(survivor_id) => {
                    if let Some(survivor) = self.edges.get_mut(&survivor_id) {
                        survivor.strength += edge.strength;
                        survivor.confidence = survivor.confidence.max(edge.confidence);
                        survivor.evidence.extend(edge.evidence);
                        survivor.last_used = survivor.last_used.max(edge.last_used);
                    }
                }
                None => {
                    self.forward.entry(edge.source).or_default().insert(edge_id);
                    self.reverse.entry(edge.target).or_default().insert(edge_id);
                    self.edges.insert(edge_id, edge);
                }
            }
        }

        if let Some(node) = self.concepts.get_mut(&keep) {
            node.frequency += dying.frequency;
            node.confidence = node.confidence.max(dying.confidence);
            for (key, value) in dying.properties {
                node.properties.entry(key).or_insert(value);
            }
            if node.semantic_vector.is_none() {
                node.semantic_vector = dying.semantic_vector;
            }
            node.touch();
        }
        true
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    /// Concept by id.
    pub fn concept(&self, id: ConceptId) -> Option<&ConceptNode> {
        self.concepts.get(&id)
    }

    /// Live id for a name (case-insensitive).
    pub fn concept_id_by_name(&self, name: &str) -> Option<ConceptId> {
        self.name_index.get(&name.trim().to_lowercase()).copied()
    }

    /// Concept by name (case-insensitive).
    pub fn concept_by_name(&self, name: &str) -> Option<&ConceptNode> {
        self.concept_id_by_name(name).and_then(|id| self.concepts.get(&id))
    }

    /// Edge by id.
    pub fn edge(&self, id: EdgeId) -> Option<&InferenceEdge> {
        self.edges.get(&id)
    }

    /// Outgoing edges of a concept. Empty if the id is not live.
    pub fn edges_from(&self, id: ConceptId) -> Vec<&InferenceEdge> {
        self.forward
            .get(&id)
            .map(|set| set.iter().filter_map(|e| self.edges.get(e)).collect())
            .unwrap_or_default()
    }

    /// Incoming edges of a concept. Empty if the id is not live.
    pub fn edges_to(&self, id: ConceptId) -> Vec<&InferenceEdge> {
        self.reverse
            .get(&id)
            .map(|set| set.iter().filter_map(|e| self.edges.get(e)).collect())
            .unwrap_or_default()
    }

    /// Distinct successors reachable over one outgoing edge.
    pub fn neighbors_out(&self, id: ConceptId) -> HashSet<ConceptId> {
        self.edges_from(id).into_iter().map(|e| e.target).collect()
    }

    /// Distinct predecessors reaching this concept over one edge.
    pub fn neighbors_in(&self, id: ConceptId) -> HashSet<ConceptId> {
        self.edges_to(id).into_iter().map(|e| e.source).collect()
    }

    /// All live concepts, in arbitrary order.
    pub fn all_concepts(&self) -> impl Iterator<Item = &ConceptNode> {
        self.concepts.values()
    }

    /// All live edges, in arbitrary order.
    pub fn all_edges(&self) -> impl Iterator<Item = &InferenceEdge> {
        self.edges.values()
    }

    /// All live concept ids, in arbitrary order.
    pub fn concept_ids(&self) -> Vec<ConceptId> {
        self.concepts.keys().copied().collect()
    }

    /// Number of live concepts.
    pub fn concept_count(&self) -> usize {
        self.concepts.len()
    }

    /// Number of live edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}
