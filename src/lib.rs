//! # noema
//!
//! A semantic knowledge graph engine: a mutable graph of typed concept
//! nodes connected by typed, confidence-weighted inference edges, with
//! incremental construction, multi-hop path discovery, pattern-based
//! inference, and continuous maintenance (pruning and deduplication).
//!
//! ## Architecture
//!
//! - **Data model** (`concept`): ids, kinds, nodes, edges
//! - **Graph store** (`graph`): arena tables + forward/reverse adjacency,
//!   plus read-only analytics
//! - **Similarity** (`similarity`): embedding/kind/property blend with a
//!   revision-stamped cache
//! - **Inference** (`infer`): direct, indirect, and pattern-based passes
//! - **Path finding** (`paths`): bounded BFS with multiplicative confidence
//! - **Optimizer** (`optimize`): prune and merge maintenance pass
//! - **Facade** (`engine`): the public API and its locking discipline
//!
//! ## Library usage
//!
//! ```
//! use noema::concept::InferenceKind;
//! use noema::engine::{EngineConfig, KnowledgeEngine};
//! use noema::graph::EdgeDraft;
//!
//! let engine = KnowledgeEngine::new(EngineConfig::default()).unwrap();
//! engine
//!     .upsert_edge(EdgeDraft::new("sun", "star", InferenceKind::IsA).with_confidence(0.9))
//!     .unwrap();
//! let path = engine.find_path("sun", "star", 5).unwrap();
//! assert_eq!(path.hops, 1);
//! ```

pub mod concept;
pub mod engine;
pub mod error;
pub mod graph;
pub mod infer;
pub mod optimize;
pub mod paths;
pub mod similarity;
