//! Rich diagnostic error types for the noema engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]`
//! derives, providing error codes and help text. Queries never surface
//! through these types: absence of knowledge is a value (`None` / empty),
//! not an error. Only ingestion validation and engine configuration fail.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the noema engine.
///
/// Each variant wraps a subsystem-specific error, preserving the full
/// diagnostic chain (error codes, help text) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum NoemaError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Concept(#[from] ConceptError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Engine(#[from] EngineError),
}

// ---------------------------------------------------------------------------
// Concept / ingestion validation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConceptError {
    #[error("invalid confidence for `{field}`: {value} is outside [0.0, 1.0]")]
    #[diagnostic(
        code(noema::concept::invalid_confidence),
        help(
            "Confidence scores must lie in the closed interval [0.0, 1.0]. \
             Clamp or normalize the value before asserting it."
        )
    )]
    InvalidConfidence { field: &'static str, value: f32 },

    #[error("invalid concept kind: {kind}")]
    #[diagnostic(
        code(noema::concept::invalid_kind),
        help("Valid concept kinds are: Entity, Action, Property, Relation, Abstract.")
    )]
    InvalidKind { kind: String },

    #[error("invalid inference relation: {kind}")]
    #[diagnostic(
        code(noema::concept::invalid_relation),
        help(
            "Valid inference relations are: IsA, PartOf, HasProperty, Causes, \
             SimilarTo, OppositeOf, AssociatedWith."
        )
    )]
    InvalidRelation { kind: String },

    #[error("semantic vector dimension mismatch: expected {expected}, got {actual}")]
    #[diagnostic(
        code(noema::concept::dim_mismatch),
        help(
            "All semantic vectors in a graph must share the dimension fixed at \
             engine construction. Re-embed the concept with the configured \
             dimension, or omit the vector entirely."
        )
    )]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("id allocator exhausted: cannot allocate more than u64::MAX ids")]
    #[diagnostic(
        code(noema::concept::id_exhausted),
        help(
            "The id space is exhausted. This requires 2^64 allocations and \
             should never happen in practice — check for an allocation loop."
        )
    )]
    IdSpaceExhausted,
}

// ---------------------------------------------------------------------------
// Engine errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    #[error("invalid configuration: {message}")]
    #[diagnostic(
        code(noema::engine::invalid_config),
        help("Check the EngineConfig fields. {message}")
    )]
    InvalidConfig { message: String },
}

/// Convenience alias for functions returning noema results.
pub type NoemaResult<T> = std::result::Result<T, NoemaError>;
