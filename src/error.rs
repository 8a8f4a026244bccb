//! Error types shared by every graph operation.

use thiserror::Error;

/// Errors surfaced by graph construction and transformation.
///
/// `Recursion` and invariant repairs during loading are normally recovered
/// in place (logged, offending element dropped); the variants here are the
/// failures that abort the current operation.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Missing or invalid parameter combination.
    #[error("bad input: {0}")]
    BadInput(String),

    /// A referenced element does not exist in the graph.
    #[error("{kind} with id '{id}' does not exist")]
    NotFound { kind: &'static str, id: String },

    /// A cycle was detected that cannot be abstracted away.
    #[error("recursion detected, check the concept: {0}")]
    Recursion(String),

    /// The serialized form violates a structural invariant that cannot be
    /// repaired in place.
    #[error("invariant violation: {0}")]
    Invariant(String),

    /// The requested format is recognized but not implemented.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    /// The project payload could not be read or written.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GraphError {
    /// Create a `BadInput` error.
    pub fn bad_input(message: impl Into<String>) -> Self {
        Self::BadInput(message.into())
    }

    /// Create a `NotFound` error for a node.
    pub fn node_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "concept",
            id: id.into(),
        }
    }

    /// Create a `NotFound` error for a link.
    pub fn link_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "relation",
            id: id.into(),
        }
    }
}
