//! The error type shared by every part of the engine.

use thiserror::Error;

use crate::vertex::VertexId;

/// A convenience alias for results produced by the engine.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced to the caller by graph mutations and analyses.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("vertex not found: {0}")]
    VertexNotFound(VertexId),

    #[error("edge not found: {from} -> {to}")]
    EdgeNotFound { from: VertexId, to: VertexId },

    #[error("vertex already exists: {0}")]
    DuplicateVertex(VertexId),

    #[error("{index} is undefined on a disconnected graph")]
    DisconnectedGraph { index: &'static str },

    #[error("matrix is singular and cannot be inverted")]
    SingularMatrix,

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("operation requires at least {required} actors, got {got}")]
    InsufficientSelection { required: usize, got: usize },

    #[error("cannot remove a vertex while {relations} relations exist")]
    MultiRelationConstraint { relations: usize },

    #[error("relation not found: {0}")]
    RelationNotFound(usize),

    #[error("{operation} on {size} actors exceeds the limit of {limit} and requires confirmation")]
    ConfirmationRequired {
        operation: &'static str,
        size: usize,
        limit: usize,
    },

    #[error("computation cancelled")]
    Cancelled,
}

impl Error {
    /// Shorthand for building an [`Error::InvalidParameter`].
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidParameter(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(Error::VertexNotFound(7).to_string(), "vertex not found: 7");
        assert_eq!(
            Error::InsufficientSelection {
                required: 3,
                got: 2
            }
            .to_string(),
            "operation requires at least 3 actors, got 2"
        );
        assert_eq!(
            Error::invalid("degree must be even").to_string(),
            "invalid parameter: degree must be even"
        );
    }
}
