// error.rs — Errors raised while constructing symbolic array nodes
//
// Every error is raised synchronously at node-construction time. A failed
// operator call never leaves a partially built node in the graph.

use std::fmt;

use crate::diag::{codes, DiagCode};
use crate::id::NodeId;

/// Errors produced by the array operators and the graph builder.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayError {
    /// Incompatible or invalid dimensions.
    Shape { message: String },
    /// Attempted in-place replacement on a free variable node.
    Immutability { node: NodeId },
    /// Replacement length does not divide the number of target slots.
    Length { slots: usize, replacement: usize },
    /// Subscript could not be applied (out of bounds, wrong arity, ...).
    Index { message: String },
    /// Malformed operator argument.
    InvalidArgument { message: String },
    /// A node id that is not part of the graph.
    UnknownNode { node: NodeId },
}

impl ArrayError {
    pub fn shape(message: impl Into<String>) -> Self {
        ArrayError::Shape {
            message: message.into(),
        }
    }

    pub fn index(message: impl Into<String>) -> Self {
        ArrayError::Index {
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        ArrayError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Stable diagnostic code for this error category.
    pub fn code(&self) -> DiagCode {
        match self {
            ArrayError::Shape { .. } => codes::E_SHAPE,
            ArrayError::Immutability { .. } => codes::E_IMMUTABLE,
            ArrayError::Length { .. } => codes::E_LENGTH,
            ArrayError::Index { .. } => codes::E_INDEX,
            ArrayError::InvalidArgument { .. } => codes::E_ARGUMENT,
            ArrayError::UnknownNode { .. } => codes::E_UNKNOWN_NODE,
        }
    }
}

impl fmt::Display for ArrayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayError::Shape { message }
            | ArrayError::Index { message }
            | ArrayError::InvalidArgument { message } => write!(f, "{}", message),
            ArrayError::Immutability { node } => {
                write!(f, "cannot replace values in a variable array ({})", node)
            }
            ArrayError::Length {
                slots,
                replacement: 0,
            } => write!(
                f,
                "replacement has length zero but {} items are to be replaced",
                slots
            ),
            ArrayError::Length { slots, replacement } => write!(
                f,
                "number of items to replace ({}) is not a multiple of replacement length ({})",
                slots, replacement
            ),
            ArrayError::UnknownNode { node } => write!(f, "node {} is not part of this graph", node),
        }
    }
}

impl std::error::Error for ArrayError {}
