//! Error types for the access graph

use thiserror::Error;

/// Graph construction and mutation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    /// Edge endpoint not present in the node registry
    #[error("Unknown node: {0}")]
    UnknownNode(String),

    /// Edge type token outside the closed vocabulary
    #[error("Unknown edge type: {0}")]
    UnknownEdgeType(String),

    /// Node type token outside the closed vocabulary
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    /// Access level token outside read/write/admin
    #[error("Unknown access level: {0}")]
    UnknownAccessLevel(String),

    /// Invalid analysis configuration (fatal, startup only)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for graph operations
pub type Result<T> = std::result::Result<T, GraphError>;
