//! Error types for analysis queries
//!
//! Exploratory queries (paths, permissions) never fail on missing ids;
//! only genuinely invalid requests surface here.

use thiserror::Error;

/// Analysis errors
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Action outside the read/write/delete/admin vocabulary
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    /// Permission glob failed to compile
    #[error("Invalid permission pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Result type for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;
