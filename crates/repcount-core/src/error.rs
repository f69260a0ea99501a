//! Error types for the counting core
//!
//! Only identity and configuration problems are errors. Low-confidence
//! geometry and frames without a pose are ordinary signalled conditions and
//! never appear here.

use thiserror::Error;

use crate::ClientId;

/// Core repcount errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RepError {
    // Profile errors
    #[error("Unknown exercise kind `{requested}`; supported: {}", supported.join(", "))]
    UnknownExerciseKind {
        requested: String,
        supported: Vec<String>,
    },

    #[error("Invalid profile for {kind}: {reason}")]
    InvalidProfile { kind: String, reason: String },

    // Session errors
    #[error("Unknown session: {0}")]
    UnknownSession(ClientId),

    #[error("Session already exists: {0}")]
    DuplicateSession(ClientId),

    #[error("Session limit reached: {limit} active sessions")]
    SessionLimitReached { limit: usize },

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for repcount operations
pub type RepResult<T> = Result<T, RepError>;
