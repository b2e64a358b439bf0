//! Error types for the coordinator domain.

use std::fmt::{Display, Formatter};

/// Errors surfaced by the coordinator outside of the `Decision` enum.
///
/// Quota and cooldown denials are not errors; they are decisions.
#[derive(Debug, Clone)]
pub enum CoordinatorError {
    /// Invalid tier transition attempted.
    InvalidTransition { message: String },
    /// Storage/persistence failure.
    StorageFailure { message: String },
    /// The request targets a user this installation does not own.
    UnknownUser { user_id: String },
    /// The coordinator actor is gone or dropped the reply.
    Unavailable { message: String },
}

impl Display for CoordinatorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTransition { message } => write!(f, "invalid transition: {}", message),
            Self::StorageFailure { message } => write!(f, "storage failure: {}", message),
            Self::UnknownUser { user_id } => write!(f, "unknown user: {}", user_id),
            Self::Unavailable { message } => write!(f, "coordinator unavailable: {}", message),
        }
    }
}

impl std::error::Error for CoordinatorError {}
