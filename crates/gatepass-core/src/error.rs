//! Error types for the Gatepass system.
//!
//! Every component surfaces one of these kinds; the HTTP layer maps each
//! kind to exactly one status code.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatepassError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("authentication required")]
    AuthenticationRequired,

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Authorization denied: {reason}")]
    AuthorizationDenied { reason: String },

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    /// An invalid lifecycle transition (edit closed, close twice, ...).
    #[error("Invalid state: {reason}")]
    InvalidState { reason: String },

    #[error("cannot delete your own account")]
    SelfDeletion,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatepassError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn denied(reason: impl Into<String>) -> Self {
        Self::AuthorizationDenied {
            reason: reason.into(),
        }
    }

    pub fn invalid_state(reason: impl Into<String>) -> Self {
        Self::InvalidState {
            reason: reason.into(),
        }
    }

    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn already_exists(entity: impl Into<String>) -> Self {
        Self::AlreadyExists {
            entity: entity.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type GatepassResult<T> = Result<T, GatepassError>;
