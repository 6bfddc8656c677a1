//! Authentication error types.

use gatepass_core::error::GatepassError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("authentication required")]
    MissingToken,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("user no longer exists")]
    UserGone,

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for GatepassError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken => GatepassError::AuthenticationRequired,
            // Decoder detail is logged by the caller, never returned.
            AuthError::TokenInvalid(_) => GatepassError::AuthenticationFailed {
                reason: "invalid token".into(),
            },
            AuthError::InvalidCredentials | AuthError::TokenExpired | AuthError::UserGone => {
                GatepassError::AuthenticationFailed {
                    reason: err.to_string(),
                }
            }
            AuthError::Crypto(msg) => GatepassError::Crypto(msg),
        }
    }
}
