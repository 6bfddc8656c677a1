//! Gatepass Auth — password verification, JWT issuance/validation and
//! the login, registration and password-reset flows.

pub mod config;
pub mod error;
pub mod password;
pub mod service;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use service::{AuthService, LoginInput, LoginOutput, RegisterInput, ResetPasswordInput};
pub use token::AccessTokenClaims;
