//! Server configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use axum::http::HeaderValue;
use gatepass_auth::AuthConfig;
use gatepass_db::DbConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),

    #[error("invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address (host:port).
    pub bind_address: String,
    pub db: DbConfig,
    pub auth: AuthConfig,
    /// Upper bound on a single request before it is answered with 408.
    pub request_timeout: Duration,
    /// Allowed CORS origin; any origin when unset.
    pub frontend_origin: Option<HeaderValue>,
    /// Password for an `admin` account created on first start.
    pub bootstrap_admin_password: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let db_defaults = DbConfig::default();
        let auth_defaults = AuthConfig::default();

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }

        let frontend_origin = match non_empty_var("FRONTEND_URL") {
            Some(url) => Some(HeaderValue::from_str(url.trim_end_matches('/')).map_err(|_| {
                ConfigError::Invalid {
                    var: "FRONTEND_URL",
                    value: url.clone(),
                }
            })?),
            None => None,
        };

        Ok(Self {
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:10000".into()),
            db: DbConfig {
                url: env::var("DATABASE_URL").unwrap_or(db_defaults.url),
                namespace: env::var("DATABASE_NAMESPACE").unwrap_or(db_defaults.namespace),
                database: env::var("DATABASE_NAME").unwrap_or(db_defaults.database),
                username: env::var("DATABASE_USER").unwrap_or(db_defaults.username),
                password: env::var("DATABASE_PASS").unwrap_or(db_defaults.password),
            },
            auth: AuthConfig {
                jwt_secret,
                access_token_lifetime_secs: parse_var(
                    "JWT_EXPIRES_IN_SECS",
                    auth_defaults.access_token_lifetime_secs,
                )?,
                pepper: non_empty_var("PASSWORD_PEPPER"),
                ..auth_defaults
            },
            request_timeout: Duration::from_secs(parse_var("REQUEST_TIMEOUT_SECS", 30)?),
            frontend_origin,
            bootstrap_admin_password: non_empty_var("BOOTSTRAP_ADMIN_PASSWORD"),
        })
    }
}

fn non_empty_var(var: &str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var(var: &'static str, default: u64) -> Result<u64, ConfigError> {
    match non_empty_var(var) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        None => Ok(default),
    }
}
