//! SurrealDB repository implementations.

mod activity_log;
mod permit;
mod role_permission;
mod user;

use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

pub use activity_log::SurrealActivityLogRepository;
pub use permit::SurrealPermitRepository;
pub use role_permission::SurrealRolePermissionRepository;
pub use user::{SurrealUserRepository, hash_password, verify_password};

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
pub(crate) struct CountRow {
    pub(crate) total: u64,
}

pub(crate) fn parse_uuid(s: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(s).map_err(|e| DbError::Corrupt(format!("invalid UUID {s}: {e}")))
}
