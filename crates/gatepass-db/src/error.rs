//! Database-specific error types and conversions.

use gatepass_core::error::GatepassError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    /// A unique index rejected the write.
    #[error("Record already exists: {entity}")]
    Conflict { entity: String },

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Password hashing failed: {0}")]
    Hash(String),
}

impl DbError {
    /// Classify a failed statement, recognising unique-index violations.
    pub(crate) fn from_statement(entity: &str, err: surrealdb::Error) -> Self {
        let message = err.to_string();
        if message.contains("already contains") {
            DbError::Conflict {
                entity: entity.into(),
            }
        } else {
            DbError::Query(message)
        }
    }

    pub(crate) fn not_found(entity: &str, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }
}

impl From<DbError> for GatepassError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => GatepassError::NotFound { entity, id },
            DbError::Conflict { entity } => GatepassError::AlreadyExists { entity },
            DbError::Hash(msg) => GatepassError::Crypto(msg),
            other => GatepassError::Database(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_maps_to_already_exists() {
        let err: GatepassError = DbError::Conflict {
            entity: "permit".into(),
        }
        .into();
        assert!(matches!(err, GatepassError::AlreadyExists { .. }));
    }

    #[test]
    fn not_found_keeps_entity_and_id() {
        let err: GatepassError = DbError::not_found("user", "abc").into();
        match err {
            GatepassError::NotFound { entity, id } => {
                assert_eq!(entity, "user");
                assert_eq!(id, "abc");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
