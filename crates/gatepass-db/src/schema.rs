//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Users
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD username ON TABLE user TYPE string;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD password_hash ON TABLE user TYPE string;
DEFINE FIELD first_name ON TABLE user TYPE string;
DEFINE FIELD last_name ON TABLE user TYPE string;
DEFINE FIELD regions ON TABLE user TYPE array<string>;
DEFINE FIELD role ON TABLE user TYPE string \
    ASSERT $value IN ['admin', 'manager', 'security_officer', 'observer'];
DEFINE FIELD last_login ON TABLE user TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_username ON TABLE user COLUMNS username UNIQUE;
DEFINE INDEX idx_user_email ON TABLE user COLUMNS email UNIQUE;

-- =======================================================================
-- Permits (materials embedded)
-- =======================================================================
DEFINE TABLE permit SCHEMAFULL;
DEFINE FIELD permit_number ON TABLE permit TYPE string;
DEFINE FIELD date ON TABLE permit TYPE string;
DEFINE FIELD region ON TABLE permit TYPE string;
DEFINE FIELD location ON TABLE permit TYPE string;
DEFINE FIELD carrier_name ON TABLE permit TYPE string;
DEFINE FIELD carrier_id ON TABLE permit TYPE string;
DEFINE FIELD request_type ON TABLE permit TYPE string \
    ASSERT $value IN ['material_entrance', 'material_exit', \
    'heavy_vehicle_entrance_exit', 'heavy_vehicle_entrance', \
    'heavy_vehicle_exit'];
DEFINE FIELD vehicle_plate ON TABLE permit TYPE string;
DEFINE FIELD materials ON TABLE permit TYPE array<object> \
    ASSERT array::len($value) > 0;
DEFINE FIELD materials.*.id ON TABLE permit TYPE string;
DEFINE FIELD materials.*.description ON TABLE permit TYPE string;
DEFINE FIELD materials.*.serial_number ON TABLE permit TYPE string;
DEFINE FIELD created_by ON TABLE permit TYPE string;
DEFINE FIELD created_at ON TABLE permit TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD closed_by ON TABLE permit TYPE option<string>;
DEFINE FIELD closed_at ON TABLE permit TYPE option<datetime>;
DEFINE FIELD closed_by_name ON TABLE permit TYPE option<string>;
DEFINE FIELD can_reopen ON TABLE permit TYPE bool DEFAULT true;
DEFINE INDEX idx_permit_number ON TABLE permit \
    COLUMNS permit_number UNIQUE;
DEFINE INDEX idx_permit_region ON TABLE permit COLUMNS region;
DEFINE INDEX idx_permit_created_at ON TABLE permit COLUMNS created_at;

-- =======================================================================
-- Role permission overrides
-- =======================================================================
DEFINE TABLE role_permission SCHEMAFULL;
DEFINE FIELD role ON TABLE role_permission TYPE string \
    ASSERT $value IN ['admin', 'manager', 'security_officer', 'observer'];
DEFINE FIELD capabilities ON TABLE role_permission TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD updated_at ON TABLE role_permission TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_role_permission_role ON TABLE role_permission \
    COLUMNS role UNIQUE;

-- =======================================================================
-- Activity log (append-only: no UPDATE or DELETE permissions)
-- =======================================================================
DEFINE TABLE activity_log SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD actor_id ON TABLE activity_log TYPE string;
DEFINE FIELD actor_name ON TABLE activity_log TYPE string;
DEFINE FIELD actor_username ON TABLE activity_log TYPE string;
DEFINE FIELD action ON TABLE activity_log TYPE string;
DEFINE FIELD details ON TABLE activity_log TYPE string;
DEFINE FIELD source_ip ON TABLE activity_log TYPE string;
DEFINE FIELD user_agent ON TABLE activity_log TYPE string;
DEFINE FIELD timestamp ON TABLE activity_log TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_activity_timestamp ON TABLE activity_log \
    COLUMNS timestamp;
DEFINE INDEX idx_activity_action ON TABLE activity_log COLUMNS action;
";

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
