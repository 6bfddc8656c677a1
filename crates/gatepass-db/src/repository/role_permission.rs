//! SurrealDB implementation of [`RolePermissionRepository`].
//!
//! Each override is stored under the record id `role_permission:<role>`,
//! so a role can never have more than one.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use gatepass_core::capability::Capability;
use gatepass_core::error::GatepassResult;
use gatepass_core::models::role_permissions::RolePermissions;
use gatepass_core::models::user::Role;
use gatepass_core::repository::RolePermissionRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::warn;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct RolePermissionRow {
    role: String,
    capabilities: serde_json::Value,
    updated_at: DateTime<Utc>,
}

impl RolePermissionRow {
    fn try_into_role_permissions(self) -> Result<RolePermissions, DbError> {
        let role: Role = self
            .role
            .parse()
            .map_err(|_| DbError::Corrupt(format!("unknown role: {}", self.role)))?;
        let raw: BTreeMap<String, bool> = serde_json::from_value(self.capabilities)
            .map_err(|e| DbError::Corrupt(format!("capabilities for {role}: {e}")))?;

        let mut capabilities = BTreeMap::new();
        for (name, granted) in raw {
            match name.parse::<Capability>() {
                Ok(cap) => {
                    capabilities.insert(cap, granted);
                }
                Err(_) => warn!(role = %role, capability = %name, "Ignoring unknown capability"),
            }
        }

        Ok(RolePermissions {
            role,
            capabilities,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the role permission override repository.
#[derive(Clone)]
pub struct SurrealRolePermissionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRolePermissionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> RolePermissionRepository for SurrealRolePermissionRepository<C> {
    async fn get(&self, role: Role) -> GatepassResult<Option<RolePermissions>> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('role_permission', $role)")
            .bind(("role", role.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RolePermissionRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .next()
            .map(|row| row.try_into_role_permissions())
            .transpose()?)
    }

    async fn list(&self) -> GatepassResult<Vec<RolePermissions>> {
        let mut result = self
            .db
            .query("SELECT * FROM role_permission ORDER BY role ASC")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RolePermissionRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(|row| row.try_into_role_permissions())
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn upsert(
        &self,
        role: Role,
        capabilities: BTreeMap<Capability, bool>,
    ) -> GatepassResult<RolePermissions> {
        let capabilities = serde_json::to_value(&capabilities)
            .map_err(|e| DbError::Corrupt(format!("capabilities for {role}: {e}")))?;

        let result = self
            .db
            .query(
                "UPSERT type::record('role_permission', $role) SET \
                 role = $role, capabilities = $capabilities, \
                 updated_at = $now",
            )
            .bind(("role", role.as_str().to_string()))
            .bind(("capabilities", capabilities))
            .bind(("now", Utc::now()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("role_permission", e))?;

        let rows: Vec<RolePermissionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("role_permission", role))?;

        Ok(row.try_into_role_permissions()?)
    }

    async fn delete(&self, role: Role) -> GatepassResult<bool> {
        let mut result = self
            .db
            .query("DELETE type::record('role_permission', $role) RETURN BEFORE")
            .bind(("role", role.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RolePermissionRow> = result.take(0).map_err(DbError::from)?;
        Ok(!rows.is_empty())
    }
}
