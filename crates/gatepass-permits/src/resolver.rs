//! Role-permission resolution against stored overrides.

use std::collections::BTreeMap;

use gatepass_core::capability::{self, Capability, CapabilitySet};
use gatepass_core::error::{GatepassError, GatepassResult};
use gatepass_core::models::role_permissions::RolePermissions;
use gatepass_core::models::user::{Role, User};
use gatepass_core::repository::RolePermissionRepository;
use tracing::{debug, info};

#[derive(Clone)]
pub struct PermissionResolver<R: RolePermissionRepository> {
    repo: R,
}

impl<R: RolePermissionRepository> PermissionResolver<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub async fn effective_capabilities(&self, user: &User) -> GatepassResult<CapabilitySet> {
        let stored = self.repo.get(user.role).await?;
        Ok(capability::resolve(user.role, stored.as_ref()))
    }

    /// Fail unless `actor` is present and holds `capability`. Returns the
    /// actor's full capability set for follow-up checks.
    pub async fn require(
        &self,
        actor: Option<&User>,
        capability: Capability,
    ) -> GatepassResult<CapabilitySet> {
        let actor = actor.ok_or(GatepassError::AuthenticationRequired)?;
        let caps = self.effective_capabilities(actor).await?;
        if !caps.contains(capability) {
            debug!(
                user_id = %actor.id,
                role = %actor.role,
                capability = %capability,
                "Capability denied"
            );
            return Err(GatepassError::denied("permission denied"));
        }
        Ok(caps)
    }

    pub async fn list_overrides(&self) -> GatepassResult<Vec<RolePermissions>> {
        self.repo.list().await
    }

    /// Replace the override for `role`. Only admins may do this.
    pub async fn set_override(
        &self,
        actor: &User,
        role: Role,
        capabilities: BTreeMap<Capability, bool>,
    ) -> GatepassResult<RolePermissions> {
        ensure_admin(actor)?;
        let record = self.repo.upsert(role, capabilities).await?;
        info!(actor_id = %actor.id, role = %role, "Role permissions overridden");
        Ok(record)
    }

    /// Drop the override for `role` so its defaults apply again.
    pub async fn clear_override(&self, actor: &User, role: Role) -> GatepassResult<()> {
        ensure_admin(actor)?;
        if !self.repo.delete(role).await? {
            return Err(GatepassError::not_found("role_permission", role));
        }
        info!(actor_id = %actor.id, role = %role, "Role permissions reset to defaults");
        Ok(())
    }
}

fn ensure_admin(actor: &User) -> GatepassResult<()> {
    if actor.role == Role::Admin {
        Ok(())
    } else {
        Err(GatepassError::denied("permission denied"))
    }
}
