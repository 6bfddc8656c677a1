//! User administration and role-permission management.

use std::collections::BTreeMap;

use gatepass_core::actor::ActorContext;
use gatepass_core::capability::{Capability, CapabilitySet};
use gatepass_core::error::{GatepassError, GatepassResult};
use gatepass_core::models::activity::{ActivityAction, details};
use gatepass_core::models::role_permissions::RolePermissions;
use gatepass_core::models::user::{CreateUser, Region, Role, UpdateUser, User};
use gatepass_core::repository::{ActivityLogRepository, RolePermissionRepository, UserRepository};
use gatepass_core::validation::{self, MIN_PASSWORD_LENGTH};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::audit::ActivityAuditor;
use crate::resolver::PermissionResolver;

/// Admin-side account creation. `role` defaults to `observer`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub regions: Option<Vec<Region>>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Partial account update; absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub regions: Option<Vec<Region>>,
    pub role: Option<String>,
}

#[derive(Clone)]
pub struct UserAdminService<U, R, A>
where
    U: UserRepository,
    R: RolePermissionRepository,
    A: ActivityLogRepository,
{
    users: U,
    resolver: PermissionResolver<R>,
    auditor: ActivityAuditor<A>,
    min_password_length: usize,
}

impl<U, R, A> UserAdminService<U, R, A>
where
    U: UserRepository,
    R: RolePermissionRepository,
    A: ActivityLogRepository,
{
    pub fn new(users: U, resolver: PermissionResolver<R>, auditor: ActivityAuditor<A>) -> Self {
        Self {
            users,
            resolver,
            auditor,
            min_password_length: MIN_PASSWORD_LENGTH,
        }
    }

    /// Apply the deployment's password policy to admin-set passwords.
    pub fn with_min_password_length(mut self, min_password_length: usize) -> Self {
        self.min_password_length = min_password_length;
        self
    }

    /// Every account, newest first.
    pub async fn list(&self, actor: &User) -> GatepassResult<Vec<User>> {
        self.resolver
            .require(Some(actor), Capability::CanManageUsers)
            .await?;
        self.users.list().await
    }

    pub async fn create(&self, actor: &ActorContext, input: NewUser) -> GatepassResult<User> {
        self.resolver
            .require(Some(&actor.user), Capability::CanManageUsers)
            .await?;

        let username = validation::username(&input.username)?;
        validation::password(&input.password, self.min_password_length)?;
        let email = validation::email(&input.email)?;
        let first_name = validation::non_empty(&input.first_name, "firstName")?;
        let last_name = validation::non_empty(&input.last_name, "lastName")?;
        let role = match input.role.as_deref() {
            Some(role) => role.parse::<Role>()?,
            None => Role::Observer,
        };

        if self.holder_of_username(&username).await?.is_some()
            || self.holder_of_email(&email).await?.is_some()
        {
            return Err(GatepassError::already_exists("user"));
        }

        let user = self
            .users
            .create(CreateUser {
                username,
                email,
                password: input.password,
                first_name,
                last_name,
                regions: validation::regions(input.regions),
                role,
            })
            .await?;

        info!(
            user_id = %user.id,
            username = %user.username,
            role = %user.role,
            actor_id = %actor.user.id,
            "User created"
        );
        self.auditor
            .record(actor, ActivityAction::CreateUser, details::created_user(&user.username))
            .await;
        Ok(user)
    }

    pub async fn update(
        &self,
        actor: &ActorContext,
        id: Uuid,
        patch: UserPatch,
    ) -> GatepassResult<User> {
        self.resolver
            .require(Some(&actor.user), Capability::CanManageUsers)
            .await?;
        self.users.get_by_id(id).await?;

        let mut update = UpdateUser::default();
        if let Some(username) = patch.username.as_deref() {
            let username = validation::username(username)?;
            if self
                .holder_of_username(&username)
                .await?
                .is_some_and(|other| other.id != id)
            {
                return Err(GatepassError::already_exists("user"));
            }
            update.username = Some(username);
        }
        if let Some(email) = patch.email.as_deref() {
            let email = validation::email(email)?;
            if self
                .holder_of_email(&email)
                .await?
                .is_some_and(|other| other.id != id)
            {
                return Err(GatepassError::already_exists("user"));
            }
            update.email = Some(email);
        }
        if let Some(password) = patch.password {
            validation::password(&password, self.min_password_length)?;
            update.password = Some(password);
        }
        if let Some(first_name) = patch.first_name.as_deref() {
            update.first_name = Some(validation::non_empty(first_name, "firstName")?);
        }
        if let Some(last_name) = patch.last_name.as_deref() {
            update.last_name = Some(validation::non_empty(last_name, "lastName")?);
        }
        if patch.regions.is_some() {
            update.regions = Some(validation::regions(patch.regions));
        }
        if let Some(role) = patch.role.as_deref() {
            let role = role.parse::<Role>()?;
            if actor.user.role != Role::Admin {
                return Err(GatepassError::denied("only admins can change roles"));
            }
            update.role = Some(role);
        }

        let user = self.users.update(id, update).await?;

        info!(user_id = %user.id, actor_id = %actor.user.id, "User updated");
        self.auditor
            .record(actor, ActivityAction::UpdateUser, details::updated_user(&user.username))
            .await;
        Ok(user)
    }

    /// Hard delete. An actor can never delete their own account.
    pub async fn delete(&self, actor: &ActorContext, id: Uuid) -> GatepassResult<()> {
        self.resolver
            .require(Some(&actor.user), Capability::CanManageUsers)
            .await?;
        if actor.user.id == id {
            return Err(GatepassError::SelfDeletion);
        }

        let target = self.users.get_by_id(id).await?;
        self.users.delete(id).await?;

        warn!(
            user_id = %id,
            username = %target.username,
            actor_id = %actor.user.id,
            "User deleted"
        );
        self.auditor
            .record(actor, ActivityAction::DeleteUser, details::deleted_user(&target.username))
            .await;
        Ok(())
    }

    pub async fn role_permissions(&self, actor: &User) -> GatepassResult<Vec<RolePermissions>> {
        self.resolver
            .require(Some(actor), Capability::CanManagePermissions)
            .await?;
        self.resolver.list_overrides().await
    }

    pub async fn set_role_permissions(
        &self,
        actor: &ActorContext,
        role: Role,
        capabilities: BTreeMap<Capability, bool>,
    ) -> GatepassResult<RolePermissions> {
        self.resolver
            .require(Some(&actor.user), Capability::CanManagePermissions)
            .await?;
        let record = self
            .resolver
            .set_override(&actor.user, role, capabilities)
            .await?;

        self.auditor
            .record(
                actor,
                ActivityAction::UpdateRolePermissions,
                details::updated_role_permissions(role),
            )
            .await;
        Ok(record)
    }

    pub async fn clear_role_permissions(
        &self,
        actor: &ActorContext,
        role: Role,
    ) -> GatepassResult<()> {
        self.resolver
            .require(Some(&actor.user), Capability::CanManagePermissions)
            .await?;
        self.resolver.clear_override(&actor.user, role).await?;

        self.auditor
            .record(
                actor,
                ActivityAction::UpdateRolePermissions,
                details::updated_role_permissions(role),
            )
            .await;
        Ok(())
    }

    /// The caller's own effective capabilities.
    pub async fn my_permissions(&self, user: &User) -> GatepassResult<CapabilitySet> {
        self.resolver.effective_capabilities(user).await
    }

    async fn holder_of_username(&self, username: &str) -> GatepassResult<Option<User>> {
        optional(self.users.get_by_username(username).await)
    }

    async fn holder_of_email(&self, email: &str) -> GatepassResult<Option<User>> {
        optional(self.users.get_by_email(email).await)
    }
}

fn optional(result: GatepassResult<User>) -> GatepassResult<Option<User>> {
    match result {
        Ok(user) => Ok(Some(user)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}
