//! Permit lifecycle manager.
//!
//! Every operation checks the actor's capability first, then region
//! scope, then the lifecycle rule. The repository's conditional writes
//! decide races; when one does not apply, the permit is re-read to report
//! why.

use chrono::Utc;
use gatepass_core::actor::ActorContext;
use gatepass_core::capability::Capability;
use gatepass_core::error::{GatepassError, GatepassResult};
use gatepass_core::lifecycle::{self, RegionScope};
use gatepass_core::models::activity::{ActivityAction, details};
use gatepass_core::models::permit::{ClosePermit, Material, Permit, PermitDraft};
use gatepass_core::models::user::User;
use gatepass_core::repository::{
    ActivityLogRepository, PermitFilter, PermitRepository, RolePermissionRepository,
};
use gatepass_core::validation;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::audit::ActivityAuditor;
use crate::resolver::PermissionResolver;

/// Client-supplied listing filters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PermitQuery {
    pub region: Option<String>,
    pub date: Option<String>,
    pub search: Option<String>,
}

impl PermitQuery {
    fn into_filter(self, actor: &User) -> GatepassResult<PermitFilter> {
        Ok(PermitFilter {
            scope: RegionScope::for_actor(actor),
            region: self.region.filter(|r| !r.trim().is_empty()),
            date: validation::date_filter(self.date.as_deref())?,
            search: self.search.filter(|s| !s.trim().is_empty()),
        })
    }
}

#[derive(Clone)]
pub struct PermitService<P, R, A>
where
    P: PermitRepository,
    R: RolePermissionRepository,
    A: ActivityLogRepository,
{
    permits: P,
    resolver: PermissionResolver<R>,
    auditor: ActivityAuditor<A>,
}

impl<P, R, A> PermitService<P, R, A>
where
    P: PermitRepository,
    R: RolePermissionRepository,
    A: ActivityLogRepository,
{
    pub fn new(permits: P, resolver: PermissionResolver<R>, auditor: ActivityAuditor<A>) -> Self {
        Self {
            permits,
            resolver,
            auditor,
        }
    }

    /// Permits visible to `actor`, newest first.
    pub async fn list(&self, actor: &User, query: PermitQuery) -> GatepassResult<Vec<Permit>> {
        self.resolver
            .require(Some(actor), Capability::CanViewPermits)
            .await?;
        self.permits.list(query.into_filter(actor)?).await
    }

    pub async fn get(&self, actor: &User, id: Uuid) -> GatepassResult<Permit> {
        self.resolver
            .require(Some(actor), Capability::CanViewPermits)
            .await?;
        let permit = self.permits.get_by_id(id).await?;
        lifecycle::ensure_region_access(actor, &permit.region)?;
        Ok(permit)
    }

    pub async fn create(&self, actor: &ActorContext, draft: PermitDraft) -> GatepassResult<Permit> {
        self.resolver
            .require(Some(&actor.user), Capability::CanCreatePermits)
            .await?;
        let input = draft.into_create(actor.user.id)?;
        lifecycle::ensure_region_access(&actor.user, &input.region)?;

        if self.permits.get_by_number(&input.permit_number).await?.is_some() {
            return Err(GatepassError::already_exists("permit"));
        }

        let number = input.permit_number.clone();
        let permit = match self.permits.create(input).await {
            Ok(permit) => permit,
            Err(e @ GatepassError::AlreadyExists { .. }) => return Err(e),
            Err(e) => {
                // A concurrent create may have taken the number and made
                // this write fail with a transaction conflict instead.
                if matches!(self.permits.get_by_number(&number).await, Ok(Some(_))) {
                    return Err(GatepassError::already_exists("permit"));
                }
                return Err(e);
            }
        };

        info!(
            permit_id = %permit.id,
            permit_number = %permit.permit_number,
            actor_id = %actor.user.id,
            "Permit created"
        );
        self.auditor
            .record(
                actor,
                ActivityAction::CreatePermit,
                details::created_permit(&permit.permit_number),
            )
            .await;
        Ok(permit)
    }

    pub async fn update(
        &self,
        actor: &ActorContext,
        id: Uuid,
        draft: PermitDraft,
    ) -> GatepassResult<Permit> {
        self.resolver
            .require(Some(&actor.user), Capability::CanEditPermits)
            .await?;
        let mut input = draft.into_update()?;

        let existing = self.permits.get_by_id(id).await?;
        lifecycle::ensure_region_access(&actor.user, &existing.region)?;
        lifecycle::ensure_can_edit(&existing)?;

        let request_type = input.request_type.unwrap_or(existing.request_type);
        if request_type.is_vehicle_only() {
            if input.materials.is_some() {
                input.materials = Some(vec![Material::sentinel()]);
            }
        } else if existing.request_type.is_vehicle_only() && input.materials.is_none() {
            return Err(GatepassError::validation(
                "materials are required when leaving a vehicle-only request type",
            ));
        }

        if let Some(number) = input.permit_number.as_deref() {
            if number != existing.permit_number {
                if let Some(other) = self.permits.get_by_number(number).await? {
                    if other.id != id {
                        return Err(GatepassError::already_exists("permit"));
                    }
                }
            }
        }

        let outcome = self.permits.update_open(id, input).await;
        let permit = match outcome {
            Ok(Some(permit)) => permit,
            Ok(None) => return Err(self.explain_missed_edit(id, None).await),
            Err(e @ GatepassError::AlreadyExists { .. }) => return Err(e),
            Err(e) => return Err(self.explain_missed_edit(id, Some(e)).await),
        };

        info!(permit_id = %permit.id, actor_id = %actor.user.id, "Permit updated");
        self.auditor
            .record(
                actor,
                ActivityAction::UpdatePermit,
                details::updated_permit(&permit.permit_number),
            )
            .await;
        Ok(permit)
    }

    async fn explain_missed_edit(&self, id: Uuid, cause: Option<GatepassError>) -> GatepassError {
        match self.permits.get_by_id(id).await {
            Ok(p) if p.is_closed() => GatepassError::invalid_state("cannot edit closed permit"),
            Err(e) if e.is_not_found() => e,
            _ => cause.unwrap_or_else(|| GatepassError::Internal("permit edit did not apply".into())),
        }
    }

    pub async fn close(&self, actor: &ActorContext, id: Uuid) -> GatepassResult<Permit> {
        self.resolver
            .require(Some(&actor.user), Capability::CanClosePermits)
            .await?;

        let existing = self.permits.get_by_id(id).await?;
        lifecycle::ensure_region_access(&actor.user, &existing.region)?;
        lifecycle::ensure_can_close(&existing)?;

        let input = ClosePermit {
            closed_by: actor.user.id,
            closed_by_name: actor.user.closer_snapshot(),
            closed_at: Utc::now(),
        };
        let permit = match self.permits.close(id, input).await {
            Ok(Some(permit)) => permit,
            Ok(None) => return Err(self.explain_missed_close(id, None).await),
            Err(e) => return Err(self.explain_missed_close(id, Some(e)).await),
        };

        info!(permit_id = %permit.id, actor_id = %actor.user.id, "Permit closed");
        self.auditor
            .record(
                actor,
                ActivityAction::ClosePermit,
                details::closed_permit(&permit.permit_number),
            )
            .await;
        Ok(permit)
    }

    async fn explain_missed_close(&self, id: Uuid, cause: Option<GatepassError>) -> GatepassError {
        match self.permits.get_by_id(id).await {
            Ok(p) if p.is_closed() => GatepassError::invalid_state("permit is already closed"),
            Err(e) if e.is_not_found() => e,
            _ => cause.unwrap_or_else(|| GatepassError::Internal("permit close did not apply".into())),
        }
    }

    pub async fn reopen(&self, actor: &ActorContext, id: Uuid) -> GatepassResult<Permit> {
        let caps = self
            .resolver
            .require(Some(&actor.user), Capability::CanReopenPermits)
            .await?;

        let existing = self.permits.get_by_id(id).await?;
        lifecycle::ensure_can_reopen(
            &existing,
            actor.user.id,
            caps.contains(Capability::CanReopenAnyPermit),
            Utc::now(),
        )?;

        let permit = match self.permits.reopen(id).await {
            Ok(Some(permit)) => permit,
            Ok(None) => return Err(self.explain_missed_reopen(id, None).await),
            Err(e) => return Err(self.explain_missed_reopen(id, Some(e)).await),
        };

        info!(permit_id = %permit.id, actor_id = %actor.user.id, "Permit reopened");
        self.auditor
            .record(
                actor,
                ActivityAction::ReopenPermit,
                details::reopened_permit(&permit.permit_number),
            )
            .await;
        Ok(permit)
    }

    async fn explain_missed_reopen(&self, id: Uuid, cause: Option<GatepassError>) -> GatepassError {
        match self.permits.get_by_id(id).await {
            Ok(p) if !p.is_closed() => GatepassError::invalid_state("permit is not closed"),
            Err(e) if e.is_not_found() => e,
            _ => cause.unwrap_or_else(|| GatepassError::Internal("permit reopen did not apply".into())),
        }
    }

    /// Delete a permit with its materials. Not region-scoped.
    pub async fn delete(&self, actor: &ActorContext, id: Uuid) -> GatepassResult<Permit> {
        self.resolver
            .require(Some(&actor.user), Capability::CanDeletePermits)
            .await?;

        let permit = self
            .permits
            .delete(id)
            .await?
            .ok_or_else(|| GatepassError::not_found("permit", id))?;

        warn!(
            permit_id = %permit.id,
            permit_number = %permit.permit_number,
            actor_id = %actor.user.id,
            "Permit deleted"
        );
        self.auditor
            .record(
                actor,
                ActivityAction::DeletePermit,
                details::deleted_permit(&permit.permit_number, &permit.carrier_name),
            )
            .await;
        Ok(permit)
    }

    /// Same rows as [`Self::list`], recorded as an export.
    pub async fn export(
        &self,
        actor: &ActorContext,
        query: PermitQuery,
    ) -> GatepassResult<Vec<Permit>> {
        self.resolver
            .require(Some(&actor.user), Capability::CanExportPermits)
            .await?;
        let permits = self.permits.list(query.into_filter(&actor.user)?).await?;

        self.auditor
            .record(
                actor,
                ActivityAction::ExportPermits,
                details::exported_permits(permits.len()),
            )
            .await;
        Ok(permits)
    }
}
