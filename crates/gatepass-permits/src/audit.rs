//! Activity auditing.
//!
//! Recording is best-effort: a failed append is logged and swallowed so
//! it can never undo or fail the mutation it describes.

use gatepass_core::actor::ActorContext;
use gatepass_core::error::GatepassResult;
use gatepass_core::models::activity::{ActivityAction, ActivityLogEntry, CreateActivityLogEntry};
use gatepass_core::repository::{
    ActivityLogFilter, ActivityLogRepository, PaginatedResult, Pagination,
};
use tracing::warn;

#[derive(Clone)]
pub struct ActivityAuditor<A: ActivityLogRepository> {
    repo: A,
}

impl<A: ActivityLogRepository> ActivityAuditor<A> {
    pub fn new(repo: A) -> Self {
        Self { repo }
    }

    pub async fn record(&self, actor: &ActorContext, action: ActivityAction, details: String) {
        let entry = CreateActivityLogEntry {
            actor_id: actor.user.id,
            actor_name: actor.user.display_name(),
            actor_username: actor.user.username.clone(),
            action,
            details,
            source_ip: actor.client.source_ip.clone(),
            user_agent: actor.client.user_agent.clone(),
        };
        if let Err(e) = self.repo.append(entry).await {
            warn!(
                actor_id = %actor.user.id,
                action = %action,
                error = %e,
                "Failed to record activity"
            );
        }
    }

    pub async fn query(
        &self,
        filter: ActivityLogFilter,
        pagination: Pagination,
    ) -> GatepassResult<PaginatedResult<ActivityLogEntry>> {
        self.repo.list(filter, pagination).await
    }

    pub async fn distinct_actions(&self) -> GatepassResult<Vec<String>> {
        self.repo.distinct_actions().await
    }
}
