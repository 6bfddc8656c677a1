//! Activity-log handlers.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Extension, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use gatepass_core::actor::ActorContext;
use gatepass_core::models::activity::ActivityLogEntry;
use gatepass_permits::ActivityQuery;
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_activity))
        .route("/actions", get(list_actions))
}

#[derive(Debug, Serialize)]
pub struct ActivityPage {
    pub activities: Vec<ActivityLogEntry>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

#[derive(Debug, Serialize)]
pub struct ActionsResponse {
    pub actions: Vec<String>,
}

pub async fn list_activity(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    query: Result<Query<ActivityQuery>, QueryRejection>,
) -> Result<Json<ActivityPage>, ApiError> {
    let Query(query) = query?;
    let page = state.reports.activity(&actor.user, query).await?;
    Ok(Json(ActivityPage {
        activities: page.items,
        total: page.total,
        limit: page.limit,
        offset: page.offset,
    }))
}

pub async fn list_actions(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
) -> Result<Json<ActionsResponse>, ApiError> {
    let actions = state.reports.activity_actions(&actor.user).await?;
    Ok(Json(ActionsResponse { actions }))
}
