//! Permit handlers.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use gatepass_core::actor::ActorContext;
use gatepass_core::models::permit::{Permit, PermitDraft};
use gatepass_permits::PermitQuery;
use serde::Serialize;
use uuid::Uuid;

use super::MessageResponse;
use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_permits).post(create_permit))
        .route("/export", get(export_permits))
        .route(
            "/:id",
            get(get_permit).put(update_permit).delete(delete_permit),
        )
        .route("/:id/close", patch(close_permit))
        .route("/:id/reopen", patch(reopen_permit))
}

#[derive(Debug, Serialize)]
pub struct PermitListResponse {
    pub permits: Vec<Permit>,
}

#[derive(Debug, Serialize)]
pub struct PermitResponse {
    pub permit: Permit,
}

type PermitId = Result<Path<Uuid>, PathRejection>;

pub async fn list_permits(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    query: Result<Query<PermitQuery>, QueryRejection>,
) -> Result<Json<PermitListResponse>, ApiError> {
    let Query(query) = query?;
    let permits = state.permits.list(&actor.user, query).await?;
    Ok(Json(PermitListResponse { permits }))
}

/// Rows for client-side spreadsheet rendering.
pub async fn export_permits(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    query: Result<Query<PermitQuery>, QueryRejection>,
) -> Result<Json<PermitListResponse>, ApiError> {
    let Query(query) = query?;
    let permits = state.permits.export(&actor, query).await?;
    Ok(Json(PermitListResponse { permits }))
}

pub async fn get_permit(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    id: PermitId,
) -> Result<Json<PermitResponse>, ApiError> {
    let Path(id) = id?;
    let permit = state.permits.get(&actor.user, id).await?;
    Ok(Json(PermitResponse { permit }))
}

pub async fn create_permit(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    payload: Result<Json<PermitDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<PermitResponse>), ApiError> {
    let Json(draft) = payload?;
    let permit = state.permits.create(&actor, draft).await?;
    Ok((StatusCode::CREATED, Json(PermitResponse { permit })))
}

pub async fn update_permit(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    id: PermitId,
    payload: Result<Json<PermitDraft>, JsonRejection>,
) -> Result<Json<PermitResponse>, ApiError> {
    let Path(id) = id?;
    let Json(draft) = payload?;
    let permit = state.permits.update(&actor, id, draft).await?;
    Ok(Json(PermitResponse { permit }))
}

pub async fn close_permit(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    id: PermitId,
) -> Result<Json<PermitResponse>, ApiError> {
    let Path(id) = id?;
    let permit = state.permits.close(&actor, id).await?;
    Ok(Json(PermitResponse { permit }))
}

pub async fn reopen_permit(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    id: PermitId,
) -> Result<Json<PermitResponse>, ApiError> {
    let Path(id) = id?;
    let permit = state.permits.reopen(&actor, id).await?;
    Ok(Json(PermitResponse { permit }))
}

pub async fn delete_permit(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    id: PermitId,
) -> Result<Json<MessageResponse>, ApiError> {
    let Path(id) = id?;
    state.permits.delete(&actor, id).await?;
    Ok(Json(MessageResponse::new("permit deleted successfully")))
}
