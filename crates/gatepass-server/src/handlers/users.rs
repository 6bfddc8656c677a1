//! User administration and role-permission handlers.

use std::collections::BTreeMap;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use gatepass_core::actor::ActorContext;
use gatepass_core::capability::Capability;
use gatepass_core::models::role_permissions::RolePermissions;
use gatepass_core::models::user::{Role, User};
use gatepass_permits::{NewUser, UserPatch};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::MessageResponse;
use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/me/permissions", get(my_permissions))
        .route("/role-permissions", get(list_role_permissions))
        .route(
            "/role-permissions/:role",
            put(set_role_permissions).delete(clear_role_permissions),
        )
        .route("/:id", put(update_user).delete(delete_user))
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<User>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct RolePermissionsListResponse {
    pub permissions: Vec<RolePermissions>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RolePermissionsResponse {
    pub role_permissions: RolePermissions,
}

#[derive(Debug, Serialize)]
pub struct EffectivePermissionsResponse {
    pub permissions: BTreeMap<Capability, bool>,
}

#[derive(Debug, Deserialize)]
pub struct SetRolePermissionsRequest {
    pub permissions: BTreeMap<String, bool>,
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
) -> Result<Json<UserListResponse>, ApiError> {
    let users = state.users.list(&actor.user).await?;
    Ok(Json(UserListResponse { users }))
}

pub async fn create_user(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let Json(input) = payload?;
    let user = state.users.create(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(UserResponse { user })))
}

pub async fn update_user(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UserPatch>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    let Path(id) = id?;
    let Json(patch) = payload?;
    let user = state.users.update(&actor, id, patch).await?;
    Ok(Json(UserResponse { user }))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Path(id) = id?;
    state.users.delete(&actor, id).await?;
    Ok(Json(MessageResponse::new("user deleted successfully")))
}

pub async fn my_permissions(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
) -> Result<Json<EffectivePermissionsResponse>, ApiError> {
    let caps = state.users.my_permissions(&actor.user).await?;
    Ok(Json(EffectivePermissionsResponse {
        permissions: caps.to_map(),
    }))
}

pub async fn list_role_permissions(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
) -> Result<Json<RolePermissionsListResponse>, ApiError> {
    let permissions = state.users.role_permissions(&actor.user).await?;
    Ok(Json(RolePermissionsListResponse { permissions }))
}

pub async fn set_role_permissions(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    role: Result<Path<String>, PathRejection>,
    payload: Result<Json<SetRolePermissionsRequest>, JsonRejection>,
) -> Result<Json<RolePermissionsResponse>, ApiError> {
    let Path(role) = role?;
    let role: Role = role.parse()?;
    let Json(payload) = payload?;

    let capabilities = payload
        .permissions
        .into_iter()
        .map(|(name, granted)| Ok((name.parse::<Capability>()?, granted)))
        .collect::<Result<BTreeMap<_, _>, ApiError>>()?;

    let role_permissions = state
        .users
        .set_role_permissions(&actor, role, capabilities)
        .await?;
    Ok(Json(RolePermissionsResponse { role_permissions }))
}

pub async fn clear_role_permissions(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    role: Result<Path<String>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Path(role) = role?;
    let role: Role = role.parse()?;
    state.users.clear_role_permissions(&actor, role).await?;
    Ok(Json(MessageResponse::new("role permissions reset to defaults")))
}
