//! Authentication handlers.

use std::net::SocketAddr;

use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, Extension, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use gatepass_auth::{LoginInput, RegisterInput, ResetPasswordInput};
use gatepass_core::actor::ActorContext;
use gatepass_core::models::activity::{ActivityAction, details};
use gatepass_core::models::user::{Region, User};
use serde::{Deserialize, Serialize};

use super::MessageResponse;
use crate::error::ApiError;
use crate::middleware::auth::client_info;
use crate::state::AppState;

/// Routes reachable without a token.
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/reset-password", post(reset_password))
}

pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(current_user))
        .route("/auth/logout", post(logout))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
    pub expires_in: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub regions: Option<Vec<Region>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub username: String,
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub user: User,
}

pub async fn login(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(payload) = payload?;
    let output = state
        .auth
        .login(LoginInput {
            username: payload.username,
            password: payload.password,
        })
        .await?;

    let actor = ActorContext::new(
        output.user.clone(),
        client_info(&headers, peer.map(|ConnectInfo(addr)| addr)),
    );
    state
        .auditor
        .record(
            &actor,
            ActivityAction::Login,
            details::logged_in(&actor.user.username),
        )
        .await;

    Ok(Json(LoginResponse {
        token: output.token,
        user: output.user,
        expires_in: output.expires_in,
    }))
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let Json(payload) = payload?;
    let user = state
        .auth
        .register(RegisterInput {
            username: payload.username,
            password: payload.password,
            email: payload.email,
            first_name: payload.first_name,
            last_name: payload.last_name,
            regions: payload.regions,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "registration successful",
            user,
        }),
    ))
}

pub async fn reset_password(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    payload: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(payload) = payload?;
    let user = state
        .auth
        .reset_password(ResetPasswordInput {
            username: payload.username,
            old_password: payload.old_password,
            new_password: payload.new_password,
        })
        .await?;

    let actor = ActorContext::new(
        user,
        client_info(&headers, peer.map(|ConnectInfo(addr)| addr)),
    );
    state
        .auditor
        .record(
            &actor,
            ActivityAction::ResetPassword,
            details::password_reset(&actor.user.username),
        )
        .await;

    Ok(Json(MessageResponse::new("password reset successful")))
}

pub async fn current_user(Extension(actor): Extension<ActorContext>) -> Json<UserResponse> {
    Json(UserResponse { user: actor.user })
}

/// Tokens are stateless; the client discards its copy.
pub async fn logout(Extension(actor): Extension<ActorContext>) -> Json<MessageResponse> {
    tracing::info!(user_id = %actor.user.id, "User logged out");
    Json(MessageResponse::new("logout successful"))
}
