//! Bearer-token authentication middleware.
//!
//! Resolves the caller before any protected handler runs and attaches an
//! [`ActorContext`] to the request extensions.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, USER_AGENT};
use axum::middleware::Next;
use axum::response::Response;
use gatepass_auth::token::bearer_token;
use gatepass_core::actor::{ActorContext, ClientInfo};

use crate::error::ApiError;
use crate::state::AppState;

/// Source address and user agent as reported by proxies or the socket.
pub fn client_info(headers: &HeaderMap, peer: Option<SocketAddr>) -> ClientInfo {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    ClientInfo::resolve(
        header("x-forwarded-for"),
        header("x-real-ip"),
        header("cf-connecting-ip"),
        peer,
        header(USER_AGENT.as_str()),
    )
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let bearer = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .map(str::to_owned);
    let user = state.auth.authenticate(bearer.as_deref()).await?;

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_info(request.headers(), peer);

    request
        .extensions_mut()
        .insert(ActorContext::new(user, client));
    Ok(next.run(request).await)
}
