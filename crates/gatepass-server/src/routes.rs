//! Route definitions.

use std::time::Duration;

use axum::http::{HeaderValue, Method, header};
use axum::routing::get;
use axum::{Router, middleware};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::auth::auth_middleware;
use crate::state::AppState;

/// Build the full API router.
///
/// Everything except `/health` and the login, registration and
/// password-reset endpoints sits behind the bearer-token middleware.
pub fn create_router(
    state: AppState,
    frontend_origin: Option<HeaderValue>,
    request_timeout: Duration,
) -> Router {
    let protected = Router::new()
        .merge(handlers::auth::protected_router())
        .nest("/permits", handlers::permits::router())
        .nest("/users", handlers::users::router())
        .nest("/activity", handlers::activity::router())
        .route("/statistics", get(handlers::statistics::get_statistics))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .merge(handlers::auth::public_router())
        .merge(protected)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(cors_layer(frontend_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(frontend_origin: Option<HeaderValue>) -> CorsLayer {
    match frontend_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(AllowOrigin::exact(origin))
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
            .allow_credentials(true),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    }
}
