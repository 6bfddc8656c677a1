//! Gatepass Server — application entry point.

use std::net::SocketAddr;

use gatepass_core::models::user::{CreateUser, DEFAULT_REGION, Role};
use gatepass_core::repository::UserRepository;
use gatepass_db::DbManager;
use gatepass_db::repository::SurrealUserRepository;
use gatepass_server::{AppState, ServerConfig, create_router};
use surrealdb::engine::any::Any;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("gatepass=info,tower_http=info")),
        )
        .json()
        .init();

    let config = ServerConfig::from_env()?;
    tracing::info!(bind_address = %config.bind_address, "Starting Gatepass server");

    let db = DbManager::connect(&config.db).await?;
    gatepass_db::run_migrations(db.client()).await?;

    if let Some(password) = config.bootstrap_admin_password.as_deref() {
        bootstrap_admin(
            SurrealUserRepository::with_pepper(db.client().clone(), config.auth.pepper.clone()),
            password,
        )
        .await?;
    }

    let state = AppState::new(db.client().clone(), config.auth.clone());
    let app = create_router(
        state,
        config.frontend_origin.clone(),
        config.request_timeout,
    );

    let addr: SocketAddr = config.bind_address.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Gatepass server stopped");
    Ok(())
}

/// Create an `admin` account when the store has no users yet.
async fn bootstrap_admin(
    users: SurrealUserRepository<Any>,
    password: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if users.count().await? > 0 {
        return Ok(());
    }

    let admin = users
        .create(CreateUser {
            username: "admin".into(),
            email: "admin@gatepass.local".into(),
            password: password.to_string(),
            first_name: "System".into(),
            last_name: "Administrator".into(),
            regions: vec![DEFAULT_REGION.to_string()],
            role: Role::Admin,
        })
        .await?;
    tracing::warn!(user_id = %admin.id, "Created bootstrap admin account");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
