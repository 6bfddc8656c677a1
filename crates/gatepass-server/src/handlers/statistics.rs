//! Dashboard statistics handler.

use axum::Json;
use axum::extract::{Extension, State};
use gatepass_core::actor::ActorContext;
use gatepass_core::models::statistics::Statistics;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn get_statistics(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
) -> Result<Json<Statistics>, ApiError> {
    Ok(Json(state.reports.statistics(&actor.user).await?))
}
