//! Dispatch orchestration endpoints.
//!
//! `advance_wave` is normally driven by the in-process sweeper; this
//! endpoint lets an external orchestrator or operator drive it instead. One
//! call advances at most one wave and is safe to retry.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};

use domain::models::user::Role;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AuthCaller;

/// POST /api/v1/dispatch/trips/:trip_id/advance
pub async fn advance_wave(
    State(state): State<AppState>,
    caller: AuthCaller,
    Path(trip_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    if caller.0.role != Role::Admin {
        return Err(ApiError::Forbidden("Admin role required".into()));
    }

    let outcome = state.dispatch().advance_wave(trip_id).await?;
    Ok(Json(outcome))
}
