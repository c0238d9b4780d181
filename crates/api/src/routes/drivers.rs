//! Driver runtime endpoints: shifts, readiness, location pings, vehicle
//! assignment.

use axum::{extract::State, response::IntoResponse, Json};
use validator::Validate;

use domain::models::location::UpdateLocationRequest;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AuthCaller;

/// POST /api/v1/drivers/location
///
/// Location ping; accepted only while a shift is open.
pub async fn update_location(
    State(state): State<AppState>,
    caller: AuthCaller,
    Json(request): Json<UpdateLocationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;
    let driver = caller.driver()?;

    let ack = state
        .location_ingest()
        .update_location(driver.user_id, request.latitude, request.longitude)
        .await?;
    Ok(Json(ack))
}

/// POST /api/v1/drivers/shift/start
pub async fn start_shift(
    State(state): State<AppState>,
    caller: AuthCaller,
) -> Result<impl IntoResponse, ApiError> {
    let driver = caller.driver()?;
    let shift = state.driver_runtime().start_shift(driver.user_id).await?;
    Ok(Json(shift))
}

/// POST /api/v1/drivers/shift/end
pub async fn end_shift(
    State(state): State<AppState>,
    caller: AuthCaller,
) -> Result<impl IntoResponse, ApiError> {
    let driver = caller.driver()?;
    let shift = state.driver_runtime().end_shift(driver.user_id).await?;
    Ok(Json(shift))
}

/// GET /api/v1/drivers/shift
pub async fn shift_status(
    State(state): State<AppState>,
    caller: AuthCaller,
) -> Result<impl IntoResponse, ApiError> {
    let driver = caller.driver()?;
    let view = state.driver_runtime().shift_status(driver.user_id).await?;
    Ok(Json(view))
}

/// GET /api/v1/drivers/readiness
pub async fn readiness(
    State(state): State<AppState>,
    caller: AuthCaller,
) -> Result<impl IntoResponse, ApiError> {
    let driver = caller.driver()?;
    let checklist = state.driver_runtime().readiness(driver.user_id).await?;
    Ok(Json(checklist))
}

/// POST /api/v1/drivers/assignment/end
///
/// Close the open vehicle assignment; requires being offline first.
pub async fn end_assignment(
    State(state): State<AppState>,
    caller: AuthCaller,
) -> Result<impl IntoResponse, ApiError> {
    let driver = caller.driver()?;
    let assignment = state
        .driver_runtime()
        .end_assignment(driver.user_id)
        .await?;
    Ok(Json(assignment))
}
