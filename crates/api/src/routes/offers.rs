//! Driver-facing dispatch offer endpoints.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use domain::models::dispatch::OfferView;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AuthCaller;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingOffersResponse {
    pub offers: Vec<OfferView>,
    pub total: usize,
}

/// GET /api/v1/drivers/offers
///
/// Poll fallback for pending offers; push delivery uses the notifier.
pub async fn list_pending_offers(
    State(state): State<AppState>,
    caller: AuthCaller,
) -> Result<impl IntoResponse, ApiError> {
    let driver = caller.driver()?;
    let offers = state
        .dispatch()
        .list_pending_offers(driver.user_id)
        .await?;
    let total = offers.len();
    Ok(Json(PendingOffersResponse { offers, total }))
}

/// POST /api/v1/offers/:attempt_id/accept
///
/// First acceptance wins; losers get a conflict with no detail about the
/// winner.
pub async fn accept_offer(
    State(state): State<AppState>,
    caller: AuthCaller,
    Path(attempt_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let driver = caller.driver()?;
    let trip = state
        .dispatch()
        .accept_offer(attempt_id, driver.user_id)
        .await?;
    let view = state.trip_lifecycle().get_trip(trip.trip_id, driver).await?;
    Ok(Json(view))
}

/// POST /api/v1/offers/:attempt_id/reject
pub async fn reject_offer(
    State(state): State<AppState>,
    caller: AuthCaller,
    Path(attempt_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let driver = caller.driver()?;
    let attempt = state
        .dispatch()
        .reject_offer(attempt_id, driver.user_id)
        .await?;
    Ok(Json(attempt))
}
