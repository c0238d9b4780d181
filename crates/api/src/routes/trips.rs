//! Rider and driver trip endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use validator::Validate;

use domain::models::fare::FareEstimateRequest;
use domain::models::trip::{CreateTripRequest, VerifyOtpRequest};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AuthCaller;

/// POST /api/v1/trips
///
/// Create a trip with a locked fare and start wave-1 dispatch.
pub async fn create_trip(
    State(state): State<AppState>,
    caller: AuthCaller,
    Json(request): Json<CreateTripRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;
    let rider = caller.rider()?;

    let response = state.trip_lifecycle().create_trip(rider, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/v1/trips/:trip_id
pub async fn get_trip(
    State(state): State<AppState>,
    caller: AuthCaller,
    Path(trip_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state.trip_lifecycle().get_trip(trip_id, caller.0).await?;
    Ok(Json(view))
}

/// POST /api/v1/trips/:trip_id/cancel
pub async fn cancel_trip(
    State(state): State<AppState>,
    caller: AuthCaller,
    Path(trip_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let rider = caller.rider()?;
    let view = state.trip_lifecycle().cancel_trip(trip_id, rider).await?;
    Ok(Json(view))
}

/// POST /api/v1/trips/estimate
///
/// Fare estimate; runs the identical path used to lock a trip fare.
pub async fn estimate_fare(
    State(state): State<AppState>,
    _caller: AuthCaller,
    Json(request): Json<FareEstimateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;

    let breakdown = state
        .fare()
        .estimate(
            request.pickup_lat,
            request.pickup_lng,
            request.drop_lat,
            request.drop_lng,
            request.vehicle_category,
            chrono::Utc::now(),
        )
        .await?;
    Ok(Json(breakdown))
}

#[derive(Debug, serde::Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ValidateLocationRequest {
    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub pickup_lat: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub pickup_lng: f64,

    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub drop_lat: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub drop_lng: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateLocationResponse {
    pub city_id: i64,
    pub city_name: String,
}

/// POST /api/v1/trips/validate-location
///
/// Pre-estimate check that both endpoints are serviced by one city.
pub async fn validate_location(
    State(state): State<AppState>,
    _caller: AuthCaller,
    Json(request): Json<ValidateLocationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;

    let city = state
        .resolver()
        .validate_trip_locations(
            request.pickup_lat,
            request.pickup_lng,
            request.drop_lat,
            request.drop_lng,
        )
        .await?;
    Ok(Json(ValidateLocationResponse {
        city_id: city.city_id,
        city_name: city.name,
    }))
}

/// POST /api/v1/trips/:trip_id/arrive
pub async fn driver_arrive(
    State(state): State<AppState>,
    caller: AuthCaller,
    Path(trip_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let driver = caller.driver()?;
    let view = state
        .trip_lifecycle()
        .arrive(trip_id, driver.user_id)
        .await?;
    Ok(Json(view))
}

/// POST /api/v1/trips/:trip_id/otp
///
/// Rider issues a fresh pickup OTP. The code appears only in this response.
pub async fn rider_generate_otp(
    State(state): State<AppState>,
    caller: AuthCaller,
    Path(trip_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let rider = caller.rider()?;
    let issued = state
        .trip_lifecycle()
        .generate_otp(trip_id, rider.user_id)
        .await?;
    Ok(Json(issued))
}

/// POST /api/v1/trips/:trip_id/otp/verify
pub async fn driver_verify_otp(
    State(state): State<AppState>,
    caller: AuthCaller,
    Path(trip_id): Path<i64>,
    Json(request): Json<VerifyOtpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;
    let driver = caller.driver()?;

    let verification = state
        .trip_lifecycle()
        .verify_otp(trip_id, driver.user_id, &request.otp)
        .await?;
    Ok(Json(verification))
}

/// POST /api/v1/trips/:trip_id/pickup
pub async fn driver_pickup(
    State(state): State<AppState>,
    caller: AuthCaller,
    Path(trip_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let driver = caller.driver()?;
    let view = state
        .trip_lifecycle()
        .pickup(trip_id, driver.user_id)
        .await?;
    Ok(Json(view))
}

/// POST /api/v1/trips/:trip_id/complete
pub async fn driver_complete(
    State(state): State<AppState>,
    caller: AuthCaller,
    Path(trip_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let driver = caller.driver()?;
    let view = state
        .trip_lifecycle()
        .complete(trip_id, driver.user_id)
        .await?;
    Ok(Json(view))
}
