//! Fare configuration and breakdowns.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::vehicle::VehicleCategory;

/// Per-city, per-category pricing. Unique on `(city_id, vehicle_category)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FareConfig {
    pub fare_config_id: i64,
    pub city_id: i64,
    pub vehicle_category: VehicleCategory,
    pub base_fare: BigDecimal,
    pub per_km: BigDecimal,
    pub per_minute: BigDecimal,
    pub minimum_fare: BigDecimal,
    pub created_at: DateTime<Utc>,
}

/// The result of a fare calculation.
///
/// A breakdown computed at trip creation is locked: the multiplier is sampled
/// once and persisted with the trip, and later surge changes never touch it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FareBreakdown {
    pub city_id: i64,
    pub vehicle_category: VehicleCategory,
    pub distance_km: f64,
    pub estimated_minutes: f64,
    pub base_fare: BigDecimal,
    pub distance_fare: BigDecimal,
    pub time_fare: BigDecimal,
    pub subtotal: BigDecimal,
    pub surge_multiplier: BigDecimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surge_zone_id: Option<i64>,
    pub minimum_fare: BigDecimal,
    /// True when the minimum fare floor overrode the surged subtotal.
    pub minimum_fare_applied: bool,
    /// Final amount, rounded to cents.
    pub fare_amount: BigDecimal,
}

/// Request payload for a fare estimate.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FareEstimateRequest {
    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub pickup_lat: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub pickup_lng: f64,

    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub drop_lat: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub drop_lng: f64,

    pub vehicle_category: VehicleCategory,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_request_validation() {
        let request = FareEstimateRequest {
            pickup_lat: 12.9716,
            pickup_lng: 77.5946,
            drop_lat: 12.9352,
            drop_lng: 77.6245,
            vehicle_category: VehicleCategory::Sedan,
        };
        assert!(request.validate().is_ok());

        let request = FareEstimateRequest {
            drop_lat: -91.0,
            ..request
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_estimate_request_deserializes_category() {
        let json = r#"{"pickupLat": 12.9, "pickupLng": 77.5, "dropLat": 12.8, "dropLng": 77.6, "vehicleCategory": "SEDAN"}"#;
        let request: FareEstimateRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.vehicle_category, VehicleCategory::Sedan);
    }
}
