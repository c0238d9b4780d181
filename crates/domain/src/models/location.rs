//! Driver location models.
//!
//! `DriverLocation` is the durable last-known position (one row per driver,
//! last-write-wins). `DriverLocationHistory` is the append-only audit trail
//! of every ping. The live geo index is a cache over these, never the system
//! of record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverLocation {
    pub driver_id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverLocationHistory {
    pub id: i64,
    pub driver_id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub recorded_at: DateTime<Utc>,
}

/// Request payload for a driver location ping.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLocationRequest {
    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: f64,
}

/// Acknowledgement for a processed location ping.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLocationResponse {
    pub ok: bool,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_location_request_valid() {
        let request = UpdateLocationRequest {
            latitude: 12.9716,
            longitude: 77.5946,
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_update_location_request_out_of_range() {
        let request = UpdateLocationRequest {
            latitude: 95.0,
            longitude: 77.5946,
        };
        assert!(request.validate().is_err());

        let request = UpdateLocationRequest {
            latitude: 12.9716,
            longitude: -190.0,
        };
        assert!(request.validate().is_err());
    }
}
