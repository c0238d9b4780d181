//! Trip domain model.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use super::vehicle::VehicleCategory;

// ============================================================================
// Trip Status Enum
// ============================================================================

/// Status of a trip in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripStatus {
    Requested,
    Dispatching,
    Assigned,
    Arrived,
    PickedUp,
    Completed,
    Cancelled,
}

impl TripStatus {
    /// Returns the string representation for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Requested => "REQUESTED",
            TripStatus::Dispatching => "DISPATCHING",
            TripStatus::Assigned => "ASSIGNED",
            TripStatus::Arrived => "ARRIVED",
            TripStatus::PickedUp => "PICKED_UP",
            TripStatus::Completed => "COMPLETED",
            TripStatus::Cancelled => "CANCELLED",
        }
    }

    /// Check if transition to target status is valid.
    pub fn can_transition_to(&self, target: TripStatus) -> bool {
        match (self, target) {
            (TripStatus::Requested, TripStatus::Dispatching) => true,
            (TripStatus::Dispatching, TripStatus::Assigned) => true,
            (TripStatus::Assigned, TripStatus::Arrived) => true,
            (TripStatus::Arrived, TripStatus::PickedUp) => true,
            (TripStatus::PickedUp, TripStatus::Completed) => true,
            // Cancellation is allowed until the rider is in the vehicle.
            (
                TripStatus::Requested
                | TripStatus::Dispatching
                | TripStatus::Assigned
                | TripStatus::Arrived,
                TripStatus::Cancelled,
            ) => true,
            _ => false,
        }
    }

    /// Statuses that count as an active trip for the one-trip-per-rider rule.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            TripStatus::Requested
                | TripStatus::Dispatching
                | TripStatus::Assigned
                | TripStatus::Arrived
                | TripStatus::PickedUp
        )
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TripStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "REQUESTED" => Ok(TripStatus::Requested),
            "DISPATCHING" => Ok(TripStatus::Dispatching),
            "ASSIGNED" => Ok(TripStatus::Assigned),
            "ARRIVED" => Ok(TripStatus::Arrived),
            "PICKED_UP" => Ok(TripStatus::PickedUp),
            "COMPLETED" => Ok(TripStatus::Completed),
            "CANCELLED" => Ok(TripStatus::Cancelled),
            _ => Err(format!("Invalid trip status: {}", s)),
        }
    }
}

// ============================================================================
// Core Model
// ============================================================================

/// Pickup OTP state carried on the trip row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupOtp {
    #[serde(skip_serializing)]
    pub code: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub attempts: i32,
    pub verified_at: Option<DateTime<Utc>>,
}

impl PickupOtp {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| at < now).unwrap_or(true)
    }

    pub fn is_verified(&self) -> bool {
        self.verified_at.is_some()
    }

    /// Whether this OTP accepts no further guesses. The counter moves before
    /// each comparison, so once `max_attempts` guesses are spent the next
    /// one is refused even if it would have matched.
    pub fn attempts_exhausted(&self, max_attempts: i32) -> bool {
        self.attempts >= max_attempts
    }
}

/// A trip from request through completion or cancellation.
///
/// `tenant_id`, `driver_id` and `vehicle_id` are set together when a driver
/// accepts an offer; `fare_amount` is locked at creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub trip_id: i64,
    pub rider_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<i64>,
    pub city_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surge_zone_id: Option<i64>,
    pub vehicle_category: VehicleCategory,
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    pub drop_lat: f64,
    pub drop_lng: f64,
    pub status: TripStatus,
    /// Highest dispatch wave searched so far (0 before wave 1), counting
    /// waves that found no candidates.
    #[serde(skip)]
    pub dispatch_wave: i32,
    pub fare_amount: BigDecimal,
    pub surge_multiplier: BigDecimal,
    pub requested_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrived_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picked_up_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub pickup_otp: PickupOtp,
}

// ============================================================================
// Request DTOs
// ============================================================================

/// Request payload for creating a trip.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTripRequest {
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

// ============================================================================
// Response DTOs
// ============================================================================

/// Assigned-driver summary shown to the rider.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverSummary {
    pub driver_id: i64,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Assigned-vehicle summary shown to the rider.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleSummary {
    pub vehicle_id: i64,
    pub category: VehicleCategory,
    pub registration_no: String,
}

/// Trip view returned by the caller adapter.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripView {
    pub trip_id: i64,
    pub status: TripStatus,
    pub city_id: i64,
    pub vehicle_category: VehicleCategory,
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    pub drop_lat: f64,
    pub drop_lng: f64,
    pub fare_amount: BigDecimal,
    pub surge_multiplier: BigDecimal,
    pub requested_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrived_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picked_up_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver: Option<DriverSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<VehicleSummary>,
}

impl TripView {
    /// Build a view from a trip, without driver/vehicle enrichment.
    pub fn from_trip(trip: &Trip) -> Self {
        Self {
            trip_id: trip.trip_id,
            status: trip.status,
            city_id: trip.city_id,
            vehicle_category: trip.vehicle_category,
            pickup_lat: trip.pickup_lat,
            pickup_lng: trip.pickup_lng,
            drop_lat: trip.drop_lat,
            drop_lng: trip.drop_lng,
            fare_amount: trip.fare_amount.clone(),
            surge_multiplier: trip.surge_multiplier.clone(),
            requested_at: trip.requested_at,
            assigned_at: trip.assigned_at,
            arrived_at: trip.arrived_at,
            picked_up_at: trip.picked_up_at,
            completed_at: trip.completed_at,
            cancelled_at: trip.cancelled_at,
            driver: None,
            vehicle: None,
        }
    }
}

/// Response for OTP generation; the code is shown to the rider only.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpIssued {
    pub trip_id: i64,
    pub otp: String,
    pub expires_at: DateTime<Utc>,
}

/// Result of a driver OTP verification attempt.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpVerification {
    pub trip_id: i64,
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_attempts: Option<i32>,
}

/// Request payload for an OTP verification.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    #[validate(custom(function = "shared::validation::validate_otp"))]
    pub otp: String,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_status_round_trip() {
        for status in [
            TripStatus::Requested,
            TripStatus::Dispatching,
            TripStatus::Assigned,
            TripStatus::Arrived,
            TripStatus::PickedUp,
            TripStatus::Completed,
            TripStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<TripStatus>().unwrap(), status);
        }
        assert!("picked_up".parse::<TripStatus>().is_err());
    }

    #[test]
    fn test_happy_path_transitions() {
        assert!(TripStatus::Requested.can_transition_to(TripStatus::Dispatching));
        assert!(TripStatus::Dispatching.can_transition_to(TripStatus::Assigned));
        assert!(TripStatus::Assigned.can_transition_to(TripStatus::Arrived));
        assert!(TripStatus::Arrived.can_transition_to(TripStatus::PickedUp));
        assert!(TripStatus::PickedUp.can_transition_to(TripStatus::Completed));
    }

    #[test]
    fn test_cancellation_window() {
        for status in [
            TripStatus::Requested,
            TripStatus::Dispatching,
            TripStatus::Assigned,
            TripStatus::Arrived,
        ] {
            assert!(status.can_transition_to(TripStatus::Cancelled));
        }
        // Once the rider is in the vehicle, cancellation is rejected.
        assert!(!TripStatus::PickedUp.can_transition_to(TripStatus::Cancelled));
        assert!(!TripStatus::Completed.can_transition_to(TripStatus::Cancelled));
        assert!(!TripStatus::Cancelled.can_transition_to(TripStatus::Cancelled));
    }

    #[test]
    fn test_no_skipping_states() {
        assert!(!TripStatus::Requested.can_transition_to(TripStatus::Assigned));
        assert!(!TripStatus::Dispatching.can_transition_to(TripStatus::PickedUp));
        assert!(!TripStatus::Assigned.can_transition_to(TripStatus::Completed));
        assert!(!TripStatus::Completed.can_transition_to(TripStatus::Requested));
    }

    #[test]
    fn test_active_statuses() {
        assert!(TripStatus::Requested.is_active());
        assert!(TripStatus::Dispatching.is_active());
        assert!(TripStatus::Assigned.is_active());
        assert!(TripStatus::Arrived.is_active());
        assert!(TripStatus::PickedUp.is_active());
        assert!(!TripStatus::Completed.is_active());
        assert!(!TripStatus::Cancelled.is_active());
    }

    #[test]
    fn test_otp_expiry() {
        let now = Utc::now();
        let otp = PickupOtp {
            code: Some("473921".to_string()),
            expires_at: Some(now + chrono::Duration::minutes(5)),
            attempts: 0,
            verified_at: None,
        };
        assert!(!otp.is_expired(now));
        assert!(otp.is_expired(now + chrono::Duration::minutes(6)));
        assert!(PickupOtp::default().is_expired(now));
    }

    #[test]
    fn test_otp_lockout_after_three_attempts() {
        let mut otp = PickupOtp {
            code: Some("473921".to_string()),
            expires_at: Some(Utc::now() + chrono::Duration::minutes(5)),
            attempts: 0,
            verified_at: None,
        };

        // Three wrong guesses; each moves the counter first.
        for _ in 0..3 {
            assert!(!otp.attempts_exhausted(3));
            otp.attempts += 1;
        }

        // The fourth guess is refused outright, correct or not.
        assert!(otp.attempts_exhausted(3));

        // Regeneration resets the counter.
        otp.attempts = 0;
        assert!(!otp.attempts_exhausted(3));
    }

    #[test]
    fn test_trip_view_hides_otp() {
        let trip = Trip {
            trip_id: 1,
            rider_id: 2,
            driver_id: None,
            vehicle_id: None,
            tenant_id: None,
            city_id: 1,
            surge_zone_id: None,
            vehicle_category: VehicleCategory::Sedan,
            pickup_lat: 12.9716,
            pickup_lng: 77.5946,
            drop_lat: 12.9352,
            drop_lng: 77.6245,
            status: TripStatus::Dispatching,
            dispatch_wave: 1,
            fare_amount: BigDecimal::from_str("201.60").unwrap(),
            surge_multiplier: BigDecimal::from_str("1.80").unwrap(),
            requested_at: Utc::now(),
            assigned_at: None,
            arrived_at: None,
            picked_up_at: None,
            completed_at: None,
            cancelled_at: None,
            pickup_otp: PickupOtp {
                code: Some("473921".to_string()),
                expires_at: Some(Utc::now()),
                attempts: 1,
                verified_at: None,
            },
        };

        let view = TripView::from_trip(&trip);
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("473921"));
        assert!(json.contains("201.60"));
    }
}
