//! Trip entity (database row mapping).

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use domain::models::trip::{PickupOtp, Trip, TripStatus};
use domain::models::vehicle::VehicleCategory;

#[derive(Debug, Clone, FromRow)]
pub struct TripEntity {
    pub trip_id: i64,
    pub rider_id: i64,
    pub driver_id: Option<i64>,
    pub vehicle_id: Option<i64>,
    pub tenant_id: Option<i64>,
    pub city_id: i64,
    pub surge_zone_id: Option<i64>,
    pub vehicle_category: String,
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    pub drop_lat: f64,
    pub drop_lng: f64,
    pub status: String,
    pub dispatch_wave: i32,
    pub fare_amount: BigDecimal,
    pub surge_multiplier: BigDecimal,
    pub requested_at: DateTime<Utc>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub arrived_at: Option<DateTime<Utc>>,
    pub picked_up_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub pickup_otp: Option<String>,
    pub pickup_otp_expires_at: Option<DateTime<Utc>>,
    pub pickup_otp_attempts: i32,
    pub pickup_otp_verified_at: Option<DateTime<Utc>>,
}

/// Column list shared by every trip query.
pub const TRIP_COLUMNS: &str = "trip_id, rider_id, driver_id, vehicle_id, tenant_id, city_id, \
     surge_zone_id, vehicle_category, pickup_lat, pickup_lng, drop_lat, drop_lng, status, \
     dispatch_wave, fare_amount, surge_multiplier, requested_at, assigned_at, arrived_at, \
     picked_up_at, completed_at, cancelled_at, pickup_otp, pickup_otp_expires_at, \
     pickup_otp_attempts, pickup_otp_verified_at";

impl TripEntity {
    /// Convert to domain model.
    pub fn into_domain(self) -> Trip {
        let status = self
            .status
            .parse::<TripStatus>()
            .unwrap_or(TripStatus::Requested);
        let vehicle_category = self
            .vehicle_category
            .parse::<VehicleCategory>()
            .unwrap_or(VehicleCategory::Sedan);

        Trip {
            trip_id: self.trip_id,
            rider_id: self.rider_id,
            driver_id: self.driver_id,
            vehicle_id: self.vehicle_id,
            tenant_id: self.tenant_id,
            city_id: self.city_id,
            surge_zone_id: self.surge_zone_id,
            vehicle_category,
            pickup_lat: self.pickup_lat,
            pickup_lng: self.pickup_lng,
            drop_lat: self.drop_lat,
            drop_lng: self.drop_lng,
            status,
            dispatch_wave: self.dispatch_wave,
            fare_amount: self.fare_amount,
            surge_multiplier: self.surge_multiplier,
            requested_at: self.requested_at,
            assigned_at: self.assigned_at,
            arrived_at: self.arrived_at,
            picked_up_at: self.picked_up_at,
            completed_at: self.completed_at,
            cancelled_at: self.cancelled_at,
            pickup_otp: PickupOtp {
                code: self.pickup_otp,
                expires_at: self.pickup_otp_expires_at,
                attempts: self.pickup_otp_attempts,
                verified_at: self.pickup_otp_verified_at,
            },
        }
    }
}

impl From<TripEntity> for Trip {
    fn from(entity: TripEntity) -> Self {
        entity.into_domain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn entity(status: &str) -> TripEntity {
        TripEntity {
            trip_id: 1,
            rider_id: 2,
            driver_id: None,
            vehicle_id: None,
            tenant_id: None,
            city_id: 1,
            surge_zone_id: None,
            vehicle_category: "SEDAN".to_string(),
            pickup_lat: 12.9716,
            pickup_lng: 77.5946,
            drop_lat: 12.9352,
            drop_lng: 77.6245,
            status: status.to_string(),
            dispatch_wave: 0,
            fare_amount: BigDecimal::from_str("112.00").unwrap(),
            surge_multiplier: BigDecimal::from_str("1.00").unwrap(),
            requested_at: Utc::now(),
            assigned_at: None,
            arrived_at: None,
            picked_up_at: None,
            completed_at: None,
            cancelled_at: None,
            pickup_otp: None,
            pickup_otp_expires_at: None,
            pickup_otp_attempts: 0,
            pickup_otp_verified_at: None,
        }
    }

    #[test]
    fn test_entity_to_domain() {
        let trip = entity("DISPATCHING").into_domain();
        assert_eq!(trip.status, TripStatus::Dispatching);
        assert_eq!(trip.vehicle_category, VehicleCategory::Sedan);
        assert!(trip.driver_id.is_none());
        assert_eq!(trip.pickup_otp.attempts, 0);
        assert!(!trip.pickup_otp.is_verified());
    }

    #[test]
    fn test_otp_fields_carried() {
        let mut e = entity("ARRIVED");
        e.pickup_otp = Some("473921".to_string());
        e.pickup_otp_expires_at = Some(Utc::now());
        e.pickup_otp_attempts = 2;

        let trip = e.into_domain();
        assert_eq!(trip.pickup_otp.code.as_deref(), Some("473921"));
        assert_eq!(trip.pickup_otp.attempts, 2);
    }
}
