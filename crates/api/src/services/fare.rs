//! Fare engine orchestration.
//!
//! Resolves the fare configuration and the pickup surge sample, then defers
//! to the pure math in `domain::services::fare`. Estimates and locked trip
//! fares run the identical path, so an estimate made just before a request
//! matches the amount locked on the trip.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use domain::error::ErrorKind;
use domain::models::fare::FareBreakdown;
use domain::models::vehicle::VehicleCategory;
use domain::services::fare as fare_math;
use persistence::repositories::FareConfigRepository;
use shared::geo::haversine_km;

use crate::config::Config;
use crate::services::geo_resolver::GeoResolver;

#[derive(Clone)]
pub struct FareService {
    configs: FareConfigRepository,
    resolver: GeoResolver,
    config: Arc<Config>,
}

impl FareService {
    pub fn new(pool: PgPool, resolver: GeoResolver, config: Arc<Config>) -> Self {
        Self {
            configs: FareConfigRepository::new(pool),
            resolver,
            config,
        }
    }

    /// Compute a fare for a trip whose city is already resolved.
    pub async fn quote_for_city(
        &self,
        city_id: i64,
        category: VehicleCategory,
        pickup_lat: f64,
        pickup_lng: f64,
        drop_lat: f64,
        drop_lng: f64,
        now: DateTime<Utc>,
    ) -> Result<FareBreakdown, ErrorKind> {
        let config = self
            .configs
            .find_for(city_id, category.as_str())
            .await
            .map_err(ErrorKind::internal)?
            .ok_or(ErrorKind::ConfigMissing { city_id, category })?
            .into_domain();

        let distance_km = haversine_km(pickup_lat, pickup_lng, drop_lat, drop_lng);

        let surge = self
            .resolver
            .active_surge(pickup_lat, pickup_lng, city_id, now)
            .await?
            .map(|zone| (zone.multiplier, zone.surge_zone_id));

        Ok(fare_math::quote(
            &config,
            distance_km,
            surge,
            self.config.fare.average_speed_kmh,
        ))
    }

    /// Full estimate path: validate both endpoints, then quote. Pure given
    /// unchanged config and surge state.
    pub async fn estimate(
        &self,
        pickup_lat: f64,
        pickup_lng: f64,
        drop_lat: f64,
        drop_lng: f64,
        category: VehicleCategory,
        now: DateTime<Utc>,
    ) -> Result<FareBreakdown, ErrorKind> {
        let city = self
            .resolver
            .validate_trip_locations(pickup_lat, pickup_lng, drop_lat, drop_lng)
            .await?;

        self.quote_for_city(
            city.city_id,
            category,
            pickup_lat,
            pickup_lng,
            drop_lat,
            drop_lng,
            now,
        )
        .await
    }
}
