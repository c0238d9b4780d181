//! City and surge resolution (application-level polygon tests).

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use domain::error::ErrorKind;
use domain::models::{City, SurgeZone};
use persistence::repositories::{CityRepository, SurgeZoneRepository};

/// Resolves points to serviced cities and active surge zones.
///
/// City boundaries may overlap in misconfigured data; the tie-break is
/// pinned to the smallest `city_id` (repositories return candidates in id
/// order and the first containing polygon wins). Surge zones tie-break the
/// same way on `surge_zone_id`.
#[derive(Clone)]
pub struct GeoResolver {
    cities: CityRepository,
    surge_zones: SurgeZoneRepository,
}

impl GeoResolver {
    pub fn new(pool: PgPool) -> Self {
        Self {
            cities: CityRepository::new(pool.clone()),
            surge_zones: SurgeZoneRepository::new(pool),
        }
    }

    /// The active city containing the point, if any.
    pub async fn resolve_city(&self, lat: f64, lng: f64) -> Result<Option<City>, ErrorKind> {
        let cities = self
            .cities
            .list_active()
            .await
            .map_err(ErrorKind::internal)?;

        Ok(cities
            .into_iter()
            .map(|entity| entity.into_domain())
            .find(|city| city.contains(lat, lng)))
    }

    /// The live surge zone of the city containing the point, if any.
    /// Sampled at the pickup only; drop-side surge never applies.
    pub async fn active_surge(
        &self,
        lat: f64,
        lng: f64,
        city_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<SurgeZone>, ErrorKind> {
        let zones = self
            .surge_zones
            .list_live_for_city(city_id, now)
            .await
            .map_err(ErrorKind::internal)?;

        Ok(zones
            .into_iter()
            .map(|entity| entity.into_domain())
            .find(|zone| zone.contains(lat, lng)))
    }

    /// Validate trip endpoints: both must resolve to the same active city.
    ///
    /// `OutOfService` when either endpoint has no city, `CrossCity` when
    /// they differ. Both are final rejections at request time.
    pub async fn validate_trip_locations(
        &self,
        pickup_lat: f64,
        pickup_lng: f64,
        drop_lat: f64,
        drop_lng: f64,
    ) -> Result<City, ErrorKind> {
        let pickup_city = self
            .resolve_city(pickup_lat, pickup_lng)
            .await?
            .ok_or(ErrorKind::OutOfService)?;

        let drop_city = self
            .resolve_city(drop_lat, drop_lng)
            .await?
            .ok_or(ErrorKind::OutOfService)?;

        if pickup_city.city_id != drop_city.city_id {
            return Err(ErrorKind::CrossCity);
        }

        Ok(pickup_city)
    }
}
