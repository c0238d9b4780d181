//! Surge zone entity (database row mapping).

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use domain::models::SurgeZone;

#[derive(Debug, Clone, FromRow)]
pub struct SurgeZoneEntity {
    pub surge_zone_id: i64,
    pub city_id: i64,
    pub name: String,
    pub boundary_geojson: String,
    pub multiplier: BigDecimal,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub is_active: bool,
}

impl SurgeZoneEntity {
    pub fn into_domain(self) -> SurgeZone {
        SurgeZone {
            surge_zone_id: self.surge_zone_id,
            city_id: self.city_id,
            name: self.name,
            boundary_geojson: self.boundary_geojson,
            multiplier: self.multiplier,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            is_active: self.is_active,
        }
    }
}

impl From<SurgeZoneEntity> for SurgeZone {
    fn from(entity: SurgeZoneEntity) -> Self {
        entity.into_domain()
    }
}
