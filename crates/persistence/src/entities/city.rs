//! City entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use domain::models::City;

#[derive(Debug, Clone, FromRow)]
pub struct CityEntity {
    pub city_id: i64,
    pub name: String,
    pub boundary_geojson: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl CityEntity {
    pub fn into_domain(self) -> City {
        City {
            city_id: self.city_id,
            name: self.name,
            boundary_geojson: self.boundary_geojson,
            is_active: self.is_active,
            created_at: self.created_at,
        }
    }
}

impl From<CityEntity> for City {
    fn from(entity: CityEntity) -> Self {
        entity.into_domain()
    }
}
