//! Fare config entity (database row mapping).

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use domain::models::vehicle::VehicleCategory;
use domain::models::FareConfig;

#[derive(Debug, Clone, FromRow)]
pub struct FareConfigEntity {
    pub fare_config_id: i64,
    pub city_id: i64,
    pub vehicle_category: String,
    pub base_fare: BigDecimal,
    pub per_km: BigDecimal,
    pub per_minute: BigDecimal,
    pub minimum_fare: BigDecimal,
    pub created_at: DateTime<Utc>,
}

impl FareConfigEntity {
    pub fn into_domain(self) -> FareConfig {
        let vehicle_category = self
            .vehicle_category
            .parse::<VehicleCategory>()
            .unwrap_or(VehicleCategory::Sedan);

        FareConfig {
            fare_config_id: self.fare_config_id,
            city_id: self.city_id,
            vehicle_category,
            base_fare: self.base_fare,
            per_km: self.per_km,
            per_minute: self.per_minute,
            minimum_fare: self.minimum_fare,
            created_at: self.created_at,
        }
    }
}

impl From<FareConfigEntity> for FareConfig {
    fn from(entity: FareConfigEntity) -> Self {
        entity.into_domain()
    }
}
