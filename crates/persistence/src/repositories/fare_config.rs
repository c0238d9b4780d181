//! Fare config repository for database operations.

use sqlx::PgPool;

use crate::entities::FareConfigEntity;
use crate::metrics::QueryTimer;

/// Repository for per-city, per-category fare configuration.
#[derive(Clone)]
pub struct FareConfigRepository {
    pool: PgPool,
}

impl FareConfigRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find the config for a `(city, vehicle_category)` pair.
    pub async fn find_for(
        &self,
        city_id: i64,
        vehicle_category: &str,
    ) -> Result<Option<FareConfigEntity>, sqlx::Error> {
        let timer = QueryTimer::start("find_fare_config");

        let result = sqlx::query_as::<_, FareConfigEntity>(
            r#"
            SELECT fare_config_id, city_id, vehicle_category, base_fare, per_km,
                   per_minute, minimum_fare, created_at
            FROM fare_configs
            WHERE city_id = $1 AND vehicle_category = $2
            "#,
        )
        .bind(city_id)
        .bind(vehicle_category)
        .fetch_optional(&self.pool)
        .await;

        timer.finish();
        result
    }
}
