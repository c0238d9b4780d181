//! City repository for database operations.

use sqlx::PgPool;

use crate::entities::CityEntity;
use crate::metrics::QueryTimer;

/// Repository for serviced cities.
#[derive(Clone)]
pub struct CityRepository {
    pool: PgPool,
}

impl CityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List active cities, smallest id first.
    ///
    /// The ordering is the resolver's tie-break for overlapping boundaries,
    /// so it must stay deterministic.
    pub async fn list_active(&self) -> Result<Vec<CityEntity>, sqlx::Error> {
        let timer = QueryTimer::start("list_active_cities");

        let result = sqlx::query_as::<_, CityEntity>(
            r#"
            SELECT city_id, name, boundary_geojson, is_active, created_at
            FROM cities
            WHERE is_active = TRUE
            ORDER BY city_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await;

        timer.finish();
        result
    }

    /// Find a city by id.
    pub async fn find_by_id(&self, city_id: i64) -> Result<Option<CityEntity>, sqlx::Error> {
        sqlx::query_as::<_, CityEntity>(
            r#"
            SELECT city_id, name, boundary_geojson, is_active, created_at
            FROM cities
            WHERE city_id = $1
            "#,
        )
        .bind(city_id)
        .fetch_optional(&self.pool)
        .await
    }
}
