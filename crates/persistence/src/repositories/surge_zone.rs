//! Surge zone repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::entities::SurgeZoneEntity;
use crate::metrics::QueryTimer;

/// Repository for time-bounded surge zones.
#[derive(Clone)]
pub struct SurgeZoneRepository {
    pool: PgPool,
}

impl SurgeZoneRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List zones of a city that are active and inside their validity window
    /// at `now`, smallest id first (the resolver's tie-break).
    pub async fn list_live_for_city(
        &self,
        city_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<SurgeZoneEntity>, sqlx::Error> {
        let timer = QueryTimer::start("list_live_surge_zones");

        let result = sqlx::query_as::<_, SurgeZoneEntity>(
            r#"
            SELECT surge_zone_id, city_id, name, boundary_geojson, multiplier,
                   starts_at, ends_at, is_active
            FROM surge_zones
            WHERE city_id = $1
              AND is_active = TRUE
              AND starts_at <= $2
              AND ends_at >= $2
            ORDER BY surge_zone_id ASC
            "#,
        )
        .bind(city_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await;

        timer.finish();
        result
    }
}
