//! Driver location repository for database operations.
//!
//! The last-known row and the history append are committed together; the
//! live geo index is updated outside this repository and outside the
//! transaction (best-effort).

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::entities::{DriverLocationEntity, DriverLocationHistoryEntity};
use crate::metrics::QueryTimer;

/// Repository for durable driver positions.
#[derive(Clone)]
pub struct LocationRepository {
    pool: PgPool,
}

impl LocationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Last durable position of a driver.
    pub async fn find_last_known(
        &self,
        driver_id: i64,
    ) -> Result<Option<DriverLocationEntity>, sqlx::Error> {
        let timer = QueryTimer::start("find_last_known_location");

        let result = sqlx::query_as::<_, DriverLocationEntity>(
            r#"
            SELECT driver_id, latitude, longitude, last_updated
            FROM driver_locations
            WHERE driver_id = $1
            "#,
        )
        .bind(driver_id)
        .fetch_optional(&self.pool)
        .await;

        timer.finish();
        result
    }

    /// Upsert the one-row-per-driver last-known position (last write wins).
    pub async fn upsert_last_known(
        conn: &mut PgConnection,
        driver_id: i64,
        latitude: f64,
        longitude: f64,
        now: DateTime<Utc>,
    ) -> Result<DriverLocationEntity, sqlx::Error> {
        sqlx::query_as::<_, DriverLocationEntity>(
            r#"
            INSERT INTO driver_locations (driver_id, latitude, longitude, last_updated)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (driver_id) DO UPDATE
                SET latitude = EXCLUDED.latitude,
                    longitude = EXCLUDED.longitude,
                    last_updated = EXCLUDED.last_updated
            RETURNING driver_id, latitude, longitude, last_updated
            "#,
        )
        .bind(driver_id)
        .bind(latitude)
        .bind(longitude)
        .bind(now)
        .fetch_one(&mut *conn)
        .await
    }

    /// Append one row to the ping audit trail.
    pub async fn append_history(
        conn: &mut PgConnection,
        driver_id: i64,
        latitude: f64,
        longitude: f64,
        recorded_at: DateTime<Utc>,
    ) -> Result<DriverLocationHistoryEntity, sqlx::Error> {
        sqlx::query_as::<_, DriverLocationHistoryEntity>(
            r#"
            INSERT INTO driver_location_history (driver_id, latitude, longitude, recorded_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, driver_id, latitude, longitude, recorded_at
            "#,
        )
        .bind(driver_id)
        .bind(latitude)
        .bind(longitude)
        .bind(recorded_at)
        .fetch_one(&mut *conn)
        .await
    }
}
