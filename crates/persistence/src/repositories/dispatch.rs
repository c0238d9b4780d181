//! Dispatch attempt repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};

use crate::entities::DispatchAttemptEntity;
use crate::metrics::QueryTimer;

const ATTEMPT_COLUMNS: &str =
    "attempt_id, trip_id, driver_id, wave_number, sent_at, responded_at, response";

/// A pending offer joined with the trip and rider data a driver needs to
/// decide on it.
#[derive(Debug, Clone, FromRow)]
pub struct PendingOfferRow {
    pub attempt_id: i64,
    pub trip_id: i64,
    pub driver_id: i64,
    pub wave_number: i32,
    pub sent_at: DateTime<Utc>,
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    pub drop_lat: f64,
    pub drop_lng: f64,
    pub fare_amount: bigdecimal::BigDecimal,
    pub rider_full_name: String,
}

/// Repository for dispatch attempts.
#[derive(Clone)]
pub struct DispatchRepository {
    pool: PgPool,
}

impl DispatchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert one attempt per offered driver, all stamped with the same
    /// `sent_at` (the wave goes out in parallel).
    pub async fn insert_attempts(
        conn: &mut PgConnection,
        trip_id: i64,
        driver_ids: &[i64],
        wave_number: i32,
        sent_at: DateTime<Utc>,
    ) -> Result<Vec<DispatchAttemptEntity>, sqlx::Error> {
        let response = format!("PENDING_WAVE_{}", wave_number);
        let mut attempts = Vec::with_capacity(driver_ids.len());

        let query = format!(
            r#"
            INSERT INTO dispatch_attempts (trip_id, driver_id, wave_number, sent_at, response)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            ATTEMPT_COLUMNS
        );
        for driver_id in driver_ids {
            let attempt = sqlx::query_as::<_, DispatchAttemptEntity>(&query)
                .bind(trip_id)
                .bind(driver_id)
                .bind(wave_number)
                .bind(sent_at)
                .bind(&response)
                .fetch_one(&mut *conn)
                .await?;
            attempts.push(attempt);
        }

        Ok(attempts)
    }

    /// Find an attempt by id.
    pub async fn find_by_id(
        &self,
        attempt_id: i64,
    ) -> Result<Option<DispatchAttemptEntity>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM dispatch_attempts WHERE attempt_id = $1",
            ATTEMPT_COLUMNS
        );
        sqlx::query_as::<_, DispatchAttemptEntity>(&query)
            .bind(attempt_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Find an attempt inside the caller's transaction, taking its row lock
    /// so concurrent accept/reject on the same offer serialise.
    pub async fn find_by_id_for_update(
        conn: &mut PgConnection,
        attempt_id: i64,
    ) -> Result<Option<DispatchAttemptEntity>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM dispatch_attempts WHERE attempt_id = $1 FOR UPDATE",
            ATTEMPT_COLUMNS
        );
        sqlx::query_as::<_, DispatchAttemptEntity>(&query)
            .bind(attempt_id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Live offers for a driver: still pending, sent within the timeout
    /// window, and their trip still DISPATCHING.
    pub async fn list_pending_for_driver(
        &self,
        driver_id: i64,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<PendingOfferRow>, sqlx::Error> {
        let timer = QueryTimer::start("list_pending_offers");

        let result = sqlx::query_as::<_, PendingOfferRow>(
            r#"
            SELECT a.attempt_id, a.trip_id, a.driver_id, a.wave_number, a.sent_at,
                   t.pickup_lat, t.pickup_lng, t.drop_lat, t.drop_lng, t.fare_amount,
                   u.full_name AS rider_full_name
            FROM dispatch_attempts a
            JOIN trips t ON t.trip_id = a.trip_id
            JOIN app_users u ON u.user_id = t.rider_id
            WHERE a.driver_id = $1
              AND a.response LIKE 'PENDING%'
              AND a.sent_at >= $2
              AND t.status = 'DISPATCHING'
            ORDER BY a.sent_at DESC
            "#,
        )
        .bind(driver_id)
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await;

        timer.finish();
        result
    }

    /// Every driver ever offered this trip, regardless of response.
    pub async fn attempted_driver_ids(&self, trip_id: i64) -> Result<Vec<i64>, sqlx::Error> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            "SELECT driver_id FROM dispatch_attempts WHERE trip_id = $1",
        )
        .bind(trip_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(driver_id,)| driver_id).collect())
    }

    /// Highest wave number created for this trip, or 0 if none.
    pub async fn current_wave(&self, trip_id: i64) -> Result<i32, sqlx::Error> {
        let row: (i32,) = sqlx::query_as(
            "SELECT COALESCE(MAX(wave_number), 0) FROM dispatch_attempts WHERE trip_id = $1",
        )
        .bind(trip_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    /// Whether any offer for this trip is still live (pending and sent at or
    /// after the cutoff).
    pub async fn has_live_pending(
        &self,
        trip_id: i64,
        cutoff: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM dispatch_attempts
                WHERE trip_id = $1 AND response LIKE 'PENDING%' AND sent_at >= $2
            )
            "#,
        )
        .bind(trip_id)
        .bind(cutoff)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    /// Mark this trip's expired pending offers TIMEOUT. Returns the number
    /// of offers swept.
    pub async fn timeout_expired(
        &self,
        trip_id: i64,
        cutoff: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE dispatch_attempts
            SET response = 'TIMEOUT', responded_at = $3
            WHERE trip_id = $1 AND response LIKE 'PENDING%' AND sent_at < $2
            "#,
        )
        .bind(trip_id)
        .bind(cutoff)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Record a driver's response on a still-pending attempt. `None` when
    /// the attempt is already terminal.
    pub async fn mark_response(
        conn: &mut PgConnection,
        attempt_id: i64,
        response: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<DispatchAttemptEntity>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE dispatch_attempts
            SET response = $2, responded_at = $3
            WHERE attempt_id = $1 AND response LIKE 'PENDING%'
            RETURNING {}
            "#,
            ATTEMPT_COLUMNS
        );
        sqlx::query_as::<_, DispatchAttemptEntity>(&query)
            .bind(attempt_id)
            .bind(response)
            .bind(now)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Cancel every still-pending attempt of a trip, optionally sparing one
    /// (the accepted attempt). Returns the cancelled attempts so the engine
    /// can revoke their notifications.
    pub async fn cancel_pending_for_trip(
        conn: &mut PgConnection,
        trip_id: i64,
        except_attempt_id: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Vec<DispatchAttemptEntity>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE dispatch_attempts
            SET response = 'CANCELLED', responded_at = $3
            WHERE trip_id = $1
              AND response LIKE 'PENDING%'
              AND ($2::bigint IS NULL OR attempt_id <> $2)
            RETURNING {}
            "#,
            ATTEMPT_COLUMNS
        );
        sqlx::query_as::<_, DispatchAttemptEntity>(&query)
            .bind(trip_id)
            .bind(except_attempt_id)
            .bind(now)
            .fetch_all(&mut *conn)
            .await
    }

    /// Trips stuck in DISPATCHING with no live offers; the sweeper advances
    /// these.
    pub async fn list_stalled_dispatching_trips(
        &self,
        cutoff: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<i64>, sqlx::Error> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            r#"
            SELECT t.trip_id
            FROM trips t
            WHERE t.status = 'DISPATCHING'
              AND NOT EXISTS (
                  SELECT 1 FROM dispatch_attempts a
                  WHERE a.trip_id = t.trip_id
                    AND a.response LIKE 'PENDING%'
                    AND a.sent_at >= $1
              )
            ORDER BY t.requested_at ASC
            LIMIT $2
            "#,
        )
        .bind(cutoff)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(trip_id,)| trip_id).collect())
    }
}
