//! Trip repository for database operations.
//!
//! Lifecycle transitions are single guarded UPDATEs: the expected current
//! status sits in the WHERE clause and the row comes back via RETURNING, so
//! a `None` result means the guard failed and the caller decides which
//! error that is. Assignment is the compare-and-set on `driver_id IS NULL`
//! that decides the acceptance race.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::entities::trip::TRIP_COLUMNS;
use crate::entities::TripEntity;
use crate::metrics::QueryTimer;

/// Input data for inserting a trip row.
#[derive(Debug, Clone)]
pub struct NewTrip {
    pub rider_id: i64,
    pub city_id: i64,
    pub surge_zone_id: Option<i64>,
    pub vehicle_category: String,
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    pub drop_lat: f64,
    pub drop_lng: f64,
    pub fare_amount: BigDecimal,
    pub surge_multiplier: BigDecimal,
    pub requested_at: DateTime<Utc>,
}

/// Repository for trip rows.
#[derive(Clone)]
pub struct TripRepository {
    pool: PgPool,
}

impl TripRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a freshly requested trip (status REQUESTED, fare locked).
    pub async fn insert(&self, input: NewTrip) -> Result<TripEntity, sqlx::Error> {
        let timer = QueryTimer::start("insert_trip");

        let query = format!(
            r#"
            INSERT INTO trips (
                rider_id, city_id, surge_zone_id, vehicle_category,
                pickup_lat, pickup_lng, drop_lat, drop_lng,
                status, fare_amount, surge_multiplier, requested_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'REQUESTED', $9, $10, $11)
            RETURNING {}
            "#,
            TRIP_COLUMNS
        );
        let result = sqlx::query_as::<_, TripEntity>(&query)
            .bind(input.rider_id)
            .bind(input.city_id)
            .bind(input.surge_zone_id)
            .bind(&input.vehicle_category)
            .bind(input.pickup_lat)
            .bind(input.pickup_lng)
            .bind(input.drop_lat)
            .bind(input.drop_lng)
            .bind(&input.fare_amount)
            .bind(&input.surge_multiplier)
            .bind(input.requested_at)
            .fetch_one(&self.pool)
            .await;

        timer.finish();
        result
    }

    /// Find a trip by id.
    pub async fn find_by_id(&self, trip_id: i64) -> Result<Option<TripEntity>, sqlx::Error> {
        let timer = QueryTimer::start("find_trip_by_id");

        let query = format!("SELECT {} FROM trips WHERE trip_id = $1", TRIP_COLUMNS);
        let result = sqlx::query_as::<_, TripEntity>(&query)
            .bind(trip_id)
            .fetch_optional(&self.pool)
            .await;

        timer.finish();
        result
    }

    /// Find a trip by id inside the caller's transaction.
    pub async fn find_by_id_in_tx(
        conn: &mut PgConnection,
        trip_id: i64,
    ) -> Result<Option<TripEntity>, sqlx::Error> {
        let query = format!("SELECT {} FROM trips WHERE trip_id = $1", TRIP_COLUMNS);
        sqlx::query_as::<_, TripEntity>(&query)
            .bind(trip_id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// The rider's active trip, if any.
    pub async fn find_active_for_rider(
        &self,
        rider_id: i64,
    ) -> Result<Option<TripEntity>, sqlx::Error> {
        let timer = QueryTimer::start("find_active_trip_for_rider");

        let query = format!(
            r#"
            SELECT {} FROM trips
            WHERE rider_id = $1
              AND status IN ('REQUESTED', 'DISPATCHING', 'ASSIGNED', 'ARRIVED', 'PICKED_UP')
            "#,
            TRIP_COLUMNS
        );
        let result = sqlx::query_as::<_, TripEntity>(&query)
            .bind(rider_id)
            .fetch_optional(&self.pool)
            .await;

        timer.finish();
        result
    }

    /// REQUESTED -> DISPATCHING, at the start of wave 1.
    pub async fn set_dispatching(
        &self,
        trip_id: i64,
    ) -> Result<Option<TripEntity>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE trips
            SET status = 'DISPATCHING'
            WHERE trip_id = $1 AND status = 'REQUESTED'
            RETURNING {}
            "#,
            TRIP_COLUMNS
        );
        sqlx::query_as::<_, TripEntity>(&query)
            .bind(trip_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Record that the trip's search has covered `wave`. Monotonic: never
    /// moves the counter backwards.
    pub async fn record_searched_wave(&self, trip_id: i64, wave: i32) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE trips
            SET dispatch_wave = GREATEST(dispatch_wave, $2)
            WHERE trip_id = $1
            "#,
        )
        .bind(trip_id)
        .bind(wave)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// The atomic first-wins assignment: succeeds only while the trip is
    /// still DISPATCHING and unassigned. `None` means the race was lost.
    pub async fn try_assign(
        conn: &mut PgConnection,
        trip_id: i64,
        driver_id: i64,
        tenant_id: i64,
        vehicle_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<TripEntity>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE trips
            SET driver_id = $2, tenant_id = $3, vehicle_id = $4,
                status = 'ASSIGNED', assigned_at = $5
            WHERE trip_id = $1 AND status = 'DISPATCHING' AND driver_id IS NULL
            RETURNING {}
            "#,
            TRIP_COLUMNS
        );
        sqlx::query_as::<_, TripEntity>(&query)
            .bind(trip_id)
            .bind(driver_id)
            .bind(tenant_id)
            .bind(vehicle_id)
            .bind(now)
            .fetch_optional(&mut *conn)
            .await
    }

    /// ASSIGNED -> ARRIVED for the assigned driver.
    pub async fn mark_arrived(
        &self,
        trip_id: i64,
        driver_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<TripEntity>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE trips
            SET status = 'ARRIVED', arrived_at = $3
            WHERE trip_id = $1 AND driver_id = $2 AND status = 'ASSIGNED'
            RETURNING {}
            "#,
            TRIP_COLUMNS
        );
        sqlx::query_as::<_, TripEntity>(&query)
            .bind(trip_id)
            .bind(driver_id)
            .bind(now)
            .fetch_optional(&self.pool)
            .await
    }

    /// ARRIVED -> PICKED_UP; only valid once the pickup OTP is verified.
    pub async fn mark_picked_up(
        &self,
        trip_id: i64,
        driver_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<TripEntity>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE trips
            SET status = 'PICKED_UP', picked_up_at = $3
            WHERE trip_id = $1 AND driver_id = $2 AND status = 'ARRIVED'
              AND pickup_otp_verified_at IS NOT NULL
            RETURNING {}
            "#,
            TRIP_COLUMNS
        );
        sqlx::query_as::<_, TripEntity>(&query)
            .bind(trip_id)
            .bind(driver_id)
            .bind(now)
            .fetch_optional(&self.pool)
            .await
    }

    /// PICKED_UP -> COMPLETED. Runs in the caller's transaction together
    /// with the shift's BUSY -> ONLINE transition.
    pub async fn mark_completed(
        conn: &mut PgConnection,
        trip_id: i64,
        driver_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<TripEntity>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE trips
            SET status = 'COMPLETED', completed_at = $3
            WHERE trip_id = $1 AND driver_id = $2 AND status = 'PICKED_UP'
            RETURNING {}
            "#,
            TRIP_COLUMNS
        );
        sqlx::query_as::<_, TripEntity>(&query)
            .bind(trip_id)
            .bind(driver_id)
            .bind(now)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Transition to CANCELLED from any pre-pickup status. Runs in the
    /// caller's transaction so attempt cleanup and the shift release commit
    /// atomically with it.
    pub async fn cancel(
        conn: &mut PgConnection,
        trip_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<TripEntity>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE trips
            SET status = 'CANCELLED', cancelled_at = $2
            WHERE trip_id = $1
              AND status IN ('REQUESTED', 'DISPATCHING', 'ASSIGNED', 'ARRIVED')
            RETURNING {}
            "#,
            TRIP_COLUMNS
        );
        sqlx::query_as::<_, TripEntity>(&query)
            .bind(trip_id)
            .bind(now)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Cancel only while still unassigned and DISPATCHING. Used for wave
    /// exhaustion, where a concurrent acceptance must win over the cancel.
    pub async fn cancel_if_unassigned(
        conn: &mut PgConnection,
        trip_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<TripEntity>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE trips
            SET status = 'CANCELLED', cancelled_at = $2
            WHERE trip_id = $1
              AND status IN ('REQUESTED', 'DISPATCHING')
              AND driver_id IS NULL
            RETURNING {}
            "#,
            TRIP_COLUMNS
        );
        sqlx::query_as::<_, TripEntity>(&query)
            .bind(trip_id)
            .bind(now)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Store a fresh pickup OTP; resets the attempt counter and clears any
    /// prior verification.
    pub async fn set_pickup_otp(
        &self,
        trip_id: i64,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<TripEntity>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE trips
            SET pickup_otp = $2, pickup_otp_expires_at = $3,
                pickup_otp_attempts = 0, pickup_otp_verified_at = NULL
            WHERE trip_id = $1 AND status = 'ARRIVED'
            RETURNING {}
            "#,
            TRIP_COLUMNS
        );
        sqlx::query_as::<_, TripEntity>(&query)
            .bind(trip_id)
            .bind(code)
            .bind(expires_at)
            .fetch_optional(&self.pool)
            .await
    }

    /// Count one OTP verification attempt; returns the new counter value.
    pub async fn increment_otp_attempts(&self, trip_id: i64) -> Result<Option<i32>, sqlx::Error> {
        let row: Option<(i32,)> = sqlx::query_as(
            r#"
            UPDATE trips
            SET pickup_otp_attempts = pickup_otp_attempts + 1
            WHERE trip_id = $1
            RETURNING pickup_otp_attempts
            "#,
        )
        .bind(trip_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(attempts,)| attempts))
    }

    /// Record a successful OTP verification.
    pub async fn set_otp_verified(
        &self,
        trip_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<TripEntity>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE trips
            SET pickup_otp_verified_at = $2
            WHERE trip_id = $1 AND status = 'ARRIVED'
            RETURNING {}
            "#,
            TRIP_COLUMNS
        );
        sqlx::query_as::<_, TripEntity>(&query)
            .bind(trip_id)
            .bind(now)
            .fetch_optional(&self.pool)
            .await
    }
}
