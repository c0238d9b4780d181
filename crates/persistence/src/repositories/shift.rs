//! Driver shift repository for database operations.
//!
//! Shift state is read-modify-write; every mutation runs inside a
//! transaction that first takes the per-driver advisory lock so concurrent
//! shift operations for the same driver are serialised.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::entities::DriverShiftEntity;
use crate::metrics::QueryTimer;

const SHIFT_COLUMNS: &str =
    "shift_id, driver_id, tenant_id, vehicle_id, status, started_at, ended_at";

/// Repository for driver shifts.
#[derive(Clone)]
pub struct ShiftRepository {
    pool: PgPool,
}

impl ShiftRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Transaction-scoped advisory lock on the driver. Released at commit or
    /// rollback.
    pub async fn lock_driver(conn: &mut PgConnection, driver_id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(driver_id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// The driver's open shift, if any (pool read).
    pub async fn find_open(
        &self,
        driver_id: i64,
    ) -> Result<Option<DriverShiftEntity>, sqlx::Error> {
        let timer = QueryTimer::start("find_open_shift");

        let query = format!(
            "SELECT {} FROM driver_shifts WHERE driver_id = $1 AND ended_at IS NULL",
            SHIFT_COLUMNS
        );
        let result = sqlx::query_as::<_, DriverShiftEntity>(&query)
            .bind(driver_id)
            .fetch_optional(&self.pool)
            .await;

        timer.finish();
        result
    }

    /// The driver's open shift, read inside the caller's transaction.
    pub async fn find_open_in_tx(
        conn: &mut PgConnection,
        driver_id: i64,
    ) -> Result<Option<DriverShiftEntity>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM driver_shifts WHERE driver_id = $1 AND ended_at IS NULL",
            SHIFT_COLUMNS
        );
        sqlx::query_as::<_, DriverShiftEntity>(&query)
            .bind(driver_id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Open a new shift for the driver.
    pub async fn insert(
        conn: &mut PgConnection,
        driver_id: i64,
        tenant_id: i64,
        vehicle_id: i64,
        started_at: DateTime<Utc>,
    ) -> Result<DriverShiftEntity, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO driver_shifts (driver_id, tenant_id, vehicle_id, status, started_at)
            VALUES ($1, $2, $3, 'ONLINE', $4)
            RETURNING {}
            "#,
            SHIFT_COLUMNS
        );
        sqlx::query_as::<_, DriverShiftEntity>(&query)
            .bind(driver_id)
            .bind(tenant_id)
            .bind(vehicle_id)
            .bind(started_at)
            .fetch_one(&mut *conn)
            .await
    }

    /// Flip the open shift's status, guarded by the expected current status.
    /// Returns `None` when the guard fails (no open shift, or wrong status).
    pub async fn set_status(
        conn: &mut PgConnection,
        driver_id: i64,
        from_status: &str,
        to_status: &str,
    ) -> Result<Option<DriverShiftEntity>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE driver_shifts
            SET status = $3
            WHERE driver_id = $1 AND ended_at IS NULL AND status = $2
            RETURNING {}
            "#,
            SHIFT_COLUMNS
        );
        sqlx::query_as::<_, DriverShiftEntity>(&query)
            .bind(driver_id)
            .bind(from_status)
            .bind(to_status)
            .fetch_optional(&mut *conn)
            .await
    }

    /// End the open shift: `status = OFFLINE`, `ended_at = now`.
    pub async fn close(
        conn: &mut PgConnection,
        driver_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<DriverShiftEntity>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE driver_shifts
            SET status = 'OFFLINE', ended_at = $2
            WHERE driver_id = $1 AND ended_at IS NULL
            RETURNING {}
            "#,
            SHIFT_COLUMNS
        );
        sqlx::query_as::<_, DriverShiftEntity>(&query)
            .bind(driver_id)
            .bind(now)
            .fetch_optional(&mut *conn)
            .await
    }
}
