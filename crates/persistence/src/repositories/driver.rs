//! Driver profile repository for database operations.

use sqlx::PgPool;

use crate::entities::{DriverProfileEntity, OnlineDriverRow};
use crate::metrics::QueryTimer;

const ONLINE_DRIVER_SELECT: &str = r#"
    SELECT p.driver_id,
           l.latitude,
           l.longitude,
           v.category AS vehicle_category,
           p.allowed_vehicle_categories
    FROM driver_profiles p
    JOIN driver_shifts s
      ON s.driver_id = p.driver_id AND s.ended_at IS NULL AND s.status = 'ONLINE'
    JOIN driver_locations l
      ON l.driver_id = p.driver_id
    JOIN driver_vehicle_assignments a
      ON a.driver_id = p.driver_id AND a.end_time IS NULL
    JOIN vehicles v
      ON v.vehicle_id = a.vehicle_id
    WHERE p.approval_status = 'APPROVED'
      AND v.category = $1
"#;

/// Repository for driver profiles and dispatch eligibility rows.
#[derive(Clone)]
pub struct DriverRepository {
    pool: PgPool,
}

impl DriverRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a driver's profile.
    pub async fn find_profile(
        &self,
        driver_id: i64,
    ) -> Result<Option<DriverProfileEntity>, sqlx::Error> {
        let timer = QueryTimer::start("find_driver_profile");

        let result = sqlx::query_as::<_, DriverProfileEntity>(
            r#"
            SELECT driver_id, tenant_id, driver_type, approval_status,
                   allowed_vehicle_categories, created_at
            FROM driver_profiles
            WHERE driver_id = $1
            "#,
        )
        .bind(driver_id)
        .fetch_optional(&self.pool)
        .await;

        timer.finish();
        result
    }

    /// Find a driver's profile inside the caller's transaction.
    pub async fn find_profile_in_tx(
        conn: &mut sqlx::PgConnection,
        driver_id: i64,
    ) -> Result<Option<DriverProfileEntity>, sqlx::Error> {
        sqlx::query_as::<_, DriverProfileEntity>(
            r#"
            SELECT driver_id, tenant_id, driver_type, approval_status,
                   allowed_vehicle_categories, created_at
            FROM driver_profiles
            WHERE driver_id = $1
            "#,
        )
        .bind(driver_id)
        .fetch_optional(&mut *conn)
        .await
    }

    /// All approved, ONLINE drivers assigned a vehicle of the requested
    /// category, with their last durable positions. Used when the live geo
    /// index is empty (cold start) or unavailable.
    pub async fn list_online_for_category(
        &self,
        vehicle_category: &str,
        exclude_driver_ids: &[i64],
    ) -> Result<Vec<OnlineDriverRow>, sqlx::Error> {
        let timer = QueryTimer::start("list_online_for_category");

        let query = format!("{} AND NOT (p.driver_id = ANY($2))", ONLINE_DRIVER_SELECT);
        let result = sqlx::query_as::<_, OnlineDriverRow>(&query)
            .bind(vehicle_category)
            .bind(exclude_driver_ids)
            .fetch_all(&self.pool)
            .await;

        timer.finish();
        result
    }

    /// Eligibility rows restricted to the given driver ids (the geo index's
    /// radius hits), excluding already-attempted drivers.
    pub async fn list_eligible_among(
        &self,
        driver_ids: &[i64],
        vehicle_category: &str,
        exclude_driver_ids: &[i64],
    ) -> Result<Vec<OnlineDriverRow>, sqlx::Error> {
        let timer = QueryTimer::start("list_eligible_among");

        let query = format!(
            "{} AND p.driver_id = ANY($2) AND NOT (p.driver_id = ANY($3))",
            ONLINE_DRIVER_SELECT
        );
        let result = sqlx::query_as::<_, OnlineDriverRow>(&query)
            .bind(vehicle_category)
            .bind(driver_ids)
            .bind(exclude_driver_ids)
            .fetch_all(&self.pool)
            .await;

        timer.finish();
        result
    }
}
