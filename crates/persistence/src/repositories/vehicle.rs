//! Vehicle repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::entities::{DriverVehicleAssignmentEntity, VehicleEntity};
use crate::metrics::QueryTimer;

/// Repository for vehicles, documents and driver-vehicle assignments.
#[derive(Clone)]
pub struct VehicleRepository {
    pool: PgPool,
}

impl VehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a vehicle by id.
    pub async fn find_by_id(&self, vehicle_id: i64) -> Result<Option<VehicleEntity>, sqlx::Error> {
        sqlx::query_as::<_, VehicleEntity>(
            r#"
            SELECT vehicle_id, fleet_id, category, registration_no, approval_status, created_at
            FROM vehicles
            WHERE vehicle_id = $1
            "#,
        )
        .bind(vehicle_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// The driver's open vehicle assignment, if any.
    pub async fn find_open_assignment(
        &self,
        driver_id: i64,
    ) -> Result<Option<DriverVehicleAssignmentEntity>, sqlx::Error> {
        let timer = QueryTimer::start("find_open_vehicle_assignment");

        let result = sqlx::query_as::<_, DriverVehicleAssignmentEntity>(
            r#"
            SELECT assignment_id, driver_id, vehicle_id, start_time, end_time
            FROM driver_vehicle_assignments
            WHERE driver_id = $1 AND end_time IS NULL
            "#,
        )
        .bind(driver_id)
        .fetch_optional(&self.pool)
        .await;

        timer.finish();
        result
    }

    /// The driver's open vehicle assignment, read inside the caller's
    /// transaction.
    pub async fn find_open_assignment_in_tx(
        conn: &mut PgConnection,
        driver_id: i64,
    ) -> Result<Option<DriverVehicleAssignmentEntity>, sqlx::Error> {
        sqlx::query_as::<_, DriverVehicleAssignmentEntity>(
            r#"
            SELECT assignment_id, driver_id, vehicle_id, start_time, end_time
            FROM driver_vehicle_assignments
            WHERE driver_id = $1 AND end_time IS NULL
            "#,
        )
        .bind(driver_id)
        .fetch_optional(&mut *conn)
        .await
    }

    /// Document types present for a vehicle.
    pub async fn list_document_types(&self, vehicle_id: i64) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT document_type
            FROM vehicle_documents
            WHERE vehicle_id = $1
            "#,
        )
        .bind(vehicle_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(doc,)| doc).collect())
    }

    /// Close the driver's open assignment. Runs inside the caller's
    /// transaction, after the per-driver advisory lock is held.
    pub async fn end_open_assignment(
        conn: &mut PgConnection,
        driver_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<DriverVehicleAssignmentEntity>, sqlx::Error> {
        sqlx::query_as::<_, DriverVehicleAssignmentEntity>(
            r#"
            UPDATE driver_vehicle_assignments
            SET end_time = $2
            WHERE driver_id = $1 AND end_time IS NULL
            RETURNING assignment_id, driver_id, vehicle_id, start_time, end_time
            "#,
        )
        .bind(driver_id)
        .bind(now)
        .fetch_optional(&mut *conn)
        .await
    }
}
