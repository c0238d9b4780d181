//! Fleet repository for database operations.

use sqlx::PgPool;

use crate::entities::{FleetDriverEntity, FleetEntity};
use crate::metrics::QueryTimer;

/// Repository for fleets and fleet-driver associations.
#[derive(Clone)]
pub struct FleetRepository {
    pool: PgPool,
}

impl FleetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The driver's open fleet association, if any.
    pub async fn find_open_association(
        &self,
        driver_id: i64,
    ) -> Result<Option<FleetDriverEntity>, sqlx::Error> {
        let timer = QueryTimer::start("find_open_fleet_association");

        let result = sqlx::query_as::<_, FleetDriverEntity>(
            r#"
            SELECT id, fleet_id, driver_id, start_date, end_date
            FROM fleet_drivers
            WHERE driver_id = $1 AND end_date IS NULL
            "#,
        )
        .bind(driver_id)
        .fetch_optional(&self.pool)
        .await;

        timer.finish();
        result
    }

    /// Find a fleet by id.
    pub async fn find_by_id(&self, fleet_id: i64) -> Result<Option<FleetEntity>, sqlx::Error> {
        sqlx::query_as::<_, FleetEntity>(
            r#"
            SELECT fleet_id, tenant_id, owner_user_id, fleet_type, approval_status,
                   status, created_at
            FROM fleets
            WHERE fleet_id = $1
            "#,
        )
        .bind(fleet_id)
        .fetch_optional(&self.pool)
        .await
    }
}
