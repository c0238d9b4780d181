//! Driver location ingest.
//!
//! The hot write path: a driver app pings every 5-10 seconds while ONLINE or
//! BUSY. The live geo index update is best-effort; the durable last-known
//! row and the history append commit together and are authoritative.

use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;

use domain::error::{ErrorKind, PreconditionKind};
use domain::models::location::UpdateLocationResponse;
use persistence::repositories::{LocationRepository, ShiftRepository};

use crate::services::geo_index::DriverGeoIndex;

#[derive(Clone)]
pub struct LocationIngestService {
    pool: PgPool,
    shifts: ShiftRepository,
    geo_index: Arc<DriverGeoIndex>,
}

impl LocationIngestService {
    pub fn new(pool: PgPool, geo_index: Arc<DriverGeoIndex>) -> Self {
        Self {
            shifts: ShiftRepository::new(pool.clone()),
            pool,
            geo_index,
        }
    }

    /// Process one location ping.
    pub async fn update_location(
        &self,
        driver_id: i64,
        latitude: f64,
        longitude: f64,
    ) -> Result<UpdateLocationResponse, ErrorKind> {
        // Pings from drivers without an open shift are rejected.
        self.shifts
            .find_open(driver_id)
            .await
            .map_err(ErrorKind::internal)?
            .ok_or_else(|| ErrorKind::precondition(PreconditionKind::NoActiveShift))?;

        // Live index update is fire-and-forget: the durable store below is
        // authoritative, so an index problem must never fail the ping.
        self.geo_index.upsert(driver_id, longitude, latitude);

        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(ErrorKind::internal)?;

        LocationRepository::upsert_last_known(&mut tx, driver_id, latitude, longitude, now)
            .await
            .map_err(ErrorKind::internal)?;
        LocationRepository::append_history(&mut tx, driver_id, latitude, longitude, now)
            .await
            .map_err(ErrorKind::internal)?;

        tx.commit().await.map_err(ErrorKind::internal)?;

        Ok(UpdateLocationResponse {
            ok: true,
            updated_at: now,
        })
    }
}
