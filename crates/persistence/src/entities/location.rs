//! Driver location entities (database row mappings).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use domain::models::{DriverLocation, DriverLocationHistory};

#[derive(Debug, Clone, FromRow)]
pub struct DriverLocationEntity {
    pub driver_id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub last_updated: DateTime<Utc>,
}

impl DriverLocationEntity {
    pub fn into_domain(self) -> DriverLocation {
        DriverLocation {
            driver_id: self.driver_id,
            latitude: self.latitude,
            longitude: self.longitude,
            last_updated: self.last_updated,
        }
    }
}

impl From<DriverLocationEntity> for DriverLocation {
    fn from(entity: DriverLocationEntity) -> Self {
        entity.into_domain()
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DriverLocationHistoryEntity {
    pub id: i64,
    pub driver_id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub recorded_at: DateTime<Utc>,
}

impl DriverLocationHistoryEntity {
    pub fn into_domain(self) -> DriverLocationHistory {
        DriverLocationHistory {
            id: self.id,
            driver_id: self.driver_id,
            latitude: self.latitude,
            longitude: self.longitude,
            recorded_at: self.recorded_at,
        }
    }
}

impl From<DriverLocationHistoryEntity> for DriverLocationHistory {
    fn from(entity: DriverLocationHistoryEntity) -> Self {
        entity.into_domain()
    }
}
