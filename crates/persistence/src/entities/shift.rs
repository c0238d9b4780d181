//! Driver shift entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use domain::models::shift::{DriverShift, ShiftStatus};

#[derive(Debug, Clone, FromRow)]
pub struct DriverShiftEntity {
    pub shift_id: i64,
    pub driver_id: i64,
    pub tenant_id: i64,
    pub vehicle_id: i64,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl DriverShiftEntity {
    pub fn into_domain(self) -> DriverShift {
        let status = self
            .status
            .parse::<ShiftStatus>()
            .unwrap_or(ShiftStatus::Offline);

        DriverShift {
            shift_id: self.shift_id,
            driver_id: self.driver_id,
            tenant_id: self.tenant_id,
            vehicle_id: self.vehicle_id,
            status,
            started_at: self.started_at,
            ended_at: self.ended_at,
        }
    }
}

impl From<DriverShiftEntity> for DriverShift {
    fn from(entity: DriverShiftEntity) -> Self {
        entity.into_domain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_status_maps_to_offline() {
        let entity = DriverShiftEntity {
            shift_id: 1,
            driver_id: 2,
            tenant_id: 3,
            vehicle_id: 4,
            status: "NAPPING".to_string(),
            started_at: Utc::now(),
            ended_at: None,
        };
        assert_eq!(entity.into_domain().status, ShiftStatus::Offline);
    }
}
