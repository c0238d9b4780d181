//! Fleet and fleet-driver entities (database row mappings).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use domain::models::driver::ApprovalStatus;
use domain::models::fleet::{Fleet, FleetDriver, FleetStatus, FleetType};

#[derive(Debug, Clone, FromRow)]
pub struct FleetEntity {
    pub fleet_id: i64,
    pub tenant_id: i64,
    pub owner_user_id: i64,
    pub fleet_type: String,
    pub approval_status: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl FleetEntity {
    pub fn into_domain(self) -> Fleet {
        Fleet {
            fleet_id: self.fleet_id,
            tenant_id: self.tenant_id,
            owner_user_id: self.owner_user_id,
            fleet_type: self
                .fleet_type
                .parse::<FleetType>()
                .unwrap_or(FleetType::Individual),
            approval_status: self
                .approval_status
                .parse::<ApprovalStatus>()
                .unwrap_or(ApprovalStatus::Pending),
            status: self
                .status
                .parse::<FleetStatus>()
                .unwrap_or(FleetStatus::Inactive),
            created_at: self.created_at,
        }
    }
}

impl From<FleetEntity> for Fleet {
    fn from(entity: FleetEntity) -> Self {
        entity.into_domain()
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct FleetDriverEntity {
    pub id: i64,
    pub fleet_id: i64,
    pub driver_id: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

impl FleetDriverEntity {
    pub fn into_domain(self) -> FleetDriver {
        FleetDriver {
            id: self.id,
            fleet_id: self.fleet_id,
            driver_id: self.driver_id,
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

impl From<FleetDriverEntity> for FleetDriver {
    fn from(entity: FleetDriverEntity) -> Self {
        entity.into_domain()
    }
}
