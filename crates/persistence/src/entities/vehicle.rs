//! Vehicle and assignment entities (database row mappings).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use domain::models::driver::ApprovalStatus;
use domain::models::vehicle::{DriverVehicleAssignment, Vehicle, VehicleCategory};

#[derive(Debug, Clone, FromRow)]
pub struct VehicleEntity {
    pub vehicle_id: i64,
    pub fleet_id: i64,
    pub category: String,
    pub registration_no: String,
    pub approval_status: String,
    pub created_at: DateTime<Utc>,
}

impl VehicleEntity {
    pub fn into_domain(self) -> Vehicle {
        Vehicle {
            vehicle_id: self.vehicle_id,
            fleet_id: self.fleet_id,
            category: self
                .category
                .parse::<VehicleCategory>()
                .unwrap_or(VehicleCategory::Sedan),
            registration_no: self.registration_no,
            approval_status: self
                .approval_status
                .parse::<ApprovalStatus>()
                .unwrap_or(ApprovalStatus::Pending),
            created_at: self.created_at,
        }
    }
}

impl From<VehicleEntity> for Vehicle {
    fn from(entity: VehicleEntity) -> Self {
        entity.into_domain()
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DriverVehicleAssignmentEntity {
    pub assignment_id: i64,
    pub driver_id: i64,
    pub vehicle_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

impl DriverVehicleAssignmentEntity {
    pub fn into_domain(self) -> DriverVehicleAssignment {
        DriverVehicleAssignment {
            assignment_id: self.assignment_id,
            driver_id: self.driver_id,
            vehicle_id: self.vehicle_id,
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }
}

impl From<DriverVehicleAssignmentEntity> for DriverVehicleAssignment {
    fn from(entity: DriverVehicleAssignmentEntity) -> Self {
        entity.into_domain()
    }
}
