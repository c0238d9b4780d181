//! Driver profile entity and eligibility rows.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use domain::models::driver::{ApprovalStatus, DriverProfile, DriverType};
use domain::models::vehicle::VehicleCategory;

#[derive(Debug, Clone, FromRow)]
pub struct DriverProfileEntity {
    pub driver_id: i64,
    pub tenant_id: i64,
    pub driver_type: String,
    pub approval_status: String,
    pub allowed_vehicle_categories: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl DriverProfileEntity {
    pub fn into_domain(self) -> DriverProfile {
        let driver_type = self
            .driver_type
            .parse::<DriverType>()
            .unwrap_or(DriverType::Individual);
        let approval_status = self
            .approval_status
            .parse::<ApprovalStatus>()
            .unwrap_or(ApprovalStatus::Pending);
        // Unknown category codes are skipped rather than failing the load.
        let allowed_vehicle_categories = self
            .allowed_vehicle_categories
            .iter()
            .filter_map(|code| code.parse::<VehicleCategory>().ok())
            .collect();

        DriverProfile {
            driver_id: self.driver_id,
            tenant_id: self.tenant_id,
            driver_type,
            approval_status,
            allowed_vehicle_categories,
            created_at: self.created_at,
        }
    }
}

impl From<DriverProfileEntity> for DriverProfile {
    fn from(entity: DriverProfileEntity) -> Self {
        entity.into_domain()
    }
}

/// Eligibility row: an approved, ONLINE driver with its last durable
/// position and the category of its currently assigned vehicle.
#[derive(Debug, Clone, FromRow)]
pub struct OnlineDriverRow {
    pub driver_id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub vehicle_category: String,
    pub allowed_vehicle_categories: Vec<String>,
}

impl OnlineDriverRow {
    /// Whether this driver may serve the requested category: the assigned
    /// vehicle must match it, and the driver must be licensed for it.
    pub fn serves(&self, requested: VehicleCategory) -> bool {
        let assigned = self.vehicle_category.parse::<VehicleCategory>().ok();
        assigned == Some(requested)
            && self
                .allowed_vehicle_categories
                .iter()
                .any(|code| code.parse::<VehicleCategory>().ok() == Some(requested))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(vehicle: &str, allowed: &[&str]) -> OnlineDriverRow {
        OnlineDriverRow {
            driver_id: 1,
            latitude: 12.97,
            longitude: 77.59,
            vehicle_category: vehicle.to_string(),
            allowed_vehicle_categories: allowed.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_serves_requires_both_match() {
        assert!(row("SEDAN", &["SEDAN", "SUV"]).serves(VehicleCategory::Sedan));
        // Assigned vehicle differs from the request.
        assert!(!row("SUV", &["SEDAN", "SUV"]).serves(VehicleCategory::Sedan));
        // Driver not licensed for the assigned vehicle's category.
        assert!(!row("SEDAN", &["AUTO"]).serves(VehicleCategory::Sedan));
        assert!(!row("SEDAN", &[]).serves(VehicleCategory::Sedan));
    }

    #[test]
    fn test_unknown_categories_skipped() {
        let entity = DriverProfileEntity {
            driver_id: 1,
            tenant_id: 1,
            driver_type: "INDIVIDUAL".to_string(),
            approval_status: "APPROVED".to_string(),
            allowed_vehicle_categories: vec!["SEDAN".to_string(), "RICKSHAW".to_string()],
            created_at: Utc::now(),
        };
        let profile = entity.into_domain();
        assert_eq!(profile.allowed_vehicle_categories, vec![VehicleCategory::Sedan]);
    }
}
