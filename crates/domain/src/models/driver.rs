//! Driver profile domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::vehicle::VehicleCategory;

/// Admin approval state shared by driver profiles, fleets and vehicles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "PENDING",
            ApprovalStatus::Approved => "APPROVED",
            ApprovalStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ApprovalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ApprovalStatus::Pending),
            "APPROVED" => Ok(ApprovalStatus::Approved),
            "REJECTED" => Ok(ApprovalStatus::Rejected),
            _ => Err(format!("Invalid approval status: {}", s)),
        }
    }
}

/// Whether the driver works for themselves or for a business fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriverType {
    Individual,
    Business,
}

impl DriverType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverType::Individual => "INDIVIDUAL",
            DriverType::Business => "BUSINESS",
        }
    }
}

impl std::str::FromStr for DriverType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INDIVIDUAL" => Ok(DriverType::Individual),
            "BUSINESS" => Ok(DriverType::Business),
            _ => Err(format!("Invalid driver type: {}", s)),
        }
    }
}

/// A driver's platform profile. Keyed by the driver's user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverProfile {
    pub driver_id: i64,
    pub tenant_id: i64,
    pub driver_type: DriverType,
    pub approval_status: ApprovalStatus,
    /// Categories this driver is licensed to take trips on.
    pub allowed_vehicle_categories: Vec<VehicleCategory>,
    pub created_at: DateTime<Utc>,
}

impl DriverProfile {
    pub fn is_approved(&self) -> bool {
        self.approval_status == ApprovalStatus::Approved
    }

    pub fn allows_category(&self, category: VehicleCategory) -> bool {
        self.allowed_vehicle_categories.contains(&category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(categories: Vec<VehicleCategory>) -> DriverProfile {
        DriverProfile {
            driver_id: 7,
            tenant_id: 1,
            driver_type: DriverType::Individual,
            approval_status: ApprovalStatus::Approved,
            allowed_vehicle_categories: categories,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_approval_round_trip() {
        for status in [
            ApprovalStatus::Pending,
            ApprovalStatus::Approved,
            ApprovalStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<ApprovalStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_allows_category() {
        let p = profile(vec![VehicleCategory::Sedan, VehicleCategory::Suv]);
        assert!(p.allows_category(VehicleCategory::Sedan));
        assert!(!p.allows_category(VehicleCategory::Auto));
    }

    #[test]
    fn test_empty_categories_allow_nothing() {
        let p = profile(vec![]);
        assert!(!p.allows_category(VehicleCategory::Sedan));
    }
}
