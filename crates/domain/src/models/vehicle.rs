//! Vehicle, vehicle documents, and driver-vehicle assignments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::driver::ApprovalStatus;

/// Vehicle category a trip can be requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleCategory {
    Hatchback,
    Sedan,
    Suv,
    Auto,
    Bike,
}

impl VehicleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleCategory::Hatchback => "HATCHBACK",
            VehicleCategory::Sedan => "SEDAN",
            VehicleCategory::Suv => "SUV",
            VehicleCategory::Auto => "AUTO",
            VehicleCategory::Bike => "BIKE",
        }
    }
}

impl fmt::Display for VehicleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for VehicleCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HATCHBACK" => Ok(VehicleCategory::Hatchback),
            "SEDAN" => Ok(VehicleCategory::Sedan),
            "SUV" => Ok(VehicleCategory::Suv),
            "AUTO" => Ok(VehicleCategory::Auto),
            "BIKE" => Ok(VehicleCategory::Bike),
            _ => Err(format!("Invalid vehicle category: {}", s)),
        }
    }
}

/// Document kinds a vehicle must carry before its driver can go online.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    Rc,
    Insurance,
    VehiclePhoto,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Rc => "RC",
            DocumentType::Insurance => "INSURANCE",
            DocumentType::VehiclePhoto => "VEHICLE_PHOTO",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RC" => Ok(DocumentType::Rc),
            "INSURANCE" => Ok(DocumentType::Insurance),
            "VEHICLE_PHOTO" => Ok(DocumentType::VehiclePhoto),
            _ => Err(format!("Invalid document type: {}", s)),
        }
    }
}

/// Documents required before a vehicle can be driven on-platform.
pub const REQUIRED_VEHICLE_DOCS: [DocumentType; 3] = [
    DocumentType::Rc,
    DocumentType::Insurance,
    DocumentType::VehiclePhoto,
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub vehicle_id: i64,
    pub fleet_id: i64,
    pub category: VehicleCategory,
    pub registration_no: String,
    pub approval_status: ApprovalStatus,
    pub created_at: DateTime<Utc>,
}

/// The binding of a driver to a vehicle. At most one open row per driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverVehicleAssignment {
    pub assignment_id: i64,
    pub driver_id: i64,
    pub vehicle_id: i64,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

impl DriverVehicleAssignment {
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip() {
        for category in [
            VehicleCategory::Hatchback,
            VehicleCategory::Sedan,
            VehicleCategory::Suv,
            VehicleCategory::Auto,
            VehicleCategory::Bike,
        ] {
            assert_eq!(
                category.as_str().parse::<VehicleCategory>().unwrap(),
                category
            );
        }
        assert!("sedan".parse::<VehicleCategory>().is_err());
    }

    #[test]
    fn test_document_type_round_trip() {
        for doc in REQUIRED_VEHICLE_DOCS {
            assert_eq!(doc.as_str().parse::<DocumentType>().unwrap(), doc);
        }
    }

    #[test]
    fn test_assignment_open() {
        let assignment = DriverVehicleAssignment {
            assignment_id: 1,
            driver_id: 2,
            vehicle_id: 3,
            start_time: Utc::now(),
            end_time: None,
        };
        assert!(assignment.is_open());

        let closed = DriverVehicleAssignment {
            end_time: Some(Utc::now()),
            ..assignment
        };
        assert!(!closed.is_open());
    }
}
