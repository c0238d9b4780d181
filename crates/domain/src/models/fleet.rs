//! Fleet and fleet-driver association models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::driver::ApprovalStatus;

/// Kind of fleet. INDIVIDUAL fleets are auto-created on driver approval and
/// owned by the driver themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FleetType {
    Business,
    Individual,
}

impl FleetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FleetType::Business => "BUSINESS",
            FleetType::Individual => "INDIVIDUAL",
        }
    }
}

impl std::str::FromStr for FleetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BUSINESS" => Ok(FleetType::Business),
            "INDIVIDUAL" => Ok(FleetType::Individual),
            _ => Err(format!("Invalid fleet type: {}", s)),
        }
    }
}

/// Operational status of a fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FleetStatus {
    Active,
    Inactive,
}

impl FleetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FleetStatus::Active => "ACTIVE",
            FleetStatus::Inactive => "INACTIVE",
        }
    }
}

impl std::str::FromStr for FleetStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(FleetStatus::Active),
            "INACTIVE" => Ok(FleetStatus::Inactive),
            _ => Err(format!("Invalid fleet status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fleet {
    pub fleet_id: i64,
    pub tenant_id: i64,
    pub owner_user_id: i64,
    pub fleet_type: FleetType,
    pub approval_status: ApprovalStatus,
    pub status: FleetStatus,
    pub created_at: DateTime<Utc>,
}

/// Association of a driver with a fleet. At most one open row per driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetDriver {
    pub id: i64,
    pub fleet_id: i64,
    pub driver_id: i64,
    pub start_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
}

impl FleetDriver {
    pub fn is_open(&self) -> bool {
        self.end_date.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fleet_type_round_trip() {
        assert_eq!("BUSINESS".parse::<FleetType>().unwrap(), FleetType::Business);
        assert_eq!(
            "INDIVIDUAL".parse::<FleetType>().unwrap(),
            FleetType::Individual
        );
        assert!("SOLO".parse::<FleetType>().is_err());
    }

    #[test]
    fn test_association_open() {
        let assoc = FleetDriver {
            id: 1,
            fleet_id: 2,
            driver_id: 3,
            start_date: Utc::now(),
            end_date: None,
        };
        assert!(assoc.is_open());
        assert!(!FleetDriver {
            end_date: Some(Utc::now()),
            ..assoc
        }
        .is_open());
    }
}
