//! Tenant domain model.
//!
//! A tenant is the top-level isolation boundary: every driver and fleet
//! belongs to exactly one tenant, and a trip inherits its tenant from the
//! accepting driver at assignment time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Operational status of a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TenantStatus {
    Active,
    Suspended,
    Closed,
}

impl TenantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TenantStatus::Active => "ACTIVE",
            TenantStatus::Suspended => "SUSPENDED",
            TenantStatus::Closed => "CLOSED",
        }
    }
}

impl std::str::FromStr for TenantStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(TenantStatus::Active),
            "SUSPENDED" => Ok(TenantStatus::Suspended),
            "CLOSED" => Ok(TenantStatus::Closed),
            _ => Err(format!("Invalid tenant status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub tenant_id: i64,
    pub tenant_code: String,
    pub name: String,
    pub status: TenantStatus,
    pub default_currency: String,
    pub default_timezone: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            TenantStatus::Active,
            TenantStatus::Suspended,
            TenantStatus::Closed,
        ] {
            assert_eq!(status.as_str().parse::<TenantStatus>().unwrap(), status);
        }
        assert!("GONE".parse::<TenantStatus>().is_err());
    }
}
