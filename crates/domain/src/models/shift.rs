//! Driver shift domain model.
//!
//! A shift is a driver's continuous online presence. At most one open shift
//! exists per driver; ending a shift sets `ended_at` and leaves the vehicle
//! assignment untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Runtime status of an open shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShiftStatus {
    Online,
    Busy,
    Offline,
}

impl ShiftStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftStatus::Online => "ONLINE",
            ShiftStatus::Busy => "BUSY",
            ShiftStatus::Offline => "OFFLINE",
        }
    }

    /// Check if transition to target status is valid.
    ///
    /// ONLINE <-> BUSY happens on trip accept/complete; ONLINE -> OFFLINE on
    /// "go offline". Going offline while BUSY is forbidden.
    pub fn can_transition_to(&self, target: ShiftStatus) -> bool {
        matches!(
            (self, target),
            (ShiftStatus::Online, ShiftStatus::Busy)
                | (ShiftStatus::Busy, ShiftStatus::Online)
                | (ShiftStatus::Online, ShiftStatus::Offline)
        )
    }
}

impl fmt::Display for ShiftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ShiftStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ONLINE" => Ok(ShiftStatus::Online),
            "BUSY" => Ok(ShiftStatus::Busy),
            "OFFLINE" => Ok(ShiftStatus::Offline),
            _ => Err(format!(
                "Invalid shift status: {}. Must be one of: ONLINE, BUSY, OFFLINE",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverShift {
    pub shift_id: i64,
    pub driver_id: i64,
    pub tenant_id: i64,
    pub vehicle_id: i64,
    pub status: ShiftStatus,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

impl DriverShift {
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [ShiftStatus::Online, ShiftStatus::Busy, ShiftStatus::Offline] {
            assert_eq!(status.as_str().parse::<ShiftStatus>().unwrap(), status);
        }
        assert!("online".parse::<ShiftStatus>().is_err());
    }

    #[test]
    fn test_transitions() {
        assert!(ShiftStatus::Online.can_transition_to(ShiftStatus::Busy));
        assert!(ShiftStatus::Busy.can_transition_to(ShiftStatus::Online));
        assert!(ShiftStatus::Online.can_transition_to(ShiftStatus::Offline));

        // Going offline mid-trip is forbidden.
        assert!(!ShiftStatus::Busy.can_transition_to(ShiftStatus::Offline));
        assert!(!ShiftStatus::Offline.can_transition_to(ShiftStatus::Online));
        assert!(!ShiftStatus::Offline.can_transition_to(ShiftStatus::Busy));
        assert!(!ShiftStatus::Online.can_transition_to(ShiftStatus::Online));
    }

    #[test]
    fn test_shift_open() {
        let shift = DriverShift {
            shift_id: 1,
            driver_id: 2,
            tenant_id: 3,
            vehicle_id: 4,
            status: ShiftStatus::Online,
            started_at: Utc::now(),
            ended_at: None,
        };
        assert!(shift.is_open());
        assert!(!DriverShift {
            ended_at: Some(Utc::now()),
            status: ShiftStatus::Offline,
            ..shift
        }
        .is_open());
    }
}
