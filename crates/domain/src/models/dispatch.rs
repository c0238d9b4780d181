//! Dispatch attempt model and wave outcomes.
//!
//! An attempt is one offer of a specific trip to a specific driver. A wave is
//! the parallel batch of attempts created at a single radius; first
//! acceptance wins and every sibling attempt ends CANCELLED or TIMEOUT.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

/// Terminal and pending states of a dispatch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptResponse {
    /// Offer outstanding; the wave number is carried in the value.
    PendingWave(i32),
    Accepted,
    Rejected,
    Cancelled,
    Timeout,
}

impl AttemptResponse {
    /// String form stored in the database (`PENDING_WAVE_2`, `ACCEPTED`, ...).
    pub fn as_db_string(&self) -> String {
        match self {
            AttemptResponse::PendingWave(wave) => format!("PENDING_WAVE_{}", wave),
            AttemptResponse::Accepted => "ACCEPTED".to_string(),
            AttemptResponse::Rejected => "REJECTED".to_string(),
            AttemptResponse::Cancelled => "CANCELLED".to_string(),
            AttemptResponse::Timeout => "TIMEOUT".to_string(),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, AttemptResponse::PendingWave(_))
    }
}

impl fmt::Display for AttemptResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_string())
    }
}

impl std::str::FromStr for AttemptResponse {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACCEPTED" => Ok(AttemptResponse::Accepted),
            "REJECTED" => Ok(AttemptResponse::Rejected),
            "CANCELLED" => Ok(AttemptResponse::Cancelled),
            "TIMEOUT" => Ok(AttemptResponse::Timeout),
            _ => {
                if let Some(wave) = s.strip_prefix("PENDING_WAVE_") {
                    wave.parse::<i32>()
                        .map(AttemptResponse::PendingWave)
                        .map_err(|_| format!("Invalid attempt response: {}", s))
                } else {
                    Err(format!("Invalid attempt response: {}", s))
                }
            }
        }
    }
}

impl Serialize for AttemptResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_db_string())
    }
}

/// One offer of a trip to a driver.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchAttempt {
    pub attempt_id: i64,
    pub trip_id: i64,
    pub driver_id: i64,
    pub wave_number: i32,
    pub sent_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responded_at: Option<DateTime<Utc>>,
    pub response: AttemptResponse,
}

impl DispatchAttempt {
    /// An offer is live while pending and within the offer timeout.
    pub fn is_live(&self, now: DateTime<Utc>, timeout_seconds: i64) -> bool {
        self.response.is_pending()
            && now.signed_duration_since(self.sent_at).num_seconds() <= timeout_seconds
    }
}

/// An eligible driver with its straight-line distance to the pickup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub driver_id: i64,
    pub distance_km: f64,
}

/// Outcome of the initial dispatch of a freshly created trip.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DispatchOutcome {
    WaveCreated {
        wave: i32,
        radius_km: f64,
        attempts: usize,
    },
    NoDriversInRadius {
        wave: i32,
        radius_km: f64,
    },
}

/// Outcome of a single `advance_wave` call.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdvanceOutcome {
    /// The trip already has a driver; nothing to advance.
    AlreadyAssigned { status: String },
    /// The trip is not dispatching, or live offers are still outstanding.
    NoAction {
        reason: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        current_wave: Option<i32>,
    },
    /// All waves spent; the trip was cancelled.
    DispatchExhausted { waves: i32 },
    /// The next wave found no candidates; the trip stays DISPATCHING.
    NoDriversInRadius { wave: i32, radius_km: f64 },
    WaveCreated {
        wave: i32,
        radius_km: f64,
        attempts: usize,
    },
}

/// A pending offer as shown to a driver.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferView {
    pub attempt_id: i64,
    pub trip_id: i64,
    pub wave_number: i32,
    pub rider_display_name: String,
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    pub drop_lat: f64,
    pub drop_lng: f64,
    pub fare_amount: BigDecimal,
    pub sent_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// View of a single attempt, returned on rejection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptView {
    pub attempt_id: i64,
    pub trip_id: i64,
    pub wave_number: i32,
    pub response: AttemptResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responded_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_response_round_trip() {
        for response in [
            AttemptResponse::PendingWave(1),
            AttemptResponse::PendingWave(3),
            AttemptResponse::Accepted,
            AttemptResponse::Rejected,
            AttemptResponse::Cancelled,
            AttemptResponse::Timeout,
        ] {
            assert_eq!(
                response
                    .as_db_string()
                    .parse::<AttemptResponse>()
                    .unwrap(),
                response
            );
        }
        assert!("PENDING_WAVE_X".parse::<AttemptResponse>().is_err());
        assert!("SENT".parse::<AttemptResponse>().is_err());
    }

    #[test]
    fn test_pending_detection() {
        assert!(AttemptResponse::PendingWave(2).is_pending());
        assert!(!AttemptResponse::Accepted.is_pending());
        assert!(!AttemptResponse::Timeout.is_pending());
    }

    #[test]
    fn test_offer_liveness() {
        let now = Utc::now();
        let attempt = DispatchAttempt {
            attempt_id: 1,
            trip_id: 2,
            driver_id: 3,
            wave_number: 1,
            sent_at: now - Duration::seconds(10),
            responded_at: None,
            response: AttemptResponse::PendingWave(1),
        };
        assert!(attempt.is_live(now, 15));
        assert!(!attempt.is_live(now + Duration::seconds(10), 15));

        let responded = DispatchAttempt {
            response: AttemptResponse::Rejected,
            responded_at: Some(now),
            ..attempt
        };
        assert!(!responded.is_live(now, 15));
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = AdvanceOutcome::WaveCreated {
            wave: 2,
            radius_km: 5.0,
            attempts: 3,
        };
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("\"outcome\":\"WAVE_CREATED\""));
        assert!(json.contains("\"wave\":2"));
    }
}
