//! Dispatch attempt entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use domain::models::dispatch::{AttemptResponse, DispatchAttempt};

#[derive(Debug, Clone, FromRow)]
pub struct DispatchAttemptEntity {
    pub attempt_id: i64,
    pub trip_id: i64,
    pub driver_id: i64,
    pub wave_number: i32,
    pub sent_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub response: String,
}

impl DispatchAttemptEntity {
    pub fn into_domain(self) -> DispatchAttempt {
        // An unparseable response is treated as terminal so it can never be
        // accepted.
        let response = self
            .response
            .parse::<AttemptResponse>()
            .unwrap_or(AttemptResponse::Cancelled);

        DispatchAttempt {
            attempt_id: self.attempt_id,
            trip_id: self.trip_id,
            driver_id: self.driver_id,
            wave_number: self.wave_number,
            sent_at: self.sent_at,
            responded_at: self.responded_at,
            response,
        }
    }
}

impl From<DispatchAttemptEntity> for DispatchAttempt {
    fn from(entity: DispatchAttemptEntity) -> Self {
        entity.into_domain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_wave_parsed() {
        let entity = DispatchAttemptEntity {
            attempt_id: 1,
            trip_id: 2,
            driver_id: 3,
            wave_number: 2,
            sent_at: Utc::now(),
            responded_at: None,
            response: "PENDING_WAVE_2".to_string(),
        };
        let attempt = entity.into_domain();
        assert_eq!(attempt.response, AttemptResponse::PendingWave(2));
        assert!(attempt.response.is_pending());
    }

    #[test]
    fn test_unknown_response_is_terminal() {
        let entity = DispatchAttemptEntity {
            attempt_id: 1,
            trip_id: 2,
            driver_id: 3,
            wave_number: 1,
            sent_at: Utc::now(),
            responded_at: None,
            response: "SENT".to_string(),
        };
        assert!(!entity.into_domain().response.is_pending());
    }
}
