//! Dispatch notification contract.
//!
//! The engine treats driver notification as an effect interface: it builds
//! the payload and hands it to a `DispatchNotifier`. Delivery transport
//! (push, socket, SMS fallback) is an external collaborator; drivers can
//! always poll their pending offers as a fallback.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Payload of a new-offer notification.
///
/// Carries the masked rider name only; a driver never sees another rider's
/// or driver's identity through dispatch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferNotification {
    pub attempt_id: i64,
    pub trip_id: i64,
    pub wave_number: i32,
    pub rider_display_name: String,
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    pub drop_lat: f64,
    pub drop_lng: f64,
    pub fare_amount: BigDecimal,
    pub distance_to_pickup_km: f64,
    pub expires_at: DateTime<Utc>,
}

/// Effect interface for pushing dispatch events to drivers.
#[async_trait::async_trait]
pub trait DispatchNotifier: Send + Sync {
    /// A new offer was created for the driver.
    async fn offer_created(&self, driver_id: i64, offer: OfferNotification);

    /// A previously sent offer is no longer actionable (trip assigned
    /// elsewhere or cancelled).
    async fn offer_revoked(&self, driver_id: i64, attempt_id: i64, trip_id: i64);
}

/// In-memory notifier that records calls. Used by tests.
#[derive(Default)]
pub struct MockDispatchNotifier {
    offers: std::sync::Mutex<Vec<(i64, OfferNotification)>>,
    revocations: std::sync::Mutex<Vec<(i64, i64)>>,
}

impl MockDispatchNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offered_driver_ids(&self) -> Vec<i64> {
        self.offers
            .lock()
            .unwrap()
            .iter()
            .map(|(driver_id, _)| *driver_id)
            .collect()
    }

    pub fn revoked_attempt_ids(&self) -> Vec<i64> {
        self.revocations
            .lock()
            .unwrap()
            .iter()
            .map(|(_, attempt_id)| *attempt_id)
            .collect()
    }
}

#[async_trait::async_trait]
impl DispatchNotifier for MockDispatchNotifier {
    async fn offer_created(&self, driver_id: i64, offer: OfferNotification) {
        self.offers.lock().unwrap().push((driver_id, offer));
    }

    async fn offer_revoked(&self, driver_id: i64, attempt_id: i64, _trip_id: i64) {
        self.revocations.lock().unwrap().push((driver_id, attempt_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn offer(attempt_id: i64) -> OfferNotification {
        OfferNotification {
            attempt_id,
            trip_id: 10,
            wave_number: 1,
            rider_display_name: "Asha R.".to_string(),
            pickup_lat: 12.9716,
            pickup_lng: 77.5946,
            drop_lat: 12.9352,
            drop_lng: 77.6245,
            fare_amount: BigDecimal::from_str("112.00").unwrap(),
            distance_to_pickup_km: 0.4,
            expires_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_mock_records_offers_and_revocations() {
        let notifier = MockDispatchNotifier::new();
        notifier.offer_created(7, offer(100)).await;
        notifier.offer_created(8, offer(101)).await;
        notifier.offer_revoked(8, 101, 10).await;

        assert_eq!(notifier.offered_driver_ids(), vec![7, 8]);
        assert_eq!(notifier.revoked_attempt_ids(), vec![101]);
    }

    #[test]
    fn test_payload_masks_identity() {
        let json = serde_json::to_string(&offer(1)).unwrap();
        assert!(json.contains("Asha R."));
        assert!(!json.contains("riderId"));
    }
}
