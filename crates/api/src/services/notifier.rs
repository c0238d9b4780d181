//! Default dispatch notifier.
//!
//! Emits structured log events for offer lifecycle. A production deployment
//! plugs a push transport in behind the same trait; drivers polling their
//! pending offers keeps working either way.

use domain::services::{DispatchNotifier, OfferNotification};

pub struct LogNotifier;

#[async_trait::async_trait]
impl DispatchNotifier for LogNotifier {
    async fn offer_created(&self, driver_id: i64, offer: OfferNotification) {
        tracing::info!(
            driver_id,
            attempt_id = offer.attempt_id,
            trip_id = offer.trip_id,
            wave = offer.wave_number,
            rider = %offer.rider_display_name,
            distance_km = offer.distance_to_pickup_km,
            "Dispatch offer sent"
        );
    }

    async fn offer_revoked(&self, driver_id: i64, attempt_id: i64, trip_id: i64) {
        tracing::info!(driver_id, attempt_id, trip_id, "Dispatch offer revoked");
    }
}
