//! The dispatch engine: wave-based driver matching with atomic first-wins
//! assignment.
//!
//! A trip is offered to at most `batch_size` drivers per wave, all in
//! parallel. Waves expand the search radius until `max_waves` is exhausted,
//! at which point the trip is cancelled. Offers live for
//! `offer_timeout_seconds`; wave advancement is driven by callers (the
//! sweeper job or an orchestrator hitting the advance endpoint), never by an
//! engine-owned timer.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;

use domain::error::ErrorKind;
use domain::models::dispatch::{
    AdvanceOutcome, AttemptResponse, AttemptView, Candidate, DispatchOutcome, OfferView,
};
use domain::models::trip::{Trip, TripStatus};
use domain::models::vehicle::VehicleCategory;
use domain::services::masking::mask_rider_name;
use domain::services::{DispatchNotifier, OfferNotification};
use persistence::repositories::{
    DispatchRepository, DriverRepository, ShiftRepository, TripRepository, UserRepository,
    VehicleRepository,
};
use shared::geo::haversine_km;

use crate::config::Config;
use crate::services::driver_runtime::DriverRuntimeService;
use crate::services::geo_index::DriverGeoIndex;

#[derive(Clone)]
pub struct DispatchService {
    pool: PgPool,
    config: Arc<Config>,
    geo_index: Arc<DriverGeoIndex>,
    notifier: Arc<dyn DispatchNotifier>,
    drivers: DriverRepository,
    trips: TripRepository,
    attempts: DispatchRepository,
    users: UserRepository,
}

impl DispatchService {
    pub fn new(
        pool: PgPool,
        config: Arc<Config>,
        geo_index: Arc<DriverGeoIndex>,
        notifier: Arc<dyn DispatchNotifier>,
    ) -> Self {
        Self {
            drivers: DriverRepository::new(pool.clone()),
            trips: TripRepository::new(pool.clone()),
            attempts: DispatchRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            pool,
            config,
            geo_index,
            notifier,
        }
    }

    fn offer_timeout(&self) -> Duration {
        Duration::seconds(self.config.dispatch.offer_timeout_seconds)
    }

    // ------------------------------------------------------------------
    // Eligibility
    // ------------------------------------------------------------------

    /// Candidate drivers for a trip at a given radius, nearest first.
    ///
    /// The live geo index answers the radius query when it has fresh
    /// entries; otherwise every approved ONLINE driver's durable position is
    /// scanned. Either way the database decides eligibility (approval,
    /// shift, assignment, category) and `exclude` drops drivers already
    /// offered this trip.
    async fn find_candidates(
        &self,
        pickup_lat: f64,
        pickup_lng: f64,
        category: VehicleCategory,
        radius_km: f64,
        exclude: &[i64],
    ) -> Result<Vec<Candidate>, ErrorKind> {
        let hits = self
            .geo_index
            .within(pickup_lng, pickup_lat, radius_km, None);

        let mut candidates = if hits.is_empty() {
            // Cold start or empty index: fall back to durable last-known
            // positions and do the radius filter in memory.
            let rows = self
                .drivers
                .list_online_for_category(category.as_str(), exclude)
                .await
                .map_err(ErrorKind::internal)?;

            rows.into_iter()
                .filter(|row| row.serves(category))
                .filter_map(|row| {
                    let distance_km =
                        haversine_km(pickup_lat, pickup_lng, row.latitude, row.longitude);
                    (distance_km <= radius_km).then_some(Candidate {
                        driver_id: row.driver_id,
                        distance_km,
                    })
                })
                .collect::<Vec<_>>()
        } else {
            let distances: HashMap<i64, f64> = hits
                .iter()
                .map(|hit| (hit.driver_id, hit.distance_km))
                .collect();
            let ids: Vec<i64> = hits.iter().map(|hit| hit.driver_id).collect();

            let rows = self
                .drivers
                .list_eligible_among(&ids, category.as_str(), exclude)
                .await
                .map_err(ErrorKind::internal)?;

            rows.into_iter()
                .filter(|row| row.serves(category))
                .filter_map(|row| {
                    distances.get(&row.driver_id).map(|&distance_km| Candidate {
                        driver_id: row.driver_id,
                        distance_km,
                    })
                })
                .collect::<Vec<_>>()
        };

        candidates.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
        Ok(candidates)
    }

    // ------------------------------------------------------------------
    // Waves
    // ------------------------------------------------------------------

    /// Create the attempts of one wave and notify the offered drivers.
    async fn create_wave(
        &self,
        trip: &Trip,
        wave: i32,
        candidates: &[Candidate],
    ) -> Result<usize, ErrorKind> {
        let batch: Vec<Candidate> = candidates
            .iter()
            .copied()
            .take(self.config.dispatch.batch_size)
            .collect();
        let driver_ids: Vec<i64> = batch.iter().map(|c| c.driver_id).collect();

        let rider_name = self
            .users
            .find_by_id(trip.rider_id)
            .await
            .map_err(ErrorKind::internal)?
            .map(|user| user.full_name)
            .unwrap_or_default();
        let display_name = mask_rider_name(&rider_name);

        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(ErrorKind::internal)?;
        let attempts = DispatchRepository::insert_attempts(
            &mut tx,
            trip.trip_id,
            &driver_ids,
            wave,
            now,
        )
        .await
        .map_err(ErrorKind::internal)?;
        tx.commit().await.map_err(ErrorKind::internal)?;

        // Offers go out after the attempts are durable. All drivers of the
        // wave are notified at once; first acceptance wins.
        let expires_at = now + self.offer_timeout();
        for (attempt, candidate) in attempts.iter().zip(batch.iter()) {
            self.notifier
                .offer_created(
                    candidate.driver_id,
                    OfferNotification {
                        attempt_id: attempt.attempt_id,
                        trip_id: trip.trip_id,
                        wave_number: wave,
                        rider_display_name: display_name.clone(),
                        pickup_lat: trip.pickup_lat,
                        pickup_lng: trip.pickup_lng,
                        drop_lat: trip.drop_lat,
                        drop_lng: trip.drop_lng,
                        fare_amount: trip.fare_amount.clone(),
                        distance_to_pickup_km: candidate.distance_km,
                        expires_at,
                    },
                )
                .await;
        }

        tracing::info!(
            trip_id = trip.trip_id,
            wave,
            attempts = attempts.len(),
            "Dispatch wave created"
        );
        Ok(attempts.len())
    }

    /// Start dispatching a freshly created trip (wave 1).
    ///
    /// Never cancels the trip: when wave 1 finds nobody the trip stays
    /// DISPATCHING and `advance_wave` owns progression and exhaustion.
    pub async fn dispatch_trip(&self, trip: &Trip) -> Result<DispatchOutcome, ErrorKind> {
        let trip = match self
            .trips
            .set_dispatching(trip.trip_id)
            .await
            .map_err(ErrorKind::internal)?
        {
            Some(entity) => entity.into_domain(),
            None => {
                // Not REQUESTED anymore; only an already-dispatching trip is
                // acceptable here (idempotent re-dispatch).
                let current = self
                    .trips
                    .find_by_id(trip.trip_id)
                    .await
                    .map_err(ErrorKind::internal)?
                    .ok_or(ErrorKind::NotFound {
                        entity: "trip",
                        id: trip.trip_id,
                    })?
                    .into_domain();
                if current.status != TripStatus::Dispatching {
                    return Err(ErrorKind::IllegalTransition {
                        entity: "trip",
                        from: current.status.to_string(),
                        to: TripStatus::Dispatching.to_string(),
                    });
                }
                current
            }
        };

        let radius_km = self.config.dispatch.radius_for_wave(1);
        let attempted = self
            .attempts
            .attempted_driver_ids(trip.trip_id)
            .await
            .map_err(ErrorKind::internal)?;
        let candidates = self
            .find_candidates(
                trip.pickup_lat,
                trip.pickup_lng,
                trip.vehicle_category,
                radius_km,
                &attempted,
            )
            .await?;

        // Wave 1 has been searched whether or not it found anyone; empty
        // waves still move the expanding-radius sequence forward.
        self.trips
            .record_searched_wave(trip.trip_id, 1)
            .await
            .map_err(ErrorKind::internal)?;

        if candidates.is_empty() {
            tracing::info!(trip_id = trip.trip_id, radius_km, "No drivers in wave 1");
            return Ok(DispatchOutcome::NoDriversInRadius { wave: 1, radius_km });
        }

        let attempts = self.create_wave(&trip, 1, &candidates).await?;
        Ok(DispatchOutcome::WaveCreated {
            wave: 1,
            radius_km,
            attempts,
        })
    }

    /// Advance a trip's dispatch by at most one wave.
    ///
    /// Evaluated strictly in order: missing trip, already assigned, not
    /// dispatching, live offers outstanding, waves exhausted, empty next
    /// wave, and finally wave creation.
    pub async fn advance_wave(&self, trip_id: i64) -> Result<AdvanceOutcome, ErrorKind> {
        let trip = self
            .trips
            .find_by_id(trip_id)
            .await
            .map_err(ErrorKind::internal)?
            .ok_or(ErrorKind::NotFound {
                entity: "trip",
                id: trip_id,
            })?
            .into_domain();

        if trip.driver_id.is_some() {
            return Ok(AdvanceOutcome::AlreadyAssigned {
                status: trip.status.to_string(),
            });
        }

        if trip.status != TripStatus::Dispatching {
            return Ok(AdvanceOutcome::NoAction {
                reason: format!("trip status is {}", trip.status),
                current_wave: None,
            });
        }

        let now = Utc::now();
        let cutoff = now - self.offer_timeout();

        // Expired offers become TIMEOUT before the liveness check.
        let swept = self
            .attempts
            .timeout_expired(trip_id, cutoff, now)
            .await
            .map_err(ErrorKind::internal)?;
        if swept > 0 {
            tracing::debug!(trip_id, swept, "Timed out expired offers");
        }

        let current_wave = self
            .attempts
            .current_wave(trip_id)
            .await
            .map_err(ErrorKind::internal)?;

        if self
            .attempts
            .has_live_pending(trip_id, cutoff)
            .await
            .map_err(ErrorKind::internal)?
        {
            return Ok(AdvanceOutcome::NoAction {
                reason: "pending offers remain".to_string(),
                current_wave: Some(current_wave),
            });
        }

        // `current_wave` counts waves that produced offers; the searched
        // counter also covers empty waves, so retries keep expanding the
        // radius instead of rescanning the same ring forever.
        let searched_wave = current_wave.max(trip.dispatch_wave);
        let next_wave = searched_wave + 1;
        if self.config.dispatch.is_exhausted(current_wave, next_wave) {
            if !self.cancel_exhausted(trip_id).await? {
                // A driver accepted while we were deciding; their win stands.
                return Ok(AdvanceOutcome::NoAction {
                    reason: "trip changed during exhaustion check".to_string(),
                    current_wave: Some(current_wave),
                });
            }
            tracing::info!(trip_id, waves = current_wave, "Dispatch exhausted");
            return Ok(AdvanceOutcome::DispatchExhausted {
                waves: current_wave,
            });
        }

        let radius_km = self.config.dispatch.radius_for_wave(next_wave);
        let attempted = self
            .attempts
            .attempted_driver_ids(trip_id)
            .await
            .map_err(ErrorKind::internal)?;
        let candidates = self
            .find_candidates(
                trip.pickup_lat,
                trip.pickup_lng,
                trip.vehicle_category,
                radius_km,
                &attempted,
            )
            .await?;

        self.trips
            .record_searched_wave(trip_id, next_wave)
            .await
            .map_err(ErrorKind::internal)?;

        if candidates.is_empty() {
            // The trip stays DISPATCHING; the caller may retry and a later
            // ping may bring a driver into range.
            return Ok(AdvanceOutcome::NoDriversInRadius {
                wave: next_wave,
                radius_km,
            });
        }

        let attempts = self.create_wave(&trip, next_wave, &candidates).await?;
        Ok(AdvanceOutcome::WaveCreated {
            wave: next_wave,
            radius_km,
            attempts,
        })
    }

    /// All waves spent: cancel the trip and any leftover pending attempts.
    /// Returns false when the trip was assigned in the meantime (the cancel
    /// is guarded on `driver_id IS NULL`, so an acceptance always wins).
    async fn cancel_exhausted(&self, trip_id: i64) -> Result<bool, ErrorKind> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(ErrorKind::internal)?;

        let cancelled = TripRepository::cancel_if_unassigned(&mut tx, trip_id, now)
            .await
            .map_err(ErrorKind::internal)?;
        if cancelled.is_none() {
            return Ok(false);
        }

        let revoked =
            DispatchRepository::cancel_pending_for_trip(&mut tx, trip_id, None, now)
                .await
                .map_err(ErrorKind::internal)?;

        tx.commit().await.map_err(ErrorKind::internal)?;

        for attempt in revoked {
            self.notifier
                .offer_revoked(attempt.driver_id, attempt.attempt_id, trip_id)
                .await;
        }
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Driver responses
    // ------------------------------------------------------------------

    /// Accept an offer. Atomic first-wins: across all parallel attempts of a
    /// trip at most one acceptance succeeds, decided by the compare-and-set
    /// on `trips.driver_id IS NULL`. Losers observe `AlreadyAssigned` and no
    /// partial state.
    pub async fn accept_offer(
        &self,
        attempt_id: i64,
        driver_id: i64,
    ) -> Result<Trip, ErrorKind> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(ErrorKind::internal)?;

        // Shift transitions for this driver are serialised with the rest of
        // the driver runtime.
        ShiftRepository::lock_driver(&mut tx, driver_id)
            .await
            .map_err(ErrorKind::internal)?;

        let attempt = DispatchRepository::find_by_id_for_update(&mut tx, attempt_id)
            .await
            .map_err(ErrorKind::internal)?
            .ok_or(ErrorKind::NotFound {
                entity: "dispatch_attempt",
                id: attempt_id,
            })?
            .into_domain();

        if attempt.driver_id != driver_id {
            return Err(ErrorKind::forbidden("Offer does not belong to caller"));
        }
        if !attempt.response.is_pending() {
            return Err(ErrorKind::AlreadyResponded {
                attempt_id,
                prior: attempt.response.as_db_string(),
            });
        }
        if !attempt.is_live(now, self.config.dispatch.offer_timeout_seconds) {
            // Late response: the offer is semantically dead even though the
            // sweeper has not caught it yet.
            DispatchRepository::mark_response(
                &mut tx,
                attempt_id,
                &AttemptResponse::Timeout.as_db_string(),
                now,
            )
            .await
            .map_err(ErrorKind::internal)?;
            tx.commit().await.map_err(ErrorKind::internal)?;
            return Err(ErrorKind::OfferExpired { attempt_id });
        }

        let trip = TripRepository::find_by_id_in_tx(&mut tx, attempt.trip_id)
            .await
            .map_err(ErrorKind::internal)?
            .ok_or(ErrorKind::NotFound {
                entity: "trip",
                id: attempt.trip_id,
            })?
            .into_domain();
        if trip.status != TripStatus::Dispatching || trip.driver_id.is_some() {
            return Err(ErrorKind::AlreadyAssigned {
                trip_id: attempt.trip_id,
            });
        }

        let profile = DriverRepository::find_profile_in_tx(&mut tx, driver_id)
            .await
            .map_err(ErrorKind::internal)?
            .ok_or(ErrorKind::NotFound {
                entity: "driver_profile",
                id: driver_id,
            })?
            .into_domain();
        let assignment = VehicleRepository::find_open_assignment_in_tx(&mut tx, driver_id)
            .await
            .map_err(ErrorKind::internal)?
            .ok_or_else(|| {
                ErrorKind::precondition(domain::error::PreconditionKind::NoActiveVehicle)
            })?
            .into_domain();

        // The CAS. `None` means another driver won while we were validating.
        let assigned = TripRepository::try_assign(
            &mut tx,
            attempt.trip_id,
            driver_id,
            profile.tenant_id,
            assignment.vehicle_id,
            now,
        )
        .await
        .map_err(ErrorKind::internal)?
        .ok_or(ErrorKind::AlreadyAssigned {
            trip_id: attempt.trip_id,
        })?
        .into_domain();

        DispatchRepository::mark_response(
            &mut tx,
            attempt_id,
            &AttemptResponse::Accepted.as_db_string(),
            now,
        )
        .await
        .map_err(ErrorKind::internal)?
        .ok_or(ErrorKind::AlreadyResponded {
            attempt_id,
            prior: "unknown".to_string(),
        })?;

        DriverRuntimeService::mark_busy(&mut tx, driver_id).await?;

        let revoked = DispatchRepository::cancel_pending_for_trip(
            &mut tx,
            attempt.trip_id,
            Some(attempt_id),
            now,
        )
        .await
        .map_err(ErrorKind::internal)?;

        tx.commit().await.map_err(ErrorKind::internal)?;

        for sibling in revoked {
            self.notifier
                .offer_revoked(sibling.driver_id, sibling.attempt_id, attempt.trip_id)
                .await;
        }

        tracing::info!(
            trip_id = assigned.trip_id,
            driver_id,
            attempt_id,
            "Trip assigned"
        );
        Ok(assigned)
    }

    /// Reject an offer. Never touches the trip; wave progression is the next
    /// `advance_wave` call's concern.
    pub async fn reject_offer(
        &self,
        attempt_id: i64,
        driver_id: i64,
    ) -> Result<AttemptView, ErrorKind> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(ErrorKind::internal)?;

        let attempt = DispatchRepository::find_by_id_for_update(&mut tx, attempt_id)
            .await
            .map_err(ErrorKind::internal)?
            .ok_or(ErrorKind::NotFound {
                entity: "dispatch_attempt",
                id: attempt_id,
            })?
            .into_domain();

        if attempt.driver_id != driver_id {
            return Err(ErrorKind::forbidden("Offer does not belong to caller"));
        }
        if !attempt.response.is_pending() {
            return Err(ErrorKind::AlreadyResponded {
                attempt_id,
                prior: attempt.response.as_db_string(),
            });
        }

        let response = if attempt.is_live(now, self.config.dispatch.offer_timeout_seconds) {
            AttemptResponse::Rejected
        } else {
            AttemptResponse::Timeout
        };
        let updated = DispatchRepository::mark_response(
            &mut tx,
            attempt_id,
            &response.as_db_string(),
            now,
        )
        .await
        .map_err(ErrorKind::internal)?
        .ok_or(ErrorKind::AlreadyResponded {
            attempt_id,
            prior: "unknown".to_string(),
        })?
        .into_domain();

        tx.commit().await.map_err(ErrorKind::internal)?;

        Ok(AttemptView {
            attempt_id: updated.attempt_id,
            trip_id: updated.trip_id,
            wave_number: updated.wave_number,
            response: updated.response,
            responded_at: updated.responded_at,
        })
    }

    /// A driver's live offers, with masked rider names. The polling
    /// fallback for deployments without a push channel.
    pub async fn list_pending_offers(
        &self,
        driver_id: i64,
    ) -> Result<Vec<OfferView>, ErrorKind> {
        let now = Utc::now();
        let cutoff = now - self.offer_timeout();

        let rows = self
            .attempts
            .list_pending_for_driver(driver_id, cutoff)
            .await
            .map_err(ErrorKind::internal)?;

        Ok(rows
            .into_iter()
            .map(|row| OfferView {
                attempt_id: row.attempt_id,
                trip_id: row.trip_id,
                wave_number: row.wave_number,
                rider_display_name: mask_rider_name(&row.rider_full_name),
                pickup_lat: row.pickup_lat,
                pickup_lng: row.pickup_lng,
                drop_lat: row.drop_lat,
                drop_lng: row.drop_lng,
                fare_amount: row.fare_amount,
                sent_at: row.sent_at,
                expires_at: row.sent_at + self.offer_timeout(),
            })
            .collect())
    }

    // ------------------------------------------------------------------
    // Sweeper
    // ------------------------------------------------------------------

    /// One sweep pass: advance every DISPATCHING trip whose offers have all
    /// gone terminal or stale. Called periodically by the background job.
    pub async fn sweep(&self) -> Result<usize, ErrorKind> {
        let cutoff = Utc::now() - self.offer_timeout();
        let stalled = self
            .attempts
            .list_stalled_dispatching_trips(cutoff, 100)
            .await
            .map_err(ErrorKind::internal)?;

        let mut advanced = 0;
        for trip_id in stalled {
            match self.advance_wave(trip_id).await {
                Ok(outcome) => {
                    advanced += 1;
                    tracing::debug!(trip_id, ?outcome, "Sweeper advanced trip");
                }
                Err(err) => {
                    tracing::warn!(trip_id, error = %err, "Sweeper failed to advance trip");
                }
            }
        }
        Ok(advanced)
    }
}
