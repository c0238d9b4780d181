//! Trip lifecycle: creation with a locked fare, driver-side transitions,
//! the pickup-OTP subsystem, and rider cancellation.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use domain::error::{ErrorKind, PreconditionKind};
use domain::models::dispatch::DispatchOutcome;
use domain::models::trip::{
    CreateTripRequest, DriverSummary, OtpIssued, OtpVerification, Trip, TripStatus, TripView,
    VehicleSummary,
};
use domain::models::user::Caller;
use domain::services::DispatchNotifier;
use persistence::repositories::trip::NewTrip;
use persistence::repositories::{
    DispatchRepository, ShiftRepository, TripRepository, UserRepository, VehicleRepository,
};

use crate::config::Config;
use crate::services::dispatch::DispatchService;
use crate::services::driver_runtime::DriverRuntimeService;
use crate::services::fare::FareService;
use crate::services::geo_resolver::GeoResolver;

/// Response of trip creation: the persisted trip plus the wave-1 outcome.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTripResponse {
    #[serde(flatten)]
    pub trip: TripView,
    pub dispatch: DispatchOutcome,
}

#[derive(Clone)]
pub struct TripLifecycleService {
    pool: PgPool,
    config: Arc<Config>,
    trips: TripRepository,
    users: UserRepository,
    vehicles: VehicleRepository,
    resolver: GeoResolver,
    fare: FareService,
    dispatch: DispatchService,
    notifier: Arc<dyn DispatchNotifier>,
}

impl TripLifecycleService {
    pub fn new(
        pool: PgPool,
        config: Arc<Config>,
        resolver: GeoResolver,
        fare: FareService,
        dispatch: DispatchService,
        notifier: Arc<dyn DispatchNotifier>,
    ) -> Self {
        Self {
            trips: TripRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            vehicles: VehicleRepository::new(pool.clone()),
            pool,
            config,
            resolver,
            fare,
            dispatch,
            notifier,
        }
    }

    /// Enrich a trip with driver and vehicle summaries where assigned.
    async fn view(&self, trip: &Trip) -> Result<TripView, ErrorKind> {
        let mut view = TripView::from_trip(trip);

        if let Some(driver_id) = trip.driver_id {
            view.driver = self
                .users
                .find_by_id(driver_id)
                .await
                .map_err(ErrorKind::internal)?
                .map(|user| DriverSummary {
                    driver_id,
                    full_name: user.full_name,
                    phone: user.phone,
                });
        }
        if let Some(vehicle_id) = trip.vehicle_id {
            view.vehicle = self
                .vehicles
                .find_by_id(vehicle_id)
                .await
                .map_err(ErrorKind::internal)?
                .map(|entity| {
                    let vehicle = entity.into_domain();
                    VehicleSummary {
                        vehicle_id,
                        category: vehicle.category,
                        registration_no: vehicle.registration_no,
                    }
                });
        }

        Ok(view)
    }

    /// Load a trip and check that the caller is its assigned driver.
    async fn trip_for_driver(&self, trip_id: i64, driver_id: i64) -> Result<Trip, ErrorKind> {
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

        if trip.driver_id != Some(driver_id) {
            return Err(ErrorKind::forbidden("Trip is not assigned to caller"));
        }
        Ok(trip)
    }

    // ------------------------------------------------------------------
    // Creation
    // ------------------------------------------------------------------

    /// Create a trip and start wave-1 dispatch.
    ///
    /// The fare is computed and locked here; later surge changes never touch
    /// a created trip.
    pub async fn create_trip(
        &self,
        rider: Caller,
        request: CreateTripRequest,
    ) -> Result<CreateTripResponse, ErrorKind> {
        let user = self
            .users
            .find_by_id(rider.user_id)
            .await
            .map_err(ErrorKind::internal)?
            .ok_or(ErrorKind::NotFound {
                entity: "user",
                id: rider.user_id,
            })?
            .into_domain();
        if !user.is_active() {
            return Err(ErrorKind::precondition(PreconditionKind::UserInactive));
        }

        if let Some(existing) = self
            .trips
            .find_active_for_rider(rider.user_id)
            .await
            .map_err(ErrorKind::internal)?
        {
            return Err(ErrorKind::precondition(PreconditionKind::ActiveTripExists(
                existing.trip_id,
            )));
        }

        let city = self
            .resolver
            .validate_trip_locations(
                request.pickup_lat,
                request.pickup_lng,
                request.drop_lat,
                request.drop_lng,
            )
            .await?;

        let now = Utc::now();
        let breakdown = self
            .fare
            .quote_for_city(
                city.city_id,
                request.vehicle_category,
                request.pickup_lat,
                request.pickup_lng,
                request.drop_lat,
                request.drop_lng,
                now,
            )
            .await?;

        let trip = self
            .trips
            .insert(NewTrip {
                rider_id: rider.user_id,
                city_id: city.city_id,
                surge_zone_id: breakdown.surge_zone_id,
                vehicle_category: request.vehicle_category.as_str().to_string(),
                pickup_lat: request.pickup_lat,
                pickup_lng: request.pickup_lng,
                drop_lat: request.drop_lat,
                drop_lng: request.drop_lng,
                fare_amount: breakdown.fare_amount.clone(),
                surge_multiplier: breakdown.surge_multiplier.clone(),
                requested_at: now,
            })
            .await
            .map_err(|err| match &err {
                // The partial unique index on active rider trips closes the
                // check-then-insert race.
                sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                    ErrorKind::AlreadyExists {
                        entity: "trip",
                        key: format!("rider {}", rider.user_id),
                    }
                }
                _ => ErrorKind::internal(err),
            })?
            .into_domain();

        tracing::info!(
            trip_id = trip.trip_id,
            rider_id = rider.user_id,
            city_id = city.city_id,
            fare = %trip.fare_amount,
            "Trip created"
        );

        let dispatch = self.dispatch.dispatch_trip(&trip).await?;

        let trip = self
            .trips
            .find_by_id(trip.trip_id)
            .await
            .map_err(ErrorKind::internal)?
            .ok_or(ErrorKind::NotFound {
                entity: "trip",
                id: trip.trip_id,
            })?
            .into_domain();

        Ok(CreateTripResponse {
            trip: self.view(&trip).await?,
            dispatch,
        })
    }

    /// Fetch a trip; only its rider or its assigned driver may see it.
    pub async fn get_trip(&self, trip_id: i64, caller: Caller) -> Result<TripView, ErrorKind> {
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

        let is_rider = trip.rider_id == caller.user_id;
        let is_driver = trip.driver_id == Some(caller.user_id);
        if !is_rider && !is_driver {
            return Err(ErrorKind::forbidden("Trip does not belong to caller"));
        }

        self.view(&trip).await
    }

    // ------------------------------------------------------------------
    // Cancellation
    // ------------------------------------------------------------------

    /// Rider-initiated cancellation. Allowed until pickup; frees the driver
    /// (BUSY -> ONLINE) and cancels outstanding offers atomically.
    ///
    /// The unassigned path cancels with a `driver_id IS NULL` guard. When
    /// that guard loses to a concurrent acceptance, one retry re-runs the
    /// assigned path, which takes the driver's advisory lock before touching
    /// the trip (the same lock order acceptance uses).
    pub async fn cancel_trip(&self, trip_id: i64, caller: Caller) -> Result<TripView, ErrorKind> {
        for _ in 0..2 {
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

            if trip.rider_id != caller.user_id {
                return Err(ErrorKind::forbidden("Trip does not belong to caller"));
            }
            if !trip.status.can_transition_to(TripStatus::Cancelled) {
                return Err(ErrorKind::IllegalTransition {
                    entity: "trip",
                    from: trip.status.to_string(),
                    to: TripStatus::Cancelled.to_string(),
                });
            }

            let now = Utc::now();
            let mut tx = self.pool.begin().await.map_err(ErrorKind::internal)?;

            if let Some(driver_id) = trip.driver_id {
                ShiftRepository::lock_driver(&mut tx, driver_id)
                    .await
                    .map_err(ErrorKind::internal)?;
            }

            let cancelled = if trip.driver_id.is_some() {
                TripRepository::cancel(&mut tx, trip_id, now)
                    .await
                    .map_err(ErrorKind::internal)?
            } else {
                TripRepository::cancel_if_unassigned(&mut tx, trip_id, now)
                    .await
                    .map_err(ErrorKind::internal)?
            };

            let cancelled = match cancelled {
                Some(entity) => entity.into_domain(),
                None => {
                    // Raced with assignment or another transition; re-read
                    // and take the other path.
                    drop(tx);
                    continue;
                }
            };

            let revoked =
                DispatchRepository::cancel_pending_for_trip(&mut tx, trip_id, None, now)
                    .await
                    .map_err(ErrorKind::internal)?;

            if let Some(driver_id) = trip.driver_id {
                DriverRuntimeService::mark_online(&mut tx, driver_id).await?;
            }

            tx.commit().await.map_err(ErrorKind::internal)?;

            for attempt in revoked {
                self.notifier
                    .offer_revoked(attempt.driver_id, attempt.attempt_id, trip_id)
                    .await;
            }

            tracing::info!(trip_id, rider_id = caller.user_id, "Trip cancelled by rider");
            return self.view(&cancelled).await;
        }

        Err(ErrorKind::internal(
            "trip changed concurrently during cancellation",
        ))
    }

    // ------------------------------------------------------------------
    // Driver-side transitions
    // ------------------------------------------------------------------

    /// ASSIGNED -> ARRIVED.
    pub async fn arrive(&self, trip_id: i64, driver_id: i64) -> Result<TripView, ErrorKind> {
        let trip = self.trip_for_driver(trip_id, driver_id).await?;

        let arrived = self
            .trips
            .mark_arrived(trip_id, driver_id, Utc::now())
            .await
            .map_err(ErrorKind::internal)?
            .ok_or(ErrorKind::IllegalTransition {
                entity: "trip",
                from: trip.status.to_string(),
                to: TripStatus::Arrived.to_string(),
            })?
            .into_domain();

        self.view(&arrived).await
    }

    /// ARRIVED -> PICKED_UP, gated on a verified pickup OTP.
    pub async fn pickup(&self, trip_id: i64, driver_id: i64) -> Result<TripView, ErrorKind> {
        let trip = self.trip_for_driver(trip_id, driver_id).await?;

        if trip.status == TripStatus::Arrived && !trip.pickup_otp.is_verified() {
            return Err(ErrorKind::forbidden("Pickup OTP not verified"));
        }

        let picked_up = self
            .trips
            .mark_picked_up(trip_id, driver_id, Utc::now())
            .await
            .map_err(ErrorKind::internal)?
            .ok_or(ErrorKind::IllegalTransition {
                entity: "trip",
                from: trip.status.to_string(),
                to: TripStatus::PickedUp.to_string(),
            })?
            .into_domain();

        self.view(&picked_up).await
    }

    /// PICKED_UP -> COMPLETED; the driver's shift returns to ONLINE in the
    /// same transaction.
    pub async fn complete(&self, trip_id: i64, driver_id: i64) -> Result<TripView, ErrorKind> {
        let trip = self.trip_for_driver(trip_id, driver_id).await?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(ErrorKind::internal)?;

        ShiftRepository::lock_driver(&mut tx, driver_id)
            .await
            .map_err(ErrorKind::internal)?;

        let completed = TripRepository::mark_completed(&mut tx, trip_id, driver_id, now)
            .await
            .map_err(ErrorKind::internal)?
            .ok_or(ErrorKind::IllegalTransition {
                entity: "trip",
                from: trip.status.to_string(),
                to: TripStatus::Completed.to_string(),
            })?
            .into_domain();

        DriverRuntimeService::mark_online(&mut tx, driver_id).await?;

        tx.commit().await.map_err(ErrorKind::internal)?;

        tracing::info!(trip_id, driver_id, "Trip completed");
        self.view(&completed).await
    }

    // ------------------------------------------------------------------
    // Pickup OTP
    // ------------------------------------------------------------------

    /// Rider issues a fresh pickup OTP. Resets the attempt counter and any
    /// prior verification.
    pub async fn generate_otp(&self, trip_id: i64, rider_id: i64) -> Result<OtpIssued, ErrorKind> {
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

        if trip.rider_id != rider_id {
            return Err(ErrorKind::forbidden("Trip does not belong to caller"));
        }
        if trip.status != TripStatus::Arrived {
            return Err(ErrorKind::IllegalTransition {
                entity: "pickup_otp",
                from: trip.status.to_string(),
                to: TripStatus::Arrived.to_string(),
            });
        }

        let code = shared::crypto::generate_numeric_otp(self.config.otp.length);
        let expires_at = Utc::now() + Duration::minutes(self.config.otp.ttl_minutes);

        self.trips
            .set_pickup_otp(trip_id, &code, expires_at)
            .await
            .map_err(ErrorKind::internal)?
            .ok_or(ErrorKind::IllegalTransition {
                entity: "pickup_otp",
                from: trip.status.to_string(),
                to: TripStatus::Arrived.to_string(),
            })?;

        Ok(OtpIssued {
            trip_id,
            otp: code,
            expires_at,
        })
    }

    /// Driver submits the OTP the rider read out. Comparison is
    /// constant-time; the attempt counter moves before the comparison, so
    /// the fourth attempt on one OTP fails even when the guess is right.
    pub async fn verify_otp(
        &self,
        trip_id: i64,
        driver_id: i64,
        entered_otp: &str,
    ) -> Result<OtpVerification, ErrorKind> {
        let trip = self.trip_for_driver(trip_id, driver_id).await?;

        if trip.status != TripStatus::Arrived {
            return Err(ErrorKind::IllegalTransition {
                entity: "pickup_otp",
                from: trip.status.to_string(),
                to: TripStatus::Arrived.to_string(),
            });
        }

        let now = Utc::now();
        let otp = &trip.pickup_otp;
        let code = otp
            .code
            .as_deref()
            .ok_or_else(|| ErrorKind::forbidden("No pickup OTP issued for this trip"))?;

        if otp.is_expired(now) {
            return Err(ErrorKind::forbidden(
                "Pickup OTP has expired; rider must generate a new one",
            ));
        }
        if otp.attempts_exhausted(self.config.otp.max_attempts) {
            return Err(ErrorKind::forbidden(
                "Maximum OTP attempts exceeded; rider must generate a new one",
            ));
        }

        let attempts = self
            .trips
            .increment_otp_attempts(trip_id)
            .await
            .map_err(ErrorKind::internal)?
            .ok_or(ErrorKind::NotFound {
                entity: "trip",
                id: trip_id,
            })?;

        if shared::crypto::constant_time_eq(entered_otp, code) {
            self.trips
                .set_otp_verified(trip_id, now)
                .await
                .map_err(ErrorKind::internal)?;
            Ok(OtpVerification {
                trip_id,
                verified: true,
                remaining_attempts: None,
            })
        } else {
            let remaining = (self.config.otp.max_attempts - attempts).max(0);
            Ok(OtpVerification {
                trip_id,
                verified: false,
                remaining_attempts: Some(remaining),
            })
        }
    }
}
