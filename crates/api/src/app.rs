use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use domain::services::DispatchNotifier;

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware};
use crate::routes::{dispatch, drivers, health, offers, trips};
use crate::services::{
    DispatchService, DriverGeoIndex, DriverRuntimeService, FareService, GeoResolver,
    LocationIngestService, LogNotifier, TripLifecycleService,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    /// Live driver positions (cache over `driver_locations`).
    pub geo_index: Arc<DriverGeoIndex>,
    /// Offer delivery channel to drivers.
    pub notifier: Arc<dyn DispatchNotifier>,
}

impl AppState {
    pub fn new(config: Config, pool: PgPool) -> Self {
        let geo_index = Arc::new(DriverGeoIndex::new(config.location.ttl_minutes));
        Self {
            pool,
            config: Arc::new(config),
            geo_index,
            notifier: Arc::new(LogNotifier),
        }
    }

    pub fn resolver(&self) -> GeoResolver {
        GeoResolver::new(self.pool.clone())
    }

    pub fn fare(&self) -> FareService {
        FareService::new(self.pool.clone(), self.resolver(), Arc::clone(&self.config))
    }

    pub fn driver_runtime(&self) -> DriverRuntimeService {
        DriverRuntimeService::new(self.pool.clone(), Arc::clone(&self.geo_index))
    }

    pub fn location_ingest(&self) -> LocationIngestService {
        LocationIngestService::new(self.pool.clone(), Arc::clone(&self.geo_index))
    }

    pub fn dispatch(&self) -> DispatchService {
        DispatchService::new(
            self.pool.clone(),
            Arc::clone(&self.config),
            Arc::clone(&self.geo_index),
            Arc::clone(&self.notifier),
        )
    }

    pub fn trip_lifecycle(&self) -> TripLifecycleService {
        TripLifecycleService::new(
            self.pool.clone(),
            Arc::clone(&self.config),
            self.resolver(),
            self.fare(),
            self.dispatch(),
            Arc::clone(&self.notifier),
        )
    }
}

/// Convenience constructor: state plus router in one call.
pub fn create_app(config: Config, pool: PgPool) -> Router {
    create_router(AppState::new(config, pool))
}

pub fn create_router(state: AppState) -> Router {
    let request_timeout = Duration::from_secs(state.config.server.request_timeout_secs);

    let api = Router::new()
        // Rider trip surface
        .route("/trips", post(trips::create_trip))
        .route("/trips/estimate", post(trips::estimate_fare))
        .route("/trips/validate-location", post(trips::validate_location))
        .route("/trips/:trip_id", get(trips::get_trip))
        .route("/trips/:trip_id/cancel", post(trips::cancel_trip))
        .route("/trips/:trip_id/otp", post(trips::rider_generate_otp))
        // Driver trip surface
        .route("/trips/:trip_id/arrive", post(trips::driver_arrive))
        .route("/trips/:trip_id/otp/verify", post(trips::driver_verify_otp))
        .route("/trips/:trip_id/pickup", post(trips::driver_pickup))
        .route("/trips/:trip_id/complete", post(trips::driver_complete))
        // Driver runtime
        .route("/drivers/location", post(drivers::update_location))
        .route("/drivers/shift/start", post(drivers::start_shift))
        .route("/drivers/shift/end", post(drivers::end_shift))
        .route("/drivers/shift", get(drivers::shift_status))
        .route("/drivers/readiness", get(drivers::readiness))
        .route("/drivers/assignment/end", post(drivers::end_assignment))
        // Dispatch offers
        .route("/drivers/offers", get(offers::list_pending_offers))
        .route("/offers/:attempt_id/accept", post(offers::accept_offer))
        .route("/offers/:attempt_id/reject", post(offers::reject_offer))
        // Orchestration
        .route(
            "/dispatch/trips/:trip_id/advance",
            post(dispatch::advance_wave),
        );

    Router::new()
        .nest("/api/v1", api)
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness))
        .route("/metrics", get(metrics_handler))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(CompressionLayer::new())
        .with_state(state)
}
