//! Engine services.
//!
//! These orchestrate repositories, the live geo index and the notifier into
//! the operations the caller adapter exposes. Pure logic (fare math, name
//! masking, state machines) lives in the domain crate; everything here may
//! suspend on the database.

pub mod dispatch;
pub mod driver_runtime;
pub mod fare;
pub mod geo_index;
pub mod geo_resolver;
pub mod location_ingest;
pub mod notifier;
pub mod trip_lifecycle;

pub use dispatch::DispatchService;
pub use driver_runtime::DriverRuntimeService;
pub use fare::FareService;
pub use geo_index::DriverGeoIndex;
pub use geo_resolver::GeoResolver;
pub use location_ingest::LocationIngestService;
pub use notifier::LogNotifier;
pub use trip_lifecycle::TripLifecycleService;
