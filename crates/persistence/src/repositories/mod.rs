//! Repository implementations.
//!
//! Each repository owns the SQL for one aggregate. Methods that must commit
//! together with other writes take a `&mut PgConnection` so the caller
//! controls the transaction boundary; plain reads go through the pool.

pub mod city;
pub mod dispatch;
pub mod driver;
pub mod fare_config;
pub mod fleet;
pub mod location;
pub mod shift;
pub mod surge_zone;
pub mod trip;
pub mod user;
pub mod vehicle;

pub use city::CityRepository;
pub use dispatch::DispatchRepository;
pub use driver::DriverRepository;
pub use fare_config::FareConfigRepository;
pub use fleet::FleetRepository;
pub use location::LocationRepository;
pub use shift::ShiftRepository;
pub use surge_zone::SurgeZoneRepository;
pub use trip::TripRepository;
pub use user::UserRepository;
pub use vehicle::VehicleRepository;
