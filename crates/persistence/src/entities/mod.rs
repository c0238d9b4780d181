//! Entity definitions (database row mappings).

pub mod city;
pub mod dispatch_attempt;
pub mod driver;
pub mod fare_config;
pub mod fleet;
pub mod location;
pub mod shift;
pub mod surge_zone;
pub mod tenant;
pub mod trip;
pub mod user;
pub mod vehicle;

pub use city::CityEntity;
pub use dispatch_attempt::DispatchAttemptEntity;
pub use driver::{DriverProfileEntity, OnlineDriverRow};
pub use fare_config::FareConfigEntity;
pub use fleet::{FleetDriverEntity, FleetEntity};
pub use location::{DriverLocationEntity, DriverLocationHistoryEntity};
pub use shift::DriverShiftEntity;
pub use surge_zone::SurgeZoneEntity;
pub use tenant::TenantEntity;
pub use trip::TripEntity;
pub use user::AppUserEntity;
pub use vehicle::{DriverVehicleAssignmentEntity, VehicleEntity};
