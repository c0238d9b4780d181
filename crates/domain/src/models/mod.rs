//! Domain models.

pub mod city;
pub mod dispatch;
pub mod driver;
pub mod fare;
pub mod fleet;
pub mod location;
pub mod shift;
pub mod surge_zone;
pub mod tenant;
pub mod trip;
pub mod user;
pub mod vehicle;

pub use city::City;
pub use dispatch::{AdvanceOutcome, AttemptResponse, DispatchAttempt, DispatchOutcome};
pub use driver::{ApprovalStatus, DriverProfile};
pub use fare::{FareBreakdown, FareConfig};
pub use fleet::{Fleet, FleetDriver};
pub use location::{DriverLocation, DriverLocationHistory};
pub use shift::{DriverShift, ShiftStatus};
pub use surge_zone::SurgeZone;
pub use tenant::Tenant;
pub use trip::{Trip, TripStatus};
pub use user::{AppUser, Caller, Role, UserStatus};
pub use vehicle::{DocumentType, DriverVehicleAssignment, Vehicle, VehicleCategory};
