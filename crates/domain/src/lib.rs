//! Domain layer for the RideLink backend.
//!
//! This crate contains:
//! - Domain models (tenants, cities, fares, drivers, vehicles, shifts, trips,
//!   dispatch attempts)
//! - The closed error taxonomy surfaced by every engine operation
//! - Pure business services (fare math, rider-name masking, the dispatch
//!   notification contract)

pub mod error;
pub mod models;
pub mod services;
