//! Shared utilities and common types for the RideLink backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Geographic primitives (haversine, point-in-polygon, GeoJSON parsing)
//! - Cryptographic utilities (OTP generation, constant-time comparison)
//! - Caller-identity token handling
//! - Common validation logic

pub mod crypto;
pub mod geo;
pub mod token;
pub mod validation;
