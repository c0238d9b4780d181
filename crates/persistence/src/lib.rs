//! Persistence layer for the RideLink backend.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations
//!
//! The relational store is the system of record. Multi-step invariants
//! (atomic assignment, shift transitions, location ingest) run inside
//! explicit transactions; repository functions that participate accept a
//! `&mut PgConnection` instead of the pool.

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
