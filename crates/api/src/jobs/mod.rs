//! Background jobs.

pub mod geo_index_eviction;
pub mod offer_sweep;
pub mod pool_metrics;
pub mod scheduler;

pub use geo_index_eviction::GeoIndexEvictionJob;
pub use offer_sweep::OfferSweepJob;
pub use pool_metrics::PoolMetricsJob;
pub use scheduler::{Job, JobFrequency, JobScheduler};
