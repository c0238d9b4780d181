//! Geo index TTL eviction.
//!
//! Reads already skip stale entries; this job reclaims their memory so a
//! fleet of crashed driver apps does not grow the index without bound.

use std::sync::Arc;

use super::scheduler::{Job, JobFrequency};
use crate::services::geo_index::DriverGeoIndex;

pub struct GeoIndexEvictionJob {
    geo_index: Arc<DriverGeoIndex>,
}

impl GeoIndexEvictionJob {
    pub fn new(geo_index: Arc<DriverGeoIndex>) -> Self {
        Self { geo_index }
    }
}

#[async_trait::async_trait]
impl Job for GeoIndexEvictionJob {
    fn name(&self) -> &'static str {
        "geo_index_eviction"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(1)
    }

    async fn execute(&self) -> Result<(), String> {
        let evicted = self.geo_index.evict_stale();
        if evicted > 0 {
            tracing::info!(evicted, "Evicted stale geo index entries");
        }
        Ok(())
    }
}
