//! Offer timeout sweeper.
//!
//! The engine owns no per-offer timers: the deadline is semantic
//! (`sent_at + offer_timeout`). This job is the adapter-side clock that
//! times out expired offers and advances waves for trips whose offers all
//! went terminal, including cancelling trips whose waves are exhausted.

use super::scheduler::{Job, JobFrequency};
use crate::services::DispatchService;

pub struct OfferSweepJob {
    dispatch: DispatchService,
    interval_seconds: u64,
}

impl OfferSweepJob {
    pub fn new(dispatch: DispatchService, interval_seconds: u64) -> Self {
        Self {
            dispatch,
            interval_seconds,
        }
    }
}

#[async_trait::async_trait]
impl Job for OfferSweepJob {
    fn name(&self) -> &'static str {
        "offer_sweep"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Seconds(self.interval_seconds)
    }

    async fn execute(&self) -> Result<(), String> {
        let advanced = self
            .dispatch
            .sweep()
            .await
            .map_err(|e| format!("Sweep failed: {}", e))?;

        if advanced > 0 {
            tracing::info!(advanced, "Offer sweep advanced dispatching trips");
        }
        Ok(())
    }
}
