//! Live driver geo index.
//!
//! A process-local map of `driver_id -> (lng, lat, last_updated)` answering
//! radius queries for dispatch. It is a cache over the durable
//! `driver_locations` table, never the system of record: dispatch falls back
//! to the database when the index has nothing to say, and entries not
//! refreshed within the TTL stop being matchable so a crashed driver app
//! cannot keep receiving offers.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use domain::models::dispatch::Candidate;
use shared::geo::haversine_km;

/// A driver's live position.
#[derive(Debug, Clone, Copy)]
pub struct DriverPosition {
    pub lng: f64,
    pub lat: f64,
    pub last_updated: DateTime<Utc>,
}

/// Concurrent in-memory geo index.
pub struct DriverGeoIndex {
    entries: DashMap<i64, DriverPosition>,
    ttl: Duration,
}

impl DriverGeoIndex {
    pub fn new(ttl_minutes: i64) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    /// Insert or refresh a driver's position. Idempotent; read-your-writes
    /// for the same caller.
    pub fn upsert(&self, driver_id: i64, lng: f64, lat: f64) {
        self.entries.insert(
            driver_id,
            DriverPosition {
                lng,
                lat,
                last_updated: Utc::now(),
            },
        );
    }

    /// Drop a driver from the index (driver went offline).
    pub fn remove(&self, driver_id: i64) {
        self.entries.remove(&driver_id);
    }

    /// A driver's live position, if fresh enough to be matchable.
    pub fn position(&self, driver_id: i64) -> Option<(f64, f64)> {
        let now = Utc::now();
        self.entries.get(&driver_id).and_then(|entry| {
            if now.signed_duration_since(entry.last_updated) <= self.ttl {
                Some((entry.lng, entry.lat))
            } else {
                None
            }
        })
    }

    /// Drivers within `radius_km` of the center, nearest first. Entries past
    /// the TTL are skipped. `limit` bounds the result when given.
    pub fn within(
        &self,
        center_lng: f64,
        center_lat: f64,
        radius_km: f64,
        limit: Option<usize>,
    ) -> Vec<Candidate> {
        let now = Utc::now();
        let mut hits: Vec<Candidate> = self
            .entries
            .iter()
            .filter(|entry| now.signed_duration_since(entry.last_updated) <= self.ttl)
            .filter_map(|entry| {
                let distance_km =
                    haversine_km(center_lat, center_lng, entry.lat, entry.lng);
                if distance_km <= radius_km {
                    Some(Candidate {
                        driver_id: *entry.key(),
                        distance_km,
                    })
                } else {
                    None
                }
            })
            .collect();

        hits.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
        if let Some(limit) = limit {
            hits.truncate(limit);
        }
        hits
    }

    /// Whether the index currently holds no matchable entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Evict entries past the TTL. Returns the number removed. Called by a
    /// background job; reads also skip stale entries, so eviction is purely
    /// housekeeping.
    pub fn evict_stale(&self) -> usize {
        let now = Utc::now();
        let before = self.entries.len();
        self.entries
            .retain(|_, position| now.signed_duration_since(position.last_updated) <= self.ttl);
        before - self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> DriverGeoIndex {
        DriverGeoIndex::new(5)
    }

    #[test]
    fn test_upsert_then_position() {
        let idx = index();
        idx.upsert(7, 77.5946, 12.9716);
        assert_eq!(idx.position(7), Some((77.5946, 12.9716)));
        assert_eq!(idx.position(8), None);
    }

    #[test]
    fn test_upsert_is_idempotent_and_last_write_wins() {
        let idx = index();
        idx.upsert(7, 77.59, 12.97);
        idx.upsert(7, 77.60, 12.98);
        assert_eq!(idx.position(7), Some((77.60, 12.98)));
    }

    #[test]
    fn test_remove() {
        let idx = index();
        idx.upsert(7, 77.59, 12.97);
        idx.remove(7);
        assert_eq!(idx.position(7), None);
        assert!(idx.is_empty());
    }

    #[test]
    fn test_within_orders_nearest_first() {
        let idx = index();
        // D1 ~0.5 km from the pickup, D2 right at it, D3 across town.
        idx.upsert(1, 77.5900, 12.9700);
        idx.upsert(2, 77.5946, 12.9716);
        idx.upsert(3, 77.7500, 13.1000);

        let hits = idx.within(77.5946, 12.9716, 3.0, None);
        let ids: Vec<i64> = hits.iter().map(|c| c.driver_id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert!(hits[0].distance_km < hits[1].distance_km);
    }

    #[test]
    fn test_within_respects_radius_and_limit() {
        let idx = index();
        idx.upsert(1, 77.5900, 12.9700);
        idx.upsert(2, 77.5946, 12.9716);
        idx.upsert(3, 77.6100, 12.9800);

        let all = idx.within(77.5946, 12.9716, 10.0, None);
        assert_eq!(all.len(), 3);

        let limited = idx.within(77.5946, 12.9716, 10.0, Some(2));
        assert_eq!(limited.len(), 2);

        let tight = idx.within(77.5946, 12.9716, 0.1, None);
        assert_eq!(tight.len(), 1);
        assert_eq!(tight[0].driver_id, 2);
    }

    #[test]
    fn test_stale_entries_not_matchable() {
        let idx = DriverGeoIndex::new(0); // everything is instantly stale
        idx.upsert(1, 77.59, 12.97);
        // The zero TTL makes the entry expire immediately relative to any
        // later read.
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert_eq!(idx.position(1), None);
        assert!(idx.within(77.59, 12.97, 100.0, None).is_empty());

        assert_eq!(idx.evict_stale(), 1);
        assert!(idx.is_empty());
    }
}
