//! Surge zone domain model.
//!
//! Surge is read from pre-configured, time-bounded zones; it is not derived
//! from live demand. A fare samples at most one zone, at the pickup point,
//! at request time.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shared::geo::{parse_polygon, point_in_polygon};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurgeZone {
    pub surge_zone_id: i64,
    pub city_id: i64,
    pub name: String,
    /// GeoJSON polygon stored as text (outer ring only).
    pub boundary_geojson: String,
    /// Multiplier applied to the fare subtotal; always >= 1.0.
    pub multiplier: BigDecimal,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub is_active: bool,
}

impl SurgeZone {
    /// Whether the zone is active and inside its validity window at `now`.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.starts_at <= now && now <= self.ends_at
    }

    /// Whether the point lies inside the zone polygon.
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        parse_polygon(&self.boundary_geojson)
            .map(|ring| point_in_polygon(lat, lng, &ring))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::str::FromStr;

    fn zone(starts_offset_mins: i64, ends_offset_mins: i64, is_active: bool) -> SurgeZone {
        let now = Utc::now();
        SurgeZone {
            surge_zone_id: 1,
            city_id: 1,
            name: "CBD evening peak".to_string(),
            boundary_geojson:
                "[[[77.55, 12.90], [77.65, 12.90], [77.65, 13.00], [77.55, 13.00]]]".to_string(),
            multiplier: BigDecimal::from_str("1.80").unwrap(),
            starts_at: now + Duration::minutes(starts_offset_mins),
            ends_at: now + Duration::minutes(ends_offset_mins),
            is_active,
        }
    }

    #[test]
    fn test_is_live_within_window() {
        assert!(zone(-10, 10, true).is_live(Utc::now()));
    }

    #[test]
    fn test_not_live_outside_window_or_inactive() {
        let now = Utc::now();
        assert!(!zone(5, 60, true).is_live(now)); // not started
        assert!(!zone(-60, -5, true).is_live(now)); // ended
        assert!(!zone(-10, 10, false).is_live(now)); // disabled
    }

    #[test]
    fn test_contains() {
        let z = zone(-10, 10, true);
        assert!(z.contains(12.95, 77.60));
        assert!(!z.contains(12.50, 77.60));
    }
}
