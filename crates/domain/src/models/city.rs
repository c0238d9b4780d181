//! City domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shared::geo::{parse_polygon, point_in_polygon, Ring};

/// A serviced city with an optional GeoJSON boundary (outer ring only).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct City {
    pub city_id: i64,
    pub name: String,
    /// GeoJSON polygon stored as text. Cities without a boundary are never
    /// matched by the resolver.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boundary_geojson: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl City {
    /// Parsed outer ring of the boundary, if one is configured and valid.
    pub fn outer_ring(&self) -> Option<Ring> {
        self.boundary_geojson.as_deref().and_then(parse_polygon)
    }

    /// Whether the point lies inside this city's boundary.
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        self.outer_ring()
            .map(|ring| point_in_polygon(lat, lng, &ring))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn city_with_boundary(boundary: Option<&str>) -> City {
        City {
            city_id: 1,
            name: "Bengaluru".to_string(),
            boundary_geojson: boundary.map(str::to_string),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_contains_inside_and_outside() {
        let city = city_with_boundary(Some(
            r#"{"type":"Polygon","coordinates":[[[77.45,12.80],[77.80,12.80],[77.80,13.15],[77.45,13.15],[77.45,12.80]]]}"#,
        ));
        assert!(city.contains(12.9716, 77.5946));
        assert!(!city.contains(13.0827, 80.2707));
    }

    #[test]
    fn test_no_boundary_never_contains() {
        let city = city_with_boundary(None);
        assert!(!city.contains(12.9716, 77.5946));
        assert!(city.outer_ring().is_none());
    }

    #[test]
    fn test_malformed_boundary_never_contains() {
        let city = city_with_boundary(Some("{not geojson"));
        assert!(!city.contains(12.9716, 77.5946));
    }
}
