//! Geographic primitives: great-circle distance, ray-casting
//! point-in-polygon, and GeoJSON polygon parsing.
//!
//! Everything here is pure and deterministic. Polygon checks are done at the
//! application layer against the outer ring only; there is no spatial index.

use serde_json::Value;

/// Earth's mean radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// A polygon ring as a list of `[lng, lat]` vertices (GeoJSON axis order).
pub type Ring = Vec<[f64; 2]>;

/// Great-circle distance between two points in kilometers.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let dlat = (lat2 - lat1).to_radians();
    let dlng = (lng2 - lng1).to_radians();

    let a = (dlat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Ray-casting point-in-polygon test against a single outer ring.
///
/// The ring is a list of `[lng, lat]` vertices; it does not need to be
/// explicitly closed. Points exactly on an edge may land on either side.
pub fn point_in_polygon(lat: f64, lng: f64, ring: &[[f64; 2]]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }

    let (x, y) = (lng, lat);
    let mut inside = false;

    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (ring[i][0], ring[i][1]);
        let (xj, yj) = (ring[j][0], ring[j][1]);

        if ((yi > y) != (yj > y)) && (x < (xj - xi) * (y - yi) / (yj - yi) + xi) {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Parse a stored GeoJSON boundary and extract the outer ring.
///
/// Accepted shapes:
/// - `{"type": "Polygon", "coordinates": [[[lng, lat], ...], ...]}`
/// - `{"coordinates": [[[lng, lat], ...], ...]}`
/// - `[[[lng, lat], ...], ...]` (coordinates array)
/// - `[[lng, lat], ...]` (a bare ring)
///
/// Returns `None` for empty, malformed, or non-polygon input.
pub fn parse_polygon(geojson_text: &str) -> Option<Ring> {
    let trimmed = geojson_text.trim();
    if trimmed.is_empty() || trimmed == "{}" {
        return None;
    }

    let value: Value = serde_json::from_str(trimmed).ok()?;

    match &value {
        Value::Object(map) => {
            if let Some(type_name) = map.get("type").and_then(Value::as_str) {
                if type_name != "Polygon" {
                    return None;
                }
            }
            let coords = map.get("coordinates")?;
            outer_ring(coords)
        }
        Value::Array(items) if !items.is_empty() => {
            // Either [[[lng, lat], ...]] or a bare [[lng, lat], ...] ring.
            if items[0].get(0).map(Value::is_array).unwrap_or(false) {
                outer_ring(&value)
            } else {
                ring_from(&value)
            }
        }
        _ => None,
    }
}

fn outer_ring(coordinates: &Value) -> Option<Ring> {
    let rings = coordinates.as_array()?;
    ring_from(rings.first()?)
}

fn ring_from(value: &Value) -> Option<Ring> {
    let vertices = value.as_array()?;
    let mut ring = Vec::with_capacity(vertices.len());
    for vertex in vertices {
        let pair = vertex.as_array()?;
        if pair.len() < 2 {
            return None;
        }
        ring.push([pair[0].as_f64()?, pair[1].as_f64()?]);
    }
    if ring.len() < 3 {
        return None;
    }
    Some(ring)
}

#[cfg(test)]
mod tests {
    use super::*;

    // A rough square around central Bengaluru: lng 77.55..77.65, lat 12.90..13.00.
    fn bengaluru_square() -> Ring {
        vec![
            [77.55, 12.90],
            [77.65, 12.90],
            [77.65, 13.00],
            [77.55, 13.00],
            [77.55, 12.90],
        ]
    }

    #[test]
    fn test_haversine_reflexive() {
        assert_eq!(haversine_km(12.9716, 77.5946, 12.9716, 77.5946), 0.0);
    }

    #[test]
    fn test_haversine_symmetric() {
        let ab = haversine_km(12.9716, 77.5946, 12.9352, 77.6245);
        let ba = haversine_km(12.9352, 77.6245, 12.9716, 77.5946);
        assert!((ab - ba).abs() < 1e-12);
    }

    #[test]
    fn test_haversine_known_distance() {
        // MG Road to Koramangala, roughly 5.2 km as the crow flies.
        let d = haversine_km(12.9716, 77.5946, 12.9352, 77.6245);
        assert!(d > 4.5 && d < 6.0, "got {}", d);
    }

    #[test]
    fn test_haversine_long_range() {
        // Bengaluru to Chennai is about 290 km.
        let d = haversine_km(12.9716, 77.5946, 13.0827, 80.2707);
        assert!(d > 280.0 && d < 300.0, "got {}", d);
    }

    #[test]
    fn test_point_in_polygon_inside() {
        assert!(point_in_polygon(12.9716, 77.5946, &bengaluru_square()));
    }

    #[test]
    fn test_point_in_polygon_outside() {
        assert!(!point_in_polygon(13.0827, 80.2707, &bengaluru_square()));
        assert!(!point_in_polygon(12.80, 77.60, &bengaluru_square()));
    }

    #[test]
    fn test_point_in_polygon_degenerate_ring() {
        assert!(!point_in_polygon(12.95, 77.60, &[]));
        assert!(!point_in_polygon(12.95, 77.60, &[[77.55, 12.90], [77.65, 12.90]]));
    }

    #[test]
    fn test_point_in_polygon_unclosed_ring() {
        let mut ring = bengaluru_square();
        ring.pop(); // drop the closing vertex
        assert!(point_in_polygon(12.9716, 77.5946, &ring));
        assert!(!point_in_polygon(12.80, 77.60, &ring));
    }

    #[test]
    fn test_parse_polygon_geojson_object() {
        let text = r#"{"type": "Polygon", "coordinates": [[[77.55, 12.90], [77.65, 12.90], [77.65, 13.00], [77.55, 13.00], [77.55, 12.90]]]}"#;
        let ring = parse_polygon(text).unwrap();
        assert_eq!(ring.len(), 5);
        assert_eq!(ring[0], [77.55, 12.90]);
    }

    #[test]
    fn test_parse_polygon_bare_coordinates_object() {
        let text = r#"{"coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]]}"#;
        let ring = parse_polygon(text).unwrap();
        assert_eq!(ring.len(), 4);
    }

    #[test]
    fn test_parse_polygon_nested_array() {
        let text = "[[[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0]]]";
        let ring = parse_polygon(text).unwrap();
        assert_eq!(ring.len(), 4);
        assert!(point_in_polygon(1.0, 1.0, &ring));
    }

    #[test]
    fn test_parse_polygon_raw_ring() {
        let text = "[[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0]]";
        let ring = parse_polygon(text).unwrap();
        assert_eq!(ring.len(), 4);
    }

    #[test]
    fn test_parse_polygon_rejects_garbage() {
        assert!(parse_polygon("").is_none());
        assert!(parse_polygon("{}").is_none());
        assert!(parse_polygon("not json").is_none());
        assert!(parse_polygon(r#"{"type": "Point", "coordinates": [1.0, 2.0]}"#).is_none());
        assert!(parse_polygon("[[0.0, 0.0], [1.0, 1.0]]").is_none()); // too few vertices
    }
}
