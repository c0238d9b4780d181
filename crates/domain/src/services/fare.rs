//! Fare math.
//!
//! Pure and deterministic: given a fare config, a straight-line distance and
//! an optional surge sample, the quote is fully determined. The orchestration
//! (config lookup, surge resolution at the pickup point) lives in the API
//! layer; locking happens by persisting the result on the trip row.

use bigdecimal::{BigDecimal, FromPrimitive};

use crate::models::fare::{FareBreakdown, FareConfig};

/// Assumed average urban speed used to estimate trip duration.
pub const DEFAULT_AVERAGE_SPEED_KMH: f64 = 25.0;

fn round_cents(value: BigDecimal) -> BigDecimal {
    value.with_scale_round(2, bigdecimal::rounding::RoundingMode::HalfUp)
}

/// Computes a fare quote.
///
/// `fare = max(round2(subtotal * multiplier), minimum_fare)` where
/// `subtotal = base + per_km * distance + per_minute * estimated_minutes` and
/// `estimated_minutes = distance / average_speed * 60`.
pub fn quote(
    config: &FareConfig,
    distance_km: f64,
    surge: Option<(BigDecimal, i64)>,
    average_speed_kmh: f64,
) -> FareBreakdown {
    let estimated_minutes = distance_km * 60.0 / average_speed_kmh;

    let distance = BigDecimal::from_f64(distance_km).unwrap_or_default();
    let minutes = BigDecimal::from_f64(estimated_minutes).unwrap_or_default();

    let distance_fare = &config.per_km * &distance;
    let time_fare = &config.per_minute * &minutes;
    let subtotal = &config.base_fare + &distance_fare + &time_fare;

    let (multiplier, surge_zone_id) = match surge {
        Some((multiplier, zone_id)) => (multiplier, Some(zone_id)),
        None => (BigDecimal::from(1), None),
    };

    let surged = round_cents(&subtotal * &multiplier);
    let minimum = round_cents(config.minimum_fare.clone());

    let minimum_fare_applied = surged < minimum;
    let fare_amount = if minimum_fare_applied {
        minimum.clone()
    } else {
        surged
    };

    FareBreakdown {
        city_id: config.city_id,
        vehicle_category: config.vehicle_category,
        distance_km,
        estimated_minutes,
        base_fare: round_cents(config.base_fare.clone()),
        distance_fare: round_cents(distance_fare),
        time_fare: round_cents(time_fare),
        subtotal: round_cents(subtotal),
        surge_multiplier: multiplier,
        surge_zone_id,
        minimum_fare: minimum,
        minimum_fare_applied,
        fare_amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::vehicle::VehicleCategory;
    use chrono::Utc;
    use std::str::FromStr;

    fn config(base: &str, per_km: &str, per_minute: &str, minimum: &str) -> FareConfig {
        FareConfig {
            fare_config_id: 1,
            city_id: 1,
            vehicle_category: VehicleCategory::Sedan,
            base_fare: BigDecimal::from_str(base).unwrap(),
            per_km: BigDecimal::from_str(per_km).unwrap(),
            per_minute: BigDecimal::from_str(per_minute).unwrap(),
            minimum_fare: BigDecimal::from_str(minimum).unwrap(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_surged_fare_exact() {
        // base=50, per_km=10, per_minute=1, min=60, distance 5 km at 25 km/h:
        // est_minutes = 12, subtotal = 50 + 50 + 12 = 112, surged = 201.60.
        let cfg = config("50", "10", "1", "60");
        let surge = Some((BigDecimal::from_str("1.8").unwrap(), 42));
        let breakdown = quote(&cfg, 5.0, surge, DEFAULT_AVERAGE_SPEED_KMH);

        assert_eq!(breakdown.estimated_minutes, 12.0);
        assert_eq!(breakdown.subtotal, BigDecimal::from_str("112.00").unwrap());
        assert_eq!(
            breakdown.fare_amount,
            BigDecimal::from_str("201.60").unwrap()
        );
        assert_eq!(breakdown.surge_zone_id, Some(42));
        assert!(!breakdown.minimum_fare_applied);
    }

    #[test]
    fn test_no_surge_defaults_to_unit_multiplier() {
        let cfg = config("50", "10", "1", "60");
        let breakdown = quote(&cfg, 5.0, None, DEFAULT_AVERAGE_SPEED_KMH);

        assert_eq!(
            breakdown.fare_amount,
            BigDecimal::from_str("112.00").unwrap()
        );
        assert_eq!(breakdown.surge_multiplier, BigDecimal::from(1));
        assert_eq!(breakdown.surge_zone_id, None);
    }

    #[test]
    fn test_minimum_fare_floor() {
        let cfg = config("20", "5", "1", "80");
        let breakdown = quote(&cfg, 2.0, None, DEFAULT_AVERAGE_SPEED_KMH);

        // subtotal = 20 + 10 + 4.8 = 34.80, below the 80 floor.
        assert_eq!(breakdown.subtotal, BigDecimal::from_str("34.80").unwrap());
        assert!(breakdown.minimum_fare_applied);
        assert_eq!(breakdown.fare_amount, BigDecimal::from_str("80.00").unwrap());
    }

    #[test]
    fn test_zero_distance_charges_base_or_minimum() {
        let cfg = config("30", "10", "2", "25");
        let breakdown = quote(&cfg, 0.0, None, DEFAULT_AVERAGE_SPEED_KMH);

        assert_eq!(breakdown.estimated_minutes, 0.0);
        assert_eq!(breakdown.fare_amount, BigDecimal::from_str("30.00").unwrap());
        assert!(!breakdown.minimum_fare_applied);
    }

    #[test]
    fn test_quote_is_idempotent() {
        let cfg = config("50", "10", "1", "60");
        let surge = Some((BigDecimal::from_str("1.8").unwrap(), 42));
        let a = quote(&cfg, 5.0, surge.clone(), DEFAULT_AVERAGE_SPEED_KMH);
        let b = quote(&cfg, 5.0, surge, DEFAULT_AVERAGE_SPEED_KMH);
        assert_eq!(a, b);
    }

    #[test]
    fn test_rounding_half_up() {
        // subtotal = 10 + 3.333.. km-fare with per_km = 3: 10 + 1.005 -> check
        // a value that lands on a half-cent boundary after the multiplier.
        let cfg = config("0", "1", "0", "0");
        let surge = Some((BigDecimal::from_str("1.5").unwrap(), 1));
        let breakdown = quote(&cfg, 0.07, surge, DEFAULT_AVERAGE_SPEED_KMH);
        // 0.07 * 1.5 = 0.105 -> rounds up to 0.11.
        assert_eq!(breakdown.fare_amount, BigDecimal::from_str("0.11").unwrap());
    }
}
