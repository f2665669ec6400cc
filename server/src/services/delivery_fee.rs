//! Delivery fee quoting
//!
//! Flat tiers over the great-circle distance between shop and drop-off.
//! When either side has no coordinates the quote falls back to a flat
//! default and is flagged as estimated.

use serde::Serialize;

const EARTH_RADIUS_KM: f64 = 6371.0;

// Fee tiers, minor currency units
const TIER_NEAR: i64 = 300; // <= 2 km
const TIER_MID: i64 = 500; // <= 5 km
const TIER_FAR: i64 = 800; // <= 10 km
const PER_EXTRA_KM: i64 = 100; // beyond 10 km, per started km

#[derive(Debug, Clone, Serialize)]
pub struct FeeQuote {
    /// Fee in minor currency units
    pub delivery_fee: i64,
    /// Shop-to-destination distance, absent on estimated quotes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    /// True when coordinates were missing and the default fee was used
    pub estimated: bool,
}

/// Great-circle distance between two coordinates, in km
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

/// Fee for a known distance
pub fn fee_for_distance(distance_km: f64) -> i64 {
    if distance_km <= 2.0 {
        TIER_NEAR
    } else if distance_km <= 5.0 {
        TIER_MID
    } else if distance_km <= 10.0 {
        TIER_FAR
    } else {
        let extra_km = (distance_km - 10.0).ceil() as i64;
        TIER_FAR + extra_km * PER_EXTRA_KM
    }
}

/// Quote a delivery between optional coordinate pairs. Any missing
/// coordinate yields the estimated default quote.
pub fn quote(
    shop: (Option<f64>, Option<f64>),
    dest: (Option<f64>, Option<f64>),
    default_fee: i64,
) -> FeeQuote {
    match (shop, dest) {
        ((Some(slat), Some(slon)), (Some(dlat), Some(dlon))) => {
            let distance = haversine_km(slat, slon, dlat, dlon);
            FeeQuote {
                delivery_fee: fee_for_distance(distance),
                distance_km: Some(distance),
                estimated: false,
            }
        }
        _ => FeeQuote {
            delivery_fee: default_fee,
            distance_km: None,
            estimated: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_boundaries() {
        assert_eq!(fee_for_distance(0.0), 300);
        assert_eq!(fee_for_distance(2.0), 300);
        assert_eq!(fee_for_distance(2.1), 500);
        assert_eq!(fee_for_distance(5.0), 500);
        assert_eq!(fee_for_distance(9.9), 800);
        assert_eq!(fee_for_distance(10.0), 800);
        // 12.3 km: three started extra km
        assert_eq!(fee_for_distance(12.3), 800 + 3 * 100);
        assert_eq!(fee_for_distance(11.0), 800 + 100);
    }

    #[test]
    fn haversine_known_distance() {
        // Nairobi CBD to Westlands is roughly 3.5 km
        let d = haversine_km(-1.2864, 36.8172, -1.2672, 36.8060);
        assert!((2.0..5.0).contains(&d), "got {d}");
    }

    #[test]
    fn identical_coordinates_hit_min_tier() {
        let q = quote((Some(-1.28), Some(36.81)), (Some(-1.28), Some(36.81)), 500);
        assert_eq!(q.delivery_fee, 300);
        assert!(!q.estimated);
        assert_eq!(q.distance_km, Some(0.0));
    }

    #[test]
    fn missing_coordinates_fall_back_to_default() {
        let q = quote((None, Some(36.81)), (Some(-1.28), Some(36.81)), 500);
        assert_eq!(q.delivery_fee, 500);
        assert!(q.estimated);
        assert!(q.distance_km.is_none());
    }
}
