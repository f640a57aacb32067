//! Planar distance approximation between two latitude/longitude points.
//!
//! Distances are `sqrt(Δlat² + Δlon²)` in degrees, scaled by 111 km per
//! degree. Relevance tiers and intensity tables are tuned against this
//! approximation, so it is not replaced by a great-circle formula.

/// Kilometres per degree used for all distance conversions.
pub const KM_PER_DEGREE: f64 = 111.0;

pub fn distance_degrees(lat_a: f64, lon_a: f64, lat_b: f64, lon_b: f64) -> f64 {
    // ---
    let d_lat = lat_a - lat_b;
    let d_lon = lon_a - lon_b;
    (d_lat * d_lat + d_lon * d_lon).sqrt()
}

pub fn distance_km(lat_a: f64, lon_a: f64, lat_b: f64, lon_b: f64) -> f64 {
    distance_degrees(lat_a, lon_a, lat_b, lon_b) * KM_PER_DEGREE
}
