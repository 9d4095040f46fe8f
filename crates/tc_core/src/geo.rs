//! Geodesic and planar distance helpers.
//!
//! Two distance conventions coexist here: the matcher measures great-circle
//! (haversine) kilometers against reference tracks, while the detector's
//! consolidation and linking steps use the cheaper planar degree
//! approximation (1 degree ~ 111 km) that the historical validation runs
//! were produced with.

/// Mean Earth radius in meters, used by the spherical derivatives.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Mean Earth radius in kilometers, used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Approximate kilometers per degree of great-circle arc.
pub const KM_PER_DEGREE: f64 = 111.0;

/// Great-circle distance between two points in kilometers.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (lat1, lon1) = (lat1.to_radians(), lon1.to_radians());
    let (lat2, lon2) = (lat2.to_radians(), lon2.to_radians());

    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Planar degree-space distance scaled to kilometers.
///
/// No cos(lat) correction; consolidation radii and linking caps are tuned
/// against this convention.
pub fn planar_degree_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    (dlat * dlat + dlon * dlon).sqrt() * KM_PER_DEGREE
}
