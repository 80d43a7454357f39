//! Great-circle distance math for the nearby search.

/// Mean Earth radius (IUGG), kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Kilometers per degree of latitude, used for the bounding-box prefilter.
const KM_PER_DEG_LAT: f64 = 110.574;
const KM_PER_DEG_LNG_EQUATOR: f64 = 111.320;

/// Haversine distance in kilometers between two WGS-84 points.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

/// Inclusive lat/lng bounds used to narrow the candidate scan before exact
/// haversine filtering. Over-fetching is fine; under-fetching is not.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

/// Box around `(lat, lng)` covering `radius_km`. A non-positive radius
/// degenerates to the exact point: radius zero matches only coincident
/// points and a negative radius matches nothing once the exact distance
/// filter runs (distance is never negative).
pub fn bounding_box(lat: f64, lng: f64, radius_km: f64) -> BoundingBox {
    if radius_km <= 0.0 {
        return BoundingBox { min_lat: lat, max_lat: lat, min_lng: lng, max_lng: lng };
    }
    let d_lat = radius_km / KM_PER_DEG_LAT;
    // Longitude degrees shrink with latitude; clamp the cosine so polar
    // queries widen instead of dividing by zero.
    let cos_lat = lat.to_radians().cos().max(1e-4);
    let d_lng = radius_km / (KM_PER_DEG_LNG_EQUATOR * cos_lat);
    BoundingBox {
        min_lat: (lat - d_lat).max(-90.0),
        max_lat: (lat + d_lat).min(90.0),
        min_lng: lng - d_lng,
        max_lng: lng + d_lng,
    }
}
