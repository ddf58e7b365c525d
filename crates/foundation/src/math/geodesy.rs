use crate::bounds::GeoBounds;
use crate::coords::LatLng;

/// Mean earth radius (meters) of the spherical model used by web map surfaces.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Latitude half-extent (degrees) of a circle with the given radius.
pub fn lat_offset_deg(radius_m: f64) -> f64 {
    (radius_m / EARTH_RADIUS_M).to_degrees()
}

/// Longitude half-extent (degrees) of a circle centered at `lat_deg`.
///
/// Spherical law of cosines solved for the longitude at which a small circle
/// of angular radius `dlat` touches the center's parallel. Saturates at 180
/// degrees when the circle reaches a pole.
pub fn lng_offset_deg(lat_deg: f64, radius_m: f64) -> f64 {
    let lat = lat_deg.to_radians();
    let dlat = radius_m / EARTH_RADIUS_M;
    let cos_lat = lat.cos();
    let denom = cos_lat * cos_lat;
    if denom <= f64::EPSILON {
        return 180.0;
    }
    let sin_lat = lat.sin();
    let arg = (dlat.cos() - sin_lat * sin_lat) / denom;
    if arg < -1.0 {
        return 180.0;
    }
    arg.min(1.0).acos().to_degrees()
}

/// Bounding box of a circle on the sphere, clamped to valid degree ranges.
pub fn circle_bounds(center: LatLng, radius_m: f64) -> GeoBounds {
    let dlat = lat_offset_deg(radius_m);
    let dlng = lng_offset_deg(center.lat, radius_m);
    GeoBounds::new(
        LatLng::new(
            (center.lat - dlat).max(-90.0),
            (center.lng - dlng).max(-180.0),
        ),
        LatLng::new(
            (center.lat + dlat).min(90.0),
            (center.lng + dlng).min(180.0),
        ),
    )
}
