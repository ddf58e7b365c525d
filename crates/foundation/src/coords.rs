use serde::{Deserialize, Serialize};

/// Display-order coordinate, as the map surface consumes it.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// Storage-order coordinate (GeoJSON position order).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn to_lng_lat(self) -> LngLat {
        LngLat::new(self.lng, self.lat)
    }

    /// Finite and within the WGS84 degree ranges.
    pub fn is_valid(self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

impl LngLat {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    pub fn to_lat_lng(self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    pub fn is_valid(self) -> bool {
        self.to_lat_lng().is_valid()
    }

    /// GeoJSON position: `[lng, lat]`.
    pub fn to_position(self) -> [f64; 2] {
        [self.lng, self.lat]
    }
}

impl From<[f64; 2]> for LngLat {
    fn from(p: [f64; 2]) -> Self {
        LngLat::new(p[0], p[1])
    }
}
