//! Persisted boundary text <-> [`Geometry`].
//!
//! Storage text is a GeoJSON polygon coordinate array holding one ring:
//! `[[[lng, lat], [lng, lat], ..., [lng, lat]]]`. The map surface wants
//! `(lat, lng)`, so decoding also produces a display projection.

use foundation::{LatLng, LngLat};
use serde_json::Value;
use tracing::{debug, warn};

use crate::geometry::{Geometry, GeometryError};

#[derive(Debug)]
pub enum DecodeError {
    Empty,
    Json(serde_json::Error),
    NoRings,
    BadPosition { index: usize },
    Geometry(GeometryError),
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::Empty => write!(f, "boundary text is empty"),
            DecodeError::Json(e) => write!(f, "boundary JSON parse error: {e}"),
            DecodeError::NoRings => write!(f, "boundary has no rings"),
            DecodeError::BadPosition { index } => {
                write!(f, "position {index} must be [lng, lat] or [lng, lat, alt]")
            }
            DecodeError::Geometry(e) => write!(f, "invalid boundary ring: {e}"),
        }
    }
}

impl std::error::Error for DecodeError {}

/// A restored boundary plus the coordinates the map surface renders.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedBoundary {
    pub geometry: Geometry,
    pub display: Vec<Vec<LatLng>>,
}

pub fn try_decode(text: &str) -> Result<Geometry, DecodeError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(DecodeError::Empty);
    }
    let rings: Vec<Vec<Vec<f64>>> = serde_json::from_str(text).map_err(DecodeError::Json)?;
    let mut rings = rings.into_iter();
    let outer = rings.next().ok_or(DecodeError::NoRings)?;
    let holes = rings.len();
    if holes > 0 {
        debug!(holes, "ignoring interior rings of persisted boundary");
    }

    let mut ring = Vec::with_capacity(outer.len());
    for (index, pos) in outer.into_iter().enumerate() {
        match pos.as_slice() {
            [lng, lat] | [lng, lat, _] => ring.push(LngLat::new(*lng, *lat)),
            _ => return Err(DecodeError::BadPosition { index }),
        }
    }
    Geometry::from_ring(ring).map_err(DecodeError::Geometry)
}

/// Lenient decode: malformed or empty text means "no boundary yet".
pub fn decode(text: &str) -> Option<DecodedBoundary> {
    match try_decode(text) {
        Ok(geometry) => Some(DecodedBoundary {
            display: vec![to_display(&geometry)],
            geometry,
        }),
        Err(DecodeError::Empty) => None,
        Err(err) => {
            warn!(error = %err, "discarding malformed persisted boundary");
            None
        }
    }
}

pub fn encode(geometry: &Geometry) -> String {
    let ring = geometry
        .outer()
        .iter()
        .map(|p| Value::Array(vec![Value::from(p.lng), Value::from(p.lat)]))
        .collect();
    Value::Array(vec![Value::Array(ring)]).to_string()
}

/// Outer ring in map display order.
pub fn to_display(geometry: &Geometry) -> Vec<LatLng> {
    geometry.outer().iter().map(|p| p.to_lat_lng()).collect()
}
