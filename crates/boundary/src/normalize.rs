use foundation::math::circle_bounds;
use foundation::{GeoBounds, LatLng, LngLat};

use crate::geometry::{Geometry, GeometryError};
use crate::shape::DrawnShape;

#[derive(Debug, Clone, PartialEq)]
pub enum NormalizeError {
    InvalidGeometry(GeometryError),
    UnsupportedShape(String),
}

impl std::fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NormalizeError::InvalidGeometry(e) => write!(f, "invalid geometry: {e}"),
            NormalizeError::UnsupportedShape(kind) => write!(f, "unsupported shape: {kind}"),
        }
    }
}

impl std::error::Error for NormalizeError {}

impl From<GeometryError> for NormalizeError {
    fn from(e: GeometryError) -> Self {
        NormalizeError::InvalidGeometry(e)
    }
}

/// Converts any drawn shape into the canonical single-ring geometry.
pub fn normalize(shape: &DrawnShape) -> Result<Geometry, NormalizeError> {
    match shape {
        DrawnShape::Polygon { vertices } => polygon(vertices),
        DrawnShape::Rectangle { corner1, corner2 } => rectangle(*corner1, *corner2),
        DrawnShape::Circle { center, radius_m } => circle(*center, *radius_m),
    }
}

fn polygon(vertices: &[LatLng]) -> Result<Geometry, NormalizeError> {
    let ring: Vec<LngLat> = vertices.iter().map(|v| v.to_lng_lat()).collect();
    Ok(Geometry::close(ring)?)
}

fn rectangle(corner1: LatLng, corner2: LatLng) -> Result<Geometry, NormalizeError> {
    for (index, c) in [corner1, corner2].into_iter().enumerate() {
        if !c.is_valid() {
            return Err(GeometryError::OutOfRange { index }.into());
        }
    }
    bounding_box_ring(GeoBounds::from_corners(corner1, corner2))
}

// Circles are stored as their enclosing rectangle; the curved boundary is lost.
fn circle(center: LatLng, radius_m: f64) -> Result<Geometry, NormalizeError> {
    if !center.is_valid() {
        return Err(GeometryError::OutOfRange { index: 0 }.into());
    }
    if !radius_m.is_finite() || radius_m <= 0.0 {
        return Err(GeometryError::InvalidRadius(radius_m).into());
    }
    bounding_box_ring(circle_bounds(center, radius_m))
}

/// SW -> NW -> NE -> SE -> SW.
fn bounding_box_ring(bounds: GeoBounds) -> Result<Geometry, NormalizeError> {
    if !bounds.has_area() {
        return Err(GeometryError::Degenerate.into());
    }
    let sw = bounds.south_west.to_lng_lat();
    Ok(Geometry::from_ring(vec![
        sw,
        bounds.north_west().to_lng_lat(),
        bounds.north_east.to_lng_lat(),
        bounds.south_east().to_lng_lat(),
        sw,
    ])?)
}
