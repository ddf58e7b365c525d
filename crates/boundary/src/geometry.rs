use foundation::{GeoBounds, LngLat};

/// Minimum number of positions in a closed ring (3 vertices + closing point).
pub const MIN_RING_LEN: usize = 4;

/// Canonical field boundary: a single closed outer ring in storage order.
///
/// Invariants (enforced by [`Geometry::from_ring`]):
/// - every position is finite and within WGS84 degree ranges,
/// - the ring has at least [`MIN_RING_LEN`] positions,
/// - first and last positions are identical,
/// - at least 3 distinct vertices.
///
/// Holes are not modeled.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    ring: Vec<LngLat>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GeometryError {
    TooFewVertices { distinct: usize },
    NotClosed,
    OutOfRange { index: usize },
    Degenerate,
    InvalidRadius(f64),
    Malformed(String),
}

impl std::fmt::Display for GeometryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryError::TooFewVertices { distinct } => {
                write!(f, "need at least 3 distinct vertices, got {distinct}")
            }
            GeometryError::NotClosed => write!(f, "ring is not closed"),
            GeometryError::OutOfRange { index } => {
                write!(f, "coordinate at index {index} is not a valid lat/lng")
            }
            GeometryError::Degenerate => write!(f, "shape encloses no area"),
            GeometryError::InvalidRadius(r) => write!(f, "invalid circle radius: {r}"),
            GeometryError::Malformed(msg) => write!(f, "malformed shape: {msg}"),
        }
    }
}

impl std::error::Error for GeometryError {}

impl Geometry {
    /// Validates an already-closed ring of `(lng, lat)` positions.
    pub fn from_ring(ring: Vec<LngLat>) -> Result<Self, GeometryError> {
        if let Some(index) = ring.iter().position(|p| !p.is_valid()) {
            return Err(GeometryError::OutOfRange { index });
        }
        let (Some(first), Some(last)) = (ring.first(), ring.last()) else {
            return Err(GeometryError::TooFewVertices { distinct: 0 });
        };
        if ring.len() >= 2 && first != last {
            return Err(GeometryError::NotClosed);
        }
        let open = &ring[..ring.len() - 1];
        let distinct = count_distinct_up_to_three(open);
        if distinct < 3 || ring.len() < MIN_RING_LEN {
            return Err(GeometryError::TooFewVertices { distinct });
        }
        Ok(Self { ring })
    }

    /// Closes an open vertex sequence and validates it.
    ///
    /// A trailing copy of the first vertex is treated as an explicit closure
    /// and not duplicated.
    pub fn close(mut vertices: Vec<LngLat>) -> Result<Self, GeometryError> {
        if vertices.len() >= 2 && vertices.first() == vertices.last() {
            vertices.pop();
        }
        let Some(first) = vertices.first().copied() else {
            return Err(GeometryError::TooFewVertices { distinct: 0 });
        };
        vertices.push(first);
        Self::from_ring(vertices)
    }

    /// The outer ring, closed.
    pub fn outer(&self) -> &[LngLat] {
        &self.ring
    }

    /// All rings; always exactly one.
    pub fn rings(&self) -> &[Vec<LngLat>] {
        std::slice::from_ref(&self.ring)
    }

    /// Number of vertices, not counting the closing point.
    pub fn vertex_count(&self) -> usize {
        self.ring.len() - 1
    }

    pub fn bounds(&self) -> GeoBounds {
        let origin = self.ring[0].to_lat_lng();
        GeoBounds::of_positions(&self.ring).unwrap_or(GeoBounds::new(origin, origin))
    }

    /// GeoJSON polygon coordinates: `[[[lng, lat], ...]]`.
    pub fn to_positions(&self) -> Vec<Vec<[f64; 2]>> {
        vec![self.ring.iter().map(|p| p.to_position()).collect()]
    }
}

fn count_distinct_up_to_three(points: &[LngLat]) -> usize {
    let mut seen: Vec<LngLat> = Vec::with_capacity(3);
    for p in points {
        if !seen.contains(p) {
            seen.push(*p);
            if seen.len() == 3 {
                break;
            }
        }
    }
    seen.len()
}
