use crate::coords::{LatLng, LngLat};

/// Axis-aligned geographic bounds in degrees.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GeoBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl GeoBounds {
    pub fn new(south_west: LatLng, north_east: LatLng) -> Self {
        GeoBounds {
            south_west,
            north_east,
        }
    }

    /// Smallest bounds containing both corners, in any order.
    pub fn from_corners(a: LatLng, b: LatLng) -> Self {
        GeoBounds {
            south_west: LatLng::new(a.lat.min(b.lat), a.lng.min(b.lng)),
            north_east: LatLng::new(a.lat.max(b.lat), a.lng.max(b.lng)),
        }
    }

    /// Bounds of a set of storage-order positions. `None` when empty.
    pub fn of_positions<'a>(points: impl IntoIterator<Item = &'a LngLat>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?.to_lat_lng();
        let mut out = GeoBounds::new(first, first);
        for p in iter {
            out.south_west.lat = out.south_west.lat.min(p.lat);
            out.south_west.lng = out.south_west.lng.min(p.lng);
            out.north_east.lat = out.north_east.lat.max(p.lat);
            out.north_east.lng = out.north_east.lng.max(p.lng);
        }
        Some(out)
    }

    pub fn north_west(&self) -> LatLng {
        LatLng::new(self.north_east.lat, self.south_west.lng)
    }

    pub fn south_east(&self) -> LatLng {
        LatLng::new(self.south_west.lat, self.north_east.lng)
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south_west.lat + self.north_east.lat) * 0.5,
            (self.south_west.lng + self.north_east.lng) * 0.5,
        )
    }

    /// True when the bounds enclose a non-zero area.
    pub fn has_area(&self) -> bool {
        self.north_east.lat > self.south_west.lat && self.north_east.lng > self.south_west.lng
    }
}

#[cfg(test)]
mod tests {
    use super::GeoBounds;
    use crate::coords::{LatLng, LngLat};

    #[test]
    fn corner_order_does_not_matter() {
        let a = LatLng::new(16.1, 80.0);
        let b = LatLng::new(16.0, 80.1);
        assert_eq!(GeoBounds::from_corners(a, b), GeoBounds::from_corners(b, a));
        let bounds = GeoBounds::from_corners(a, b);
        assert_eq!(bounds.south_west, LatLng::new(16.0, 80.0));
        assert_eq!(bounds.north_east, LatLng::new(16.1, 80.1));
        assert_eq!(bounds.north_west(), LatLng::new(16.1, 80.0));
        assert_eq!(bounds.south_east(), LatLng::new(16.0, 80.1));
    }

    #[test]
    fn bounds_of_positions() {
        let pts = [
            LngLat::new(80.0, 16.0),
            LngLat::new(80.2, 16.05),
            LngLat::new(80.1, 16.3),
        ];
        let b = GeoBounds::of_positions(&pts).expect("bounds");
        assert_eq!(b.south_west, LatLng::new(16.0, 80.0));
        assert_eq!(b.north_east, LatLng::new(16.3, 80.2));
        assert!(b.has_area());
        assert!(GeoBounds::of_positions(std::iter::empty()).is_none());
    }

    #[test]
    fn degenerate_bounds_have_no_area() {
        let p = LatLng::new(1.0, 2.0);
        assert!(!GeoBounds::new(p, p).has_area());
    }
}
