//! Geographic rectangle arithmetic.
//!
//! `GeoBounds` operations never validate their inputs: callers guarantee
//! `min <= max` by construction (every operation here produces its output
//! via component-wise min/max, which preserves the invariant for ordered
//! inputs). Garbage in, garbage out, by contract.

use crate::geodesy::LatLon;

/// An axis-aligned geographic rectangle in degrees. Immutable value type;
/// every operation returns a fresh bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl GeoBounds {
    #[inline]
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Self {
        Self { min_lat, max_lat, min_lon, max_lon }
    }

    /// Smallest rectangle containing both inputs.
    pub fn union(self, other: GeoBounds) -> GeoBounds {
        GeoBounds {
            min_lat: self.min_lat.min(other.min_lat),
            max_lat: self.max_lat.max(other.max_lat),
            min_lon: self.min_lon.min(other.min_lon),
            max_lon: self.max_lon.max(other.max_lon),
        }
    }

    /// Component-wise intersection. Disjoint inputs yield an inverted
    /// (min > max) result; callers that care must check.
    pub fn intersect(self, other: GeoBounds) -> GeoBounds {
        GeoBounds {
            min_lat: self.min_lat.max(other.min_lat),
            max_lat: self.max_lat.min(other.max_lat),
            min_lon: self.min_lon.max(other.min_lon),
            max_lon: self.max_lon.min(other.max_lon),
        }
    }

    /// Expands each dimension outward by `fraction * extent` on both sides.
    /// Zero is the identity; a negative fraction shrinks (not rejected).
    pub fn buffer(self, fraction: f64) -> GeoBounds {
        let diff_lat = self.max_lat - self.min_lat;
        let diff_lon = self.max_lon - self.min_lon;

        GeoBounds {
            min_lat: self.min_lat - diff_lat * fraction,
            max_lat: self.max_lat + diff_lat * fraction,
            min_lon: self.min_lon - diff_lon * fraction,
            max_lon: self.max_lon + diff_lon * fraction,
        }
    }

    /// The four corners in fixed SW, SE, NE, NW winding.
    pub fn corners(self) -> [LatLon; 4] {
        [
            LatLon::from_deg(self.min_lat, self.min_lon),
            LatLon::from_deg(self.min_lat, self.max_lon),
            LatLon::from_deg(self.max_lat, self.max_lon),
            LatLon::from_deg(self.max_lat, self.min_lon),
        ]
    }

    /// Min/max scan over a point set. Empty input yields the infinite
    /// sentinel (see module note on caller obligations).
    pub fn from_corners<I>(corners: I) -> GeoBounds
    where
        I: IntoIterator<Item = LatLon>,
    {
        let mut min_lat = f64::INFINITY;
        let mut max_lat = f64::NEG_INFINITY;
        let mut min_lon = f64::INFINITY;
        let mut max_lon = f64::NEG_INFINITY;

        for corner in corners {
            if corner.lat_deg < min_lat {
                min_lat = corner.lat_deg;
            }
            if corner.lat_deg > max_lat {
                max_lat = corner.lat_deg;
            }
            if corner.lon_deg < min_lon {
                min_lon = corner.lon_deg;
            }
            if corner.lon_deg > max_lon {
                max_lon = corner.lon_deg;
            }
        }

        GeoBounds { min_lat, max_lat, min_lon, max_lon }
    }
}

// Extrema over projected 2D points ([x, y] pairs). Empty input returns the
// infinite sentinel; that is a documented caller obligation, not a handled
// case, so debug builds trip an assert instead of propagating infinity.

pub fn min_x(points: &[[f64; 2]]) -> f64 {
    debug_assert!(!points.is_empty(), "extremum over empty point set");
    points.iter().fold(f64::INFINITY, |min, p| if p[0] < min { p[0] } else { min })
}

pub fn max_x(points: &[[f64; 2]]) -> f64 {
    debug_assert!(!points.is_empty(), "extremum over empty point set");
    points.iter().fold(f64::NEG_INFINITY, |max, p| if p[0] > max { p[0] } else { max })
}

pub fn min_y(points: &[[f64; 2]]) -> f64 {
    debug_assert!(!points.is_empty(), "extremum over empty point set");
    points.iter().fold(f64::INFINITY, |min, p| if p[1] < min { p[1] } else { min })
}

pub fn max_y(points: &[[f64; 2]]) -> f64 {
    debug_assert!(!points.is_empty(), "extremum over empty point set");
    points.iter().fold(f64::NEG_INFINITY, |max, p| if p[1] > max { p[1] } else { max })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> GeoBounds {
        GeoBounds::new(min_lat, max_lat, min_lon, max_lon)
    }

    #[test]
    fn corners_round_trip() {
        let bounds = b(10.0, 20.0, 30.0, 40.0);
        assert_eq!(GeoBounds::from_corners(bounds.corners()), bounds);

        let degenerate = b(-5.0, -5.0, 170.0, 170.0);
        assert_eq!(GeoBounds::from_corners(degenerate.corners()), degenerate);
    }

    #[test]
    fn corner_winding_is_sw_se_ne_nw() {
        let [sw, se, ne, nw] = b(10.0, 20.0, 30.0, 40.0).corners();

        assert_eq!((sw.lat_deg, sw.lon_deg), (10.0, 30.0));
        assert_eq!((se.lat_deg, se.lon_deg), (10.0, 40.0));
        assert_eq!((ne.lat_deg, ne.lon_deg), (20.0, 40.0));
        assert_eq!((nw.lat_deg, nw.lon_deg), (20.0, 30.0));
    }

    #[test]
    fn union_and_intersect_are_idempotent() {
        let bounds = b(-12.5, 3.25, 100.0, 101.5);

        assert_eq!(bounds.union(bounds), bounds);
        assert_eq!(bounds.intersect(bounds), bounds);
    }

    #[test]
    fn intersection_contained_in_both_union_contains_both() {
        let a = b(0.0, 10.0, 0.0, 10.0);
        let c = b(5.0, 15.0, -3.0, 7.0);

        let i = a.intersect(c);
        assert!(i.min_lat >= a.min_lat.max(c.min_lat));
        assert!(i.max_lat <= a.max_lat.min(c.max_lat));
        assert!(i.min_lon >= a.min_lon.max(c.min_lon));
        assert!(i.max_lon <= a.max_lon.min(c.max_lon));

        let u = a.union(c);
        assert!(u.min_lat <= a.min_lat.min(c.min_lat));
        assert!(u.max_lat >= a.max_lat.max(c.max_lat));
        assert!(u.min_lon <= a.min_lon.min(c.min_lon));
        assert!(u.max_lon >= a.max_lon.max(c.max_lon));
    }

    #[test]
    fn buffer_zero_is_identity() {
        let bounds = b(1.0, 2.0, 3.0, 4.0);
        assert_eq!(bounds.buffer(0.0), bounds);
    }

    #[test]
    fn positive_buffer_strictly_contains() {
        let bounds = b(10.0, 20.0, 30.0, 40.0);
        let buffered = bounds.buffer(0.5);

        assert!(buffered.min_lat < bounds.min_lat);
        assert!(buffered.max_lat > bounds.max_lat);
        assert!(buffered.min_lon < bounds.min_lon);
        assert!(buffered.max_lon > bounds.max_lon);

        // 50% on each side: a 10-degree extent grows to 20.
        assert_eq!(buffered.min_lat, 5.0);
        assert_eq!(buffered.max_lat, 25.0);
    }

    #[test]
    fn extrema_over_projected_points() {
        let points = [[1.0, -2.0], [3.5, 0.0], [-1.25, 4.0]];

        assert_eq!(min_x(&points), -1.25);
        assert_eq!(max_x(&points), 3.5);
        assert_eq!(min_y(&points), -2.0);
        assert_eq!(max_y(&points), 4.0);
    }
}
