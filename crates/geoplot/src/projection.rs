//! The map-projection seam between geographic space and plot axes.

use crate::geodesy::{LatLon, SPHERE_RADIUS_M};

/// Projects a geographic position into the 2D coordinate space the plot
/// axes (and the offscreen-rendered content) live in.
pub trait GeoProjection {
    fn project(&self, position: LatLon) -> [f64; 2];
}

/// A local tangent plane anchored at a reference position: x is meters east
/// of the anchor, y is meters north, with east scaled by the anchor's
/// parallel. Monotonic in both latitude and longitude, which is what the
/// per-frame axis re-derivation relies on.
#[derive(Debug, Clone, Copy)]
pub struct TangentPlane {
    origin: LatLon,
    cos_origin_lat: f64,
}

impl TangentPlane {
    pub fn new(origin: LatLon) -> Self {
        Self {
            origin,
            cos_origin_lat: origin.lat_deg.to_radians().cos(),
        }
    }

    pub fn origin(&self) -> LatLon {
        self.origin
    }
}

impl GeoProjection for TangentPlane {
    fn project(&self, position: LatLon) -> [f64; 2] {
        let d_lat = (position.lat_deg - self.origin.lat_deg).to_radians();
        let d_lon = (position.lon_deg - self.origin.lon_deg).to_radians();

        [
            SPHERE_RADIUS_M * d_lon * self.cos_origin_lat,
            SPHERE_RADIUS_M * d_lat,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_projects_to_zero() {
        let plane = TangentPlane::new(LatLon::from_deg(52.52, 13.40));
        assert_eq!(plane.project(plane.origin()), [0.0, 0.0]);
    }

    #[test]
    fn projection_is_monotonic() {
        let plane = TangentPlane::new(LatLon::from_deg(10.0, 20.0));

        let west = plane.project(LatLon::from_deg(10.0, 19.0));
        let east = plane.project(LatLon::from_deg(10.0, 21.0));
        let south = plane.project(LatLon::from_deg(9.0, 20.0));
        let north = plane.project(LatLon::from_deg(11.0, 20.0));

        assert!(west[0] < 0.0 && east[0] > 0.0);
        assert!(south[1] < 0.0 && north[1] > 0.0);
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let plane = TangentPlane::new(LatLon::from_deg(0.0, 0.0));
        let north = plane.project(LatLon::from_deg(1.0, 0.0));

        assert!((north[1] - 111_195.0).abs() < 100.0);
    }
}
