//! Visible-footprint estimation from camera state.
//!
//! Two independent heuristics estimate the lat/lon rectangle currently on
//! screen:
//!
//! - **Strategy A** unprojects the four viewport corners directly. Exact
//!   where it works, but any corner ray that clears the horizon yields no
//!   position at all.
//! - **Strategy B** takes the viewport-center position, the meters-per-pixel
//!   scale at that distance, and extrapolates a bounding square by
//!   displacing the center along the four diagonal compass headings. It
//!   ignores camera roll/yaw entirely, so it is an approximation, not a
//!   reprojection — robust, never gappy.
//!
//! The per-frame policy: if Strategy A is invalid, the whole allowed region
//! is treated as visible (conservative, always safe). If A is valid, use
//! Strategy B's bounds, buffered by [`FOOTPRINT_BUFFER`] for slack, clamped
//! to the allowed region. A's validity gates B's bounds; A's own bounds are
//! never used.

use geoplot::bounds::GeoBounds;
use geoplot::geodesy::{self, azimuth, LatLon};

/// Fractional slack applied to Strategy B's bounds before clamping.
pub const FOOTPRINT_BUFFER: f64 = 0.5;

/// Integer pixel rectangle of the rendered view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }
}

/// The camera/view capability the footprint estimator consumes. Implemented
/// by the real orbital camera; tests substitute a hand-rolled fake.
pub trait GlobeView {
    fn viewport(&self) -> Viewport;

    /// Casts a ray through the given screen point; `None` when the ray does
    /// not intersect the globe (e.g. looking above the horizon).
    fn unproject(&self, screen_x: f64, screen_y: f64) -> Option<LatLon>;

    /// Geographic position under the viewport center, if any.
    fn center_position(&self) -> Option<LatLon>;

    /// Eye position in ECEF meters.
    fn eye_position(&self) -> [f64; 3];

    /// ECEF point (meters) on the globe surface for a geographic position.
    fn world_point(&self, position: LatLon) -> [f64; 3];

    /// Meters covered by one pixel at the given distance from the eye.
    fn pixel_size_at_distance(&self, distance_m: f64) -> f64;
}

/// Strategy A: the four viewport corners unprojected to geographic
/// positions, in (minX,minY), (minX,maxY), (maxX,maxY), (maxX,minY) screen
/// order. Entries are `None` where the corner ray misses the globe.
pub fn screen_corners<V: GlobeView + ?Sized>(view: &V) -> [Option<LatLon>; 4] {
    let vp = view.viewport();

    let min_x = vp.x as f64;
    let min_y = vp.y as f64;
    let max_x = (vp.x + vp.width as i32) as f64;
    let max_y = (vp.y + vp.height as i32) as f64;

    [
        view.unproject(min_x, min_y),
        view.unproject(min_x, max_y),
        view.unproject(max_x, max_y),
        view.unproject(max_x, min_y),
    ]
}

/// A corner set is valid iff every entry resolved to a position.
pub fn corners_valid(corners: &[Option<LatLon>; 4]) -> bool {
    corners.iter().all(Option::is_some)
}

/// Strategy B: center position plus pixel-scale extrapolation. `None` when
/// the center ray misses the globe, which callers must check before use.
pub fn center_scale_corners<V: GlobeView + ?Sized>(view: &V) -> Option<[LatLon; 4]> {
    let center = view.center_position()?;

    let ground = view.world_point(center);
    let eye = view.eye_position();
    let distance = distance3(eye, ground);
    let meters_per_pixel = view.pixel_size_at_distance(distance);

    // Assume that scale roughly holds across the whole screen (a fair
    // assumption when zoomed in), and take the larger viewport dimension so
    // the square covers the view regardless of how it is rotated.
    let vp = view.viewport();
    let width_m = vp.width as f64 * meters_per_pixel;
    let height_m = vp.height as f64 * meters_per_pixel;
    let radius_m = width_m.max(height_m);

    Some([
        geodesy::displace(center, radius_m, azimuth::SOUTHWEST),
        geodesy::displace(center, radius_m, azimuth::SOUTHEAST),
        geodesy::displace(center, radius_m, azimuth::NORTHWEST),
        geodesy::displace(center, radius_m, azimuth::NORTHEAST),
    ])
}

/// The per-frame combination policy (see module docs). Always returns a
/// footprint contained in `max_bounds`.
pub fn visible_bounds<V: GlobeView + ?Sized>(view: &V, max_bounds: GeoBounds) -> GeoBounds {
    let corners = screen_corners(view);
    if !corners_valid(&corners) {
        return max_bounds;
    }

    let Some(approx) = center_scale_corners(view) else {
        // Corner rays hit but the center ray missed; treat the frame like
        // the invalid case rather than crashing on a half-usable estimate.
        log::debug!("viewport center ray missed the globe, using max bounds");
        return max_bounds;
    };

    let approx_bounds = GeoBounds::from_corners(approx).buffer(FOOTPRINT_BUFFER);
    max_bounds.intersect(approx_bounds)
}

#[inline]
fn distance3(a: [f64; 3], b: [f64; 3]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;

    /// Scriptable `GlobeView` for GPU-free tests.
    pub struct FakeGlobeView {
        pub viewport: Viewport,
        pub corners: [Option<LatLon>; 4],
        pub center: Option<LatLon>,
        pub eye: [f64; 3],
        pub meters_per_pixel: f64,
    }

    impl FakeGlobeView {
        /// A view whose corner rays all resolve and whose center sits at
        /// `center` with a fixed pixel scale.
        pub fn valid(center: LatLon, meters_per_pixel: f64) -> Self {
            let c = Some(center);
            Self {
                viewport: Viewport::new(0, 0, 800, 600),
                corners: [c, c, c, c],
                center: c,
                eye: geoplot::geodesy::geodetic_to_ecef(center.lat_deg, center.lon_deg, 10_000.0),
                meters_per_pixel,
            }
        }
    }

    impl GlobeView for FakeGlobeView {
        fn viewport(&self) -> Viewport {
            self.viewport
        }

        fn unproject(&self, screen_x: f64, screen_y: f64) -> Option<LatLon> {
            let vp = self.viewport;
            let max_x = (vp.x + vp.width as i32) as f64;
            let max_y = (vp.y + vp.height as i32) as f64;

            let index = match (screen_x == vp.x as f64, screen_y == vp.y as f64) {
                (true, true) => 0,
                (true, false) if screen_y == max_y => 1,
                (false, false) if screen_x == max_x && screen_y == max_y => 2,
                (false, true) if screen_x == max_x => 3,
                _ => return None,
            };
            self.corners[index]
        }

        fn center_position(&self) -> Option<LatLon> {
            self.center
        }

        fn eye_position(&self) -> [f64; 3] {
            self.eye
        }

        fn world_point(&self, position: LatLon) -> [f64; 3] {
            geoplot::geodesy::geodetic_to_ecef(position.lat_deg, position.lon_deg, 0.0)
        }

        fn pixel_size_at_distance(&self, _distance_m: f64) -> f64 {
            self.meters_per_pixel
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeGlobeView;
    use super::*;

    const MAX_BOUNDS: GeoBounds = GeoBounds {
        min_lat: 10.0,
        max_lat: 20.0,
        min_lon: 30.0,
        max_lon: 40.0,
    };

    #[test]
    fn any_null_corner_falls_back_to_max_bounds() {
        let mut view = FakeGlobeView::valid(LatLon::from_deg(15.0, 35.0), 10.0);
        view.corners[2] = None;

        assert_eq!(visible_bounds(&view, MAX_BOUNDS), MAX_BOUNDS);
    }

    #[test]
    fn center_miss_with_valid_corners_falls_back_to_max_bounds() {
        let mut view = FakeGlobeView::valid(LatLon::from_deg(15.0, 35.0), 10.0);
        view.center = None;

        assert_eq!(visible_bounds(&view, MAX_BOUNDS), MAX_BOUNDS);
    }

    #[test]
    fn buffered_estimate_is_clamped_to_max_bounds() {
        // 800 px * ~416 m/px ≈ 333 km radius ≈ 3 degrees of arc; with the
        // 50% buffer the southern edge of the estimate dips below
        // max_bounds.min_lat while the northern edge stays inside.
        let center = LatLon::from_deg(12.0, 35.0);
        let view = FakeGlobeView::valid(center, 416.0);

        let bounds = visible_bounds(&view, MAX_BOUNDS);

        assert_eq!(bounds.min_lat, MAX_BOUNDS.min_lat);
        assert!(bounds.max_lat < MAX_BOUNDS.max_lat);
        assert!(bounds.max_lat > center.lat_deg);
        assert!(bounds.min_lon > MAX_BOUNDS.min_lon);
        assert!(bounds.max_lon < MAX_BOUNDS.max_lon);
    }

    #[test]
    fn tight_view_is_not_clamped() {
        let center = LatLon::from_deg(15.0, 35.0);
        let view = FakeGlobeView::valid(center, 10.0);

        let bounds = visible_bounds(&view, MAX_BOUNDS);

        assert!(bounds.min_lat > MAX_BOUNDS.min_lat);
        assert!(bounds.max_lat < MAX_BOUNDS.max_lat);
        assert!(bounds.min_lat < center.lat_deg && center.lat_deg < bounds.max_lat);
    }

    #[test]
    fn strategy_b_corners_straddle_the_center() {
        let center = LatLon::from_deg(15.0, 35.0);
        let view = FakeGlobeView::valid(center, 50.0);

        let corners = center_scale_corners(&view).unwrap();
        let bounds = GeoBounds::from_corners(corners);

        assert!(bounds.min_lat < center.lat_deg && center.lat_deg < bounds.max_lat);
        assert!(bounds.min_lon < center.lon_deg && center.lon_deg < bounds.max_lon);
    }
}
