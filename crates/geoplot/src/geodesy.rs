//! WGS-84 geodesy: geodetic/ECEF conversions and spherical displacement.

/// A geographic position in degrees. Plain value type; no range checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon {
    pub lat_deg: f64,
    pub lon_deg: f64,
}

impl LatLon {
    #[inline]
    pub fn from_deg(lat_deg: f64, lon_deg: f64) -> Self {
        Self { lat_deg, lon_deg }
    }
}

pub mod wgs84 {
    /// Semi-major axis (equatorial radius) in meters.
    pub const A: f64 = 6_378_137.0;

    /// Flattening factor (1 / 298.257223563).
    pub const F: f64 = 1.0 / 298.257_223_563;

    /// First eccentricity squared.
    pub const E2: f64 = F * (2.0 - F);

    /// Semi-minor axis (polar radius) in meters.
    pub const B: f64 = A * (1.0 - F);

    /// Second eccentricity squared.
    pub const E2P: f64 = (A * A - B * B) / (B * B);
}

/// Authalic sphere radius in meters, used for great-circle displacement where
/// ellipsoidal rigor buys nothing (the displacement feeds a heuristic that is
/// buffered by 50% downstream).
pub const SPHERE_RADIUS_M: f64 = 6_371_007.18;

/// Compass azimuths (radians, clockwise from north) for the four diagonal
/// headings used when extrapolating a bounding square from a center point.
pub mod azimuth {
    use std::f64::consts::FRAC_PI_4;

    pub const NORTHEAST: f64 = FRAC_PI_4;
    pub const SOUTHEAST: f64 = 3.0 * FRAC_PI_4;
    pub const SOUTHWEST: f64 = 5.0 * FRAC_PI_4;
    pub const NORTHWEST: f64 = 7.0 * FRAC_PI_4;
}

#[inline]
pub fn geodetic_to_ecef(lat_deg: f64, lon_deg: f64, h_m: f64) -> [f64; 3] {
    let lat_rad = lat_deg.to_radians();
    let lon_rad = lon_deg.to_radians();

    let (sin_lat, cos_lat) = lat_rad.sin_cos();
    let (sin_lon, cos_lon) = lon_rad.sin_cos();

    // Radius of curvature in the prime vertical.
    let n = wgs84::A / (1.0 - wgs84::E2 * sin_lat * sin_lat).sqrt();

    let x = (n + h_m) * cos_lat * cos_lon;
    let y = (n + h_m) * cos_lat * sin_lon;
    let z = (n * (1.0 - wgs84::E2) + h_m) * sin_lat;

    [x, y, z]
}

/// Closed-form (Bowring-style) ECEF to geodetic conversion.
/// Returns (latitude deg, longitude deg, height m).
#[inline]
pub fn ecef_to_geodetic(x: f64, y: f64, z: f64) -> (f64, f64, f64) {
    let p = (x * x + y * y).sqrt();
    let lon = y.atan2(x);

    let theta = (z * wgs84::A).atan2(p * wgs84::B);
    let (sin_theta, cos_theta) = theta.sin_cos();

    let lat_numerator = z + wgs84::E2P * wgs84::B * sin_theta * sin_theta * sin_theta;
    let lat_denominator = p - wgs84::E2 * wgs84::A * cos_theta * cos_theta * cos_theta;
    let lat = lat_numerator.atan2(lat_denominator);

    let sin_lat = lat.sin();
    let n = wgs84::A / (1.0 - wgs84::E2 * sin_lat * sin_lat).sqrt();
    let h = p / lat.cos() - n;

    (lat.to_degrees(), lon.to_degrees(), h)
}

/// Displaces `origin` by `distance_m` meters along `azimuth_rad` (clockwise
/// from north) on the authalic sphere.
pub fn displace(origin: LatLon, distance_m: f64, azimuth_rad: f64) -> LatLon {
    let delta = distance_m / SPHERE_RADIUS_M;
    let (sin_d, cos_d) = delta.sin_cos();

    let lat1 = origin.lat_deg.to_radians();
    let lon1 = origin.lon_deg.to_radians();
    let (sin_lat1, cos_lat1) = lat1.sin_cos();
    let (sin_az, cos_az) = azimuth_rad.sin_cos();

    let lat2 = (sin_lat1 * cos_d + cos_lat1 * sin_d * cos_az).asin();
    let lon2 = lon1 + (sin_az * sin_d * cos_lat1).atan2(cos_d - sin_lat1 * lat2.sin());

    LatLon::from_deg(lat2.to_degrees(), lon2.to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ecef_round_trip() {
        let ecef = geodetic_to_ecef(52.52, 13.40, 120.0);
        let (lat, lon, h) = ecef_to_geodetic(ecef[0], ecef[1], ecef[2]);

        assert!((lat - 52.52).abs() < 1e-9);
        assert!((lon - 13.40).abs() < 1e-9);
        assert!((h - 120.0).abs() < 1e-3);
    }

    #[test]
    fn displace_north_increases_latitude() {
        let origin = LatLon::from_deg(10.0, 30.0);
        let moved = displace(origin, 111_000.0, 0.0);

        // ~1 degree of arc, longitude unchanged going due north.
        assert!((moved.lat_deg - 11.0).abs() < 0.05);
        assert!((moved.lon_deg - 30.0).abs() < 1e-9);
    }

    #[test]
    fn displace_diagonals_straddle_origin() {
        let origin = LatLon::from_deg(45.0, 0.0);
        let ne = displace(origin, 50_000.0, azimuth::NORTHEAST);
        let sw = displace(origin, 50_000.0, azimuth::SOUTHWEST);

        assert!(ne.lat_deg > origin.lat_deg && ne.lon_deg > origin.lon_deg);
        assert!(sw.lat_deg < origin.lat_deg && sw.lon_deg < origin.lon_deg);
    }
}
