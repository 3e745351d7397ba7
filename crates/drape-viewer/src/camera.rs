use crate::footprint::{GlobeView, Viewport};
use geoplot::geodesy::{ecef_to_geodetic, geodetic_to_ecef, wgs84, LatLon};
use glam::{DMat3, DVec3, Mat4};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

/// This matrix converts clip-space coordinates from OpenGL conventions (Y-up, Z in [-1, 1])
/// to WebGPU conventions (Y-down, Z in [0, 1]).
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Mat4 = Mat4::from_cols_array(&[
    -1.0,  0.0, 0.0, 0.0,
    0.0, -1.0, 0.0, 0.0,
    0.0,  0.0, 0.5, 0.0,
    0.0,  0.0, 0.5, 1.0,
]);

pub const FOV_Y_RAD: f64 = 60.0 * std::f64::consts::PI / 180.0;
pub const NEAR_M: f32 = 10.0;
pub const FAR_M: f32 = 20_000_000.0;

#[derive(Debug, Clone)]
pub struct Camera {
    // --- Orbital Parameters (Primary State) ---
    /// The ECEF coordinate (meters) the camera orbits around.
    pub target_ecef: DVec3,
    /// Distance from the camera to the target (meters).
    pub radius_m: f64,
    /// Azimuth angle around the target's local "up" vector (radians).
    pub azimuth_rad: f64,
    /// Elevation angle from the target's local tangent plane (radians).
    pub elevation_rad: f64,

    // --- Derived Properties (Updated by `update()`) ---
    /// Camera position in ECEF meters.
    position_ecef: DVec3,
    /// Geodetic latitude in degrees.
    pub lat_deg: f64,
    /// Geodetic longitude in degrees.
    pub lon_deg: f64,
    /// Geodetic height above the ellipsoid in meters.
    pub h_m: f64,

    // --- View geometry ---
    viewport: Viewport,
    /// Projection matrix for rendering (f32; rays are rebuilt in f64).
    pub proj: Mat4,
}

impl Camera {
    /// Creates a new orbital camera over the given geodetic target.
    pub fn new(target_lat_deg: f64, target_lon_deg: f64, radius_m: f64, viewport: Viewport) -> Self {
        let target_ecef = DVec3::from(geodetic_to_ecef(target_lat_deg, target_lon_deg, 0.0));

        let mut camera = Self {
            target_ecef,
            radius_m,
            azimuth_rad: 180.0f64.to_radians(),
            elevation_rad: 30.0f64.to_radians(),
            position_ecef: DVec3::ZERO, // placeholder
            lat_deg: 0.0,               // placeholder
            lon_deg: 0.0,               // placeholder
            h_m: 0.0,                   // placeholder
            viewport,
            proj: Mat4::IDENTITY, // placeholder
        };

        camera.set_viewport(viewport);
        camera.update();
        camera
    }

    /// Updates the viewport rectangle and rebuilds the projection matrix.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.proj = Mat4::perspective_rh(
            FOV_Y_RAD as f32,
            viewport.width as f32 / viewport.height.max(1) as f32,
            NEAR_M,
            FAR_M,
        );
    }

    /// Recalculates the camera's ECEF position and geodetic coordinates from
    /// its orbital parameters. Must be called after any orbital change.
    pub fn update(&mut self) {
        // Local tangent plane of the target defines the orbit frame.
        let (target_lat, target_lon, _) =
            ecef_to_geodetic(self.target_ecef.x, self.target_ecef.y, self.target_ecef.z);
        let (sin_lat, cos_lat) = target_lat.to_radians().sin_cos();
        let (sin_lon, cos_lon) = target_lon.to_radians().sin_cos();

        let east = DVec3::new(-sin_lon, cos_lon, 0.0);
        let north = DVec3::new(-sin_lat * cos_lon, -sin_lat * sin_lon, cos_lat);
        let up = DVec3::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat);
        let enu_to_ecef = DMat3::from_cols(east, north, up);

        // Camera offset from the target in ENU spherical coordinates.
        let (sin_az, cos_az) = self.azimuth_rad.sin_cos();
        let (sin_el, cos_el) = self.elevation_rad.sin_cos();
        let offset_enu = DVec3::new(
            self.radius_m * cos_el * sin_az, // East
            self.radius_m * cos_el * cos_az, // North
            self.radius_m * sin_el,          // Up
        );

        self.position_ecef = self.target_ecef + enu_to_ecef * offset_enu;

        let (lat, lon, h) =
            ecef_to_geodetic(self.position_ecef.x, self.position_ecef.y, self.position_ecef.z);
        self.lat_deg = lat;
        self.lon_deg = lon;
        self.h_m = h;
    }

    /// Returns camera position in ECEF meters.
    #[inline]
    pub fn ecef_m(&self) -> [f64; 3] {
        self.position_ecef.into()
    }

    /// Returns combined view-projection matrix in ECEF meters. The view part
    /// is rotation-only; geometry is supplied camera-relative.
    pub fn view_proj_ecef(&self) -> Mat4 {
        OPENGL_TO_WGPU_MATRIX * self.proj * self.view_ecef()
    }

    /// Returns a rotation-only view matrix from ECEF into the camera frame.
    /// The translation is applied CPU-side in f64 for precision.
    pub fn view_ecef(&self) -> Mat4 {
        let (f, s, u) = self.basis();

        // The view matrix is the inverse of the camera's basis matrix; for
        // an orthonormal basis the inverse is the transpose. Combined with
        // the clip-space flip above, screen-right maps to +s and screen-up
        // to +u.
        let rot = DMat3::from_cols(-s, -u, -f).transpose();
        Mat4::from_mat3(rot.as_mat3())
    }

    /// Orthonormal camera basis in f64: forward toward the target, plus the
    /// two lateral axes that span the screen after the clip-space flip.
    fn basis(&self) -> (DVec3, DVec3, DVec3) {
        let f = (self.target_ecef - self.position_ecef).normalize();

        // Geodetic "up" at the camera position.
        let (lat_rad, lon_rad) = (self.lat_deg.to_radians(), self.lon_deg.to_radians());
        let (sin_lat, cos_lat) = lat_rad.sin_cos();
        let (sin_lon, cos_lon) = lon_rad.sin_cos();
        let world_up = DVec3::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat);

        let s = f.cross(world_up).normalize();
        let u = s.cross(f);

        (f, s, u)
    }

    /// Ray through a screen point, in ECEF. Screen y grows downward.
    fn ray_direction(&self, screen_x: f64, screen_y: f64) -> DVec3 {
        let vp = self.viewport;
        let ndc_x = 2.0 * (screen_x - vp.x as f64) / vp.width.max(1) as f64 - 1.0;
        let ndc_y = 1.0 - 2.0 * (screen_y - vp.y as f64) / vp.height.max(1) as f64;

        let tan_half = (FOV_Y_RAD * 0.5).tan();
        let aspect = vp.width.max(1) as f64 / vp.height.max(1) as f64;

        let (f, s, u) = self.basis();
        (f + s * (ndc_x * tan_half * aspect) + u * (ndc_y * tan_half)).normalize()
    }

    /// Intersects an eye ray with the WGS-84 ellipsoid. `None` when the ray
    /// clears the horizon or points away from the globe.
    fn intersect_ellipsoid(&self, direction: DVec3) -> Option<LatLon> {
        // Scale to the unit sphere; the ray parameter survives the scaling.
        let scale = DVec3::new(1.0 / wgs84::A, 1.0 / wgs84::A, 1.0 / wgs84::B);
        let origin = self.position_ecef * scale;
        let dir = direction * scale;

        let a = dir.dot(dir);
        let b = 2.0 * origin.dot(dir);
        let c = origin.dot(origin) - 1.0;

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrt_d = discriminant.sqrt();
        let mut t = (-b - sqrt_d) / (2.0 * a);
        if t < 0.0 {
            t = (-b + sqrt_d) / (2.0 * a);
        }
        if t < 0.0 {
            return None;
        }

        let hit = self.position_ecef + direction * t;
        let (lat, lon, _) = ecef_to_geodetic(hit.x, hit.y, hit.z);
        Some(LatLon::from_deg(lat, lon))
    }
}

impl GlobeView for Camera {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn unproject(&self, screen_x: f64, screen_y: f64) -> Option<LatLon> {
        self.intersect_ellipsoid(self.ray_direction(screen_x, screen_y))
    }

    fn center_position(&self) -> Option<LatLon> {
        let vp = self.viewport;
        self.unproject(
            vp.x as f64 + vp.width as f64 * 0.5,
            vp.y as f64 + vp.height as f64 * 0.5,
        )
    }

    fn eye_position(&self) -> [f64; 3] {
        self.ecef_m()
    }

    fn world_point(&self, position: LatLon) -> [f64; 3] {
        geodetic_to_ecef(position.lat_deg, position.lon_deg, 0.0)
    }

    fn pixel_size_at_distance(&self, distance_m: f64) -> f64 {
        distance_m * 2.0 * (FOV_Y_RAD * 0.5).tan() / self.viewport.height.max(1) as f64
    }
}

pub struct CameraController {
    mouse_down: bool,
    last_mouse: Option<(f64, f64)>,
}

impl CameraController {
    /// Creates a new controller with default state.
    pub fn new() -> Self {
        Self {
            mouse_down: false,
            last_mouse: None,
        }
    }

    /// Handles window events and updates the camera.
    pub fn handle_event(&mut self, event: &WindowEvent, camera: &mut Camera) {
        match event {
            WindowEvent::MouseInput { button, state, .. } => {
                if *button == MouseButton::Left {
                    self.mouse_down = *state == ElementState::Pressed;
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.handle_cursor_orbit((position.x, position.y), camera);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 120.0,
                };

                self.handle_scroll(scroll, camera);
            }
            _ => {}
        }
    }

    /// Adjusts camera orbit radius based on scroll input.
    fn handle_scroll(&mut self, delta: f32, camera: &mut Camera) {
        // Positive delta = scroll up = zoom in = decrease radius.
        let zoom = 1.1_f64.powf(-delta as f64);
        camera.radius_m *= zoom;
        camera.radius_m = camera.radius_m.clamp(100.0, 5_000_000.0);
        camera.update();
    }

    /// Rotates the camera around the target while the left button is held.
    fn handle_cursor_orbit(&mut self, xy: (f64, f64), camera: &mut Camera) {
        if let Some(last) = self.last_mouse {
            if self.mouse_down {
                let dx = (xy.0 - last.0) * 0.005;
                let dy = (last.1 - xy.1) * 0.005;

                camera.azimuth_rad -= dx;
                camera.elevation_rad -= dy;

                // Clamp elevation to prevent flipping over the poles.
                camera.elevation_rad = camera
                    .elevation_rad
                    .clamp(1.0f64.to_radians(), 89.0f64.to_radians());

                camera.update();
            }
        }
        self.last_mouse = Some(xy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_camera(elevation_deg: f64, radius_m: f64) -> Camera {
        let mut camera = Camera::new(52.52, 13.40, radius_m, Viewport::new(0, 0, 1280, 720));
        camera.elevation_rad = elevation_deg.to_radians();
        camera.update();
        camera
    }

    #[test]
    fn center_unprojects_near_the_orbit_target() {
        let camera = test_camera(45.0, 50_000.0);
        let center = camera.center_position().unwrap();

        assert!((center.lat_deg - 52.52).abs() < 0.05);
        assert!((center.lon_deg - 13.40).abs() < 0.05);
    }

    #[test]
    fn skyward_ray_misses_the_globe() {
        // Nearly horizontal view: the ray through the top of the screen
        // points well above the horizon.
        let camera = test_camera(1.0, 500_000.0);
        assert!(camera.unproject(640.0, 0.0).is_none());
    }

    #[test]
    fn pixel_size_scales_with_distance() {
        let camera = test_camera(45.0, 50_000.0);

        let near = camera.pixel_size_at_distance(1_000.0);
        let far = camera.pixel_size_at_distance(100_000.0);

        assert!(near > 0.0);
        assert!((far / near - 100.0).abs() < 1e-9);
    }
}
