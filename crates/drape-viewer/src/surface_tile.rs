//! A surface tile that re-fits itself to the visible footprint every frame.
//!
//! Each frame, before the 3D scene is drawn:
//!
//! 1. the geographic bounds are re-estimated from the camera and clamped to
//!    the allowed region,
//! 2. the 2D axes are re-derived by projecting the bounds corners, so the
//!    offscreen plot covers exactly the draped area,
//! 3. the plot is painted into the offscreen texture,
//! 4. the textured tile's corners are moved to the new bounds.
//!
//! The offscreen target and the tile are created lazily on the first frame
//! and then reused; only their geometry and texel content change. This
//! keeps the full texture resolution concentrated on whatever region is
//! actually on screen.

use crate::footprint::{self, GlobeView};
use crate::renderer::offscreen::{OffscreenPainter, OffscreenTarget};
use crate::renderer::pipelines::drape::TextureSurfaceTile;
use geoplot::axis::Axis2;
use geoplot::bounds::{self, GeoBounds};
use geoplot::geodesy::LatLon;
use geoplot::projection::GeoProjection;

pub struct DynamicSurfaceTile {
    /// The region the tile may ever cover; footprints are clamped to it.
    max_bounds: GeoBounds,
    /// Current draped bounds, updated every frame.
    bounds: GeoBounds,
    /// Current draped corners (SW, SE, NE, NW).
    corners: [LatLon; 4],
    /// Projected 2D extent of `bounds`, fed to the offscreen painter.
    axes: Axis2,
    projection: Box<dyn GeoProjection>,

    width: u32,
    height: u32,
    surface_fmt: wgpu::TextureFormat,
    depth_fmt: wgpu::TextureFormat,
    offscreen: Option<OffscreenTarget>,
    tile: Option<TextureSurfaceTile>,
}

impl DynamicSurfaceTile {
    pub fn new(
        max_bounds: GeoBounds,
        projection: Box<dyn GeoProjection>,
        width: u32,
        height: u32,
        surface_fmt: wgpu::TextureFormat,
        depth_fmt: wgpu::TextureFormat,
    ) -> Self {
        let mut tile = Self {
            max_bounds,
            bounds: max_bounds,
            corners: max_bounds.corners(),
            axes: Axis2::new(0.0, 1.0, 0.0, 1.0),
            projection,
            width,
            height,
            surface_fmt,
            depth_fmt,
            offscreen: None,
            tile: None,
        };
        tile.update_axes();
        tile
    }

    pub fn bounds(&self) -> GeoBounds {
        self.bounds
    }

    pub fn max_bounds(&self) -> GeoBounds {
        self.max_bounds
    }

    /// Replaces the allowed region. The current bounds are clamped into the
    /// new region right away; the next frame's footprint estimate refits
    /// them properly.
    pub fn set_max_corners(&mut self, corners: [LatLon; 4]) {
        self.max_bounds = GeoBounds::from_corners(corners);
        self.bounds = self.bounds.intersect(self.max_bounds);
        self.corners = self.bounds.corners();
        self.update_axes();
    }

    pub fn axes(&self) -> &Axis2 {
        &self.axes
    }

    pub fn corners(&self) -> [LatLon; 4] {
        self.corners
    }

    /// Re-estimates the draped bounds from the current view and re-derives
    /// the 2D axes from the projected corners. GPU-free.
    pub fn update_geometry(&mut self, view: &dyn GlobeView) {
        self.bounds = footprint::visible_bounds(view, self.max_bounds);
        self.corners = self.bounds.corners();
        self.update_axes();
    }

    fn update_axes(&mut self) {
        let projected: [[f64; 2]; 4] = [
            self.projection.project(self.corners[0]),
            self.projection.project(self.corners[1]),
            self.projection.project(self.corners[2]),
            self.projection.project(self.corners[3]),
        ];
        self.axes
            .x
            .set(bounds::min_x(&projected), bounds::max_x(&projected));
        self.axes
            .y
            .set(bounds::min_y(&projected), bounds::max_y(&projected));
    }

    /// Runs the per-frame update: geometry refit, offscreen paint, tile
    /// corner move. Call once per frame before drawing the 3D scene.
    pub fn pre_render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &dyn GlobeView,
        painter: &mut dyn OffscreenPainter,
    ) {
        self.update_geometry(view);

        let offscreen = self
            .offscreen
            .get_or_insert_with(|| OffscreenTarget::new(device, self.width, self.height));

        offscreen.render_with(device, queue, painter, &self.axes);

        if self.tile.is_none() {
            self.tile = Some(TextureSurfaceTile::new(
                device,
                offscreen.color_view(),
                self.surface_fmt,
                self.depth_fmt,
                self.corners,
            ));
        }
        if let Some(tile) = &mut self.tile {
            tile.set_corners(self.corners);
        }
    }

    /// Draws the draped tile. No-op until the first `pre_render`.
    pub fn draw<'a>(
        &'a self,
        rpass: &mut wgpu::RenderPass<'a>,
        queue: &wgpu::Queue,
        camera: &crate::camera::Camera,
    ) {
        if let Some(tile) = &self.tile {
            tile.draw(rpass, queue, camera);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::footprint::fake::FakeGlobeView;
    use geoplot::projection::TangentPlane;

    const MAX_BOUNDS: GeoBounds = GeoBounds {
        min_lat: 51.5,
        max_lat: 53.5,
        min_lon: 11.5,
        max_lon: 15.5,
    };

    fn test_tile() -> DynamicSurfaceTile {
        let origin = LatLon::from_deg(52.5, 13.5);
        DynamicSurfaceTile::new(
            MAX_BOUNDS,
            Box::new(TangentPlane::new(origin)),
            1024,
            1024,
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Depth32Float,
        )
    }

    #[test]
    fn starts_covering_the_whole_allowed_region() {
        let tile = test_tile();
        assert_eq!(tile.bounds(), MAX_BOUNDS);
        assert_eq!(tile.corners()[0].lat_deg, MAX_BOUNDS.min_lat);
        assert!(tile.axes().x.min < tile.axes().x.max);
        assert!(tile.axes().y.min < tile.axes().y.max);
    }

    #[test]
    fn tight_view_shrinks_bounds_and_axes() {
        let mut tile = test_tile();
        let wide = tile.axes().x.span();

        let view = FakeGlobeView::valid(LatLon::from_deg(52.5, 13.5), 20.0);
        tile.update_geometry(&view);

        let bounds = tile.bounds();
        assert!(bounds.min_lat > MAX_BOUNDS.min_lat);
        assert!(bounds.max_lat < MAX_BOUNDS.max_lat);
        assert!(bounds.min_lon > MAX_BOUNDS.min_lon);
        assert!(bounds.max_lon < MAX_BOUNDS.max_lon);
        assert!(tile.axes().x.span() < wide);
    }

    #[test]
    fn invalid_view_restores_the_full_region() {
        let mut tile = test_tile();

        let tight = FakeGlobeView::valid(LatLon::from_deg(52.5, 13.5), 20.0);
        tile.update_geometry(&tight);
        assert_ne!(tile.bounds(), MAX_BOUNDS);

        let mut horizon = FakeGlobeView::valid(LatLon::from_deg(52.5, 13.5), 20.0);
        horizon.corners[0] = None;
        tile.update_geometry(&horizon);
        assert_eq!(tile.bounds(), MAX_BOUNDS);
    }

    #[test]
    fn shrinking_the_allowed_region_clamps_current_bounds() {
        let mut tile = test_tile();
        assert_eq!(tile.bounds(), MAX_BOUNDS);

        let smaller = GeoBounds::new(52.0, 53.0, 12.5, 14.5);
        tile.set_max_corners(smaller.corners());

        assert_eq!(tile.max_bounds(), smaller);
        assert_eq!(tile.bounds(), smaller);
    }

    #[test]
    fn axes_track_the_view_center() {
        let mut tile = test_tile();

        let west = FakeGlobeView::valid(LatLon::from_deg(52.5, 12.5), 20.0);
        tile.update_geometry(&west);
        let west_x = tile.axes().x;

        let east = FakeGlobeView::valid(LatLon::from_deg(52.5, 14.5), 20.0);
        tile.update_geometry(&east);

        assert!(tile.axes().x.min > west_x.min);
        assert!(tile.axes().x.max > west_x.max);
    }
}
