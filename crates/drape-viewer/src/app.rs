use crate::{
    camera::{Camera, CameraController},
    footprint::Viewport,
    plot::StackedPlotPainter,
    renderer::{offscreen::OFFSCREEN_FORMAT, Renderer, DEPTH_FORMAT},
    surface_tile::DynamicSurfaceTile,
    ui,
};
use anyhow::Result;
use geoplot::bounds::GeoBounds;
use geoplot::geodesy::LatLon;
use geoplot::projection::TangentPlane;
use std::sync::Arc;
use winit::{event::WindowEvent, window::Window};

/// Study region around Berlin. Drape footprints never leave it.
pub const MAX_BOUNDS: GeoBounds = GeoBounds {
    min_lat: 51.5,
    max_lat: 53.5,
    min_lon: 11.5,
    max_lon: 15.5,
};

/// Offscreen plot texture edge, pixels.
const OFFSCREEN_SIZE: u32 = 1024;

pub struct App {
    pub renderer: Renderer,
    pub camera: Camera,
    pub camera_controller: CameraController,
    pub egui_ctx: egui::Context,
    pub egui_state: egui_winit::State,
    pub surface_tile: DynamicSurfaceTile,
    pub painter: StackedPlotPainter,
}

impl App {
    pub async fn new(window: Arc<Window>) -> Result<Self> {
        // The ground patch extends past the study region so the drape tile
        // never hangs over its edge.
        let renderer = Renderer::new(window.clone(), MAX_BOUNDS.buffer(0.25)).await?;
        let size = renderer.gfx.size;

        // Default camera, orbiting the center of the study region.
        let center = LatLon::from_deg(
            (MAX_BOUNDS.min_lat + MAX_BOUNDS.max_lat) * 0.5,
            (MAX_BOUNDS.min_lon + MAX_BOUNDS.max_lon) * 0.5,
        );
        let camera = Camera::new(
            center.lat_deg,
            center.lon_deg,
            300_000.0,
            Viewport::new(0, 0, size.width, size.height),
        );
        let camera_controller = CameraController::new();

        let surface_tile = DynamicSurfaceTile::new(
            MAX_BOUNDS,
            Box::new(TangentPlane::new(center)),
            OFFSCREEN_SIZE,
            OFFSCREEN_SIZE,
            renderer.gfx.config.format,
            DEPTH_FORMAT,
        );
        let painter = StackedPlotPainter::new(&renderer.gfx.device, OFFSCREEN_FORMAT);

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            &*window,
            None,
            None,
        );

        Ok(Self {
            renderer,
            camera,
            camera_controller,
            egui_ctx,
            egui_state,
            surface_tile,
            painter,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.renderer.resize(new_size);
            self.camera
                .set_viewport(Viewport::new(0, 0, new_size.width, new_size.height));
        }
    }

    pub fn handle_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        let response = self.egui_state.on_window_event(window, event);
        if response.consumed {
            return true;
        }

        self.camera_controller.handle_event(event, &mut self.camera);

        if let WindowEvent::Resized(physical_size) = event {
            self.resize(*physical_size);
        }

        false
    }

    pub fn render(&mut self, window: &Window) -> Result<(), wgpu::SurfaceError> {
        let frame = self.renderer.gfx.surface.get_current_texture()?;
        let swap_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        // Refit the drape to the current view and repaint the plot texture
        // before the 3D pass samples it.
        self.surface_tile.pre_render(
            &self.renderer.gfx.device,
            &self.renderer.gfx.queue,
            &self.camera,
            &mut self.painter,
        );

        self.renderer
            .render(&swap_view, &self.surface_tile, &self.camera);

        let egui_input = self.egui_state.take_egui_input(window);
        self.egui_ctx.begin_frame(egui_input);

        ui::draw_hud(
            &self.egui_ctx,
            self.camera.lat_deg,
            self.camera.lon_deg,
            self.camera.h_m,
            self.surface_tile.bounds(),
        );
        ui::draw_band_panel(&self.egui_ctx, &mut self.painter.layout);

        let egui_output = self.egui_ctx.end_frame();
        let shapes = self
            .egui_ctx
            .tessellate(egui_output.shapes, self.egui_ctx.pixels_per_point());

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [
                self.renderer.gfx.config.width,
                self.renderer.gfx.config.height,
            ],
            pixels_per_point: self.egui_ctx.pixels_per_point(),
        };

        let mut encoder = self
            .renderer
            .gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("UI Encoder"),
            });

        for (id, delta) in &egui_output.textures_delta.set {
            self.renderer.egui_renderer.update_texture(
                &self.renderer.gfx.device,
                &self.renderer.gfx.queue,
                *id,
                delta,
            );
        }

        self.renderer.egui_renderer.update_buffers(
            &self.renderer.gfx.device,
            &self.renderer.gfx.queue,
            &mut encoder,
            &shapes,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("EGUI Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &swap_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.renderer
                .egui_renderer
                .render(&mut render_pass, &shapes, &screen_descriptor);
        }

        for id in &egui_output.textures_delta.free {
            self.renderer.egui_renderer.free_texture(id);
        }

        self.renderer
            .gfx
            .queue
            .submit(std::iter::once(encoder.finish()));
        frame.present();

        Ok(())
    }
}
