//! The main rendering orchestrator. Owns the GPU context and the 3D
//! pipelines that draw the globe scene.

pub mod context;
pub mod offscreen;
pub mod pipelines;

use self::{context::GfxContext, pipelines::graticule::GraticulePipeline};
use crate::{camera::Camera, surface_tile::DynamicSurfaceTile};
use geoplot::bounds::GeoBounds;
use std::sync::Arc;
use winit::window::Window;

pub use self::context::DEPTH_FORMAT;

/// Owns all rendering-related state.
pub struct Renderer {
    pub gfx: GfxContext,
    pub graticule: GraticulePipeline,
    pub egui_renderer: egui_wgpu::Renderer,
}

impl Renderer {
    pub async fn new(window: Arc<Window>, ground_region: GeoBounds) -> anyhow::Result<Self> {
        let gfx = GfxContext::new(window).await?;

        let graticule =
            GraticulePipeline::new(&gfx.device, gfx.config.format, DEPTH_FORMAT, ground_region);

        let egui_renderer = egui_wgpu::Renderer::new(&gfx.device, gfx.config.format, None, 1);

        Ok(Self {
            gfx,
            graticule,
            egui_renderer,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        self.gfx.resize(new_size);
    }

    /// Draws the globe scene: the ground patch first, then the draped plot
    /// tile blended on top of it.
    pub fn render(&mut self, swap_view: &wgpu::TextureView, tile: &DynamicSurfaceTile, camera: &Camera) {
        let mut encoder = self
            .gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Globe Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: swap_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.004,
                            g: 0.008,
                            b: 0.016,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.gfx.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.graticule.draw(&mut pass, &self.gfx.queue, camera);
            tile.draw(&mut pass, &self.gfx.queue, camera);
        }

        self.gfx.queue.submit(std::iter::once(encoder.finish()));
    }
}
