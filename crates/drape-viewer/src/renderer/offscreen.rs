//! Offscreen render target for the draped plot texture.

use anyhow::Result;
use geoplot::axis::Axis2;

/// Format of the offscreen color attachment the drape tile samples.
pub const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Draws 2D content into the offscreen pass. The axes carry the projected
/// extent of the geographic region the texture will be draped over, so a
/// painter maps data through them to cover the target edge to edge.
pub trait OffscreenPainter {
    fn paint<'a>(
        &'a mut self,
        pass: &mut wgpu::RenderPass<'a>,
        queue: &wgpu::Queue,
        axes: &Axis2,
        width: u32,
        height: u32,
    ) -> Result<()>;
}

/// A fixed-size color target rendered once per frame and sampled by the
/// 3D drape-tile pipeline. Created once; resizing requires replacing both
/// the target and the tile that wraps its texture.
pub struct OffscreenTarget {
    // Keep the texture alive for the lifetime of the view.
    _color_tex: wgpu::Texture,
    color: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl OffscreenTarget {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);

        let color_tex = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Drape Offscreen Color"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: OFFSCREEN_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        Self {
            color: color_tex.create_view(&wgpu::TextureViewDescriptor::default()),
            _color_tex: color_tex,
            width,
            height,
        }
    }

    pub fn color_view(&self) -> &wgpu::TextureView {
        &self.color
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Runs one offscreen paint: clears the target, hands the pass to the
    /// painter, then ends the pass and submits no matter what. A painter
    /// error is logged and swallowed so the frame proceeds with whatever
    /// pixels are already in the texture; an unfinished pass would poison
    /// every later use of the encoder, so the pass scope closes on all
    /// paths.
    pub fn render_with(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        painter: &mut dyn OffscreenPainter,
        axes: &Axis2,
    ) {
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Offscreen Encoder"),
        });

        let result = {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Offscreen Plot Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.color,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.0,
                            g: 0.0,
                            b: 0.0,
                            a: 0.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let (width, height) = self.size();
            painter.paint(&mut pass, queue, axes, width, height)
            // Pass drops here, ending it on success and failure alike.
        };

        queue.submit(std::iter::once(encoder.finish()));

        if let Err(err) = result {
            log::warn!("Trouble drawing to offscreen target: {err:#}");
        }
    }
}
