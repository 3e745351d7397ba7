//! The 2D stacked plot painted into the offscreen drape texture.
//!
//! Band geometry comes from the same cell state that drives the layout
//! directives: fixed cells take their size in pixels, grow cells split the
//! leftover height, hidden cells collapse, and inter-band spacing is
//! suppressed for the top band. Series content is mapped through the plot
//! axes, so the drawn data stays geographically anchored while the draped
//! area moves under the camera.

use anyhow::{ensure, Result};
use geoplot::axis::Axis2;
use geoplot::stack::{Orientation, PlotCell, StackedLayout};

/// Vertex budget for one offscreen paint.
const MAX_VERTICES: usize = 8192;

/// Samples per series polyline.
const SERIES_SAMPLES: usize = 96;

const PALETTE: [[f32; 4]; 4] = [
    [0.176, 0.969, 1.000, 0.55], // cyan
    [1.000, 0.624, 0.110, 0.55], // amber
    [0.467, 1.000, 0.525, 0.55], // green
    [0.918, 0.365, 0.745, 0.55], // magenta
];

/// Pixel extent of one band after resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Band<K> {
    pub id: K,
    pub top: f32,
    pub bottom: f32,
}

impl<K> Band<K> {
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }
}

/// Resolves the vertical stack into pixel bands, top to bottom. Cells must
/// already be in display order. Grow cells share whatever height the fixed
/// cells and gaps leave over.
pub fn resolve_bands<K: Clone>(cells: &[PlotCell<K>], height_px: u32) -> Vec<Band<K>> {
    let mut fixed_total = 0.0f32;
    let mut gap_total = 0.0f32;
    let mut grow_count = 0usize;

    for (index, cell) in cells.iter().enumerate() {
        if !cell.is_visible() {
            continue;
        }
        if index > 0 {
            gap_total += cell.spacing() as f32;
        }
        if cell.is_grow() {
            grow_count += 1;
        } else {
            fixed_total += cell.size().max(0) as f32;
        }
    }

    let leftover = (height_px as f32 - fixed_total - gap_total).max(0.0);
    let grow_height = if grow_count > 0 {
        leftover / grow_count as f32
    } else {
        0.0
    };

    let mut bands = Vec::with_capacity(cells.len());
    let mut cursor = 0.0f32;

    for (index, cell) in cells.iter().enumerate() {
        if !cell.is_visible() {
            bands.push(Band {
                id: cell.id().clone(),
                top: cursor,
                bottom: cursor,
            });
            continue;
        }

        if index > 0 {
            cursor += cell.spacing() as f32;
        }

        let height = if cell.is_grow() {
            grow_height
        } else {
            cell.size().max(0) as f32
        };

        bands.push(Band {
            id: cell.id().clone(),
            top: cursor,
            bottom: cursor + height,
        });
        cursor += height;
    }

    bands
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct PlotVertex {
    /// Clip-space position.
    pos:   [f32; 2],
    color: [f32; 4],
}

pub struct StackedPlotPainter {
    pub layout: StackedLayout<String>,
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
}

impl StackedPlotPainter {
    /// Builds the painter with a default three-band stack: two fixed series
    /// bands over one grow-to-fill band.
    pub fn new(device: &wgpu::Device, color_fmt: wgpu::TextureFormat) -> Self {
        let mut layout = StackedLayout::new(Orientation::Vertical);
        {
            let mut batch = layout.batch();
            batch.add_cell(PlotCell::new("altitude".to_string(), 0, 220, 12));
            batch.add_cell(PlotCell::new("speed".to_string(), 1, 220, 12));
            batch.add_cell(PlotCell::new("timeline".to_string(), 2, -1, 12));
        }

        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label:              Some("Plot VB"),
            size:               (MAX_VERTICES * std::mem::size_of::<PlotVertex>()) as u64,
            usage:              wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label:  Some("Plot WGSL"),
            source: wgpu::ShaderSource::Wgsl(PLOT_WGSL.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label:                Some("Plot Pipeline Layout"),
            bind_group_layouts:   &[],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label:  Some("Plot Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module:      &shader,
                entry_point: "vs_main",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<PlotVertex>() as u64,
                    step_mode:    wgpu::VertexStepMode::Vertex,
                    attributes: &[
                        wgpu::VertexAttribute {
                            shader_location: 0,
                            format:          wgpu::VertexFormat::Float32x2,
                            offset:          0,
                        },
                        wgpu::VertexAttribute {
                            shader_location: 1,
                            format:          wgpu::VertexFormat::Float32x4,
                            offset:          8,
                        },
                    ],
                }],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module:      &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format:     color_fmt,
                    blend:      Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive:     wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample:   wgpu::MultisampleState::default(),
            multiview:     None,
        });

        Self {
            layout,
            pipeline,
            vertex_buffer,
            vertex_count: 0,
        }
    }

    fn build_vertices(&self, axes: &Axis2, width: u32, height: u32) -> Vec<PlotVertex> {
        let mut vertices = Vec::new();
        let bands = resolve_bands(self.layout.cells(), height);

        let to_clip = |x_px: f32, y_px: f32| -> [f32; 2] {
            [
                2.0 * x_px / width.max(1) as f32 - 1.0,
                1.0 - 2.0 * y_px / height.max(1) as f32,
            ]
        };

        let quad = |x0: f32, y0: f32, x1: f32, y1: f32, color: [f32; 4], out: &mut Vec<PlotVertex>| {
            let a = to_clip(x0, y0);
            let b = to_clip(x1, y0);
            let c = to_clip(x1, y1);
            let d = to_clip(x0, y1);
            out.extend_from_slice(&[
                PlotVertex { pos: a, color },
                PlotVertex { pos: d, color },
                PlotVertex { pos: b, color },
                PlotVertex { pos: b, color },
                PlotVertex { pos: d, color },
                PlotVertex { pos: c, color },
            ]);
        };

        for (band_index, band) in bands.iter().enumerate() {
            if band.height() <= 0.0 {
                continue;
            }
            let color = PALETTE[band_index % PALETTE.len()];

            // Band background, dimmed.
            let bg = [color[0] * 0.25, color[1] * 0.25, color[2] * 0.25, 0.35];
            quad(0.0, band.top, width as f32, band.bottom, bg, &mut vertices);

            // Baseline along the bottom edge.
            quad(
                0.0,
                (band.bottom - 2.0).max(band.top),
                width as f32,
                band.bottom,
                color,
                &mut vertices,
            );

            // Series curve: a synthetic field over the projected x axis, so
            // the trace scrolls with the draped area instead of the screen.
            let inner_top = band.top + 4.0;
            let inner_height = (band.height() - 8.0).max(1.0);
            for sample in 0..SERIES_SAMPLES {
                let u = sample as f32 / (SERIES_SAMPLES - 1) as f32;
                let x_world = axes.x.min + u as f64 * axes.x.span();
                let value = (x_world / 25_000.0 + band_index as f64).sin() * 0.5 + 0.5;

                let x_px = u * width as f32;
                let y_px = inner_top + (1.0 - value as f32) * inner_height;
                quad(x_px - 1.5, y_px - 1.5, x_px + 1.5, y_px + 1.5, color, &mut vertices);
            }
        }

        vertices
    }
}

impl crate::renderer::offscreen::OffscreenPainter for StackedPlotPainter {
    fn paint<'a>(
        &'a mut self,
        pass: &mut wgpu::RenderPass<'a>,
        queue: &wgpu::Queue,
        axes: &Axis2,
        width: u32,
        height: u32,
    ) -> Result<()> {
        let vertices = self.build_vertices(axes, width, height);
        ensure!(
            vertices.len() <= MAX_VERTICES,
            "plot needs {} vertices, budget is {}",
            vertices.len(),
            MAX_VERTICES
        );

        self.vertex_count = vertices.len() as u32;
        if vertices.is_empty() {
            return Ok(());
        }
        queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&vertices));

        pass.set_pipeline(&self.pipeline);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.draw(0..self.vertex_count, 0..1);
        Ok(())
    }
}

pub const PLOT_WGSL: &str = r#"
struct VSOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) color: vec4<f32>,
}

@vertex
fn vs_main(
    @location(0) pos: vec2<f32>,
    @location(1) color: vec4<f32>,
) -> VSOut {
    var out: VSOut;
    out.clip = vec4<f32>(pos, 0.0, 1.0);
    out.color = color;
    return out;
}

@fragment
fn fs_main(in: VSOut) -> @location(0) vec4<f32> {
    return in.color;
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn stack(cells: Vec<PlotCell<&'static str>>) -> StackedLayout<&'static str> {
        let mut layout = StackedLayout::new(Orientation::Vertical);
        for cell in cells {
            layout.add_cell(cell);
        }
        layout
    }

    #[test]
    fn fixed_bands_stack_top_to_bottom_with_gaps() {
        let layout = stack(vec![
            PlotCell::new("a", 0, 100, 10),
            PlotCell::new("b", 1, 50, 10),
        ]);

        let bands = resolve_bands(layout.cells(), 400);
        assert_eq!(bands[0].top, 0.0);
        assert_eq!(bands[0].bottom, 100.0);
        // Gap of 10 before the second band.
        assert_eq!(bands[1].top, 110.0);
        assert_eq!(bands[1].bottom, 160.0);
    }

    #[test]
    fn grow_bands_share_the_leftover_height() {
        let layout = stack(vec![
            PlotCell::new("fixed", 0, 100, 0),
            PlotCell::new("grow1", 1, -1, 0),
            PlotCell::new("grow2", 2, -1, 0),
        ]);

        let bands = resolve_bands(layout.cells(), 500);
        assert_eq!(bands[1].height(), 200.0);
        assert_eq!(bands[2].height(), 200.0);
        assert_eq!(bands[2].bottom, 500.0);
    }

    #[test]
    fn hidden_band_collapses_without_leaving_a_gap() {
        let mut layout = stack(vec![
            PlotCell::new("a", 0, 100, 10),
            PlotCell::new("hidden", 1, 100, 10),
            PlotCell::new("b", 2, 100, 10),
        ]);
        layout.set_visible(&"hidden", false);
        layout.relayout();

        let bands = resolve_bands(layout.cells(), 400);
        assert_eq!(bands[1].height(), 0.0);
        // "b" starts right after "a" plus its own gap only.
        assert_eq!(bands[2].top, 110.0);
    }

    #[test]
    fn hidden_grow_band_frees_its_share() {
        let mut layout = stack(vec![
            PlotCell::new("grow1", 0, -1, 0),
            PlotCell::new("grow2", 1, -1, 0),
        ]);
        layout.set_visible(&"grow2", false);
        layout.relayout();

        let bands = resolve_bands(layout.cells(), 300);
        assert_eq!(bands[0].height(), 300.0);
        assert_eq!(bands[1].height(), 0.0);
    }
}
