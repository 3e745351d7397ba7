// Renders the WGS-84 ellipsoid surface under the study region, with a
// procedural latitude/longitude graticule.

use crate::camera::Camera;
use geoplot::bounds::GeoBounds;
use geoplot::geodesy::geodetic_to_ecef;
use glam::Mat4;
use wgpu::util::DeviceExt;

/// Quads per patch edge. The patch is small enough that this keeps the
/// ellipsoid curvature error well under a pixel at typical view distances.
const SUBDIV: usize = 32;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct GraticuleVertex {
    /// Position relative to the camera, meters (f64 math done CPU-side).
    pos_rel: [f32; 3],
    /// Geodetic position in degrees, for the line shader.
    latlon_deg: [f32; 2],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GraticuleUniforms {
    /// Transform from camera-relative ECEF to clip space.
    pub view_proj: Mat4, // 64 B
}

// Compile-time safety check: buffer size must match WGSL-reflected size.
const _: [(); 64] = [(); core::mem::size_of::<GraticuleUniforms>()];

pub struct GraticulePipeline {
    pipeline:       wgpu::RenderPipeline,
    bind_group:     wgpu::BindGroup,
    uniform_buffer: wgpu::Buffer,
    vertex_buffer:  wgpu::Buffer,
    index_buffer:   wgpu::Buffer,
    index_count:    u32,
    region:         GeoBounds,
}

impl GraticulePipeline {
    pub fn new(
        device:    &wgpu::Device,
        color_fmt: wgpu::TextureFormat,
        depth_fmt: wgpu::TextureFormat,
        region:    GeoBounds,
    ) -> Self {
        let vertex_count = (SUBDIV + 1) * (SUBDIV + 1);

        // Vertices are rewritten every frame (camera-relative positions).
        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label:              Some("Graticule VB"),
            size:               (vertex_count * std::mem::size_of::<GraticuleVertex>()) as u64,
            usage:              wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Topology is fixed; only positions move.
        let mut indices: Vec<u32> = Vec::with_capacity(SUBDIV * SUBDIV * 6);
        for j in 0..SUBDIV as u32 {
            for i in 0..SUBDIV as u32 {
                let row = SUBDIV as u32 + 1;
                let a = j * row + i;
                let b = a + 1;
                let c = a + row;
                let d = c + 1;
                indices.extend_from_slice(&[a, c, b, b, c, d]);
            }
        }
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label:    Some("Graticule IB"),
            contents: bytemuck::cast_slice(&indices),
            usage:    wgpu::BufferUsages::INDEX,
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label:              Some("Graticule Uniform Buffer"),
            size:               std::mem::size_of::<GraticuleUniforms>() as u64,
            usage:              wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label:   Some("Graticule BGL"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding:    0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty:                 wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size:   None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label:   Some("Graticule Bind Group"),
            layout:  &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding:  0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label:  Some("Graticule WGSL"),
            source: wgpu::ShaderSource::Wgsl(GRATICULE_WGSL.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label:                Some("Graticule Pipeline Layout"),
            bind_group_layouts:   &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label:  Some("Graticule Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module:      &shader,
                entry_point: "vs_main",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<GraticuleVertex>() as u64,
                    step_mode:    wgpu::VertexStepMode::Vertex,
                    attributes: &[
                        wgpu::VertexAttribute {
                            shader_location: 0,
                            format:          wgpu::VertexFormat::Float32x3,
                            offset:          0,
                        },
                        wgpu::VertexAttribute {
                            shader_location: 1,
                            format:          wgpu::VertexFormat::Float32x2,
                            offset:          12,
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
                    blend:      None, // Opaque ground
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: Some(wgpu::DepthStencilState {
                format:              depth_fmt,
                depth_write_enabled: true,
                depth_compare:       wgpu::CompareFunction::Less,
                stencil:             wgpu::StencilState::default(),
                bias:                wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview:   None,
        });

        Self {
            pipeline,
            bind_group,
            uniform_buffer,
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
            region,
        }
    }

    pub fn draw<'a>(&'a self, rpass: &mut wgpu::RenderPass<'a>, queue: &wgpu::Queue, camera: &Camera) {
        let cam = camera.ecef_m();

        // Rebuild the patch relative to the camera so f32 precision holds
        // at planetary coordinates.
        let mut vertices: Vec<GraticuleVertex> = Vec::with_capacity((SUBDIV + 1) * (SUBDIV + 1));
        for j in 0..=SUBDIV {
            let t = j as f64 / SUBDIV as f64;
            let lat = self.region.min_lat + t * (self.region.max_lat - self.region.min_lat);
            for i in 0..=SUBDIV {
                let s = i as f64 / SUBDIV as f64;
                let lon = self.region.min_lon + s * (self.region.max_lon - self.region.min_lon);

                let ecef = geodetic_to_ecef(lat, lon, 0.0);
                vertices.push(GraticuleVertex {
                    pos_rel: [
                        (ecef[0] - cam[0]) as f32,
                        (ecef[1] - cam[1]) as f32,
                        (ecef[2] - cam[2]) as f32,
                    ],
                    latlon_deg: [lat as f32, lon as f32],
                });
            }
        }
        queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&vertices));

        let uniforms = GraticuleUniforms {
            view_proj: camera.view_proj_ecef(),
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.bind_group, &[]);
        rpass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        rpass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        rpass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

pub const GRATICULE_WGSL: &str = r#"
struct GraticuleUniforms {
    view_proj: mat4x4<f32>,
};
@group(0) @binding(0) var<uniform> U: GraticuleUniforms;

struct VSOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) latlon_deg: vec2<f32>,
}

@vertex
fn vs_main(
    @location(0) pos_rel: vec3<f32>,
    @location(1) latlon_deg: vec2<f32>,
) -> VSOut {
    var out: VSOut;
    out.clip = U.view_proj * vec4<f32>(pos_rel, 1.0);
    out.latlon_deg = latlon_deg;
    return out;
}

// Anti-aliased line mask
fn line(coord: f32, step: f32) -> f32 {
    let t   = coord / step;
    // Cap AA width so very small steps can't smear into a solid fill.
    let aaw = min(fwidth(t) * 1.5, 0.5);
    let f   = fract(t);
    let d   = min(f, 1.0 - f);
    return 1.0 - smoothstep(0.0, aaw, d);
}

@fragment
fn fs_main(in: VSOut) -> @location(0) vec4<f32> {
    let minor = max(line(in.latlon_deg.x, 0.25), line(in.latlon_deg.y, 0.25));
    let major = max(line(in.latlon_deg.x, 1.0),  line(in.latlon_deg.y, 1.0));
    let grid  = minor * 0.35 + major * 0.65;

    let ground = vec3<f32>(0.051, 0.078, 0.102);
    let lines  = vec3<f32>(0.176, 0.969, 1.000); // HUD cyan
    return vec4<f32>(mix(ground, lines, grid * 0.45), 1.0);
}
"#;
