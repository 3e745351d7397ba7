// Drapes the offscreen plot texture over the ellipsoid between four
// geographic corners.

use crate::camera::Camera;
use geoplot::geodesy::{geodetic_to_ecef, LatLon};
use glam::Mat4;
use wgpu::util::DeviceExt;

/// Quads per tile edge.
const SUBDIV: usize = 16;

/// Height of the tile above the ellipsoid, meters. Lifts the textured
/// surface clear of the ground patch so the two never z-fight.
const TILE_HEIGHT_M: f64 = 30.0;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct TileVertex {
    /// Position relative to the camera, meters (f64 math done CPU-side).
    pos_rel: [f32; 3],
    uv:      [f32; 2],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TileUniforms {
    /// Transform from camera-relative ECEF to clip space.
    pub view_proj: Mat4, // 64 B
}

// Compile-time safety check: buffer size must match WGSL-reflected size.
const _: [(); 64] = [(); core::mem::size_of::<TileUniforms>()];

/// A textured quad patch whose geographic corners move every frame to
/// track the visible footprint. The texture binding is fixed at creation;
/// only the geometry is dynamic.
pub struct TextureSurfaceTile {
    pipeline:       wgpu::RenderPipeline,
    bind_group:     wgpu::BindGroup,
    uniform_buffer: wgpu::Buffer,
    vertex_buffer:  wgpu::Buffer,
    index_buffer:   wgpu::Buffer,
    index_count:    u32,
    /// SW, SE, NE, NW.
    corners:        [LatLon; 4],
}

impl TextureSurfaceTile {
    pub fn new(
        device:    &wgpu::Device,
        texture:   &wgpu::TextureView,
        color_fmt: wgpu::TextureFormat,
        depth_fmt: wgpu::TextureFormat,
        corners:   [LatLon; 4],
    ) -> Self {
        let vertex_count = (SUBDIV + 1) * (SUBDIV + 1);

        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label:              Some("Drape Tile VB"),
            size:               (vertex_count * std::mem::size_of::<TileVertex>()) as u64,
            usage:              wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

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
            label:    Some("Drape Tile IB"),
            contents: bytemuck::cast_slice(&indices),
            usage:    wgpu::BufferUsages::INDEX,
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label:              Some("Drape Tile Uniform Buffer"),
            size:               std::mem::size_of::<TileUniforms>() as u64,
            usage:              wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label:          Some("Drape Tile Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter:     wgpu::FilterMode::Linear,
            min_filter:     wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label:   Some("Drape Tile BGL"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding:    0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty:                 wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size:   None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding:    1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type:    wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled:   false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding:    2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty:         wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count:      None,
                },
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label:   Some("Drape Tile Bind Group"),
            layout:  &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding:  0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding:  1,
                    resource: wgpu::BindingResource::TextureView(texture),
                },
                wgpu::BindGroupEntry {
                    binding:  2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label:  Some("Drape Tile WGSL"),
            source: wgpu::ShaderSource::Wgsl(TILE_WGSL.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label:                Some("Drape Tile Pipeline Layout"),
            bind_group_layouts:   &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label:  Some("Drape Tile Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module:      &shader,
                entry_point: "vs_main",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<TileVertex>() as u64,
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
                    blend:      Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: Some(wgpu::DepthStencilState {
                format:              depth_fmt,
                depth_write_enabled: false, // Translucent overlay
                depth_compare:       wgpu::CompareFunction::LessEqual,
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
            corners,
        }
    }

    /// Moves the tile to new geographic corners (SW, SE, NE, NW).
    pub fn set_corners(&mut self, corners: [LatLon; 4]) {
        self.corners = corners;
    }

    pub fn draw<'a>(&'a self, rpass: &mut wgpu::RenderPass<'a>, queue: &wgpu::Queue, camera: &Camera) {
        let cam = camera.ecef_m();
        let [sw, se, ne, nw] = self.corners;

        // Rebuild the patch relative to the camera so f32 precision holds
        // at planetary coordinates. Rows run south to north; texture row 0
        // is the top of the plot, so v is flipped.
        let mut vertices: Vec<TileVertex> = Vec::with_capacity((SUBDIV + 1) * (SUBDIV + 1));
        for j in 0..=SUBDIV {
            let t = j as f64 / SUBDIV as f64;
            for i in 0..=SUBDIV {
                let s = i as f64 / SUBDIV as f64;

                let south = lerp_latlon(sw, se, s);
                let north = lerp_latlon(nw, ne, s);
                let p = lerp_latlon(south, north, t);

                let ecef = geodetic_to_ecef(p.lat_deg, p.lon_deg, TILE_HEIGHT_M);
                vertices.push(TileVertex {
                    pos_rel: [
                        (ecef[0] - cam[0]) as f32,
                        (ecef[1] - cam[1]) as f32,
                        (ecef[2] - cam[2]) as f32,
                    ],
                    uv: [s as f32, (1.0 - t) as f32],
                });
            }
        }
        queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&vertices));

        let uniforms = TileUniforms {
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

fn lerp_latlon(a: LatLon, b: LatLon, t: f64) -> LatLon {
    LatLon::from_deg(
        a.lat_deg + (b.lat_deg - a.lat_deg) * t,
        a.lon_deg + (b.lon_deg - a.lon_deg) * t,
    )
}

pub const TILE_WGSL: &str = r#"
struct TileUniforms {
    view_proj: mat4x4<f32>,
};
@group(0) @binding(0) var<uniform> U: TileUniforms;
@group(0) @binding(1) var plot_tex: texture_2d<f32>;
@group(0) @binding(2) var plot_samp: sampler;

struct VSOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(
    @location(0) pos_rel: vec3<f32>,
    @location(1) uv: vec2<f32>,
) -> VSOut {
    var out: VSOut;
    out.clip = U.view_proj * vec4<f32>(pos_rel, 1.0);
    out.uv = uv;
    return out;
}

@fragment
fn fs_main(in: VSOut) -> @location(0) vec4<f32> {
    return textureSample(plot_tex, plot_samp, in.uv);
}
"#;
