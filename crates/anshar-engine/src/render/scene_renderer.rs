use std::collections::HashMap;

use anyhow::{Context, Result};
use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use anshar_assets::Scene;

use crate::camera::Camera;
use crate::device::DEPTH_FORMAT;
use crate::frustum::Frustum;
use crate::render::{RenderCtx, RenderTarget};
use crate::shader::SceneShader;

/// Slot stride for the per-mesh model-matrix buffer.
///
/// Matches the minimum dynamic uniform offset alignment guaranteed by the
/// default limits.
const MODEL_STRIDE: u64 = 256;

const DEFAULT_LIGHT_POS: [f32; 3] = [4.0, 8.0, 4.0];

/// Draws a loaded scene with one pipeline:
/// per-mesh vertex buffers, per-material diffuse color + texture, and a
/// dynamic-offset uniform slot per mesh for its model matrix.
///
/// Meshes whose bounding sphere falls outside the camera frustum are skipped.
pub struct SceneRenderer {
    shader: SceneShader,
    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,

    globals_layout: wgpu::BindGroupLayout,
    material_layout: wgpu::BindGroupLayout,
    mesh_layout: wgpu::BindGroupLayout,

    globals_ubo: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,

    model_ubo: wgpu::Buffer,
    mesh_bind_group: wgpu::BindGroup,

    materials: Vec<GpuMaterial>,
    meshes: Vec<GpuMesh>,

    light_pos: [f32; 3],
}

struct GpuMaterial {
    bind_group: wgpu::BindGroup,
}

struct GpuMesh {
    name: String,
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
    material_index: usize,
    center: [f32; 3],
    radius: f32,
    transform: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct Globals {
    view: [[f32; 4]; 4],
    proj: [[f32; 4]; 4],
    light_pos: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct MaterialParams {
    diffuse: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct GpuVertex {
    position: [f32; 3],
    normal: [f32; 3],
    texcoord: [f32; 2],
}

impl GpuVertex {
    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x3, // normal
        2 => Float32x2  // texcoord
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GpuVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

impl SceneRenderer {
    /// Uploads `scene` to the GPU and prepares bind groups.
    ///
    /// The pipeline itself is built lazily on first draw, once the surface
    /// format is known.
    pub fn new(ctx: &RenderCtx<'_>, scene: &Scene) -> Result<Self> {
        scene
            .validate_material_indices()
            .map_err(|name| anyhow::anyhow!("mesh {name:?} references an out-of-bounds material"))?;

        let device = ctx.device;

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("anshar globals bgl"),
            entries: &[uniform_entry(
                0,
                wgpu::ShaderStages::VERTEX_FRAGMENT,
                std::mem::size_of::<Globals>() as u64,
                false,
            )],
        });

        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("anshar material bgl"),
            entries: &[
                uniform_entry(
                    0,
                    wgpu::ShaderStages::FRAGMENT,
                    std::mem::size_of::<MaterialParams>() as u64,
                    false,
                ),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let mesh_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("anshar mesh bgl"),
            entries: &[uniform_entry(
                0,
                wgpu::ShaderStages::VERTEX,
                std::mem::size_of::<[[f32; 4]; 4]>() as u64,
                true,
            )],
        });

        let globals_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("anshar globals ubo"),
            size: std::mem::size_of::<Globals>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("anshar globals bind group"),
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_ubo.as_entire_binding(),
            }],
        });

        // One 256-byte slot per mesh, addressed with a dynamic offset.
        let model_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("anshar model ubo"),
            size: MODEL_STRIDE * scene.meshes.len().max(1) as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mesh_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("anshar mesh bind group"),
            layout: &mesh_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &model_ubo,
                    offset: 0,
                    size: std::num::NonZeroU64::new(
                        std::mem::size_of::<[[f32; 4]; 4]>() as u64
                    ),
                }),
            }],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("anshar diffuse sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        // Decode embedded images up front; materials reference them by name.
        let mut texture_views: HashMap<&str, wgpu::TextureView> = HashMap::new();
        for blob in &scene.images {
            let decoded = image::load_from_memory(&blob.bytes)
                .with_context(|| format!("decoding texture {:?}", blob.name))?
                .to_rgba8();
            let (width, height) = decoded.dimensions();
            let view = upload_rgba(ctx, &blob.name, width, height, decoded.as_raw());
            texture_views.insert(blob.name.as_str(), view);
        }

        // Untextured materials sample an all-white pixel so one shader path
        // covers both cases.
        let white = upload_rgba(ctx, "white", 1, 1, &[255, 255, 255, 255]);

        let mut materials = Vec::with_capacity(scene.materials.len());
        for mat in &scene.materials {
            let view = match mat.diffuse_texture.as_deref() {
                Some(name) => texture_views.get(name).unwrap_or_else(|| {
                    log::warn!("material {:?} references missing texture {name:?}", mat.name);
                    &white
                }),
                None => &white,
            };

            let params = MaterialParams {
                diffuse: [mat.diffuse[0], mat.diffuse[1], mat.diffuse[2], 1.0],
            };

            let ubo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("anshar material ubo"),
                contents: bytemuck::bytes_of(&params),
                usage: wgpu::BufferUsages::UNIFORM,
            });

            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("anshar material bind group"),
                layout: &material_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: ubo.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(&sampler),
                    },
                ],
            });

            materials.push(GpuMaterial { bind_group });
        }

        let mut meshes = Vec::with_capacity(scene.meshes.len());
        for mesh in &scene.meshes {
            let vertices: Vec<GpuVertex> = mesh
                .vertices
                .iter()
                .map(|v| GpuVertex {
                    position: v.position,
                    normal: v.normal,
                    texcoord: v.texcoord,
                })
                .collect();

            let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&mesh.name),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

            meshes.push(GpuMesh {
                name: mesh.name.clone(),
                vertex_buffer,
                vertex_count: vertices.len() as u32,
                material_index: mesh.material_index,
                center: mesh.center,
                radius: mesh.radius,
                transform: mesh.transform,
            });
        }

        Ok(Self {
            shader: SceneShader::builtin(device),
            pipeline_format: None,
            pipeline: None,
            globals_layout,
            material_layout,
            mesh_layout,
            globals_ubo,
            globals_bind_group,
            model_ubo,
            mesh_bind_group,
            materials,
            meshes,
            light_pos: DEFAULT_LIGHT_POS,
        })
    }

    /// Swaps the active shader. The pipeline is rebuilt on the next draw.
    pub fn set_shader(&mut self, shader: SceneShader) {
        log::info!("switching scene shader to {:?}", shader.name());
        self.shader = shader;
        self.pipeline = None;
    }

    pub fn shader_name(&self) -> &str {
        self.shader.name()
    }

    pub fn set_light_position(&mut self, x: f32, y: f32, z: f32) {
        self.light_pos = [x, y, z];
    }

    /// Returns the model matrix of a mesh by name.
    pub fn mesh_transform(&self, name: &str) -> Option<[[f32; 4]; 4]> {
        self.meshes
            .iter()
            .find(|m| m.name == name)
            .map(|m| m.transform)
    }

    /// Replaces the model matrix of a mesh by name. Returns false if no mesh
    /// has that name.
    pub fn set_mesh_transform(&mut self, name: &str, transform: [[f32; 4]; 4]) -> bool {
        match self.meshes.iter_mut().find(|m| m.name == name) {
            Some(mesh) => {
                mesh.transform = transform;
                true
            }
            None => false,
        }
    }

    /// Records one pass drawing every mesh visible from `camera`.
    pub fn draw(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>, camera: &Camera) {
        self.ensure_pipeline(ctx);

        let globals = Globals {
            view: camera.view().into(),
            proj: camera.projection().into(),
            light_pos: [self.light_pos[0], self.light_pos[1], self.light_pos[2], 1.0],
        };
        ctx.queue
            .write_buffer(&self.globals_ubo, 0, bytemuck::bytes_of(&globals));

        // Cull against the frustum using each mesh's bounding sphere, with the
        // center carried through its model matrix. The radius is not rescaled;
        // mesh transforms carry translation only.
        let frustum = Frustum::from_view_projection(&camera.view_projection());
        let mut visible: Vec<u32> = Vec::with_capacity(self.meshes.len());

        for (i, mesh) in self.meshes.iter().enumerate() {
            let [x, y, z] = transform_point(&mesh.transform, mesh.center);
            if frustum.intersects_sphere(x, y, z, mesh.radius) {
                ctx.queue.write_buffer(
                    &self.model_ubo,
                    i as u64 * MODEL_STRIDE,
                    bytemuck::bytes_of(&mesh.transform),
                );
                visible.push(i as u32);
            }
        }

        if visible.is_empty() {
            return;
        }

        let Some(pipeline) = self.pipeline.as_ref() else {
            return;
        };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("anshar scene pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: target.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, &self.globals_bind_group, &[]);

        for &i in &visible {
            let mesh = &self.meshes[i as usize];
            let material = &self.materials[mesh.material_index];
            let offset = (i as u64 * MODEL_STRIDE) as u32;

            rpass.set_bind_group(1, &material.bind_group, &[]);
            rpass.set_bind_group(2, &self.mesh_bind_group, &[offset]);
            rpass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            rpass.draw(0..mesh.vertex_count, 0..1);
        }
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.surface_format) && self.pipeline.is_some() {
            return;
        }

        let pipeline_layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("anshar scene pipeline layout"),
                bind_group_layouts: &[
                    &self.globals_layout,
                    &self.material_layout,
                    &self.mesh_layout,
                ],
                // Newer wgpu uses immediate constants; keep disabled for now.
                immediate_size: 0,
            });

        let pipeline = ctx
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("anshar scene pipeline"),
                layout: Some(&pipeline_layout),

                vertex: wgpu::VertexState {
                    module: self.shader.module(),
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[GpuVertex::layout()],
                },

                fragment: Some(wgpu::FragmentState {
                    module: self.shader.module(),
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: ctx.surface_format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),

                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    // Source meshes are not guaranteed a consistent winding;
                    // draw both faces.
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },

                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),

                multiview_mask: None,
                cache: None,
            });

        self.pipeline_format = Some(ctx.surface_format);
        self.pipeline = Some(pipeline);
    }
}

fn uniform_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    size: u64,
    dynamic: bool,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: dynamic,
            min_binding_size: std::num::NonZeroU64::new(size),
        },
        count: None,
    }
}

fn upload_rgba(
    ctx: &RenderCtx<'_>,
    label: &str,
    width: u32,
    height: u32,
    pixels: &[u8],
) -> wgpu::TextureView {
    let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    ctx.queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );

    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// Applies a column-major affine matrix to a point.
fn transform_point(m: &[[f32; 4]; 4], p: [f32; 3]) -> [f32; 3] {
    [
        m[0][0] * p[0] + m[1][0] * p[1] + m[2][0] * p[2] + m[3][0],
        m[0][1] * p[0] + m[1][1] * p[1] + m[2][1] * p[2] + m[3][1],
        m[0][2] * p[0] + m[1][2] * p[1] + m[2][2] * p[2] + m[3][2],
    ]
}

#[cfg(test)]
mod tests {
    use super::transform_point;

    #[test]
    fn transform_point_applies_translation() {
        let mut m = [[0.0f32; 4]; 4];
        for i in 0..4 {
            m[i][i] = 1.0;
        }
        m[3][0] = 5.0;
        m[3][1] = -2.0;

        let p = transform_point(&m, [1.0, 1.0, 1.0]);
        assert_eq!(p, [6.0, -1.0, 1.0]);
    }
}
