use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::scene::IndexRange;

use super::backend::{
    BackendError, GeometryId, GeometryUpload, ProgramId, ProgramSpec, RenderBackend,
};
use super::RenderTarget;

/// Depth attachment format expected by every pipeline this backend creates.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct FrameUniforms {
    projection: [[f32; 4]; 4],
}

/// Per-draw uniform block, written at a dynamic offset per entity.
///
/// `color_base`/`base_vertex` drive the per-vertex color fetch in the
/// shader; `color_blend` selects between the fetched color (0.0) and the
/// uniform `color` (1.0). Padded to 16 bytes.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct DrawUniforms {
    model_view: [[f32; 4]; 4],
    color: [f32; 4],
    color_blend: f32,
    color_base: u32,
    base_vertex: u32,
    _pad: u32,
}

/// Attribute/uniform plumbing of a compiled program, resolved once at
/// creation time. Creation fails if any piece cannot be built.
struct ProgramBindings {
    pipeline: wgpu::RenderPipeline,
    frame_layout: wgpu::BindGroupLayout,
    draw_layout: wgpu::BindGroupLayout,
}

/// Uploaded geometry set: one vertex-position buffer, one index buffer, and
/// the per-vertex color table as a read-only storage buffer.
struct GeometryBuffers {
    positions: wgpu::Buffer,
    indices: wgpu::Buffer,
    vertex_colors: wgpu::Buffer,
}

/// Recorded frame state; trait calls mutate this, [`WgpuBackend::flush`]
/// replays it into one render pass.
struct FrameState {
    begun: bool,
    clear: [f32; 4],
    projection: Mat4,
    program: Option<ProgramId>,
    geometry: Option<GeometryId>,

    // Cursor values snapshotted into a DrawCall by draw_indexed.
    model_view: Mat4,
    color: [f32; 4],
    color_blend: f32,
    color_base: u32,
    base_vertex: u32,

    draws: Vec<DrawCall>,
}

struct DrawCall {
    uniforms: DrawUniforms,
    range: IndexRange,
}

impl Default for FrameState {
    fn default() -> Self {
        Self {
            begun: false,
            clear: [0.0; 4],
            projection: Mat4::IDENTITY,
            program: None,
            geometry: None,
            model_view: Mat4::IDENTITY,
            color: [0.0; 4],
            color_blend: 1.0,
            color_base: 0,
            base_vertex: 0,
            draws: Vec::new(),
        }
    }
}

/// wgpu implementation of [`RenderBackend`].
///
/// Setup failures are caught with wgpu error scopes so the renderer sees
/// which stage broke instead of an uncaptured-error callback. Frame calls
/// record into a CPU command list; [`flush`](Self::flush) replays the list
/// into a single depth-tested render pass on the caller's encoder, writing
/// all per-draw uniforms through one dynamic-offset uniform buffer.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_format: wgpu::TextureFormat,

    programs: Vec<ProgramBindings>,
    geometries: Vec<GeometryBuffers>,

    frame_ubo: Option<wgpu::Buffer>,
    draw_ubo: Option<wgpu::Buffer>,
    draw_capacity: usize,
    draw_stride: u32,

    // Bind groups are tied to (program layout, geometry color table); cache
    // and rebuild only when that pair changes or a buffer is reallocated.
    frame_bind_group: Option<wgpu::BindGroup>,
    draw_bind_group: Option<wgpu::BindGroup>,
    bound_pair: Option<(ProgramId, GeometryId)>,

    frame: FrameState,
}

impl WgpuBackend {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let align = device.limits().min_uniform_buffer_offset_alignment;
        let draw_stride = (std::mem::size_of::<DrawUniforms>() as u32).next_multiple_of(align);

        Self {
            device: device.clone(),
            queue: queue.clone(),
            surface_format,
            programs: Vec::new(),
            geometries: Vec::new(),
            frame_ubo: None,
            draw_ubo: None,
            draw_capacity: 0,
            draw_stride,
            frame_bind_group: None,
            draw_bind_group: None,
            bound_pair: None,
            frame: FrameState::default(),
        }
    }

    /// Replays the frame recorded since the last `begin_frame` into one
    /// render pass and forgets it. A frame with zero draws still clears the
    /// color and depth attachments; only a frame that was never begun (or
    /// that carries invalid handles) leaves the target untouched.
    pub fn flush(&mut self, target: &mut RenderTarget<'_>) {
        let frame = std::mem::take(&mut self.frame);
        if !frame.begun {
            return;
        }
        let (Some(pid), Some(gid)) = (frame.program, frame.geometry) else {
            log::debug!("frame recorded without program/geometry bindings; dropped");
            return;
        };

        self.write_frame_uniforms(&frame);
        self.write_draw_uniforms(&frame.draws);
        self.ensure_bind_groups(pid, gid);

        let (Some(program), Some(geometry)) =
            (self.programs.get(pid.0), self.geometries.get(gid.0))
        else {
            log::error!("frame references handles this backend never issued; dropped");
            return;
        };
        let Some(frame_bind_group) = self.frame_bind_group.as_ref() else { return };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("cubist entity pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: frame.clear[0] as f64,
                        g: frame.clear[1] as f64,
                        b: frame.clear[2] as f64,
                        a: frame.clear[3] as f64,
                    }),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: target.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(&program.pipeline);
        rpass.set_bind_group(0, frame_bind_group, &[]);
        rpass.set_vertex_buffer(0, geometry.positions.slice(..));
        rpass.set_index_buffer(geometry.indices.slice(..), wgpu::IndexFormat::Uint16);

        // The draw bind group only exists once at least one draw has been
        // recorded; an empty frame ends here with just the clears.
        if let Some(draw_bind_group) = self.draw_bind_group.as_ref() {
            for (i, draw) in frame.draws.iter().enumerate() {
                rpass.set_bind_group(1, draw_bind_group, &[i as u32 * self.draw_stride]);
                rpass.draw_indexed(draw.range.offset..draw.range.end(), 0, 0..1);
            }
        } else if !frame.draws.is_empty() {
            log::error!("per-draw uniforms unavailable; {} draws skipped", frame.draws.len());
        }
    }

    fn write_frame_uniforms(&mut self, frame: &FrameState) {
        if self.frame_ubo.is_none() {
            self.frame_ubo = Some(self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("cubist frame ubo"),
                size: std::mem::size_of::<FrameUniforms>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.frame_bind_group = None;
        }
        let Some(ubo) = self.frame_ubo.as_ref() else { return };
        let uniforms = FrameUniforms {
            projection: frame.projection.to_cols_array_2d(),
        };
        self.queue.write_buffer(ubo, 0, bytemuck::bytes_of(&uniforms));
    }

    fn write_draw_uniforms(&mut self, draws: &[DrawCall]) {
        if draws.is_empty() {
            return;
        }

        if draws.len() > self.draw_capacity || self.draw_ubo.is_none() {
            let new_cap = draws.len().next_power_of_two().max(16);
            self.draw_ubo = Some(self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("cubist draw ubo"),
                size: new_cap as u64 * u64::from(self.draw_stride),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.draw_capacity = new_cap;
            self.draw_bind_group = None;
        }

        let stride = self.draw_stride as usize;
        let mut staging = vec![0u8; draws.len() * stride];
        for (i, draw) in draws.iter().enumerate() {
            let bytes = bytemuck::bytes_of(&draw.uniforms);
            staging[i * stride..i * stride + bytes.len()].copy_from_slice(bytes);
        }

        let Some(ubo) = self.draw_ubo.as_ref() else { return };
        self.queue.write_buffer(ubo, 0, &staging);
    }

    fn ensure_bind_groups(&mut self, pid: ProgramId, gid: GeometryId) {
        if self.bound_pair != Some((pid, gid)) {
            self.frame_bind_group = None;
            self.draw_bind_group = None;
        }

        let (Some(program), Some(geometry)) =
            (self.programs.get(pid.0), self.geometries.get(gid.0))
        else {
            return;
        };

        if self.frame_bind_group.is_none() {
            let Some(frame_ubo) = self.frame_ubo.as_ref() else { return };
            self.frame_bind_group = Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("cubist frame bind group"),
                layout: &program.frame_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: frame_ubo.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: geometry.vertex_colors.as_entire_binding(),
                    },
                ],
            }));
        }

        if self.draw_bind_group.is_none() {
            let Some(draw_ubo) = self.draw_ubo.as_ref() else { return };
            self.draw_bind_group = Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("cubist draw bind group"),
                layout: &program.draw_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: draw_ubo,
                        offset: 0,
                        size: wgpu::BufferSize::new(std::mem::size_of::<DrawUniforms>() as u64),
                    }),
                }],
            }));
        }

        self.bound_pair = Some((pid, gid));
    }

}

impl RenderBackend for WgpuBackend {
    fn create_program(&mut self, spec: &ProgramSpec<'_>) -> Result<ProgramId, BackendError> {
        // Error scopes turn wgpu's uncaptured-error callback into a value we
        // can hand back per setup stage; the guard pops when resolved.
        let scope = self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(spec.label),
                source: wgpu::ShaderSource::Wgsl(spec.source.into()),
            });
        if let Some(err) = pollster::block_on(scope.pop()) {
            return Err(BackendError::ShaderCompile(err.to_string()));
        }

        let frame_layout = self
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("cubist frame bgl"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: wgpu::BufferSize::new(
                                std::mem::size_of::<FrameUniforms>() as u64,
                            ),
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::VERTEX,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Storage { read_only: true },
                            has_dynamic_offset: false,
                            min_binding_size: wgpu::BufferSize::new(16),
                        },
                        count: None,
                    },
                ],
            });

        let draw_layout = self
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("cubist draw bgl"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<DrawUniforms>() as u64,
                        ),
                    },
                    count: None,
                }],
            });

        let scope = self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("cubist entity pipeline layout"),
                bind_group_layouts: &[&frame_layout, &draw_layout],
                immediate_size: 0,
            });

        const POSITION_ATTRS: [wgpu::VertexAttribute; 1] =
            wgpu::vertex_attr_array![0 => Float32x3];

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(spec.label),
                layout: Some(&pipeline_layout),

                vertex: wgpu::VertexState {
                    module: &module,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: (3 * std::mem::size_of::<f32>()) as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &POSITION_ATTRS,
                    }],
                },

                fragment: Some(wgpu::FragmentState {
                    module: &module,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.surface_format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),

                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },

                // Nearer fragments occlude farther ones; depth cleared to the
                // far plane each frame by flush().
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::LessEqual,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),

                multiview_mask: None,
                cache: None,
            });

        if let Some(err) = pollster::block_on(scope.pop()) {
            return Err(BackendError::PipelineLink(err.to_string()));
        }

        let id = ProgramId(self.programs.len());
        self.programs.push(ProgramBindings {
            pipeline,
            frame_layout,
            draw_layout,
        });
        Ok(id)
    }

    fn create_geometry(&mut self, upload: &GeometryUpload<'_>) -> Result<GeometryId, BackendError> {
        let scope = self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);

        let positions = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("cubist position vbo"),
                contents: bytemuck::cast_slice(upload.positions),
                usage: wgpu::BufferUsages::VERTEX,
            });

        // wgpu requires buffer sizes in 4-byte steps; pad an odd u16 count.
        // The padding index is never inside any recorded range.
        let indices = if upload.indices.len() % 2 == 0 {
            self.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("cubist index ibo"),
                    contents: bytemuck::cast_slice(upload.indices),
                    usage: wgpu::BufferUsages::INDEX,
                })
        } else {
            let mut padded = Vec::with_capacity(upload.indices.len() + 1);
            padded.extend_from_slice(upload.indices);
            padded.push(0);
            self.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("cubist index ibo"),
                    contents: bytemuck::cast_slice(&padded),
                    usage: wgpu::BufferUsages::INDEX,
                })
        };

        // The storage table must bind even when no entity uses per-vertex
        // colors; fall back to a single zeroed entry.
        let color_contents: &[f32] = if upload.vertex_colors.is_empty() {
            &[0.0; 4]
        } else {
            upload.vertex_colors
        };
        let vertex_colors = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("cubist vertex color table"),
                contents: bytemuck::cast_slice(color_contents),
                usage: wgpu::BufferUsages::STORAGE,
            });

        if let Some(err) = pollster::block_on(scope.pop()) {
            return Err(BackendError::BufferAllocation(err.to_string()));
        }

        let id = GeometryId(self.geometries.len());
        self.geometries.push(GeometryBuffers {
            positions,
            indices,
            vertex_colors,
        });
        Ok(id)
    }

    fn begin_frame(&mut self, clear: [f32; 4]) {
        self.frame = FrameState {
            begun: true,
            clear,
            ..FrameState::default()
        };
    }

    fn bind_geometry(&mut self, geometry: GeometryId) {
        self.frame.geometry = Some(geometry);
    }

    fn bind_program(&mut self, program: ProgramId) {
        self.frame.program = Some(program);
    }

    fn set_projection(&mut self, matrix: Mat4) {
        self.frame.projection = matrix;
    }

    fn set_model_view(&mut self, matrix: Mat4) {
        self.frame.model_view = matrix;
    }

    fn set_uniform_color(&mut self, rgba: [f32; 4]) {
        self.frame.color = rgba;
    }

    fn set_color_blend(&mut self, weight: f32) {
        self.frame.color_blend = weight;
    }

    fn set_vertex_color_range(&mut self, range: IndexRange, base_vertex: u32) {
        // The table is addressed in vec4 units; ranges are in float units.
        self.frame.color_base = range.offset / 4;
        self.frame.base_vertex = base_vertex;
    }

    fn draw_indexed(&mut self, range: IndexRange) {
        let uniforms = DrawUniforms {
            model_view: self.frame.model_view.to_cols_array_2d(),
            color: self.frame.color,
            color_blend: self.frame.color_blend,
            color_base: self.frame.color_base,
            base_vertex: self.frame.base_vertex,
            _pad: 0,
        };
        self.frame.draws.push(DrawCall { uniforms, range });
    }
}
