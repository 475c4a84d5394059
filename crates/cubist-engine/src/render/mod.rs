//! GPU rendering subsystem.
//!
//! [`Renderer`] owns the packed scene data and the entity registry and emits
//! a fixed per-frame call sequence against the [`RenderBackend`] capability
//! trait; [`WgpuBackend`] is the wgpu implementation of that trait.
//!
//! Convention:
//! - geometry is uploaded once, at renderer initialization
//! - ranges into the shared buffers are in element units, never bytes
//! - one indexed draw call per entity, in registration order

mod backend;
mod renderer;
mod wgpu_backend;

pub use backend::{BackendError, GeometryId, GeometryUpload, ProgramId, ProgramSpec, RenderBackend};
pub use renderer::{Renderer, RendererState};
pub use wgpu_backend::{WgpuBackend, DEPTH_FORMAT};

/// Target for drawing: command encoder plus color/depth views of the frame.
pub struct RenderTarget<'a> {
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub color_view: &'a wgpu::TextureView,
    pub depth_view: &'a wgpu::TextureView,
}

impl<'a> RenderTarget<'a> {
    #[inline]
    pub fn new(
        encoder: &'a mut wgpu::CommandEncoder,
        color_view: &'a wgpu::TextureView,
        depth_view: &'a wgpu::TextureView,
    ) -> Self {
        Self {
            encoder,
            color_view,
            depth_view,
        }
    }
}
