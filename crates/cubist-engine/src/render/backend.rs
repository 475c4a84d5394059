use glam::Mat4;
use thiserror::Error;

use crate::scene::IndexRange;

/// Handle to a compiled + linked shader program owned by a backend.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ProgramId(pub(crate) usize);

/// Handle to an uploaded geometry set (positions + indices + vertex colors).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct GeometryId(pub(crate) usize);

/// Shader program description handed to [`RenderBackend::create_program`].
#[derive(Debug, Copy, Clone)]
pub struct ProgramSpec<'a> {
    pub label: &'a str,
    pub source: &'a str,
}

/// One-shot upload of the scene's concatenated buffers.
///
/// `positions` holds flattened xyz coordinates, `indices` globally-rebased
/// triangle indices, `vertex_colors` the flat per-vertex color table (may be
/// empty when no entity uses per-vertex coloring).
#[derive(Debug, Copy, Clone)]
pub struct GeometryUpload<'a> {
    pub positions: &'a [f32],
    pub indices: &'a [u16],
    pub vertex_colors: &'a [f32],
}

/// Resource-allocation failures, one variant per setup stage so the caller
/// can report which stage failed.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("shader compilation failed: {0}")]
    ShaderCompile(String),

    #[error("pipeline link failed: {0}")]
    PipelineLink(String),

    #[error("buffer allocation failed: {0}")]
    BufferAllocation(String),
}

impl BackendError {
    /// Short stage name for log lines.
    pub fn stage(&self) -> &'static str {
        match self {
            BackendError::ShaderCompile(_) => "shader compile",
            BackendError::PipelineLink(_) => "pipeline link",
            BackendError::BufferAllocation(_) => "buffer allocation",
        }
    }
}

/// Capability interface the draw orchestrator requires from a graphics API.
///
/// Setup calls are fallible and happen once, at renderer initialization.
/// Frame calls are infallible state changes or draw submissions; the
/// renderer issues them in a fixed order each frame (clear, bind geometry,
/// bind program, frame uniforms, then per-entity uniforms + one indexed
/// draw per entity). State set by a frame call persists until overwritten —
/// backends must not reset anything between draws on their own.
pub trait RenderBackend {
    fn create_program(&mut self, spec: &ProgramSpec<'_>) -> Result<ProgramId, BackendError>;

    fn create_geometry(&mut self, upload: &GeometryUpload<'_>) -> Result<GeometryId, BackendError>;

    /// Starts a frame: clear color/depth (depth to the far plane) and enable
    /// nearer-occludes-farther depth testing.
    fn begin_frame(&mut self, clear: [f32; 4]);

    /// Binds an uploaded geometry set's vertex and index buffers, shared by
    /// every draw that follows.
    fn bind_geometry(&mut self, geometry: GeometryId);

    fn bind_program(&mut self, program: ProgramId);

    fn set_projection(&mut self, matrix: Mat4);

    fn set_model_view(&mut self, matrix: Mat4);

    /// Uploads the uniform entity color used when the blend weight is 1.0.
    fn set_uniform_color(&mut self, rgba: [f32; 4]);

    /// Interpolation weight between per-vertex color (0.0) and the uniform
    /// color (1.0).
    fn set_color_blend(&mut self, weight: f32);

    /// Scopes the per-vertex color table to `range` for subsequent draws.
    ///
    /// `base_vertex` is the first global vertex index of the shape being
    /// drawn; the backend uses it to map global vertex indices into the
    /// range.
    fn set_vertex_color_range(&mut self, range: IndexRange, base_vertex: u32);

    /// Issues one indexed triangle-list draw scoped to `range` (index-count
    /// units).
    fn draw_indexed(&mut self, range: IndexRange);
}
