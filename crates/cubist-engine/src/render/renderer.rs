use glam::Mat4;

use crate::scene::{ColorList, ColorVariant, Entity, EntityId, SceneError, ShapeList};

use super::backend::{BackendError, GeometryId, GeometryUpload, ProgramId, ProgramSpec, RenderBackend};

/// Fixed clear color: black, fully opaque.
const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Initialization progress of a [`Renderer`].
///
/// A failed `initialize` leaves the renderer at the last state it reached;
/// `draw` only does work in `Ready`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RendererState {
    Uninitialized,
    ShaderReady,
    BuffersReady,
    Ready,
}

/// Owns the scene's packed buffers, the entity registry, and the projection
/// matrix, and turns them into the per-frame draw sequence.
///
/// Lifecycle: construct, register entities (allowed before or after
/// initialization), call [`initialize`](Self::initialize) exactly once with
/// the finished lists, then [`draw`](Self::draw) once per frame. The lists
/// are moved in and immutable afterwards; only entity transforms and the
/// projection matrix change between frames.
pub struct Renderer {
    state: RendererState,
    projection: Mat4,

    entities: Vec<Entity>,

    shapes: Option<ShapeList>,
    colors: Option<ColorList>,
    program: Option<ProgramId>,
    geometry: Option<GeometryId>,

    warned_not_ready: bool,
}

impl Renderer {
    /// Creates an uninitialized renderer with the default camera: 45° vertical
    /// field of view, near 0.1, far 100, the given viewport aspect ratio.
    pub fn new(aspect: f32) -> Self {
        Self {
            state: RendererState::Uninitialized,
            projection: Mat4::perspective_rh(45f32.to_radians(), aspect, 0.1, 100.0),
            entities: Vec::new(),
            shapes: None,
            colors: None,
            program: None,
            geometry: None,
            warned_not_ready: false,
        }
    }

    #[inline]
    pub fn state(&self) -> RendererState {
        self.state
    }

    /// Projection matrix uploaded once per frame. Callers may replace it
    /// between frames (e.g. for an orbiting camera).
    #[inline]
    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    #[inline]
    pub fn set_projection(&mut self, projection: Mat4) {
        self.projection = projection;
    }

    /// Appends an entity to the registry and returns its handle.
    ///
    /// Valid in any state. Handles are 1-based (registry length at the time
    /// of the call); the registry is append-only, so handles never dangle.
    pub fn register_entity(&mut self, entity: Entity) -> EntityId {
        self.entities.push(entity);
        let raw = self.entities.len() as u32;
        // Length is >= 1 right after a push.
        EntityId(std::num::NonZeroU32::new(raw).expect("registry length is non-zero after push"))
    }

    /// Mutable access to a registered entity, for per-frame transform updates.
    pub fn entity_mut(&mut self, id: EntityId) -> Result<&mut Entity, SceneError> {
        self.entities
            .get_mut(id.index())
            .ok_or(SceneError::UnknownEntity(id))
    }

    /// Number of registered entities.
    #[inline]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// One-shot setup: compiles the shader program, uploads the concatenated
    /// buffers, and takes ownership of the lists.
    ///
    /// Walks `Uninitialized → ShaderReady → BuffersReady → Ready`, stopping
    /// at the first failing stage; the failing stage is logged and returned.
    /// The caller is expected to refuse to start the frame loop on failure.
    pub fn initialize<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        shapes: ShapeList,
        colors: ColorList,
    ) -> Result<(), BackendError> {
        if self.state != RendererState::Uninitialized {
            log::warn!("renderer initialized more than once; reinitializing");
            self.state = RendererState::Uninitialized;
        }

        let program = backend
            .create_program(&ProgramSpec {
                label: "cubist entity program",
                source: include_str!("shaders/entity.wgsl"),
            })
            .inspect_err(|e| log::error!("renderer initialization failed at {}: {e}", e.stage()))?;
        self.program = Some(program);
        self.state = RendererState::ShaderReady;

        let geometry = backend
            .create_geometry(&GeometryUpload {
                positions: shapes.concatenated_vertices(),
                indices: shapes.concatenated_indices(),
                vertex_colors: colors.concatenated_vertice_colors(),
            })
            .inspect_err(|e| log::error!("renderer initialization failed at {}: {e}", e.stage()))?;
        self.geometry = Some(geometry);
        self.state = RendererState::BuffersReady;

        self.shapes = Some(shapes);
        self.colors = Some(colors);
        self.state = RendererState::Ready;

        log::debug!(
            "renderer ready: {} shapes, {} colors, {} entities",
            self.shapes.as_ref().map_or(0, ShapeList::len),
            self.colors.as_ref().map_or(0, ColorList::len),
            self.entities.len()
        );
        Ok(())
    }

    /// Renders every registered entity, in registration order.
    ///
    /// Outside the `Ready` state this is a no-op with a one-time diagnostic
    /// rather than an error, so a caller's frame loop keeps running while
    /// initialization is pending. Unknown shape/color ids referenced by an
    /// entity fail explicitly.
    ///
    /// Sequence per frame: clear color+depth, bind the shared vertex/index
    /// buffers and the program once, upload the projection once, then for
    /// each entity resolve its color (uniform upload + blend weight 1.0 for
    /// a single color; color sub-range + blend weight 0.0 for per-vertex),
    /// upload its model-view matrix (rotation applied before translation),
    /// and issue one indexed draw over exactly its shape's range. State not
    /// touched per entity persists across the loop.
    pub fn draw<B: RenderBackend>(&mut self, backend: &mut B) -> Result<(), SceneError> {
        if self.state != RendererState::Ready {
            if !self.warned_not_ready {
                log::warn!("draw called before renderer initialization; skipping frames");
                self.warned_not_ready = true;
            }
            return Ok(());
        }

        // Ready implies all four are present.
        let (Some(shapes), Some(colors), Some(program), Some(geometry)) =
            (&self.shapes, &self.colors, self.program, self.geometry)
        else {
            return Ok(());
        };

        backend.begin_frame(CLEAR_COLOR);
        backend.bind_geometry(geometry);
        backend.bind_program(program);
        backend.set_projection(self.projection);

        for entity in &self.entities {
            let color = colors.range(entity.color)?;
            match color.variant {
                ColorVariant::Single => {
                    backend.set_uniform_color(colors.single_rgba(color.range));
                    backend.set_color_blend(1.0);
                }
                ColorVariant::Vertice => {
                    backend.set_vertex_color_range(color.range, shapes.base_vertex(entity.shape)?);
                    backend.set_color_blend(0.0);
                }
            }

            backend.set_model_view(Mat4::from_rotation_translation(
                entity.rotation,
                entity.position,
            ));
            backend.draw_indexed(shapes.range(entity.shape)?);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use crate::scene::{factory, IndexRange};

    use super::*;

    /// Backend double that records every call and can be told to fail a
    /// given setup stage.
    #[derive(Default)]
    struct RecordingBackend {
        calls: Vec<Call>,
        fail_program: Option<BackendError>,
        fail_geometry: Option<BackendError>,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        BeginFrame([f32; 4]),
        BindGeometry(GeometryId),
        BindProgram(ProgramId),
        SetProjection,
        SetModelView,
        SetUniformColor([f32; 4]),
        SetColorBlend(f32),
        SetVertexColorRange(IndexRange, u32),
        DrawIndexed(IndexRange),
    }

    impl RenderBackend for RecordingBackend {
        fn create_program(&mut self, _spec: &ProgramSpec<'_>) -> Result<ProgramId, BackendError> {
            match self.fail_program.take() {
                Some(err) => Err(err),
                None => Ok(ProgramId(0)),
            }
        }

        fn create_geometry(
            &mut self,
            _upload: &GeometryUpload<'_>,
        ) -> Result<GeometryId, BackendError> {
            match self.fail_geometry.take() {
                Some(err) => Err(err),
                None => Ok(GeometryId(0)),
            }
        }

        fn begin_frame(&mut self, clear: [f32; 4]) {
            self.calls.push(Call::BeginFrame(clear));
        }
        fn bind_geometry(&mut self, geometry: GeometryId) {
            self.calls.push(Call::BindGeometry(geometry));
        }
        fn bind_program(&mut self, program: ProgramId) {
            self.calls.push(Call::BindProgram(program));
        }
        fn set_projection(&mut self, _matrix: Mat4) {
            self.calls.push(Call::SetProjection);
        }
        fn set_model_view(&mut self, _matrix: Mat4) {
            self.calls.push(Call::SetModelView);
        }
        fn set_uniform_color(&mut self, rgba: [f32; 4]) {
            self.calls.push(Call::SetUniformColor(rgba));
        }
        fn set_color_blend(&mut self, weight: f32) {
            self.calls.push(Call::SetColorBlend(weight));
        }
        fn set_vertex_color_range(&mut self, range: IndexRange, base_vertex: u32) {
            self.calls.push(Call::SetVertexColorRange(range, base_vertex));
        }
        fn draw_indexed(&mut self, range: IndexRange) {
            self.calls.push(Call::DrawIndexed(range));
        }
    }

    const CYAN: [f32; 4] = [0.0, 1.0, 1.0, 1.0];

    fn cyan_cube_scene() -> (ShapeList, ColorList, Renderer) {
        let mut shapes = ShapeList::new();
        let big = shapes.push(&factory::cube(1.0)).unwrap();
        let small = shapes.push(&factory::cube(0.2)).unwrap();

        let mut colors = ColorList::new();
        let cyan = colors.push_single_color(CYAN);

        let mut renderer = Renderer::new(4.0 / 3.0);
        renderer.register_entity(Entity::at(big, cyan, Vec3::new(-1.5, 0.0, -5.0)));
        renderer.register_entity(Entity::at(small, cyan, Vec3::new(1.5, 0.0, -5.0)));
        (shapes, colors, renderer)
    }

    #[test]
    fn handles_are_one_based_registration_order() {
        let mut shapes = ShapeList::new();
        let shape = shapes.push(&factory::cube(1.0)).unwrap();
        let mut colors = ColorList::new();
        let color = colors.push_single_color(CYAN);

        let mut renderer = Renderer::new(1.0);
        let first = renderer.register_entity(Entity::new(shape, color));
        let second = renderer.register_entity(Entity::new(shape, color));
        assert_eq!(first.get(), 1);
        assert_eq!(second.get(), 2);
        assert!(renderer.entity_mut(second).is_ok());

        let unknown = EntityId(std::num::NonZeroU32::new(99).unwrap());
        assert_eq!(
            renderer.entity_mut(unknown).unwrap_err(),
            SceneError::UnknownEntity(unknown)
        );
    }

    #[test]
    fn initialize_reaches_ready() {
        let (shapes, colors, mut renderer) = cyan_cube_scene();
        let mut backend = RecordingBackend::default();

        assert_eq!(renderer.state(), RendererState::Uninitialized);
        renderer.initialize(&mut backend, shapes, colors).unwrap();
        assert_eq!(renderer.state(), RendererState::Ready);
    }

    #[test]
    fn initialize_stops_at_failed_shader_stage() {
        let (shapes, colors, mut renderer) = cyan_cube_scene();
        let mut backend = RecordingBackend {
            fail_program: Some(BackendError::ShaderCompile("syntax error".into())),
            ..Default::default()
        };

        let err = renderer.initialize(&mut backend, shapes, colors).unwrap_err();
        assert_eq!(err.stage(), "shader compile");
        assert_eq!(renderer.state(), RendererState::Uninitialized);
    }

    #[test]
    fn initialize_stops_at_failed_buffer_stage() {
        let (shapes, colors, mut renderer) = cyan_cube_scene();
        let mut backend = RecordingBackend {
            fail_geometry: Some(BackendError::BufferAllocation("out of memory".into())),
            ..Default::default()
        };

        let err = renderer.initialize(&mut backend, shapes, colors).unwrap_err();
        assert_eq!(err.stage(), "buffer allocation");
        assert_eq!(renderer.state(), RendererState::ShaderReady);
    }

    #[test]
    fn draw_before_ready_is_a_no_op() {
        let (_, _, mut renderer) = cyan_cube_scene();
        let mut backend = RecordingBackend::default();

        renderer.draw(&mut backend).unwrap();
        assert!(backend.calls.is_empty());
    }

    #[test]
    fn empty_registry_still_clears_the_frame() {
        let mut shapes = ShapeList::new();
        shapes.push(&factory::cube(1.0)).unwrap();
        let mut colors = ColorList::new();
        colors.push_single_color(CYAN);

        // No entities registered: the frame must still begin (clearing color
        // and depth) even though nothing gets drawn.
        let mut renderer = Renderer::new(1.0);
        let mut backend = RecordingBackend::default();
        renderer.initialize(&mut backend, shapes, colors).unwrap();
        renderer.draw(&mut backend).unwrap();

        assert_eq!(
            backend.calls,
            [
                Call::BeginFrame([0.0, 0.0, 0.0, 1.0]),
                Call::BindGeometry(GeometryId(0)),
                Call::BindProgram(ProgramId(0)),
                Call::SetProjection,
            ]
        );
    }

    #[test]
    fn draw_issues_one_indexed_call_per_entity() {
        let (shapes, colors, mut renderer) = cyan_cube_scene();
        let expected: Vec<IndexRange> = (0..shapes.len())
            .map(|i| shapes.range(crate::scene::ShapeId(i)).unwrap())
            .collect();

        let mut backend = RecordingBackend::default();
        renderer.initialize(&mut backend, shapes, colors).unwrap();
        renderer.draw(&mut backend).unwrap();

        let draws: Vec<IndexRange> = backend
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::DrawIndexed(range) => Some(*range),
                _ => None,
            })
            .collect();
        assert_eq!(draws, expected);
    }

    #[test]
    fn two_cyan_cubes_end_to_end() {
        let (shapes, colors, mut renderer) = cyan_cube_scene();
        let mut backend = RecordingBackend::default();
        renderer.initialize(&mut backend, shapes, colors).unwrap();
        renderer.draw(&mut backend).unwrap();

        // Shared state is set exactly once per frame, before any entity work.
        assert_eq!(
            backend.calls[..4],
            [
                Call::BeginFrame([0.0, 0.0, 0.0, 1.0]),
                Call::BindGeometry(GeometryId(0)),
                Call::BindProgram(ProgramId(0)),
                Call::SetProjection,
            ]
        );

        // Each draw is preceded by the cyan uniform and a blend weight of 1.0.
        assert_eq!(
            backend.calls[4..],
            [
                Call::SetUniformColor(CYAN),
                Call::SetColorBlend(1.0),
                Call::SetModelView,
                Call::DrawIndexed(IndexRange::new(0, 36)),
                Call::SetUniformColor(CYAN),
                Call::SetColorBlend(1.0),
                Call::SetModelView,
                Call::DrawIndexed(IndexRange::new(36, 36)),
            ]
        );
    }

    #[test]
    fn vertice_colored_entity_uses_color_range_path() {
        let face_colors = [[1.0, 0.0, 0.0, 1.0]; 6];
        let shape = factory::cube_with_face_colors(1.0, face_colors);

        let mut shapes = ShapeList::new();
        let cube = shapes.push(&shape).unwrap();

        let mut colors = ColorList::new();
        let per_vertex = colors.push_vertice_color(shape.vertex_colors.as_ref().unwrap());

        let mut renderer = Renderer::new(1.0);
        renderer.register_entity(Entity::new(cube, per_vertex));

        let mut backend = RecordingBackend::default();
        renderer.initialize(&mut backend, shapes, colors).unwrap();
        renderer.draw(&mut backend).unwrap();

        assert!(backend
            .calls
            .contains(&Call::SetVertexColorRange(IndexRange::new(0, 96), 0)));
        assert!(backend.calls.contains(&Call::SetColorBlend(0.0)));
        assert!(!backend
            .calls
            .iter()
            .any(|c| matches!(c, Call::SetUniformColor(_))));
    }

    #[test]
    fn unknown_color_id_fails_draw() {
        let mut shapes = ShapeList::new();
        let cube = shapes.push(&factory::cube(1.0)).unwrap();
        let colors = ColorList::new();

        let mut renderer = Renderer::new(1.0);
        renderer.register_entity(Entity::new(cube, crate::scene::ColorId(0)));

        let mut backend = RecordingBackend::default();
        renderer.initialize(&mut backend, shapes, colors).unwrap();
        assert!(matches!(
            renderer.draw(&mut backend),
            Err(SceneError::UnknownColor(_))
        ));
    }
}
