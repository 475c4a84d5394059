//! Demo viewer: three cubes, an orbiting camera, two of them spinning.
//!
//! Exercises the whole stack end to end: pooled geometry, the entity
//! registry, deferred renderer initialization (the GPU backend only exists
//! once the runtime has a surface), and per-frame animation.

use anyhow::Result;
use glam::{EulerRot, Mat4, Quat, Vec3};

use cubist_engine::core::{App, AppControl, FrameCtx};
use cubist_engine::device::GpuInit;
use cubist_engine::logging::{init_logging, LoggingConfig};
use cubist_engine::render::{Renderer, WgpuBackend};
use cubist_engine::scene::{factory, ColorList, Entity, EntityId, ShapeList};
use cubist_engine::window::{Runtime, RuntimeConfig};

const CYAN: [f32; 4] = [0.0, 1.0, 1.0, 1.0];
const YELLOW: [f32; 4] = [1.0, 1.0, 0.0, 1.0];

/// Scene center; the camera orbits this point.
const ORBIT_CENTER: Vec3 = Vec3::new(0.0, 0.0, -5.0);
const ORBIT_RADIUS: f32 = 5.0;

/// Camera angular speed, radians per second.
const ORBIT_SPEED: f32 = 1.0;

/// Cube spin speeds, degrees per second.
const SPIN_Y: f32 = 60.0;
const SPIN_Z: f32 = 100.0;

struct Viewer {
    renderer: Renderer,
    backend: Option<WgpuBackend>,

    /// Lists held until the first frame; initialization needs a live device.
    pending: Option<(ShapeList, ColorList)>,

    spinning: [EntityId; 2],
}

impl Viewer {
    fn build() -> Result<Self> {
        let mut shapes = ShapeList::new();
        let cube_large = shapes.push(&factory::cube(1.0))?;
        let cube_small = shapes.push(&factory::cube(0.2))?;
        let cube_mid = shapes.push(&factory::cube(0.4))?;

        let mut colors = ColorList::new();
        let cyan = colors.push_single_color(CYAN);
        let yellow = colors.push_single_color(YELLOW);

        let mut renderer = Renderer::new(4.0 / 3.0);
        let left = renderer.register_entity(Entity::at(
            cube_large,
            cyan,
            Vec3::new(-1.5, 0.0, -5.0),
        ));
        let right = renderer.register_entity(Entity::at(
            cube_small,
            cyan,
            Vec3::new(1.5, 0.0, -5.0),
        ));
        renderer.register_entity(Entity::at(cube_mid, yellow, ORBIT_CENTER));

        Ok(Self {
            renderer,
            backend: None,
            pending: Some((shapes, colors)),
            spinning: [left, right],
        })
    }

    fn ensure_backend(&mut self, ctx: &FrameCtx<'_, '_>) -> AppControl {
        if self.backend.is_some() {
            return AppControl::Continue;
        }

        let mut backend = WgpuBackend::new(
            ctx.gpu.device(),
            ctx.gpu.queue(),
            ctx.gpu.surface_format(),
        );

        let Some((shapes, colors)) = self.pending.take() else {
            return AppControl::Continue;
        };
        if let Err(e) = self.renderer.initialize(&mut backend, shapes, colors) {
            log::error!("cannot start viewer: {e}");
            return AppControl::Exit;
        }

        self.backend = Some(backend);
        AppControl::Continue
    }
}

/// Perspective projection composed with an orbiting view.
fn camera(aspect: f32, elapsed: f32) -> Mat4 {
    let angle = ORBIT_SPEED * elapsed;
    let eye = ORBIT_CENTER + Vec3::new(ORBIT_RADIUS * angle.cos(), 0.0, ORBIT_RADIUS * angle.sin());

    Mat4::perspective_rh(45f32.to_radians(), aspect, 0.1, 100.0)
        * Mat4::look_at_rh(eye, ORBIT_CENTER, Vec3::Y)
}

impl App for Viewer {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if self.ensure_backend(ctx) == AppControl::Exit {
            return AppControl::Exit;
        }
        let Some(backend) = self.backend.as_mut() else {
            return AppControl::Continue;
        };

        let t = ctx.time.elapsed;
        let (width, height) = ctx.window.logical_size();
        let aspect = if height > 0.0 { width / height } else { 1.0 };

        self.renderer.set_projection(camera(aspect, t));

        let spin = Quat::from_euler(
            EulerRot::ZYX,
            (SPIN_Z * t).to_radians(),
            (SPIN_Y * t).to_radians(),
            0.0,
        );
        for id in self.spinning {
            match self.renderer.entity_mut(id) {
                Ok(entity) => entity.rotation = spin,
                Err(e) => {
                    log::error!("lost track of a scene entity: {e}");
                    return AppControl::Exit;
                }
            }
        }

        if let Err(e) = self.renderer.draw(backend) {
            log::error!("frame failed: {e}");
            return AppControl::Exit;
        }

        ctx.render(|target| backend.flush(target))
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let viewer = Viewer::build()?;
    Runtime::run(
        RuntimeConfig {
            title: "cubist viewer".to_string(),
            ..Default::default()
        },
        GpuInit::default(),
        viewer,
    )
}
