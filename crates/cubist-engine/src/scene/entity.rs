use std::fmt;
use std::num::NonZeroU32;

use glam::{Quat, Vec3};

use super::shape::{ColorId, ShapeId};

/// A placed instance of a shape: geometry reference, color reference, and a
/// mutable spatial transform.
///
/// Entities are owned by the renderer's registry; callers animate them
/// through the handle returned at registration. The transform defaults to
/// the origin with an identity rotation.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub shape: ShapeId,
    pub color: ColorId,
    pub position: Vec3,
    pub rotation: Quat,
}

impl Entity {
    pub fn new(shape: ShapeId, color: ColorId) -> Self {
        Self::at(shape, color, Vec3::ZERO)
    }

    pub fn at(shape: ShapeId, color: ColorId, position: Vec3) -> Self {
        Self {
            shape,
            color,
            position,
            rotation: Quat::IDENTITY,
        }
    }
}

/// Handle to a registered entity.
///
/// Handles are 1-based so that 0 stays free as a "no entity" sentinel in
/// caller-side tables; the registry is append-only, so a handle stays valid
/// for the renderer's lifetime.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct EntityId(pub(crate) NonZeroU32);

impl EntityId {
    /// Position in the registry (0-based).
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0.get() as usize - 1
    }

    /// The raw 1-based handle value.
    #[inline]
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.get())
    }
}
