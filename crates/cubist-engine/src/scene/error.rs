use thiserror::Error;

use super::entity::EntityId;
use super::shape::{ColorId, ShapeId};

/// Errors surfaced by the scene packing layer and the entity registry.
///
/// Validation failures are reported at push time and abort only the failing
/// push; lookups with unknown ids fail explicitly instead of returning a
/// default range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneError {
    #[error("shape has {vertices} vertices but {vertex_colors} vertex colors")]
    VertexColorCountMismatch { vertices: usize, vertex_colors: usize },

    #[error("triangle index {index} out of bounds for shape with {vertices} vertices")]
    IndexOutOfBounds { index: u16, vertices: usize },

    /// Indices are stored as `u16`; the concatenated vertex buffer must stay
    /// addressable by them.
    #[error("shape list full: {total} vertices exceed 16-bit index space")]
    VertexCapacityExceeded { total: usize },

    #[error("unknown shape id {0}")]
    UnknownShape(ShapeId),

    #[error("unknown color id {0}")]
    UnknownColor(ColorId),

    #[error("unknown entity handle {0}")]
    UnknownEntity(EntityId),
}
