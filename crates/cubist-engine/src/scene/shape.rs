use std::fmt;

use glam::Vec3;

/// One RGBA color: four `f32` components in `[0, 1]`.
pub type Rgba = [f32; 4];

/// A mesh authored in its own local index space: vertex positions, triangle
/// indices, and optionally one color per vertex.
///
/// Invariants (checked by [`ShapeList::push`](super::ShapeList::push), not here):
/// - every index refers to a vertex of *this* shape
/// - `vertex_colors`, when present, is aligned 1:1 with `vertices`
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub vertices: Vec<Vec3>,
    pub indices: Vec<[u16; 3]>,
    pub vertex_colors: Option<Vec<Rgba>>,
}

impl Shape {
    /// Number of triangles in the shape.
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }
}

/// A contiguous span inside a concatenated buffer.
///
/// Both fields are in *element* units (never bytes): for the index buffer an
/// offset of 36 means "the 37th index", and the draw consumer maps a range
/// directly onto an indexed draw call without unit conversion.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct IndexRange {
    pub offset: u32,
    pub length: u32,
}

impl IndexRange {
    #[inline]
    pub const fn new(offset: u32, length: u32) -> Self {
        Self { offset, length }
    }

    /// End of the span (one past the last element).
    #[inline]
    pub fn end(self) -> u32 {
        self.offset + self.length
    }
}

/// Handle to a shape stored in a [`ShapeList`](super::ShapeList).
///
/// Assigned in insertion order, 0-based.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ShapeId(pub(crate) usize);

impl ShapeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to a color entry stored in a [`ColorList`](super::ColorList).
///
/// Assigned in insertion order, 0-based, across both color variants.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ColorId(pub(crate) usize);

impl ColorId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ColorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
