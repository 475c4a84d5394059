use super::error::SceneError;
use super::shape::{ColorId, IndexRange, Rgba};

/// How a color entry is applied to an entity.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ColorVariant {
    /// One RGBA value covering the whole entity, uploaded as a uniform.
    Single,
    /// One RGBA value per vertex, interpolated by the rasterizer.
    Vertice,
}

/// Descriptor of a registered color: its variant and its span inside the
/// buffer belonging to that variant, in float units.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ColorRange {
    pub variant: ColorVariant,
    pub range: IndexRange,
}

/// Accumulates color registrations into two flat float buffers.
///
/// Single colors and per-vertex colors live in separate buffers so each
/// buffer keeps a fixed upload format and the shader never branches on a
/// tagged union. Ids are assigned in registration order across both
/// variants. Like [`ShapeList`](super::ShapeList), the structure is
/// append-only during setup and read-only afterwards.
#[derive(Debug, Default)]
pub struct ColorList {
    single: Vec<f32>,
    vertice: Vec<f32>,
    ranges: Vec<ColorRange>,
}

impl ColorList {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a uniform color. The recorded range always has length 4.
    pub fn push_single_color(&mut self, color: Rgba) -> ColorId {
        let id = ColorId(self.ranges.len());
        let offset = self.single.len() as u32;
        self.single.extend_from_slice(&color);
        self.ranges.push(ColorRange {
            variant: ColorVariant::Single,
            range: IndexRange::new(offset, 4),
        });
        id
    }

    /// Registers a per-vertex color run. The recorded range has length
    /// `4 × colors.len()`.
    pub fn push_vertice_color(&mut self, colors: &[Rgba]) -> ColorId {
        let id = ColorId(self.ranges.len());
        let offset = self.vertice.len() as u32;
        for color in colors {
            self.vertice.extend_from_slice(color);
        }
        self.ranges.push(ColorRange {
            variant: ColorVariant::Vertice,
            range: IndexRange::new(offset, (colors.len() * 4) as u32),
        });
        id
    }

    /// Descriptor of a registered color.
    pub fn range(&self, id: ColorId) -> Result<ColorRange, SceneError> {
        self.ranges
            .get(id.0)
            .copied()
            .ok_or(SceneError::UnknownColor(id))
    }

    /// Reads back the RGBA value of a single-variant range.
    ///
    /// The range must come from this list's descriptor table; it always
    /// points at exactly one quadruple.
    pub(crate) fn single_rgba(&self, range: IndexRange) -> Rgba {
        let o = range.offset as usize;
        [
            self.single[o],
            self.single[o + 1],
            self.single[o + 2],
            self.single[o + 3],
        ]
    }

    /// Flat single-color buffer (one RGBA quadruple per registration).
    #[inline]
    pub fn concatenated_single_colors(&self) -> &[f32] {
        &self.single
    }

    /// Flat per-vertex color buffer.
    #[inline]
    pub fn concatenated_vertice_colors(&self) -> &[f32] {
        &self.vertice
    }

    /// Number of color registrations across both variants.
    #[inline]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CYAN: Rgba = [0.0, 1.0, 1.0, 1.0];
    const YELLOW: Rgba = [1.0, 1.0, 0.0, 1.0];

    #[test]
    fn single_color_range_is_always_one_quadruple() {
        let mut list = ColorList::new();
        let a = list.push_single_color(CYAN);
        let b = list.push_single_color(YELLOW);

        let ra = list.range(a).unwrap();
        let rb = list.range(b).unwrap();
        assert_eq!(ra.variant, ColorVariant::Single);
        assert_eq!(ra.range, IndexRange::new(0, 4));
        assert_eq!(rb.range, IndexRange::new(4, 4));
        assert_eq!(list.single_rgba(rb.range), YELLOW);
    }

    #[test]
    fn vertice_color_range_scales_with_count() {
        let mut list = ColorList::new();
        let a = list.push_vertice_color(&[CYAN; 3]);
        let b = list.push_vertice_color(&[YELLOW; 24]);

        let ra = list.range(a).unwrap();
        assert_eq!(ra.variant, ColorVariant::Vertice);
        assert_eq!(ra.range, IndexRange::new(0, 12));
        assert_eq!(list.range(b).unwrap().range, IndexRange::new(12, 96));
        assert_eq!(list.concatenated_vertice_colors().len(), 108);
    }

    #[test]
    fn ids_are_shared_across_variants() {
        let mut list = ColorList::new();
        let a = list.push_single_color(CYAN);
        let b = list.push_vertice_color(&[YELLOW; 2]);
        let c = list.push_single_color(YELLOW);

        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(c.index(), 2);
        // Buffers advance independently of each other.
        assert_eq!(list.range(c).unwrap().range.offset, 4);
    }

    #[test]
    fn unknown_id_fails() {
        let list = ColorList::new();
        let unknown = ColorId(7);
        assert_eq!(list.range(unknown), Err(SceneError::UnknownColor(unknown)));
    }
}
