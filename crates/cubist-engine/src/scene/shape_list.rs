use super::error::SceneError;
use super::shape::{IndexRange, Shape, ShapeId};

/// Packs independently-authored shapes into two flat buffers suitable for a
/// single GPU upload, keeping a side table of per-shape ranges.
///
/// Layout:
/// - `positions` holds flattened xyz coordinates of every pushed shape
/// - `indices` holds every shape's triangles, each index rebased into the
///   *global* vertex buffer
/// - `ranges` maps a [`ShapeId`] to its span of `indices` plus the first
///   global vertex the shape occupies
///
/// The structure is write-once-per-entry: shapes are appended during scene
/// setup and the buffers are read exactly once, at renderer initialization.
/// There is no removal or mutation after a push.
#[derive(Debug, Default)]
pub struct ShapeList {
    positions: Vec<f32>,
    indices: Vec<u16>,
    ranges: Vec<ShapeEntry>,
}

#[derive(Debug, Copy, Clone)]
struct ShapeEntry {
    indices: IndexRange,
    base_vertex: u32,
}

impl ShapeList {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a shape and returns its 0-based id.
    ///
    /// Every index is rebased by the number of vertices already stored, so
    /// stored indices always address the global vertex buffer. The recorded
    /// range covers the shape's indices in index-count units
    /// (`offset` = index buffer length before this push, `length` = 3 ×
    /// triangle count).
    ///
    /// Fails without modifying the list when the shape carries a per-vertex
    /// color array of mismatched length, when an index refers past the
    /// shape's own vertices, or when the combined vertex count would no
    /// longer fit 16-bit indices.
    pub fn push(&mut self, shape: &Shape) -> Result<ShapeId, SceneError> {
        let vertex_count = shape.vertices.len();

        if let Some(colors) = &shape.vertex_colors {
            if colors.len() != vertex_count {
                return Err(SceneError::VertexColorCountMismatch {
                    vertices: vertex_count,
                    vertex_colors: colors.len(),
                });
            }
        }

        for triangle in &shape.indices {
            for &index in triangle {
                if usize::from(index) >= vertex_count {
                    return Err(SceneError::IndexOutOfBounds {
                        index,
                        vertices: vertex_count,
                    });
                }
            }
        }

        let base_vertex = (self.positions.len() / 3) as u32;
        let total = base_vertex as usize + vertex_count;
        if total > usize::from(u16::MAX) + 1 {
            return Err(SceneError::VertexCapacityExceeded { total });
        }

        let offset = self.indices.len() as u32;

        for v in &shape.vertices {
            self.positions.extend_from_slice(&[v.x, v.y, v.z]);
        }
        for triangle in &shape.indices {
            for &index in triangle {
                self.indices.push(index + base_vertex as u16);
            }
        }

        let id = ShapeId(self.ranges.len());
        self.ranges.push(ShapeEntry {
            indices: IndexRange::new(offset, (shape.indices.len() * 3) as u32),
            base_vertex,
        });
        Ok(id)
    }

    /// Flattened vertex coordinates of every pushed shape.
    #[inline]
    pub fn concatenated_vertices(&self) -> &[f32] {
        &self.positions
    }

    /// Globally-rebased triangle indices of every pushed shape.
    #[inline]
    pub fn concatenated_indices(&self) -> &[u16] {
        &self.indices
    }

    /// Index-buffer span of a shape, in index-count units.
    pub fn range(&self, id: ShapeId) -> Result<IndexRange, SceneError> {
        self.ranges
            .get(id.0)
            .map(|e| e.indices)
            .ok_or(SceneError::UnknownShape(id))
    }

    /// First global vertex occupied by a shape.
    ///
    /// The per-vertex color path needs this to relate a global vertex index
    /// back to the shape-local one.
    pub fn base_vertex(&self, id: ShapeId) -> Result<u32, SceneError> {
        self.ranges
            .get(id.0)
            .map(|e| e.base_vertex)
            .ok_or(SceneError::UnknownShape(id))
    }

    /// Number of shapes pushed so far.
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
    use glam::Vec3;

    use super::*;

    fn triangle(z: f32) -> Shape {
        Shape {
            vertices: vec![
                Vec3::new(0.0, 0.0, z),
                Vec3::new(1.0, 0.0, z),
                Vec3::new(0.0, 1.0, z),
            ],
            indices: vec![[0, 1, 2]],
            vertex_colors: None,
        }
    }

    fn quad() -> Shape {
        Shape {
            vertices: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
            ],
            indices: vec![[0, 1, 2], [2, 1, 3]],
            vertex_colors: None,
        }
    }

    #[test]
    fn ranges_are_cumulative() {
        let mut list = ShapeList::new();
        let a = list.push(&triangle(0.0)).unwrap();
        let b = list.push(&quad()).unwrap();

        assert_eq!(list.range(a).unwrap(), IndexRange::new(0, 3));
        assert_eq!(list.range(b).unwrap(), IndexRange::new(3, 6));
        assert_eq!(list.base_vertex(b).unwrap(), 3);
    }

    #[test]
    fn push_order_changes_offsets_but_not_topology() {
        let mut ab = ShapeList::new();
        ab.push(&triangle(0.0)).unwrap();
        let b_after = ab.push(&quad()).unwrap();

        let mut ba = ShapeList::new();
        let b_first = ba.push(&quad()).unwrap();
        ba.push(&triangle(0.0)).unwrap();

        let r_after = ab.range(b_after).unwrap();
        let r_first = ba.range(b_first).unwrap();
        assert_ne!(r_after.offset, r_first.offset);
        assert_eq!(r_after.length, r_first.length);

        // Rebase both spans to local indices; the quad's topology survives
        // either insertion order.
        let local = |list: &ShapeList, range: IndexRange, base: u16| -> Vec<u16> {
            list.concatenated_indices()[range.offset as usize..range.end() as usize]
                .iter()
                .map(|&i| i - base)
                .collect()
        };
        assert_eq!(
            local(&ab, r_after, ab.base_vertex(b_after).unwrap() as u16),
            local(&ba, r_first, 0)
        );
    }

    #[test]
    fn no_cross_shape_index_leakage() {
        let mut list = ShapeList::new();
        let ids = [
            list.push(&triangle(0.0)).unwrap(),
            list.push(&quad()).unwrap(),
            list.push(&triangle(1.0)).unwrap(),
        ];
        let vertex_counts = [3u32, 4, 3];

        let mut base = 0u32;
        for (id, count) in ids.iter().zip(vertex_counts) {
            let range = list.range(*id).unwrap();
            let span =
                &list.concatenated_indices()[range.offset as usize..range.end() as usize];
            for &index in span {
                let index = u32::from(index);
                assert!(index >= base && index < base + count);
            }
            base += count;
        }
    }

    #[test]
    fn vertex_color_mismatch_aborts_push_only() {
        let mut list = ShapeList::new();
        let mut bad = triangle(0.0);
        bad.vertex_colors = Some(vec![[1.0, 0.0, 0.0, 1.0]; 2]);

        assert!(matches!(
            list.push(&bad),
            Err(SceneError::VertexColorCountMismatch { vertices: 3, vertex_colors: 2 })
        ));
        assert!(list.is_empty());
        assert!(list.concatenated_vertices().is_empty());

        // The list is still usable afterwards.
        list.push(&triangle(0.0)).unwrap();
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn out_of_bounds_index_rejected() {
        let mut list = ShapeList::new();
        let mut bad = triangle(0.0);
        bad.indices = vec![[0, 1, 3]];

        assert!(matches!(
            list.push(&bad),
            Err(SceneError::IndexOutOfBounds { index: 3, vertices: 3 })
        ));
    }

    #[test]
    fn unknown_id_fails() {
        let mut list = ShapeList::new();
        list.push(&triangle(0.0)).unwrap();
        list.push(&quad()).unwrap();

        let unknown = ShapeId(99);
        assert_eq!(list.range(unknown), Err(SceneError::UnknownShape(unknown)));
        assert_eq!(
            list.base_vertex(unknown),
            Err(SceneError::UnknownShape(unknown))
        );
    }
}
