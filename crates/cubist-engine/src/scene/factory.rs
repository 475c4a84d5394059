//! Pure geometry generators.
//!
//! Factories know nothing about buffers or packing; they emit a [`Shape`]
//! in its own local index space, ready for [`ShapeList::push`].
//!
//! [`ShapeList::push`]: super::ShapeList::push

use glam::Vec3;

use super::shape::{Rgba, Shape};

/// Axis-aligned cube centered at the origin with edge length `width`.
///
/// Emits the 8 unique corner vertices and 12 triangles (2 per face);
/// vertices shared between faces are deduplicated, so the shape carries no
/// per-vertex colors. Use [`cube_with_face_colors`] when faces need
/// independent colors.
pub fn cube(width: f32) -> Shape {
    let h = width / 2.0;
    let signs = [-h, h];

    // Corner (ix, iy, iz) lives at index ix*4 + iy*2 + iz.
    let mut vertices = Vec::with_capacity(8);
    for &x in &signs {
        for &y in &signs {
            for &z in &signs {
                vertices.push(Vec3::new(x, y, z));
            }
        }
    }

    let corner = |c: [usize; 3]| (c[0] * 4 + c[1] * 2 + c[2]) as u16;

    let mut indices = Vec::with_capacity(12);
    for axis in 0..3 {
        for side in 0..2 {
            let mut quad = [0u16; 4];
            for u in 0..2 {
                for v in 0..2 {
                    let mut c = [0usize; 3];
                    c[axis] = side;
                    let (a, b) = other_axes(axis);
                    c[a] = u;
                    c[b] = v;
                    quad[u * 2 + v] = corner(c);
                }
            }
            indices.push([quad[0], quad[1], quad[2]]);
            indices.push([quad[2], quad[1], quad[3]]);
        }
    }

    Shape {
        vertices,
        indices,
        vertex_colors: None,
    }
}

/// Axis-aligned cube with one color per face.
///
/// Per-face coloring needs 4 dedicated vertices per face (24 total, none
/// shared), otherwise colors would bleed across edges under interpolation;
/// this generator and [`cube`] are therefore mutually exclusive per
/// coloring mode. Face order is axis-major (x, y, z), negative side first,
/// matching `face_colors`.
pub fn cube_with_face_colors(width: f32, face_colors: [Rgba; 6]) -> Shape {
    let h = width / 2.0;
    let signs = [-h, h];

    let mut vertices = Vec::with_capacity(24);
    let mut vertex_colors = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(12);

    let mut face = 0;
    for axis in 0..3 {
        for &s in &signs {
            let k = vertices.len() as u16;
            for &u in &signs {
                for &v in &signs {
                    vertices.push(match axis {
                        0 => Vec3::new(s, u, v),
                        1 => Vec3::new(u, s, v),
                        _ => Vec3::new(u, v, s),
                    });
                    vertex_colors.push(face_colors[face]);
                }
            }
            indices.push([k, k + 1, k + 2]);
            indices.push([k + 2, k + 1, k + 3]);
            face += 1;
        }
    }

    Shape {
        vertices,
        indices,
        vertex_colors: Some(vertex_colors),
    }
}

fn other_axes(axis: usize) -> (usize, usize) {
    match axis {
        0 => (1, 2),
        1 => (0, 2),
        _ => (0, 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_has_eight_unique_corners_and_twelve_triangles() {
        let shape = cube(2.0);
        assert_eq!(shape.vertices.len(), 8);
        assert_eq!(shape.triangle_count(), 12);

        for v in &shape.vertices {
            assert_eq!(v.x.abs(), 1.0);
            assert_eq!(v.y.abs(), 1.0);
            assert_eq!(v.z.abs(), 1.0);
        }

        // All 8 corners are distinct.
        for (i, a) in shape.vertices.iter().enumerate() {
            for b in &shape.vertices[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn cube_indices_cover_every_corner() {
        let shape = cube(1.0);
        let mut used = [false; 8];
        for triangle in &shape.indices {
            for &i in triangle {
                assert!(usize::from(i) < 8);
                used[usize::from(i)] = true;
            }
        }
        assert!(used.iter().all(|&u| u));
    }

    #[test]
    fn face_colored_cube_keeps_faces_separate() {
        let colors: [Rgba; 6] = [
            [1.0, 0.0, 0.0, 1.0],
            [0.0, 1.0, 0.0, 1.0],
            [0.0, 0.0, 1.0, 1.0],
            [1.0, 1.0, 0.0, 1.0],
            [0.0, 1.0, 1.0, 1.0],
            [1.0, 0.0, 1.0, 1.0],
        ];
        let shape = cube_with_face_colors(1.0, colors);

        assert_eq!(shape.vertices.len(), 24);
        assert_eq!(shape.triangle_count(), 12);

        let vertex_colors = shape.vertex_colors.as_ref().unwrap();
        assert_eq!(vertex_colors.len(), 24);

        // Each face owns a run of 4 vertices with its own color, and its two
        // triangles never index outside that run.
        for face in 0..6 {
            let base = face * 4;
            for i in 0..4 {
                assert_eq!(vertex_colors[base + i], colors[face]);
            }
            for triangle in &shape.indices[face * 2..face * 2 + 2] {
                for &index in triangle {
                    let index = usize::from(index);
                    assert!(index >= base && index < base + 4);
                }
            }
        }
    }

    #[test]
    fn generators_agree_on_extent() {
        let a = cube(0.5);
        let b = cube_with_face_colors(0.5, [[1.0, 1.0, 1.0, 1.0]; 6]);
        for v in a.vertices.iter().chain(&b.vertices) {
            assert_eq!(v.x.abs(), 0.25);
            assert_eq!(v.y.abs(), 0.25);
            assert_eq!(v.z.abs(), 0.25);
        }
    }
}
