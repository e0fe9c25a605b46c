//! Terrain mesh synthesis.
//!
//! Turns a [`Heightfield`] into a triangulated surface: one vertex per
//! grid node with position, normal and UV, plus a triangle index buffer
//! covering every grid cell with two triangles.

use cgmath::{InnerSpace, Vector3};

use crate::error::{Result, TerrainError};
use crate::terrain::heightfield::Heightfield;

/// Geometry for a regular-grid terrain surface. All four attribute
/// streams share one index space: vertex k owns positions[k],
/// normals[k] and uvs[k].
#[derive(Debug, Clone)]
pub struct TerrainMesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl TerrainMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// 1D vertex index for grid node (i, j). Vertices are flattened with the
/// x index outermost, matching the position loop below.
#[inline]
fn vertex_index(i: usize, j: usize, rows: usize) -> u32 {
    (i * rows + j) as u32
}

/// Build the terrain mesh for a heightfield.
///
/// Needs at least one full grid cell (2x2 nodes) to triangulate; smaller
/// grids fail validation. Produces `rows*cols` vertices and
/// `6*(rows-1)*(cols-1)` indices.
pub fn build_terrain_mesh(heightfield: &Heightfield) -> Result<TerrainMesh> {
    let rows = heightfield.rows;
    let cols = heightfield.cols;

    if rows < 2 || cols < 2 {
        return Err(TerrainError::Validation(format!(
            "grid needs at least 2x2 nodes to triangulate, got {}x{}",
            cols, rows
        )));
    }

    let coords = heightfield.coords();
    let vertex_count = rows * cols;

    // ----- Positions: flatten [i][j] with the x index outermost -----
    let mut positions: Vec<[f32; 3]> = Vec::with_capacity(vertex_count);
    for column in &coords {
        for &point in column {
            positions.push(point);
        }
    }

    // ----- Normals: central-difference gradient on interior nodes -----
    // Boundary nodes have no neighbor outside the grid, so they get a
    // fixed up normal. This leaves a one-node-wide shading seam along
    // every edge, a known and accepted artifact.
    let mut normals: Vec<[f32; 3]> = Vec::with_capacity(vertex_count);
    for i in 0..cols {
        for j in 0..rows {
            if i == 0 || i == cols - 1 || j == 0 || j == rows - 1 {
                normals.push([0.0, 0.0, 1.0]);
                continue;
            }

            let dx = Vector3::from(coords[i + 1][j]) - Vector3::from(coords[i - 1][j]);
            let dy = Vector3::from(coords[i][j + 1]) - Vector3::from(coords[i][j - 1]);
            let n = dx.cross(dy);

            // Positive spacing guarantees a nonzero cross product, but a
            // unit fallback keeps the invariant if that ever changes.
            if n.magnitude2() > 1e-12 {
                let n = n.normalize();
                normals.push([n.x, n.y, n.z]);
            } else {
                normals.push([0.0, 0.0, 1.0]);
            }
        }
    }

    // ----- UVs: normalize against the grid's physical extent -----
    // The texture stretches linearly across the whole terrain (no
    // tiling), with corner nodes at exactly (0,0) .. (1,1).
    let extent_x = (cols - 1) as f32 * heightfield.spacing_col;
    let extent_y = (rows - 1) as f32 * heightfield.spacing_row;
    let min = coords[0][0];

    let mut uvs: Vec<[f32; 2]> = Vec::with_capacity(vertex_count);
    for column in &coords {
        for point in column {
            uvs.push([(point[0] - min[0]) / extent_x, (point[1] - min[1]) / extent_y]);
        }
    }

    // ----- Indices: two triangles per grid cell -----
    let mut indices: Vec<u32> = Vec::with_capacity(6 * (cols - 1) * (rows - 1));
    for i in 0..cols - 1 {
        for j in 0..rows - 1 {
            indices.push(vertex_index(i, j, rows));
            indices.push(vertex_index(i + 1, j, rows));
            indices.push(vertex_index(i, j + 1, rows));

            indices.push(vertex_index(i + 1, j + 1, rows));
            indices.push(vertex_index(i, j + 1, rows));
            indices.push(vertex_index(i + 1, j, rows));
        }
    }

    Ok(TerrainMesh {
        positions,
        normals,
        uvs,
        indices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 3x3 grid, unit spacing, zero origin, single raised center node.
    fn bump_heightfield() -> Heightfield {
        Heightfield::new(
            1.0,
            1.0,
            0.0,
            2.0, // origin names the top row; the transform shifts it back to 0
            vec![
                vec![0.0, 0.0, 0.0],
                vec![0.0, 1.0, 0.0],
                vec![0.0, 0.0, 0.0],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_buffer_sizes() {
        let mesh = build_terrain_mesh(&bump_heightfield()).unwrap();

        assert_eq!(mesh.positions.len(), 9);
        assert_eq!(mesh.normals.len(), 9);
        assert_eq!(mesh.uvs.len(), 9);
        assert_eq!(mesh.indices.len(), 24);
        assert_eq!(mesh.triangle_count(), 8);
    }

    #[test]
    fn test_degenerate_grids_rejected() {
        let single_col = Heightfield::new(1.0, 1.0, 0.0, 0.0, vec![vec![0.0, 0.0]]).unwrap();
        assert!(matches!(
            build_terrain_mesh(&single_col),
            Err(TerrainError::Validation(_))
        ));

        let single_row =
            Heightfield::new(1.0, 1.0, 0.0, 0.0, vec![vec![0.0], vec![0.0]]).unwrap();
        assert!(matches!(
            build_terrain_mesh(&single_row),
            Err(TerrainError::Validation(_))
        ));
    }

    #[test]
    fn test_all_normals_unit_length() {
        let mesh = build_terrain_mesh(&bump_heightfield()).unwrap();

        for n in &mesh.normals {
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            assert!((len - 1.0).abs() < 1e-5, "normal {:?} not unit length", n);
        }
    }

    #[test]
    fn test_boundary_normals_point_up() {
        let mesh = build_terrain_mesh(&bump_heightfield()).unwrap();

        // All nodes of a 3x3 grid except the center are boundary nodes.
        for (k, n) in mesh.normals.iter().enumerate() {
            if k == 4 {
                continue;
            }
            assert_eq!(*n, [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn test_center_normal_of_bump() {
        let mesh = build_terrain_mesh(&bump_heightfield()).unwrap();

        // cross((2,0,0)-(0,0,0), (0,2,0)-(0,0,0)) through the raised
        // center: both difference vectors are flat (the +-1 neighbors of
        // the center all sit at 0), so the center normal is straight up.
        // Raise a corner instead to get a tilted center normal.
        let n = mesh.normals[4];
        assert_eq!(n, [0.0, 0.0, 1.0]);

        let tilted = Heightfield::new(
            1.0,
            1.0,
            0.0,
            2.0,
            vec![
                vec![0.0, 0.0, 0.0],
                vec![0.0, 0.0, 1.0],
                vec![0.0, 0.0, 0.0],
            ],
        )
        .unwrap();
        let mesh = build_terrain_mesh(&tilted).unwrap();
        let n = mesh.normals[4];

        // Mostly up, tilted away from the raised node in y.
        assert!(n[2] > 0.5);
        assert!(n[1] < 0.0);
        assert!((n[0]).abs() < 1e-6);
    }

    #[test]
    fn test_corner_uvs_exact_with_offset_origin() {
        let hf = Heightfield::new(
            0.5,
            0.25,
            100.0,
            -3.0, // origin deliberately not a multiple of either spacing
            vec![
                vec![0.0, 0.0, 0.0],
                vec![0.0, 0.0, 0.0],
                vec![0.0, 0.0, 0.0],
            ],
        )
        .unwrap();
        let mesh = build_terrain_mesh(&hf).unwrap();

        // Flattening order: (0,0), (0,1), (0,2), (1,0) ...
        assert_eq!(mesh.uvs[0], [0.0, 0.0]);
        assert_eq!(mesh.uvs[2], [0.0, 1.0]);
        assert_eq!(mesh.uvs[6], [1.0, 0.0]);
        assert_eq!(mesh.uvs[8], [1.0, 1.0]);
    }

    #[test]
    fn test_bounding_box_matches_extent() {
        let hf = Heightfield::new(
            0.5,
            2.0,
            7.0,
            11.0,
            vec![
                vec![0.0, 0.0, 0.0, 0.0],
                vec![0.0, 0.0, 0.0, 0.0],
                vec![0.0, 0.0, 0.0, 0.0],
            ],
        )
        .unwrap();
        let mesh = build_terrain_mesh(&hf).unwrap();

        let mut min = [f32::MAX; 2];
        let mut max = [f32::MIN; 2];
        for p in &mesh.positions {
            for c in 0..2 {
                min[c] = min[c].min(p[c]);
                max[c] = max[c].max(p[c]);
            }
        }

        // (cols-1)*spacing_col x (rows-1)*spacing_row
        assert!((max[0] - min[0] - 2.0 * 2.0).abs() < 1e-5);
        assert!((max[1] - min[1] - 3.0 * 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_index_buffer_triangle_pattern() {
        let mesh = build_terrain_mesh(&bump_heightfield()).unwrap();

        // First cell (i=0, j=0) with idx(x,y) = x*rows + y, rows = 3.
        assert_eq!(&mesh.indices[0..6], &[0, 3, 1, 4, 1, 3]);

        // Every index must reference a valid vertex.
        let count = mesh.vertex_count() as u32;
        assert!(mesh.indices.iter().all(|&k| k < count));
    }
}
