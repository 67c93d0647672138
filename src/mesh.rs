//! Renderable triangle buffers produced from the terrain graph
//!
//! Triangles are appended as independent vertex triples. `simplify` can
//! later merge identical vertices into an indexed mesh for smooth shading,
//! or re-expand them for flat shading.

use std::collections::HashMap;

use glam::{Vec2, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::gradient::Color;

/// How `MeshBuffers::simplify` lays out the vertices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ShadingMode {
    /// Share identical vertices between faces so normals average across them
    Smooth,
    /// Give every face its own three vertices
    Flat,
}

/// Bit pattern of a position, used to find coincident vertices
type PositionKey = [u32; 3];

/// Bit patterns of position, UV and color of one vertex
type VertexKey = (PositionKey, [u32; 2], [u32; 4]);

fn position_key(position: Vec3) -> PositionKey {
    bytemuck::cast(position.to_array())
}

fn vertex_key(position: Vec3, uv: Vec2, color: Color) -> VertexKey {
    (position_key(position), bytemuck::cast(uv.to_array()), color.to_bits())
}

/// Parallel vertex attribute lists plus a triangle index list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuffers {
    pub positions: Vec<Vec3>,
    /// Texture coordinates, the XZ position of each vertex
    pub uvs: Vec<Vec2>,
    pub colors: Vec<Color>,
    /// Three indices per triangle
    pub indices: Vec<u32>,
}

impl MeshBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a single-colored triangle as three new vertices
    pub fn add_triangle(&mut self, v0: Vec3, v1: Vec3, v2: Vec3, color: Color) {
        let base = self.positions.len() as u32;
        for v in [v0, v1, v2] {
            self.positions.push(v);
            self.uvs.push(Vec2::new(v.x, v.z));
            self.colors.push(color);
        }
        self.indices.extend_from_slice(&[base, base + 1, base + 2]);
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Corner positions of triangle `index`
    pub fn triangle(&self, index: usize) -> [Vec3; 3] {
        let i = index * 3;
        [
            self.positions[self.indices[i] as usize],
            self.positions[self.indices[i + 1] as usize],
            self.positions[self.indices[i + 2] as usize],
        ]
    }

    /// Jitter vertex heights for a rougher surface
    ///
    /// Every distinct position gets one offset drawn from `-offset..offset`,
    /// and all vertices sharing that position move by the same amount so
    /// neighbouring faces stay connected.
    ///
    /// # Arguments
    /// * `offset` - Maximum vertical displacement, nothing happens unless positive
    /// * `rng` - Random source, offsets are drawn in vertex order
    pub fn apply_detail<R: Rng>(&mut self, offset: f32, rng: &mut R) {
        if !(offset > 0.0) {
            return;
        }

        let mut offsets: HashMap<PositionKey, f32> = HashMap::new();
        for position in self.positions.iter_mut() {
            let offset_y = *offsets
                .entry(position_key(*position))
                .or_insert_with(|| rng.gen_range(-offset..offset));
            position.y += offset_y;
        }

        log::debug!("Applied detail offsets to {} distinct positions", offsets.len());
    }

    /// Merge identical vertices, then lay them out for the given shading
    ///
    /// Vertices are identical when position, UV and color match bit for bit.
    /// `Smooth` keeps the merged, indexed vertices; `Flat` expands them back
    /// to exactly three vertices per triangle.
    pub fn simplify(&mut self, mode: ShadingMode) {
        let mut positions = Vec::new();
        let mut uvs = Vec::new();
        let mut colors = Vec::new();
        let mut indices = Vec::with_capacity(self.indices.len());

        let mut vertex_map: HashMap<VertexKey, u32> = HashMap::new();
        for &index in &self.indices {
            let i = index as usize;
            let (position, uv, color) = (self.positions[i], self.uvs[i], self.colors[i]);

            let merged = *vertex_map
                .entry(vertex_key(position, uv, color))
                .or_insert_with(|| {
                    positions.push(position);
                    uvs.push(uv);
                    colors.push(color);
                    (positions.len() - 1) as u32
                });
            indices.push(merged);
        }

        match mode {
            ShadingMode::Smooth => {
                self.positions = positions;
                self.uvs = uvs;
                self.colors = colors;
                self.indices = indices;
            }
            ShadingMode::Flat => {
                self.positions = indices.iter().map(|&i| positions[i as usize]).collect();
                self.uvs = indices.iter().map(|&i| uvs[i as usize]).collect();
                self.colors = indices.iter().map(|&i| colors[i as usize]).collect();
                self.indices = (0..indices.len() as u32).collect();
            }
        }
    }

    /// Per-vertex normals, averaged over adjacent faces weighted by area
    ///
    /// Vertices that belong only to degenerate faces point straight up.
    pub fn compute_normals(&self) -> Vec<Vec3> {
        let mut normals = vec![Vec3::ZERO; self.positions.len()];

        for triangle in self.indices.chunks_exact(3) {
            let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
            let face = (self.positions[b] - self.positions[a])
                .cross(self.positions[c] - self.positions[a]);
            normals[a] += face;
            normals[b] += face;
            normals[c] += face;
        }

        normals
            .into_iter()
            .map(|n| n.try_normalize().unwrap_or(Vec3::Y))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const GREEN: Color = Color::rgb(0.0, 1.0, 0.0);
    const GREY: Color = Color::rgb(0.5, 0.5, 0.5);

    /// Two triangles sharing the edge (1,0,0)-(0,0,1), clockwise in XZ
    fn quad(second_color: Color) -> MeshBuffers {
        let mut mesh = MeshBuffers::new();
        mesh.add_triangle(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 0.0),
            GREEN,
        );
        mesh.add_triangle(
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 1.0),
            second_color,
        );
        mesh
    }

    #[test]
    fn test_add_triangle_expands_vertices() {
        let mesh = quad(GREEN);
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(mesh.uvs[1], Vec2::new(0.0, 1.0));
        assert!(mesh.colors.iter().all(|&c| c == GREEN));
    }

    #[test]
    fn test_smooth_simplify_shares_vertices() {
        let mut mesh = quad(GREEN);
        mesh.simplify(ShadingMode::Smooth);

        assert_eq!(mesh.vertex_count(), 4);
        assert!(mesh.vertex_count() <= 3 * mesh.triangle_count());
        // Shared corners map to one index
        assert_eq!(mesh.indices[2], mesh.indices[3]);
        assert_eq!(mesh.indices[1], mesh.indices[4]);
    }

    #[test]
    fn test_smooth_simplify_keeps_color_seams() {
        let mut mesh = quad(GREY);
        mesh.simplify(ShadingMode::Smooth);
        assert_eq!(mesh.vertex_count(), 6);
    }

    #[test]
    fn test_flat_simplify_has_three_vertices_per_face() {
        let mut mesh = quad(GREEN);
        mesh.simplify(ShadingMode::Smooth);
        mesh.simplify(ShadingMode::Flat);

        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.vertex_count(), 3 * mesh.triangle_count());
        assert_eq!(mesh.triangle(1)[2], Vec3::new(1.0, 0.0, 1.0));
    }

    #[test]
    fn test_detail_moves_shared_positions_together() {
        let mut mesh = quad(GREEN);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        mesh.apply_detail(0.25, &mut rng);

        // Vertices 2 and 3 started at the same position
        assert_eq!(mesh.positions[2], mesh.positions[3]);
        assert_eq!(mesh.positions[1], mesh.positions[4]);
        for p in &mesh.positions {
            assert!(p.y.abs() <= 0.25);
        }
        // Four distinct positions, four offsets, not all equal
        assert!(mesh.positions.iter().any(|p| p.y != mesh.positions[0].y));
    }

    #[test]
    fn test_zero_detail_is_a_no_op() {
        let mut mesh = quad(GREEN);
        let before = mesh.clone();
        mesh.apply_detail(0.0, &mut ChaCha8Rng::seed_from_u64(1));
        assert_eq!(mesh, before);
    }

    #[test]
    fn test_normals_point_up_for_clockwise_faces() {
        let mut mesh = quad(GREEN);
        mesh.simplify(ShadingMode::Smooth);
        for normal in mesh.compute_normals() {
            assert!((normal - Vec3::Y).length() < 1e-6, "Normal {normal} is not up");
        }
    }
}
