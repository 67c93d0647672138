//! Converts the leveled terrain graph into terraced, colored geometry.
//!
//! Each triangle is classified by the biomes of its corners. Flat triangles
//! are emitted as they are. A triangle with one corner a terrace above the
//! other two is flattened onto the lower terrace. A triangle with one corner
//! a terrace below gets flattened onto that corner's terrace and, unless a
//! sibling across the same edge already covers it, a vertical wall quad
//! rising to the upper terrace.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use glam::Vec3;

use crate::gradient::Color;
use crate::graph::{TerrainData, TriangleId, VertexId};
use crate::height::inverse_lerp;
use crate::mesh::MeshBuffers;
use crate::settings::Biome;

/// How a triangle's corner biomes relate to each other
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriangleShape {
    /// All corners on one terrace
    Flat,
    /// Corner `vertex` is one terrace above the other two
    SingleUp { vertex: usize },
    /// Corner `vertex` is one terrace below the other two
    SingleDown { vertex: usize },
    /// Spans two or more terraces, cannot be emitted
    Invalid,
}

/// Classify a triangle from its corner biomes
pub fn classify(biomes: [usize; 3]) -> TriangleShape {
    let min = biomes[0].min(biomes[1]).min(biomes[2]);
    let max = biomes[0].max(biomes[1]).max(biomes[2]);

    if min == max {
        return TriangleShape::Flat;
    }
    if max - min >= 2 {
        return TriangleShape::Invalid;
    }

    for vertex in 0..3 {
        let pair = biomes[(vertex + 1) % 3];
        if pair != biomes[(vertex + 2) % 3] {
            continue;
        }
        if biomes[vertex] > pair {
            return TriangleShape::SingleUp { vertex };
        }
        return TriangleShape::SingleDown { vertex };
    }

    TriangleShape::Invalid
}

/// Look up the color for a noise value
///
/// The first biome whose threshold covers `noise` wins. Walls take its flat
/// edge color, other faces sample its gradient at the noise position inside
/// the band. Noise above every threshold is magenta.
pub fn biome_color(noise: f32, biomes: &[Biome], edge: bool) -> Color {
    for (i, biome) in biomes.iter().enumerate() {
        if noise <= biome.height {
            if edge {
                return biome.edge;
            }
            let lower = if i == 0 { 0.0 } else { biomes[i - 1].height };
            return biome.gradient.evaluate(inverse_lerp(lower, biome.height, noise));
        }
    }
    Color::MAGENTA
}

/// Order-independent key of the edge between two vertices
fn edge_key(a: VertexId, b: VertexId) -> (VertexId, VertexId) {
    if a < b { (a, b) } else { (b, a) }
}

/// Decide which down-stepping triangles own a wall
///
/// All flags are reset first. When two down-stepping triangles share their
/// upper edge, both walls would coincide, so both flags are cleared. A third
/// claim on the same edge means the triangulation is not manifold there; it
/// is reported and that triangle gets no wall either.
pub fn mark_wall_triangles(terrain: &mut TerrainData) {
    let mut claims: HashMap<(VertexId, VertexId), TriangleId> = HashMap::new();
    let triangle_ids: Vec<TriangleId> = terrain.triangle_ids().collect();

    for &id in &triangle_ids {
        terrain.triangle_mut(id).wall_valid = true;
    }
    terrain.diagnostics.duplicate_wall_claims.clear();

    for id in triangle_ids {
        let Some(biomes) = terrain.triangle_biomes(id) else {
            continue;
        };
        let TriangleShape::SingleDown { vertex } = classify(biomes) else {
            continue;
        };

        let corners = terrain.triangle(id).vertices;
        let key = edge_key(corners[(vertex + 1) % 3], corners[(vertex + 2) % 3]);

        match claims.entry(key) {
            Entry::Vacant(entry) => {
                entry.insert(id);
            }
            Entry::Occupied(entry) => {
                let first = *entry.get();
                if terrain.triangle(first).wall_valid {
                    terrain.triangle_mut(first).wall_valid = false;
                    terrain.triangle_mut(id).wall_valid = false;
                } else {
                    log::error!(
                        "Triangle {:?} claims wall edge {:?} that is already shared",
                        id,
                        key
                    );
                    terrain.triangle_mut(id).wall_valid = false;
                    terrain.diagnostics.duplicate_wall_claims.push(id);
                }
            }
        }
    }
}

/// Emits mesh geometry for a terrain using a biome palette
pub struct MeshEmitter<'a> {
    biomes: &'a [Biome],
}

impl<'a> MeshEmitter<'a> {
    pub fn new(biomes: &'a [Biome]) -> Self {
        MeshEmitter { biomes }
    }

    /// Mark wall ownership and emit every triangle of the terrain
    ///
    /// Triangles that cannot be classified are skipped and recorded in the
    /// terrain diagnostics; the rest of the mesh is still produced.
    pub fn emit(&self, terrain: &mut TerrainData) -> MeshBuffers {
        mark_wall_triangles(terrain);
        terrain.diagnostics.skipped_triangles.clear();

        let mut mesh = MeshBuffers::new();
        for id in terrain.triangle_ids() {
            if !self.emit_triangle(terrain, id, &mut mesh) {
                terrain.diagnostics.skipped_triangles.push(id);
            }
        }

        let skipped = terrain.diagnostics.skipped_triangles.len();
        if skipped > 0 {
            log::warn!("Skipped {} triangles, the mesh has holes", skipped);
        }
        log::info!(
            "Emitted {} triangles from {} terrain triangles",
            mesh.triangle_count(),
            terrain.triangles().len()
        );
        mesh
    }

    /// Emit one triangle, returning false if it had to be skipped
    fn emit_triangle(&self, terrain: &TerrainData, id: TriangleId, mesh: &mut MeshBuffers) -> bool {
        let Some(biomes) = terrain.triangle_biomes(id) else {
            log::error!("Triangle {:?} has an unassigned corner, resulting in a hole", id);
            return false;
        };

        let triangle = terrain.triangle(id);
        let positions = terrain.triangle_positions(id);
        let noise = triangle.vertices.map(|v| terrain.vertex(v).noise);

        match classify(biomes) {
            TriangleShape::Flat => {
                let average = (noise[0] + noise[1] + noise[2]) / 3.0;
                let [v0, v1, v2] = positions;
                mesh.add_triangle(v0, v1, v2, self.color(average, false));
            }
            TriangleShape::SingleUp { vertex } => {
                let pair = (vertex + 1) % 3;
                let mut corners = positions;
                corners[vertex].y = positions[pair].y;

                let [v0, v1, v2] = corners;
                mesh.add_triangle(v0, v1, v2, self.color(noise[pair], false));
            }
            TriangleShape::SingleDown { vertex } => {
                let (j, k) = ((vertex + 1) % 3, (vertex + 2) % 3);
                let low = positions[vertex].y;
                let drop = |v: Vec3| Vec3::new(v.x, low, v.z);

                if triangle.wall_valid {
                    let edge = self.color(noise[j], true);
                    let (pj, pk) = (positions[j], positions[k]);
                    mesh.add_triangle(drop(pj), pj, pk, edge);
                    mesh.add_triangle(pk, drop(pk), drop(pj), edge);
                }

                let mut corners = positions;
                corners[j] = drop(positions[j]);
                corners[k] = drop(positions[k]);
                let [v0, v1, v2] = corners;
                mesh.add_triangle(v0, v1, v2, self.color(noise[vertex], false));
            }
            TriangleShape::Invalid => {
                log::error!(
                    "Triangle {:?} spans biomes {:?}, resulting in a hole",
                    id,
                    biomes
                );
                return false;
            }
        }

        true
    }

    fn color(&self, noise: f32, edge: bool) -> Color {
        biome_color(noise, self.biomes, edge)
    }
}
