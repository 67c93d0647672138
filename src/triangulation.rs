//! Turns a point cloud into the terrain's vertex/triangle graph.

use std::collections::HashMap;

use delaunator::Point;
use glam::{DVec2, Vec2};

use crate::error::TerrainError;
use crate::graph::{TerrainData, VertexId};

/// Anything that can produce a planar triangulation of a point set
pub trait Triangulator {
    /// Triangulate `points`, returning index triples into the input slice
    ///
    /// Implementations may add helper points of their own; triples that
    /// reference an index past the end of `points` are ignored by the caller.
    fn triangulate(&self, points: &[DVec2]) -> Vec<[usize; 3]>;
}

/// Delaunay triangulation backed by the `delaunator` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct DelaunayTriangulator;

impl Triangulator for DelaunayTriangulator {
    fn triangulate(&self, points: &[DVec2]) -> Vec<[usize; 3]> {
        let input: Vec<Point> = points.iter().map(|p| Point { x: p.x, y: p.y }).collect();
        let triangulation = delaunator::triangulate(&input);
        triangulation
            .triangles
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]])
            .collect()
    }
}

/// Triangulate `points` and build the neighbor graph from the result
///
/// Every input point used by a triangle becomes exactly one vertex, in order
/// of first appearance. Triangles are stored clockwise in the XZ plane so
/// that emitted faces point up.
///
/// # Arguments
/// * `points` - Ground-plane positions, `y` of each point becomes world `z`
/// * `triangulator` - Triangulation backend
///
/// # Returns
/// * `Result<TerrainData, TerrainError>` - Graph with all vertices at height 0
pub fn build_terrain_graph<T: Triangulator + ?Sized>(
    points: &[Vec2],
    triangulator: &T,
) -> Result<TerrainData, TerrainError> {
    let input: Vec<DVec2> = points.iter().map(|p| p.as_dvec2()).collect();
    let triples = if points.len() < 3 {
        Vec::new()
    } else {
        triangulator.triangulate(&input)
    };

    let mut terrain = TerrainData::new();
    let mut vertex_map: HashMap<usize, VertexId> = HashMap::new();
    let mut discarded = 0usize;

    for triple in triples {
        // Drop triangles that touch points the triangulator made up
        if triple.iter().any(|&index| index >= points.len()) {
            discarded += 1;
            continue;
        }

        let ids = triple.map(|index| {
            *vertex_map
                .entry(index)
                .or_insert_with(|| terrain.add_vertex(points[index].x, points[index].y))
        });

        let [a, b, c] = triple.map(|index| points[index]);
        if signed_area(a, b, c) > 0.0 {
            terrain.add_triangle([ids[0], ids[2], ids[1]]);
        } else {
            terrain.add_triangle(ids);
        }
    }

    if discarded > 0 {
        log::debug!("Discarded {} triangles referencing synthesized points", discarded);
    }

    if terrain.triangles().is_empty() {
        return Err(TerrainError::EmptyTriangulation {
            points: points.len(),
        });
    }

    log::info!(
        "Triangulated {} points into {} vertices and {} triangles",
        points.len(),
        terrain.vertices().len(),
        terrain.triangles().len()
    );
    Ok(terrain)
}

/// Twice the signed area of a 2D triangle, positive when counter-clockwise
pub fn signed_area(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b - a).perp_dot(c - a)
}
