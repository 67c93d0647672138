//! Vertex/triangle topology of the terrain surface.
//!
//! All vertices live in one arena owned by [`TerrainData`] and are referred
//! to by [`VertexId`] handles. Adjacency lists and visited sets key on the
//! handle, never on coordinates.

use std::collections::{HashSet, VecDeque};

use glam::{Vec2, Vec3};

/// Handle of a vertex inside a [`TerrainData`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VertexId(pub usize);

/// Handle of a triangle inside a [`TerrainData`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TriangleId(pub usize);

/// A terrain sample point and its place in the neighbor graph
#[derive(Debug, Clone)]
pub struct Vertex {
    pub position: Vec3,
    /// Normalized height noise in 0.0-1.0
    pub noise: f32,
    /// Index into the biome list, `None` while no biome covers the noise
    pub biome: Option<usize>,
    neighbours: Vec<VertexId>,
}

impl Vertex {
    fn new(position: Vec3) -> Self {
        Vertex {
            position,
            noise: 0.0,
            biome: None,
            neighbours: Vec::new(),
        }
    }

    pub fn neighbours(&self) -> &[VertexId] {
        &self.neighbours
    }

    /// Position projected onto the ground plane
    pub fn xz(&self) -> Vec2 {
        Vec2::new(self.position.x, self.position.z)
    }
}

/// Three vertices in clockwise XZ order, so the face points up
#[derive(Debug, Clone)]
pub struct Triangle {
    pub vertices: [VertexId; 3],
    /// Cleared when a sibling triangle already owns the wall on the shared step edge
    pub wall_valid: bool,
}

/// Problems found during a generation run that did not stop it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// Vertices whose noise exceeds every biome threshold
    pub unassigned_vertices: Vec<VertexId>,
    /// Triangles still spanning two or more terraces after leveling
    pub unresolved_triangles: Vec<TriangleId>,
    /// Triangles the mesh emitter could not classify and left out
    pub skipped_triangles: Vec<TriangleId>,
    /// Triangles making a third claim on an already shared wall edge
    pub duplicate_wall_claims: Vec<TriangleId>,
}

impl Diagnostics {
    pub fn is_clean(&self) -> bool {
        self.unassigned_vertices.is_empty()
            && self.unresolved_triangles.is_empty()
            && self.skipped_triangles.is_empty()
            && self.duplicate_wall_claims.is_empty()
    }
}

/// The vertex graph and triangles of one generation run
#[derive(Debug, Clone, Default)]
pub struct TerrainData {
    vertices: Vec<Vertex>,
    triangles: Vec<Triangle>,
    pub diagnostics: Diagnostics,
}

impl TerrainData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an unconnected vertex on the ground plane
    pub fn add_vertex(&mut self, x: f32, z: f32) -> VertexId {
        let id = VertexId(self.vertices.len());
        self.vertices.push(Vertex::new(Vec3::new(x, 0.0, z)));
        id
    }

    /// Add a triangle and link its three vertices as mutual neighbors
    pub fn add_triangle(&mut self, vertices: [VertexId; 3]) -> TriangleId {
        for i in 0..3 {
            for j in 1..3 {
                self.connect(vertices[i], vertices[(i + j) % 3]);
            }
        }

        let id = TriangleId(self.triangles.len());
        self.triangles.push(Triangle {
            vertices,
            wall_valid: true,
        });
        id
    }

    fn connect(&mut self, from: VertexId, to: VertexId) {
        let neighbours = &mut self.vertices[from.0].neighbours;
        if from != to && !neighbours.contains(&to) {
            neighbours.push(to);
        }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.0]
    }

    pub fn vertex_mut(&mut self, id: VertexId) -> &mut Vertex {
        &mut self.vertices[id.0]
    }

    pub fn triangle(&self, id: TriangleId) -> &Triangle {
        &self.triangles[id.0]
    }

    pub fn triangle_mut(&mut self, id: TriangleId) -> &mut Triangle {
        &mut self.triangles[id.0]
    }

    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + use<> {
        (0..self.vertices.len()).map(VertexId)
    }

    pub fn triangle_ids(&self) -> impl Iterator<Item = TriangleId> + use<> {
        (0..self.triangles.len()).map(TriangleId)
    }

    /// Corner positions of a triangle in winding order
    pub fn triangle_positions(&self, id: TriangleId) -> [Vec3; 3] {
        self.triangles[id.0].vertices.map(|v| self.vertices[v.0].position)
    }

    /// Corner biomes of a triangle, `None` if any corner is unassigned
    pub fn triangle_biomes(&self, id: TriangleId) -> Option<[usize; 3]> {
        let [a, b, c] = self.triangles[id.0].vertices;
        Some([
            self.vertices[a.0].biome?,
            self.vertices[b.0].biome?,
            self.vertices[c.0].biome?,
        ])
    }

    /// Mean noise of a vertex's neighbors, or its own noise if it has none
    pub fn average_neighbour_noise(&self, id: VertexId) -> f32 {
        let vertex = &self.vertices[id.0];
        if vertex.neighbours.is_empty() {
            return vertex.noise;
        }
        let total: f32 = vertex
            .neighbours
            .iter()
            .map(|n| self.vertices[n.0].noise)
            .sum();
        total / vertex.neighbours.len() as f32
    }

    /// True when every neighbor shares the vertex's biome, i.e. it is not on a step
    pub fn is_on_surface(&self, id: VertexId) -> bool {
        let vertex = &self.vertices[id.0];
        vertex
            .neighbours
            .iter()
            .all(|n| self.vertices[n.0].biome == vertex.biome)
    }

    /// Collect every vertex reachable from `origin` in at most `depth` edges
    ///
    /// Breadth-first over the neighbor lists. The origin itself is not part
    /// of the result and every vertex appears at most once.
    pub fn collect_neighbours(&self, origin: VertexId, depth: usize) -> Vec<VertexId> {
        let mut visited = HashSet::from([origin]);
        let mut collected = Vec::new();
        let mut frontier = VecDeque::from([(origin, 0)]);

        while let Some((id, level)) = frontier.pop_front() {
            if level == depth {
                continue;
            }
            for &neighbour in &self.vertices[id.0].neighbours {
                if visited.insert(neighbour) {
                    collected.push(neighbour);
                    frontier.push_back((neighbour, level + 1));
                }
            }
        }

        collected
    }
}
