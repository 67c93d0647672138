use glam::Vec2;

use crate::emitter::MeshEmitter;
use crate::error::TerrainError;
use crate::graph::{TerrainData, TriangleId, Vertex};
use crate::height::{HeightNoise, add_fall_off, normalize_heights};
use crate::mesh::MeshBuffers;
use crate::points::generate_points;
use crate::rng::{Stream, stage_rng};
use crate::settings::{Biome, TerrainSettings};
use crate::triangulation::{DelaunayTriangulator, Triangulator, build_terrain_graph};

/// Outcome of the leveling relaxation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelingReport {
    /// Passes that were run, including the final one that found nothing to fix
    pub passes: usize,
    /// Number of vertex adjustments over all passes
    pub adjustments: usize,
}

/// Runs the terrain pipeline for one set of settings
pub struct TerrainGenerator<T: Triangulator = DelaunayTriangulator> {
    settings: TerrainSettings,
    triangulator: T,
}

impl TerrainGenerator<DelaunayTriangulator> {
    /// Create a generator using Delaunay triangulation
    pub fn new(settings: TerrainSettings) -> Result<Self, TerrainError> {
        Self::with_triangulator(settings, DelaunayTriangulator)
    }
}

impl<T: Triangulator> TerrainGenerator<T> {
    /// Create a generator with a custom triangulation backend
    ///
    /// Settings are validated here so that generation itself never sees a
    /// configuration mistake.
    pub fn with_triangulator(settings: TerrainSettings, triangulator: T) -> Result<Self, TerrainError> {
        settings.validate()?;
        Ok(TerrainGenerator {
            settings,
            triangulator,
        })
    }

    pub fn settings(&self) -> &TerrainSettings {
        &self.settings
    }

    /// Build the leveled terrain graph
    ///
    /// Samples points, triangulates them, assigns noise and biomes to every
    /// vertex and levels triangles that span more than one terrace. Problems
    /// that do not stop the run end up in `TerrainData::diagnostics`.
    pub fn generate_terrain_data(&self) -> Result<TerrainData, TerrainError> {
        let settings = &self.settings;

        let mut rng = stage_rng(settings.seed, Stream::Points);
        let points = generate_points(
            settings.point_radius,
            settings.sample_region,
            settings.extension_step_count,
            &mut rng,
        );
        log::info!("Generated {} points", points.len());

        let mut terrain = build_terrain_graph(&points, &self.triangulator)?;

        let noise_points: Vec<Vec2> = terrain.vertices().iter().map(Vertex::xz).collect();
        let noise = HeightNoise::new(&settings.noise, settings.seed);
        let (mut heights, bounds) = noise.heights(&noise_points);
        normalize_heights(&mut heights, &bounds);
        add_fall_off(&noise_points, &mut heights, settings.sample_region, settings.fall_off_region);
        log::debug!("Raw height range {} to {}", bounds.min, bounds.max);

        assign_biomes(&mut terrain, &heights, &settings.biomes, settings.terrace_height);

        let report = level_triangles(&mut terrain, &settings.biomes, settings.terrace_height);
        log::info!(
            "Leveling made {} adjustments in {} passes",
            report.adjustments,
            report.passes
        );

        let unresolved = find_unresolved_triangles(&terrain);
        if !unresolved.is_empty() {
            log::warn!(
                "{} triangles still span several terraces after leveling",
                unresolved.len()
            );
        }
        terrain.diagnostics.unresolved_triangles = unresolved;

        Ok(terrain)
    }

    /// Emit the renderable mesh for a generated terrain
    ///
    /// Marks wall ownership on the terrain's triangles, emits the geometry
    /// and applies the detail jitter when `detail_offset` is positive.
    pub fn generate_mesh(&self, terrain: &mut TerrainData) -> MeshBuffers {
        let mut mesh = MeshEmitter::new(&self.settings.biomes).emit(terrain);
        if self.settings.detail_offset > 0.0 {
            let mut rng = stage_rng(self.settings.seed, Stream::Detail);
            mesh.apply_detail(self.settings.detail_offset, &mut rng);
        }
        mesh
    }

    /// Generate the terrain graph and its mesh in one go
    pub fn generate(&self) -> Result<(TerrainData, MeshBuffers), TerrainError> {
        let mut terrain = self.generate_terrain_data()?;
        let mesh = self.generate_mesh(&mut terrain);
        Ok((terrain, mesh))
    }
}

/// Index of the first biome whose threshold covers `noise`
pub fn biome_index(noise: f32, biomes: &[Biome]) -> Option<usize> {
    biomes.iter().position(|biome| noise <= biome.height)
}

/// Store noise per vertex and snap each vertex to its biome's terrace
///
/// Vertices whose noise is above every threshold keep `biome = None` at
/// height zero and are listed in the diagnostics.
///
/// # Arguments
/// * `terrain` - Graph to update, vertices in the same order as `noise`
/// * `noise` - Normalized noise per vertex
/// * `biomes` - Biomes in ascending threshold order
/// * `terrace_height` - Vertical distance between terraces
pub fn assign_biomes(terrain: &mut TerrainData, noise: &[f32], biomes: &[Biome], terrace_height: f32) {
    terrain.diagnostics.unassigned_vertices.clear();

    let ids: Vec<_> = terrain.vertex_ids().collect();
    for (id, &value) in ids.into_iter().zip(noise) {
        let biome = biome_index(value, biomes);
        let vertex = terrain.vertex_mut(id);
        vertex.noise = value;
        vertex.biome = biome;
        vertex.position.y = biome.map_or(0.0, |b| b as f32 * terrace_height);

        if biome.is_none() {
            terrain.diagnostics.unassigned_vertices.push(id);
        }
    }

    let unassigned = terrain.diagnostics.unassigned_vertices.len();
    if unassigned > 0 {
        log::warn!(
            "{} vertices are above the top biome threshold and have no biome",
            unassigned
        );
    }
}

/// Pull down vertices of triangles that span two or more terraces
///
/// Runs at most `biomes.len() - 2` passes. In each pass, every triangle whose
/// corner biomes differ by two or more has its non-minimum corners moved to
/// the terrace just above the minimum; their noise becomes the average of
/// their neighbours clamped into the new band. Stops early after a pass
/// with nothing to fix. Triangles with unassigned corners are left alone.
///
/// # Arguments
/// * `terrain` - Graph to level in place
/// * `biomes` - Biomes in ascending threshold order
/// * `terrace_height` - Vertical distance between terraces
///
/// # Returns
/// * `LevelingReport` - Passes run and vertices adjusted
pub fn level_triangles(terrain: &mut TerrainData, biomes: &[Biome], terrace_height: f32) -> LevelingReport {
    let mut report = LevelingReport::default();
    let max_passes = biomes.len().saturating_sub(2);
    let triangle_ids: Vec<TriangleId> = terrain.triangle_ids().collect();

    for pass in 0..max_passes {
        let mut valid = true;

        for &id in &triangle_ids {
            let Some(corner_biomes) = terrain.triangle_biomes(id) else {
                continue;
            };
            let min = corner_biomes.iter().copied().min().unwrap_or(0);
            let max = corner_biomes.iter().copied().max().unwrap_or(0);
            if max - min < 2 {
                continue;
            }

            let target = min + 1;
            let (lower, upper) = (biomes[target - 1].height, biomes[target].height);
            for vertex_id in terrain.triangle(id).vertices {
                if terrain.vertex(vertex_id).biome == Some(min) {
                    continue;
                }
                let average = terrain.average_neighbour_noise(vertex_id);
                let vertex = terrain.vertex_mut(vertex_id);
                vertex.biome = Some(target);
                vertex.position.y = target as f32 * terrace_height;
                vertex.noise = average.clamp(lower, upper);
                report.adjustments += 1;
            }
            valid = false;
        }

        report.passes += 1;
        log::debug!("Leveling pass {} done, terrain valid: {}", pass, valid);
        if valid {
            break;
        }
    }

    report
}

/// Triangles that the mesh emitter will not be able to render
pub fn find_unresolved_triangles(terrain: &TerrainData) -> Vec<TriangleId> {
    terrain
        .triangle_ids()
        .filter(|&id| match terrain.triangle_biomes(id) {
            Some(b) => b.iter().max().unwrap_or(&0) - b.iter().min().unwrap_or(&0) >= 2,
            None => true,
        })
        .collect()
}
