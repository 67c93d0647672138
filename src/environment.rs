//! Vegetation and grass placement on a finished terrain.
//!
//! Reads the leveled vertex graph and decides where props go. Nothing here
//! changes the terrain itself.

use std::collections::HashSet;
use std::f32::consts::TAU;

use glam::{Vec2, Vec3};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::graph::{TerrainData, VertexId};
use crate::rng::{Stream, stage_rng};

/// Graph distance around a placed plant in which no other plant may spawn
const EXCLUSION_DEPTH: usize = 2;

/// One kind of prop and where it may grow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vegetation {
    pub name: String,
    /// Noise range (inclusive) the prop grows in
    pub height_band: Vec2,
    /// Probability of spawning on an eligible vertex
    pub spawn_chance: f32,
    /// Maximum planar distance from the vertex
    pub random_offset: f32,
}

impl Vegetation {
    pub fn new(name: &str, height_band: Vec2, spawn_chance: f32, random_offset: f32) -> Self {
        Vegetation {
            name: name.to_string(),
            height_band,
            spawn_chance,
            random_offset,
        }
    }

    fn grows_at(&self, noise: f32) -> bool {
        noise >= self.height_band.x && noise <= self.height_band.y
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentSettings {
    pub spawn_vegetation: bool,
    /// Noise range in which vegetation is considered at all
    pub vegetation_region: Vec2,
    pub vegetations: Vec<Vegetation>,
    pub spawn_grass: bool,
    pub grass_vegetations: Vec<Vegetation>,
}

impl Default for EnvironmentSettings {
    fn default() -> Self {
        EnvironmentSettings {
            spawn_vegetation: true,
            vegetation_region: Vec2::new(0.4, 0.9),
            vegetations: vec![
                Vegetation::new("Tree", Vec2::new(0.6, 0.75), 0.35, 0.3),
                Vegetation::new("Bush", Vec2::new(0.4, 0.75), 0.15, 0.4),
                Vegetation::new("Boulder", Vec2::new(0.75, 0.9), 0.1, 0.2),
            ],
            spawn_grass: true,
            grass_vegetations: vec![Vegetation::new("Grass", Vec2::new(0.4, 0.6), 0.25, 0.45)],
        }
    }
}

impl EnvironmentSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        for vegetation in self.vegetations.iter().chain(&self.grass_vegetations) {
            if !(0.0..=1.0).contains(&vegetation.spawn_chance) {
                return Err(SettingsError::InvalidSpawnChance {
                    name: vegetation.name.clone(),
                    chance: vegetation.spawn_chance,
                });
            }
        }
        Ok(())
    }
}

/// A prop instance ready to be placed in a scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub name: String,
    pub position: Vec3,
    /// Rotation around the vertical axis
    pub rotation_degrees: f32,
    pub scale: f32,
}

/// Places vegetation and grass on the vertices of one terrain
pub struct EnvironmentGenerator<'a> {
    settings: &'a EnvironmentSettings,
    terrain: &'a TerrainData,
    rng: ChaCha8Rng,
}

impl<'a> EnvironmentGenerator<'a> {
    /// The random stream is derived from the terrain seed
    pub fn new(settings: &'a EnvironmentSettings, terrain: &'a TerrainData, seed: u64) -> Self {
        EnvironmentGenerator {
            settings,
            terrain,
            rng: stage_rng(seed, Stream::Environment),
        }
    }

    /// Vegetation followed by grass, honoring the spawn toggles
    pub fn generate(&mut self) -> Vec<Placement> {
        let mut placements = Vec::new();
        if self.settings.spawn_vegetation {
            placements.extend(self.generate_vegetation());
        }
        if self.settings.spawn_grass {
            placements.extend(self.generate_grass());
        }
        placements
    }

    /// Scatter vegetation over vertices inside the vegetation region
    ///
    /// For each vertex a random vegetation whose band contains its noise is
    /// picked. It spawns when the vertex lies on a flat terrace, is not close
    /// to an earlier plant and the spawn roll passes. Every vertex within two
    /// edges of a placed plant is then excluded.
    pub fn generate_vegetation(&mut self) -> Vec<Placement> {
        let settings = self.settings;
        let region = settings.vegetation_region;
        let mut excluded: HashSet<VertexId> = HashSet::new();
        let mut placements = Vec::new();

        for id in self.terrain.vertex_ids() {
            let noise = self.terrain.vertex(id).noise;
            if noise < region.x || noise > region.y {
                continue;
            }

            let candidates: Vec<&Vegetation> = settings
                .vegetations
                .iter()
                .filter(|v| v.grows_at(noise))
                .collect();
            if candidates.is_empty() {
                continue;
            }
            let vegetation = candidates[self.rng.gen_range(0..candidates.len())];

            if excluded.contains(&id) || !self.terrain.is_on_surface(id) {
                continue;
            }
            if self.rng.r#gen::<f32>() >= vegetation.spawn_chance {
                continue;
            }

            let position = self.scatter(id, vegetation.random_offset);
            let scale = self.rng.gen_range(0.9..1.1);
            placements.push(self.placement(vegetation, position, scale));

            excluded.extend(self.terrain.collect_neighbours(id, EXCLUSION_DEPTH));
        }

        log::info!("Placed {} vegetation instances", placements.len());
        placements
    }

    /// Scatter every grass kind over the vertices inside its band
    pub fn generate_grass(&mut self) -> Vec<Placement> {
        let settings = self.settings;
        let mut placements = Vec::new();

        for grass in &settings.grass_vegetations {
            for id in self.terrain.vertex_ids() {
                if !grass.grows_at(self.terrain.vertex(id).noise) {
                    continue;
                }
                if self.rng.r#gen::<f32>() >= grass.spawn_chance || !self.terrain.is_on_surface(id) {
                    continue;
                }
                let position = self.scatter(id, grass.random_offset);
                placements.push(self.placement(grass, position, 1.0));
            }
        }

        log::info!("Placed {} grass instances", placements.len());
        placements
    }

    /// Vertex position moved by a random planar offset of at most `max_offset`
    fn scatter(&mut self, id: VertexId, max_offset: f32) -> Vec3 {
        let angle = self.rng.r#gen::<f32>() * TAU;
        let radius = self.rng.r#gen::<f32>().sqrt() * self.rng.r#gen::<f32>() * max_offset;
        let offset = Vec2::from_angle(angle) * radius;
        self.terrain.vertex(id).position + Vec3::new(offset.x, 0.0, offset.y)
    }

    fn placement(&mut self, vegetation: &Vegetation, position: Vec3, scale: f32) -> Placement {
        Placement {
            name: vegetation.name.clone(),
            position,
            rotation_degrees: self.rng.gen_range(0.0..360.0),
            scale,
        }
    }
}
