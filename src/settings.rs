//! Configuration for terrain and environment generation
//!
//! Settings are plain serde structs so a whole map can be described in a
//! single JSON document. Every field has a default, and `validate` must pass
//! before a generation run starts.

use std::fs;
use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::environment::EnvironmentSettings;
use crate::error::SettingsError;
use crate::gradient::{Color, Gradient, GradientKey};

/// Parameters for the layered height noise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseSettings {
    /// World units per noise unit, larger values give broader features
    pub scale: f32,
    /// Constant offset added to every sample coordinate
    pub offset: Vec2,
    /// Number of noise layers (1-8)
    pub octaves: u32,
    /// Amplitude multiplier applied per octave
    pub persistence: f32,
    /// Frequency multiplier applied per octave (0-10)
    pub lacunarity: f32,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        NoiseSettings {
            scale: 20.0,
            offset: Vec2::ZERO,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
        }
    }
}

impl NoiseSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.scale > 0.0 && self.scale.is_finite()) {
            return Err(SettingsError::InvalidNoiseScale(self.scale));
        }
        if !self.offset.is_finite() {
            return Err(SettingsError::InvalidNoiseOffset(self.offset.x, self.offset.y));
        }
        if !(1..=8).contains(&self.octaves) {
            return Err(SettingsError::InvalidOctaves(self.octaves));
        }
        if !(0.0..=10.0).contains(&self.lacunarity) {
            return Err(SettingsError::InvalidLacunarity(self.lacunarity));
        }
        if !self.persistence.is_finite() {
            return Err(SettingsError::InvalidPersistence(self.persistence));
        }
        Ok(())
    }
}

/// One elevation band of the terrain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Biome {
    pub name: String,
    /// Upper noise threshold of the band
    pub height: f32,
    /// Color ramp across the band, keyed by noise normalized inside it
    pub gradient: Gradient,
    /// Flat color for wall faces stepping down from this band
    pub edge: Color,
}

impl Biome {
    pub fn new(name: &str, height: f32, gradient: Gradient, edge: Color) -> Self {
        Biome {
            name: name.to_string(),
            height,
            gradient,
            edge,
        }
    }
}

/// Everything needed to generate one terrain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainSettings {
    pub seed: u64,

    /// Minimum spacing between sampled points
    pub point_radius: f32,
    /// Width and depth of the sampled area, centered on the origin
    pub sample_region: Vec2,

    pub noise: NoiseSettings,
    /// Vertical distance between two terraces
    pub terrace_height: f32,
    /// Normalized border distance range over which heights fade to zero
    pub fall_off_region: Vec2,
    /// Number of point rings added around the sample region
    pub extension_step_count: u32,
    /// Maximum random vertical jitter applied to the finished mesh
    pub detail_offset: f32,

    /// Elevation bands in strictly ascending threshold order
    pub biomes: Vec<Biome>,
}

impl Default for TerrainSettings {
    fn default() -> Self {
        TerrainSettings {
            seed: 0,
            point_radius: 1.0,
            sample_region: Vec2::new(60.0, 60.0),
            noise: NoiseSettings::default(),
            terrace_height: 1.0,
            fall_off_region: Vec2::new(0.6, 0.95),
            extension_step_count: 3,
            detail_offset: 0.1,
            biomes: default_biomes(),
        }
    }
}

impl TerrainSettings {
    /// Check the settings for caller mistakes before any work is done
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.point_radius > 0.0 && self.point_radius.is_finite()) {
            return Err(SettingsError::InvalidPointRadius(self.point_radius));
        }
        if !(self.sample_region.x > 0.0 && self.sample_region.y > 0.0 && self.sample_region.is_finite()) {
            return Err(SettingsError::InvalidSampleRegion(
                self.sample_region.x,
                self.sample_region.y,
            ));
        }
        self.noise.validate()?;
        if !(self.terrace_height > 0.0 && self.terrace_height.is_finite()) {
            return Err(SettingsError::InvalidTerraceHeight(self.terrace_height));
        }
        let fall_off = self.fall_off_region;
        if !(fall_off.x >= 0.0 && fall_off.x <= fall_off.y && fall_off.is_finite()) {
            return Err(SettingsError::InvalidFallOff(fall_off.x, fall_off.y));
        }
        if !(self.detail_offset >= 0.0 && self.detail_offset.is_finite()) {
            return Err(SettingsError::InvalidDetailOffset(self.detail_offset));
        }
        validate_biomes(&self.biomes)
    }
}

/// Biome thresholds must be finite and strictly ascending
fn validate_biomes(biomes: &[Biome]) -> Result<(), SettingsError> {
    if biomes.is_empty() {
        return Err(SettingsError::EmptyBiomes);
    }

    for (index, biome) in biomes.iter().enumerate() {
        if !biome.height.is_finite() {
            return Err(SettingsError::InvalidBiomeHeight {
                index,
                height: biome.height,
            });
        }
        if index > 0 {
            let previous = biomes[index - 1].height;
            if biome.height <= previous {
                return Err(SettingsError::NonAscendingBiomes {
                    index,
                    previous,
                    current: biome.height,
                });
            }
        }
    }

    if let Some(top) = biomes.last() {
        if top.height < 1.0 {
            log::warn!(
                "Top biome '{}' ends at {}, vertices above it will stay unassigned",
                top.name,
                top.height
            );
        }
    }
    Ok(())
}

/// A water-to-snow island palette
pub fn default_biomes() -> Vec<Biome> {
    vec![
        Biome::new(
            "Water",
            0.3,
            Gradient::linear(Color::from_rgb8(28, 72, 128), Color::from_rgb8(54, 118, 178)),
            Color::from_rgb8(22, 58, 104),
        ),
        Biome::new(
            "Sand",
            0.4,
            Gradient::linear(Color::from_rgb8(214, 196, 142), Color::from_rgb8(228, 212, 164)),
            Color::from_rgb8(176, 156, 104),
        ),
        Biome::new(
            "Grass",
            0.6,
            Gradient::new(vec![
                GradientKey { time: 0.0, color: Color::from_rgb8(104, 160, 68) },
                GradientKey { time: 0.6, color: Color::from_rgb8(86, 140, 56) },
                GradientKey { time: 1.0, color: Color::from_rgb8(70, 118, 48) },
            ]),
            Color::from_rgb8(120, 96, 64),
        ),
        Biome::new(
            "Forest",
            0.75,
            Gradient::linear(Color::from_rgb8(58, 100, 44), Color::from_rgb8(46, 82, 38)),
            Color::from_rgb8(102, 84, 60),
        ),
        Biome::new(
            "Rock",
            0.9,
            Gradient::linear(Color::from_rgb8(120, 114, 106), Color::from_rgb8(142, 136, 128)),
            Color::from_rgb8(92, 86, 80),
        ),
        Biome::new(
            "Snow",
            1.0,
            Gradient::solid(Color::from_rgb8(240, 244, 248)),
            Color::from_rgb8(196, 204, 214),
        ),
    ]
}

/// Top-level settings document: terrain plus what grows on it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSettings {
    pub terrain: TerrainSettings,
    pub environment: EnvironmentSettings,
}

impl MapSettings {
    /// Parse and validate a JSON settings document
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: MapSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load and validate a JSON settings file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.terrain.validate()?;
        self.environment.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        assert!(MapSettings::default().validate().is_ok());
    }

    #[test]
    fn test_empty_biomes_rejected() {
        let mut settings = TerrainSettings::default();
        settings.biomes.clear();
        assert!(matches!(settings.validate(), Err(SettingsError::EmptyBiomes)));
    }

    #[test]
    fn test_non_ascending_biomes_rejected() {
        let mut settings = TerrainSettings::default();
        settings.biomes[2].height = settings.biomes[1].height;

        match settings.validate() {
            Err(SettingsError::NonAscendingBiomes { index, .. }) => assert_eq!(index, 2),
            other => panic!("Expected NonAscendingBiomes, got {:?}", other),
        }
    }

    #[test]
    fn test_non_positive_geometry_rejected() {
        let mut settings = TerrainSettings::default();
        settings.point_radius = 0.0;
        assert!(matches!(settings.validate(), Err(SettingsError::InvalidPointRadius(_))));

        let mut settings = TerrainSettings::default();
        settings.sample_region = Vec2::new(10.0, -1.0);
        assert!(matches!(settings.validate(), Err(SettingsError::InvalidSampleRegion(..))));

        let mut settings = TerrainSettings::default();
        settings.point_radius = f32::NAN;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_noise_ranges_enforced() {
        let mut settings = TerrainSettings::default();
        settings.noise.octaves = 9;
        assert!(matches!(settings.validate(), Err(SettingsError::InvalidOctaves(9))));

        let mut settings = TerrainSettings::default();
        settings.noise.lacunarity = 10.5;
        assert!(matches!(settings.validate(), Err(SettingsError::InvalidLacunarity(_))));
    }

    #[test]
    fn test_fall_off_range_enforced() {
        let mut settings = TerrainSettings::default();
        settings.fall_off_region = Vec2::new(0.9, 0.5);
        assert!(matches!(settings.validate(), Err(SettingsError::InvalidFallOff(..))));
    }

    #[test]
    fn test_infinite_values_rejected() {
        let inf = f32::INFINITY;

        let settings = TerrainSettings { point_radius: inf, ..TerrainSettings::default() };
        assert!(matches!(settings.validate(), Err(SettingsError::InvalidPointRadius(_))));

        let settings = TerrainSettings { sample_region: Vec2::new(inf, 10.0), ..TerrainSettings::default() };
        assert!(matches!(settings.validate(), Err(SettingsError::InvalidSampleRegion(..))));

        let settings = TerrainSettings { terrace_height: inf, ..TerrainSettings::default() };
        assert!(matches!(settings.validate(), Err(SettingsError::InvalidTerraceHeight(_))));

        let settings = TerrainSettings { fall_off_region: Vec2::new(0.5, inf), ..TerrainSettings::default() };
        assert!(matches!(settings.validate(), Err(SettingsError::InvalidFallOff(..))));

        let settings = TerrainSettings { detail_offset: inf, ..TerrainSettings::default() };
        assert!(matches!(settings.validate(), Err(SettingsError::InvalidDetailOffset(_))));

        let mut settings = TerrainSettings::default();
        settings.noise.scale = inf;
        assert!(matches!(settings.validate(), Err(SettingsError::InvalidNoiseScale(_))));

        let mut settings = TerrainSettings::default();
        settings.noise.offset = Vec2::new(0.0, -inf);
        assert!(matches!(settings.validate(), Err(SettingsError::InvalidNoiseOffset(..))));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "terrain": { "seed": 42, "noise": { "octaves": 6 } } }"#;
        let settings = MapSettings::from_json(json).unwrap();

        assert_eq!(settings.terrain.seed, 42);
        assert_eq!(settings.terrain.noise.octaves, 6);
        assert_eq!(settings.terrain.noise.lacunarity, 2.0);
        assert_eq!(settings.terrain.biomes.len(), default_biomes().len());
    }

    #[test]
    fn test_invalid_json_settings_rejected() {
        let json = r#"{ "terrain": { "point_radius": -2.0 } }"#;
        assert!(matches!(
            MapSettings::from_json(json),
            Err(SettingsError::InvalidPointRadius(_))
        ));
        assert!(matches!(MapSettings::from_json("{"), Err(SettingsError::Json(_))));
    }
}
