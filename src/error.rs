use thiserror::Error;

/// Problems with caller-supplied configuration, detected before generation starts
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("at least one biome is required")]
    EmptyBiomes,

    /// Biome thresholds must be strictly increasing for the first-match scan.
    #[error("biome {index} threshold {current} does not exceed previous threshold {previous}")]
    NonAscendingBiomes {
        index: usize,
        previous: f32,
        current: f32,
    },

    #[error("biome {index} threshold {height} is not a finite number")]
    InvalidBiomeHeight { index: usize, height: f32 },

    #[error("point radius must be positive, got {0}")]
    InvalidPointRadius(f32),

    #[error("sample region must be positive on both axes, got ({0}, {1})")]
    InvalidSampleRegion(f32, f32),

    #[error("noise scale must be positive, got {0}")]
    InvalidNoiseScale(f32),

    #[error("noise offset must be finite, got ({0}, {1})")]
    InvalidNoiseOffset(f32, f32),

    #[error("octave count must be within 1-8, got {0}")]
    InvalidOctaves(u32),

    #[error("lacunarity must be within 0-10, got {0}")]
    InvalidLacunarity(f32),

    #[error("persistence must be finite, got {0}")]
    InvalidPersistence(f32),

    #[error("terrace height must be positive, got {0}")]
    InvalidTerraceHeight(f32),

    #[error("fall-off range ({0}, {1}) must satisfy 0 <= min <= max")]
    InvalidFallOff(f32, f32),

    #[error("detail offset must be zero or positive, got {0}")]
    InvalidDetailOffset(f32),

    #[error("vegetation '{name}' spawn chance {chance} is outside 0-1")]
    InvalidSpawnChance { name: String, chance: f32 },
}

/// Failures of a generation run
#[derive(Debug, Error)]
pub enum TerrainError {
    #[error("invalid settings: {0}")]
    Settings(#[from] SettingsError),

    /// The point field produced no triangles to build terrain from.
    #[error("triangulation of {points} points produced no triangles")]
    EmptyTriangulation { points: usize },
}
