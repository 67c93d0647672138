//! Terraced terrain generation.
//!
//! Points are sampled and triangulated, every vertex gets a noise height and
//! snaps to the terrace of its biome, and the leveled graph is turned into a
//! colored mesh with vertical walls between terraces.

pub mod emitter;
pub mod environment;
pub mod error;
pub mod export;
pub mod gradient;
pub mod graph;
pub mod height;
pub mod mesh;
pub mod points;
pub mod poisson;
pub mod rng;
pub mod settings;
pub mod terrain;
pub mod triangulation;

pub use environment::{EnvironmentGenerator, EnvironmentSettings, Placement, Vegetation};
pub use error::{SettingsError, TerrainError};
pub use gradient::{Color, Gradient, GradientKey};
pub use graph::{Diagnostics, TerrainData, TriangleId, VertexId};
pub use mesh::{MeshBuffers, ShadingMode};
pub use settings::{Biome, MapSettings, NoiseSettings, TerrainSettings};
pub use terrain::TerrainGenerator;
pub use triangulation::{DelaunayTriangulator, Triangulator};
