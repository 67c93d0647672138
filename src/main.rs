use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::Parser;

use terrace_maker::export::{export_mesh_to_glb, export_mesh_to_ply, export_placements_to_json};
use terrace_maker::{EnvironmentGenerator, MapSettings, ShadingMode, TerrainGenerator};

#[derive(Parser, Debug)]
#[command(name = "terrace-maker")]
#[command(about = "Generate terraced low-poly terrain meshes")]
struct Args {
    /// JSON settings file (built-in defaults if not specified)
    #[arg(long)]
    settings: Option<String>,

    /// Random seed, overrides the settings file
    #[arg(short, long)]
    seed: Option<u64>,

    /// Output mesh path, .ply keeps vertex colors, .glb does not
    #[arg(short, long, default_value = "terrain.ply")]
    output: String,

    /// Vertex layout of the exported mesh
    #[arg(long, value_enum, default_value = "flat")]
    shading: ShadingMode,

    /// Maximum vertical jitter, overrides the settings file
    #[arg(short, long)]
    detail: Option<f32>,

    /// Write vegetation and grass placements to this JSON file
    #[arg(long)]
    vegetation: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut settings = match &args.settings {
        Some(path) => MapSettings::load(path).with_context(|| format!("failed to load settings from {}", path))?,
        None => MapSettings::default(),
    };
    if let Some(seed) = args.seed {
        settings.terrain.seed = seed;
    }
    if let Some(detail) = args.detail {
        settings.terrain.detail_offset = detail;
    }
    settings.validate().context("invalid settings")?;

    log::info!("Generating terrain with seed {}", settings.terrain.seed);
    let generator = TerrainGenerator::new(settings.terrain.clone())?;
    let mut terrain = generator.generate_terrain_data()?;
    let mut mesh = generator.generate_mesh(&mut terrain);
    mesh.simplify(args.shading);

    let diagnostics = &terrain.diagnostics;
    if !diagnostics.is_clean() {
        log::warn!(
            "Finished with {} unassigned vertices, {} unresolved and {} skipped triangles, {} duplicate wall claims",
            diagnostics.unassigned_vertices.len(),
            diagnostics.unresolved_triangles.len(),
            diagnostics.skipped_triangles.len(),
            diagnostics.duplicate_wall_claims.len()
        );
    }

    let extension = Path::new(&args.output)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("glb") => export_mesh_to_glb(&mesh, &args.output)?,
        Some("ply") => export_mesh_to_ply(&mesh, &args.output)?,
        _ => bail!("unsupported output format for {}, use .glb or .ply", args.output),
    }

    if let Some(path) = &args.vegetation {
        let placements = EnvironmentGenerator::new(&settings.environment, &terrain, settings.terrain.seed).generate();
        export_placements_to_json(&placements, path)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_keeps_colors() {
        let args = Args::parse_from(["terrace-maker"]);
        assert_eq!(args.output, "terrain.ply");
        assert_eq!(args.shading, ShadingMode::Flat);
        assert!(args.seed.is_none());
    }

    #[test]
    fn test_overrides_parse() {
        let args = Args::parse_from([
            "terrace-maker",
            "--seed",
            "7",
            "--output",
            "island.glb",
            "--shading",
            "smooth",
            "--detail",
            "0.25",
        ]);
        assert_eq!(args.seed, Some(7));
        assert_eq!(args.output, "island.glb");
        assert_eq!(args.shading, ShadingMode::Smooth);
        assert_eq!(args.detail, Some(0.25));
    }
}
