use std::fs::File;
use std::io::{BufWriter, Write};

use anyhow::{Context, Result};
use mesh_tools::GltfBuilder;
use mesh_tools::Triangle;

use crate::environment::Placement;
use crate::mesh::MeshBuffers;

/// Exports the terrain mesh in GLB format
///
/// Positions, smoothed normals and UVs are written. Vertex colors have no
/// slot in the simple mesh builder, use [`export_mesh_to_ply`] to keep them.
///
/// # Arguments
/// * `mesh` - Emitted, usually simplified, terrain mesh
/// * `output_path` - Path where the GLB file will be saved
///
/// # Returns
/// * `Result<()>` - Success or error
pub fn export_mesh_to_glb(mesh: &MeshBuffers, output_path: &str) -> Result<()> {
    log::warn!(
        "GLB export has no vertex color channel, {} is written without biome colors; use .ply to keep them",
        output_path
    );
    let mut builder = GltfBuilder::new();

    let positions = mesh
        .positions
        .iter()
        .map(|p| mesh_tools::compat::point3::new(p.x, p.y, p.z))
        .collect::<Vec<_>>();
    let normals = mesh
        .compute_normals()
        .into_iter()
        .map(|n| mesh_tools::compat::vector3::new(n.x, n.y, n.z))
        .collect::<Vec<_>>();
    let texcoords = mesh
        .uvs
        .iter()
        .map(|uv| mesh_tools::compat::vector2::new(uv.x, uv.y))
        .collect::<Vec<_>>();
    let indices = mesh
        .indices
        .chunks_exact(3)
        .map(|t| Triangle::new(t[0], t[1], t[2]))
        .collect::<Vec<_>>();

    let mesh_index = builder.create_simple_mesh(
        Some("TerrainMesh".to_string()),
        &positions,
        &indices,
        Some(normals),
        Some(texcoords),
        None,
    );

    let node = builder.add_node(Some("Terrain".to_string()), Some(mesh_index), None, None, None);
    builder.add_scene(Some("Main Scene".to_string()), Some(vec![node]));

    builder
        .export_glb(output_path)
        .with_context(|| format!("failed to write GLB file {}", output_path))?;

    log::info!(
        "Exported {} vertices and {} triangles to {}",
        mesh.vertex_count(),
        mesh.triangle_count(),
        output_path
    );
    Ok(())
}

/// Exports the terrain mesh as ASCII PLY with per-vertex colors
pub fn export_mesh_to_ply(mesh: &MeshBuffers, output_path: &str) -> Result<()> {
    let file = File::create(output_path)
        .with_context(|| format!("failed to create PLY file {}", output_path))?;
    let mut writer = BufWriter::new(file);
    write_ply(mesh, &mut writer)?;
    writer.flush()?;

    log::info!(
        "Exported {} vertices and {} triangles to {}",
        mesh.vertex_count(),
        mesh.triangle_count(),
        output_path
    );
    Ok(())
}

/// Write `mesh` as ASCII PLY: position, normal, UV and 8-bit RGBA per vertex
pub fn write_ply<W: Write>(mesh: &MeshBuffers, writer: &mut W) -> Result<()> {
    writeln!(writer, "ply")?;
    writeln!(writer, "format ascii 1.0")?;
    writeln!(writer, "element vertex {}", mesh.vertex_count())?;
    for property in ["x", "y", "z", "nx", "ny", "nz", "s", "t"] {
        writeln!(writer, "property float {}", property)?;
    }
    for channel in ["red", "green", "blue", "alpha"] {
        writeln!(writer, "property uchar {}", channel)?;
    }
    writeln!(writer, "element face {}", mesh.triangle_count())?;
    writeln!(writer, "property list uchar uint vertex_indices")?;
    writeln!(writer, "end_header")?;

    let normals = mesh.compute_normals();
    for (((p, n), uv), color) in mesh
        .positions
        .iter()
        .zip(&normals)
        .zip(&mesh.uvs)
        .zip(&mesh.colors)
    {
        let [r, g, b, a] = color.to_rgba8();
        writeln!(
            writer,
            "{} {} {} {} {} {} {} {} {} {} {} {}",
            p.x, p.y, p.z, n.x, n.y, n.z, uv.x, uv.y, r, g, b, a
        )?;
    }

    for face in mesh.indices.chunks_exact(3) {
        writeln!(writer, "3 {} {} {}", face[0], face[1], face[2])?;
    }
    Ok(())
}

/// Exports vegetation placements as a pretty-printed JSON array
pub fn export_placements_to_json(placements: &[Placement], output_path: &str) -> Result<()> {
    let file = File::create(output_path)
        .with_context(|| format!("failed to create placement file {}", output_path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, placements)?;
    writer.flush()?;

    log::info!("Exported {} placements to {}", placements.len(), output_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gradient::Color;
    use glam::Vec3;

    fn single_triangle() -> MeshBuffers {
        let mut mesh = MeshBuffers::new();
        mesh.add_triangle(
            Vec3::new(0.0, 2.0, 0.0),
            Vec3::new(0.0, 2.0, 1.0),
            Vec3::new(1.0, 2.0, 0.0),
            Color::rgb(1.0, 0.0, 0.0),
        );
        mesh
    }

    #[test]
    fn test_ply_layout() {
        let mut out = Vec::new();
        write_ply(&single_triangle(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "ply");
        assert!(lines.contains(&"element vertex 3"));
        assert!(lines.contains(&"element face 1"));

        let header_end = lines.iter().position(|l| *l == "end_header").unwrap();
        let body = &lines[header_end + 1..];
        assert_eq!(body.len(), 4);
        assert_eq!(body[1], "0 2 1 0 1 0 0 1 255 0 0 255");
        assert_eq!(body[3], "3 0 1 2");
    }

    #[test]
    fn test_ply_file_is_written() {
        let path = std::env::temp_dir().join("terrace_maker_export_test.ply");
        let path = path.to_str().unwrap();
        export_mesh_to_ply(&single_triangle(), path).unwrap();

        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.starts_with("ply\n"));
        assert!(text.trim_end().ends_with("3 0 1 2"));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_placements_json() {
        let placements = vec![Placement {
            name: "Tree".to_string(),
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation_degrees: 90.0,
            scale: 1.0,
        }];
        let path = std::env::temp_dir().join("terrace_maker_placements_test.json");
        let path = path.to_str().unwrap();
        export_placements_to_json(&placements, path).unwrap();

        let parsed: Vec<Placement> = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(parsed, placements);
        std::fs::remove_file(path).unwrap();
    }
}
