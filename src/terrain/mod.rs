pub mod export;
pub mod glb;
pub mod heightfield;
pub mod mesh;
pub mod preview;
pub mod procedural;

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::terrain::export::TerrainExportOptions;
use crate::terrain::heightfield::{Heightfield, LoadOptions};

/// Summary of a terrain export run.
#[derive(Debug, Serialize, Deserialize)]
pub struct TerrainExportResult {
    pub glb_path: String,
    pub rows: usize,
    pub cols: usize,
    pub vertex_count: usize,
    pub triangle_count: usize,
}

/// Full terrain pipeline: survey CSV in, GLB terrain asset out.
pub fn generate_terrain(
    heightmap_csv: &Path,
    output_glb: &Path,
    load_options: &LoadOptions,
    export_options: &TerrainExportOptions,
) -> anyhow::Result<TerrainExportResult> {
    let heightfield = Heightfield::from_csv(heightmap_csv, load_options)
        .with_context(|| format!("Failed to load heightmap: {}", heightmap_csv.display()))?;

    let terrain_mesh = mesh::build_terrain_mesh(&heightfield)
        .context("Failed to synthesize terrain mesh")?;

    let (json, bin) = export::build_terrain_gltf(&terrain_mesh, export_options)
        .context("Failed to assemble terrain glTF")?;
    glb::write_glb(&json, &bin, output_glb)?;

    Ok(TerrainExportResult {
        glb_path: output_glb.display().to_string(),
        rows: heightfield.rows,
        cols: heightfield.cols,
        vertex_count: terrain_mesh.vertex_count(),
        triangle_count: terrain_mesh.triangle_count(),
    })
}
