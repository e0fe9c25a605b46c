//! Procedural heightmap generation for test worlds.
//!
//! Produces fBm Perlin terrain rescaled into a fixed altitude band and
//! writes it in the survey CSV format so the rest of the pipeline treats
//! it exactly like real survey data.

use std::io::Write;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use noise::{Fbm, MultiFractal, NoiseFn, Perlin};

const NOISE_OCTAVES: usize = 4;

#[derive(Debug, Clone)]
pub struct RandomHeightmapOptions {
    pub rows: usize,
    pub cols: usize,
    pub spacing_row: f32,
    pub spacing_col: f32,
    pub min_altitude: f32,
    pub max_altitude: f32,
    pub origin_x: f32,
    pub origin_y: f32,
    pub seed: u32,
}

impl Default for RandomHeightmapOptions {
    fn default() -> Self {
        // Field dimensions of the original competition terrain:
        // 110 x 60 nodes at 0.5 m spacing, origin centered on the y axis.
        Self {
            rows: 110,
            cols: 60,
            spacing_row: 0.5,
            spacing_col: 0.5,
            min_altitude: -0.5,
            max_altitude: 2.0,
            origin_x: 0.0,
            origin_y: 55.0,
            seed: 0,
        }
    }
}

/// Generate the raw elevation matrix (row-major, `rows` lines of `cols`
/// values, the same orientation the CSV stores).
pub fn generate_noise_matrix(options: &RandomHeightmapOptions) -> Result<Vec<Vec<f32>>> {
    ensure!(
        options.rows >= 2 && options.cols >= 2,
        "heightmap needs at least 2x2 nodes, got {}x{}",
        options.cols,
        options.rows
    );
    ensure!(
        options.max_altitude > options.min_altitude,
        "empty altitude band [{}, {}]",
        options.min_altitude,
        options.max_altitude
    );

    let fbm = Fbm::<Perlin>::new(options.seed).set_octaves(NOISE_OCTAVES);

    let mut matrix = vec![vec![0.0f32; options.cols]; options.rows];
    let mut min = f32::MAX;
    let mut max = f32::MIN;
    for (r, row) in matrix.iter_mut().enumerate() {
        for (c, value) in row.iter_mut().enumerate() {
            let v = fbm.get([
                c as f64 / options.cols as f64,
                r as f64 / options.rows as f64,
            ]) as f32;
            min = min.min(v);
            max = max.max(v);
            *value = v;
        }
    }

    // Rescale the raw noise into the requested altitude band.
    let range = if max > min { max - min } else { 1.0 };
    let band = options.max_altitude - options.min_altitude;
    for row in &mut matrix {
        for value in row {
            *value = options.min_altitude + band * (*value - min) / range;
        }
    }

    Ok(matrix)
}

/// Write an elevation matrix in the survey CSV format: one description
/// row, one space-separated metadata row, then `%.5f` elevation rows.
pub fn write_heightmap_csv(
    path: &Path,
    options: &RandomHeightmapOptions,
    matrix: &[Vec<f32>],
) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create heightmap CSV: {}", path.display()))?;
    let mut w = std::io::BufWriter::new(file);

    writeln!(
        w,
        "Number of Rows | Number of Columns | Grid spacing rows | Grid spacing columns | Coordinates of the first point in the matrix (x,y)"
    )?;
    writeln!(
        w,
        "{} {} {} {} {} {}",
        options.rows,
        options.cols,
        options.spacing_row,
        options.spacing_col,
        options.origin_x,
        options.origin_y
    )?;

    let mut writer = csv::Writer::from_writer(w);
    for row in matrix {
        let record: Vec<String> = row.iter().map(|v| format!("{:.5}", v)).collect();
        writer.write_record(&record)?;
    }
    writer.flush()?;

    Ok(())
}

/// Generate a random heightmap and write it to `path`.
pub fn generate_random_heightmap(path: &Path, options: &RandomHeightmapOptions) -> Result<()> {
    let matrix = generate_noise_matrix(options)?;
    write_heightmap_csv(path, options, &matrix)
}
