//! Survey heightmap CSV loading.
//!
//! The source format is the survey DTM CSV: a human-readable header row,
//! a metadata row with six whitespace-separated numbers
//! (`rows cols spacing_row spacing_col origin_x origin_y`), then one
//! comma-separated row of elevation values per grid row. Row/column counts
//! are re-derived from the actual matrix block rather than trusted from
//! the metadata row.

use std::path::Path;

use crate::error::{Result, TerrainError};

/// Elevations at or above this value are a survey sentinel for "no valid
/// measurement" (in meters) and are substituted with 0 on load.
pub const DEFAULT_INVALID_THRESHOLD: f32 = 2.8;

/// Loader configuration, passed explicitly instead of living in globals.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Invalid-sample threshold; values >= this become 0.
    pub invalid_threshold: f32,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            invalid_threshold: DEFAULT_INVALID_THRESHOLD,
        }
    }
}

/// A regular grid of elevation samples plus its spatial calibration.
///
/// `elevations` is indexed `[col][row]` after reorientation: the first
/// index walks the x direction, the second walks y, and index 0 of each
/// axis is the physically minimal coordinate. The source CSV stores rows
/// top-down, so loading flips the row axis and transposes.
#[derive(Debug, Clone)]
pub struct Heightfield {
    pub rows: usize,
    pub cols: usize,
    pub spacing_row: f32,
    pub spacing_col: f32,
    pub origin_x: f32,
    pub origin_y: f32,
    elevations: Vec<Vec<f32>>,
}

impl Heightfield {
    /// Build a heightfield from already-oriented `[col][row]` elevation data.
    pub fn new(
        spacing_row: f32,
        spacing_col: f32,
        origin_x: f32,
        origin_y: f32,
        elevations: Vec<Vec<f32>>,
    ) -> Result<Heightfield> {
        if spacing_row <= 0.0 || spacing_col <= 0.0 {
            return Err(TerrainError::Validation(format!(
                "grid spacing must be positive (got {} x {})",
                spacing_row, spacing_col
            )));
        }

        let cols = elevations.len();
        if cols == 0 || elevations[0].is_empty() {
            return Err(TerrainError::Validation(
                "heightfield has no elevation samples".to_string(),
            ));
        }

        let rows = elevations[0].len();
        if let Some(bad) = elevations.iter().find(|c| c.len() != rows) {
            return Err(TerrainError::Validation(format!(
                "ragged elevation grid: expected {} rows per column, found {}",
                rows,
                bad.len()
            )));
        }

        Ok(Heightfield {
            rows,
            cols,
            spacing_row,
            spacing_col,
            origin_x,
            origin_y,
            elevations,
        })
    }

    /// Load a heightfield from a survey CSV file.
    pub fn from_csv(path: &Path, options: &LoadOptions) -> Result<Heightfield> {
        let file = std::fs::File::open(path)?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file);

        let mut metadata: Option<[f32; 4]> = None;
        let mut raw: Vec<Vec<f32>> = Vec::new();

        for (index, record) in reader.records().enumerate() {
            let record = record?;
            let line = index + 1;

            match index {
                // Human-readable column description, ignored.
                0 => continue,

                // Six whitespace-separated numbers. The declared row/col
                // counts (tokens 0 and 1) are ignored in favor of the
                // actual matrix dimensions.
                1 => {
                    let tokens: Vec<&str> = record
                        .iter()
                        .flat_map(|field| field.split_whitespace())
                        .collect();

                    if tokens.len() != 6 {
                        return Err(TerrainError::Format {
                            line,
                            message: format!(
                                "expected 6 metadata values, found {}",
                                tokens.len()
                            ),
                        });
                    }

                    let mut values = [0.0f32; 6];
                    for (i, token) in tokens.iter().enumerate() {
                        values[i] = token.parse().map_err(|_| TerrainError::Format {
                            line,
                            message: format!("invalid metadata value '{}'", token),
                        })?;
                    }

                    // spacing_row, spacing_col, origin_x, origin_y
                    metadata = Some([values[2], values[3], values[4], values[5]]);
                }

                // Elevation matrix, one comma-separated row per record.
                _ => {
                    let mut row = Vec::with_capacity(record.len());
                    for field in record.iter() {
                        let value: f32 =
                            field.trim().parse().map_err(|_| TerrainError::Format {
                                line,
                                message: format!("invalid elevation value '{}'", field),
                            })?;
                        row.push(value);
                    }

                    if let Some(first) = raw.first() {
                        if row.len() != first.len() {
                            return Err(TerrainError::Format {
                                line,
                                message: format!(
                                    "elevation row has {} values, expected {}",
                                    row.len(),
                                    first.len()
                                ),
                            });
                        }
                    }
                    raw.push(row);
                }
            }
        }

        let [spacing_row, spacing_col, origin_x, origin_y] =
            metadata.ok_or(TerrainError::Format {
                line: 2,
                message: "missing metadata row".to_string(),
            })?;

        if raw.is_empty() {
            return Err(TerrainError::Format {
                line: 3,
                message: "missing elevation matrix".to_string(),
            });
        }

        let input_rows = raw.len();
        let input_cols = raw[0].len();

        // Reorient: flip the row axis so index 0 is the spatially lowest
        // row, then transpose to [col][row]. Sentinel values become 0.
        let mut elevations = vec![vec![0.0f32; input_rows]; input_cols];
        for r in 0..input_rows {
            let source = &raw[input_rows - 1 - r];
            for c in 0..input_cols {
                let v = source[c];
                elevations[c][r] = if v >= options.invalid_threshold { 0.0 } else { v };
            }
        }

        Heightfield::new(spacing_row, spacing_col, origin_x, origin_y, elevations)
    }

    /// Elevation at grid node (i, j), where i walks x and j walks y.
    pub fn elevation(&self, i: usize, j: usize) -> f32 {
        self.elevations[i][j]
    }

    pub fn elevations(&self) -> &[Vec<f32>] {
        &self.elevations
    }

    /// The shared index <-> world transform used by the mesh synthesizer
    /// and the landmark interpolator.
    pub fn transform(&self) -> GridTransform {
        GridTransform {
            rows: self.rows,
            cols: self.cols,
            spacing_row: self.spacing_row,
            spacing_col: self.spacing_col,
            x0: self.origin_x,
            // The CSV documents the origin at the first (top) matrix row;
            // after the row flip, node (_, 0) sits (rows-1) spacings below it.
            y0: self.origin_y - (self.rows - 1) as f32 * self.spacing_row,
        }
    }

    /// Dense coordinate tensor: `coords[i][j] = (x, y, elevation)`.
    pub fn coords(&self) -> Vec<Vec<[f32; 3]>> {
        let transform = self.transform();
        let mut coords = Vec::with_capacity(self.cols);
        for i in 0..self.cols {
            let mut column = Vec::with_capacity(self.rows);
            for j in 0..self.rows {
                let (x, y) = transform.index_to_world(i, j);
                column.push([x, y, self.elevations[i][j]]);
            }
            coords.push(column);
        }
        coords
    }
}

/// Pure mapping between grid indices and world coordinates.
///
/// Both the mesh path and the landmark interpolation path derive their
/// coordinates from this one transform, so the flipped-row origin shift
/// exists in exactly one place.
#[derive(Debug, Clone, Copy)]
pub struct GridTransform {
    pub rows: usize,
    pub cols: usize,
    pub spacing_row: f32,
    pub spacing_col: f32,
    /// World x of grid node (0, _).
    pub x0: f32,
    /// World y of grid node (_, 0), after the row flip.
    pub y0: f32,
}

/// Result of locating a world point inside the grid: the cell's lower-left
/// node indices and the fractional position inside the cell.
#[derive(Debug, Clone, Copy)]
pub struct CellLookup {
    pub ix: usize,
    pub iy: usize,
    pub fx: f32,
    pub fy: f32,
}

impl GridTransform {
    pub fn index_to_world(&self, i: usize, j: usize) -> (f32, f32) {
        (
            self.x0 + i as f32 * self.spacing_col,
            self.y0 + j as f32 * self.spacing_row,
        )
    }

    /// Locate the grid cell containing world point (x, y).
    ///
    /// The fractions are derived directly from the node coordinate
    /// (`fx = (x - x_at_ix) / spacing`), not from a modulo against the
    /// spacing, so a non-spacing-aligned origin is handled correctly.
    /// Points outside the interior `[x0, x_max) x [y0, y_max)` fail with
    /// an out-of-bounds error; there is no extrapolation.
    pub fn world_to_cell(&self, x: f32, y: f32) -> Result<CellLookup> {
        let gx = (x - self.x0) / self.spacing_col;
        let gy = (y - self.y0) / self.spacing_row;

        // Range-check in float space before casting: a huge coordinate
        // would saturate the usize cast, and NaN compares false to
        // everything, so the negated comparisons reject it too.
        if !(gx >= 0.0)
            || !(gy >= 0.0)
            || gx >= (self.cols - 1) as f32
            || gy >= (self.rows - 1) as f32
        {
            return Err(TerrainError::OutOfBounds { x, y });
        }

        let ix = gx.floor() as usize;
        let iy = gy.floor() as usize;

        Ok(CellLookup {
            ix,
            iy,
            fx: gx - ix as f32,
            fy: gy - iy as f32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_csv(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    const SAMPLE: &str = "\
Number of Rows | Number of Columns | Grid spacing rows | Grid spacing columns | Coordinates of the first point (x,y)
3 2 0.5 1.0 10.0 20.0
0.1,0.2
0.3,0.4
0.5,0.6
";

    #[test]
    fn test_load_reorients_matrix() {
        let tmp = TempDir::new().unwrap();
        let path = write_csv(&tmp, "dtm.csv", SAMPLE);

        let hf = Heightfield::from_csv(&path, &LoadOptions::default()).unwrap();
        assert_eq!(hf.rows, 3);
        assert_eq!(hf.cols, 2);
        assert_eq!(hf.spacing_row, 0.5);
        assert_eq!(hf.spacing_col, 1.0);

        // CSV row 0 is the spatially highest row, so after the flip it
        // lands at the highest j index; elevations are indexed [col][row].
        assert_eq!(hf.elevation(0, 2), 0.1);
        assert_eq!(hf.elevation(1, 2), 0.2);
        assert_eq!(hf.elevation(0, 0), 0.5);
        assert_eq!(hf.elevation(1, 0), 0.6);
    }

    #[test]
    fn test_threshold_replaces_sentinels() {
        let tmp = TempDir::new().unwrap();
        let csv = "\
header
2 2 1.0 1.0 0 0
2.8,3.5
0.5,2.79
";
        let path = write_csv(&tmp, "dtm.csv", csv);
        let hf = Heightfield::from_csv(&path, &LoadOptions::default()).unwrap();

        // 2.8 and 3.5 are sentinels, 2.79 is a valid measurement.
        assert_eq!(hf.elevation(0, 1), 0.0);
        assert_eq!(hf.elevation(1, 1), 0.0);
        assert_eq!(hf.elevation(0, 0), 0.5);
        assert_eq!(hf.elevation(1, 0), 2.79);
    }

    #[test]
    fn test_custom_threshold() {
        let tmp = TempDir::new().unwrap();
        let csv = "\
header
2 2 1.0 1.0 0 0
1.0,2.0
0.5,1.5
";
        let path = write_csv(&tmp, "dtm.csv", csv);
        let options = LoadOptions {
            invalid_threshold: 1.5,
        };
        let hf = Heightfield::from_csv(&path, &options).unwrap();

        assert_eq!(hf.elevation(1, 1), 0.0); // 2.0 -> sentinel
        assert_eq!(hf.elevation(1, 0), 0.0); // 1.5 -> sentinel
        assert_eq!(hf.elevation(0, 1), 1.0);
    }

    #[test]
    fn test_bad_metadata_token_count() {
        let tmp = TempDir::new().unwrap();
        let csv = "\
header
3 2 0.5 1.0 10.0
0.1,0.2
";
        let path = write_csv(&tmp, "dtm.csv", csv);
        let err = Heightfield::from_csv(&path, &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, TerrainError::Format { line: 2, .. }));
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let tmp = TempDir::new().unwrap();
        let csv = "\
header
2 3 0.5 1.0 0 0
0.1,0.2,0.3
0.4,0.5
";
        let path = write_csv(&tmp, "dtm.csv", csv);
        let err = Heightfield::from_csv(&path, &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, TerrainError::Format { .. }));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Heightfield::from_csv(
            Path::new("/nonexistent/heightmap.csv"),
            &LoadOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, TerrainError::Io(_)));
    }

    #[test]
    fn test_zero_spacing_rejected() {
        let err =
            Heightfield::new(0.0, 1.0, 0.0, 0.0, vec![vec![0.0, 0.0], vec![0.0, 0.0]])
                .unwrap_err();
        assert!(matches!(err, TerrainError::Validation(_)));
    }

    #[test]
    fn test_transform_origin_shift() {
        let tmp = TempDir::new().unwrap();
        let path = write_csv(&tmp, "dtm.csv", SAMPLE);
        let hf = Heightfield::from_csv(&path, &LoadOptions::default()).unwrap();

        let t = hf.transform();
        // origin_y names the first (top) matrix row; node (_, 0) is the
        // flipped bottom row, (rows-1) * spacing_row below it.
        assert_eq!(t.x0, 10.0);
        assert_eq!(t.y0, 20.0 - 2.0 * 0.5);

        let (x, y) = t.index_to_world(1, 2);
        assert_eq!(x, 11.0);
        assert_eq!(y, 20.0);
    }

    #[test]
    fn test_world_to_cell_fractions() {
        let t = GridTransform {
            rows: 4,
            cols: 4,
            spacing_row: 0.5,
            spacing_col: 0.5,
            x0: 0.3, // deliberately not a multiple of the spacing
            y0: -1.0,
        };

        let cell = t.world_to_cell(0.55, -0.8).unwrap();
        assert_eq!(cell.ix, 0);
        assert_eq!(cell.iy, 0);
        assert!((cell.fx - 0.5).abs() < 1e-5);
        assert!((cell.fy - 0.4).abs() < 1e-5);
    }

    #[test]
    fn test_world_to_cell_bounds() {
        let t = GridTransform {
            rows: 3,
            cols: 3,
            spacing_row: 1.0,
            spacing_col: 1.0,
            x0: 0.0,
            y0: 0.0,
        };

        assert!(t.world_to_cell(-0.1, 1.0).is_err());
        assert!(t.world_to_cell(1.0, -0.1).is_err());
        // Exactly on the far edge: the owning cell would need nodes
        // outside the grid.
        assert!(t.world_to_cell(2.0, 1.0).is_err());
        assert!(t.world_to_cell(1.0, 2.5).is_err());
        assert!(t.world_to_cell(1.99, 1.99).is_ok());
    }

    #[test]
    fn test_world_to_cell_rejects_huge_and_nan() {
        let t = GridTransform {
            rows: 3,
            cols: 3,
            spacing_row: 1.0,
            spacing_col: 1.0,
            x0: 0.0,
            y0: 0.0,
        };

        // A coordinate far beyond the grid must not wrap through the
        // index cast into a bogus in-bounds cell.
        assert!(matches!(
            t.world_to_cell(1.0e30, 0.5),
            Err(TerrainError::OutOfBounds { .. })
        ));
        assert!(matches!(
            t.world_to_cell(0.5, -1.0e30),
            Err(TerrainError::OutOfBounds { .. })
        ));
        assert!(matches!(
            t.world_to_cell(f32::NAN, 0.5),
            Err(TerrainError::OutOfBounds { .. })
        ));
        assert!(matches!(
            t.world_to_cell(0.5, f32::NAN),
            Err(TerrainError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_coords_tensor() {
        let hf = Heightfield::new(
            1.0,
            2.0,
            5.0,
            3.0,
            vec![vec![0.1, 0.2], vec![0.3, 0.4]],
        )
        .unwrap();

        let coords = hf.coords();
        assert_eq!(coords.len(), 2);
        assert_eq!(coords[0].len(), 2);
        assert_eq!(coords[0][0], [5.0, 2.0, 0.1]); // y0 = 3.0 - 1*1.0
        assert_eq!(coords[1][1], [7.0, 3.0, 0.4]);
    }
}
