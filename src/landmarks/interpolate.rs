//! Bilinear terrain height interpolation for landmark placement.

use crate::error::Result;
use crate::terrain::heightfield::Heightfield;

/// Interpolate the terrain elevation at each query point.
///
/// Each point is located via the heightfield's grid transform and blended
/// bilinearly from the four surrounding grid nodes. Query points outside
/// the grid's interior fail with an out-of-bounds error; there is no
/// extrapolation. `offset` is added to every result, and results are
/// rounded to 2 decimals to match the precision of the survey CSVs.
///
/// Output order matches input order, one height per query point.
pub fn interpolate_heights(
    heightfield: &Heightfield,
    points: &[(f32, f32)],
    offset: f32,
) -> Result<Vec<f32>> {
    let transform = heightfield.transform();
    let mut heights = Vec::with_capacity(points.len());

    for &(x, y) in points {
        let cell = transform.world_to_cell(x, y)?;

        let h00 = heightfield.elevation(cell.ix, cell.iy);
        let h10 = heightfield.elevation(cell.ix + 1, cell.iy);
        let h01 = heightfield.elevation(cell.ix, cell.iy + 1);
        let h11 = heightfield.elevation(cell.ix + 1, cell.iy + 1);

        let (fx, fy) = (cell.fx, cell.fy);
        let height = (1.0 - fx) * (1.0 - fy) * h00
            + fx * (1.0 - fy) * h10
            + (1.0 - fx) * fy * h01
            + fx * fy * h11;

        heights.push(round_to_csv_precision(height + offset));
    }

    Ok(heights)
}

/// Round to 2 decimal places, the precision of the survey CSV format.
fn round_to_csv_precision(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}
