//! Grayscale preview/heightmap PNG encoding.

use std::path::Path;

use anyhow::{Context, Result};
use image::imageops::FilterType;
use image::GrayImage;

use crate::terrain::heightfield::Heightfield;

/// Encode the elevation matrix as a grayscale PNG, min/max-normalized to
/// the full 0..255 range. `resize_to` squares the image to the given
/// side length with a smooth filter; simulators typically want 2^n+1
/// sized heightmaps (e.g. 129).
pub fn write_preview_png(
    heightfield: &Heightfield,
    path: &Path,
    resize_to: Option<u32>,
) -> Result<()> {
    let (w, h) = (heightfield.cols as u32, heightfield.rows as u32);

    let mut min = f32::MAX;
    let mut max = f32::MIN;
    for column in heightfield.elevations() {
        for &v in column {
            min = min.min(v);
            max = max.max(v);
        }
    }
    let range = if max > min { max - min } else { 1.0 };

    // Image rows run top-down, grid rows bottom-up.
    let mut img = GrayImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let v = heightfield.elevation(x as usize, (h - 1 - y) as usize);
            let gray = ((v - min) / range * 255.0).round() as u8;
            img.put_pixel(x, y, image::Luma([gray]));
        }
    }

    let img = match resize_to {
        Some(side) => image::imageops::resize(&img, side, side, FilterType::CatmullRom),
        None => img,
    };

    img.save(path)
        .with_context(|| format!("Failed to write preview PNG: {}", path.display()))
}
