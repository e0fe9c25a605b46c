//! Landmark list handling: CSV I/O and terrain snapping.
//!
//! The landmark CSV carries one header row, then `name,x,y,z,...` rows.
//! Columns past z (marker ids, notes) are preserved verbatim when the
//! file is rewritten with corrected heights.

pub mod interpolate;

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TerrainError};
use crate::terrain::heightfield::{Heightfield, LoadOptions};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Landmark {
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// A landmark CSV held as raw records so a rewrite can preserve the
/// header and any extra columns untouched.
#[derive(Debug, Clone)]
pub struct LandmarkFile {
    header: csv::StringRecord,
    records: Vec<csv::StringRecord>,
}

impl LandmarkFile {
    pub fn read(path: &Path) -> Result<LandmarkFile> {
        let file = std::fs::File::open(path)?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file);

        let mut rows = reader.records();
        let header = match rows.next() {
            Some(record) => record?,
            None => {
                return Err(TerrainError::Format {
                    line: 1,
                    message: "landmark file is empty".to_string(),
                })
            }
        };

        let mut records = Vec::new();
        for (index, record) in rows.enumerate() {
            let record = record?;
            if record.len() < 4 {
                return Err(TerrainError::Format {
                    line: index + 2,
                    message: format!(
                        "landmark row needs name,x,y,z, found {} fields",
                        record.len()
                    ),
                });
            }
            records.push(record);
        }

        Ok(LandmarkFile { header, records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Typed view of the landmark rows.
    pub fn landmarks(&self) -> Result<Vec<Landmark>> {
        self.records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let parse = |field: usize| -> Result<f32> {
                    record[field].trim().parse().map_err(|_| TerrainError::Format {
                        line: index + 2,
                        message: format!("invalid coordinate '{}'", &record[field]),
                    })
                };
                Ok(Landmark {
                    name: record[0].to_string(),
                    x: parse(1)?,
                    y: parse(2)?,
                    z: parse(3)?,
                })
            })
            .collect()
    }

    /// The (x, y) query points for height interpolation, in file order.
    pub fn positions(&self) -> Result<Vec<(f32, f32)>> {
        Ok(self.landmarks()?.into_iter().map(|l| (l.x, l.y)).collect())
    }

    /// Write the file with the height column (index 3) replaced, one
    /// height per row in order. Header and extra columns pass through.
    /// Heights are written with two decimals, matching their rounding.
    pub fn write_with_heights(&self, heights: &[f32], path: &Path) -> Result<()> {
        if heights.len() != self.records.len() {
            return Err(TerrainError::Validation(format!(
                "{} heights for {} landmarks",
                heights.len(),
                self.records.len()
            )));
        }

        let file = std::fs::File::create(path)?;
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(file);

        writer.write_record(&self.header)?;
        for (record, height) in self.records.iter().zip(heights) {
            let mut out = csv::StringRecord::new();
            for (field_index, field) in record.iter().enumerate() {
                if field_index == 3 {
                    out.push_field(&format!("{:.2}", height));
                } else {
                    out.push_field(field);
                }
            }
            writer.write_record(&out)?;
        }

        writer.flush().map_err(TerrainError::Io)?;
        Ok(())
    }
}

/// Snap the landmarks in `landmarks_csv` onto the terrain described by
/// `heightmap_csv` and write the corrected list to `output_csv`.
///
/// `offset` is a constant height added to every landmark (e.g. to keep a
/// marker post base above ground). Returns the number of landmarks.
pub fn snap_landmark_heights(
    heightmap_csv: &Path,
    landmarks_csv: &Path,
    output_csv: &Path,
    offset: f32,
    options: &LoadOptions,
) -> anyhow::Result<usize> {
    let heightfield = Heightfield::from_csv(heightmap_csv, options)
        .with_context(|| format!("Failed to load heightmap: {}", heightmap_csv.display()))?;

    let landmarks = LandmarkFile::read(landmarks_csv)
        .with_context(|| format!("Failed to read landmarks: {}", landmarks_csv.display()))?;

    let heights = interpolate::interpolate_heights(&heightfield, &landmarks.positions()?, offset)
        .context("Failed to interpolate landmark heights")?;

    landmarks
        .write_with_heights(&heights, output_csv)
        .with_context(|| format!("Failed to write landmarks: {}", output_csv.display()))?;

    Ok(landmarks.len())
}
