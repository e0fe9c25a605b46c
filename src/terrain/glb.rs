//! GLB (Binary glTF) container writer.
//!
//! A GLB file is a 12-byte header (magic, version 2, total length)
//! followed by a JSON chunk and a BIN chunk, each padded to 4-byte
//! alignment (spaces for JSON, zeros for BIN).

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

const GLB_MAGIC: u32 = 0x4654_6C67; // "glTF"
const GLB_VERSION: u32 = 2;
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;

fn padding_for(len: usize) -> usize {
    (4 - (len % 4)) % 4
}

fn write_chunk<W: Write>(w: &mut W, kind: u32, data: &[u8], pad_byte: u8) -> std::io::Result<()> {
    let padding = padding_for(data.len());
    w.write_all(&((data.len() + padding) as u32).to_le_bytes())?;
    w.write_all(&kind.to_le_bytes())?;
    w.write_all(data)?;
    for _ in 0..padding {
        w.write_all(&[pad_byte])?;
    }
    Ok(())
}

/// Write a GLB file from a glTF JSON string and its binary buffer.
pub fn write_glb(json: &str, bin: &[u8], path: &Path) -> Result<()> {
    let json_bytes = json.as_bytes();
    let total = 12
        + 8
        + json_bytes.len()
        + padding_for(json_bytes.len())
        + 8
        + bin.len()
        + padding_for(bin.len());

    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create GLB: {}", path.display()))?;
    let mut w = std::io::BufWriter::new(file);

    w.write_all(&GLB_MAGIC.to_le_bytes())?;
    w.write_all(&GLB_VERSION.to_le_bytes())?;
    w.write_all(&(total as u32).to_le_bytes())?;

    write_chunk(&mut w, CHUNK_JSON, json_bytes, 0x20)?;
    write_chunk(&mut w, CHUNK_BIN, bin, 0x00)?;

    w.flush()?;
    Ok(())
}
