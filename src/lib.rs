pub mod error;
pub mod landmarks;
pub mod terrain;

pub use error::{Result, TerrainError};
