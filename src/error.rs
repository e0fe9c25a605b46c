use std::io;

/// Terrain pipeline error types
#[derive(Debug)]
pub enum TerrainError {
    /// IO error occurred
    Io(io::Error),

    /// Malformed heightmap or landmark CSV
    Format { line: usize, message: String },

    /// Degenerate grid dimensions or shape mismatch
    Validation(String),

    /// Query point outside the interpolatable interior of the grid
    OutOfBounds { x: f32, y: f32 },
}

impl std::fmt::Display for TerrainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerrainError::Io(e) => write!(f, "IO error: {}", e),
            TerrainError::Format { line, message } => {
                write!(f, "Format error at line {}: {}", line, message)
            }
            TerrainError::Validation(msg) => write!(f, "Validation error: {}", msg),
            TerrainError::OutOfBounds { x, y } => {
                write!(f, "Point ({}, {}) is outside the heightfield interior", x, y)
            }
        }
    }
}

impl std::error::Error for TerrainError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TerrainError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for TerrainError {
    fn from(err: io::Error) -> Self {
        TerrainError::Io(err)
    }
}

impl From<csv::Error> for TerrainError {
    fn from(err: csv::Error) -> Self {
        let line = err
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or_default();
        match err.into_kind() {
            csv::ErrorKind::Io(io_err) => TerrainError::Io(io_err),
            other => TerrainError::Format {
                line,
                message: format!("{:?}", other),
            },
        }
    }
}

/// Result type for terrain pipeline operations
pub type Result<T> = std::result::Result<T, TerrainError>;
