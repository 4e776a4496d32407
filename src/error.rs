use thiserror::Error;

/// Errors reported by a [`crate::slide::RegionReader`].
#[derive(Debug, Clone, Error)]
pub enum ReadError {
    /// I/O failure while accessing the slide
    #[error("I/O error: {0}")]
    Io(String),

    /// The slide data could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Reader level does not exist
    #[error("Reader level {level} out of range (reader has {level_count} levels)")]
    InvalidLevel { level: usize, level_count: usize },

    /// The request cannot be satisfied (zero size, non-finite origin, ...)
    #[error("Invalid region request: {0}")]
    InvalidRequest(String),
}

/// Errors that can occur while computing or materializing a tile pyramid.
#[derive(Debug, Error)]
pub enum PyramidError {
    /// Invalid pyramid parameters (zero tile size, downsample < 1, ...)
    #[error("Invalid pyramid parameters: {0}")]
    InvalidSpec(String),

    /// Invalid option or option combination, detected before any I/O
    #[error("Configuration error: {0}")]
    Config(String),

    /// The naming strategy has no tile path scheme
    #[error("The {layout} layout does not define tile paths; pick deepzoom or zoomify")]
    PathsUnavailable { layout: &'static str },

    /// Requested level is outside the pyramid
    #[error("Level {level} out of range (pyramid has {level_count} levels)")]
    LevelOutOfRange { level: u32, level_count: u32 },

    /// Requested tile is outside the level's grid or the image extent
    #[error("Tile ({x}, {y}) out of range at level {level}")]
    TileOutOfRange { level: u32, x: u32, y: u32 },

    /// Failure reported by the region reader
    #[error("Region read failed: {0}")]
    Read(#[from] ReadError),

    /// Tile encoding failed
    #[error("Failed to encode tile: {message}")]
    Encode { message: String },

    /// Filesystem error while writing the output
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP container error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A background task panicked or was aborted
    #[error("Worker task failed: {0}")]
    Task(String),

    /// The dump was cancelled through its cancellation flag
    #[error("Dump cancelled after {written} tiles")]
    Cancelled { written: u64 },
}

impl PyramidError {
    /// Whether this error was raised by option validation rather than I/O.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            PyramidError::InvalidSpec(_)
                | PyramidError::Config(_)
                | PyramidError::PathsUnavailable { .. }
        )
    }

    /// Whether this error reports a level or tile outside the pyramid.
    pub fn is_out_of_range(&self) -> bool {
        matches!(
            self,
            PyramidError::LevelOutOfRange { .. } | PyramidError::TileOutOfRange { .. }
        )
    }
}

impl From<tokio::task::JoinError> for PyramidError {
    fn from(err: tokio::task::JoinError) -> Self {
        PyramidError::Task(err.to_string())
    }
}
