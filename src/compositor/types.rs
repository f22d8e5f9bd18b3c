use thiserror::Error;

use crate::media::MediaError;

/// Errors raised while activating or drawing the composite.
#[derive(Debug, Error)]
pub enum CompositorError {
    #[error("Source track {0} has not produced settings")]
    MissingSettings(String),

    #[error("Source track {0} has ended")]
    SourceEnded(String),

    #[error("Invalid canvas size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error("Cairo error: {0}")]
    Cairo(#[from] cairo::Error),

    #[error("Canvas pixels unavailable: {0}")]
    PixelAccess(String),

    #[error(transparent)]
    Media(#[from] MediaError),
}
