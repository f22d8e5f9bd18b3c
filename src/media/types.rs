//! Data types describing video tracks.

use thiserror::Error;

/// Whether a track is still producing frames.
///
/// Every health check in the crate goes through [`crate::media::VideoTrack::health`]
/// and this enum; nothing compares ad hoc state strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackHealth {
    /// Track is producing frames.
    Live,
    /// Track was stopped locally or terminated by the platform.
    Ended,
}

impl TrackHealth {
    pub fn is_live(self) -> bool {
        matches!(self, TrackHealth::Live)
    }
}

/// Negotiated settings of a video track.
///
/// The same structure doubles as the constraint set reapplied to clones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackSettings {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Frames per second
    pub frame_rate: f64,
    /// Width divided by height
    pub aspect_ratio: f64,
}

impl TrackSettings {
    /// Creates settings with the aspect ratio derived from width and height.
    pub fn new(width: u32, height: u32, frame_rate: f64) -> Self {
        let aspect_ratio = if height == 0 {
            0.0
        } else {
            width as f64 / height as f64
        };
        Self {
            width,
            height,
            frame_rate,
            aspect_ratio,
        }
    }
}

/// Errors raised by tracks and streams.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MediaError {
    #[error("Track {0} has ended")]
    TrackEnded(String),

    #[error("Track {0} has not produced settings yet")]
    NoSettings(String),

    #[error("Unsupported constraints for track {track}: {reason}")]
    UnsupportedConstraints { track: String, reason: String },

    #[error("Frame error: {0}")]
    Frame(String),
}

impl From<cairo::Error> for MediaError {
    fn from(err: cairo::Error) -> Self {
        MediaError::Frame(err.to_string())
    }
}
