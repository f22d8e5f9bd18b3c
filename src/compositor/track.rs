use std::{fmt, sync::Arc};

use crate::compositor::canvas::{SharedCanvas, lock_canvas};
use crate::media::{
    EndedHandler, MediaError, TrackCore, TrackHealth, TrackSettings, VideoFrame, VideoTrack,
    next_track_id,
};

/// Track view of the composite canvas.
pub struct CanvasTrack {
    core: TrackCore,
    canvas: SharedCanvas,
    frame_rate: f64,
}

impl CanvasTrack {
    pub(crate) fn new(canvas: SharedCanvas, frame_rate: f64) -> Self {
        Self {
            core: TrackCore::new(next_track_id("composite-video")),
            canvas,
            frame_rate,
        }
    }
}

impl VideoTrack for CanvasTrack {
    fn id(&self) -> &str {
        self.core.id()
    }

    fn health(&self) -> TrackHealth {
        self.core.health()
    }

    fn settings(&self) -> Option<TrackSettings> {
        let canvas = lock_canvas(&self.canvas);
        Some(TrackSettings::new(
            canvas.width(),
            canvas.height(),
            self.frame_rate,
        ))
    }

    fn apply_constraints(&self, constraints: &TrackSettings) -> Result<(), MediaError> {
        self.core.ensure_live()?;
        let canvas = lock_canvas(&self.canvas);
        if constraints.width != canvas.width() || constraints.height != canvas.height() {
            return Err(MediaError::UnsupportedConstraints {
                track: self.id().to_string(),
                reason: format!(
                    "canvas is fixed at {}x{}",
                    canvas.width(),
                    canvas.height()
                ),
            });
        }
        Ok(())
    }

    fn clone_track(&self) -> Result<Arc<dyn VideoTrack>, MediaError> {
        self.core.ensure_live()?;
        Ok(Arc::new(CanvasTrack::new(
            Arc::clone(&self.canvas),
            self.frame_rate,
        )))
    }

    fn current_frame(&self) -> Option<VideoFrame> {
        if !self.health().is_live() {
            return None;
        }
        lock_canvas(&self.canvas).snapshot().ok()
    }

    fn set_ended_handler(&self, handler: Option<EndedHandler>) {
        self.core.set_handler(handler);
    }

    fn stop(&self) {
        self.core.stop();
    }
}

impl fmt::Debug for CanvasTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CanvasTrack")
            .field("core", &self.core)
            .field("frame_rate", &self.frame_rate)
            .finish()
    }
}
