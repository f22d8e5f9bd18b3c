use std::{
    fmt,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};

use super::{
    frame::VideoFrame,
    types::{MediaError, TrackHealth, TrackSettings},
};

/// Callback invoked when the platform terminates a track.
pub type EndedHandler = Box<dyn Fn() + Send + Sync>;

/// A live video track.
///
/// Implementations must follow platform track semantics: [`VideoTrack::stop`] ends
/// the track silently, while a platform-initiated end invokes the ended handler
/// exactly once.
pub trait VideoTrack: Send + Sync + fmt::Debug {
    fn id(&self) -> &str;

    fn health(&self) -> TrackHealth;

    /// Current settings, or `None` if the track never produced any.
    fn settings(&self) -> Option<TrackSettings>;

    /// Applies width/height/frame-rate/aspect-ratio constraints.
    fn apply_constraints(&self, constraints: &TrackSettings) -> Result<(), MediaError>;

    /// Creates an independent track fed by the same source.
    fn clone_track(&self) -> Result<Arc<dyn VideoTrack>, MediaError>;

    /// Most recent frame, if the track is live and has produced one.
    fn current_frame(&self) -> Option<VideoFrame>;

    /// Replaces the ended handler (`None` clears it).
    fn set_ended_handler(&self, handler: Option<EndedHandler>);

    /// Stops the track locally. Stopping an ended track is a no-op.
    fn stop(&self);
}

static NEXT_TRACK_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_track_id(prefix: &str) -> String {
    format!("{}-{}", prefix, NEXT_TRACK_ID.fetch_add(1, Ordering::Relaxed))
}

/// Identity, health and ended-handler bookkeeping shared by track implementations.
pub(crate) struct TrackCore {
    id: String,
    ended: AtomicBool,
    handler: Mutex<Option<EndedHandler>>,
}

impl TrackCore {
    pub(crate) fn new(id: String) -> Self {
        Self {
            id,
            ended: AtomicBool::new(false),
            handler: Mutex::new(None),
        }
    }

    pub(crate) fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn health(&self) -> TrackHealth {
        if self.ended.load(Ordering::Acquire) {
            TrackHealth::Ended
        } else {
            TrackHealth::Live
        }
    }

    pub(crate) fn ensure_live(&self) -> Result<(), MediaError> {
        match self.health() {
            TrackHealth::Live => Ok(()),
            TrackHealth::Ended => Err(MediaError::TrackEnded(self.id.clone())),
        }
    }

    pub(crate) fn set_handler(&self, handler: Option<EndedHandler>) {
        *self.handler.lock().unwrap_or_else(PoisonError::into_inner) = handler;
    }

    /// Local stop. Returns `true` if the track was live.
    pub(crate) fn stop(&self) -> bool {
        let was_live = !self.ended.swap(true, Ordering::AcqRel);
        if was_live {
            log::debug!("Stopped track {}", self.id);
        } else {
            log::trace!("Track {} already stopped", self.id);
        }
        was_live
    }

    /// Platform-initiated end. Fires the handler if the track was live.
    pub(crate) fn end_from_platform(&self) -> bool {
        if self.ended.swap(true, Ordering::AcqRel) {
            return false;
        }
        log::debug!("Track {} ended by the platform", self.id);
        let handler = self
            .handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handler) = handler {
            handler();
        }
        true
    }
}

impl fmt::Debug for TrackCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackCore")
            .field("id", &self.id)
            .field("health", &self.health())
            .finish()
    }
}
