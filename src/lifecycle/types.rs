use thiserror::Error;
use tokio::sync::mpsc;

use crate::media::MediaError;

/// Events raised by track ended handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The platform terminated a capture (or clone) track.
    CaptureEnded { track_id: String },
}

/// Channel the ended handlers report into.
pub type TeardownNotifier = mpsc::UnboundedSender<LifecycleEvent>;

/// Result of [`super::StreamLifecycleManager::reconcile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Active capture track is live; nothing changed.
    Healthy,
    /// An ended capture track was swapped for a fresh clone.
    Repaired { removed: String, inserted: String },
    /// The capture stream has no track to inspect.
    NoTrack,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LifecycleError {
    #[error("Capture track {0} ended and no healthy clone is available")]
    CaptureTrackEnded(String),

    #[error(transparent)]
    Media(#[from] MediaError),
}
