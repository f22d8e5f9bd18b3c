use std::sync::Arc;

use crate::annotate::AnnotationSurface;
use crate::media::TrackSettings;
use crate::uplink::{UplinkDependencies, UplinkState};

/// What the presenter sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Preview closed.
    Hidden,
    /// Preview open; viewers receive the composite stream.
    PreviewingAnnotated,
    /// Preview open; viewers receive the raw capture stream.
    PreviewingPlain,
}

/// Latest signals from the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Intent {
    /// Preview open
    pub visible: bool,
    /// Annotation flag
    pub annotate: bool,
}

impl Intent {
    /// State these signals ask for, given whether a screen share is running.
    pub fn target(self, sharing: bool) -> SessionState {
        if !self.visible {
            SessionState::Hidden
        } else if self.annotate && sharing {
            SessionState::PreviewingAnnotated
        } else {
            SessionState::PreviewingPlain
        }
    }
}

/// Observable snapshot of the composite pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeStreamState {
    pub session: SessionState,
    pub composite_active: bool,
    /// Canvas width and height while a composite exists
    pub canvas_size: Option<(u32, u32)>,
    pub composite_settings: Option<TrackSettings>,
    pub live_composite_tracks: usize,
    pub running_draw_loops: usize,
    /// Draw ticks completed since the controller was created
    pub canvas_mutations: u64,
    pub uplink: UplinkState,
    /// Id of the stream the producer is sending
    pub uplink_stream: Option<String>,
}

/// Collaborators of [`super::AnnotationSessionController`].
#[derive(Clone)]
pub struct SessionDependencies {
    pub uplink: UplinkDependencies,
    pub annotations: Arc<dyn AnnotationSurface>,
}
