//! Test-pattern capture source.
//!
//! Stands in for an OS screen capture: it hands out a [`MediaStream`] whose
//! tracks can be cloned and constrained, and lets callers simulate the platform
//! terminating one track or the entire capture.

use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError, Weak},
};

use cairo::{Context, Format, ImageSurface, LinearGradient};

use super::{
    frame::VideoFrame,
    stream::MediaStream,
    track::{EndedHandler, TrackCore, VideoTrack, next_track_id},
    types::{MediaError, TrackHealth, TrackSettings},
};

/// Synthetic screen capture producing a static test pattern.
pub struct SyntheticCapture {
    shared: Arc<CaptureShared>,
    stream: MediaStream,
}

struct CaptureShared {
    settings: Option<TrackSettings>,
    pattern: Option<VideoFrame>,
    tracks: Mutex<Vec<Weak<SyntheticTrack>>>,
}

/// A track fed by a [`SyntheticCapture`].
pub struct SyntheticTrack {
    core: TrackCore,
    shared: Arc<CaptureShared>,
    constraints: Mutex<Option<TrackSettings>>,
}

impl SyntheticCapture {
    /// Creates a capture whose frames match `settings`.
    pub fn new(settings: TrackSettings) -> Result<Self, MediaError> {
        let pattern = render_test_pattern(settings.width, settings.height)?;
        Ok(Self::with_parts(Some(settings), Some(pattern)))
    }

    /// Creates a capture whose track never produces settings or frames.
    pub fn without_settings() -> Self {
        Self::with_parts(None, None)
    }

    fn with_parts(settings: Option<TrackSettings>, pattern: Option<VideoFrame>) -> Self {
        let shared = Arc::new(CaptureShared {
            settings,
            pattern,
            tracks: Mutex::new(Vec::new()),
        });
        let track = SyntheticTrack::spawn(&shared, "capture");
        let stream = MediaStream::new(next_track_id("screen"), vec![track]);
        Self { shared, stream }
    }

    /// The capture stream handed to consumers.
    pub fn stream(&self) -> MediaStream {
        self.stream.clone()
    }

    /// The frame every live track of this capture produces.
    pub fn pattern(&self) -> Option<VideoFrame> {
        self.shared.pattern.clone()
    }

    /// Simulates the platform terminating the track with `track_id`.
    ///
    /// Returns `true` if a live track was ended.
    pub fn end_track(&self, track_id: &str) -> bool {
        self.shared
            .live_tracks()
            .into_iter()
            .find(|track| track.id() == track_id)
            .is_some_and(|track| track.core.end_from_platform())
    }

    /// Simulates the OS stopping the capture: every derived track ends.
    pub fn terminate(&self) -> usize {
        let ended = self
            .shared
            .live_tracks()
            .into_iter()
            .filter(|track| track.core.end_from_platform())
            .count();
        log::info!("Synthetic capture terminated ({} track(s) ended)", ended);
        ended
    }
}

impl CaptureShared {
    fn live_tracks(&self) -> Vec<Arc<SyntheticTrack>> {
        let mut tracks = self.tracks.lock().unwrap_or_else(PoisonError::into_inner);
        tracks.retain(|weak| weak.strong_count() > 0);
        tracks.iter().filter_map(Weak::upgrade).collect()
    }
}

impl SyntheticTrack {
    fn spawn(shared: &Arc<CaptureShared>, prefix: &str) -> Arc<dyn VideoTrack> {
        let track = Arc::new(SyntheticTrack {
            core: TrackCore::new(next_track_id(prefix)),
            shared: Arc::clone(shared),
            constraints: Mutex::new(None),
        });
        shared
            .tracks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::downgrade(&track));
        track
    }
}

impl VideoTrack for SyntheticTrack {
    fn id(&self) -> &str {
        self.core.id()
    }

    fn health(&self) -> TrackHealth {
        self.core.health()
    }

    fn settings(&self) -> Option<TrackSettings> {
        let base = self.shared.settings?;
        let constraints = *self
            .constraints
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Some(constraints.unwrap_or(base))
    }

    fn apply_constraints(&self, constraints: &TrackSettings) -> Result<(), MediaError> {
        self.core.ensure_live()?;
        if self.shared.settings.is_none() {
            return Err(MediaError::NoSettings(self.id().to_string()));
        }
        *self
            .constraints
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(*constraints);
        Ok(())
    }

    fn clone_track(&self) -> Result<Arc<dyn VideoTrack>, MediaError> {
        self.core.ensure_live()?;
        Ok(SyntheticTrack::spawn(&self.shared, "capture-clone"))
    }

    fn current_frame(&self) -> Option<VideoFrame> {
        if self.health().is_live() {
            self.shared.pattern.clone()
        } else {
            None
        }
    }

    fn set_ended_handler(&self, handler: Option<EndedHandler>) {
        self.core.set_handler(handler);
    }

    fn stop(&self) {
        self.core.stop();
    }
}

impl fmt::Debug for SyntheticTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntheticTrack")
            .field("core", &self.core)
            .finish()
    }
}

/// Renders a blue-to-teal gradient with a light grid.
fn render_test_pattern(width: u32, height: u32) -> Result<VideoFrame, MediaError> {
    if width == 0 || height == 0 {
        return Err(MediaError::Frame(format!(
            "cannot render a {}x{} test pattern",
            width, height
        )));
    }

    let surface = ImageSurface::create(Format::ARgb32, width as i32, height as i32)?;
    {
        let ctx = Context::new(&surface)?;
        let gradient = LinearGradient::new(0.0, 0.0, width as f64, height as f64);
        gradient.add_color_stop_rgb(0.0, 0.10, 0.20, 0.55);
        gradient.add_color_stop_rgb(1.0, 0.05, 0.55, 0.55);
        ctx.set_source(&gradient)?;
        ctx.paint()?;

        ctx.set_source_rgba(1.0, 1.0, 1.0, 0.15);
        ctx.set_line_width(1.0);
        let step = (width.min(height) / 8).max(1) as f64;
        let mut x = step;
        while x < width as f64 {
            ctx.move_to(x + 0.5, 0.0);
            ctx.line_to(x + 0.5, height as f64);
            x += step;
        }
        let mut y = step;
        while y < height as f64 {
            ctx.move_to(0.0, y + 0.5);
            ctx.line_to(width as f64, y + 0.5);
            y += step;
        }
        ctx.stroke()?;
    }

    VideoFrame::from_surface(surface)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn capture() -> SyntheticCapture {
        SyntheticCapture::new(TrackSettings::new(64, 36, 30.0)).unwrap()
    }

    #[test]
    fn clones_share_source_but_not_health() {
        let capture = capture();
        let original = capture.stream().active_video_track().unwrap();
        let clone = original.clone_track().unwrap();

        assert_ne!(original.id(), clone.id());
        clone.stop();
        assert_eq!(clone.health(), TrackHealth::Ended);
        assert_eq!(original.health(), TrackHealth::Live);
        assert!(clone.current_frame().is_none());
        assert!(original.current_frame().is_some());
    }

    #[test]
    fn local_stop_does_not_fire_ended_handler() {
        let capture = capture();
        let track = capture.stream().active_video_track().unwrap();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        track.set_ended_handler(Some(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })));

        track.stop();
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(!capture.end_track(track.id()), "stopped track is not live");
    }

    #[test]
    fn platform_end_fires_handler_once() {
        let capture = capture();
        let track = capture.stream().active_video_track().unwrap();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        track.set_ended_handler(Some(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })));

        assert!(capture.end_track(track.id()));
        assert!(!capture.end_track(track.id()));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(track.health(), TrackHealth::Ended);
        assert!(track.clone_track().is_err());
    }

    #[test]
    fn terminate_ends_every_derived_track() {
        let capture = capture();
        let original = capture.stream().active_video_track().unwrap();
        let clone = original.clone_track().unwrap();

        assert_eq!(capture.terminate(), 2);
        assert_eq!(clone.health(), TrackHealth::Ended);
        assert_eq!(capture.stream().live_track_count(), 0);
    }

    #[test]
    fn constraints_override_reported_settings() {
        let capture = capture();
        let track = capture.stream().active_video_track().unwrap();
        let constraints = TrackSettings::new(32, 18, 15.0);
        track.apply_constraints(&constraints).unwrap();
        assert_eq!(track.settings(), Some(constraints));
    }

    #[test]
    fn capture_without_settings_reports_none() {
        let capture = SyntheticCapture::without_settings();
        let track = capture.stream().active_video_track().unwrap();
        assert!(track.settings().is_none());
        assert!(track.current_frame().is_none());
        assert!(matches!(
            track.apply_constraints(&TrackSettings::new(1, 1, 1.0)),
            Err(MediaError::NoSettings(_))
        ));
    }

    #[test]
    fn stream_remove_and_stop_all() {
        let capture = capture();
        let stream = capture.stream();
        let original = stream.active_video_track().unwrap();
        let clone = original.clone_track().unwrap();
        stream.add_track(clone.clone());

        assert!(stream.same_stream(&capture.stream()));
        assert_eq!(stream.live_track_count(), 2);
        assert!(stream.remove_track(original.id()).is_some());
        assert_eq!(stream.active_video_track().unwrap().id(), clone.id());
        assert_eq!(stream.stop_all_tracks(), 1);
        assert_eq!(stream.stop_all_tracks(), 0);
    }
}
