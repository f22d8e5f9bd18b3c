use std::sync::Arc;

use log::{debug, error, info};

use crate::lifecycle::types::{LifecycleError, LifecycleEvent, ReconcileOutcome, TeardownNotifier};
use crate::media::{MediaStream, VideoTrack};

/// Owns the private clone of the capture track.
///
/// The clone stream never leaves this struct; callers only receive the clone's
/// track to render from.
#[derive(Debug, Default)]
pub struct StreamLifecycleManager {
    clone: Option<MediaStream>,
}

impl StreamLifecycleManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a live clone of the capture track, creating one if needed.
    ///
    /// An existing clone is reused while its health is Live, so repeated calls
    /// return the same track. Otherwise the capture track is cloned and its
    /// original settings are reapplied as constraints.
    ///
    /// Returns `Ok(None)` when the capture stream has no track or the track has
    /// never produced settings.
    pub fn ensure_fresh_clone(
        &mut self,
        capture: &MediaStream,
    ) -> Result<Option<Arc<dyn VideoTrack>>, LifecycleError> {
        if let Some(track) = self.live_clone() {
            debug!("Reusing live capture clone {}", track.id());
            return Ok(Some(track));
        }

        let Some(source) = capture.active_video_track() else {
            debug!("Capture stream {} has no video track", capture.id());
            return Ok(None);
        };
        let Some(settings) = source.settings() else {
            debug!(
                "Capture track {} has not produced settings; skipping clone",
                source.id()
            );
            return Ok(None);
        };
        if !source.health().is_live() {
            return Err(LifecycleError::CaptureTrackEnded(source.id().to_string()));
        }

        // The previous clone (if any) is ended; release it before replacing.
        self.release();

        let cloned = source.clone_track()?;
        cloned.apply_constraints(&settings)?;
        info!(
            "Cloned capture track {} as {} ({}x{} @ {:.0} fps)",
            source.id(),
            cloned.id(),
            settings.width,
            settings.height,
            settings.frame_rate
        );

        self.clone = Some(MediaStream::new(
            format!("{}-clone", capture.id()),
            vec![Arc::clone(&cloned)],
        ));
        Ok(Some(cloned))
    }

    /// Replaces an ended capture track with a clone of the healthy clone.
    ///
    /// The capture stream is mutated in place, so every holder of the handle
    /// sees the repaired track.
    pub fn reconcile(&mut self, capture: &MediaStream) -> Result<ReconcileOutcome, LifecycleError> {
        let Some(active) = capture.active_video_track() else {
            return Ok(ReconcileOutcome::NoTrack);
        };
        if active.health().is_live() {
            return Ok(ReconcileOutcome::Healthy);
        }

        let Some(healthy) = self.live_clone() else {
            error!(
                "Capture track {} ended and no live clone is available to repair it",
                active.id()
            );
            return Err(LifecycleError::CaptureTrackEnded(active.id().to_string()));
        };

        let replacement = healthy.clone_track()?;
        if let Some(settings) = healthy.settings() {
            replacement.apply_constraints(&settings)?;
        }

        capture.remove_track(active.id());
        capture.add_track(Arc::clone(&replacement));
        info!(
            "Repaired capture stream {}: replaced ended track {} with {}",
            capture.id(),
            active.id(),
            replacement.id()
        );

        Ok(ReconcileOutcome::Repaired {
            removed: active.id().to_string(),
            inserted: replacement.id().to_string(),
        })
    }

    /// Arms the clone's ended handler. Returns `false` if there is no live clone.
    pub fn arm_clone_teardown(&self, notifier: &TeardownNotifier) -> bool {
        match self.live_clone() {
            Some(track) => {
                wire_teardown(track.as_ref(), notifier);
                true
            }
            None => false,
        }
    }

    /// The current clone track, live or not.
    pub fn clone_track(&self) -> Option<Arc<dyn VideoTrack>> {
        self.clone.as_ref()?.active_video_track()
    }

    /// Stops and drops the clone. Returns `true` if one existed.
    pub fn release(&mut self) -> bool {
        match self.clone.take() {
            Some(stream) => {
                for track in stream.video_tracks() {
                    track.set_ended_handler(None);
                }
                stream.stop_all_tracks();
                debug!("Released capture clone stream {}", stream.id());
                true
            }
            None => false,
        }
    }

    fn live_clone(&self) -> Option<Arc<dyn VideoTrack>> {
        self.clone_track().filter(|track| track.health().is_live())
    }
}

/// Makes a platform end of `track` report [`LifecycleEvent::CaptureEnded`].
///
/// Replaces any handler previously set on the track.
pub fn wire_teardown(track: &dyn VideoTrack, notifier: &TeardownNotifier) {
    let tx = notifier.clone();
    let track_id = track.id().to_string();
    debug!("Arming teardown handler on track {}", track_id);
    track.set_ended_handler(Some(Box::new(move || {
        let event = LifecycleEvent::CaptureEnded {
            track_id: track_id.clone(),
        };
        if tx.send(event).is_err() {
            debug!("Teardown receiver dropped before track {} ended", track_id);
        }
    })));
}
