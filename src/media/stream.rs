use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use super::track::VideoTrack;

/// Shared handle to a set of video tracks.
///
/// Clones refer to the same stream, so swapping a track through one handle is
/// visible to every other holder. The first track is the active one.
#[derive(Clone)]
pub struct MediaStream {
    inner: Arc<StreamInner>,
}

struct StreamInner {
    id: String,
    tracks: Mutex<Vec<Arc<dyn VideoTrack>>>,
}

impl MediaStream {
    pub fn new(id: impl Into<String>, tracks: Vec<Arc<dyn VideoTrack>>) -> Self {
        Self {
            inner: Arc::new(StreamInner {
                id: id.into(),
                tracks: Mutex::new(tracks),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Returns `true` if both handles refer to the same stream object.
    pub fn same_stream(&self, other: &MediaStream) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn video_tracks(&self) -> Vec<Arc<dyn VideoTrack>> {
        self.tracks().clone()
    }

    pub fn active_video_track(&self) -> Option<Arc<dyn VideoTrack>> {
        self.tracks().first().cloned()
    }

    pub fn add_track(&self, track: Arc<dyn VideoTrack>) {
        self.tracks().push(track);
    }

    /// Removes the track with `track_id` without stopping it.
    pub fn remove_track(&self, track_id: &str) -> Option<Arc<dyn VideoTrack>> {
        let mut tracks = self.tracks();
        let index = tracks.iter().position(|track| track.id() == track_id)?;
        Some(tracks.remove(index))
    }

    /// Stops every track. Returns how many were still live.
    ///
    /// Already-stopped tracks are skipped, so releasing twice is harmless.
    pub fn stop_all_tracks(&self) -> usize {
        let tracks = self.video_tracks();
        let mut stopped = 0;
        for track in tracks {
            if track.health().is_live() {
                track.stop();
                stopped += 1;
            }
        }
        if stopped > 0 {
            log::debug!("Stopped {} track(s) of stream {}", stopped, self.id());
        }
        stopped
    }

    pub fn live_track_count(&self) -> usize {
        self.tracks()
            .iter()
            .filter(|track| track.health().is_live())
            .count()
    }

    fn tracks(&self) -> MutexGuard<'_, Vec<Arc<dyn VideoTrack>>> {
        self.inner
            .tracks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let track_ids: Vec<String> = self
            .tracks()
            .iter()
            .map(|track| track.id().to_string())
            .collect();
        f.debug_struct("MediaStream")
            .field("id", &self.inner.id)
            .field("tracks", &track_ids)
            .finish()
    }
}
