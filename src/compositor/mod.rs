//! Frame compositor: capture video with annotations on top, exposed as a stream.
//!
//! While active, a [`DrawLoop`] redraws the [`CompositeCanvas`] every tick:
//! the canvas is cleared, the current capture frame is drawn scaled to the
//! canvas, and the annotation surface is drawn unscaled on top. The canvas is
//! published as the composite stream via [`capture_stream`].

mod canvas;
mod draw_loop;
mod track;
mod types;
#[cfg(test)]
mod tests;

pub use canvas::{CompositeCanvas, SharedCanvas, capture_stream};
pub use draw_loop::DrawLoop;
pub use track::CanvasTrack;
pub use types::CompositorError;

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use log::{debug, info, warn};
use tokio::runtime::Handle;

use crate::annotate::AnnotationSurface;
use crate::config::CompositorConfig;
use crate::media::{MediaStream, TrackSettings, VideoFrame, VideoTrack};
use canvas::lock_canvas;

/// Owns the composite canvas, its draw loop and the composite stream.
///
/// At most one composite exists at a time; activating while active returns the
/// existing stream instead of starting a second loop.
pub struct FrameCompositor {
    runtime: Handle,
    config: CompositorConfig,
    active: Option<ActiveComposite>,
    running_loops: Arc<AtomicUsize>,
    /// Ticks drawn by composites that have since been deactivated
    retired_mutations: u64,
}

struct ActiveComposite {
    canvas: SharedCanvas,
    draw_loop: DrawLoop,
    stream: MediaStream,
}

impl FrameCompositor {
    pub fn new(runtime: Handle, config: CompositorConfig) -> Self {
        Self {
            runtime,
            config,
            active: None,
            running_loops: Arc::new(AtomicUsize::new(0)),
            retired_mutations: 0,
        }
    }

    /// Starts compositing `source` with `annotations` and returns the composite stream.
    ///
    /// The canvas is sized once from the source's settings.
    pub fn activate(
        &mut self,
        source: Arc<dyn VideoTrack>,
        annotations: Arc<dyn AnnotationSurface>,
    ) -> Result<MediaStream, CompositorError> {
        if let Some(active) = &self.active {
            debug!("Compositor already active; reusing stream {}", active.stream.id());
            return Ok(active.stream.clone());
        }

        if !source.health().is_live() {
            return Err(CompositorError::SourceEnded(source.id().to_string()));
        }
        let settings = source
            .settings()
            .ok_or_else(|| CompositorError::MissingSettings(source.id().to_string()))?;

        let canvas: SharedCanvas = Arc::new(Mutex::new(CompositeCanvas::new(
            settings.width,
            settings.height,
        )?));
        let stream = capture_stream(&canvas, self.config.frame_rate);

        let tick_canvas = Arc::clone(&canvas);
        let draw_loop = DrawLoop::spawn(
            &self.runtime,
            self.config.tick_interval(),
            Arc::clone(&self.running_loops),
            move || {
                let frame = source.current_frame();
                let mut canvas = lock_canvas(&tick_canvas);
                if let Err(err) = canvas.draw_tick(frame.as_ref(), annotations.as_ref()) {
                    warn!("Composite draw tick failed: {}", err);
                }
            },
        );

        info!(
            "Compositor active: {}x{} canvas, {} ms ticks, stream {} @ {:.0} fps",
            settings.width,
            settings.height,
            self.config.tick_interval_ms,
            stream.id(),
            self.config.frame_rate
        );

        self.active = Some(ActiveComposite {
            canvas,
            draw_loop,
            stream: stream.clone(),
        });
        Ok(stream)
    }

    /// Cancels the draw loop and stops the composite stream's tracks.
    ///
    /// Returns `false` if the compositor was not active.
    pub fn deactivate(&mut self) -> bool {
        let Some(mut active) = self.active.take() else {
            debug!("Compositor already inactive");
            return false;
        };

        active.draw_loop.cancel();
        {
            // A tick may still be in flight on the blocking pool.
            let mut canvas = lock_canvas(&active.canvas);
            canvas.retire();
            self.retired_mutations += canvas.mutations();
        }
        let stopped = active.stream.stop_all_tracks();
        info!(
            "Compositor deactivated; stopped {} composite track(s)",
            stopped
        );
        true
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn composite_stream(&self) -> Option<MediaStream> {
        self.active.as_ref().map(|active| active.stream.clone())
    }

    /// Settings of the live composite track, if any.
    pub fn composite_settings(&self) -> Option<TrackSettings> {
        self.active
            .as_ref()?
            .stream
            .active_video_track()?
            .settings()
    }

    pub fn canvas_size(&self) -> Option<(u32, u32)> {
        let active = self.active.as_ref()?;
        let canvas = lock_canvas(&active.canvas);
        Some((canvas.width(), canvas.height()))
    }

    /// Latest composited frame.
    pub fn snapshot(&self) -> Option<VideoFrame> {
        let active = self.active.as_ref()?;
        let canvas = lock_canvas(&active.canvas);
        match canvas.snapshot() {
            Ok(frame) => Some(frame),
            Err(err) => {
                warn!("Composite snapshot failed: {}", err);
                None
            }
        }
    }

    /// Draw ticks completed over the compositor's lifetime.
    pub fn canvas_mutations(&self) -> u64 {
        let current = self
            .active
            .as_ref()
            .map(|active| lock_canvas(&active.canvas).mutations())
            .unwrap_or(0);
        self.retired_mutations + current
    }

    /// Draw loops started by this compositor and not yet cancelled.
    pub fn running_draw_loops(&self) -> usize {
        self.running_loops.load(Ordering::Acquire)
    }

    pub fn draw_loop_running(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.draw_loop.is_running())
    }
}

impl Drop for FrameCompositor {
    fn drop(&mut self) {
        self.deactivate();
    }
}
