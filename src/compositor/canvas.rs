//! The composite canvas and its stream view.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cairo::{Context, Format, ImageSurface, Operator};

use crate::annotate::AnnotationSurface;
use crate::compositor::{track::CanvasTrack, types::CompositorError};
use crate::media::{MediaStream, VideoFrame, VideoTrack, next_track_id};

/// Canvas shared between the draw loop and the composite stream's tracks.
pub type SharedCanvas = Arc<Mutex<CompositeCanvas>>;

/// Pixel buffer the draw loop renders into.
///
/// Cairo surfaces are not `Send`, so each tick renders into a scratch surface
/// and copies the result here.
pub struct CompositeCanvas {
    width: u32,
    height: u32,
    stride: u32,
    pixels: Vec<u8>,
    mutations: u64,
    retired: bool,
}

impl CompositeCanvas {
    pub fn new(width: u32, height: u32) -> Result<Self, CompositorError> {
        if width == 0 || height == 0 || width > i32::MAX as u32 || height > i32::MAX as u32 {
            return Err(CompositorError::InvalidSize { width, height });
        }
        let layout = ImageSurface::create(Format::ARgb32, width as i32, height as i32)?;
        let stride = layout.stride() as u32;

        Ok(Self {
            width,
            height,
            stride,
            pixels: vec![0; stride as usize * height as usize],
            mutations: 0,
            retired: false,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of completed draw ticks.
    pub fn mutations(&self) -> u64 {
        self.mutations
    }

    /// Refuses every later draw tick. The pixels stay as last drawn.
    pub fn retire(&mut self) {
        self.retired = true;
    }

    /// Redraws the canvas: clear, video scaled to fit, annotations unscaled on top.
    ///
    /// Does nothing once the canvas is retired.
    pub fn draw_tick(
        &mut self,
        video: Option<&VideoFrame>,
        annotations: &dyn AnnotationSurface,
    ) -> Result<(), CompositorError> {
        if self.retired {
            return Ok(());
        }
        let mut surface =
            ImageSurface::create(Format::ARgb32, self.width as i32, self.height as i32)?;
        {
            let ctx = Context::new(&surface)?;
            ctx.set_operator(Operator::Clear);
            ctx.paint()?;
            ctx.set_operator(Operator::Over);

            if let Some(frame) = video {
                self.paint_video(&ctx, frame)?;
            }

            ctx.identity_matrix();
            annotations.paint(&ctx)?;
        }
        surface.flush();

        let data = surface
            .data()
            .map_err(|e| CompositorError::PixelAccess(e.to_string()))?;
        if data.len() != self.pixels.len() {
            return Err(CompositorError::PixelAccess(format!(
                "scratch surface holds {} bytes, canvas holds {}",
                data.len(),
                self.pixels.len()
            )));
        }
        self.pixels.copy_from_slice(&data);
        self.mutations += 1;
        Ok(())
    }

    fn paint_video(&self, ctx: &Context, frame: &VideoFrame) -> Result<(), CompositorError> {
        if frame.width() == 0 || frame.height() == 0 {
            return Ok(());
        }
        let source = frame.to_surface()?;
        ctx.save()?;
        ctx.scale(
            self.width as f64 / frame.width() as f64,
            self.height as f64 / frame.height() as f64,
        );
        ctx.set_source_surface(&source, 0.0, 0.0)?;
        ctx.paint()?;
        ctx.restore()?;
        Ok(())
    }

    /// Copy of the current pixels.
    pub fn snapshot(&self) -> Result<VideoFrame, CompositorError> {
        Ok(VideoFrame::from_argb32(
            self.width,
            self.height,
            self.stride,
            self.pixels.clone(),
        )?)
    }
}

pub(crate) fn lock_canvas(canvas: &SharedCanvas) -> MutexGuard<'_, CompositeCanvas> {
    canvas.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Returns a stream view of `canvas` advertised at `fps`.
///
/// This is the composite stream: a single [`CanvasTrack`] whose frames are
/// whatever the draw loop last rendered.
pub fn capture_stream(canvas: &SharedCanvas, fps: f64) -> MediaStream {
    let track: Arc<dyn VideoTrack> = Arc::new(CanvasTrack::new(Arc::clone(canvas), fps));
    MediaStream::new(next_track_id("composite"), vec![track])
}
