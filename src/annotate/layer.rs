use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{AnnotationSurface, render::render_strokes, stroke::Stroke};

/// Ordered collection of finished strokes.
///
/// Shared between the drawing UI (which pushes strokes) and the compositor
/// (which paints them every tick), so all access goes through a lock.
#[derive(Debug, Default)]
pub struct StrokeLayer {
    strokes: Mutex<Vec<Stroke>>,
    /// 0 means unlimited
    max_strokes: usize,
}

impl StrokeLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(max_strokes: usize) -> Self {
        Self {
            strokes: Mutex::new(Vec::new()),
            max_strokes,
        }
    }

    /// Adds a stroke on top. Returns `false` if the layer is full.
    pub fn push(&self, stroke: Stroke) -> bool {
        let mut strokes = self.strokes();
        if self.max_strokes > 0 && strokes.len() >= self.max_strokes {
            log::warn!(
                "Stroke limit of {} reached; ignoring new stroke",
                self.max_strokes
            );
            return false;
        }
        strokes.push(stroke);
        true
    }

    pub fn undo(&self) -> Option<Stroke> {
        self.strokes().pop()
    }

    pub fn clear(&self) {
        self.strokes().clear();
    }

    pub fn len(&self) -> usize {
        self.strokes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes().is_empty()
    }

    fn strokes(&self) -> MutexGuard<'_, Vec<Stroke>> {
        self.strokes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AnnotationSurface for StrokeLayer {
    fn paint(&self, ctx: &cairo::Context) -> Result<(), cairo::Error> {
        let strokes = self.strokes().clone();
        render_strokes(ctx, &strokes)
    }
}
