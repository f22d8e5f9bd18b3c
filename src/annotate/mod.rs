//! Annotation layer painted on top of the shared screen.
//!
//! The compositor only knows about [`AnnotationSurface`]; [`StrokeLayer`] is the
//! in-tree implementation holding the presenter's strokes.

pub mod color;
mod layer;
mod render;
mod stroke;

pub use color::Color;
pub use layer::StrokeLayer;
pub use render::{arrowhead_points, render_stroke, render_strokes};
pub use stroke::{Pen, Stroke};

/// A drawable layer referenced (not owned) by the compositor.
pub trait AnnotationSurface: Send + Sync {
    /// Paints the layer onto `ctx` at the context's current transform.
    ///
    /// The compositor resets the transform to identity before calling this, so
    /// annotation coordinates are canvas pixels.
    fn paint(&self, ctx: &cairo::Context) -> Result<(), cairo::Error>;
}
