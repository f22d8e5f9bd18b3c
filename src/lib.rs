//! Library exports for the annotated screen-share pipeline.
//!
//! The pieces, leaves first: [`media`] tracks and streams, [`lifecycle`] for
//! capture clones, [`compositor`] for the draw loop, [`uplink`] for the
//! producer handoff, and [`session`] tying them together behind
//! [`AnnotationSessionController`].

pub mod annotate;
pub mod compositor;
pub mod config;
pub mod lifecycle;
pub mod media;
pub mod session;
pub mod uplink;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use session::AnnotationSessionController;
