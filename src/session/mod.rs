//! Annotation session state machine.
//!
//! [`AnnotationSessionController`] owns the compositor, the capture-clone
//! lifecycle and the uplink handoff, and drives them from two UI signals: the
//! preview toggle and the annotation flag.

mod controller;
mod types;

pub use controller::AnnotationSessionController;
pub use types::{CompositeStreamState, Intent, SessionDependencies, SessionState};
