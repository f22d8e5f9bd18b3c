//! Media primitives shared by the compositor, lifecycle manager and uplink.
//!
//! This module provides:
//! - [`TrackHealth`] and [`TrackSettings`] for inspecting a video track
//! - [`VideoTrack`], the seam every capture, clone and canvas track implements
//! - [`MediaStream`], a shared handle that keeps its identity while tracks are swapped
//! - [`SyntheticCapture`], a test-pattern capture source used by the demo and tests

mod frame;
mod stream;
mod synthetic;
mod track;
pub mod types;

pub use frame::VideoFrame;
pub use stream::MediaStream;
pub use synthetic::{SyntheticCapture, SyntheticTrack};
pub use track::{EndedHandler, VideoTrack};
pub use types::{MediaError, TrackHealth, TrackSettings};

pub(crate) use track::{TrackCore, next_track_id};
