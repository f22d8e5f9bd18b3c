//! Outbound media producer handoff.
//!
//! Exactly one producer ever sends. [`UplinkHandoffCoordinator`] moves it
//! between the raw capture stream and the composite stream with a strict
//! disconnect, settle, connect sequence, and republishes presence afterwards.

mod coordinator;
pub mod dependencies;
mod logging;
mod session;
mod types;

pub use coordinator::{HandoffContext, IntentCheck, UplinkHandoffCoordinator};
pub use dependencies::{
    NetworkUplink, PresenceRepublisher, ShareHost, Sleeper, TokioSleeper, UplinkDependencies,
};
pub use logging::LoggingUplink;
pub use session::UplinkSession;
pub use types::{
    HandoffError, HandoffOutcome, ProducerKind, TransportOperation, UplinkError, UplinkState,
};
