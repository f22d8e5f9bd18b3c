//! Capture-track lifecycle: private clones, repair, and teardown wiring.
//!
//! OS-level screen capture restarts can end the capture track at any moment.
//! [`StreamLifecycleManager`] keeps a privately owned clone that is re-created
//! whenever it ends, repairs the shared capture stream in place, and arms
//! ended handlers that report platform terminations as [`LifecycleEvent`]s.

mod manager;
mod types;

pub use manager::{StreamLifecycleManager, wire_teardown};
pub use types::{LifecycleError, LifecycleEvent, ReconcileOutcome, TeardownNotifier};
