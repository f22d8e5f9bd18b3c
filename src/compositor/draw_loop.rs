use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};
use std::time::Duration;

use log::warn;
use tokio::runtime::Handle;
use tokio::task::{self, JoinHandle};
use tokio::time::{self, Instant, MissedTickBehavior};

/// Cancellable fixed-period task driving the draw tick.
///
/// The first tick fires one full period after spawning. Each tick runs on the
/// blocking pool so cairo work never holds up a runtime worker. Cancellation is
/// synchronous and idempotent: once [`DrawLoop::cancel`] returns no new tick
/// starts. A tick already executing runs to completion, so callers that must
/// observe no further effects have to fence them off themselves.
pub struct DrawLoop {
    cancelled: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
    running: Arc<AtomicUsize>,
}

impl DrawLoop {
    /// Spawns the loop on `runtime`. `running` counts loops not yet cancelled.
    pub fn spawn<F>(runtime: &Handle, period: Duration, running: Arc<AtomicUsize>, tick: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let tick = Arc::new(tick);
        running.fetch_add(1, Ordering::AcqRel);

        let task = runtime.spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if flag.load(Ordering::Acquire) {
                    break;
                }
                let tick = Arc::clone(&tick);
                let tick_flag = Arc::clone(&flag);
                let result = task::spawn_blocking(move || {
                    if !tick_flag.load(Ordering::Acquire) {
                        tick();
                    }
                })
                .await;
                if let Err(err) = result {
                    warn!("Draw tick failed to complete: {}", err);
                }
            }
        });

        Self {
            cancelled,
            task: Some(task),
            running,
        }
    }

    /// Stops the loop. Returns `false` if it was already cancelled.
    pub fn cancel(&mut self) -> bool {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return false;
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.running.fetch_sub(1, Ordering::AcqRel);
        true
    }

    pub fn is_running(&self) -> bool {
        !self.cancelled.load(Ordering::Acquire)
    }
}

impl Drop for DrawLoop {
    fn drop(&mut self) {
        self.cancel();
    }
}
