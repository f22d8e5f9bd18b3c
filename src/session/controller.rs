use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError, Weak,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use log::{debug, info, warn};
use tokio::runtime::Handle;
use tokio::sync::{Mutex as AsyncMutex, mpsc};

use crate::annotate::AnnotationSurface;
use crate::compositor::FrameCompositor;
use crate::config::Config;
use crate::lifecycle::{LifecycleEvent, StreamLifecycleManager, TeardownNotifier};
use crate::media::{VideoFrame, VideoTrack};
use crate::session::types::{CompositeStreamState, Intent, SessionDependencies, SessionState};
use crate::uplink::{HandoffContext, HandoffOutcome, ShareHost, UplinkHandoffCoordinator};

/// Top-level state machine for the annotated screen share.
///
/// Reacts to the preview toggle and the annotation flag, and to platform
/// capture ends reported by ended handlers. Transitions are serialized: a
/// signal arriving while one runs only records the new intent, and the running
/// transition picks it up before it finishes.
#[derive(Clone)]
pub struct AnnotationSessionController {
    shared: Arc<Shared>,
}

struct Shared {
    intent: Mutex<Intent>,
    /// Bumped on every intent change
    generation: AtomicU64,
    /// Mirror of `Core::state` readable without awaiting
    state: Mutex<SessionState>,
    transitioning: AtomicBool,
    core: AsyncMutex<Core>,
    events: TeardownNotifier,
    host: Arc<dyn ShareHost>,
    annotations: Arc<dyn AnnotationSurface>,
}

struct Core {
    state: SessionState,
    compositor: FrameCompositor,
    lifecycle: StreamLifecycleManager,
    coordinator: UplinkHandoffCoordinator,
}

/// Clears the in-progress flag even if the transition future is dropped.
struct TransitionGuard<'a>(&'a AtomicBool);

impl Drop for TransitionGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl AnnotationSessionController {
    /// Creates a hidden session and spawns the task handling capture-end events.
    pub fn new(runtime: &Handle, deps: SessionDependencies, config: &Config) -> Self {
        let (events_tx, mut events_rx) = mpsc::unbounded_channel::<LifecycleEvent>();
        let host = Arc::clone(&deps.uplink.host);

        let shared = Arc::new(Shared {
            intent: Mutex::new(Intent::default()),
            generation: AtomicU64::new(0),
            state: Mutex::new(SessionState::Hidden),
            transitioning: AtomicBool::new(false),
            core: AsyncMutex::new(Core {
                state: SessionState::Hidden,
                compositor: FrameCompositor::new(runtime.clone(), config.compositor.clone()),
                lifecycle: StreamLifecycleManager::new(),
                coordinator: UplinkHandoffCoordinator::new(deps.uplink, &config.uplink),
            }),
            events: events_tx,
            host,
            annotations: deps.annotations,
        });

        let weak: Weak<Shared> = Arc::downgrade(&shared);
        runtime.spawn(async move {
            while let Some(event) = events_rx.recv().await {
                let Some(shared) = weak.upgrade() else {
                    break;
                };
                shared.handle_event(event).await;
            }
            debug!("Session event pump stopped");
        });

        Self { shared }
    }

    /// Opens or closes the preview.
    pub async fn toggle(&self, visible: bool) {
        self.shared.update_intent(|intent| intent.visible = visible);
        self.shared.drive().await;
    }

    /// Turns annotation on or off.
    pub async fn on_annotation_flag_changed(&self, enabled: bool) {
        self.shared.update_intent(|intent| intent.annotate = enabled);
        self.shared.drive().await;
    }

    pub fn intent(&self) -> Intent {
        *self.shared.intent()
    }

    /// Last settled state. May lag a transition that is still running.
    pub fn state(&self) -> SessionState {
        *self.shared.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub async fn composite_stream_state(&self) -> CompositeStreamState {
        let core = self.shared.core.lock().await;
        let composite = core.compositor.composite_stream();
        let session = core.coordinator.session();
        CompositeStreamState {
            session: core.state,
            composite_active: core.compositor.is_active(),
            canvas_size: core.compositor.canvas_size(),
            composite_settings: core.compositor.composite_settings(),
            live_composite_tracks: composite.map_or(0, |stream| stream.live_track_count()),
            running_draw_loops: core.compositor.running_draw_loops(),
            canvas_mutations: core.compositor.canvas_mutations(),
            uplink: session.state(),
            uplink_stream: session.bound_stream().map(|stream| stream.id().to_string()),
        }
    }

    /// Latest composited frame, while annotating.
    pub async fn composite_snapshot(&self) -> Option<VideoFrame> {
        self.shared.core.lock().await.compositor.snapshot()
    }
}

impl Shared {
    fn intent(&self) -> MutexGuard<'_, Intent> {
        self.intent.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update_intent(&self, update: impl FnOnce(&mut Intent)) {
        let mut intent = self.intent();
        update(&mut intent);
        self.generation.fetch_add(1, Ordering::AcqRel);
        debug!("Session intent now {:?}", *intent);
    }

    fn target(&self) -> SessionState {
        let intent = *self.intent();
        intent.target(self.host.is_sharing())
    }

    fn publish_state(&self, state: SessionState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Runs transitions until the state matches the intent.
    ///
    /// Returns immediately if another caller is already transitioning; that
    /// caller re-checks the intent before releasing the flag.
    async fn drive(&self) {
        loop {
            if self.transitioning.swap(true, Ordering::AcqRel) {
                debug!("Transition in progress; new intent will be picked up by it");
                return;
            }
            let generation = self.generation.load(Ordering::Acquire);
            {
                let _guard = TransitionGuard(&self.transitioning);
                let mut core = self.core.lock().await;
                self.run_transitions(&mut core).await;
            }
            if self.generation.load(Ordering::Acquire) == generation {
                return;
            }
        }
    }

    async fn run_transitions(&self, core: &mut Core) {
        loop {
            let target = self.target();
            if core.state == target {
                return;
            }
            let from = core.state;
            self.transition(core, target).await;
            self.publish_state(core.state);
            info!("Session {:?} -> {:?}", from, core.state);
            if core.state != target {
                // Target unreachable right now; wait for the next signal.
                return;
            }
        }
    }

    async fn transition(&self, core: &mut Core, target: SessionState) {
        match (core.state, target) {
            (SessionState::PreviewingAnnotated, _) => {
                self.leave_annotated(core).await;
                core.state = target;
            }
            (_, SessionState::PreviewingAnnotated) => {
                core.state = self.enter_annotated(core).await;
            }
            (SessionState::PreviewingPlain, SessionState::Hidden) => {
                core.lifecycle.release();
                core.state = SessionState::Hidden;
            }
            (_, target) => core.state = target,
        }
    }

    /// Validates the clone, starts compositing from it and hands the uplink over.
    ///
    /// Returns the state reached: `PreviewingAnnotated` once the compositor
    /// runs, `PreviewingPlain` if the capture cannot be composited.
    async fn enter_annotated(&self, core: &mut Core) -> SessionState {
        let Some(capture) = self.host.capture_stream() else {
            warn!("No capture stream to annotate");
            return SessionState::PreviewingPlain;
        };

        let clone = match core.lifecycle.ensure_fresh_clone(&capture) {
            Ok(Some(clone)) => clone,
            Ok(None) => {
                debug!("Capture has no usable track yet; staying plain");
                return SessionState::PreviewingPlain;
            }
            Err(err) => {
                warn!("Cannot annotate capture {}: {}", capture.id(), err);
                return SessionState::PreviewingPlain;
            }
        };

        let composite = match core
            .compositor
            .activate(Arc::clone(&clone), Arc::clone(&self.annotations))
        {
            Ok(stream) => stream,
            Err(err) => {
                warn!("Compositor activation failed: {}", err);
                return SessionState::PreviewingPlain;
            }
        };
        core.lifecycle.arm_clone_teardown(&self.events);

        let still_wanted = || self.target() == SessionState::PreviewingAnnotated;
        let outcome = core
            .coordinator
            .activate_annotation(&composite, &still_wanted)
            .await;
        if let HandoffOutcome::Abandoned(err) = &outcome {
            warn!(
                "Composite stream {} is not being sent: {}",
                composite.id(),
                err
            );
        }
        SessionState::PreviewingAnnotated
    }

    async fn leave_annotated(&self, core: &mut Core) {
        let still_wanted = || self.target() != SessionState::PreviewingAnnotated;
        let Core {
            compositor,
            lifecycle,
            coordinator,
            ..
        } = core;
        coordinator
            .deactivate_annotation(HandoffContext {
                compositor,
                lifecycle,
                teardown: &self.events,
                still_wanted: &still_wanted,
            })
            .await;
    }

    async fn handle_event(&self, event: LifecycleEvent) {
        let LifecycleEvent::CaptureEnded { track_id } = event;
        let mut core = self.core.lock().await;
        if !self.is_current_track(&core, &track_id) {
            debug!("Ignoring end of stale track {}", track_id);
            return;
        }

        warn!(
            "Capture track {} ended by the platform; stopping the screen share",
            track_id
        );
        let from = core.state;
        core.compositor.deactivate();
        core.coordinator.teardown_for_capture_end().await;
        core.lifecycle.release();
        if let Some(capture) = self.host.capture_stream() {
            capture.stop_all_tracks();
        }

        core.state = if self.intent().visible {
            SessionState::PreviewingPlain
        } else {
            SessionState::Hidden
        };
        self.publish_state(core.state);
        info!("Session {:?} -> {:?} after capture end", from, core.state);
    }

    fn is_current_track(&self, core: &Core, track_id: &str) -> bool {
        let is_clone = core
            .lifecycle
            .clone_track()
            .is_some_and(|track| track.id() == track_id);
        let is_capture = self
            .host
            .capture_stream()
            .and_then(|stream| stream.active_video_track())
            .is_some_and(|track| track.id() == track_id);
        is_clone || is_capture
    }
}
