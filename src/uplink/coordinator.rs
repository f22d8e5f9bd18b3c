use std::time::Duration;

use log::{debug, info, warn};

use crate::compositor::FrameCompositor;
use crate::config::UplinkConfig;
use crate::lifecycle::{ReconcileOutcome, StreamLifecycleManager, TeardownNotifier, wire_teardown};
use crate::media::MediaStream;
use crate::uplink::{
    dependencies::UplinkDependencies,
    session::UplinkSession,
    types::{HandoffError, HandoffOutcome, ProducerKind, UplinkError, UplinkState},
};

/// Returns whether the transition that started a handoff is still wanted.
///
/// Checked after each stabilization delay; a `false` skips the connect.
pub type IntentCheck<'a> = &'a (dyn Fn() -> bool + Send + Sync);

/// State the deactivation handoff needs from its caller.
pub struct HandoffContext<'a> {
    pub compositor: &'a mut FrameCompositor,
    pub lifecycle: &'a mut StreamLifecycleManager,
    pub teardown: &'a TeardownNotifier,
    pub still_wanted: IntentCheck<'a>,
}

/// Serializes create/connect/disconnect of the single outbound producer.
///
/// Every connect is preceded by the disconnect it pairs with having resolved,
/// followed by a stabilization delay, so the producer never sends two streams.
pub struct UplinkHandoffCoordinator {
    deps: UplinkDependencies,
    session: UplinkSession,
    activate_settle: Duration,
    deactivate_settle: Duration,
}

impl UplinkHandoffCoordinator {
    pub fn new(deps: UplinkDependencies, config: &UplinkConfig) -> Self {
        Self {
            deps,
            session: UplinkSession::default(),
            activate_settle: config.activate_settle(),
            deactivate_settle: config.deactivate_settle(),
        }
    }

    pub fn session(&self) -> &UplinkSession {
        &self.session
    }

    /// Moves the producer onto the composite stream.
    ///
    /// Creates a screen-share producer if none exists; otherwise disconnects,
    /// waits for the activation delay, and connects `composite`. Presence is
    /// republished whatever the outcome.
    pub async fn activate_annotation(
        &mut self,
        composite: &MediaStream,
        still_wanted: IntentCheck<'_>,
    ) -> HandoffOutcome {
        let outcome = match self.session.state() {
            UplinkState::NotCreated => self.create(composite).await,
            _ if self.session.is_bound_to(composite) => {
                debug!("Uplink already sending composite stream {}", composite.id());
                HandoffOutcome::Completed
            }
            _ => {
                self.rebind(composite, self.activate_settle, still_wanted)
                    .await
            }
        };

        log_outcome("activate", &outcome);
        self.republish().await;
        outcome
    }

    /// Tears down the composite and moves the producer back to the capture stream.
    ///
    /// Stops the compositor first. While the host is still sharing, the
    /// producer is reconnected to the repaired capture stream after the
    /// deactivation delay; otherwise every track is stopped and the session is
    /// cleared. Presence is republished whatever the outcome.
    pub async fn deactivate_annotation(&mut self, ctx: HandoffContext<'_>) -> HandoffOutcome {
        ctx.compositor.deactivate();

        let capture = self.deps.host.capture_stream();
        let outcome = match capture {
            Some(capture) if self.deps.host.is_sharing() => {
                self.restore_capture(&capture, ctx).await
            }
            capture => {
                self.release_everything(capture.as_ref(), ctx.lifecycle)
                    .await;
                HandoffOutcome::Completed
            }
        };

        log_outcome("deactivate", &outcome);
        self.republish().await;
        outcome
    }

    /// Full stop-share teardown after the platform ended the capture.
    ///
    /// Disconnects (never reconnects), asks the host to stop sharing and
    /// clears the session. Failures are logged and the remaining steps still run.
    pub async fn teardown_for_capture_end(&mut self) -> HandoffOutcome {
        if self.session.state() == UplinkState::NotCreated && !self.deps.host.is_sharing() {
            debug!("Uplink already torn down; ignoring capture end");
            return HandoffOutcome::Completed;
        }

        let mut outcome = HandoffOutcome::Completed;
        if self.session.state() == UplinkState::Connected {
            if let Err(err) = self.disconnect().await {
                outcome = HandoffOutcome::Abandoned(err.into());
            }
        }
        if self.deps.host.is_sharing() {
            if let Err(err) = self.deps.host.stop_sharing().await {
                warn!("Failed to stop screen share after capture ended: {}", err);
                outcome = HandoffOutcome::Abandoned(err.into());
            }
        }
        self.session.reset();
        info!("Screen share stopped after capture track ended");

        self.republish().await;
        outcome
    }

    async fn restore_capture(
        &mut self,
        capture: &MediaStream,
        mut ctx: HandoffContext<'_>,
    ) -> HandoffOutcome {
        if self.session.state() == UplinkState::NotCreated {
            if let Err(err) = self.repair_capture(capture, &mut ctx) {
                return HandoffOutcome::Abandoned(err);
            }
            return self.create(capture).await;
        }

        if self.session.state() == UplinkState::Connected {
            if let Err(err) = self.disconnect().await {
                return HandoffOutcome::Abandoned(err.into());
            }
            self.settle(self.deactivate_settle).await;
        }
        if !(ctx.still_wanted)() {
            info!("Annotation re-enabled during handoff; not reconnecting capture stream");
            return HandoffOutcome::Superseded;
        }

        if let Err(err) = self.repair_capture(capture, &mut ctx) {
            return HandoffOutcome::Abandoned(err);
        }
        match self.connect(capture).await {
            Ok(()) => HandoffOutcome::Completed,
            Err(err) => HandoffOutcome::Abandoned(err.into()),
        }
    }

    /// Reconciles the capture track and re-arms its ended handler.
    fn repair_capture(
        &self,
        capture: &MediaStream,
        ctx: &mut HandoffContext<'_>,
    ) -> Result<(), HandoffError> {
        match ctx.lifecycle.reconcile(capture) {
            Ok(ReconcileOutcome::Repaired { removed, inserted }) => {
                debug!("Capture track {} replaced by {}", removed, inserted);
            }
            Ok(_) => {}
            Err(err) => {
                warn!("Capture stream {} could not be repaired: {}", capture.id(), err);
                return Err(err.into());
            }
        }
        if let Some(track) = capture.active_video_track() {
            wire_teardown(track.as_ref(), ctx.teardown);
        }
        Ok(())
    }

    async fn release_everything(
        &mut self,
        capture: Option<&MediaStream>,
        lifecycle: &mut StreamLifecycleManager,
    ) {
        if let Some(capture) = capture {
            let stopped = capture.stop_all_tracks();
            debug!("Stopped {} capture track(s) of {}", stopped, capture.id());
        }
        lifecycle.release();
        if self.session.state() == UplinkState::Connected {
            // Failure is already logged; the session is dropped either way.
            let _ = self.disconnect().await;
        }
        self.session.reset();
        info!("Share ended; released capture, clone and uplink session");
    }

    async fn rebind(
        &mut self,
        stream: &MediaStream,
        settle: Duration,
        still_wanted: IntentCheck<'_>,
    ) -> HandoffOutcome {
        if self.session.state() == UplinkState::Connected {
            if let Err(err) = self.disconnect().await {
                return HandoffOutcome::Abandoned(err.into());
            }
            self.settle(settle).await;
        }
        if !still_wanted() {
            info!("Annotation disabled during handoff; not connecting composite stream");
            return HandoffOutcome::Superseded;
        }
        match self.connect(stream).await {
            Ok(()) => HandoffOutcome::Completed,
            Err(err) => HandoffOutcome::Abandoned(err.into()),
        }
    }

    async fn create(&mut self, stream: &MediaStream) -> HandoffOutcome {
        match self
            .deps
            .uplink
            .create_producer(ProducerKind::ScreenShare, stream)
            .await
        {
            Ok(()) => {
                info!("Created screen-share producer for stream {}", stream.id());
                self.session.mark_connected(stream);
                HandoffOutcome::Completed
            }
            Err(err) => {
                warn!("Creating screen-share producer failed: {}", err);
                HandoffOutcome::Abandoned(err.into())
            }
        }
    }

    async fn connect(&mut self, stream: &MediaStream) -> Result<(), UplinkError> {
        self.deps
            .uplink
            .connect_producer(stream)
            .await
            .inspect_err(|err| warn!("Connecting stream {} failed: {}", stream.id(), err))?;
        self.session.mark_connected(stream);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), UplinkError> {
        self.deps
            .uplink
            .disconnect_producer()
            .await
            .inspect_err(|err| warn!("Disconnecting producer failed: {}", err))?;
        self.session.mark_disconnected();
        Ok(())
    }

    async fn settle(&self, delay: Duration) {
        if !delay.is_zero() {
            debug!("Waiting {} ms for the uplink to settle", delay.as_millis());
            self.deps.sleeper.sleep(delay).await;
        }
    }

    async fn republish(&self) {
        if let Err(err) = self.deps.presence.republish().await {
            warn!("Presence republish failed: {}", err);
        }
    }
}

fn log_outcome(handoff: &str, outcome: &HandoffOutcome) {
    match outcome {
        HandoffOutcome::Completed => debug!("{} handoff completed", handoff),
        HandoffOutcome::Superseded => debug!("{} handoff superseded", handoff),
        HandoffOutcome::Abandoned(err) => warn!("{} handoff abandoned: {}", handoff, err),
    }
}
