use std::{sync::Arc, time::Duration};

use async_trait::async_trait;

use crate::media::MediaStream;
use crate::uplink::types::{ProducerKind, UplinkError};

/// The single outbound media producer on the SFU connection.
#[async_trait]
pub trait NetworkUplink: Send + Sync {
    /// Creates the producer and starts sending `stream`.
    async fn create_producer(
        &self,
        kind: ProducerKind,
        stream: &MediaStream,
    ) -> Result<(), UplinkError>;

    /// Starts sending `stream` on the existing producer.
    async fn connect_producer(&self, stream: &MediaStream) -> Result<(), UplinkError>;

    /// Stops sending on the existing producer without closing it.
    async fn disconnect_producer(&self) -> Result<(), UplinkError>;
}

/// Re-announces participant metadata after the outbound stream changed.
#[async_trait]
pub trait PresenceRepublisher: Send + Sync {
    async fn republish(&self) -> Result<(), UplinkError>;
}

/// The screen-share owner: supplies the capture stream and can end the share.
#[async_trait]
pub trait ShareHost: Send + Sync {
    /// Current capture stream, if a share was ever started.
    fn capture_stream(&self) -> Option<MediaStream>;

    fn is_sharing(&self) -> bool;

    /// Ends the screen share. Afterwards [`ShareHost::is_sharing`] returns `false`.
    async fn stop_sharing(&self) -> Result<(), UplinkError>;
}

/// Stabilization delays go through this so tests can observe them.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by `tokio::time::sleep`.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Bundle of collaborators used by the handoff coordinator. Each can be mocked in tests.
#[derive(Clone)]
pub struct UplinkDependencies {
    pub uplink: Arc<dyn NetworkUplink>,
    pub presence: Arc<dyn PresenceRepublisher>,
    pub host: Arc<dyn ShareHost>,
    pub sleeper: Arc<dyn Sleeper>,
}

impl UplinkDependencies {
    pub fn new(
        uplink: Arc<dyn NetworkUplink>,
        presence: Arc<dyn PresenceRepublisher>,
        host: Arc<dyn ShareHost>,
    ) -> Self {
        Self {
            uplink,
            presence,
            host,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }
}
