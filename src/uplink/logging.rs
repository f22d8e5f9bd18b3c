use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use log::info;

use crate::media::MediaStream;
use crate::uplink::{
    dependencies::{NetworkUplink, PresenceRepublisher},
    types::{ProducerKind, UplinkError},
};

/// Uplink that only logs what a real SFU transport would be asked to do.
///
/// Used by the `demo` command in place of a network connection.
#[derive(Debug, Default)]
pub struct LoggingUplink {
    operations: AtomicUsize,
    republishes: AtomicUsize,
}

impl LoggingUplink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of create/connect/disconnect calls seen.
    pub fn operations(&self) -> usize {
        self.operations.load(Ordering::Relaxed)
    }

    pub fn republishes(&self) -> usize {
        self.republishes.load(Ordering::Relaxed)
    }

    fn record(&self) -> usize {
        self.operations.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[async_trait]
impl NetworkUplink for LoggingUplink {
    async fn create_producer(
        &self,
        kind: ProducerKind,
        stream: &MediaStream,
    ) -> Result<(), UplinkError> {
        let seq = self.record();
        info!("[uplink #{}] create {:?} producer <- {}", seq, kind, stream.id());
        Ok(())
    }

    async fn connect_producer(&self, stream: &MediaStream) -> Result<(), UplinkError> {
        let seq = self.record();
        info!("[uplink #{}] connect <- {}", seq, stream.id());
        Ok(())
    }

    async fn disconnect_producer(&self) -> Result<(), UplinkError> {
        let seq = self.record();
        info!("[uplink #{}] disconnect", seq);
        Ok(())
    }
}

#[async_trait]
impl PresenceRepublisher for LoggingUplink {
    async fn republish(&self) -> Result<(), UplinkError> {
        let count = self.republishes.fetch_add(1, Ordering::Relaxed) + 1;
        info!("[presence] republished participant metadata ({} total)", count);
        Ok(())
    }
}
