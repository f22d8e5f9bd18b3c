//! Mock collaborators shared by the uplink and session tests.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use tokio::time::{Duration, Instant, sleep};

use crate::media::{MediaStream, SyntheticCapture, TrackSettings};
use crate::uplink::{
    NetworkUplink, PresenceRepublisher, ProducerKind, ShareHost, TransportOperation,
    UplinkDependencies, UplinkError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UplinkOp {
    Create(String),
    Connect(String),
    Disconnect,
}

#[derive(Default)]
pub struct MockUplink {
    ops: Mutex<Vec<(UplinkOp, Instant)>>,
    fail: Mutex<Option<TransportOperation>>,
}

impl MockUplink {
    pub fn ops(&self) -> Vec<UplinkOp> {
        self.ops.lock().unwrap().iter().map(|(op, _)| op.clone()).collect()
    }

    pub fn timed_ops(&self) -> Vec<(UplinkOp, Instant)> {
        self.ops.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.ops.lock().unwrap().clear();
    }

    /// Rejects the next call of `operation`.
    pub fn fail_next(&self, operation: TransportOperation) {
        *self.fail.lock().unwrap() = Some(operation);
    }

    fn record(&self, operation: TransportOperation, op: UplinkOp) -> Result<(), UplinkError> {
        let mut fail = self.fail.lock().unwrap();
        if *fail == Some(operation) {
            *fail = None;
            return Err(UplinkError::failed(operation, "rejected by mock"));
        }
        self.ops.lock().unwrap().push((op, Instant::now()));
        Ok(())
    }
}

#[async_trait]
impl NetworkUplink for MockUplink {
    async fn create_producer(
        &self,
        _kind: ProducerKind,
        stream: &MediaStream,
    ) -> Result<(), UplinkError> {
        self.record(
            TransportOperation::Create,
            UplinkOp::Create(stream.id().to_string()),
        )
    }

    async fn connect_producer(&self, stream: &MediaStream) -> Result<(), UplinkError> {
        self.record(
            TransportOperation::Connect,
            UplinkOp::Connect(stream.id().to_string()),
        )
    }

    async fn disconnect_producer(&self) -> Result<(), UplinkError> {
        self.record(TransportOperation::Disconnect, UplinkOp::Disconnect)
    }
}

#[derive(Default)]
pub struct MockPresence {
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl MockPresence {
    /// Attempted republishes, including rejected ones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl PresenceRepublisher for MockPresence {
    async fn republish(&self) -> Result<(), UplinkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(UplinkError::failed(
                TransportOperation::Republish,
                "rejected by mock",
            ));
        }
        Ok(())
    }
}

pub struct MockHost {
    stream: MediaStream,
    sharing: AtomicBool,
    stops: AtomicUsize,
}

impl MockHost {
    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn set_sharing(&self, sharing: bool) {
        self.sharing.store(sharing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ShareHost for MockHost {
    fn capture_stream(&self) -> Option<MediaStream> {
        Some(self.stream.clone())
    }

    fn is_sharing(&self) -> bool {
        self.sharing.load(Ordering::SeqCst)
    }

    async fn stop_sharing(&self) -> Result<(), UplinkError> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.sharing.store(false, Ordering::SeqCst);
        Ok(())
    }
}

/// A sharing host over a synthetic capture, with recording uplink and presence.
pub struct Harness {
    pub capture: SyntheticCapture,
    pub uplink: Arc<MockUplink>,
    pub presence: Arc<MockPresence>,
    pub host: Arc<MockHost>,
}

impl Harness {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_capture(SyntheticCapture::new(TrackSettings::new(width, height, 30.0)).unwrap())
    }

    pub fn with_capture(capture: SyntheticCapture) -> Self {
        let host = Arc::new(MockHost {
            stream: capture.stream(),
            sharing: AtomicBool::new(true),
            stops: AtomicUsize::new(0),
        });
        Self {
            capture,
            uplink: Arc::new(MockUplink::default()),
            presence: Arc::new(MockPresence::default()),
            host,
        }
    }

    pub fn deps(&self) -> UplinkDependencies {
        UplinkDependencies::new(
            self.uplink.clone(),
            self.presence.clone(),
            self.host.clone(),
        )
    }
}

/// Polls `condition` every 5 ms until it holds or `timeout` elapses.
pub async fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        sleep(Duration::from_millis(5)).await;
    }
    condition()
}
