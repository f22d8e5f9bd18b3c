//! Data types for the outbound media producer.

use std::fmt;

use thiserror::Error;

use crate::lifecycle::LifecycleError;

/// Kind of producer created on the network uplink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProducerKind {
    ScreenShare,
}

/// Lifecycle of the single outbound producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UplinkState {
    /// No producer exists.
    NotCreated,
    /// A producer exists but is not sending any stream.
    Created,
    /// The producer is sending exactly one stream.
    Connected,
}

/// Transport call that can be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportOperation {
    Create,
    Connect,
    Disconnect,
    Republish,
    StopSharing,
}

impl fmt::Display for TransportOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportOperation::Create => "create",
            TransportOperation::Connect => "connect",
            TransportOperation::Disconnect => "disconnect",
            TransportOperation::Republish => "republish",
            TransportOperation::StopSharing => "stop-sharing",
        };
        f.write_str(name)
    }
}

/// Errors reported by uplink collaborators.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UplinkError {
    #[error("Transport {operation} failed: {reason}")]
    TransportOperationFailed {
        operation: TransportOperation,
        reason: String,
    },
}

impl UplinkError {
    pub fn failed(operation: TransportOperation, reason: impl Into<String>) -> Self {
        UplinkError::TransportOperationFailed {
            operation,
            reason: reason.into(),
        }
    }
}

/// Why a handoff stopped before its last step.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HandoffError {
    #[error(transparent)]
    Transport(#[from] UplinkError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

/// How a handoff ended.
#[derive(Debug, Clone, PartialEq)]
pub enum HandoffOutcome {
    /// Every step ran.
    Completed,
    /// Intent changed during the stabilization delay; the connect was skipped.
    Superseded,
    /// A step failed; the remaining steps were skipped.
    Abandoned(HandoffError),
}
