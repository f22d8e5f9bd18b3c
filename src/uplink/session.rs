use log::debug;

use crate::media::MediaStream;
use crate::uplink::types::UplinkState;

/// Local record of what the producer is sending.
///
/// Only updated after the matching transport call succeeded, so a failed call
/// leaves the last consistent snapshot in place.
#[derive(Debug)]
pub struct UplinkSession {
    state: UplinkState,
    bound: Option<MediaStream>,
}

impl Default for UplinkSession {
    fn default() -> Self {
        Self {
            state: UplinkState::NotCreated,
            bound: None,
        }
    }
}

impl UplinkSession {
    pub fn state(&self) -> UplinkState {
        self.state
    }

    /// Stream the producer is sending, if connected.
    pub fn bound_stream(&self) -> Option<&MediaStream> {
        self.bound.as_ref()
    }

    pub fn is_bound_to(&self, stream: &MediaStream) -> bool {
        self.bound
            .as_ref()
            .is_some_and(|bound| bound.same_stream(stream))
    }

    pub(crate) fn mark_connected(&mut self, stream: &MediaStream) {
        debug!("Uplink session connected to stream {}", stream.id());
        self.state = UplinkState::Connected;
        self.bound = Some(stream.clone());
    }

    pub(crate) fn mark_disconnected(&mut self) {
        debug!("Uplink session disconnected");
        self.state = UplinkState::Created;
        self.bound = None;
    }

    pub(crate) fn reset(&mut self) {
        self.state = UplinkState::NotCreated;
        self.bound = None;
    }
}
