//! Configuration type definitions.

use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Composite canvas and draw-loop settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CompositorConfig {
    /// Draw-loop period in milliseconds (valid range: 5 - 1000)
    /// The default of 30 ms redraws at roughly 33 fps.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Frame rate advertised by the composite stream (valid range: 1 - 120)
    #[serde(default = "default_frame_rate")]
    pub frame_rate: f64,
}

impl CompositorConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            frame_rate: default_frame_rate(),
        }
    }
}

/// Uplink handoff timing.
///
/// Both delays are fixed sleeps that let the forwarding layer settle between
/// tearing down a producer binding and reusing it. Tune them against the
/// reconnection latency of the actual forwarding server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UplinkConfig {
    /// Delay between disconnect and connect when switching to the composite stream
    /// (valid range: 0 - 5000)
    #[serde(default = "default_activate_settle_ms")]
    pub activate_settle_ms: u64,

    /// Delay between disconnect and connect when switching back to the raw capture
    /// (valid range: 0 - 5000)
    #[serde(default = "default_deactivate_settle_ms")]
    pub deactivate_settle_ms: u64,
}

impl UplinkConfig {
    pub fn activate_settle(&self) -> Duration {
        Duration::from_millis(self.activate_settle_ms)
    }

    pub fn deactivate_settle(&self) -> Duration {
        Duration::from_millis(self.deactivate_settle_ms)
    }
}

impl Default for UplinkConfig {
    fn default() -> Self {
        Self {
            activate_settle_ms: default_activate_settle_ms(),
            deactivate_settle_ms: default_deactivate_settle_ms(),
        }
    }
}

fn default_tick_interval_ms() -> u64 {
    30
}

fn default_frame_rate() -> f64 {
    30.0
}

fn default_activate_settle_ms() -> u64 {
    250
}

fn default_deactivate_settle_ms() -> u64 {
    500
}
