use serde::Deserialize;
use serde::Serialize;

use crate::constants::HEARTBEAT_FAULT_POINT;
use crate::Error;
use crate::Result;

/// Periodic instrumented cycle standing in for the host's HA loop.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HeartbeatConfig {
    #[serde(default = "default_heartbeat_enabled")]
    pub enabled: bool,

    /// Interval between cycles (unit: milliseconds)
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Fault point hit once per cycle
    #[serde(default = "default_fault_point")]
    pub fault_point: String,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            enabled: default_heartbeat_enabled(),
            interval_ms: default_interval_ms(),
            fault_point: default_fault_point(),
        }
    }
}

impl HeartbeatConfig {
    pub fn validate(&self) -> Result<()> {
        if self.interval_ms == 0 {
            return Err(Error::InvalidConfig("heartbeat.interval_ms must be greater than 0".into()));
        }
        if self.fault_point.trim().is_empty() {
            return Err(Error::InvalidConfig("heartbeat.fault_point cannot be empty".into()));
        }
        Ok(())
    }
}

fn default_heartbeat_enabled() -> bool {
    true
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_fault_point() -> String {
    HEARTBEAT_FAULT_POINT.to_string()
}
