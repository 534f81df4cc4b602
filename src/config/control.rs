use std::net::SocketAddr;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// HTTP control surface used by the test harness to inject faults.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ControlConfig {
    #[serde(default = "default_control_enabled")]
    pub enabled: bool,

    #[serde(default = "default_listen_address")]
    pub listen_address: SocketAddr,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            enabled: default_control_enabled(),
            listen_address: default_listen_address(),
        }
    }
}

impl ControlConfig {
    /// # Errors
    /// Returns `Error::InvalidConfig` when enabled without a concrete port.
    pub fn validate(&self) -> Result<()> {
        if self.enabled && self.listen_address.port() == 0 {
            return Err(Error::InvalidConfig(
                "control.listen_address must specify a port when the control surface is enabled"
                    .into(),
            ));
        }
        Ok(())
    }
}

fn default_control_enabled() -> bool {
    true
}

fn default_listen_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8010))
}
