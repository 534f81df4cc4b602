use std::net::IpAddr;
use std::net::Ipv4Addr;
use std::net::SocketAddr;

use serde::Deserialize;
use serde::Serialize;
use tracing::warn;

use crate::Error;
use crate::Result;

/// Prometheus scrape endpoint exposing fault hit/trigger counters and the
/// control handler's autometrics series.
///
/// Off by default: a fault injector usually runs next to the HA process in a
/// test rig where nobody scrapes it.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MonitoringConfig {
    #[serde(default)]
    pub prometheus_enabled: bool,

    #[serde(default = "default_prometheus_port")]
    pub prometheus_port: u16,

    /// Interface the `/metrics` endpoint binds to
    #[serde(default = "default_prometheus_bind_ip")]
    pub prometheus_bind_ip: IpAddr,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            prometheus_enabled: false,
            prometheus_port: default_prometheus_port(),
            prometheus_bind_ip: default_prometheus_bind_ip(),
        }
    }
}

impl MonitoringConfig {
    pub fn metrics_address(&self) -> SocketAddr {
        SocketAddr::new(self.prometheus_bind_ip, self.prometheus_port)
    }

    /// An enabled endpoint needs a fixed, unprivileged port so scrape
    /// targets can be written down ahead of time.
    pub fn validate(&self) -> Result<()> {
        if !self.prometheus_enabled {
            if self.prometheus_port != default_prometheus_port() {
                warn!(
                    "monitoring.prometheus_port={} ignored: metrics endpoint is disabled",
                    self.prometheus_port
                );
            }
            return Ok(());
        }

        match self.prometheus_port {
            0 => Err(Error::InvalidConfig(
                "monitoring.prometheus_port must be fixed (not 0) when the metrics endpoint is enabled"
                    .into(),
            )),
            p if p < 1024 => Err(Error::InvalidConfig(format!(
                "monitoring.prometheus_port {} is below 1024; the injector runs unprivileged",
                p
            ))),
            _ => Ok(()),
        }
    }
}

fn default_prometheus_port() -> u16 {
    9100
}

fn default_prometheus_bind_ip() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}
