//! A builder for assembling a fault-injecting [`Node`].
//!
//! ## Example
//! ```ignore
//! let (shutdown_tx, shutdown_rx) = watch::channel(());
//! let node = NodeBuilder::new(config, shutdown_rx)
//!     .build()?
//!     .start_metrics_server(shutdown_tx.subscribe())
//!     .start_control_server()?
//!     .ready()?;
//! node.run().await;
//! ```
//!
//! `build()` creates the registry (unless one was supplied) and activates the
//! startup faults; `ready()` returns the assembled node.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use super::Heartbeat;
use super::Node;
use crate::control::http;
use crate::metrics;
use crate::FaultController;
use crate::FaultInjectorConfig;
use crate::FaultRegistry;
use crate::Result;
use crate::SystemError;

pub struct NodeBuilder {
    pub(super) config: FaultInjectorConfig,
    pub(super) registry: Option<Arc<FaultRegistry>>,
    pub(super) shutdown_signal: watch::Receiver<()>,
    pub(super) control_address: Option<SocketAddr>,
    pub(super) node: Option<Arc<Node>>,
}

impl NodeBuilder {
    pub fn new(
        config: FaultInjectorConfig,
        shutdown_signal: watch::Receiver<()>,
    ) -> Self {
        Self {
            config,
            registry: None,
            shutdown_signal,
            control_address: None,
            node: None,
        }
    }

    /// Shares an existing registry instead of creating a fresh one.
    pub fn registry(
        mut self,
        registry: Arc<FaultRegistry>,
    ) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Creates the node and activates the startup fault points.
    ///
    /// # Errors
    /// Fails if a startup fault (config list or `FAULT_*` env) is invalid.
    pub fn build(mut self) -> Result<Self> {
        let registry = self.registry.take().unwrap_or_default();

        for request in self.config.bootstrap_faults()? {
            request.apply(&registry)?;
            info!(
                "[{}] bootstrap fault point {} armed",
                self.config.node.name, request.fault_name
            );
        }

        let heartbeat = Heartbeat::new(registry.clone(), &self.config.heartbeat);
        self.node = Some(Arc::new(Node {
            name: self.config.node.name.clone(),
            controller: Arc::new(FaultController::new(registry.clone())),
            registry,
            heartbeat,
            heartbeat_enabled: self.config.heartbeat.enabled,
            shutdown_signal: self.shutdown_signal.clone(),
        }));
        Ok(self)
    }

    /// Launches a Prometheus endpoint on the configured port, if enabled.
    pub fn start_metrics_server(
        self,
        shutdown_signal: watch::Receiver<()>,
    ) -> Self {
        if !self.config.monitoring.prometheus_enabled {
            return self;
        }
        let addr = self.config.monitoring.metrics_address();
        tokio::spawn(async move {
            metrics::start_server(addr, shutdown_signal).await;
        });
        self
    }

    /// Binds the `/inject_fault` control API, if enabled.
    ///
    /// # Errors
    /// Returns an error if the node hasn't been built or binding fails.
    pub fn start_control_server(mut self) -> Result<Self> {
        if !self.config.control.enabled {
            return Ok(self);
        }
        let node = self.node.as_ref().ok_or_else(|| {
            SystemError::ServerBind {
                service: "control",
                addr: self.config.control.listen_address,
                reason: "node has not been built".to_string(),
            }
        })?;
        let bound = http::start_server(
            self.config.control.listen_address,
            node.controller.clone(),
            self.shutdown_signal.clone(),
        )?;
        self.control_address = Some(bound);
        Ok(self)
    }

    /// Address the control server actually bound to (useful with port 0).
    pub fn control_address(&self) -> Option<SocketAddr> {
        self.control_address
    }

    /// Returns the built node instance.
    ///
    /// # Errors
    /// Returns `Error::Fatal` if `build()` hasn't completed.
    pub fn ready(self) -> Result<Arc<Node>> {
        self.node
            .ok_or_else(|| crate::Error::Fatal("node has not been built".to_string()))
    }
}
