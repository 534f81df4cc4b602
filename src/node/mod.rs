//! Process assembly: one registry shared by the control surface, the metrics
//! endpoint and the instrumented heartbeat loop.

mod builder;
mod heartbeat;
pub use builder::*;
pub use heartbeat::*;

#[cfg(test)]
mod builder_test;

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use crate::FaultController;
use crate::FaultRegistry;

#[derive(Debug)]
pub struct Node {
    pub name: String,
    pub registry: Arc<FaultRegistry>,
    pub controller: Arc<FaultController>,
    pub heartbeat: Heartbeat,
    pub(crate) heartbeat_enabled: bool,
    pub(crate) shutdown_signal: watch::Receiver<()>,
}

impl Node {
    /// Runs until the shutdown signal fires.
    pub async fn run(&self) {
        info!("[{}] node running", self.name);
        if self.heartbeat_enabled {
            self.heartbeat.run(self.shutdown_signal.clone()).await;
        } else {
            let mut shutdown = self.shutdown_signal.clone();
            let _ = shutdown.changed().await;
        }
        info!("[{}] node stopped", self.name);
    }
}
