//! Periodic instrumented cycle.
//!
//! Stands in for the host controller's HA loop: every tick reaches the
//! configured fault point through [`FaultRegistry::inject`], so a harness can
//! make cycles fail or stall and observe how the process copes. Injected
//! failures end the current cycle only; the loop keeps running until shutdown.

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::FaultRegistry;
use crate::HeartbeatConfig;
use crate::Result;

#[derive(Debug, Default)]
pub struct HeartbeatStats {
    ticks: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
}

impl HeartbeatStats {
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    pub fn succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::Acquire)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
pub struct Heartbeat {
    registry: Arc<FaultRegistry>,
    fault_point: String,
    interval: Duration,
    stats: Arc<HeartbeatStats>,
}

impl Heartbeat {
    pub fn new(
        registry: Arc<FaultRegistry>,
        config: &HeartbeatConfig,
    ) -> Self {
        Self {
            registry,
            fault_point: config.fault_point.clone(),
            interval: Duration::from_millis(config.interval_ms),
            stats: Arc::new(HeartbeatStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<HeartbeatStats> {
        self.stats.clone()
    }

    /// One cycle. Returns the injected failure, if any.
    pub async fn tick(&self) -> Result<()> {
        self.stats.ticks.fetch_add(1, Ordering::AcqRel);
        match self.registry.inject(&self.fault_point).await {
            Ok(()) => {
                self.stats.succeeded.fetch_add(1, Ordering::AcqRel);
                debug!("heartbeat cycle {} completed", self.stats.ticks());
                Ok(())
            }
            Err(e) => {
                self.stats.failed.fetch_add(1, Ordering::AcqRel);
                warn!("heartbeat cycle {} failed: {}", self.stats.ticks(), e);
                Err(e)
            }
        }
    }

    /// Runs cycles every `interval` until `shutdown_signal` fires.
    pub async fn run(
        &self,
        mut shutdown_signal: watch::Receiver<()>,
    ) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown_signal.changed() => {
                    info!("heartbeat loop stopped after {} cycles", self.stats.ticks());
                    return;
                }
                _ = interval.tick() => {
                    let _ = self.tick().await;
                }
            }
        }
    }
}
