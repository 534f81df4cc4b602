//! Configuration management for the fault injector process.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Configuration file support (`CONFIG_PATH`)
//! - Environment variable overrides (`FAULT_INJECTOR__SECTION__KEY`)
//! - Component-wise validation
mod bootstrap;
mod control;
mod heartbeat;
mod monitoring;
mod node;
pub use bootstrap::*;
pub use control::*;
pub use heartbeat::*;
pub use monitoring::*;
pub use node::*;

use std::env;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::CONFIG_ENV_PREFIX;
use crate::constants::CONFIG_ENV_SEPARATOR;
use crate::Error;
use crate::FaultRequest;
use crate::Result;

/// Main configuration container
///
/// Merge order:
/// 1. Default values from code implementation
/// 2. Configuration file specified by `CONFIG_PATH`
/// 3. Environment variables (highest priority)
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct FaultInjectorConfig {
    /// Identity and log location of the host process
    #[serde(default)]
    pub node: NodeConfig,
    /// Control surface the test harness talks to
    #[serde(default)]
    pub control: ControlConfig,
    /// Prometheus endpoint
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    /// Instrumented heartbeat loop
    #[serde(default)]
    pub heartbeat: HeartbeatConfig,
    /// Fault points activated at startup
    #[serde(default)]
    pub faults: Vec<FaultRequest>,
}

impl FaultInjectorConfig {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// Callers MUST call `validate()` once all overrides are applied.
    ///
    /// # Examples
    /// ```ignore
    /// std::env::set_var("CONFIG_PATH", "config/postgres0.toml");
    /// std::env::set_var("FAULT_INJECTOR__CONTROL__LISTEN_ADDRESS", "127.0.0.1:8011");
    /// let cfg = FaultInjectorConfig::new()?.validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(env_source());

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Applies additional overrides from file without validation.
    ///
    /// Merging order (later sources override earlier):
    /// 1. Current configuration values
    /// 2. New configuration file
    /// 3. Latest environment variables
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(env_source())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Validates every section and returns the validated instance.
    pub fn validate(self) -> Result<Self> {
        self.node.validate()?;
        self.control.validate()?;
        self.monitoring.validate()?;
        self.heartbeat.validate()?;
        for fault in &self.faults {
            fault.spec().map_err(|e| {
                Error::InvalidConfig(format!("faults entry '{}': {}", fault.fault_name, e))
            })?;
        }
        Ok(self)
    }

    /// Startup faults: the `faults` list followed by the one described by
    /// `FAULT_*` environment variables, if any.
    pub fn bootstrap_faults(&self) -> Result<Vec<FaultRequest>> {
        let mut faults = self.faults.clone();
        if let Some(from_env) = fault_request_from_env()? {
            faults.push(from_env);
        }
        Ok(faults)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(CONFIG_ENV_PREFIX)
        .separator(CONFIG_ENV_SEPARATOR)
        .ignore_empty(true)
        .try_parsing(true)
}
