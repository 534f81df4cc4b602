use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::FaultParams;
use crate::FaultRegistry;
use crate::FaultSpec;
use crate::FaultType;
use crate::Result;

/// Activation request as it arrives from the harness (HTTP body, config file
/// or environment).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FaultRequest {
    pub fault_name: String,

    #[serde(default)]
    pub fault_type: FaultType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_from: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_after: Option<u64>,

    /// Seconds; only valid for `sleep`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_time: Option<f64>,
}

impl FaultRequest {
    pub fn new(
        fault_name: impl Into<String>,
        fault_type: FaultType,
    ) -> Self {
        Self {
            fault_name: fault_name.into(),
            fault_type,
            start_from: None,
            end_after: None,
            sleep_time: None,
        }
    }

    pub fn params(&self) -> Result<FaultParams> {
        let sleep_duration = match self.sleep_time {
            None => None,
            Some(secs) => Some(Duration::try_from_secs_f64(secs).map_err(|_| {
                Error::InvalidParameters(format!("sleep_time {} is not a valid duration", secs))
            })?),
        };
        Ok(FaultParams {
            start_from: self.start_from,
            end_after: self.end_after,
            sleep_duration,
        })
    }

    pub fn spec(&self) -> Result<FaultSpec> {
        FaultSpec::new(self.fault_type, self.params()?)
    }

    pub fn apply(
        &self,
        registry: &FaultRegistry,
    ) -> Result<()> {
        registry.activate_spec(&self.fault_name, self.spec()?)
    }
}
