//! Control surface the test harness uses to arm and disarm fault points.
//!
//! [`FaultController`] maps transport-neutral [`ControlCommand`]s onto the
//! registry. The `http` submodule exposes it as a small REST API under
//! `/inject_fault`.

pub mod http;
mod request;
pub use request::*;

#[cfg(test)]
mod controller_test;

use std::sync::Arc;

use autometrics::autometrics;
use serde::Deserialize;
use serde::Serialize;
use tracing::warn;

use crate::FaultPointInfo;
use crate::FaultRegistry;
use crate::Result;
use crate::API_SLO;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ControlCommand {
    Inject(FaultRequest),
    Deactivate { fault_name: String },
    DeactivateAll,
    Query { fault_name: String },
    QueryAll,
    Describe,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ControlResponse {
    Ok,
    Deactivated { fault_name: String, was_active: bool },
    Status { fault_name: String, active: bool },
    Active { fault_names: Vec<String> },
    Points { points: Vec<FaultPointInfo> },
}

#[derive(Debug, Clone)]
pub struct FaultController {
    registry: Arc<FaultRegistry>,
}

impl FaultController {
    pub fn new(registry: Arc<FaultRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<FaultRegistry> {
        &self.registry
    }

    /// Only `Inject` can fail, and only on invalid parameters; the registry
    /// is left unchanged in that case.
    #[autometrics(objective = API_SLO)]
    pub fn handle(
        &self,
        command: ControlCommand,
    ) -> Result<ControlResponse> {
        match command {
            ControlCommand::Inject(request) => {
                if let Err(e) = request.apply(&self.registry) {
                    warn!("rejected fault point {}: {}", request.fault_name, e);
                    return Err(e);
                }
                Ok(ControlResponse::Ok)
            }
            ControlCommand::Deactivate { fault_name } => {
                let was_active = self.registry.deactivate(&fault_name);
                Ok(ControlResponse::Deactivated {
                    fault_name,
                    was_active,
                })
            }
            ControlCommand::DeactivateAll => {
                self.registry.deactivate_all();
                Ok(ControlResponse::Ok)
            }
            ControlCommand::Query { fault_name } => {
                let active = self.registry.is_active(&fault_name);
                Ok(ControlResponse::Status { fault_name, active })
            }
            ControlCommand::QueryAll => Ok(ControlResponse::Active {
                fault_names: self.registry.list_active().into_iter().collect(),
            }),
            ControlCommand::Describe => Ok(ControlResponse::Points {
                points: self.registry.snapshot(),
            }),
        }
    }
}
