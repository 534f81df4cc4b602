//! Named fault points for exercising the failure paths of a Postgres
//! high-availability controller.
//!
//! A [`FaultRegistry`] is created once per process and shared with the
//! control surface ([`FaultController`], `/inject_fault`) and every
//! instrumented call site. Call sites ask [`FaultRegistry::hit`] what to do;
//! the harness arms and disarms points through the controller.

mod config;
pub mod constants;
mod control;
mod errors;
mod fault;
pub mod metrics;
mod node;
pub mod utils;

pub use config::*;
pub use control::*;
pub use errors::*;
pub use fault::*;
pub use node::*;

//-----------------------------------------------------------
// Autometrics
/// autometrics: https://docs.autometrics.dev/rust/adding-alerts-and-slos
use autometrics::objectives::Objective;
use autometrics::objectives::ObjectiveLatency;
use autometrics::objectives::ObjectivePercentile;
const API_SLO: Objective = Objective::new("fault_control")
    .success_rate(ObjectivePercentile::P99_9)
    .latency(ObjectiveLatency::Ms10, ObjectivePercentile::P99);
