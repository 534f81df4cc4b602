//! Process-wide table of activated fault points.
//!
//! The registry is constructed explicitly and shared through an `Arc` with the
//! control surface and every instrumented call site. A single mutex guards the
//! whole table, so activation, deactivation and the increment-then-check in
//! [`FaultRegistry::hit`] are serialized with respect to each other. The
//! active-points gauge is written under the lock so it always matches the
//! table; sleeping, logging and per-hit counters happen after release.

use std::collections::BTreeSet;
use std::collections::HashMap;

use parking_lot::Mutex;
use prometheus::IntGauge;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::info;

use super::FaultKind;
use super::FaultParams;
use super::FaultSpec;
use super::FaultType;
use super::Outcome;
use crate::metrics::ACTIVE_FAULT_POINTS;
use crate::metrics::FAULTS_TRIGGERED;
use crate::metrics::FAULT_POINT_HITS;
use crate::Error;
use crate::Result;

/// Fault point names are used verbatim as URL path segments, so they are
/// limited to characters that never need percent-encoding.
fn validate_fault_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidParameters("fault point name must not be empty".into()));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
    {
        return Err(Error::InvalidParameters(format!(
            "fault point name '{}' contains '{}'; only ASCII letters, digits, '_', '-' and '.' are allowed",
            name, c
        )));
    }
    Ok(())
}

/// One activated fault at one named point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultDescriptor {
    pub name: String,
    pub spec: FaultSpec,
    pub hit_count: u64,
}

impl FaultDescriptor {
    fn new(
        name: String,
        spec: FaultSpec,
    ) -> Self {
        Self {
            name,
            spec,
            hit_count: 0,
        }
    }

    /// Outcome for the current `hit_count`. Caller increments first.
    fn evaluate(&self) -> Outcome {
        if !self.spec.window.contains(self.hit_count) {
            return Outcome::Continue;
        }
        match self.spec.kind {
            FaultKind::Marker => Outcome::Continue,
            FaultKind::Exception => Outcome::RaiseFault,
            FaultKind::Sleep(d) => Outcome::Delay(d),
        }
    }
}

/// Serializable view of a descriptor, as returned by `GET /inject_fault`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FaultPointInfo {
    pub fault_name: String,
    pub fault_type: FaultType,
    pub start_from: u64,
    pub end_after: Option<u64>,
    /// Seconds
    pub sleep_time: Option<f64>,
    pub hits: u64,
    /// Firing window has closed; the point stays registered until deactivated
    pub expired: bool,
}

impl From<&FaultDescriptor> for FaultPointInfo {
    fn from(d: &FaultDescriptor) -> Self {
        Self {
            fault_name: d.name.clone(),
            fault_type: d.spec.kind.fault_type(),
            start_from: d.spec.window.start_from(),
            end_after: d.spec.window.end_after(),
            sleep_time: d.spec.kind.sleep_duration().map(|s| s.as_secs_f64()),
            hits: d.hit_count,
            expired: d.spec.window.is_exhausted(d.hit_count),
        }
    }
}

#[derive(Debug)]
pub struct FaultRegistry {
    points: Mutex<HashMap<String, FaultDescriptor>>,
    /// Number of registered points; the process-wide gauge unless overridden
    active_gauge: IntGauge,
}

impl Default for FaultRegistry {
    fn default() -> Self {
        Self::with_active_gauge(ACTIVE_FAULT_POINTS.clone())
    }
}

impl FaultRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_active_gauge(active_gauge: IntGauge) -> Self {
        Self {
            points: Mutex::new(HashMap::new()),
            active_gauge,
        }
    }

    /// Inserts or replaces the descriptor for `name`, resetting its hit count.
    ///
    /// # Errors
    /// `Error::InvalidParameters` if the name is empty or uses characters other
    /// than ASCII letters, digits, `_`, `-` and `.`, or if the parameters do
    /// not form a valid [`FaultSpec`]. The table is left untouched.
    pub fn activate(
        &self,
        name: &str,
        fault_type: FaultType,
        params: FaultParams,
    ) -> Result<()> {
        let spec = FaultSpec::new(fault_type, params)?;
        self.activate_spec(name, spec)
    }

    /// Same as [`FaultRegistry::activate`] for an already validated spec.
    pub fn activate_spec(
        &self,
        name: &str,
        spec: FaultSpec,
    ) -> Result<()> {
        validate_fault_name(name)?;

        let replaced = {
            let mut points = self.points.lock();
            let replaced = points
                .insert(name.to_string(), FaultDescriptor::new(name.to_string(), spec))
                .is_some();
            self.active_gauge.set(points.len() as i64);
            replaced
        };

        if replaced {
            info!("Replaced fault point {} with type {}", name, spec.kind.fault_type());
        } else {
            info!("Activated fault point {} of type {}", name, spec.kind.fault_type());
        }
        Ok(())
    }

    /// Removes the descriptor for `name`. Returns `false` if none existed.
    pub fn deactivate(
        &self,
        name: &str,
    ) -> bool {
        let removed = {
            let mut points = self.points.lock();
            let removed = points.remove(name);
            self.active_gauge.set(points.len() as i64);
            removed
        };

        match removed {
            Some(d) => {
                info!("Deactivated fault point {} of type {}", name, d.spec.kind.fault_type());
                true
            }
            None => false,
        }
    }

    pub fn deactivate_all(&self) {
        let cleared = {
            let mut points = self.points.lock();
            let n = points.len();
            points.clear();
            self.active_gauge.set(0);
            n
        };
        info!("Deactivated all fault points ({} cleared)", cleared);
    }

    /// True iff a descriptor exists, whether or not it is inside its window.
    pub fn is_active(
        &self,
        name: &str,
    ) -> bool {
        self.points.lock().contains_key(name)
    }

    pub fn list_active(&self) -> BTreeSet<String> {
        self.points.lock().keys().cloned().collect()
    }

    pub fn hit_count(
        &self,
        name: &str,
    ) -> Option<u64> {
        self.points.lock().get(name).map(|d| d.hit_count)
    }

    /// Detailed listing, ordered by name.
    pub fn snapshot(&self) -> Vec<FaultPointInfo> {
        let mut infos: Vec<FaultPointInfo> =
            self.points.lock().values().map(FaultPointInfo::from).collect();
        infos.sort_by(|a, b| a.fault_name.cmp(&b.fault_name));
        infos
    }

    /// Instrumentation hook. Counts the hit, then decides what the call site
    /// must do. Never fails.
    pub fn hit(
        &self,
        name: &str,
    ) -> Outcome {
        let (outcome, hits, fault_type) = {
            let mut points = self.points.lock();
            let Some(descriptor) = points.get_mut(name) else {
                return Outcome::Continue;
            };
            descriptor.hit_count = descriptor.hit_count.saturating_add(1);
            (
                descriptor.evaluate(),
                descriptor.hit_count,
                descriptor.spec.kind.fault_type(),
            )
        };

        FAULT_POINT_HITS.with_label_values(&[name]).inc();
        if outcome.is_fault() {
            FAULTS_TRIGGERED
                .with_label_values(&[name, fault_type.as_str()])
                .inc();
            info!("Fault {} of type {} triggered (hit {})", name, fault_type, hits);
        } else {
            debug!("fault point {} hit {} passed through", name, hits);
        }
        outcome
    }

    /// Async call-site helper: raises `Error::InjectedFailure` or sleeps on the
    /// tokio timer according to the outcome of [`FaultRegistry::hit`].
    pub async fn inject(
        &self,
        name: &str,
    ) -> Result<()> {
        match self.hit(name) {
            Outcome::Continue => Ok(()),
            Outcome::RaiseFault => Err(Error::InjectedFailure(name.to_string())),
            Outcome::Delay(d) => {
                tokio::time::sleep(d).await;
                Ok(())
            }
        }
    }

    /// Blocking counterpart of [`FaultRegistry::inject`] for synchronous code.
    pub fn inject_blocking(
        &self,
        name: &str,
    ) -> Result<()> {
        match self.hit(name) {
            Outcome::Continue => Ok(()),
            Outcome::RaiseFault => Err(Error::InjectedFailure(name.to_string())),
            Outcome::Delay(d) => {
                std::thread::sleep(d);
                Ok(())
            }
        }
    }
}
