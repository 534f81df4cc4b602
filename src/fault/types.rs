use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Wire-level fault type tag, as sent by the control surface.
///
/// Serialized lowercase. Every input channel (HTTP body, config file,
/// `FAULT_TYPE`) parses through [`FromStr`], which trims and ignores case.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum FaultType {
    /// Counts hits, never fires
    Marker,
    #[default]
    Exception,
    Sleep,
}

impl FaultType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultType::Marker => "marker",
            FaultType::Exception => "exception",
            FaultType::Sleep => "sleep",
        }
    }
}

impl fmt::Display for FaultType {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FaultType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "marker" => Ok(FaultType::Marker),
            "exception" => Ok(FaultType::Exception),
            "sleep" => Ok(FaultType::Sleep),
            other => Err(Error::InvalidParameters(format!("unknown fault type '{}'", other))),
        }
    }
}

impl TryFrom<String> for FaultType {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// Unvalidated activation parameters.
///
/// Which fields are required depends on the [`FaultType`]; see
/// [`FaultSpec::new`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FaultParams {
    pub start_from: Option<u64>,
    pub end_after: Option<u64>,
    pub sleep_duration: Option<Duration>,
}

impl FaultParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_from(
        mut self,
        hit: u64,
    ) -> Self {
        self.start_from = Some(hit);
        self
    }

    pub fn end_after(
        mut self,
        hit: u64,
    ) -> Self {
        self.end_after = Some(hit);
        self
    }

    pub fn sleep(
        mut self,
        duration: Duration,
    ) -> Self {
        self.sleep_duration = Some(duration);
        self
    }
}

/// Validated fault behavior. Kind-specific data lives in the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    Marker,
    Exception,
    Sleep(Duration),
}

impl FaultKind {
    pub fn new(
        fault_type: FaultType,
        sleep_duration: Option<Duration>,
    ) -> Result<Self> {
        match (fault_type, sleep_duration) {
            (FaultType::Sleep, None) => Err(Error::InvalidParameters(
                "No sleep_time provided for fault point of type sleep".into(),
            )),
            (FaultType::Sleep, Some(d)) if d.is_zero() => Err(Error::InvalidParameters(
                "sleep_time must be greater than zero".into(),
            )),
            (FaultType::Sleep, Some(d)) => Ok(FaultKind::Sleep(d)),
            (other, Some(_)) => Err(Error::InvalidParameters(format!(
                "sleep_time only applies to sleep faults, got type {}",
                other
            ))),
            (FaultType::Marker, None) => Ok(FaultKind::Marker),
            (FaultType::Exception, None) => Ok(FaultKind::Exception),
        }
    }

    pub fn fault_type(&self) -> FaultType {
        match self {
            FaultKind::Marker => FaultType::Marker,
            FaultKind::Exception => FaultType::Exception,
            FaultKind::Sleep(_) => FaultType::Sleep,
        }
    }

    pub fn sleep_duration(&self) -> Option<Duration> {
        match self {
            FaultKind::Sleep(d) => Some(*d),
            _ => None,
        }
    }
}

/// Inclusive range of 1-based hit counts during which a fault fires.
///
/// An absent `start_from` means the first hit; an absent `end_after` means
/// the window never closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiringWindow {
    start_from: u64,
    end_after: Option<u64>,
}

impl Default for FiringWindow {
    fn default() -> Self {
        Self {
            start_from: 1,
            end_after: None,
        }
    }
}

impl FiringWindow {
    pub fn new(
        start_from: Option<u64>,
        end_after: Option<u64>,
    ) -> Result<Self> {
        let start_from = start_from.unwrap_or(1);
        if start_from == 0 {
            return Err(Error::InvalidParameters(
                "start_from is 1-based and must be at least 1".into(),
            ));
        }
        if let Some(end_after) = end_after {
            if start_from > end_after {
                return Err(Error::InvalidParameters(format!(
                    "start_from ({}) must not exceed end_after ({})",
                    start_from, end_after
                )));
            }
        }
        Ok(Self {
            start_from,
            end_after,
        })
    }

    pub fn start_from(&self) -> u64 {
        self.start_from
    }

    pub fn end_after(&self) -> Option<u64> {
        self.end_after
    }

    pub fn contains(
        &self,
        hit: u64,
    ) -> bool {
        hit >= self.start_from && self.end_after.map_or(true, |end| hit <= end)
    }

    /// The window closed before `hit`; later hits can never fire again.
    pub fn is_exhausted(
        &self,
        hit: u64,
    ) -> bool {
        self.end_after.map_or(false, |end| hit > end)
    }
}

/// A fully validated activation: what to do, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultSpec {
    pub kind: FaultKind,
    pub window: FiringWindow,
}

impl FaultSpec {
    pub fn new(
        fault_type: FaultType,
        params: FaultParams,
    ) -> Result<Self> {
        let kind = FaultKind::new(fault_type, params.sleep_duration)?;
        let window = FiringWindow::new(params.start_from, params.end_after)?;
        Ok(Self { kind, window })
    }
}

/// What an instrumented call site must do after calling `hit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    /// Fail the surrounding operation through its normal error path
    RaiseFault,
    /// Block for the given duration, then proceed
    Delay(Duration),
}

impl Outcome {
    pub fn is_fault(&self) -> bool {
        !matches!(self, Outcome::Continue)
    }
}
