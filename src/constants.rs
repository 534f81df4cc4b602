// -
// Control surface

/// HTTP path segment for the fault injection control API
pub const INJECT_FAULT_PATH: &str = "inject_fault";

// -
// Bootstrap environment variables

/// Name of a fault point to activate at process start
pub const ENV_FAULT_POINT: &str = "FAULT_POINT";
/// `exception`, `sleep` or `marker`; defaults to `exception`
pub const ENV_FAULT_TYPE: &str = "FAULT_TYPE";
pub const ENV_FAULT_START_FROM: &str = "FAULT_START_FROM";
/// `0` is treated as unset
pub const ENV_FAULT_END_AFTER: &str = "FAULT_END_AFTER";
/// Seconds, fractional values allowed
pub const ENV_FAULT_SLEEP_TIME: &str = "FAULT_SLEEP_TIME";

// -
// Configuration

/// Prefix for `FAULT_INJECTOR__SECTION__KEY` overrides
pub(crate) const CONFIG_ENV_PREFIX: &str = "FAULT_INJECTOR";
pub(crate) const CONFIG_ENV_SEPARATOR: &str = "__";

/// Fault point exercised by the built-in heartbeat loop
pub const HEARTBEAT_FAULT_POINT: &str = "heartbeat";
