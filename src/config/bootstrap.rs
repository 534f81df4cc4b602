//! Single fault point described by `FAULT_*` environment variables.
//!
//! Lets a harness arm a fault before the process starts, when no control
//! channel is reachable yet:
//!
//! ```text
//! FAULT_POINT=dcs_write FAULT_TYPE=exception FAULT_START_FROM=3 FAULT_END_AFTER=4
//! ```

use std::env;
use std::str::FromStr;

use crate::constants::ENV_FAULT_END_AFTER;
use crate::constants::ENV_FAULT_POINT;
use crate::constants::ENV_FAULT_SLEEP_TIME;
use crate::constants::ENV_FAULT_START_FROM;
use crate::constants::ENV_FAULT_TYPE;
use crate::Error;
use crate::FaultRequest;
use crate::FaultType;
use crate::Result;

/// Reads the bootstrap fault from the environment.
///
/// Returns `Ok(None)` when `FAULT_POINT` is unset or blank. `FAULT_END_AFTER=0`
/// is treated as unset.
pub fn fault_request_from_env() -> Result<Option<FaultRequest>> {
    let Some(fault_name) = read_var(ENV_FAULT_POINT) else {
        return Ok(None);
    };

    let fault_type = match read_var(ENV_FAULT_TYPE) {
        Some(t) => FaultType::from_str(&t)?,
        None => FaultType::default(),
    };
    let start_from = parse_var::<u64>(ENV_FAULT_START_FROM)?;
    let end_after = parse_var::<u64>(ENV_FAULT_END_AFTER)?.filter(|n| *n > 0);
    let sleep_time = parse_var::<f64>(ENV_FAULT_SLEEP_TIME)?;

    let request = FaultRequest {
        fault_name,
        fault_type,
        start_from,
        end_after,
        sleep_time,
    };
    request.spec()?;
    Ok(Some(request))
}

fn read_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T: FromStr>(key: &str) -> Result<Option<T>> {
    match read_var(key) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::InvalidConfig(format!("{} has invalid value '{}'", key, raw))),
    }
}
