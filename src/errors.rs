//! Fault injector error hierarchy
//!
//! Validation failures are raised by activation and configuration loading only.
//! The `hit` path never produces an error of its own; `InjectedFailure` is the
//! intended effect of an exception fault and is surfaced by call sites through
//! their normal error channel.

use std::net::SocketAddr;

use config::ConfigError;
use tokio::task::JoinError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed activation request (bad window, missing sleep duration, ...)
    #[error("Invalid fault parameters: {0}")]
    InvalidParameters(String),

    /// Raised on purpose by an exception fault point
    #[error("Exception raised by fault point {0}")]
    InjectedFailure(String),

    /// Configuration source could not be read or deserialized
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Configuration parsed but failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Infrastructure-level failures (IO, sockets, background tasks)
    #[error(transparent)]
    System(#[from] SystemError),

    /// Unrecoverable failures requiring process termination
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to bind {service} server on {addr}: {reason}")]
    ServerBind {
        service: &'static str,
        addr: SocketAddr,
        reason: String,
    },

    #[error("Background task failed: {0}")]
    TaskJoin(#[from] JoinError),

    #[error("Failed to send shutdown signal: {0}")]
    SignalSenderClosed(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::System(SystemError::Io(e))
    }
}

impl Error {
    /// True if this error was produced by an activated exception fault point.
    pub fn is_injected(&self) -> bool {
        matches!(self, Error::InjectedFailure(_))
    }
}
