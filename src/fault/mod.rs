//! Named fault points.
//!
//! Production code marks a location with a name and asks the
//! [`FaultRegistry`] what to do every time execution reaches it:
//!
//! ```ignore
//! match registry.hit("dcs_write") {
//!     Outcome::Continue => {}
//!     Outcome::RaiseFault => return Err(Error::InjectedFailure("dcs_write".into())),
//!     Outcome::Delay(d) => tokio::time::sleep(d).await,
//! }
//! ```
//!
//! or, equivalently, `registry.inject("dcs_write").await?`.

mod registry;
mod types;

pub use registry::*;
pub use types::*;
