//! Infrastructure shared by the apidocs crates.
//!
//! - [`TracingSetup`] installs the `tracing` subscriber.
//! - [`Clock`] abstracts time so expiry logic is testable.
//! - [`Settings`] reads runtime configuration from the environment.

mod settings;
mod time;
mod tracing_setup;

pub use settings::{ConfigError, Settings};
#[cfg(any(test, feature = "test-utils"))]
pub use time::MockClock;
pub use time::{Clock, ClockProvider};
pub use tracing_setup::{TracingFormat, TracingSetup};
