pub mod logger;

use crate::{Error, Result};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub use logger::{LogEntry, LogLevel, MemoryLogger, RunLogger, TracingLogger};

/// Install the process-wide subscriber: `RUST_LOG` filter (default `info`) and JSON lines.
///
/// Only binaries call this. Connector logic never logs through the global
/// subscriber directly; it goes through the `RunLogger` in its `RunContext`.
#[tracing::instrument(level = "info", skip_all)]
pub fn init_global() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt = tracing_subscriber::fmt::layer()
        .json()
        .with_target(true)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt)
        .try_init()
        .map_err(|e| Error::BackendMessage(format!("tracing already initialized: {e}")))
}
