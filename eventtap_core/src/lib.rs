//! eventtap core library: the connector contract and shared models used across crates.

pub mod connector;
pub mod error;
pub mod o11y;

pub use connector::models::{
    ColumnSpec, ColumnType, ConnectorConfig, RunStatus, SyncState, TableSpec, UpsertDirective,
};
pub use connector::run::{RunContext, UpdateRun};
pub use connector::traits::Connector;
pub use error::{Error, Result};
pub use o11y::logger::{LogEntry, LogLevel, MemoryLogger, RunLogger, TracingLogger};
