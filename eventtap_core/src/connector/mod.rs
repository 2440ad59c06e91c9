//! Host-framework contract for source connectors.
//!
//! A connector:
//! - Declares its destination tables once (`schema`)
//! - Produces a lazy stream of upsert directives per run (`update`)
//! - Logs through the `RunLogger` carried by its `RunContext`
//!
//! Faults inside a run are caught by `UpdateRun`, which logs them and ends the run.

pub mod models;
pub mod run;
pub mod traits;
