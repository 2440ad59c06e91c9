//! Local host for eventtap connectors: drives a sync run and applies its upserts.

pub mod cli;
pub mod destination;
pub mod host;

pub use host::{SyncSummary, sync_once};
