use crate::connector::models::{ConnectorConfig, SyncState, TableSpec};
use crate::connector::run::{RunContext, UpdateRun};

/// A connector declares its destination tables and produces upserts for one sync run.
///
/// Connector implementations live in `eventtap_integrations` or customer code; the
/// host owns scheduling, checkpointing and the destination writes.
pub trait Connector: Send + Sync {
    /// Connector identifier (stable, used in logs and by hosts).
    fn id(&self) -> &'static str;

    /// Static table declarations, read once by the host before any `update`.
    fn schema(&self, configuration: &ConnectorConfig) -> Vec<TableSpec>;

    /// Start one run. The returned stream is lazy, finite and not restartable.
    fn update(
        &self,
        ctx: RunContext,
        configuration: ConnectorConfig,
        state: SyncState,
    ) -> UpdateRun;
}
