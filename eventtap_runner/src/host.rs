use crate::destination::Destination;
use chrono::{DateTime, Utc};
use eventtap_core::{
    Connector, ConnectorConfig, Result, RunContext, RunLogger, RunStatus, SyncState,
};
use futures_util::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Outcome of one host-driven sync.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncSummary {
    pub run_id: Uuid,
    pub connector_id: &'static str,
    pub status: RunStatus,
    pub upserts_applied: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Declare the connector's tables, then apply every directive of one `update` run in order.
///
/// A connector abort is not a host error: it shows up as `RunStatus::Aborted` in the
/// summary, and directives applied before it stay applied. Destination failures are
/// returned as errors.
#[tracing::instrument(level = "info", skip_all, fields(connector = connector.id()))]
pub async fn sync_once(
    connector: &dyn Connector,
    destination: &dyn Destination,
    configuration: ConnectorConfig,
    state: SyncState,
    logger: Arc<dyn RunLogger>,
) -> Result<SyncSummary> {
    for spec in connector.schema(&configuration) {
        destination.declare_table(&spec).await?;
    }

    let ctx = RunContext::new(logger);
    let mut run = connector.update(ctx.clone(), configuration, state);

    let mut upserts_applied = 0u64;
    while let Some(directive) = run.next().await {
        destination.upsert(&directive).await?;
        upserts_applied += 1;
    }

    let summary = SyncSummary {
        run_id: ctx.run_id(),
        connector_id: connector.id(),
        status: run.status().clone(),
        upserts_applied,
        started_at: ctx.started_at(),
        finished_at: Utc::now(),
    };
    tracing::info!(
        run_id = %summary.run_id,
        status = ?summary.status,
        upserts_applied,
        "sync finished"
    );
    Ok(summary)
}
