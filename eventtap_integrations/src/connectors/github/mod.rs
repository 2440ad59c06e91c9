//! GitHub repository events connector.
//!
//! Polls `GET /repos/{owner}/{repo}/events` for every repository in `repo_list`
//! and upserts one `github_events` row per feed item. Every run refetches the
//! current feed page from scratch; the host state is accepted but not read.

pub mod client;
pub mod settings;
pub mod transform;

mod test_support;

use client::EventsClient;
use eventtap_core::{
    ColumnSpec, ColumnType, Connector, ConnectorConfig, Error, Result, RunContext, RunLogger,
    SyncState, TableSpec, UpdateRun, UpsertDirective,
};
use futures_util::Stream;
use reqwest::Client;
use settings::{EntityRef, FailurePolicy, GithubEventsSettings, parse_entity_list};
use std::sync::Arc;
use tracing::{Instrument, Span};
use transform::{EVENTS_TABLE, to_records};

pub use settings::DEFAULT_API_BASE;

#[derive(Clone)]
pub struct GithubEventsConnector {
    http: Client,
}

impl GithubEventsConnector {
    pub fn new() -> Result<Self> {
        let http = Client::builder().build().map_err(Error::backend_reqwest)?;
        Ok(Self { http })
    }

    pub fn with_client(http: Client) -> Self {
        Self { http }
    }

    pub fn events_table() -> TableSpec {
        let column = |name: &str, ty| ColumnSpec {
            name: name.to_string(),
            ty,
        };
        TableSpec {
            table: EVENTS_TABLE.to_string(),
            primary_key: vec!["event_id".to_string()],
            columns: vec![
                column("event_id", ColumnType::String),
                column("payload", ColumnType::Json),
                column("created_at", ColumnType::String),
                column("repo", ColumnType::String),
            ],
        }
    }
}

impl Connector for GithubEventsConnector {
    fn id(&self) -> &'static str {
        "github_events"
    }

    fn schema(&self, _configuration: &ConnectorConfig) -> Vec<TableSpec> {
        vec![Self::events_table()]
    }

    fn update(
        &self,
        ctx: RunContext,
        configuration: ConnectorConfig,
        _state: SyncState,
    ) -> UpdateRun {
        let settings = GithubEventsSettings::from_config(&configuration);
        let logger = ctx.logger().clone();

        let Some(repo_list) = settings.repo_list.as_deref() else {
            logger.severe("No repositories configured");
            return UpdateRun::empty(&ctx);
        };
        let repos = parse_entity_list(repo_list);
        if repos.is_empty() {
            logger.severe("No valid repositories found in configuration");
            return UpdateRun::empty(&ctx);
        }

        let client = EventsClient::new(
            self.http.clone(),
            settings.api_base.clone(),
            settings.github_token.clone(),
        );
        let span = tracing::info_span!("github_events.update", run_id = %ctx.run_id());
        UpdateRun::guarded(
            &ctx,
            sync_repositories(client, repos, settings.failure_policy, logger, span),
        )
    }
}

/// Fetch, transform and emit each repository in order, one at a time.
fn sync_repositories(
    client: EventsClient,
    repos: Vec<EntityRef>,
    policy: FailurePolicy,
    logger: Arc<dyn RunLogger>,
    span: Span,
) -> impl Stream<Item = Result<UpsertDirective>> + Send + 'static {
    async_stream::try_stream! {
        for repo in repos {
            logger.info(&format!("Checking repository: {repo}"));

            let fetched = client
                .list_repo_events(&repo, logger.as_ref())
                .instrument(span.clone())
                .await;
            let events = match fetched {
                Ok(events) => events,
                Err(e) if policy == FailurePolicy::Isolate => {
                    logger.severe(&format!("Error occurred for {repo}: {e}"));
                    continue;
                }
                Err(e) => Err(e)?,
            };

            let records = to_records(events, &repo);
            logger.info(&format!("Retrieved {} events", records.len()));
            if let Some(latest) = records.first() {
                logger.info(&format!("Most recent event: {}", latest.created_at));
            }

            for record in records {
                yield record.into_upsert();
            }
        }
    }
}
