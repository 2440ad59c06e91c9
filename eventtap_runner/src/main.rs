use clap::Parser;
use eventtap_core::{Connector, ConnectorConfig, SyncState, TracingLogger};
use eventtap_integrations::GithubEventsConnector;
use eventtap_runner::cli::{Cli, Commands, redacted_config};
use eventtap_runner::destination::SqliteDestination;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    eventtap_core::o11y::init_global()?;
    let cli = Cli::parse();
    let connector = GithubEventsConnector::new()?;

    match cli.command {
        Commands::Schema { config } => {
            let configuration = ConnectorConfig::from_json_file(&config)?;
            let tables = connector.schema(&configuration);
            println!("{}", serde_json::to_string_pretty(&tables)?);
        }
        Commands::Sync { config, db, state } => {
            let configuration = ConnectorConfig::from_json_file(&config)?;
            let state = match state {
                Some(path) => {
                    let raw = tokio::fs::read_to_string(&path).await?;
                    SyncState::new(serde_json::from_str(&raw)?)
                }
                None => SyncState::empty(),
            };

            let destination = SqliteDestination::new(&db).await?;
            let logger = Arc::new(TracingLogger::for_connector(connector.id()));
            let summary =
                eventtap_runner::sync_once(&connector, &destination, configuration, state, logger)
                    .await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Config { config } => {
            let configuration = ConnectorConfig::from_json_file(&config)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&redacted_config(&configuration))?
            );
        }
    }

    Ok(())
}
