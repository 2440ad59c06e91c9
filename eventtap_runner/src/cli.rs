use clap::{Parser, Subcommand};
use eventtap_core::ConnectorConfig;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "eventtap",
    version,
    about = "Sync GitHub repository events into a local table"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the declared destination tables as JSON.
    Schema {
        /// Connector configuration file (flat JSON object).
        #[arg(long, env = "EVENTTAP_CONFIG", default_value = "configuration.json")]
        config: PathBuf,
    },

    /// Run one sync and apply its upserts to a SQLite database.
    Sync {
        /// Connector configuration file (flat JSON object).
        #[arg(long, env = "EVENTTAP_CONFIG", default_value = "configuration.json")]
        config: PathBuf,

        /// SQLite database file receiving the upserts.
        #[arg(long, env = "EVENTTAP_DB", default_value = "warehouse.db")]
        db: PathBuf,

        /// Optional JSON state file handed to the connector.
        #[arg(long)]
        state: Option<PathBuf>,
    },

    /// Print the configuration with secrets redacted.
    Config {
        /// Connector configuration file (flat JSON object).
        #[arg(long, env = "EVENTTAP_CONFIG", default_value = "configuration.json")]
        config: PathBuf,
    },
}

fn is_sensitive_key(k: &str) -> bool {
    let k = k.to_ascii_lowercase();
    k.contains("token")
        || k.contains("secret")
        || k.contains("password")
        || k.contains("api_key")
        || k.contains("authorization")
}

fn redact(s: &str) -> String {
    if s.len() <= 8 || !s.is_ascii() {
        return "***".to_string();
    }
    format!("{}***{}", &s[..4], &s[s.len() - 4..])
}

/// Configuration as a JSON object with credential-looking values masked.
pub fn redacted_config(configuration: &ConnectorConfig) -> serde_json::Value {
    let obj: serde_json::Map<String, serde_json::Value> = configuration
        .iter()
        .map(|(k, v)| {
            let shown = if is_sensitive_key(k) {
                redact(v)
            } else {
                v.to_string()
            };
            (k.to_string(), serde_json::Value::String(shown))
        })
        .collect();
    serde_json::Value::Object(obj)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_sync_arguments() {
        let cli = Cli::parse_from([
            "eventtap", "sync", "--config", "c.json", "--db", "w.db", "--state", "s.json",
        ]);
        match cli.command {
            Commands::Sync { config, db, state } => {
                assert_eq!(config, PathBuf::from("c.json"));
                assert_eq!(db, PathBuf::from("w.db"));
                assert_eq!(state, Some(PathBuf::from("s.json")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn masks_token_but_not_repo_list() {
        let cfg = ConnectorConfig::new()
            .with("github_token", "ghp_abcdefghijklmnop")
            .with("repo_list", "octocat/Hello-World");
        let v = redacted_config(&cfg);
        assert_eq!(v["github_token"], "ghp_***mnop");
        assert_eq!(v["repo_list"], "octocat/Hello-World");

        let short = redacted_config(&ConnectorConfig::new().with("github_token", "abc"));
        assert_eq!(short["github_token"], "***");
    }
}
