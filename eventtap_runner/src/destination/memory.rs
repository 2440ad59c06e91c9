use super::Destination;
use async_trait::async_trait;
use eventtap_core::{Error, Result, TableSpec, UpsertDirective};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;

type Row = serde_json::Map<String, serde_json::Value>;

struct MemoryTable {
    spec: TableSpec,
    rows: BTreeMap<String, Row>,
}

/// In-memory destination for local development and unit tests.
///
/// Rows are keyed by the JSON rendering of their primary key values, so a second
/// upsert with the same key replaces the first.
#[derive(Clone, Default)]
pub struct MemoryDestination {
    tables: Arc<Mutex<HashMap<String, MemoryTable>>>,
}

impl MemoryDestination {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows of `table` ordered by primary key (primarily for tests).
    pub async fn rows(&self, table: &str) -> Vec<Row> {
        let tables = self.tables.lock().await;
        tables
            .get(table)
            .map(|t| t.rows.values().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.lock().await.keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl Destination for MemoryDestination {
    async fn declare_table(&self, spec: &TableSpec) -> Result<()> {
        let mut tables = self.tables.lock().await;
        tables
            .entry(spec.table.clone())
            .or_insert_with(|| MemoryTable {
                spec: spec.clone(),
                rows: BTreeMap::new(),
            });
        Ok(())
    }

    async fn upsert(&self, directive: &UpsertDirective) -> Result<()> {
        let mut tables = self.tables.lock().await;
        let table = tables.get_mut(&directive.table).ok_or_else(|| {
            Error::NotFound(format!("table '{}' was not declared", directive.table))
        })?;
        let key = serde_json::to_string(&directive.key_values(&table.spec)?)
            .map_err(|e| Error::backend("serialize primary key", e))?;
        table.rows.insert(key, directive.fields.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eventtap_core::{ColumnSpec, ColumnType};
    use serde_json::json;

    fn spec() -> TableSpec {
        TableSpec::new(
            "github_events",
            vec!["event_id".to_string()],
            vec![
                ColumnSpec {
                    name: "event_id".to_string(),
                    ty: ColumnType::String,
                },
                ColumnSpec {
                    name: "repo".to_string(),
                    ty: ColumnType::String,
                },
            ],
        )
        .unwrap()
    }

    fn row(id: &str, repo: &str) -> UpsertDirective {
        let mut fields = serde_json::Map::new();
        fields.insert("event_id".to_string(), json!(id));
        fields.insert("repo".to_string(), json!(repo));
        UpsertDirective::new("github_events", fields)
    }

    #[tokio::test]
    async fn same_key_overwrites() {
        let dest = MemoryDestination::new();
        dest.declare_table(&spec()).await.unwrap();
        dest.upsert(&row("1", "a/old")).await.unwrap();
        dest.upsert(&row("2", "a/b")).await.unwrap();
        dest.upsert(&row("1", "a/new")).await.unwrap();

        let rows = dest.rows("github_events").await;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("repo"), Some(&json!("a/new")));
    }

    #[tokio::test]
    async fn undeclared_table_is_rejected() {
        let dest = MemoryDestination::new();
        assert!(matches!(
            dest.upsert(&row("1", "a/b")).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn redeclaring_keeps_rows() {
        let dest = MemoryDestination::new();
        dest.declare_table(&spec()).await.unwrap();
        dest.upsert(&row("1", "a/b")).await.unwrap();
        dest.declare_table(&spec()).await.unwrap();
        assert_eq!(dest.rows("github_events").await.len(), 1);
        assert_eq!(dest.table_names().await, vec!["github_events"]);
    }
}
