//! SQLite-backed destination.
//!
//! Used by the `eventtap sync` command as a local warehouse. Every column is stored
//! as TEXT; JSON columns hold the serialized value.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use eventtap_core::{ColumnType, Error, Result, TableSpec, UpsertDirective};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use tokio::sync::RwLock;

use super::Destination;

#[derive(Clone)]
struct PreparedTable {
    spec: TableSpec,
    upsert_sql: String,
}

pub struct SqliteDestination {
    pool: SqlitePool,
    tables: RwLock<HashMap<String, PreparedTable>>,
}

impl SqliteDestination {
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::backend("sqlite_destination mkdir", e))?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite://{}?mode=rwc", path.display()))
            .map_err(|e| Error::backend("sqlite_destination connect options", e))?
            .journal_mode(SqliteJournalMode::Wal)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await
            .map_err(|e| Error::backend("sqlite_destination connect", e))?;

        Ok(Self {
            pool,
            tables: RwLock::new(HashMap::new()),
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn create_table_sql(spec: &TableSpec) -> String {
    let columns: Vec<String> = spec
        .columns
        .iter()
        .map(|c| format!("{} TEXT", quote_ident(&c.name)))
        .collect();
    let pk: Vec<String> = spec.primary_key.iter().map(|c| quote_ident(c)).collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({}, PRIMARY KEY ({}))",
        quote_ident(&spec.table),
        columns.join(", "),
        pk.join(", ")
    )
}

fn upsert_sql(spec: &TableSpec) -> String {
    let names: Vec<String> = spec.columns.iter().map(|c| quote_ident(&c.name)).collect();
    let placeholders: Vec<String> = (1..=spec.columns.len()).map(|i| format!("?{i}")).collect();
    let pk: Vec<String> = spec.primary_key.iter().map(|c| quote_ident(c)).collect();
    let updates: Vec<String> = spec
        .columns
        .iter()
        .filter(|c| !spec.primary_key.contains(&c.name))
        .map(|c| {
            let col = quote_ident(&c.name);
            format!("{col} = excluded.{col}")
        })
        .collect();

    let on_conflict = if updates.is_empty() {
        "DO NOTHING".to_string()
    } else {
        format!("DO UPDATE SET {}", updates.join(", "))
    };

    format!(
        "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT ({}) {}",
        quote_ident(&spec.table),
        names.join(", "),
        placeholders.join(", "),
        pk.join(", "),
        on_conflict
    )
}

/// TEXT rendering of one field. Absent and null fields bind as NULL.
fn column_text(ty: ColumnType, value: Option<&serde_json::Value>) -> Result<Option<String>> {
    match (ty, value) {
        (_, None) | (_, Some(serde_json::Value::Null)) => Ok(None),
        (ColumnType::String, Some(serde_json::Value::String(s))) => Ok(Some(s.clone())),
        (ColumnType::String, Some(other)) => Ok(Some(other.to_string())),
        (ColumnType::Json, Some(v)) => serde_json::to_string(v)
            .map(Some)
            .map_err(|e| Error::backend("serialize json column", e)),
    }
}

#[async_trait]
impl Destination for SqliteDestination {
    #[tracing::instrument(level = "debug", skip(self, spec), fields(table = %spec.table))]
    async fn declare_table(&self, spec: &TableSpec) -> Result<()> {
        sqlx::query(&create_table_sql(spec))
            .execute(&self.pool)
            .await
            .map_err(|e| Error::backend(format!("create table {}", spec.table), e))?;

        self.tables.write().await.insert(
            spec.table.clone(),
            PreparedTable {
                spec: spec.clone(),
                upsert_sql: upsert_sql(spec),
            },
        );
        Ok(())
    }

    async fn upsert(&self, directive: &UpsertDirective) -> Result<()> {
        let prepared = self
            .tables
            .read()
            .await
            .get(&directive.table)
            .cloned()
            .ok_or_else(|| {
                Error::NotFound(format!("table '{}' was not declared", directive.table))
            })?;

        // Fails before touching the database if a key column is missing.
        directive.key_values(&prepared.spec)?;

        for name in directive.fields.keys() {
            if prepared.spec.column(name).is_none() {
                tracing::warn!(table = %directive.table, column = %name, "ignoring undeclared column");
            }
        }

        let mut query = sqlx::query(&prepared.upsert_sql);
        for column in &prepared.spec.columns {
            query = query.bind(column_text(column.ty, directive.field(&column.name))?);
        }
        query
            .execute(&self.pool)
            .await
            .map_err(|e| Error::backend(format!("upsert into {}", directive.table), e))?;
        Ok(())
    }
}
