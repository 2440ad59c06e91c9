use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Host-supplied connector configuration: a flat string key/value object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectorConfig {
    values: BTreeMap<String, String>,
}

impl ConnectorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for tests and embedding hosts.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Value for `key` with surrounding whitespace removed; blank values read as absent.
    pub fn get_trimmed(&self, key: &str) -> Option<&str> {
        self.get(key).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parse a flat JSON object. Scalar values are rendered to strings; nested values are rejected.
    #[tracing::instrument(level = "debug", skip(s))]
    pub fn from_json_str(s: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(s).map_err(|e| {
            Error::InvalidInput(format!("configuration is not valid json: {e}"))
        })?;
        let serde_json::Value::Object(obj) = value else {
            return Err(Error::InvalidInput(
                "configuration must be a json object".to_string(),
            ));
        };

        let mut values = BTreeMap::new();
        for (key, v) in obj {
            let rendered = match v {
                serde_json::Value::Null => continue,
                serde_json::Value::String(s) => s,
                serde_json::Value::Bool(b) => b.to_string(),
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                    return Err(Error::InvalidInput(format!(
                        "configuration key '{key}' must be a scalar value"
                    )));
                }
            };
            values.insert(key, rendered);
        }
        Ok(Self { values })
    }

    #[tracing::instrument(level = "debug", skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::backend(format!("read configuration {}", path.display()), e))?;
        Self::from_json_str(&raw)
    }
}

/// Opaque incremental state owned by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncState {
    pub value: serde_json::Value,
}

impl SyncState {
    pub fn new(value: serde_json::Value) -> Self {
        Self { value }
    }

    pub fn empty() -> Self {
        Self {
            value: serde_json::json!({}),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnType {
    String,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ColumnType,
}

/// Destination table declaration consumed once by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    pub table: String,
    pub primary_key: Vec<String>,
    pub columns: Vec<ColumnSpec>,
}

impl TableSpec {
    #[tracing::instrument(level = "debug", skip(columns))]
    pub fn new(
        table: impl Into<String> + std::fmt::Debug,
        primary_key: Vec<String>,
        columns: Vec<ColumnSpec>,
    ) -> Result<Self> {
        let table = table.into();
        if table.trim().is_empty() {
            return Err(Error::InvalidInput("table name is empty".to_string()));
        }
        if primary_key.is_empty() {
            return Err(Error::InvalidInput(format!(
                "table '{table}' has no primary key"
            )));
        }
        for pk in &primary_key {
            if !columns.iter().any(|c| &c.name == pk) {
                return Err(Error::InvalidInput(format!(
                    "primary key column '{pk}' is not declared on table '{table}'"
                )));
            }
        }
        Ok(Self {
            table,
            primary_key,
            columns,
        })
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Insert-or-overwrite one destination row, keyed by the table's primary key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsertDirective {
    pub table: String,
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl UpsertDirective {
    pub fn new(
        table: impl Into<String>,
        fields: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        Self {
            table: table.into(),
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.fields.get(name)
    }

    /// Primary key values in declaration order. Missing key columns are an error.
    pub fn key_values(&self, spec: &TableSpec) -> Result<Vec<serde_json::Value>> {
        spec.primary_key
            .iter()
            .map(|pk| {
                self.fields.get(pk).cloned().ok_or_else(|| {
                    Error::InvalidInput(format!(
                        "upsert into '{}' is missing primary key field '{pk}'",
                        self.table
                    ))
                })
            })
            .collect()
    }
}

/// Lifecycle of one `update` run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Aborted { reason: String },
}

impl RunStatus {
    pub fn is_finished(&self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}
