use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Warning,
    Severe,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

/// Logger capability handed to connectors through `RunContext`.
///
/// Connector code logs through this seam only, so hosts decide where messages go.
pub trait RunLogger: Send + Sync {
    fn log(&self, level: LogLevel, message: &str);

    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    fn warning(&self, message: &str) {
        self.log(LogLevel::Warning, message);
    }

    fn severe(&self, message: &str) {
        self.log(LogLevel::Severe, message);
    }
}

/// Forwards to `tracing`; `severe` maps to `ERROR`.
#[derive(Debug, Clone, Default)]
pub struct TracingLogger {
    connector_id: Option<&'static str>,
}

impl TracingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_connector(connector_id: &'static str) -> Self {
        Self {
            connector_id: Some(connector_id),
        }
    }
}

impl RunLogger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str) {
        let connector = self.connector_id.unwrap_or("-");
        match level {
            LogLevel::Info => tracing::info!(connector, "{message}"),
            LogLevel::Warning => tracing::warn!(connector, "{message}"),
            LogLevel::Severe => tracing::error!(connector, "{message}"),
        }
    }
}

/// Records entries in memory (primarily for tests).
#[derive(Debug, Clone, Default)]
pub struct MemoryLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything logged so far.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn messages_at(&self, level: LogLevel) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|e| e.level == level)
            .map(|e| e.message)
            .collect()
    }
}

impl RunLogger for MemoryLogger {
    fn log(&self, level: LogLevel, message: &str) {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(LogEntry {
                level,
                message: message.to_string(),
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_logger_keeps_order_and_levels() {
        let logger = MemoryLogger::new();
        logger.info("one");
        logger.severe("two");
        logger.warning("three");

        let entries = logger.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].level, LogLevel::Severe);
        assert_eq!(logger.messages_at(LogLevel::Severe), vec!["two".to_string()]);
    }

    #[test]
    fn clones_share_entries() {
        let logger = MemoryLogger::new();
        let handle: Arc<dyn RunLogger> = Arc::new(logger.clone());
        handle.info("from handle");
        assert_eq!(logger.entries().len(), 1);
    }
}
