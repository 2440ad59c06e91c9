//! Destinations apply declared tables and upsert directives produced by a connector run.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use eventtap_core::{Result, TableSpec, UpsertDirective};

pub use memory::MemoryDestination;
pub use sqlite::SqliteDestination;

#[async_trait]
pub trait Destination: Send + Sync {
    /// Create the table if it does not exist. Called once per table before any upsert.
    async fn declare_table(&self, spec: &TableSpec) -> Result<()>;

    /// Insert or overwrite one row by the table's primary key.
    async fn upsert(&self, directive: &UpsertDirective) -> Result<()>;
}
