//! Weft Store
//!
//! Storage for post-run summaries. Every finished run is recorded as a
//! [`RunSummary`]; the store assigns it an id and keeps the most recent
//! [`HISTORY_LIMIT`] entries, newest first.
//!
//! Two implementations are provided: [`InMemoryHistoryStore`] and
//! [`FileHistoryStore`], which keeps the list in a JSON file.

mod entries;
mod file;
mod memory;
mod types;

pub use file::FileHistoryStore;
pub use memory::InMemoryHistoryStore;
pub use types::{HistoryEntry, RunStatus, RunSummary};

use async_trait::async_trait;

/// Maximum number of entries kept; the oldest are evicted first.
pub const HISTORY_LIMIT: usize = 100;

/// Default page size for [`HistoryStore::recent`] callers.
pub const DEFAULT_RECENT_LIMIT: usize = 10;

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// The requested record was not found.
  #[error("not found: {0}")]
  NotFound(String),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

/// Storage trait for run history.
#[async_trait]
pub trait HistoryStore: Send + Sync {
  /// Record a finished run and return its generated id.
  async fn add(&self, summary: RunSummary) -> Result<String, Error>;

  /// Get an entry by id.
  async fn get(&self, id: &str) -> Result<HistoryEntry, Error>;

  /// Delete an entry. Unknown ids are ignored.
  async fn delete(&self, id: &str) -> Result<(), Error>;

  /// Remove every entry.
  async fn clear(&self) -> Result<(), Error>;

  /// All entries, newest first.
  async fn list(&self) -> Result<Vec<HistoryEntry>, Error>;

  /// Up to `limit` entries sorted by start time, most recent first.
  async fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>, Error>;
}
