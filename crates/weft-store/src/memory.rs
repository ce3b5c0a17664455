use std::sync::Mutex;

use async_trait::async_trait;

use crate::entries::Entries;
use crate::types::{HistoryEntry, RunSummary};
use crate::{Error, HistoryStore};

/// In-memory history store.
#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
  entries: Mutex<Entries>,
}

impl InMemoryHistoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
  async fn add(&self, summary: RunSummary) -> Result<String, Error> {
    Ok(
      self
        .entries
        .lock()
        .expect("history lock poisoned")
        .add(summary),
    )
  }

  async fn get(&self, id: &str) -> Result<HistoryEntry, Error> {
    self
      .entries
      .lock()
      .expect("history lock poisoned")
      .get(id)
      .cloned()
      .ok_or_else(|| Error::NotFound(id.to_string()))
  }

  async fn delete(&self, id: &str) -> Result<(), Error> {
    self.entries.lock().expect("history lock poisoned").delete(id);
    Ok(())
  }

  async fn clear(&self) -> Result<(), Error> {
    self.entries.lock().expect("history lock poisoned").clear();
    Ok(())
  }

  async fn list(&self) -> Result<Vec<HistoryEntry>, Error> {
    Ok(self.entries.lock().expect("history lock poisoned").list())
  }

  async fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>, Error> {
    Ok(
      self
        .entries
        .lock()
        .expect("history lock poisoned")
        .recent(limit),
    )
  }
}
