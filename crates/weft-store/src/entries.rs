use serde::{Deserialize, Serialize};

use crate::HISTORY_LIMIT;
use crate::types::{HistoryEntry, RunSummary};

/// Ordered history list shared by the store implementations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub(crate) struct Entries(Vec<HistoryEntry>);

impl Entries {
  pub(crate) fn add(&mut self, summary: RunSummary) -> String {
    let id = format!("history-{}", uuid::Uuid::new_v4());
    self.0.insert(
      0,
      HistoryEntry {
        id: id.clone(),
        summary,
      },
    );
    self.0.truncate(HISTORY_LIMIT);
    id
  }

  pub(crate) fn get(&self, id: &str) -> Option<&HistoryEntry> {
    self.0.iter().find(|e| e.id == id)
  }

  pub(crate) fn delete(&mut self, id: &str) {
    self.0.retain(|e| e.id != id);
  }

  pub(crate) fn clear(&mut self) {
    self.0.clear();
  }

  pub(crate) fn list(&self) -> Vec<HistoryEntry> {
    self.0.clone()
  }

  pub(crate) fn recent(&self, limit: usize) -> Vec<HistoryEntry> {
    let mut sorted = self.0.clone();
    sorted.sort_by(|a, b| b.summary.started_at.cmp(&a.summary.started_at));
    sorted.truncate(limit);
    sorted
  }
}
