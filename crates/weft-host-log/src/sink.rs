use std::sync::Mutex;

use tracing::{error, info, warn};

use crate::entry::{LogEntry, LogLevel};

/// Receiver for run log entries.
///
/// The engine calls `emit` for each entry in order; implementations decide
/// where the entries go (memory, a UI stream, a file).
pub trait LogSink: Send + Sync {
  fn emit(&self, entry: LogEntry);

  /// Called once as a run starts, before its first entry. Sinks that keep
  /// entries drop the previous run's here.
  fn begin_run(&self) {}
}

/// In-memory log of the current run, mirrored into `tracing`.
#[derive(Debug, Default)]
pub struct InMemoryLogSink {
  entries: Mutex<Vec<LogEntry>>,
}

impl InMemoryLogSink {
  pub fn new() -> Self {
    Self::default()
  }

  /// Copy of every entry, in emission order.
  pub fn entries(&self) -> Vec<LogEntry> {
    self.entries.lock().expect("log sink lock poisoned").clone()
  }

  pub fn len(&self) -> usize {
    self.entries.lock().expect("log sink lock poisoned").len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn clear(&self) {
    self.entries.lock().expect("log sink lock poisoned").clear();
  }
}

impl LogSink for InMemoryLogSink {
  fn emit(&self, entry: LogEntry) {
    mirror(&entry);
    self
      .entries
      .lock()
      .expect("log sink lock poisoned")
      .push(entry);
  }

  fn begin_run(&self) {
    self.clear();
  }
}

fn mirror(entry: &LogEntry) {
  match entry.level {
    LogLevel::Info | LogLevel::Success => {
      info!(node_id = %entry.node_id, level = %entry.level, "{}", entry.message)
    }
    LogLevel::Warning => warn!(node_id = %entry.node_id, "{}", entry.message),
    LogLevel::Error => error!(node_id = %entry.node_id, "{}", entry.message),
  }
}
