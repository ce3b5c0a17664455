use std::sync::{Arc, Mutex};

use weft_host_log::{LogEntry, LogSink};

/// Forwards every entry to an inner sink and keeps a copy for the run summary.
pub struct CapturingLogSink {
  inner: Arc<dyn LogSink>,
  captured: Mutex<Vec<LogEntry>>,
}

impl CapturingLogSink {
  pub fn new(inner: Arc<dyn LogSink>) -> Self {
    Self {
      inner,
      captured: Mutex::new(Vec::new()),
    }
  }

  /// Entries seen so far, in emission order.
  pub fn captured(&self) -> Vec<LogEntry> {
    self.captured.lock().expect("capture lock poisoned").clone()
  }
}

impl LogSink for CapturingLogSink {
  fn emit(&self, entry: LogEntry) {
    self
      .captured
      .lock()
      .expect("capture lock poisoned")
      .push(entry.clone());
    self.inner.emit(entry);
  }

  fn begin_run(&self) {
    self.captured.lock().expect("capture lock poisoned").clear();
    self.inner.begin_run();
  }
}
