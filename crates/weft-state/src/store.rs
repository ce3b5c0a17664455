use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use serde_json::Value;

use crate::state::{NodeExecutionState, NodeStatus};

/// Thread-safe map from node id to [`NodeExecutionState`].
///
/// Nodes without an entry are reported as [`NodeStatus::Idle`].
#[derive(Debug, Default)]
pub struct ExecutionStateStore {
  states: RwLock<HashMap<String, NodeExecutionState>>,
}

impl ExecutionStateStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Enter `running`: stamp the start time and clear any previous result,
  /// error, completion time, and duration.
  pub fn mark_running(&self, node_id: &str) {
    let mut states = self.states.write().expect("state store lock poisoned");
    states.insert(
      node_id.to_string(),
      NodeExecutionState {
        status: NodeStatus::Running,
        started_at: Some(Utc::now()),
        ..Default::default()
      },
    );
  }

  /// Enter `success` with `result`.
  ///
  /// `duration_ms` is recorded as given; when `None` it is computed from the
  /// start time, if one is on record.
  pub fn mark_success(&self, node_id: &str, result: Value, duration_ms: Option<u64>) {
    let now = Utc::now();
    let mut states = self.states.write().expect("state store lock poisoned");
    let state = states.entry(node_id.to_string()).or_default();
    let elapsed = state.elapsed_ms(now);
    state.status = NodeStatus::Success;
    state.duration_ms = duration_ms.or(elapsed);
    state.result = Some(result);
    state.completed_at = Some(now);
  }

  /// Enter `error` with `message`; the duration is computed from the start
  /// time when one is on record.
  pub fn mark_error(&self, node_id: &str, message: impl Into<String>) {
    let now = Utc::now();
    let mut states = self.states.write().expect("state store lock poisoned");
    let state = states.entry(node_id.to_string()).or_default();
    let elapsed = state.elapsed_ms(now);
    state.status = NodeStatus::Error;
    state.duration_ms = elapsed;
    state.error = Some(message.into());
    state.completed_at = Some(now);
  }

  pub fn get(&self, node_id: &str) -> Option<NodeExecutionState> {
    self
      .states
      .read()
      .expect("state store lock poisoned")
      .get(node_id)
      .cloned()
  }

  pub fn status(&self, node_id: &str) -> NodeStatus {
    self
      .states
      .read()
      .expect("state store lock poisoned")
      .get(node_id)
      .map(|s| s.status)
      .unwrap_or_default()
  }

  /// Reset every node to `idle`.
  pub fn clear_all(&self) {
    self
      .states
      .write()
      .expect("state store lock poisoned")
      .clear();
  }

  /// Forget a single node.
  pub fn clear(&self, node_id: &str) {
    self
      .states
      .write()
      .expect("state store lock poisoned")
      .remove(node_id);
  }

  /// Consistent copy of every recorded state.
  pub fn snapshot(&self) -> HashMap<String, NodeExecutionState> {
    self
      .states
      .read()
      .expect("state store lock poisoned")
      .clone()
  }
}
