//! Workflow engine.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};
use weft_config::WorkflowDef;
use weft_host_log::{LogEntry, SYSTEM_NODE_ID};
use weft_runtime::{RunContext, RunReport, Runtime};
use weft_store::{HistoryStore, InMemoryHistoryStore, RunStatus, RunSummary};
use weft_workflow::Workflow;

use crate::capture::CapturingLogSink;
use crate::error::EngineError;

const UNTITLED: &str = "Untitled workflow";

/// Result of [`WorkflowEngine::run`].
#[derive(Debug, Clone)]
pub struct EngineRun {
  /// Id the summary was recorded under.
  pub history_id: String,
  pub summary: RunSummary,
  /// `None` when the definition failed validation and nothing ran.
  pub report: Option<RunReport>,
}

/// Runs workflows against one set of collaborators and records each run.
///
/// Generic over `H: HistoryStore`. Use `WorkflowEngine::new()` for an
/// in-memory history, or `WorkflowEngine::with_history()` to provide one.
///
/// Every call to [`run`](Self::run) gets its own cancellation token and output
/// map, and its summary logs are captured separately. The state store and log
/// sink in the context are shared, so two runs in flight at once overwrite
/// each other's node states and reset each other's log stream.
pub struct WorkflowEngine<H: HistoryStore = InMemoryHistoryStore> {
  ctx: RunContext,
  history: H,
  active: Mutex<Vec<(String, CancellationToken)>>,
}

impl WorkflowEngine<InMemoryHistoryStore> {
  pub fn new(ctx: RunContext) -> Self {
    Self::with_history(ctx, InMemoryHistoryStore::new())
  }
}

impl<H: HistoryStore> WorkflowEngine<H> {
  pub fn with_history(ctx: RunContext, history: H) -> Self {
    Self {
      ctx,
      history,
      active: Mutex::new(Vec::new()),
    }
  }

  pub fn context(&self) -> &RunContext {
    &self.ctx
  }

  pub fn history(&self) -> &H {
    &self.history
  }

  pub fn is_running(&self) -> bool {
    !self.active.lock().expect("active runs lock poisoned").is_empty()
  }

  /// Request a cooperative stop of every active run. Returns whether any run
  /// was active.
  pub fn cancel(&self) -> bool {
    let active = self.active.lock().expect("active runs lock poisoned");
    for (run_id, token) in active.iter() {
      warn!(run_id = %run_id, "cancel requested");
      token.cancel();
    }
    !active.is_empty()
  }

  /// Validate and run `def`, then record its summary.
  ///
  /// Only a history failure is an error. An invalid definition, a missing
  /// trigger or failing nodes all yield a summary with status `error`.
  #[instrument(name = "engine_run", skip(self, def), fields(workflow_id = %def.id))]
  pub async fn run(&self, def: WorkflowDef) -> Result<EngineRun, EngineError> {
    let started_at = Utc::now();
    let name = if def.name.trim().is_empty() {
      UNTITLED.to_string()
    } else {
      def.name.clone()
    };
    let node_count = def.nodes.len();
    let edge_count = def.edges.len();

    let sink = Arc::new(CapturingLogSink::new(self.ctx.logs.clone()));
    let ctx = self.ctx.clone().with_log_sink(sink.clone());

    let report = match Workflow::new(def) {
      Ok(workflow) => Some(self.execute(ctx, &workflow).await),
      Err(e) => {
        warn!(error = %e, "workflow rejected");
        ctx.logs.begin_run();
        ctx.states.clear_all();
        ctx.log(LogEntry::error(
          SYSTEM_NODE_ID,
          format!("invalid workflow: {}", e),
        ));
        None
      }
    };

    let completed_at = Utc::now();
    let status = summary_status(report.as_ref());
    let summary = RunSummary {
      name,
      started_at,
      completed_at: Some(completed_at),
      status,
      duration_ms: Some(
        u64::try_from((completed_at - started_at).num_milliseconds()).unwrap_or(0),
      ),
      logs: sink.captured(),
      node_count,
      edge_count,
    };

    let history_id = self.history.add(summary.clone()).await?;
    info!(history_id = %history_id, status = %status, "run_recorded");

    Ok(EngineRun {
      history_id,
      summary,
      report,
    })
  }

  async fn execute(&self, ctx: RunContext, workflow: &Workflow) -> RunReport {
    let runtime = Runtime::new(ctx);
    let cancel = CancellationToken::new();
    let run = runtime.start_with_cancel(workflow, cancel.clone());

    let _active = ActiveRun::register(&self.active, run.run_id(), cancel);
    run.wait().await
  }
}

/// Status recorded for a finished run.
///
/// Cancelled wins over error, error over success. A run that never started
/// (`None`) is an error.
pub fn summary_status(report: Option<&RunReport>) -> RunStatus {
  match report {
    None => RunStatus::Error,
    Some(report) if report.is_cancelled() => RunStatus::Cancelled,
    Some(report) if report.has_errors() => RunStatus::Error,
    Some(_) => RunStatus::Success,
  }
}

/// Keeps a run's token reachable from `cancel()` while the run is in flight.
struct ActiveRun<'e> {
  active: &'e Mutex<Vec<(String, CancellationToken)>>,
  run_id: String,
}

impl<'e> ActiveRun<'e> {
  fn register(
    active: &'e Mutex<Vec<(String, CancellationToken)>>,
    run_id: &str,
    token: CancellationToken,
  ) -> Self {
    active
      .lock()
      .expect("active runs lock poisoned")
      .push((run_id.to_string(), token));
    Self {
      active,
      run_id: run_id.to_string(),
    }
  }
}

impl Drop for ActiveRun<'_> {
  fn drop(&mut self) {
    if let Ok(mut active) = self.active.lock() {
      active.retain(|(id, _)| *id != self.run_id);
    }
  }
}
