//! Graph traversal.

use std::collections::HashMap;
use std::time::Instant;

use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};
use weft_config::{NodeDef, NodeKind};
use weft_host_log::{LogEntry, SYSTEM_NODE_ID};
use weft_workflow::Workflow;

use crate::context::RunContext;
use crate::executors;

/// How a run ended. Node failures do not change the outcome; they are listed
/// in [`RunReport::failed_nodes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
  /// Every reachable branch was followed to its end.
  Completed,
  /// The workflow has no trigger node; nothing ran.
  NoTrigger,
  /// Cancellation was observed before a node visit.
  Cancelled,
  /// `max_node_visits` was reached.
  VisitLimit,
}

/// What a finished run leaves behind besides the state store and log stream.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
  pub run_id: String,
  pub outcome: RunOutcome,
  /// Output of every node that succeeded, last write wins.
  pub outputs: HashMap<String, Value>,
  /// Nodes that failed, in failure order. A node reached twice may appear
  /// twice.
  pub failed_nodes: Vec<String>,
  pub visits: usize,
}

impl RunReport {
  pub fn is_cancelled(&self) -> bool {
    self.outcome == RunOutcome::Cancelled
  }

  /// A missing trigger, an exceeded visit limit or any failed node.
  pub fn has_errors(&self) -> bool {
    matches!(self.outcome, RunOutcome::NoTrigger | RunOutcome::VisitLimit)
      || !self.failed_nodes.is_empty()
  }
}

/// Starts runs against a shared [`RunContext`].
pub struct Runtime {
  ctx: RunContext,
}

impl Runtime {
  pub fn new(ctx: RunContext) -> Self {
    Self { ctx }
  }

  pub fn context(&self) -> &RunContext {
    &self.ctx
  }

  /// Prepare a run of `workflow` with its own cancellation token.
  ///
  /// Nothing executes until [`WorkflowRun::wait`] is awaited.
  pub fn start<'a>(&'a self, workflow: &'a Workflow) -> WorkflowRun<'a> {
    self.start_with_cancel(workflow, CancellationToken::new())
  }

  /// Prepare a run that stops when `cancel` is cancelled.
  pub fn start_with_cancel<'a>(
    &'a self,
    workflow: &'a Workflow,
    cancel: CancellationToken,
  ) -> WorkflowRun<'a> {
    WorkflowRun {
      ctx: &self.ctx,
      workflow,
      run_id: uuid::Uuid::new_v4().to_string(),
      cancel,
      outputs: HashMap::new(),
      failed_nodes: Vec::new(),
      visits: 0,
    }
  }
}

/// A single run. Owns its cancellation token and output map, so concurrent
/// runs never share traversal state.
pub struct WorkflowRun<'a> {
  ctx: &'a RunContext,
  workflow: &'a Workflow,
  run_id: String,
  cancel: CancellationToken,
  outputs: HashMap<String, Value>,
  failed_nodes: Vec<String>,
  visits: usize,
}

impl<'a> WorkflowRun<'a> {
  pub fn run_id(&self) -> &str {
    &self.run_id
  }

  /// Token that stops this run at the next node boundary. A node already
  /// executing is allowed to finish.
  pub fn cancel_token(&self) -> CancellationToken {
    self.cancel.clone()
  }

  /// Run the workflow to completion.
  ///
  /// Execution state and the log stream are reset first. Never fails: node
  /// errors are recorded in the state store and the log stream.
  #[instrument(
    name = "workflow_run",
    skip(self),
    fields(workflow_id = %self.workflow.id, run_id = %self.run_id)
  )]
  pub async fn wait(mut self) -> RunReport {
    self.ctx.logs.begin_run();
    self.ctx.states.clear_all();

    let workflow = self.workflow;
    let Some(trigger) = workflow.trigger() else {
      error!(run_id = %self.run_id, "workflow has no trigger node");
      self
        .ctx
        .log(LogEntry::error(SYSTEM_NODE_ID, "no trigger node found"));
      return self.finish(RunOutcome::NoTrigger);
    };

    info!(
      run_id = %self.run_id,
      trigger = %trigger.id,
      nodes = workflow.nodes().len(),
      edges = workflow.edges().len(),
      "workflow_started"
    );
    self
      .ctx
      .log(LogEntry::info(&trigger.id, "workflow execution started"));

    let outcome = self.run_loop(trigger).await;

    match outcome {
      RunOutcome::Completed => info!(
        run_id = %self.run_id,
        failed = self.failed_nodes.len(),
        "workflow_completed"
      ),
      RunOutcome::Cancelled => warn!(run_id = %self.run_id, "workflow cancelled"),
      RunOutcome::VisitLimit | RunOutcome::NoTrigger => {
        error!(run_id = %self.run_id, "workflow_failed")
      }
    }

    self.finish(outcome)
  }

  /// Depth-first traversal. Children are pushed in reverse edge order so the
  /// first edge's subtree finishes before the second edge is taken.
  async fn run_loop(&mut self, trigger: &'a NodeDef) -> RunOutcome {
    let workflow = self.workflow;
    let mut pending: Vec<(&'a NodeDef, Value)> = vec![(trigger, Value::Null)];
    let mut last_node: Option<&'a str> = None;

    while let Some((node, previous)) = pending.pop() {
      if self.cancel.is_cancelled() {
        let tag = last_node.unwrap_or(SYSTEM_NODE_ID);
        self
          .ctx
          .log(LogEntry::warning(tag, "workflow execution stopped"));
        return RunOutcome::Cancelled;
      }

      if let Some(limit) = self.ctx.config.max_node_visits {
        if self.visits >= limit {
          self.ctx.log(LogEntry::error(
            SYSTEM_NODE_ID,
            format!("node visit limit of {} exceeded", limit),
          ));
          return RunOutcome::VisitLimit;
        }
      }

      self.visits += 1;
      last_node = Some(node.id.as_str());

      let Some(output) = self.visit(node, &previous).await else {
        continue;
      };

      let children: Vec<&'a NodeDef> = next_edges(workflow, node, &output)
        .filter_map(|target| workflow.get_node(target))
        .collect();
      for child in children.into_iter().rev() {
        pending.push((child, output.clone()));
      }
    }

    RunOutcome::Completed
  }

  /// Execute one node and record its state. Returns the output on success.
  async fn visit(&mut self, node: &NodeDef, previous: &Value) -> Option<Value> {
    let ctx = self.ctx;
    let states = &ctx.states;
    states.mark_running(&node.id);
    ctx.log(LogEntry::info(
      &node.id,
      format!("executing node: {}", node.display_name()),
    ));

    let started = Instant::now();
    match executors::execute(node, previous, ctx).await {
      Ok(output) => {
        let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        states.mark_success(&node.id, output.clone(), Some(elapsed));
        self.outputs.insert(node.id.clone(), output.clone());
        info!(node_id = %node.id, duration_ms = elapsed, "node_completed");
        Some(output)
      }
      Err(e) => {
        let message = e.to_string();
        warn!(node_id = %node.id, error = %message, "node_failed");
        states.mark_error(&node.id, message.as_str());
        ctx.log(LogEntry::error(&node.id, format!("execution error: {}", message)));
        self.failed_nodes.push(node.id.clone());
        None
      }
    }
  }

  fn finish(self, outcome: RunOutcome) -> RunReport {
    RunReport {
      run_id: self.run_id,
      outcome,
      outputs: self.outputs,
      failed_nodes: self.failed_nodes,
      visits: self.visits,
    }
  }
}

/// Targets to visit after `node` produced `output`, in edge-list order.
///
/// A condition node's `{result: bool}` selects the matching branch; every
/// other kind follows all outgoing edges.
fn next_edges<'w>(
  workflow: &'w Workflow,
  node: &NodeDef,
  output: &Value,
) -> impl Iterator<Item = &'w str> {
  let outcome = match node.kind {
    NodeKind::Condition(_) => output.get("result").and_then(Value::as_bool),
    _ => None,
  };

  workflow
    .outgoing_edges(&node.id)
    .filter(move |edge| outcome.map_or(true, |result| edge.matches_outcome(result)))
    .map(|edge| edge.target.as_str())
}
