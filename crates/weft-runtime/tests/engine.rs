mod common;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use weft_config::{ConditionConfig, LlmConfig, NodeKind, RuntimeConfig, ScriptConfig};
use weft_host_kv::{Scope, VariableStore};
use weft_host_log::{LogLevel, SYSTEM_NODE_ID};
use weft_runtime::{RunOutcome, Runtime};
use weft_state::NodeStatus;
use weft_workflow::Workflow;

use common::{BASE, Harness, MockHttpClient, branch, edge, node};

fn script(code: &str) -> NodeKind {
  NodeKind::Script(ScriptConfig {
    code: code.to_string(),
    language: "javascript".to_string(),
  })
}

fn condition(expression: &str) -> NodeKind {
  NodeKind::Condition(ConditionConfig {
    expression: expression.to_string(),
  })
}

fn llm(prompt: &str) -> NodeKind {
  NodeKind::Llm(LlmConfig {
    provider: "openai".to_string(),
    model: "gpt-4o-mini".to_string(),
    prompt: prompt.to_string(),
    ..LlmConfig::default()
  })
}

fn openai_reply(content: &str) -> serde_json::Value {
  json!({
    "choices": [{ "message": { "content": content } }],
    "usage": { "total_tokens": 12 }
  })
}

#[tokio::test]
async fn test_no_trigger_logs_one_system_error() {
  let harness = Harness::new(MockHttpClient::new());
  let workflow = Workflow::from_parts(
    vec![node("c", condition("true")), node("end", NodeKind::Terminator)],
    vec![edge("c", "end")],
  )
  .unwrap();

  let runtime = Runtime::new(harness.ctx.clone());
  let report = runtime.start(&workflow).wait().await;

  assert_eq!(report.outcome, RunOutcome::NoTrigger);
  let entries = harness.entries();
  assert_eq!(entries.len(), 1);
  assert_eq!(entries[0].level, LogLevel::Error);
  assert_eq!(entries[0].node_id, SYSTEM_NODE_ID);
  assert_eq!(harness.states.status("c"), NodeStatus::Idle);
  assert_eq!(harness.states.status("end"), NodeStatus::Idle);
}

#[tokio::test]
async fn test_condition_true_follows_true_and_unlabeled_edges() {
  let harness = Harness::new(MockHttpClient::new());
  let workflow = Workflow::from_parts(
    vec![
      node("t", NodeKind::Trigger),
      node("c", condition("1 < 2")),
      node("yes", NodeKind::Terminator),
      node("also", NodeKind::Terminator),
      node("no", NodeKind::Terminator),
    ],
    vec![
      edge("t", "c"),
      branch("c", "yes", "true"),
      edge("c", "also"),
      branch("c", "no", "false"),
    ],
  )
  .unwrap();

  let report = Runtime::new(harness.ctx.clone()).start(&workflow).wait().await;

  assert_eq!(report.outcome, RunOutcome::Completed);
  assert_eq!(report.outputs["c"], json!({"result": true}));
  assert_eq!(harness.states.status("yes"), NodeStatus::Success);
  assert_eq!(harness.states.status("also"), NodeStatus::Success);
  assert_eq!(harness.states.status("no"), NodeStatus::Idle);
}

#[tokio::test]
async fn test_condition_false_follows_only_false_edges() {
  let harness = Harness::new(MockHttpClient::new());
  let workflow = Workflow::from_parts(
    vec![
      node("t", NodeKind::Trigger),
      node("c", condition("input.message === 'nope'")),
      node("yes", NodeKind::Terminator),
      node("unlabeled", NodeKind::Terminator),
      node("no", NodeKind::Terminator),
    ],
    vec![
      edge("t", "c"),
      branch("c", "yes", "true"),
      edge("c", "unlabeled"),
      branch("c", "no", "false"),
    ],
  )
  .unwrap();

  Runtime::new(harness.ctx.clone()).start(&workflow).wait().await;

  assert_eq!(harness.states.status("no"), NodeStatus::Success);
  assert_eq!(harness.states.status("yes"), NodeStatus::Idle);
  assert_eq!(harness.states.status("unlabeled"), NodeStatus::Idle);
  assert!(
    harness
      .messages("c")
      .contains(&"condition evaluated: False".to_string())
  );
}

#[tokio::test]
async fn test_end_to_end_scored_branch() {
  let http = MockHttpClient::new().route("/chat/completions", 200, openai_reply("Great job"));
  let harness = Harness::new(http);
  let workflow = Workflow::from_parts(
    vec![
      node("start", NodeKind::Trigger),
      node("score", script("return { score: 70, passed: true };")),
      node("check", condition("input.passed === true")),
      node("praise", llm("Congratulate the student")),
      node("coach", llm("Suggest improvements")),
      node("end", NodeKind::Terminator),
    ],
    vec![
      edge("start", "score"),
      edge("score", "check"),
      branch("check", "praise", "true"),
      branch("check", "coach", "false"),
      edge("praise", "end"),
      edge("coach", "end"),
    ],
  )
  .unwrap();

  let report = Runtime::new(harness.ctx.clone()).start(&workflow).wait().await;

  assert_eq!(report.outcome, RunOutcome::Completed);
  assert!(!report.has_errors());
  assert_eq!(report.outputs["score"], json!({"score": 70, "passed": true}));
  assert_eq!(report.outputs["praise"], json!("Great job"));
  assert_eq!(harness.states.status("praise"), NodeStatus::Success);
  assert_eq!(harness.states.status("coach"), NodeStatus::Idle);
  assert_eq!(harness.states.status("end"), NodeStatus::Success);

  // The previous output of a condition is its `{result}` record.
  let prompt = harness.http.last_body()["messages"][0]["content"].clone();
  assert_eq!(
    prompt,
    json!("Congratulate the student\n\nPrevious output: {\"result\":true}")
  );
  assert_eq!(harness.http.requests().len(), 1);
}

#[tokio::test]
async fn test_log_order_for_single_node() {
  let harness = Harness::new(MockHttpClient::new());
  let workflow = Workflow::from_parts(
    vec![node("t", NodeKind::Trigger).with_label("Webhook")],
    vec![],
  )
  .unwrap();

  Runtime::new(harness.ctx.clone()).start(&workflow).wait().await;

  assert_eq!(
    harness.messages("t"),
    vec![
      "workflow execution started",
      "executing node: Webhook",
      "workflow started",
    ]
  );
}

#[tokio::test]
async fn test_failure_halts_only_its_branch() {
  let harness = Harness::new(MockHttpClient::new());
  let workflow = Workflow::from_parts(
    vec![
      node("t", NodeKind::Trigger),
      node("bad", script("throw new Error('kaput');")),
      node("after_bad", NodeKind::Terminator),
      node("good", script("return 1;")),
    ],
    vec![edge("t", "bad"), edge("bad", "after_bad"), edge("t", "good")],
  )
  .unwrap();

  let report = Runtime::new(harness.ctx.clone()).start(&workflow).wait().await;

  assert_eq!(report.outcome, RunOutcome::Completed);
  assert_eq!(report.failed_nodes, vec!["bad".to_string()]);
  assert!(report.has_errors());

  let bad = harness.states.get("bad").unwrap();
  assert_eq!(bad.status, NodeStatus::Error);
  assert!(bad.error.unwrap().contains("kaput"));
  assert_eq!(harness.states.status("after_bad"), NodeStatus::Idle);
  assert_eq!(harness.states.status("good"), NodeStatus::Success);

  let errors: Vec<_> = harness
    .entries()
    .into_iter()
    .filter(|e| e.node_id == "bad" && e.level == LogLevel::Error)
    .map(|e| e.message)
    .collect();
  assert_eq!(errors.len(), 2);
  assert!(errors[1].starts_with("execution error: "));
}

#[tokio::test]
async fn test_converging_edges_replay_target() {
  let harness = Harness::new(MockHttpClient::new());
  let workflow = Workflow::from_parts(
    vec![
      node("t", NodeKind::Trigger),
      node("a", script("return 'a';")),
      node("b", script("return 'b';")),
      node("join", script("return input;")),
    ],
    vec![
      edge("t", "a"),
      edge("t", "b"),
      edge("a", "join"),
      edge("b", "join"),
    ],
  )
  .unwrap();

  let report = Runtime::new(harness.ctx.clone()).start(&workflow).wait().await;

  assert_eq!(report.visits, 5);
  let executions = harness
    .messages("join")
    .into_iter()
    .filter(|m| m == "function executed")
    .count();
  assert_eq!(executions, 2);
  // Depth-first in edge order: the `b` path runs last.
  assert_eq!(report.outputs["join"], json!("b"));
}

#[tokio::test]
async fn test_terminator_edges_are_followed() {
  let harness = Harness::new(MockHttpClient::new());
  let workflow = Workflow::from_parts(
    vec![
      node("t", NodeKind::Trigger),
      node("end", NodeKind::Terminator),
      node("after", script("return 'still ran';")),
    ],
    vec![edge("t", "end"), edge("end", "after")],
  )
  .unwrap();

  Runtime::new(harness.ctx.clone()).start(&workflow).wait().await;

  assert_eq!(harness.states.status("after"), NodeStatus::Success);
}

#[tokio::test]
async fn test_cancel_before_start_runs_nothing() {
  let harness = Harness::new(MockHttpClient::new());
  let workflow =
    Workflow::from_parts(vec![node("t", NodeKind::Trigger)], vec![]).unwrap();

  let cancel = CancellationToken::new();
  cancel.cancel();
  let report = Runtime::new(harness.ctx.clone())
    .start_with_cancel(&workflow, cancel)
    .wait()
    .await;

  assert!(report.is_cancelled());
  assert_eq!(harness.states.status("t"), NodeStatus::Idle);
  let stopped: Vec<_> = harness
    .entries()
    .into_iter()
    .filter(|e| e.message == "workflow execution stopped")
    .collect();
  assert_eq!(stopped.len(), 1);
  assert_eq!(stopped[0].node_id, SYSTEM_NODE_ID);
  assert_eq!(stopped[0].level, LogLevel::Warning);
}

#[tokio::test]
async fn test_cancel_during_call_lets_running_node_finish() {
  let token = CancellationToken::new();
  let hook_token = token.clone();
  let http = MockHttpClient::new()
    .route("/chat/completions", 200, openai_reply("done anyway"))
    .on_send(move |_| hook_token.cancel());
  let harness = Harness::new(http);

  let workflow = Workflow::from_parts(
    vec![
      node("t", NodeKind::Trigger),
      node("ask", llm("Hello")),
      node("next", NodeKind::Terminator),
    ],
    vec![edge("t", "ask"), edge("ask", "next")],
  )
  .unwrap();

  let report = Runtime::new(harness.ctx.clone())
    .start_with_cancel(&workflow, token)
    .wait()
    .await;

  assert_eq!(report.outcome, RunOutcome::Cancelled);
  assert_eq!(harness.states.status("ask"), NodeStatus::Success);
  assert_eq!(harness.states.status("next"), NodeStatus::Idle);

  let last = harness.entries().pop().unwrap();
  assert_eq!(last.message, "workflow execution stopped");
  assert_eq!(last.node_id, "ask");
}

#[tokio::test]
async fn test_visit_limit_bounds_cycles() {
  let mut harness = Harness::new(MockHttpClient::new());
  harness.ctx = harness.ctx.clone().with_config(RuntimeConfig {
    max_node_visits: Some(10),
    endpoints: weft_config::ProviderEndpoints::all(BASE),
    ..RuntimeConfig::default()
  });

  let workflow = Workflow::from_parts(
    vec![
      node("t", NodeKind::Trigger),
      node("a", script("return 1;")),
      node("b", script("return 2;")),
    ],
    vec![edge("t", "a"), edge("a", "b"), edge("b", "a")],
  )
  .unwrap();

  let report = Runtime::new(harness.ctx.clone()).start(&workflow).wait().await;

  assert_eq!(report.outcome, RunOutcome::VisitLimit);
  assert_eq!(report.visits, 10);
  assert!(report.has_errors());
  let last = harness.entries().pop().unwrap();
  assert_eq!(last.node_id, SYSTEM_NODE_ID);
  assert_eq!(last.level, LogLevel::Error);
}

#[tokio::test]
async fn test_state_is_cleared_between_runs() {
  let harness = Harness::new(MockHttpClient::new());
  let runtime = Runtime::new(harness.ctx.clone());

  let first = Workflow::from_parts(
    vec![node("t", NodeKind::Trigger), node("x", script("return 1;"))],
    vec![edge("t", "x")],
  )
  .unwrap();
  runtime.start(&first).wait().await;
  assert_eq!(harness.states.status("x"), NodeStatus::Success);

  let second = Workflow::from_parts(vec![node("t", NodeKind::Trigger)], vec![]).unwrap();
  runtime.start(&second).wait().await;
  assert_eq!(harness.states.status("x"), NodeStatus::Idle);
}

#[tokio::test]
async fn test_log_stream_is_fresh_per_run() {
  let harness = Harness::new(MockHttpClient::new());
  let runtime = Runtime::new(harness.ctx.clone());
  let workflow = Workflow::from_parts(
    vec![node("t", NodeKind::Trigger), node("x", script("return 1;"))],
    vec![edge("t", "x")],
  )
  .unwrap();

  runtime.start(&workflow).wait().await;
  let first = harness.entries();
  assert!(!first.is_empty());

  runtime.start(&workflow).wait().await;
  let second = harness.entries();

  assert_eq!(second.len(), first.len());
  assert!(second.iter().all(|entry| !first.iter().any(|old| old.id == entry.id)));
}

#[tokio::test]
async fn test_unsupported_language_never_executes() {
  let harness = Harness::new(MockHttpClient::new());
  let workflow = Workflow::from_parts(
    vec![
      node("t", NodeKind::Trigger),
      node(
        "py",
        NodeKind::Script(ScriptConfig {
          code: "print('hi')".to_string(),
          language: "python".to_string(),
        }),
      ),
    ],
    vec![edge("t", "py")],
  )
  .unwrap();

  Runtime::new(harness.ctx.clone()).start(&workflow).wait().await;

  let state = harness.states.get("py").unwrap();
  assert_eq!(state.status, NodeStatus::Error);
  assert!(state.error.unwrap().contains("python"));
  assert!(
    !harness
      .messages("py")
      .contains(&"function executed".to_string())
  );
}

#[tokio::test]
async fn test_missing_required_field_is_reported_before_any_call() {
  let harness = Harness::new(MockHttpClient::new());
  let workflow = Workflow::from_parts(
    vec![
      node("t", NodeKind::Trigger),
      node(
        "ask",
        NodeKind::Llm(LlmConfig {
          provider: "openai".to_string(),
          ..LlmConfig::default()
        }),
      ),
    ],
    vec![edge("t", "ask")],
  )
  .unwrap();

  Runtime::new(harness.ctx.clone()).start(&workflow).wait().await;

  let state = harness.states.get("ask").unwrap();
  assert_eq!(state.status, NodeStatus::Error);
  assert!(state.error.unwrap().contains("model"));
  assert!(harness.http.requests().is_empty());
}

#[tokio::test]
async fn test_script_console_lines_are_logged() {
  let harness = Harness::new(MockHttpClient::new());
  let workflow = Workflow::from_parts(
    vec![
      node("t", NodeKind::Trigger),
      node("s", script("console.log('checking', input.message); return 3;")),
    ],
    vec![edge("t", "s")],
  )
  .unwrap();

  Runtime::new(harness.ctx.clone()).start(&workflow).wait().await;

  let messages = harness.messages("s");
  assert!(messages.contains(&"checking workflow started".to_string()));
  assert_eq!(messages.last().unwrap(), "function executed");
}

#[tokio::test]
async fn test_variables_resolve_into_prompts() {
  let http = MockHttpClient::new().route("/chat/completions", 200, openai_reply("ok"));
  let harness = Harness::new(http);
  harness
    .variables
    .set(Scope::Global, "tone", json!("cheerful"));

  let workflow = Workflow::from_parts(
    vec![
      node("t", NodeKind::Trigger),
      node("ask", llm("Be {{global.tone}}: {{input.message}}")),
    ],
    vec![edge("t", "ask")],
  )
  .unwrap();

  Runtime::new(harness.ctx.clone()).start(&workflow).wait().await;

  let prompt = harness.http.last_body()["messages"][0]["content"].clone();
  assert_eq!(
    prompt,
    json!(
      "Be cheerful: workflow started\n\nPrevious output: {\"message\":\"workflow started\"}"
    )
  );
}

#[tokio::test]
async fn test_runs_are_independent() {
  let harness = Harness::new(MockHttpClient::new());
  let runtime = Runtime::new(harness.ctx.clone());
  let workflow = Workflow::from_parts(vec![node("t", NodeKind::Trigger)], vec![]).unwrap();

  let first = runtime.start(&workflow);
  let second = runtime.start(&workflow);
  assert_ne!(first.run_id(), second.run_id());

  first.cancel_token().cancel();
  assert_eq!(first.wait().await.outcome, RunOutcome::Cancelled);
  assert_eq!(second.wait().await.outcome, RunOutcome::Completed);
}
