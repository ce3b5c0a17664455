mod settings;

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use weft_config::{RuntimeConfig, WorkflowDef};
use weft_engine::WorkflowEngine;
use weft_host_config::EnvCredentialProvider;
use weft_host_http::{HttpPolicy, ReqwestHttpClient};
use weft_host_kv::{InMemoryVariableStore, VariableStore};
use weft_runtime::{RunContext, executors};
use weft_store::{DEFAULT_RECENT_LIMIT, FileHistoryStore, HistoryStore};

use settings::{HISTORY_FILE, VarAssignment, load_config, parse_var};

/// Weft - run workflow graphs of model calls, HTTP calls and scripts
#[derive(Parser)]
#[command(name = "weft")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.weft)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  /// Runtime settings file (default: <data-dir>/config.toml when present)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Run a workflow or a single node
  Run {
    #[command(subcommand)]
    target: RunTarget,
  },

  /// Inspect recorded runs
  History {
    #[command(subcommand)]
    action: HistoryAction,
  },
}

#[derive(Subcommand)]
enum RunTarget {
  /// Run an entire workflow
  Workflow {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,

    /// Variable for template tokens, e.g. `global.name=Ada`
    #[arg(long = "var", value_parser = parse_var)]
    vars: Vec<VarAssignment>,
  },

  /// Run a single node, reading its previous output from stdin
  Node {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,

    /// The node ID to execute
    #[arg(long)]
    node: String,

    /// Variable for template tokens, e.g. `workflow.limit=10`
    #[arg(long = "var", value_parser = parse_var)]
    vars: Vec<VarAssignment>,
  },
}

#[derive(Subcommand)]
enum HistoryAction {
  /// List recent runs, newest first
  List {
    #[arg(long, default_value_t = DEFAULT_RECENT_LIMIT)]
    limit: usize,
  },
  /// Show one run with its logs
  Show { id: String },
  /// Delete one run
  Delete { id: String },
  /// Delete every recorded run
  Clear,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("weft=info,warn")),
    )
    .with_target(false)
    .with_writer(io::stderr)
    .init();

  let cli = Cli::parse();

  let data_dir = match cli.data_dir {
    Some(dir) => dir,
    None => dirs::home_dir()
      .context("could not determine home directory")?
      .join(".weft"),
  };

  let rt = tokio::runtime::Runtime::new()?;

  match cli.command {
    Some(Commands::Run { target }) => {
      let config = load_config(cli.config.as_deref(), &data_dir)?;
      match target {
        RunTarget::Workflow {
          workflow_file,
          vars,
        } => rt.block_on(run_workflow(workflow_file, vars, config, &data_dir)),
        RunTarget::Node {
          workflow_file,
          node,
          vars,
        } => rt.block_on(run_node(workflow_file, node, vars, config)),
      }
    }
    Some(Commands::History { action }) => rt.block_on(history(action, &data_dir)),
    None => {
      println!("weft - use --help to see available commands");
      Ok(())
    }
  }
}

async fn run_workflow(
  workflow_file: PathBuf,
  vars: Vec<VarAssignment>,
  config: RuntimeConfig,
  data_dir: &Path,
) -> Result<()> {
  let workflow_def = read_workflow(&workflow_file).await?;
  eprintln!(
    "Loaded workflow: {} ({} nodes, {} edges)",
    workflow_def.name,
    workflow_def.nodes.len(),
    workflow_def.edges.len()
  );

  let ctx = build_context(config, &vars)?;
  let states = ctx.states.clone();
  let history = FileHistoryStore::new(data_dir.join(HISTORY_FILE));
  let engine = WorkflowEngine::with_history(ctx, history);

  let run = engine.run(workflow_def);
  tokio::pin!(run);
  let result = tokio::select! {
    result = &mut run => result,
    _ = tokio::signal::ctrl_c() => {
      eprintln!("Stopping after the current node...");
      engine.cancel();
      run.await
    }
  }
  .context("workflow run failed")?;

  eprintln!(
    "Run {} finished: {} ({} ms)",
    result.history_id,
    result.summary.status,
    result.summary.duration_ms.unwrap_or_default()
  );

  let outputs = result
    .report
    .as_ref()
    .map(|report| json!(report.outputs))
    .unwrap_or_else(|| json!({}));
  let output = json!({
    "id": result.history_id,
    "status": result.summary.status,
    "durationMs": result.summary.duration_ms,
    "states": states.snapshot(),
    "outputs": outputs,
    "logs": result.summary.logs,
  });

  println!("{}", serde_json::to_string_pretty(&output)?);

  Ok(())
}

async fn run_node(
  workflow_file: PathBuf,
  node_id: String,
  vars: Vec<VarAssignment>,
  config: RuntimeConfig,
) -> Result<()> {
  let workflow_def = read_workflow(&workflow_file).await?;

  let node = workflow_def
    .nodes
    .iter()
    .find(|n| n.id == node_id)
    .with_context(|| format!("node '{}' not found in workflow", node_id))?;

  eprintln!("Running node: {} (kind: {})", node_id, node.kind.name());

  let previous = read_payload_from_stdin()?;
  eprintln!("Previous output: {}", previous);

  let ctx = build_context(config, &vars)?;
  let output = executors::execute(node, &previous, &ctx)
    .await
    .with_context(|| format!("node '{}' failed", node_id))?;

  eprintln!("Node execution completed");
  println!("{}", serde_json::to_string_pretty(&output)?);

  Ok(())
}

async fn history(action: HistoryAction, data_dir: &Path) -> Result<()> {
  let store = FileHistoryStore::new(data_dir.join(HISTORY_FILE));

  match action {
    HistoryAction::List { limit } => {
      let entries = store.recent(limit).await.context("failed to read history")?;
      if entries.is_empty() {
        eprintln!("No runs recorded");
      }
      for entry in entries {
        println!(
          "{}  {}  {:<9}  {}",
          entry.id,
          entry.summary.started_at.to_rfc3339(),
          entry.summary.status.to_string(),
          entry.summary.name
        );
      }
    }
    HistoryAction::Show { id } => {
      let entry = store
        .get(&id)
        .await
        .with_context(|| format!("failed to read run '{}'", id))?;
      println!("{}", serde_json::to_string_pretty(&entry)?);
    }
    HistoryAction::Delete { id } => {
      store
        .delete(&id)
        .await
        .with_context(|| format!("failed to delete run '{}'", id))?;
      eprintln!("Deleted {}", id);
    }
    HistoryAction::Clear => {
      store.clear().await.context("failed to clear history")?;
      eprintln!("History cleared");
    }
  }

  Ok(())
}

async fn read_workflow(workflow_file: &Path) -> Result<WorkflowDef> {
  let content = tokio::fs::read_to_string(workflow_file)
    .await
    .with_context(|| format!("failed to read workflow file: {}", workflow_file.display()))?;

  serde_json::from_str(&content)
    .with_context(|| format!("failed to parse workflow file: {}", workflow_file.display()))
}

/// Collaborators for a CLI run: reqwest transport, credentials from the
/// environment, and the `--var` assignments as the variable store.
fn build_context(config: RuntimeConfig, vars: &[VarAssignment]) -> Result<RunContext> {
  let policy = match &config.allowed_hosts {
    Some(hosts) => HttpPolicy::allow_hosts(hosts.clone()),
    None => HttpPolicy::allow_all(),
  };
  let timeout = config.http_timeout_ms.map(Duration::from_millis);
  let http = ReqwestHttpClient::new(policy, timeout).context("failed to create HTTP client")?;

  let variables = InMemoryVariableStore::new();
  for var in vars {
    variables.set(var.scope, &var.key, var.value.clone());
  }

  Ok(
    RunContext::new(Arc::new(http))
      .with_variables(Arc::new(variables))
      .with_credentials(Arc::new(EnvCredentialProvider))
      .with_config(config),
  )
}

fn read_payload_from_stdin() -> Result<serde_json::Value> {
  use std::io::IsTerminal;

  if io::stdin().is_terminal() {
    // No stdin pipe
    Ok(serde_json::Value::Null)
  } else {
    let mut input = String::new();
    io::stdin()
      .read_to_string(&mut input)
      .context("failed to read payload from stdin")?;

    if input.trim().is_empty() {
      Ok(serde_json::Value::Null)
    } else {
      serde_json::from_str(&input).context("failed to parse payload JSON from stdin")
    }
  }
}
