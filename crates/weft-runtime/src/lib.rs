//! Workflow runtime for weft.
//!
//! This crate executes a validated [`Workflow`](weft_workflow::Workflow) one
//! node at a time.
//!
//! # Architecture
//!
//! ```text
//! Runtime
//! └── start(workflow) -> WorkflowRun
//!
//! WorkflowRun
//! ├── cancel_token() - cooperative stop, checked before each node visit
//! └── wait() - depth-first traversal from the trigger node
//!
//! executors::execute(node, previous, ctx)
//! └── trigger | llm | http | script | condition | image | terminator
//! ```
//!
//! Every collaborator a node needs (variables, credentials, log sink, state
//! store, HTTP transport, settings) is carried by an explicit [`RunContext`].
//! Node failures never fail the run: they are recorded in the state store and
//! the log stream, and only the branch below the failed node is abandoned.
//!
//! # Usage
//!
//! ```ignore
//! use weft_runtime::{RunContext, Runtime};
//!
//! let ctx = RunContext::new(Arc::new(ReqwestHttpClient::default()))
//!   .with_log_sink(logs.clone());
//! let runtime = Runtime::new(ctx);
//!
//! let run = runtime.start(&workflow);
//! let cancel = run.cancel_token();
//! let report = run.wait().await;
//! ```

mod context;
mod error;
pub mod executors;
mod prompt;
pub mod providers;
mod run;

pub use context::RunContext;
pub use error::NodeError;
pub use run::{RunOutcome, RunReport, Runtime, WorkflowRun};
