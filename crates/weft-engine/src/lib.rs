//! Weft Engine
//!
//! The [`WorkflowEngine`] is the entry point collaborators use: it validates
//! a [`WorkflowDef`](weft_config::WorkflowDef), runs it through the runtime,
//! and records a [`RunSummary`](weft_store::RunSummary) in a
//! [`HistoryStore`](weft_store::HistoryStore).
//!
//! # Architecture
//!
//! ```text
//! WorkflowEngine
//! ├── run(def) -> EngineRun
//! │   ├── Workflow::new(def)       validation
//! │   ├── Runtime::start(...)      traversal, one WorkflowRun per call
//! │   └── HistoryStore::add(...)   post-run summary
//! └── cancel()                     stops the active runs at the next node
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use weft_engine::WorkflowEngine;
//!
//! let engine = WorkflowEngine::new(ctx);
//! let run = engine.run(def).await?;
//! println!("{}: {}", run.summary.name, run.summary.status);
//! ```

mod capture;
mod engine;
mod error;

pub use capture::CapturingLogSink;
pub use engine::{EngineRun, WorkflowEngine, summary_status};
pub use error::EngineError;
