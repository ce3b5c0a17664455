//! Run log stream.
//!
//! [`LogEntry`] records are the user-facing account of a run: which node did
//! what, in emission order. They are separate from diagnostics, but
//! [`InMemoryLogSink`] mirrors every entry into `tracing` so both views agree.

mod entry;
mod sink;

pub use entry::{LogEntry, LogLevel, SYSTEM_NODE_ID};
pub use sink::{InMemoryLogSink, LogSink};
