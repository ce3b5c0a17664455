/// Errors that can occur while running a workflow through the engine.
///
/// Node failures are not errors; they are reported through the run summary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
  /// The run finished but its summary could not be recorded.
  #[error("failed to record run history")]
  History(#[from] weft_store::Error),
}
