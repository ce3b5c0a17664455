use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
  #[error("duplicate node id: {0}")]
  DuplicateNode(String),

  #[error("edge '{edge_id}' references unknown node: source={from}, target={to}")]
  InvalidEdge {
    edge_id: String,
    from: String,
    to: String,
  },
}
