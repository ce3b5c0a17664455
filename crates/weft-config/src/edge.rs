use serde::{Deserialize, Serialize};

/// A directed link between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeDef {
  pub id: String,
  pub source: String,
  pub target: String,
  /// Branch label; only meaningful on edges leaving a condition node.
  #[serde(default, alias = "sourceHandle", skip_serializing_if = "Option::is_none")]
  pub branch: Option<String>,
}

/// Which side of a condition an edge belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
  True,
  False,
  /// Any other label. Never selected when leaving a condition node.
  Other,
}

impl EdgeDef {
  pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      source: source.into(),
      target: target.into(),
      branch: None,
    }
  }

  pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
    self.branch = Some(branch.into());
    self
  }

  /// The branch this edge belongs to. An unlabeled edge counts as `true`.
  pub fn branch(&self) -> Branch {
    match self.branch.as_deref() {
      None | Some("true") => Branch::True,
      Some("false") => Branch::False,
      Some(_) => Branch::Other,
    }
  }

  /// Whether this edge is followed after a condition evaluated to `outcome`.
  pub fn matches_outcome(&self, outcome: bool) -> bool {
    matches!(
      (self.branch(), outcome),
      (Branch::True, true) | (Branch::False, false)
    )
  }
}
