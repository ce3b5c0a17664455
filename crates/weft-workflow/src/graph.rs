use std::collections::HashMap;

use weft_config::{EdgeDef, NodeDef};

/// Graph structure for traversal.
#[derive(Debug, Clone)]
pub(crate) struct Graph {
  /// node_id -> indices into the edge list, in edge-list order.
  outgoing: HashMap<String, Vec<usize>>,
  /// First trigger node in node order.
  trigger: Option<String>,
}

impl Graph {
  /// Build a graph from nodes and edges.
  pub(crate) fn new(nodes: &[NodeDef], edges: &[EdgeDef]) -> Self {
    let mut outgoing: HashMap<String, Vec<usize>> = HashMap::new();

    for node in nodes {
      outgoing.entry(node.id.clone()).or_default();
    }

    for (index, edge) in edges.iter().enumerate() {
      outgoing.entry(edge.source.clone()).or_default().push(index);
    }

    // Extra trigger nodes are ignored, not rejected.
    let trigger = nodes
      .iter()
      .find(|node| node.kind.is_trigger())
      .map(|node| node.id.clone());

    Self { outgoing, trigger }
  }

  /// The node a run starts from.
  pub(crate) fn trigger(&self) -> Option<&str> {
    self.trigger.as_deref()
  }

  /// Indices of the edges leaving `node_id`, in edge-list order.
  pub(crate) fn outgoing(&self, node_id: &str) -> &[usize] {
    self
      .outgoing
      .get(node_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }
}
