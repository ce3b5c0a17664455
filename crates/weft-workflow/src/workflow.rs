use std::collections::HashMap;

use weft_config::{EdgeDef, NodeDef, WorkflowDef};

use crate::error::WorkflowError;
use crate::graph::Graph;

/// A validated workflow, immutable for the duration of a run.
#[derive(Debug, Clone)]
pub struct Workflow {
  pub id: String,
  pub name: String,
  nodes: Vec<NodeDef>,
  edges: Vec<EdgeDef>,
  index: HashMap<String, usize>,
  graph: Graph,
}

impl Workflow {
  /// Validate a workflow definition.
  ///
  /// Rejects duplicate node ids and edges that reference unknown nodes. A
  /// missing trigger is not a validation error; the engine reports it when
  /// the workflow is run.
  pub fn new(def: WorkflowDef) -> Result<Self, WorkflowError> {
    let mut index = HashMap::with_capacity(def.nodes.len());
    for (position, node) in def.nodes.iter().enumerate() {
      if index.insert(node.id.clone(), position).is_some() {
        return Err(WorkflowError::DuplicateNode(node.id.clone()));
      }
    }

    for edge in &def.edges {
      if !index.contains_key(&edge.source) || !index.contains_key(&edge.target) {
        return Err(WorkflowError::InvalidEdge {
          edge_id: edge.id.clone(),
          from: edge.source.clone(),
          to: edge.target.clone(),
        });
      }
    }

    let graph = Graph::new(&def.nodes, &def.edges);

    Ok(Self {
      id: def.id,
      name: def.name,
      nodes: def.nodes,
      edges: def.edges,
      index,
      graph,
    })
  }

  /// Convenience constructor from bare node and edge lists.
  pub fn from_parts(nodes: Vec<NodeDef>, edges: Vec<EdgeDef>) -> Result<Self, WorkflowError> {
    Self::new(WorkflowDef {
      nodes,
      edges,
      ..WorkflowDef::default()
    })
  }

  /// Get a node by ID.
  pub fn get_node(&self, node_id: &str) -> Option<&NodeDef> {
    self.index.get(node_id).map(|&i| &self.nodes[i])
  }

  pub fn nodes(&self) -> &[NodeDef] {
    &self.nodes
  }

  pub fn edges(&self) -> &[EdgeDef] {
    &self.edges
  }

  /// Edges leaving `node_id`, in edge-list order.
  pub fn outgoing_edges(&self, node_id: &str) -> impl Iterator<Item = &EdgeDef> {
    self
      .graph
      .outgoing(node_id)
      .iter()
      .map(move |&i| &self.edges[i])
  }

  /// The node a run starts from: the first trigger in node order.
  pub fn trigger(&self) -> Option<&NodeDef> {
    self.graph.trigger().and_then(|id| self.get_node(id))
  }
}
