//! Graph store: node registry and directed, property-carrying edges
//!
//! The canonical graph is built once per analysis run and is read-only
//! for ordinary queries: every query method takes `&self`, mutation
//! requires `&mut self`, so concurrent read-only traversal is safe by
//! construction. Clones deep-copy the edge collections (including
//! per-edge property maps) but share the immutable node registry.

use crate::error::{GraphError, Result};
use crate::types::{Edge, EdgeType, Node, NodeId, NodeType};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Immutable node registry, shared by reference between a graph and
/// its simulation clones. Iteration follows insertion order.
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    nodes: HashMap<NodeId, Node>,
    order: Vec<NodeId>,
}

impl NodeRegistry {
    fn insert(&mut self, node: Node) {
        if !self.nodes.contains_key(&node.id) {
            self.order.push(node.id.clone());
        }
        self.nodes.insert(node.id.clone(), node);
    }

    /// Look up a node by id
    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// True if the id is registered
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Nodes in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Number of registered nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when no nodes are registered
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// The canonical directed access graph.
///
/// One edge per `(source, target)` pair; re-adding an edge replaces
/// its data. Successor iteration order is the insertion order of edge
/// additions, which is also the documented tie-break order for
/// breadth-first search.
#[derive(Debug, Clone, Default)]
pub struct AccessGraph {
    registry: Arc<NodeRegistry>,
    successors: HashMap<NodeId, Vec<(NodeId, Edge)>>,
    predecessors: HashMap<NodeId, Vec<NodeId>>,
    edge_count: usize,
}

impl AccessGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared node registry
    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    /// Look up a node by id
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.registry.get(id)
    }

    /// True if the id is in the node registry
    pub fn contains_node(&self, id: &str) -> bool {
        self.registry.contains(id)
    }

    /// Nodes of a given type, in registry insertion order
    pub fn nodes_of_type(&self, node_type: NodeType) -> impl Iterator<Item = &Node> {
        self.registry.iter().filter(move |n| n.node_type == node_type)
    }

    /// Number of registered nodes
    pub fn node_count(&self) -> usize {
        self.registry.len()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// True if a direct edge source → target exists.
    /// Absent ids behave as "no edges".
    pub fn has_edge(&self, source: &str, target: &str) -> bool {
        self.successors
            .get(source)
            .map(|out| out.iter().any(|(t, _)| t == target))
            .unwrap_or(false)
    }

    /// Outgoing edges of a node in insertion order.
    /// Absent ids behave as "no edges".
    pub fn successors(&self, source: &str) -> &[(NodeId, Edge)] {
        self.successors.get(source).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ids of nodes with an edge into `target`, in insertion order.
    /// Absent ids behave as "no edges".
    pub fn predecessors(&self, target: &str) -> &[NodeId] {
        self.predecessors.get(target).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Edge data for source → target, if the edge exists
    pub fn edge_data(&self, source: &str, target: &str) -> Option<&Edge> {
        self.successors
            .get(source)?
            .iter()
            .find(|(t, _)| t == target)
            .map(|(_, e)| e)
    }

    /// Register a node. Used by the builder during construction and by
    /// the simulator when a hypothetical binding references a role the
    /// snapshot never saw. Copy-on-write: a clone that registers a node
    /// does not affect the graph it was cloned from.
    pub fn register_node(&mut self, node: Node) {
        Arc::make_mut(&mut self.registry).insert(node);
    }

    /// Add (or replace) the edge source → target.
    ///
    /// # Errors
    ///
    /// Fails with `UnknownNode` if either endpoint is not registered.
    pub fn add_edge(&mut self, source: &str, target: &str, edge: Edge) -> Result<()> {
        if !self.registry.contains(source) {
            return Err(GraphError::UnknownNode(source.to_string()));
        }
        if !self.registry.contains(target) {
            return Err(GraphError::UnknownNode(target.to_string()));
        }

        let out = self.successors.entry(source.to_string()).or_default();
        if let Some(slot) = out.iter_mut().find(|(t, _)| t == target) {
            slot.1 = edge;
            return Ok(());
        }
        out.push((target.to_string(), edge));
        self.predecessors
            .entry(target.to_string())
            .or_default()
            .push(source.to_string());
        self.edge_count += 1;
        Ok(())
    }

    /// Remove the edge source → target, returning whether it existed.
    ///
    /// # Errors
    ///
    /// Fails with `UnknownNode` if either endpoint is not registered.
    pub fn remove_edge(&mut self, source: &str, target: &str) -> Result<bool> {
        if !self.registry.contains(source) {
            return Err(GraphError::UnknownNode(source.to_string()));
        }
        if !self.registry.contains(target) {
            return Err(GraphError::UnknownNode(target.to_string()));
        }

        let removed = match self.successors.get_mut(source) {
            Some(out) => {
                let before = out.len();
                out.retain(|(t, _)| t != target);
                before != out.len()
            }
            None => false,
        };
        if removed {
            if let Some(inc) = self.predecessors.get_mut(target) {
                inc.retain(|s| s != source);
            }
            self.edge_count -= 1;
        }
        Ok(removed)
    }
}

/// Builder for the canonical graph, the input contract for the
/// external collector layer. Edge types arrive as lowercase
/// snake-case wire tokens; unknown tokens are rejected unless lenient
/// ingestion is enabled.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: AccessGraph,
    lenient_edge_types: bool,
}

impl GraphBuilder {
    /// Create a builder with strict edge-type parsing
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable lenient edge-type ingestion
    pub fn lenient_edge_types(mut self, lenient: bool) -> Self {
        self.lenient_edge_types = lenient;
        self
    }

    /// Register a node
    pub fn add_node(&mut self, node: Node) -> &mut Self {
        self.graph.register_node(node);
        self
    }

    /// Add an edge from its wire representation.
    ///
    /// # Errors
    ///
    /// Fails with `UnknownEdgeType` for a token outside the closed
    /// vocabulary (unless lenient), or `UnknownNode` for unregistered
    /// endpoints.
    pub fn add_edge(
        &mut self,
        source: &str,
        target: &str,
        type_token: &str,
        properties: HashMap<String, Value>,
    ) -> Result<()> {
        let edge_type = if self.lenient_edge_types {
            EdgeType::parse_lenient(type_token)
        } else {
            type_token.parse()?
        };
        let edge = Edge {
            edge_type,
            properties,
        };
        self.graph.add_edge(source, target, edge)
    }

    /// Add an already-typed edge
    pub fn add_typed_edge(&mut self, source: &str, target: &str, edge: Edge) -> Result<()> {
        self.graph.add_edge(source, target, edge)
    }

    /// Finalize the graph
    pub fn build(self) -> AccessGraph {
        self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn two_node_graph() -> AccessGraph {
        let mut builder = GraphBuilder::new();
        builder.add_node(Node::new("user:alice@example.com", NodeType::User, "alice"));
        builder.add_node(Node::new("project:demo", NodeType::Project, "demo"));
        builder
            .add_edge("user:alice@example.com", "project:demo", "can_write", HashMap::new())
            .unwrap();
        builder.build()
    }

    #[test]
    fn test_basic_edge_queries() {
        let graph = two_node_graph();
        assert!(graph.has_edge("user:alice@example.com", "project:demo"));
        assert!(!graph.has_edge("project:demo", "user:alice@example.com"));
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(
            graph
                .edge_data("user:alice@example.com", "project:demo")
                .unwrap()
                .edge_type,
            EdgeType::CanWrite
        );
    }

    #[test]
    fn test_absent_ids_behave_as_no_edges() {
        let graph = two_node_graph();
        assert!(graph.successors("user:nobody@example.com").is_empty());
        assert!(graph.predecessors("project:missing").is_empty());
        assert!(!graph.has_edge("user:nobody@example.com", "project:demo"));
        assert!(graph.edge_data("user:nobody@example.com", "project:demo").is_none());
    }

    #[test]
    fn test_mutating_unknown_node_fails() {
        let mut graph = two_node_graph();
        let err = graph
            .add_edge("user:ghost@example.com", "project:demo", Edge::new(EdgeType::CanRead))
            .unwrap_err();
        assert_eq!(err, GraphError::UnknownNode("user:ghost@example.com".to_string()));

        let err = graph.remove_edge("project:demo", "project:missing").unwrap_err();
        assert_eq!(err, GraphError::UnknownNode("project:missing".to_string()));
    }

    #[test]
    fn test_readd_replaces_edge_data() {
        let mut graph = two_node_graph();
        graph
            .add_edge(
                "user:alice@example.com",
                "project:demo",
                Edge::new(EdgeType::CanAdmin).with_property("via", json!("binding")),
            )
            .unwrap();

        assert_eq!(graph.edge_count(), 1);
        let edge = graph.edge_data("user:alice@example.com", "project:demo").unwrap();
        assert_eq!(edge.edge_type, EdgeType::CanAdmin);
        assert_eq!(edge.property_str("via"), Some("binding"));
    }

    #[test]
    fn test_successor_insertion_order() {
        let mut builder = GraphBuilder::new();
        builder.add_node(Node::new("user:a@example.com", NodeType::User, "a"));
        for name in ["p1", "p2", "p3"] {
            builder.add_node(Node::new(format!("project:{}", name), NodeType::Project, name));
        }
        for name in ["p2", "p1", "p3"] {
            builder
                .add_edge(
                    "user:a@example.com",
                    &format!("project:{}", name),
                    "can_read",
                    HashMap::new(),
                )
                .unwrap();
        }
        let graph = builder.build();

        let order: Vec<&str> = graph
            .successors("user:a@example.com")
            .iter()
            .map(|(t, _)| t.as_str())
            .collect();
        assert_eq!(order, vec!["project:p2", "project:p1", "project:p3"]);
    }

    #[test]
    fn test_clone_isolation() {
        let graph = two_node_graph();
        let mut clone = graph.clone();

        clone.remove_edge("user:alice@example.com", "project:demo").unwrap();
        assert!(!clone.has_edge("user:alice@example.com", "project:demo"));
        assert!(graph.has_edge("user:alice@example.com", "project:demo"));

        let mut clone = graph.clone();
        clone.register_node(Node::new("role:roles/viewer", NodeType::Role, "roles/viewer"));
        clone
            .add_edge("user:alice@example.com", "role:roles/viewer", Edge::new(EdgeType::HasRole))
            .unwrap();
        assert_eq!(clone.edge_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert!(!graph.contains_node("role:roles/viewer"));
    }

    #[test]
    fn test_strict_builder_rejects_unknown_edge_token() {
        let mut builder = GraphBuilder::new();
        builder.add_node(Node::new("user:a@example.com", NodeType::User, "a"));
        builder.add_node(Node::new("project:p", NodeType::Project, "p"));
        let err = builder
            .add_edge("user:a@example.com", "project:p", "owns", HashMap::new())
            .unwrap_err();
        assert_eq!(err, GraphError::UnknownEdgeType("owns".to_string()));
    }

    #[test]
    fn test_lenient_builder_defaults_unknown_edge_token() {
        let mut builder = GraphBuilder::new().lenient_edge_types(true);
        builder.add_node(Node::new("user:a@example.com", NodeType::User, "a"));
        builder.add_node(Node::new("project:p", NodeType::Project, "p"));
        builder
            .add_edge("user:a@example.com", "project:p", "owns", HashMap::new())
            .unwrap();

        let graph = builder.build();
        assert_eq!(
            graph.edge_data("user:a@example.com", "project:p").unwrap().edge_type,
            EdgeType::HasAccessTo
        );
    }

    #[test]
    fn test_remove_missing_edge_is_not_an_error() {
        let mut graph = two_node_graph();
        assert!(!graph.remove_edge("project:demo", "user:alice@example.com").unwrap());
        assert_eq!(graph.edge_count(), 1);
    }
}
