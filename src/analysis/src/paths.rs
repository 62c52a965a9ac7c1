//! Path discovery over the access graph
//!
//! Breadth-first shortest paths, bounded enumeration of simple paths,
//! and the specialized attack-path queries built on top of them
//! (role reachability, resource access, impersonation, lateral
//! movement, privilege escalation).
//!
//! All queries are read-only and exploratory: unknown ids yield empty
//! results, never errors. Enumeration is bounded by the configured
//! maximum path length and optional per-query result cap, so it
//! terminates on cyclic and dense graphs alike.

use crate::risk::RiskScorer;
use iamscope_graph::{
    role_node_id, AccessGraph, AccessLevel, AnalysisConfig, AttackPath, Edge, NodeId, NodeType,
};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, warn};

/// Computes shortest paths and bounded simple-path enumeration
/// between nodes of an [`AccessGraph`].
#[derive(Debug, Clone, Copy)]
pub struct PathFinder<'a> {
    graph: &'a AccessGraph,
    config: &'a AnalysisConfig,
    scorer: RiskScorer<'a>,
}

impl<'a> PathFinder<'a> {
    /// Create a finder over the given graph and configuration
    pub fn new(graph: &'a AccessGraph, config: &'a AnalysisConfig) -> Self {
        Self {
            graph,
            config,
            scorer: RiskScorer::new(config),
        }
    }

    /// The underlying graph
    pub fn graph(&self) -> &AccessGraph {
        self.graph
    }

    fn make_path(&self, nodes: Vec<NodeId>, edges: Vec<Edge>, description: String) -> AttackPath {
        let risk = self.scorer.path_risk(&edges);
        AttackPath {
            nodes,
            edges,
            risk,
            description,
        }
    }

    /// Unweighted breadth-first shortest path from `source` to
    /// `target`. Ties follow adjacency iteration order, which is the
    /// insertion order of edges. Returns `None` when either id is
    /// unknown or the target is unreachable.
    pub fn shortest_path(&self, source: &str, target: &str) -> Option<AttackPath> {
        if source == target
            || !self.graph.contains_node(source)
            || !self.graph.contains_node(target)
        {
            return None;
        }

        let mut parent: HashMap<NodeId, NodeId> = HashMap::new();
        let mut queue: VecDeque<NodeId> = VecDeque::new();
        queue.push_back(source.to_string());

        'search: while let Some(current) = queue.pop_front() {
            for (next, _) in self.graph.successors(&current) {
                if next == source || parent.contains_key(next) {
                    continue;
                }
                parent.insert(next.clone(), current.clone());
                if next == target {
                    break 'search;
                }
                queue.push_back(next.clone());
            }
        }

        parent.get(target)?;

        // Walk back from the target to reconstruct the node sequence.
        let mut nodes: Vec<NodeId> = Vec::new();
        let mut cursor = Some(target.to_string());
        while let Some(current) = cursor {
            cursor = parent.get(&current).cloned();
            nodes.push(current);
        }
        nodes.reverse();

        let edges: Vec<Edge> = nodes
            .windows(2)
            .filter_map(|pair| self.graph.edge_data(&pair[0], &pair[1]).cloned())
            .collect();
        debug_assert_eq!(edges.len() + 1, nodes.len());

        let description = format!("Path from {} to {}", source, target);
        Some(self.make_path(nodes, edges, description))
    }

    /// Depth-first enumeration of simple paths from `source` to
    /// `target` with at most `max_len` edges (configured default when
    /// `None`). The in-progress node set guarantees no node repeats and
    /// termination under cycles; the configured result cap, when set,
    /// bounds the output on dense graphs. Results are stable-sorted by
    /// descending risk.
    pub fn all_simple_paths(
        &self,
        source: &str,
        target: &str,
        max_len: Option<usize>,
    ) -> Vec<AttackPath> {
        let max_len = max_len.unwrap_or(self.config.max_path_length);
        let mut paths: Vec<AttackPath> = Vec::new();

        if source == target
            || !self.graph.contains_node(source)
            || !self.graph.contains_node(target)
            || max_len == 0
        {
            return paths;
        }

        let mut nodes: Vec<NodeId> = vec![source.to_string()];
        let mut edges: Vec<Edge> = Vec::new();
        let mut on_path: HashSet<NodeId> = HashSet::new();
        on_path.insert(source.to_string());

        self.dfs(
            source,
            target,
            max_len,
            &mut nodes,
            &mut edges,
            &mut on_path,
            &mut paths,
        );

        paths.sort_by(|a, b| b.risk.partial_cmp(&a.risk).unwrap_or(std::cmp::Ordering::Equal));
        paths
    }

    fn at_result_cap(&self, paths: &[AttackPath]) -> bool {
        self.config
            .max_paths_per_query
            .map(|cap| paths.len() >= cap)
            .unwrap_or(false)
    }

    #[allow(clippy::too_many_arguments)]
    fn dfs(
        &self,
        current: &str,
        target: &str,
        max_len: usize,
        nodes: &mut Vec<NodeId>,
        edges: &mut Vec<Edge>,
        on_path: &mut HashSet<NodeId>,
        paths: &mut Vec<AttackPath>,
    ) {
        if edges.len() >= max_len || self.at_result_cap(paths) {
            return;
        }

        for (next, edge) in self.graph.successors(current) {
            if self.at_result_cap(paths) {
                return;
            }
            if next == target {
                let mut path_nodes = nodes.clone();
                path_nodes.push(next.clone());
                let mut path_edges = edges.clone();
                path_edges.push(edge.clone());
                let description = format!("Path from {} to {}", nodes[0], target);
                paths.push(self.make_path(path_nodes, path_edges, description));
                continue;
            }
            if on_path.contains(next) {
                continue;
            }

            nodes.push(next.clone());
            edges.push(edge.clone());
            on_path.insert(next.clone());

            self.dfs(next, target, max_len, nodes, edges, on_path, paths);

            on_path.remove(next);
            edges.pop();
            nodes.pop();
        }
    }

    /// All simple paths from `source` to the node of the named role.
    /// Unknown roles log a warning and return an empty set.
    pub fn find_paths_to_role(
        &self,
        source: &str,
        role_name: &str,
        max_len: Option<usize>,
    ) -> Vec<AttackPath> {
        let role_id = role_node_id(role_name);
        if !self.graph.contains_node(&role_id) {
            warn!(role = role_name, "role not found in graph");
            return Vec::new();
        }
        self.all_simple_paths(source, &role_id, max_len)
    }

    /// Paths from `source` to a resource whose final edge satisfies the
    /// requested access level (admin ⊇ write ⊇ read). With no level,
    /// any incoming edge qualifies.
    pub fn find_paths_to_resource(
        &self,
        source: &str,
        resource_id: &str,
        access_level: Option<AccessLevel>,
    ) -> Vec<AttackPath> {
        let mut paths: Vec<AttackPath> = Vec::new();
        if !self.graph.contains_node(resource_id) {
            warn!(resource = resource_id, "resource not found in graph");
            return paths;
        }

        for pred in self.graph.predecessors(resource_id) {
            let Some(edge) = self.graph.edge_data(pred, resource_id) else {
                continue;
            };
            let qualifies = match access_level {
                None => true,
                Some(required) => edge
                    .edge_type
                    .access_level()
                    .map(|granted| granted.satisfies(required))
                    .unwrap_or(false),
            };
            if !qualifies {
                continue;
            }

            if pred == source {
                let description = format!("Direct {} access to {}", edge.edge_type, resource_id);
                paths.push(self.make_path(
                    vec![source.to_string(), resource_id.to_string()],
                    vec![edge.clone()],
                    description,
                ));
                continue;
            }

            for sub in self.all_simple_paths(source, pred, None) {
                // Extending must keep the path simple.
                if sub.nodes.iter().any(|n| n == resource_id) {
                    continue;
                }
                let mut nodes = sub.nodes;
                nodes.push(resource_id.to_string());
                let mut edges = sub.edges;
                edges.push(edge.clone());
                let description = format!("Path to {} via {}", resource_id, pred);
                paths.push(self.make_path(nodes, edges, description));
            }
        }

        paths.sort_by(|a, b| b.risk.partial_cmp(&a.risk).unwrap_or(std::cmp::Ordering::Equal));
        paths
    }

    /// Shortest paths from `source` to every service account reachable
    /// through at least one `can_impersonate` edge.
    pub fn find_impersonation_paths(&self, source: &str) -> Vec<AttackPath> {
        let mut paths: Vec<AttackPath> = Vec::new();

        for account in self.graph.nodes_of_type(NodeType::ServiceAccount) {
            if account.id == source {
                continue;
            }
            if let Some(mut path) = self.shortest_path(source, &account.id) {
                let impersonates = path
                    .edges
                    .iter()
                    .any(|e| e.edge_type == iamscope_graph::EdgeType::CanImpersonate);
                if impersonates {
                    path.description =
                        format!("Impersonation path to service account {}", account.name);
                    paths.push(path);
                }
            }
        }

        debug!(source, count = paths.len(), "impersonation paths found");
        paths
    }

    /// Simple paths from `source` into projects other than its own,
    /// optionally restricted to `target_project`.
    ///
    /// The source's own project comes from its `project` property, or
    /// from its id when the source is itself a project.
    pub fn find_lateral_movement_paths(
        &self,
        source: &str,
        target_project: Option<&str>,
    ) -> Vec<AttackPath> {
        let mut paths: Vec<AttackPath> = Vec::new();
        let Some(source_node) = self.graph.node(source) else {
            return paths;
        };

        let own_project: Option<String> = if source_node.node_type == NodeType::Project {
            source_node
                .id
                .strip_prefix("project:")
                .map(str::to_string)
                .or_else(|| Some(source_node.name.clone()))
        } else {
            source_node.property_str("project").map(str::to_string)
        };

        for project in self.graph.nodes_of_type(NodeType::Project) {
            let project_id = project.id.strip_prefix("project:").unwrap_or(&project.id);
            if own_project.as_deref() == Some(project_id) {
                continue;
            }
            if let Some(wanted) = target_project {
                if project_id != wanted && project.id != wanted {
                    continue;
                }
            }

            for mut path in self.all_simple_paths(source, &project.id, None) {
                path.description = format!("Lateral movement to project {}", project_id);
                paths.push(path);
            }
        }

        paths.sort_by(|a, b| b.risk.partial_cmp(&a.risk).unwrap_or(std::cmp::Ordering::Equal));
        paths
    }

    /// Paths by which `source` can escalate privileges: the union of
    /// paths to each dangerous role (configured list, or
    /// `target_roles` when given) and all impersonation paths,
    /// de-duplicated by node sequence and sorted by descending risk.
    pub fn find_privilege_escalation_paths(
        &self,
        source: &str,
        target_roles: Option<&[String]>,
    ) -> Vec<AttackPath> {
        let roles: &[String] = target_roles.unwrap_or(&self.config.dangerous_roles);
        let mut seen: HashSet<String> = HashSet::new();
        let mut paths: Vec<AttackPath> = Vec::new();

        for role in roles {
            for path in self.find_paths_to_role(source, role, None) {
                if seen.insert(path.key()) {
                    paths.push(path);
                }
            }
        }
        for path in self.find_impersonation_paths(source) {
            if seen.insert(path.key()) {
                paths.push(path);
            }
        }

        paths.sort_by(|a, b| b.risk.partial_cmp(&a.risk).unwrap_or(std::cmp::Ordering::Equal));
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iamscope_graph::{EdgeType, GraphBuilder, Node};
    use std::collections::HashMap;

    fn node(id: &str, node_type: NodeType) -> Node {
        let name = id.split(':').nth(1).unwrap_or(id).to_string();
        Node::new(id, node_type, name)
    }

    fn cyclic_graph() -> AccessGraph {
        // a -> b -> c -> a, plus a -> d
        let mut builder = GraphBuilder::new();
        for id in ["project:a", "project:b", "project:c", "project:d"] {
            builder.add_node(node(id, NodeType::Project));
        }
        for (u, v) in [
            ("project:a", "project:b"),
            ("project:b", "project:c"),
            ("project:c", "project:a"),
            ("project:a", "project:d"),
        ] {
            builder.add_edge(u, v, "has_access_to", HashMap::new()).unwrap();
        }
        builder.build()
    }

    #[test]
    fn test_shortest_path_under_cycles() {
        let graph = cyclic_graph();
        let config = AnalysisConfig::default();
        let finder = PathFinder::new(&graph, &config);

        let path = finder.shortest_path("project:a", "project:d").unwrap();
        assert_eq!(path.nodes, vec!["project:a", "project:d"]);
        assert_eq!(path.len(), 1);
    }

    #[test]
    fn test_simple_paths_terminate_under_cycles() {
        let graph = cyclic_graph();
        let config = AnalysisConfig::default();
        let finder = PathFinder::new(&graph, &config);

        let paths = finder.all_simple_paths("project:a", "project:d", Some(10));
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].nodes, vec!["project:a", "project:d"]);
    }

    #[test]
    fn test_unknown_ids_return_empty() {
        let graph = cyclic_graph();
        let config = AnalysisConfig::default();
        let finder = PathFinder::new(&graph, &config);

        assert!(finder.shortest_path("project:x", "project:d").is_none());
        assert!(finder.shortest_path("project:a", "project:x").is_none());
        assert!(finder.all_simple_paths("project:x", "project:d", None).is_empty());
        assert!(finder.find_paths_to_role("project:a", "roles/ghost", None).is_empty());
        assert!(finder
            .find_paths_to_resource("project:a", "project:x", None)
            .is_empty());
    }

    #[test]
    fn test_max_length_cuts_enumeration() {
        // chain a -> b -> c -> d
        let mut builder = GraphBuilder::new();
        for id in ["project:a", "project:b", "project:c", "project:d"] {
            builder.add_node(node(id, NodeType::Project));
        }
        for (u, v) in [
            ("project:a", "project:b"),
            ("project:b", "project:c"),
            ("project:c", "project:d"),
        ] {
            builder.add_edge(u, v, "has_access_to", HashMap::new()).unwrap();
        }
        let graph = builder.build();
        let config = AnalysisConfig::default();
        let finder = PathFinder::new(&graph, &config);

        assert_eq!(finder.all_simple_paths("project:a", "project:d", Some(3)).len(), 1);
        assert!(finder.all_simple_paths("project:a", "project:d", Some(2)).is_empty());
    }

    #[test]
    fn test_result_cap_bounds_output() {
        // Two parallel two-hop routes a -> {m1, m2} -> z plus a direct edge.
        let mut builder = GraphBuilder::new();
        for id in ["project:a", "project:m1", "project:m2", "project:z"] {
            builder.add_node(node(id, NodeType::Project));
        }
        for (u, v) in [
            ("project:a", "project:m1"),
            ("project:a", "project:m2"),
            ("project:m1", "project:z"),
            ("project:m2", "project:z"),
            ("project:a", "project:z"),
        ] {
            builder.add_edge(u, v, "has_access_to", HashMap::new()).unwrap();
        }
        let graph = builder.build();

        let config = AnalysisConfig {
            max_paths_per_query: Some(2),
            ..Default::default()
        };
        let finder = PathFinder::new(&graph, &config);
        assert_eq!(finder.all_simple_paths("project:a", "project:z", None).len(), 2);

        let config = AnalysisConfig::default();
        let finder = PathFinder::new(&graph, &config);
        assert_eq!(finder.all_simple_paths("project:a", "project:z", None).len(), 3);
    }

    #[test]
    fn test_paths_sorted_by_descending_risk() {
        let mut builder = GraphBuilder::new();
        for id in ["user:a@example.com", "project:mid", "project:z"] {
            builder.add_node(node(
                id,
                if id.starts_with("user") { NodeType::User } else { NodeType::Project },
            ));
        }
        builder
            .add_edge("user:a@example.com", "project:z", "can_read", HashMap::new())
            .unwrap();
        builder
            .add_edge("user:a@example.com", "project:mid", "can_admin", HashMap::new())
            .unwrap();
        builder
            .add_edge("project:mid", "project:z", "can_admin", HashMap::new())
            .unwrap();
        let graph = builder.build();
        let config = AnalysisConfig::default();
        let finder = PathFinder::new(&graph, &config);

        let paths = finder.all_simple_paths("user:a@example.com", "project:z", None);
        assert_eq!(paths.len(), 2);
        assert!(paths[0].risk >= paths[1].risk);
        assert_eq!(paths[0].edges[0].edge_type, EdgeType::CanAdmin);
    }
}
