//! Effective permission aggregation and least-privilege analysis
//!
//! Walks role-assignment edges to compute what an identity can
//! actually do, recommends the smallest roles covering a coarse
//! action, and reports permissions held in excess of that action.

use crate::error::{AnalysisError, Result};
use crate::paths::PathFinder;
use iamscope_graph::{AccessGraph, AnalysisConfig, EdgeType, NodeType};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A role that covers at least one required permission pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleCandidate {
    /// Role node id (e.g. `role:roles/storage.objectViewer`)
    pub role_id: String,

    /// Role name
    pub name: String,

    /// Total permissions the role grants; candidates are sorted
    /// ascending on this (least privilege first)
    pub permission_count: usize,

    /// The subset of the role's permissions matching the request
    pub matching_permissions: Vec<String>,
}

/// Result of a least-privilege query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinimalPermissions {
    /// Identity the query was about
    pub source: String,

    /// Resource context supplied by the caller
    pub target: String,

    /// The coarse action requested
    pub action: String,

    /// Glob patterns the action maps to
    pub required_patterns: Vec<String>,

    /// Roles covering the action, least privilege first
    pub candidate_roles: Vec<RoleCandidate>,

    /// Permissions the source currently holds beyond what the action
    /// requires
    pub excess_permissions: Vec<String>,
}

/// Aggregates effective permissions for identities in the graph
#[derive(Debug, Clone, Copy)]
pub struct PermissionResolver<'a> {
    graph: &'a AccessGraph,
    config: &'a AnalysisConfig,
}

impl<'a> PermissionResolver<'a> {
    /// Create a resolver over the given graph and configuration
    pub fn new(graph: &'a AccessGraph, config: &'a AnalysisConfig) -> Self {
        Self { graph, config }
    }

    /// Effective permissions of a node, grouped by the resource each
    /// role binding applies to.
    ///
    /// Walks outgoing `has_role` edges to role nodes and accumulates
    /// each role's `permissions` property under the edge's `resource`
    /// property. Duplicates are preserved; an unknown id yields an
    /// empty map.
    pub fn node_permissions(&self, node_id: &str) -> HashMap<String, Vec<String>> {
        let mut permissions: HashMap<String, Vec<String>> = HashMap::new();

        for (target, edge) in self.graph.successors(node_id) {
            if edge.edge_type != EdgeType::HasRole {
                continue;
            }
            let Some(role) = self.graph.node(target) else {
                continue;
            };
            if role.node_type != NodeType::Role {
                continue;
            }
            let resource = edge.property_str("resource").unwrap_or("unknown").to_string();
            permissions
                .entry(resource)
                .or_default()
                .extend(role.property_str_list("permissions"));
        }

        permissions
    }

    /// Roles that cover `action` with the least privilege, and the
    /// permissions `source` holds in excess of it.
    ///
    /// `target` is carried through to the report for context; the
    /// candidate scan covers every role node in the graph.
    ///
    /// # Errors
    ///
    /// Fails with `UnknownAction` for an action outside
    /// read/write/delete/admin.
    pub fn find_minimal_permissions(
        &self,
        source: &str,
        target: &str,
        action: &str,
    ) -> Result<MinimalPermissions> {
        let patterns = action_patterns(action)?;
        let matchers = patterns
            .iter()
            .map(|p| compile_glob(p))
            .collect::<Result<Vec<Regex>>>()?;

        let mut candidates: Vec<RoleCandidate> = Vec::new();
        for role in self.graph.nodes_of_type(NodeType::Role) {
            let held = role.property_str_list("permissions");
            let matching: Vec<String> = held
                .iter()
                .filter(|p| matchers.iter().any(|m| m.is_match(p)))
                .cloned()
                .collect();
            if !matching.is_empty() {
                candidates.push(RoleCandidate {
                    role_id: role.id.clone(),
                    name: role.name.clone(),
                    permission_count: held.len(),
                    matching_permissions: matching,
                });
            }
        }
        candidates.sort_by_key(|c| c.permission_count);

        let mut excess: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        for held in self.node_permissions(source).into_values() {
            for permission in held {
                if matchers.iter().any(|m| m.is_match(&permission)) {
                    continue;
                }
                if seen.insert(permission.clone()) {
                    excess.push(permission);
                }
            }
        }
        excess.sort();

        Ok(MinimalPermissions {
            source: source.to_string(),
            target: target.to_string(),
            action: action.to_string(),
            required_patterns: patterns,
            candidate_roles: candidates,
            excess_permissions: excess,
        })
    }

    /// Whether `source` can reach `resource_id`, optionally requiring a
    /// specific permission.
    ///
    /// The permission check is not scoped to the queried resource: a
    /// match under any resource bucket passes. This looseness is
    /// preserved from the original behavior on purpose; tightening it
    /// would change results for identities holding the permission
    /// elsewhere.
    pub fn can_access_resource(
        &self,
        source: &str,
        resource_id: &str,
        required_permission: Option<&str>,
    ) -> bool {
        if self.graph.has_edge(source, resource_id) {
            match required_permission {
                None => return true,
                Some(permission) => {
                    let held = self.node_permissions(source);
                    if held.values().any(|list| list.iter().any(|p| p == permission)) {
                        return true;
                    }
                }
            }
        }

        let finder = PathFinder::new(self.graph, self.config);
        !finder.find_paths_to_resource(source, resource_id, None).is_empty()
    }
}

/// Map a coarse action to the permission glob patterns it requires
fn action_patterns(action: &str) -> Result<Vec<String>> {
    let patterns: &[&str] = match action {
        "read" => &["*.get", "*.list", "*.view"],
        "write" => &["*.create", "*.update", "*.write"],
        "delete" => &["*.delete"],
        "admin" => &["*.setIamPolicy", "*.getIamPolicy", "*.admin"],
        other => return Err(AnalysisError::UnknownAction(other.to_string())),
    };
    Ok(patterns.iter().map(|p| p.to_string()).collect())
}

/// Compile a `*`-wildcard glob into an anchored regex
fn compile_glob(pattern: &str) -> Result<Regex> {
    let escaped: Vec<String> = pattern.split('*').map(regex::escape).collect();
    let regex = format!("^{}$", escaped.join(".*"));
    Ok(Regex::new(&regex)?)
}
