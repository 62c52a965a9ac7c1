//! What-if simulation of IAM binding changes
//!
//! Each call clones the canonical graph, applies the hypothetical
//! mutation to the clone, re-runs path and permission analysis on
//! both, and diffs the results into an impact report. Nothing persists
//! between calls and the canonical graph is never touched.

use crate::classify::RoleClassifier;
use crate::report::{
    BindingAction, BindingChange, PathSummary, PermissionDelta, ResolutionFailure,
    RoleChangeReport, SimulationReport,
};
use chrono::Utc;
use iamscope_analysis::{PathFinder, PermissionResolver};
use iamscope_graph::{
    resolve_member, resolve_resource, role_node_id, AccessGraph, AnalysisConfig, AttackPath, Edge,
    EdgeType, Node, NodeId, NodeType,
};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};
use uuid::Uuid;

/// Paths with risk above this count as critical in impact reports
pub const CRITICAL_RISK: f64 = 0.7;

/// Net risk increase above which a role change draws a warning
const ROLE_CHANGE_WARN_THRESHOLD: f64 = 0.5;

/// Simulates binding mutations against private clones of the graph.
///
/// Stateless: the simulator borrows the canonical graph read-only and
/// every call is a single bounded computation. Multiple simulators
/// (or concurrent calls on one) never interfere.
#[derive(Debug, Clone, Copy)]
pub struct Simulator<'a> {
    graph: &'a AccessGraph,
    config: &'a AnalysisConfig,
}

impl<'a> Simulator<'a> {
    /// Create a simulator over the canonical graph
    pub fn new(graph: &'a AccessGraph, config: &'a AnalysisConfig) -> Self {
        Self { graph, config }
    }

    /// Simulate granting `role` to `member` on `resource`.
    ///
    /// Unresolvable inputs produce a report with `error` set rather
    /// than an `Err`; simulation is a best-effort, interactive
    /// operation.
    pub fn simulate_binding_addition(
        &self,
        member: &str,
        role: &str,
        resource: &str,
    ) -> SimulationReport {
        let binding = BindingChange {
            member: member.to_string(),
            role: role.to_string(),
            resource: resource.to_string(),
            action: BindingAction::Grant,
        };

        let (member_id, resource_id) = match self.resolve_inputs(&binding) {
            Ok(ids) => ids,
            Err(failure) => return SimulationReport::failed(binding, failure),
        };
        debug!(member = %member_id, role, resource = %resource_id, "simulating binding addition");

        let classifier = RoleClassifier::new(self.config);
        let before_paths = self.escalation_paths(self.graph, &member_id);
        let before_keys: HashSet<String> = before_paths.iter().map(AttackPath::key).collect();
        let before_perms =
            PermissionResolver::new(self.graph, self.config).node_permissions(&member_id);
        let before_resources = self.direct_resources(self.graph, &member_id);

        let mut clone = self.graph.clone();
        let role_id = role_node_id(role);
        if !clone.contains_node(&role_id) {
            // A binding may reference a role the snapshot never saw.
            clone.register_node(
                Node::new(role_id.clone(), NodeType::Role, role)
                    .with_property("permissions", json!([])),
            );
        }

        let has_role_edge = Edge::new(EdgeType::HasRole)
            .with_property("resource", json!(resource))
            .with_property("role", json!(role));
        if let Err(e) = clone.add_edge(&member_id, &role_id, has_role_edge) {
            return SimulationReport::failed(
                binding,
                ResolutionFailure {
                    member_id: Some(member_id),
                    resource_id: Some(resource_id),
                    reason: e.to_string(),
                },
            );
        }
        let access_edge = Edge::new(classifier.access_edge_type(role))
            .with_property("role", json!(role));
        if let Err(e) = clone.add_edge(&member_id, &resource_id, access_edge) {
            return SimulationReport::failed(
                binding,
                ResolutionFailure {
                    member_id: Some(member_id),
                    resource_id: Some(resource_id),
                    reason: e.to_string(),
                },
            );
        }

        let after_paths = self.escalation_paths(&clone, &member_id);
        let new_paths: Vec<&AttackPath> = after_paths
            .iter()
            .filter(|p| !before_keys.contains(&p.key()))
            .collect();
        let after_perms = PermissionResolver::new(&clone, self.config).node_permissions(&member_id);
        let after_resources = self.direct_resources(&clone, &member_id);

        let mut report = SimulationReport::new(binding);
        report.risk_increase = new_paths.iter().map(|p| p.risk).sum();
        report.critical_paths_created = new_paths.iter().filter(|p| p.risk > CRITICAL_RISK).count();
        report.new_paths = new_paths.iter().map(|p| PathSummary::from(*p)).collect();
        report.permissions_granted = permission_deltas(&before_perms, &after_perms);
        report.resources_gained = resource_delta(&after_resources, &before_resources);
        report.attack_vectors_added = classifier.attack_vectors(role);

        self.addition_recommendations(&mut report, &classifier, role);
        report
    }

    /// Simulate revoking `role` from `member` on `resource`.
    ///
    /// The binding edges are removed only when their properties match
    /// the given role and resource exactly, so an unrelated binding
    /// sharing the same endpoints is left alone.
    pub fn simulate_binding_removal(
        &self,
        member: &str,
        role: &str,
        resource: &str,
    ) -> SimulationReport {
        let binding = BindingChange {
            member: member.to_string(),
            role: role.to_string(),
            resource: resource.to_string(),
            action: BindingAction::Revoke,
        };

        let (member_id, resource_id) = match self.resolve_inputs(&binding) {
            Ok(ids) => ids,
            Err(failure) => return SimulationReport::failed(binding, failure),
        };
        debug!(member = %member_id, role, resource = %resource_id, "simulating binding removal");

        let classifier = RoleClassifier::new(self.config);
        let before_paths = self.escalation_paths(self.graph, &member_id);
        let before_perms =
            PermissionResolver::new(self.graph, self.config).node_permissions(&member_id);
        let before_resources = self.direct_resources(self.graph, &member_id);

        let mut clone = self.graph.clone();
        let role_id = role_node_id(role);

        let drop_role_edge = clone
            .edge_data(&member_id, &role_id)
            .map(|e| e.edge_type == EdgeType::HasRole && e.property_str("resource") == Some(resource))
            .unwrap_or(false);
        let mut removed_binding = false;
        if drop_role_edge {
            removed_binding = clone.remove_edge(&member_id, &role_id).unwrap_or(false);
        }

        let drop_access_edge = clone
            .edge_data(&member_id, &resource_id)
            .map(|e| e.property_str("role") == Some(role))
            .unwrap_or(false);
        let mut removed_access = false;
        if drop_access_edge {
            removed_access = clone.remove_edge(&member_id, &resource_id).unwrap_or(false);
        }

        let after_paths = self.escalation_paths(&clone, &member_id);
        let after_keys: HashSet<String> = after_paths.iter().map(AttackPath::key).collect();
        let broken_paths: Vec<&AttackPath> = before_paths
            .iter()
            .filter(|p| !after_keys.contains(&p.key()))
            .collect();
        let after_perms = PermissionResolver::new(&clone, self.config).node_permissions(&member_id);
        let after_resources = self.direct_resources(&clone, &member_id);

        let mut report = SimulationReport::new(binding);
        report.risk_reduction = broken_paths.iter().map(|p| p.risk).sum();
        report.critical_paths_removed =
            broken_paths.iter().filter(|p| p.risk > CRITICAL_RISK).count();
        report.broken_paths = broken_paths.iter().map(|p| PathSummary::from(*p)).collect();
        report.permissions_lost = permission_deltas(&after_perms, &before_perms);
        report.resources_lost = resource_delta(&before_resources, &after_resources);
        if removed_binding {
            report.attack_vectors_removed = classifier.attack_vectors(role);
        }

        if !removed_binding && !removed_access {
            report
                .recommendations
                .push("No matching binding found; removal is a no-op".to_string());
        } else if !report.broken_paths.is_empty() {
            report.recommendations.push(format!(
                "Breaks {} attack path(s), reducing escalation exposure",
                report.broken_paths.len()
            ));
        }
        report
    }

    /// Simulate replacing `old_role` with `new_role` on `resource`.
    ///
    /// Removal and addition are each simulated independently against
    /// the original graph (not chained), then combined into a net risk
    /// change.
    pub fn simulate_role_change(
        &self,
        member: &str,
        old_role: &str,
        new_role: &str,
        resource: &str,
    ) -> RoleChangeReport {
        let removal = self.simulate_binding_removal(member, old_role, resource);
        let addition = self.simulate_binding_addition(member, new_role, resource);
        let net_risk_change = addition.risk_increase - removal.risk_reduction;

        let classifier = RoleClassifier::new(self.config);
        let mut recommendations = Vec::new();
        if net_risk_change > ROLE_CHANGE_WARN_THRESHOLD {
            recommendations.push(format!(
                "Net escalation risk increases by {:.2}; review the replacement role",
                net_risk_change
            ));
        }
        if classifier.is_primitive(new_role) {
            recommendations.push(format!(
                "{} is a primitive role; prefer a narrower predefined or custom role",
                new_role
            ));
        }

        RoleChangeReport {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            removal,
            addition,
            net_risk_change,
            recommendations,
        }
    }

    fn resolve_inputs(
        &self,
        binding: &BindingChange,
    ) -> Result<(NodeId, NodeId), ResolutionFailure> {
        let member_id = resolve_member(&binding.member);
        let resource_id = resolve_resource(&binding.resource);

        let (member_id, resource_id) = match (member_id, resource_id) {
            (Some(m), Some(r)) => (m, r),
            (member_id, resource_id) => {
                let reason = match (&member_id, &resource_id) {
                    (None, None) => format!(
                        "could not resolve member '{}' or resource '{}'",
                        binding.member, binding.resource
                    ),
                    (None, Some(_)) => format!("could not resolve member '{}'", binding.member),
                    _ => format!("could not resolve resource '{}'", binding.resource),
                };
                warn!(member = %binding.member, resource = %binding.resource, "simulation input resolution failed");
                return Err(ResolutionFailure {
                    member_id,
                    resource_id,
                    reason,
                });
            }
        };

        if !self.graph.contains_node(&member_id) {
            return Err(ResolutionFailure {
                reason: format!("member {} not present in graph snapshot", member_id),
                member_id: Some(member_id),
                resource_id: Some(resource_id),
            });
        }
        if !self.graph.contains_node(&resource_id) {
            return Err(ResolutionFailure {
                reason: format!("resource {} not present in graph snapshot", resource_id),
                member_id: Some(member_id),
                resource_id: Some(resource_id),
            });
        }
        Ok((member_id, resource_id))
    }

    fn escalation_paths(&self, graph: &AccessGraph, member_id: &str) -> Vec<AttackPath> {
        PathFinder::new(graph, self.config).find_privilege_escalation_paths(member_id, None)
    }

    /// Resource-typed nodes directly reachable from the member
    fn direct_resources(&self, graph: &AccessGraph, member_id: &str) -> Vec<NodeId> {
        graph
            .successors(member_id)
            .iter()
            .filter(|(target, _)| {
                graph
                    .node(target)
                    .map(|n| n.node_type.is_resource())
                    .unwrap_or(false)
            })
            .map(|(target, _)| target.clone())
            .collect()
    }

    fn addition_recommendations(
        &self,
        report: &mut SimulationReport,
        classifier: &RoleClassifier<'_>,
        role: &str,
    ) {
        if report.risk_increase > CRITICAL_RISK {
            report.recommendations.push(format!(
                "CRITICAL: binding increases escalation risk by {:.2}; review before applying",
                report.risk_increase
            ));
        }
        if report.critical_paths_created > 0 {
            report.recommendations.push(format!(
                "Creates {} critical attack path(s) with risk above {:.1}",
                report.critical_paths_created, CRITICAL_RISK
            ));
        }

        let granted: Vec<&String> = report
            .permissions_granted
            .iter()
            .flat_map(|d| d.permissions.iter())
            .collect();
        if granted.iter().any(|p| p.contains("setIamPolicy")) {
            report.recommendations.push(
                "Grants setIamPolicy: holder can rewrite IAM policy and escalate further"
                    .to_string(),
            );
        }
        if granted.iter().any(|p| p.contains("actAs")) {
            report.recommendations.push(
                "Grants actAs: enables service account impersonation and lateral movement"
                    .to_string(),
            );
        }
        if classifier.is_primitive(role) {
            report.recommendations.push(format!(
                "{} is a primitive role; prefer a narrower predefined or custom role",
                role
            ));
        }
    }
}

/// Per-resource permissions present in `after` but not `before`
fn permission_deltas(
    before: &HashMap<String, Vec<String>>,
    after: &HashMap<String, Vec<String>>,
) -> Vec<PermissionDelta> {
    let mut resources: Vec<&String> = after.keys().collect();
    resources.sort();

    let mut deltas = Vec::new();
    for resource in resources {
        let previous: HashSet<&String> = before
            .get(resource)
            .map(|v| v.iter().collect())
            .unwrap_or_default();
        let mut gained: Vec<String> = Vec::new();
        let mut seen: HashSet<&String> = HashSet::new();
        for permission in &after[resource] {
            if !previous.contains(permission) && seen.insert(permission) {
                gained.push(permission.clone());
            }
        }
        if !gained.is_empty() {
            deltas.push(PermissionDelta {
                resource: resource.clone(),
                permissions: gained,
            });
        }
    }
    deltas
}

/// Node ids present in `left` but not `right`, preserving order
fn resource_delta(left: &[NodeId], right: &[NodeId]) -> Vec<NodeId> {
    let known: HashSet<&NodeId> = right.iter().collect();
    left.iter().filter(|id| !known.contains(id)).cloned().collect()
}
