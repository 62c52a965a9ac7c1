//! Structured simulation reports
//!
//! The report shape here is the stable surface consumed by the
//! external reporting/CLI layer.

use chrono::{DateTime, Utc};
use iamscope_graph::{AttackPath, NodeId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a simulated change grants or revokes a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingAction {
    Grant,
    Revoke,
}

/// The hypothetical binding under simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingChange {
    /// IAM member string as supplied (e.g. "user:bob@example.com")
    pub member: String,

    /// Role name (e.g. "roles/editor")
    pub role: String,

    /// Resource name (e.g. "projects/demo")
    pub resource: String,

    /// Grant or revoke
    pub action: BindingAction,
}

/// Why a simulation could not run: the inputs failed id resolution.
/// Carries whatever was resolved so the caller can see which input
/// was at fault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionFailure {
    /// Resolved member node id, when resolution got that far
    pub member_id: Option<NodeId>,

    /// Resolved resource node id, when resolution got that far
    pub resource_id: Option<NodeId>,

    /// Human-readable failure reason
    pub reason: String,
}

/// A path rendered for reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSummary {
    /// Node ids joined with `" -> "`
    pub rendered: String,

    /// Path risk in [0, 1]
    pub risk: f64,

    /// Ordered node ids
    pub nodes: Vec<NodeId>,

    /// Query description of the path
    pub description: String,
}

impl From<&AttackPath> for PathSummary {
    fn from(path: &AttackPath) -> Self {
        Self {
            rendered: path.render(),
            risk: path.risk,
            nodes: path.nodes.clone(),
            description: path.description.clone(),
        }
    }
}

/// Permissions gained or lost on one resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionDelta {
    /// Resource the binding applies to
    pub resource: String,

    /// Permission strings in the delta
    pub permissions: Vec<String>,
}

/// Impact report for a single simulated binding change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Report identifier
    pub id: Uuid,

    /// When the simulation ran
    pub timestamp: DateTime<Utc>,

    /// The binding that was simulated
    pub binding: BindingChange,

    /// Set when the inputs failed to resolve; all delta fields are
    /// empty in that case
    pub error: Option<ResolutionFailure>,

    /// Escalation paths present after the change but not before
    pub new_paths: Vec<PathSummary>,

    /// Escalation paths present before the change but not after
    pub broken_paths: Vec<PathSummary>,

    /// Permissions newly granted, per resource
    pub permissions_granted: Vec<PermissionDelta>,

    /// Permissions no longer held, per resource
    pub permissions_lost: Vec<PermissionDelta>,

    /// Resource nodes newly reachable via a direct edge
    pub resources_gained: Vec<NodeId>,

    /// Resource nodes no longer directly reachable
    pub resources_lost: Vec<NodeId>,

    /// Sum of new paths' risk scores
    pub risk_increase: f64,

    /// Sum of broken paths' risk scores
    pub risk_reduction: f64,

    /// New paths with risk above the critical threshold
    pub critical_paths_created: usize,

    /// Broken paths with risk above the critical threshold
    pub critical_paths_removed: usize,

    /// Attack-vector tags opened by the granted role
    pub attack_vectors_added: Vec<String>,

    /// Attack-vector tags closed by the revoked role
    pub attack_vectors_removed: Vec<String>,

    /// Plain-text guidance derived from fixed rules
    pub recommendations: Vec<String>,
}

impl SimulationReport {
    /// An empty report scaffold for the given binding
    pub fn new(binding: BindingChange) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            binding,
            error: None,
            new_paths: Vec::new(),
            broken_paths: Vec::new(),
            permissions_granted: Vec::new(),
            permissions_lost: Vec::new(),
            resources_gained: Vec::new(),
            resources_lost: Vec::new(),
            risk_increase: 0.0,
            risk_reduction: 0.0,
            critical_paths_created: 0,
            critical_paths_removed: 0,
            attack_vectors_added: Vec::new(),
            attack_vectors_removed: Vec::new(),
            recommendations: Vec::new(),
        }
    }

    /// A report that failed before any graph work
    pub fn failed(binding: BindingChange, failure: ResolutionFailure) -> Self {
        let mut report = Self::new(binding);
        report.error = Some(failure);
        report
    }

    /// True when the simulation ran to completion
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Combined report for an old-role → new-role replacement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleChangeReport {
    /// Report identifier
    pub id: Uuid,

    /// When the simulation ran
    pub timestamp: DateTime<Utc>,

    /// Impact of removing the old binding, against the original graph
    pub removal: SimulationReport,

    /// Impact of adding the new binding, against the original graph
    pub addition: SimulationReport,

    /// `addition.risk_increase - removal.risk_reduction`
    pub net_risk_change: f64,

    /// Plain-text guidance for the combined change
    pub recommendations: Vec<String>,
}
