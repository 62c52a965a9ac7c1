//! Edge and path risk scoring
//!
//! Each edge type carries a base weight reflecting its exploitability;
//! a path's risk is the arithmetic mean of its edges' risks, clamped to
//! [0, 1]. Mean-based scoring is deliberate: a long chain of risky
//! steps is not automatically ranked above a short, single-step
//! high-risk path. Callers should read a path's risk as a per-step
//! average difficulty proxy.

use iamscope_graph::{AnalysisConfig, Edge, EdgeType};

/// Base weight for `can_admin` edges (full control of the target)
pub const CAN_ADMIN_RISK: f64 = 0.9;

/// Base weight for `can_impersonate` edges (identity takeover)
pub const CAN_IMPERSONATE_RISK: f64 = 0.85;

/// Base weight for `can_write` edges
pub const CAN_WRITE_RISK: f64 = 0.6;

/// Base weight for `can_read` edges
pub const CAN_READ_RISK: f64 = 0.3;

/// Base weight for `has_access_to` edges
pub const HAS_ACCESS_TO_RISK: f64 = 0.2;

/// Weight for `has_role` edges referencing a configured dangerous role
pub const DANGEROUS_ROLE_RISK: f64 = 0.8;

/// Weight for `has_role` edges referencing any other role
pub const ORDINARY_ROLE_RISK: f64 = 0.4;

/// Assigns risk scores to edges and paths
#[derive(Debug, Clone, Copy)]
pub struct RiskScorer<'a> {
    config: &'a AnalysisConfig,
}

impl<'a> RiskScorer<'a> {
    /// Create a scorer over the given configuration
    pub fn new(config: &'a AnalysisConfig) -> Self {
        Self { config }
    }

    /// Risk of a single edge in [0, 1].
    ///
    /// `has_role` risk derives from the referenced role: membership in
    /// the configured dangerous-roles list raises it.
    pub fn edge_risk(&self, edge: &Edge) -> f64 {
        match edge.edge_type {
            EdgeType::CanAdmin => CAN_ADMIN_RISK,
            EdgeType::CanImpersonate => CAN_IMPERSONATE_RISK,
            EdgeType::CanWrite => CAN_WRITE_RISK,
            EdgeType::CanRead => CAN_READ_RISK,
            EdgeType::HasAccessTo => HAS_ACCESS_TO_RISK,
            EdgeType::HasRole => {
                let role = edge.property_str("role").unwrap_or("");
                if self.config.is_dangerous_role(role) {
                    DANGEROUS_ROLE_RISK
                } else {
                    ORDINARY_ROLE_RISK
                }
            }
        }
    }

    /// Arithmetic mean of the edges' risks, clamped to [0, 1].
    /// An empty edge list scores 0.
    pub fn path_risk(&self, edges: &[Edge]) -> f64 {
        if edges.is_empty() {
            return 0.0;
        }
        let total: f64 = edges.iter().map(|e| self.edge_risk(e)).sum();
        (total / edges.len() as f64).clamp(0.0, 1.0)
    }
}
