//! # iamscope-sim
//!
//! What-if simulation for IAM binding changes: clone the canonical
//! access graph, apply a hypothetical grant/revoke/replacement, re-run
//! path and permission analysis, and diff the results into a
//! structured impact report with heuristic recommendations.
//!
//! Simulations never mutate the canonical graph and hold no state
//! between calls.
//!
//! ## Example
//!
//! ```rust
//! use iamscope_graph::{AnalysisConfig, GraphBuilder, Node, NodeType};
//! use iamscope_sim::Simulator;
//!
//! let mut builder = GraphBuilder::new();
//! builder.add_node(Node::new("user:bob@example.com", NodeType::User, "bob"));
//! builder.add_node(Node::new("project:demo", NodeType::Project, "demo"));
//! let graph = builder.build();
//!
//! let config = AnalysisConfig::default();
//! let simulator = Simulator::new(&graph, &config);
//! let report = simulator.simulate_binding_addition(
//!     "user:bob@example.com",
//!     "roles/viewer",
//!     "projects/demo",
//! );
//! assert!(report.succeeded());
//! ```

pub mod classify;
pub mod report;
pub mod simulator;

pub use classify::{
    RoleClassifier, VECTOR_CODE_EXECUTION, VECTOR_IMPERSONATION, VECTOR_VM_ESCALATION,
};
pub use report::{
    BindingAction, BindingChange, PathSummary, PermissionDelta, ResolutionFailure,
    RoleChangeReport, SimulationReport,
};
pub use simulator::{Simulator, CRITICAL_RISK};
