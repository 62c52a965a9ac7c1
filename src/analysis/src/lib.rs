//! # iamscope-analysis
//!
//! Query engine over the IAM access graph: shortest paths, bounded
//! simple-path enumeration, risk scoring, effective-permission
//! aggregation, and the specialized attack-path catalog queries
//! (impersonation, lateral movement, privilege escalation).
//!
//! All queries are read-only over a shared [`iamscope_graph::AccessGraph`]
//! and safe to run concurrently; unknown ids produce empty results
//! rather than errors.
//!
//! ## Example
//!
//! ```rust
//! use iamscope_analysis::PathFinder;
//! use iamscope_graph::{AnalysisConfig, GraphBuilder, Node, NodeType};
//! use std::collections::HashMap;
//!
//! let mut builder = GraphBuilder::new();
//! builder.add_node(Node::new("user:alice@example.com", NodeType::User, "alice"));
//! builder.add_node(Node::new("project:demo", NodeType::Project, "demo"));
//! builder
//!     .add_edge("user:alice@example.com", "project:demo", "can_write", HashMap::new())
//!     .unwrap();
//! let graph = builder.build();
//!
//! let config = AnalysisConfig::default();
//! let finder = PathFinder::new(&graph, &config);
//! let path = finder.shortest_path("user:alice@example.com", "project:demo").unwrap();
//! assert_eq!(path.render(), "user:alice@example.com -> project:demo");
//! ```

pub mod error;
pub mod paths;
pub mod permissions;
pub mod risk;

pub use error::{AnalysisError, Result};
pub use paths::PathFinder;
pub use permissions::{MinimalPermissions, PermissionResolver, RoleCandidate};
pub use risk::RiskScorer;
