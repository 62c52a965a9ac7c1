//! # iamscope-graph
//!
//! Data model and graph store for cloud-IAM access analysis.
//!
//! Holds the canonical directed graph of identities, roles, and
//! resources: immutable nodes in a shared registry, typed edges with
//! open property maps, and cheap clone-on-write copies for simulation
//! (edges deep-copied, node registry shared).
//!
//! ## Example
//!
//! ```rust
//! use iamscope_graph::{GraphBuilder, Node, NodeType};
//! use std::collections::HashMap;
//!
//! let mut builder = GraphBuilder::new();
//! builder.add_node(Node::new("user:alice@example.com", NodeType::User, "alice"));
//! builder.add_node(Node::new("project:demo", NodeType::Project, "demo"));
//! builder
//!     .add_edge("user:alice@example.com", "project:demo", "can_write", HashMap::new())
//!     .unwrap();
//!
//! let graph = builder.build();
//! assert!(graph.has_edge("user:alice@example.com", "project:demo"));
//! ```

pub mod config;
pub mod error;
pub mod ids;
pub mod store;
pub mod types;

pub use config::{AnalysisConfig, RoleCategory};
pub use error::{GraphError, Result};
pub use ids::{resolve_member, resolve_resource, role_node_id};
pub use store::{AccessGraph, GraphBuilder, NodeRegistry};
pub use types::{AccessLevel, AttackPath, Edge, EdgeType, Node, NodeId, NodeType};
