//! Core data model: nodes, edges, access levels, and attack paths

use crate::error::GraphError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Globally unique node identifier (e.g. "user:alice@example.com")
pub type NodeId = String;

/// Kind of entity a node represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    User,
    ServiceAccount,
    Group,
    Role,
    Project,
    Folder,
    Org,
    Bucket,
    Dataset,
    Secret,
    KmsKey,
}

impl NodeType {
    /// True for node types that represent reachable resources
    /// (used by the simulator when diffing direct reachability).
    pub fn is_resource(&self) -> bool {
        matches!(
            self,
            NodeType::Project
                | NodeType::Bucket
                | NodeType::Dataset
                | NodeType::Secret
                | NodeType::KmsKey
        )
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            NodeType::User => "user",
            NodeType::ServiceAccount => "service_account",
            NodeType::Group => "group",
            NodeType::Role => "role",
            NodeType::Project => "project",
            NodeType::Folder => "folder",
            NodeType::Org => "org",
            NodeType::Bucket => "bucket",
            NodeType::Dataset => "dataset",
            NodeType::Secret => "secret",
            NodeType::KmsKey => "kms_key",
        };
        write!(f, "{}", token)
    }
}

impl FromStr for NodeType {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(NodeType::User),
            "service_account" => Ok(NodeType::ServiceAccount),
            "group" => Ok(NodeType::Group),
            "role" => Ok(NodeType::Role),
            "project" => Ok(NodeType::Project),
            "folder" => Ok(NodeType::Folder),
            "org" => Ok(NodeType::Org),
            "bucket" => Ok(NodeType::Bucket),
            "dataset" => Ok(NodeType::Dataset),
            "secret" => Ok(NodeType::Secret),
            "kms_key" => Ok(NodeType::KmsKey),
            other => Err(GraphError::UnknownNodeType(other.to_string())),
        }
    }
}

/// Closed vocabulary of directed relationships
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    HasRole,
    CanRead,
    CanWrite,
    CanAdmin,
    CanImpersonate,
    HasAccessTo,
}

impl EdgeType {
    /// Parse a token leniently: unknown tokens fall back to
    /// `HasAccessTo` with a warning instead of failing. Only used when
    /// the ingestion config opts in to lenient mode.
    pub fn parse_lenient(token: &str) -> EdgeType {
        match token.parse() {
            Ok(edge_type) => edge_type,
            Err(_) => {
                tracing::warn!(token, "unrecognized edge type, defaulting to has_access_to");
                EdgeType::HasAccessTo
            }
        }
    }

    /// The access level this edge grants on its target, if any.
    /// `HasRole`, `CanImpersonate` and `HasAccessTo` carry no level.
    pub fn access_level(&self) -> Option<AccessLevel> {
        match self {
            EdgeType::CanRead => Some(AccessLevel::Read),
            EdgeType::CanWrite => Some(AccessLevel::Write),
            EdgeType::CanAdmin => Some(AccessLevel::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            EdgeType::HasRole => "has_role",
            EdgeType::CanRead => "can_read",
            EdgeType::CanWrite => "can_write",
            EdgeType::CanAdmin => "can_admin",
            EdgeType::CanImpersonate => "can_impersonate",
            EdgeType::HasAccessTo => "has_access_to",
        };
        write!(f, "{}", token)
    }
}

impl FromStr for EdgeType {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "has_role" => Ok(EdgeType::HasRole),
            "can_read" => Ok(EdgeType::CanRead),
            "can_write" => Ok(EdgeType::CanWrite),
            "can_admin" => Ok(EdgeType::CanAdmin),
            "can_impersonate" => Ok(EdgeType::CanImpersonate),
            "has_access_to" => Ok(EdgeType::HasAccessTo),
            other => Err(GraphError::UnknownEdgeType(other.to_string())),
        }
    }
}

/// Ordered capability tier used to filter qualifying access edges.
///
/// Levels form a partial order where `Admin` ⊇ `Write` ⊇ `Read`: an
/// admin edge satisfies a request for write or read access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    Read,
    Write,
    Admin,
}

impl AccessLevel {
    /// True if an edge granting `self` satisfies a request for `required`.
    pub fn satisfies(&self, required: AccessLevel) -> bool {
        *self >= required
    }
}

impl FromStr for AccessLevel {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(AccessLevel::Read),
            "write" => Ok(AccessLevel::Write),
            "admin" => Ok(AccessLevel::Admin),
            other => Err(GraphError::UnknownAccessLevel(other.to_string())),
        }
    }
}

/// A principal, role, or resource in the access graph.
///
/// Nodes are immutable once the graph is built; the simulator's clones
/// share them by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Globally unique id following the fixed scheme (see `ids`)
    pub id: NodeId,

    /// Entity kind
    #[serde(rename = "type")]
    pub node_type: NodeType,

    /// Display / original resource name
    pub name: String,

    /// Open attributes (e.g. a role's "permissions" list, a
    /// resource's "project")
    #[serde(default)]
    pub properties: HashMap<String, Value>,
}

impl Node {
    /// Create a node with no extra properties
    pub fn new(id: impl Into<NodeId>, node_type: NodeType, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type,
            name: name.into(),
            properties: HashMap::new(),
        }
    }

    /// Attach a property
    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// A string-typed property, if present
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }

    /// A list-of-strings property (e.g. a role's permissions),
    /// empty when absent or wrongly typed.
    pub fn property_str_list(&self, key: &str) -> Vec<String> {
        self.properties
            .get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// A directed relationship between two nodes.
///
/// `HasRole` edges notably carry `resource` and `role` properties
/// naming the binding they encode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Relationship kind
    #[serde(rename = "type")]
    pub edge_type: EdgeType,

    /// Open attributes
    #[serde(default)]
    pub properties: HashMap<String, Value>,
}

impl Edge {
    /// Create an edge with no extra properties
    pub fn new(edge_type: EdgeType) -> Self {
        Self {
            edge_type,
            properties: HashMap::new(),
        }
    }

    /// Attach a property
    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// A string-typed property, if present
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }
}

/// A derived chain of edges showing how a principal reaches a
/// privileged state or resource.
///
/// Invariants: `nodes.len() == edges.len() + 1`, no node repeats, and
/// `risk` lies in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackPath {
    /// Ordered node ids along the path
    pub nodes: Vec<NodeId>,

    /// Edges connecting consecutive nodes (`nodes.len() - 1` of them)
    pub edges: Vec<Edge>,

    /// Aggregate risk in [0, 1]
    pub risk: f64,

    /// Human-readable summary
    pub description: String,
}

impl AttackPath {
    /// Number of edges in the path
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// True for the degenerate empty path (never produced by queries)
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Render the path as node ids joined with `" -> "`
    pub fn render(&self) -> String {
        self.nodes.join(" -> ")
    }

    /// Identity key for simulation diffing: the ordered join of node
    /// ids. Paths sharing nodes but differing in edge types collapse
    /// to one key.
    pub fn key(&self) -> String {
        self.render()
    }
}

impl fmt::Display for AttackPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (risk {:.2})", self.render(), self.risk)
    }
}
