//! Analysis configuration loading and validation
//!
//! The engine takes its configuration as an explicit input from the
//! collector layer; nothing here is global. Only `validate()` is fatal,
//! and only at startup.

use crate::error::{GraphError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Category a role grants on a resource, used by the simulator's
/// classifier to derive the access edge for a hypothetical binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleCategory {
    Admin,
    Write,
    Read,
    Access,
}

/// Analysis configuration bundle supplied by the collector layer
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalysisConfig {
    /// Maximum edge length for simple-path enumeration
    #[serde(default = "default_max_path_length")]
    pub max_path_length: usize,

    /// Roles considered dangerous, in priority order
    #[serde(default = "default_dangerous_roles")]
    pub dangerous_roles: Vec<String>,

    /// Optional cap on paths returned per enumeration query; guards
    /// against combinatorial blow-up on dense graphs.
    #[serde(default)]
    pub max_paths_per_query: Option<usize>,

    /// Accept unrecognized edge type tokens by defaulting them to
    /// `has_access_to` instead of rejecting the edge. Off by default;
    /// enabling it can mask malformed upstream data.
    #[serde(default)]
    pub lenient_edge_types: bool,

    /// Explicit role name → category overrides consulted before the
    /// substring-based classification fallback.
    #[serde(default)]
    pub role_categories: HashMap<String, RoleCategory>,
}

fn default_max_path_length() -> usize {
    6
}

fn default_dangerous_roles() -> Vec<String> {
    [
        "roles/owner",
        "roles/editor",
        "roles/iam.securityAdmin",
        "roles/iam.serviceAccountTokenCreator",
        "roles/iam.serviceAccountKeyAdmin",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_path_length: default_max_path_length(),
            dangerous_roles: default_dangerous_roles(),
            max_paths_per_query: None,
            lenient_edge_types: false,
            role_categories: HashMap::new(),
        }
    }
}

impl AnalysisConfig {
    /// Validate the configuration. Misconfiguration is the only fatal
    /// error surface in the engine.
    pub fn validate(&self) -> Result<()> {
        if self.max_path_length == 0 {
            return Err(GraphError::InvalidConfig(
                "max_path_length must be at least 1".to_string(),
            ));
        }
        if self.dangerous_roles.iter().any(|r| r.is_empty()) {
            return Err(GraphError::InvalidConfig(
                "dangerous_roles must not contain empty names".to_string(),
            ));
        }
        if self.max_paths_per_query == Some(0) {
            return Err(GraphError::InvalidConfig(
                "max_paths_per_query must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }

    /// True if the role name is on the dangerous list
    pub fn is_dangerous_role(&self, role_name: &str) -> bool {
        self.dangerous_roles.iter().any(|r| r == role_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_path_length, 6);
        assert!(config.is_dangerous_role("roles/owner"));
        assert!(!config.is_dangerous_role("roles/viewer"));
    }

    #[test]
    fn test_zero_path_length_rejected() {
        let config = AnalysisConfig {
            max_path_length: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(GraphError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_result_cap_rejected() {
        let config = AnalysisConfig {
            max_paths_per_query: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: AnalysisConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.max_path_length, 6);
        assert!(!config.lenient_edge_types);

        let config: AnalysisConfig = serde_json::from_str(
            r#"{"max_path_length": 4, "dangerous_roles": ["roles/owner"], "role_categories": {"roles/custom.deployer": "write"}}"#,
        )
        .unwrap();
        assert_eq!(config.max_path_length, 4);
        assert_eq!(
            config.role_categories.get("roles/custom.deployer"),
            Some(&RoleCategory::Write)
        );
    }
}
