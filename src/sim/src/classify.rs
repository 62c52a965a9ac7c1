//! Role classification for simulated bindings
//!
//! Derives the access edge a role grants on its resource and tags the
//! attack vectors a role is known to open. Classification consults the
//! configured role→category overrides first and falls back to
//! case-insensitive substring rules, so custom role names can be
//! pinned to the right category instead of relying on naming
//! conventions.

use iamscope_graph::{AnalysisConfig, EdgeType, RoleCategory};

/// Attack-vector tag for token-creator / key-admin style roles
pub const VECTOR_IMPERSONATION: &str = "Service account impersonation capability";

/// Attack-vector tag for serverless admin roles
pub const VECTOR_CODE_EXECUTION: &str = "Code execution via serverless deployment";

/// Attack-vector tag for compute admin roles
pub const VECTOR_VM_ESCALATION: &str = "VM-based privilege escalation";

/// Classifies role names into access categories and attack vectors
#[derive(Debug, Clone, Copy)]
pub struct RoleClassifier<'a> {
    config: &'a AnalysisConfig,
}

impl<'a> RoleClassifier<'a> {
    /// Create a classifier over the given configuration
    pub fn new(config: &'a AnalysisConfig) -> Self {
        Self { config }
    }

    /// Category of access a role grants on the resource it is bound
    /// to. Overrides from `role_categories` win; otherwise substring
    /// rules apply: admin/owner → Admin, editor/write → Write,
    /// viewer/read → Read, anything else → Access.
    pub fn classify(&self, role_name: &str) -> RoleCategory {
        if let Some(category) = self.config.role_categories.get(role_name) {
            return *category;
        }
        let lower = role_name.to_lowercase();
        if lower.contains("admin") || lower.contains("owner") {
            RoleCategory::Admin
        } else if lower.contains("editor") || lower.contains("write") {
            RoleCategory::Write
        } else if lower.contains("viewer") || lower.contains("read") {
            RoleCategory::Read
        } else {
            RoleCategory::Access
        }
    }

    /// Edge type a simulated member→resource access edge carries
    pub fn access_edge_type(&self, role_name: &str) -> EdgeType {
        match self.classify(role_name) {
            RoleCategory::Admin => EdgeType::CanAdmin,
            RoleCategory::Write => EdgeType::CanWrite,
            RoleCategory::Read => EdgeType::CanRead,
            RoleCategory::Access => EdgeType::HasAccessTo,
        }
    }

    /// Known attack vectors a role opens, by dangerous-role category
    pub fn attack_vectors(&self, role_name: &str) -> Vec<String> {
        let lower = role_name.to_lowercase();
        let mut vectors = Vec::new();

        if lower.contains("serviceaccounttokencreator") || lower.contains("serviceaccountkeyadmin")
        {
            vectors.push(VECTOR_IMPERSONATION.to_string());
        }
        if (lower.contains("cloudfunctions") && lower.contains("admin"))
            || lower.contains("run.admin")
        {
            vectors.push(VECTOR_CODE_EXECUTION.to_string());
        }
        if lower.contains("compute") && lower.contains("admin") {
            vectors.push(VECTOR_VM_ESCALATION.to_string());
        }

        vectors
    }

    /// True for the primitive roles that defeat least privilege
    pub fn is_primitive(&self, role_name: &str) -> bool {
        role_name == "roles/owner" || role_name == "roles/editor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_substring_classification() {
        let config = AnalysisConfig::default();
        let classifier = RoleClassifier::new(&config);

        assert_eq!(classifier.classify("roles/owner"), RoleCategory::Admin);
        assert_eq!(classifier.classify("roles/compute.admin"), RoleCategory::Admin);
        assert_eq!(classifier.classify("roles/editor"), RoleCategory::Write);
        assert_eq!(classifier.classify("roles/storage.objectViewer"), RoleCategory::Read);
        assert_eq!(
            classifier.classify("roles/iam.serviceAccountTokenCreator"),
            RoleCategory::Access
        );
    }

    #[test]
    fn test_override_beats_substring() {
        let mut role_categories = HashMap::new();
        role_categories.insert("roles/custom.deployReader".to_string(), RoleCategory::Write);
        let config = AnalysisConfig {
            role_categories,
            ..Default::default()
        };
        let classifier = RoleClassifier::new(&config);

        // Substring rules would say Read; the override wins.
        assert_eq!(classifier.classify("roles/custom.deployReader"), RoleCategory::Write);
        assert_eq!(classifier.access_edge_type("roles/custom.deployReader"), EdgeType::CanWrite);
    }

    #[test]
    fn test_attack_vector_tags() {
        let config = AnalysisConfig::default();
        let classifier = RoleClassifier::new(&config);

        assert_eq!(
            classifier.attack_vectors("roles/iam.serviceAccountTokenCreator"),
            vec![VECTOR_IMPERSONATION.to_string()]
        );
        assert_eq!(
            classifier.attack_vectors("roles/cloudfunctions.admin"),
            vec![VECTOR_CODE_EXECUTION.to_string()]
        );
        assert_eq!(
            classifier.attack_vectors("roles/run.admin"),
            vec![VECTOR_CODE_EXECUTION.to_string()]
        );
        assert_eq!(
            classifier.attack_vectors("roles/compute.admin"),
            vec![VECTOR_VM_ESCALATION.to_string()]
        );
        assert!(classifier.attack_vectors("roles/viewer").is_empty());
    }

    #[test]
    fn test_primitive_roles() {
        let config = AnalysisConfig::default();
        let classifier = RoleClassifier::new(&config);

        assert!(classifier.is_primitive("roles/owner"));
        assert!(classifier.is_primitive("roles/editor"));
        assert!(!classifier.is_primitive("roles/viewer"));
    }
}
