//! Attack-path query tests over a small but realistic IAM graph:
//! one user with an editor binding, an impersonable deploy service
//! account, and a second project reachable only through it.

use iamscope_analysis::{risk, PathFinder};
use iamscope_graph::{
    AccessGraph, AccessLevel, AnalysisConfig, GraphBuilder, Node, NodeType,
};
use serde_json::json;
use std::collections::{HashMap, HashSet};

const ALICE: &str = "user:alice@example.com";
const DEPLOY_SA: &str = "sa:deploy@demo.iam.gserviceaccount.com";

fn fixture() -> AccessGraph {
    let mut builder = GraphBuilder::new();

    builder.add_node(
        Node::new(ALICE, NodeType::User, "alice").with_property("project", json!("demo")),
    );
    builder.add_node(
        Node::new(DEPLOY_SA, NodeType::ServiceAccount, "deploy@demo.iam.gserviceaccount.com")
            .with_property("project", json!("demo")),
    );
    builder.add_node(
        Node::new("role:roles/editor", NodeType::Role, "roles/editor").with_property(
            "permissions",
            json!(["storage.objects.get", "storage.objects.create"]),
        ),
    );
    builder.add_node(
        Node::new("role:roles/owner", NodeType::Role, "roles/owner")
            .with_property("permissions", json!(["resourcemanager.projects.setIamPolicy"])),
    );
    builder.add_node(Node::new("project:demo", NodeType::Project, "demo"));
    builder.add_node(Node::new("project:prod", NodeType::Project, "prod"));

    let mut binding = HashMap::new();
    binding.insert("resource".to_string(), json!("projects/demo"));
    binding.insert("role".to_string(), json!("roles/editor"));
    builder.add_edge(ALICE, "role:roles/editor", "has_role", binding).unwrap();
    builder.add_edge(ALICE, "project:demo", "can_write", HashMap::new()).unwrap();
    builder.add_edge(ALICE, DEPLOY_SA, "can_impersonate", HashMap::new()).unwrap();

    let mut binding = HashMap::new();
    binding.insert("resource".to_string(), json!("projects/prod"));
    binding.insert("role".to_string(), json!("roles/owner"));
    builder.add_edge(DEPLOY_SA, "role:roles/owner", "has_role", binding).unwrap();
    builder.add_edge(DEPLOY_SA, "project:prod", "can_admin", HashMap::new()).unwrap();

    builder.build()
}

fn keys(paths: &[iamscope_graph::AttackPath]) -> HashSet<String> {
    paths.iter().map(|p| p.key()).collect()
}

// ============================================================================
// RESOURCE ACCESS
// ============================================================================

#[test]
fn test_direct_write_path_scores_base_weight() {
    let graph = fixture();
    let config = AnalysisConfig::default();
    let finder = PathFinder::new(&graph, &config);

    let paths = finder.find_paths_to_resource(ALICE, "project:demo", Some(AccessLevel::Write));
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].len(), 1);
    assert_eq!(paths[0].nodes, vec![ALICE, "project:demo"]);
    assert!((paths[0].risk - risk::CAN_WRITE_RISK).abs() < 1e-9);
}

#[test]
fn test_access_level_monotonicity() {
    let graph = fixture();
    let config = AnalysisConfig::default();
    let finder = PathFinder::new(&graph, &config);

    for resource in ["project:demo", "project:prod"] {
        let read = keys(&finder.find_paths_to_resource(ALICE, resource, Some(AccessLevel::Read)));
        let write = keys(&finder.find_paths_to_resource(ALICE, resource, Some(AccessLevel::Write)));
        let admin = keys(&finder.find_paths_to_resource(ALICE, resource, Some(AccessLevel::Admin)));

        assert!(write.is_subset(&read));
        assert!(admin.is_subset(&write));
    }
}

#[test]
fn test_admin_edge_satisfies_read_request() {
    let graph = fixture();
    let config = AnalysisConfig::default();
    let finder = PathFinder::new(&graph, &config);

    // prod is only reachable through the deploy SA's can_admin edge.
    let paths = finder.find_paths_to_resource(ALICE, "project:prod", Some(AccessLevel::Read));
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].nodes, vec![ALICE, DEPLOY_SA, "project:prod"]);
}

// ============================================================================
// IMPERSONATION AND ESCALATION
// ============================================================================

#[test]
fn test_impersonation_paths_name_the_account() {
    let graph = fixture();
    let config = AnalysisConfig::default();
    let finder = PathFinder::new(&graph, &config);

    let paths = finder.find_impersonation_paths(ALICE);
    assert_eq!(paths.len(), 1);
    assert!(paths[0].description.contains("deploy@demo.iam.gserviceaccount.com"));
    assert_eq!(paths[0].nodes, vec![ALICE, DEPLOY_SA]);
}

#[test]
fn test_escalation_includes_all_impersonation_paths() {
    let graph = fixture();
    let config = AnalysisConfig::default();
    let finder = PathFinder::new(&graph, &config);

    let impersonation = keys(&finder.find_impersonation_paths(ALICE));
    let escalation = keys(&finder.find_privilege_escalation_paths(ALICE, None));
    assert!(impersonation.is_subset(&escalation));
    assert!(!impersonation.is_empty());
}

#[test]
fn test_escalation_sorted_by_descending_risk() {
    let graph = fixture();
    let config = AnalysisConfig::default();
    let finder = PathFinder::new(&graph, &config);

    let paths = finder.find_privilege_escalation_paths(ALICE, None);
    assert!(paths.len() >= 2);
    for pair in paths.windows(2) {
        assert!(pair[0].risk >= pair[1].risk);
    }
}

#[test]
fn test_escalation_with_explicit_target_roles() {
    let graph = fixture();
    let config = AnalysisConfig::default();
    let finder = PathFinder::new(&graph, &config);

    let targets = vec!["roles/owner".to_string()];
    let paths = finder.find_privilege_escalation_paths(ALICE, Some(&targets));

    // Paths to roles/owner plus the impersonation path.
    assert!(paths.iter().any(|p| p.nodes.last().map(String::as_str) == Some("role:roles/owner")));
    assert!(paths.iter().any(|p| p.nodes.last().map(String::as_str) == Some(DEPLOY_SA)));
}

// ============================================================================
// LATERAL MOVEMENT
// ============================================================================

#[test]
fn test_lateral_movement_excludes_own_project() {
    let graph = fixture();
    let config = AnalysisConfig::default();
    let finder = PathFinder::new(&graph, &config);

    let paths = finder.find_lateral_movement_paths(ALICE, None);
    assert!(!paths.is_empty());
    for path in &paths {
        assert_eq!(path.nodes.last().map(String::as_str), Some("project:prod"));
        assert!(path.description.contains("prod"));
    }
}

#[test]
fn test_lateral_movement_target_filter() {
    let graph = fixture();
    let config = AnalysisConfig::default();
    let finder = PathFinder::new(&graph, &config);

    assert!(!finder.find_lateral_movement_paths(ALICE, Some("prod")).is_empty());
    assert!(finder.find_lateral_movement_paths(ALICE, Some("staging")).is_empty());
}

// ============================================================================
// SHORTEST VS ENUMERATED
// ============================================================================

#[test]
fn test_shortest_path_never_longer_than_enumerated() {
    let graph = fixture();
    let config = AnalysisConfig::default();
    let finder = PathFinder::new(&graph, &config);

    let pairs = [
        (ALICE, "project:demo"),
        (ALICE, "project:prod"),
        (ALICE, DEPLOY_SA),
        (ALICE, "role:roles/owner"),
    ];
    for (source, target) in pairs {
        let shortest = finder.shortest_path(source, target).unwrap();
        for path in finder.all_simple_paths(source, target, None) {
            assert!(shortest.len() <= path.len());
        }
    }
}

#[test]
fn test_unknown_role_lookup_is_empty_not_error() {
    let graph = fixture();
    let config = AnalysisConfig::default();
    let finder = PathFinder::new(&graph, &config);

    assert!(finder.find_paths_to_role(ALICE, "roles/doesNotExist", None).is_empty());
}
