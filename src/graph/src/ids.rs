//! Node id scheme and identity/resource string resolution
//!
//! Ids follow a fixed, parseable scheme: `user:<email>`, `sa:<email>`,
//! `group:<email>`, `role:<role_name>`, `project:<project_id>`,
//! `folder:<folder_id>`, `org:<org_id>`, and resource-type-prefixed ids
//! for buckets, datasets, secrets, and KMS keys.

use crate::types::NodeId;

/// Resolve an IAM member string to a node id.
///
/// Accepted forms: `user:<email>`, `serviceAccount:<email>`,
/// `group:<email>`, a bare email (routed to `sa:` when it ends in
/// `.gserviceaccount.com`, `user:` otherwise). Anything else fails to
/// resolve.
pub fn resolve_member(member: &str) -> Option<NodeId> {
    if let Some(email) = member.strip_prefix("user:") {
        return Some(format!("user:{}", email));
    }
    if let Some(email) = member.strip_prefix("serviceAccount:") {
        return Some(format!("sa:{}", email));
    }
    if let Some(email) = member.strip_prefix("group:") {
        return Some(format!("group:{}", email));
    }
    if member.contains('@') && !member.contains(':') {
        if member.ends_with(".gserviceaccount.com") {
            return Some(format!("sa:{}", member));
        }
        return Some(format!("user:{}", member));
    }
    None
}

/// Resolve a resource name to a node id.
///
/// Accepted forms: `projects/<id>`, `folders/<id>`,
/// `organizations/<id>`. Anything else fails to resolve.
pub fn resolve_resource(resource: &str) -> Option<NodeId> {
    if let Some(id) = resource.strip_prefix("projects/") {
        return Some(format!("project:{}", id));
    }
    if let Some(id) = resource.strip_prefix("folders/") {
        return Some(format!("folder:{}", id));
    }
    if let Some(id) = resource.strip_prefix("organizations/") {
        return Some(format!("org:{}", id));
    }
    None
}

/// Node id for a role name (e.g. `roles/editor` → `role:roles/editor`)
pub fn role_node_id(role_name: &str) -> NodeId {
    format!("role:{}", role_name)
}
