//! Static, per-flavor catalog of resource kinds.
//!
//! Everything the engine needs to know about a resource kind that isn't in
//! the decoded JSON itself — its stable machine name, its API path, and the
//! set of default/system names that must never be deleted or migrated —
//! lives here. This is the single source of truth for "default-skip" names:
//! the exporter calls into the registry rather than keeping its own copy.

use convoy_common::Flavor;
use std::collections::{HashMap, HashSet};

/// Static descriptor for one resource kind.
#[derive(Debug, Clone)]
pub struct ResourceType {
    /// Stable machine key, e.g. `"job_templates"`.
    pub name: &'static str,
    /// Human label, e.g. `"Job Templates"`.
    pub label: &'static str,
    /// API path template, e.g. `/api/v2/job_templates/`.
    pub api_path: String,
    /// Names that are platform defaults and must never be migrated or
    /// deleted (e.g. the `Default` organization, the `admin` user).
    pub default_skip: HashSet<String>,
}

impl ResourceType {
    fn new(name: &'static str, label: &'static str, api_path: String) -> Self {
        Self {
            name,
            label,
            api_path,
            default_skip: HashSet::new(),
        }
    }

    fn with_skip(mut self, names: &[&str]) -> Self {
        self.default_skip = names.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Whether `candidate` is a default/system name for this kind and
    /// should never be migrated.
    pub fn is_default_skip(&self, candidate: &str) -> bool {
        self.default_skip.contains(candidate)
    }
}

/// The full catalog for one connection's flavor, keyed by machine name.
pub type Registry = HashMap<&'static str, ResourceType>;

const TOP_LEVEL_KINDS: &[&str] = &[
    "organizations",
    "teams",
    "users",
    "credential_types",
    "credentials",
    "projects",
    "inventories",
    "job_templates",
    "workflow_job_templates",
    "schedules",
];

const CHILD_KINDS: &[&str] = &["hosts", "groups", "workflow_job_template_nodes"];

fn label_for(kind: &str) -> &'static str {
    match kind {
        "organizations" => "Organizations",
        "teams" => "Teams",
        "users" => "Users",
        "credential_types" => "Credential Types",
        "credentials" => "Credentials",
        "projects" => "Projects",
        "inventories" => "Inventories",
        "job_templates" => "Job Templates",
        "workflow_job_templates" => "Workflow Job Templates",
        "schedules" => "Schedules",
        "hosts" => "Hosts",
        "groups" => "Groups",
        "workflow_job_template_nodes" => "Workflow Job Template Nodes",
        other => unreachable!("unknown resource kind: {other}"),
    }
}

fn prefix_for(flavor: Flavor) -> &'static str {
    match flavor {
        Flavor::FlavorA => "/api/v2/",
        Flavor::FlavorB => "/api/controller/v2/",
    }
}

/// Build the static catalog for `flavor`, rooted at that flavor's default
/// API prefix.
pub fn build(flavor: Flavor) -> Registry {
    let prefix = prefix_for(flavor);
    let mut registry = Registry::new();

    for &kind in TOP_LEVEL_KINDS.iter().chain(CHILD_KINDS) {
        let api_path = format!("{prefix}{kind}/");
        let entry = ResourceType::new(kind, label_for(kind), api_path);
        registry.insert(kind, entry);
    }

    registry
        .get_mut("organizations")
        .unwrap()
        .default_skip
        .insert("Default".to_string());
    registry
        .get_mut("users")
        .unwrap()
        .default_skip
        .insert("admin".to_string());

    registry
}

/// Deep-copy `registry`, replacing `old_prefix` with `new_prefix` in every
/// API path. Used when discovery learns the connection's actual prefix
/// differs from the flavor's default, so the rewritten paths are scoped to
/// that one connection and never bleed into another's.
pub fn rewrite(registry: &Registry, old_prefix: &str, new_prefix: &str) -> Registry {
    registry
        .iter()
        .map(|(&key, rt)| {
            let rewritten = ResourceType {
                name: rt.name,
                label: rt.label,
                api_path: rt.api_path.replacen(old_prefix, new_prefix, 1),
                default_skip: rt.default_skip.clone(),
            };
            (key, rewritten)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flavor_a_uses_default_v2_prefix() {
        let r = build(Flavor::FlavorA);
        assert_eq!(r["job_templates"].api_path, "/api/v2/job_templates/");
    }

    #[test]
    fn flavor_b_uses_controller_prefix() {
        let r = build(Flavor::FlavorB);
        assert_eq!(
            r["job_templates"].api_path,
            "/api/controller/v2/job_templates/"
        );
    }

    #[test]
    fn default_skip_covers_default_org_and_admin_user() {
        let r = build(Flavor::FlavorA);
        assert!(r["organizations"].is_default_skip("Default"));
        assert!(!r["organizations"].is_default_skip("Engineering"));
        assert!(r["users"].is_default_skip("admin"));
    }

    #[test]
    fn rewrite_produces_independent_copy() {
        let original = build(Flavor::FlavorA);
        let rewritten = rewrite(&original, "/api/v2/", "/api/v2.1/");

        assert_eq!(
            rewritten["job_templates"].api_path,
            "/api/v2.1/job_templates/"
        );
        // The original is untouched.
        assert_eq!(original["job_templates"].api_path, "/api/v2/job_templates/");
        assert!(rewritten["organizations"].is_default_skip("Default"));
    }
}
