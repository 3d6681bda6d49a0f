use std::collections::HashMap;

/// Per-kind lookup tables from source natural key (or source numeric ID, for
/// credential types and workflow nodes) to destination numeric ID.
///
/// A typed struct rather than a single untyped `HashMap<String, HashMap<...>>`
/// so that resolving the wrong kind at a call site is a compile error, not a
/// runtime lookup miss.
#[derive(Debug, Default)]
pub struct IdMap {
    pub orgs: HashMap<String, i64>,
    pub teams: HashMap<String, i64>,
    pub users: HashMap<String, i64>,
    pub cred_types_by_name: HashMap<String, i64>,
    pub cred_types_by_source_id: HashMap<i64, i64>,
    pub credentials: HashMap<String, i64>,
    pub projects: HashMap<String, i64>,
    pub inventories: HashMap<String, i64>,
    /// Keyed by `"<inventory name>/<host name>"` to avoid cross-inventory
    /// collisions between hosts that share a name.
    pub hosts: HashMap<String, i64>,
    /// Keyed by `"<inventory name>/<group name>"`.
    pub groups: HashMap<String, i64>,
    pub job_templates: HashMap<String, i64>,
    pub workflow_job_templates: HashMap<String, i64>,
    pub schedules: HashMap<String, i64>,
    /// Source workflow node ID -> destination workflow node ID.
    pub nodes: HashMap<i64, i64>,
}

impl IdMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host_key(inventory_name: &str, host_name: &str) -> String {
        format!("{inventory_name}/{host_name}")
    }

    pub fn group_key(inventory_name: &str, group_name: &str) -> String {
        format!("{inventory_name}/{group_name}")
    }

    /// Resolve a job-template-or-workflow-template's destination ID by name,
    /// checking job templates first and falling back to workflow templates.
    pub fn resolve_unified_job_template(&self, name: &str) -> Option<i64> {
        self.job_templates
            .get(name)
            .or_else(|| self.workflow_job_templates.get(name))
            .copied()
    }
}
