use convoy_common::Resource;
use serde_json::Value;
use std::collections::HashMap;

/// A fully materialized snapshot of the source's object graph. Every
/// cross-reference inside it (organization, project, inventory, credential
/// type) is carried by **name**, never by the source's numeric ID — those
/// IDs are meaningless once crossing to the destination.
#[derive(Debug, Default, Clone)]
pub struct ExportedData {
    pub organizations: Vec<Resource>,
    pub teams: Vec<Resource>,
    pub users: Vec<Resource>,
    pub credential_types: Vec<Resource>,
    pub credentials: Vec<Resource>,
    pub projects: Vec<Resource>,
    pub inventories: Vec<Resource>,
    pub job_templates: Vec<Resource>,
    pub workflow_job_templates: Vec<Resource>,
    pub schedules: Vec<Resource>,

    /// Source inventory ID -> its hosts.
    pub hosts: HashMap<i64, Vec<Resource>>,
    /// Source inventory ID -> its groups.
    pub groups: HashMap<i64, Vec<Resource>>,
    /// Source group ID -> member source host IDs.
    pub group_hosts: HashMap<i64, Vec<i64>>,
    /// Source JT/WFJT ID -> its survey spec, for templates with
    /// `survey_enabled == true`.
    pub surveys: HashMap<i64, Value>,
    /// Source WFJT ID -> its node list.
    pub workflow_nodes: HashMap<i64, Vec<Resource>>,
    /// Organization name -> member usernames (excluding `admin`).
    pub org_members: HashMap<String, Vec<String>>,
    /// Team name -> member usernames (excluding `admin`).
    pub team_members: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationAction {
    Create,
    SkipExists,
}

/// One exported entity's classification against the destination.
#[derive(Debug, Clone)]
pub struct MigrationResource {
    pub source_id: i64,
    pub name: String,
    pub type_name: String,
    pub action: MigrationAction,
    pub dest_id: Option<i64>,
}

/// The read-only classification of an entire export against a destination,
/// plus any warnings surfaced while classifying (e.g. "secrets cannot be
/// exported").
#[derive(Debug, Default, Clone)]
pub struct MigrationPreview {
    pub source_conn_id: String,
    pub dest_conn_id: String,
    pub resources: HashMap<String, Vec<MigrationResource>>,
    pub warnings: Vec<String>,
}

/// Fixed display/import order for resource kinds, shared by preflight and
/// the importer's top-level phases.
pub const DISPLAY_ORDER: &[&str] = &[
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
