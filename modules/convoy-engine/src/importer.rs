use crate::cancel::check_cancelled;
use crate::data::{ExportedData, MigrationAction, MigrationPreview, MigrationResource};
use crate::error::EngineError;
use crate::id_map::IdMap;
use crate::log_lines;
use convoy_common::Resource;
use convoy_http::HttpClient;
use convoy_registry::Registry;
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::AtomicBool;
use std::time::Duration;

/// Knobs that vary by destination flavor and deployment, as opposed to the
/// fixed dependency-ordered algorithm itself.
pub struct ImportOptions {
    /// `type_name -> set of names` the user chose to drop from this run.
    pub exclude: HashMap<String, HashSet<String>>,
    /// Only flavor-B destinations queue an async project sync worth waiting for.
    pub wait_for_project_sync: bool,
    pub sync_poll_interval: Duration,
    pub sync_deadline: Duration,
}

fn is_excluded(options: &ImportOptions, kind: &str, name: &str) -> bool {
    options
        .exclude
        .get(kind)
        .map(|names| names.contains(name))
        .unwrap_or(false)
}

fn classification<'a>(
    preview: &'a MigrationPreview,
    kind: &str,
    name: &str,
) -> Option<&'a MigrationResource> {
    preview
        .resources
        .get(kind)
        .and_then(|list| list.iter().find(|r| r.name == name))
}

/// Strip source-specific fields (`id`, derived links, timestamps,
/// `summary_fields`) from a resource's JSON and layer `overrides` on top,
/// producing a POST body that passes through everything else unchanged.
fn passthrough_body(resource: &Resource, overrides: &[(&str, Value)]) -> Value {
    let mut obj: Map<String, Value> = resource
        .as_value()
        .as_object()
        .cloned()
        .unwrap_or_default();

    for key in ["id", "url", "related", "summary_fields", "created", "modified", "type"] {
        obj.remove(key);
    }
    for (key, value) in overrides {
        obj.insert((*key).to_string(), value.clone());
    }

    Value::Object(obj)
}

/// POST-or-adopt one top-level entity: if preflight already classified it as
/// `skip_exists`, record its destination ID without writing; otherwise POST
/// `body` and record the new ID. Per-item POST failures are logged and
/// absorbed — they never fail the phase.
async fn create_or_adopt(
    client: &HttpClient,
    path: &str,
    kind: &str,
    name: &str,
    preview: &MigrationPreview,
    body: &Value,
    log: &dyn Fn(&str),
) -> Option<i64> {
    if let Some(mr) = classification(preview, kind, name) {
        if mr.action == MigrationAction::SkipExists {
            log(&log_lines::skip_exists(name));
            return mr.dest_id;
        }
    }

    let (resp, _status, err) = client.post(path, body).await;
    match err {
        None => {
            let id = Resource::from(resp).id();
            if let Some(id) = id {
                log(&log_lines::created(name, id));
            }
            id
        }
        Some(e) => {
            log(&log_lines::fail(name, &e.to_string()));
            None
        }
    }
}

/// Lookup-before-create for child kinds (hosts, groups) that preflight never
/// classified. Idempotent the same way: a pre-existing row is adopted, not
/// recreated.
async fn find_or_create(
    client: &HttpClient,
    path: &str,
    name: &str,
    body: &Value,
    log: &dyn Fn(&str),
) -> Option<i64> {
    match client.find_by_name(path, name).await {
        Ok(Some(existing)) => {
            let id = Resource::from(existing).id();
            log(&log_lines::skip_exists(name));
            id
        }
        Ok(None) => {
            let (resp, _status, err) = client.post(path, body).await;
            match err {
                None => {
                    let id = Resource::from(resp).id();
                    if let Some(id) = id {
                        log(&log_lines::created(name, id));
                    }
                    id
                }
                Some(e) => {
                    log(&log_lines::fail(name, &e.to_string()));
                    None
                }
            }
        }
        Err(e) => {
            log(&log_lines::fail(name, &e.to_string()));
            None
        }
    }
}

fn prefix(registry: &Registry) -> String {
    registry["organizations"]
        .api_path
        .trim_end_matches("organizations/")
        .to_string()
}

/// Run the dependency-ordered import. Phase-boundary transport errors and
/// cancellation return an `Err`; every other failure is logged and
/// absorbed, and the loop advances to the next item.
pub async fn run(
    client: &HttpClient,
    registry: &Registry,
    data: &ExportedData,
    preview: &MigrationPreview,
    options: &ImportOptions,
    cancel: &AtomicBool,
    log: &dyn Fn(&str),
) -> Result<(), EngineError> {
    let prefix = prefix(registry);
    let mut id_map = IdMap::new();

    check_cancelled(cancel, log)?;
    preload_credential_types(client, registry, &mut id_map).await?;

    check_cancelled(cancel, log)?;
    import_organizations(client, registry, data, preview, options, &mut id_map, log).await;

    check_cancelled(cancel, log)?;
    import_credential_types(client, registry, data, preview, options, &mut id_map, log).await;

    check_cancelled(cancel, log)?;
    import_users(client, registry, data, preview, options, &mut id_map, log).await;

    check_cancelled(cancel, log)?;
    import_teams(client, registry, data, preview, options, &mut id_map, log).await;

    check_cancelled(cancel, log)?;
    import_credentials(client, registry, data, preview, options, &mut id_map, log).await;

    check_cancelled(cancel, log)?;
    let new_project_ids = import_projects(client, registry, data, preview, options, &mut id_map, log).await;

    check_cancelled(cancel, log)?;
    if options.wait_for_project_sync {
        wait_for_project_syncs(client, &prefix, &new_project_ids, options, cancel, log).await?;
    }

    check_cancelled(cancel, log)?;
    import_inventories(client, registry, data, preview, options, &mut id_map, log).await;

    check_cancelled(cancel, log)?;
    import_hosts(client, &prefix, data, options, &mut id_map, log).await;

    check_cancelled(cancel, log)?;
    import_groups(client, &prefix, data, options, &mut id_map, log).await;

    check_cancelled(cancel, log)?;
    import_job_templates(client, registry, &prefix, data, preview, options, &mut id_map, log).await;

    check_cancelled(cancel, log)?;
    import_schedules(client, registry, data, preview, options, &id_map, log).await;

    check_cancelled(cancel, log)?;
    import_workflow_job_templates(client, registry, data, preview, options, &mut id_map, log).await;

    check_cancelled(cancel, log)?;
    import_workflow_nodes(client, &prefix, data, &mut id_map, log).await?;

    check_cancelled(cancel, log)?;
    import_membership(client, &prefix, data, &id_map, log).await;

    Ok(())
}

async fn preload_credential_types(
    client: &HttpClient,
    registry: &Registry,
    id_map: &mut IdMap,
) -> Result<(), EngineError> {
    let raw = client.get_all(&registry["credential_types"].api_path).await?;
    for value in raw {
        let resource = Resource::from(value);
        if let (Some(name), Some(id)) = (resource.name(), resource.id()) {
            id_map.cred_types_by_name.insert(name.to_string(), id);
        }
    }
    Ok(())
}

async fn import_organizations(
    client: &HttpClient,
    registry: &Registry,
    data: &ExportedData,
    preview: &MigrationPreview,
    options: &ImportOptions,
    id_map: &mut IdMap,
    log: &dyn Fn(&str),
) {
    log(&log_lines::section("Organizations"));
    let path = &registry["organizations"].api_path;

    for org in &data.organizations {
        let Some(name) = org.name() else { continue };
        if is_excluded(options, "organizations", name) {
            log(&log_lines::excluded(name));
            continue;
        }
        let body = json!({
            "name": name,
            "description": org.get_str("description").unwrap_or(""),
        });
        if let Some(id) = create_or_adopt(client, path, "organizations", name, preview, &body, log).await {
            id_map.orgs.insert(name.to_string(), id);
        }
    }
}

async fn import_credential_types(
    client: &HttpClient,
    registry: &Registry,
    data: &ExportedData,
    preview: &MigrationPreview,
    options: &ImportOptions,
    id_map: &mut IdMap,
    log: &dyn Fn(&str),
) {
    log(&log_lines::section("Credential Types"));
    let path = &registry["credential_types"].api_path;

    for ct in &data.credential_types {
        let Some(name) = ct.name() else { continue };
        if is_excluded(options, "credential_types", name) {
            log(&log_lines::excluded(name));
            continue;
        }
        let body = json!({
            "name": name,
            "description": ct.get_str("description").unwrap_or(""),
            "kind": ct.get_str("kind").unwrap_or("cloud"),
            "inputs": ct.as_value().get("inputs").cloned().unwrap_or(json!({})),
            "injectors": ct.as_value().get("injectors").cloned().unwrap_or(json!({})),
        });
        if let Some(id) = create_or_adopt(client, path, "credential_types", name, preview, &body, log).await {
            id_map.cred_types_by_name.insert(name.to_string(), id);
            if let Some(source_id) = ct.id() {
                id_map.cred_types_by_source_id.insert(source_id, id);
            }
        }
    }
}

async fn import_users(
    client: &HttpClient,
    registry: &Registry,
    data: &ExportedData,
    preview: &MigrationPreview,
    options: &ImportOptions,
    id_map: &mut IdMap,
    log: &dyn Fn(&str),
) {
    log(&log_lines::section("Users"));
    let path = &registry["users"].api_path;

    for user in &data.users {
        let Some(username) = user.username() else { continue };
        if is_excluded(options, "users", username) {
            log(&log_lines::excluded(username));
            continue;
        }
        let body = json!({
            "username": username,
            "first_name": user.get_str("first_name").unwrap_or(""),
            "last_name": user.get_str("last_name").unwrap_or(""),
            "email": user.get_str("email").unwrap_or(""),
            "password": "changeme!",
            "is_superuser": false,
        });
        if let Some(id) = create_or_adopt(client, path, "users", username, preview, &body, log).await {
            id_map.users.insert(username.to_string(), id);
        }
    }
}

async fn import_teams(
    client: &HttpClient,
    registry: &Registry,
    data: &ExportedData,
    preview: &MigrationPreview,
    options: &ImportOptions,
    id_map: &mut IdMap,
    log: &dyn Fn(&str),
) {
    log(&log_lines::section("Teams"));
    let path = &registry["teams"].api_path;

    for team in &data.teams {
        let Some(name) = team.name() else { continue };
        if is_excluded(options, "teams", name) {
            log(&log_lines::excluded(name));
            continue;
        }
        let Some(org_name) = team
            .summary_field(&["organization", "name"])
            .and_then(Value::as_str)
        else {
            log(&log_lines::skip_reason(name, "no source organization on record"));
            continue;
        };
        let Some(&org_id) = id_map.orgs.get(org_name) else {
            log(&log_lines::skip_reason(name, &format!("org \"{org_name}\" not found")));
            continue;
        };

        let body = json!({"name": name, "organization": org_id});
        if let Some(id) = create_or_adopt(client, path, "teams", name, preview, &body, log).await {
            id_map.teams.insert(name.to_string(), id);
        }
    }
}

async fn import_credentials(
    client: &HttpClient,
    registry: &Registry,
    data: &ExportedData,
    preview: &MigrationPreview,
    options: &ImportOptions,
    id_map: &mut IdMap,
    log: &dyn Fn(&str),
) {
    log(&log_lines::section("Credentials"));
    let path = &registry["credentials"].api_path;

    for cred in &data.credentials {
        let Some(name) = cred.name() else { continue };
        if is_excluded(options, "credentials", name) {
            log(&log_lines::excluded(name));
            continue;
        }

        let source_type_id = cred.get_i64("credential_type");
        let type_name = cred
            .summary_field(&["credential_type", "name"])
            .and_then(Value::as_str);

        let dest_type_id = source_type_id
            .and_then(|sid| id_map.cred_types_by_source_id.get(&sid).copied())
            .or_else(|| type_name.and_then(|n| id_map.cred_types_by_name.get(n).copied()));

        let Some(dest_type_id) = dest_type_id else {
            log(&log_lines::skip_reason(name, "credential type could not be resolved"));
            continue;
        };

        let org_id = cred
            .summary_field(&["organization", "name"])
            .and_then(Value::as_str)
            .and_then(|n| id_map.orgs.get(n))
            .copied();

        let mut body = json!({
            "name": name,
            "credential_type": dest_type_id,
            "inputs": {},
        });
        if let Some(org_id) = org_id {
            body["organization"] = json!(org_id);
        }

        if let Some(id) = create_or_adopt(client, path, "credentials", name, preview, &body, log).await {
            id_map.credentials.insert(name.to_string(), id);
        }
    }
}

async fn import_projects(
    client: &HttpClient,
    registry: &Registry,
    data: &ExportedData,
    preview: &MigrationPreview,
    options: &ImportOptions,
    id_map: &mut IdMap,
    log: &dyn Fn(&str),
) -> Vec<i64> {
    log(&log_lines::section("Projects"));
    let path = &registry["projects"].api_path;
    let mut newly_created = Vec::new();

    for project in &data.projects {
        let Some(name) = project.name() else { continue };
        if is_excluded(options, "projects", name) {
            log(&log_lines::excluded(name));
            continue;
        }

        let org_id = project
            .summary_field(&["organization", "name"])
            .and_then(Value::as_str)
            .and_then(|n| id_map.orgs.get(n))
            .copied();

        let cred_id = project
            .summary_field(&["credential", "name"])
            .and_then(Value::as_str)
            .and_then(|n| id_map.credentials.get(n))
            .copied();

        let mut overrides = vec![];
        if let Some(org_id) = org_id {
            overrides.push(("organization", json!(org_id)));
        }
        if let Some(cred_id) = cred_id {
            overrides.push(("credential", json!(cred_id)));
        }
        let body = passthrough_body(project, &overrides);

        let was_preexisting = classification(preview, "projects", name)
            .map(|mr| mr.action == MigrationAction::SkipExists)
            .unwrap_or(false);

        if let Some(id) = create_or_adopt(client, path, "projects", name, preview, &body, log).await {
            id_map.projects.insert(name.to_string(), id);
            if !was_preexisting {
                newly_created.push(id);
            }
        }
    }

    newly_created
}

/// Poll the cancellation flag at a short, fixed cadence so it can be raced
/// against a longer sleep via `tokio::select!` — resolves as soon as the
/// flag flips rather than waiting for the flag to be checked at the next
/// loop iteration.
async fn wait_for_cancel(cancel: &AtomicBool) {
    loop {
        if cancel.load(std::sync::atomic::Ordering::SeqCst) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

async fn wait_for_project_syncs(
    client: &HttpClient,
    prefix: &str,
    project_ids: &[i64],
    options: &ImportOptions,
    cancel: &AtomicBool,
    log: &dyn Fn(&str),
) -> Result<(), EngineError> {
    for &id in project_ids {
        check_cancelled(cancel, log)?;

        let path = format!("{prefix}projects/{id}/");
        let mut waited = Duration::ZERO;

        loop {
            if cancel.load(std::sync::atomic::Ordering::SeqCst) {
                log("Migration cancelled by user");
                return Err(EngineError::Cancelled);
            }

            let status = client
                .get(&path, &[])
                .await
                .ok()
                .and_then(|v| v.get("status").and_then(Value::as_str).map(String::from));

            match status.as_deref() {
                Some("successful") => break,
                Some("failed") | Some("error") | Some("canceled") => {
                    log(&format!("  project {id} sync ended in status {status:?}, proceeding"));
                    break;
                }
                _ if waited >= options.sync_deadline => {
                    log(&format!("  project {id} sync did not finish within deadline, proceeding"));
                    break;
                }
                _ => {
                    let step = options.sync_poll_interval.min(options.sync_deadline - waited);
                    tokio::select! {
                        _ = tokio::time::sleep(step) => {}
                        _ = wait_for_cancel(cancel) => {
                            log("Migration cancelled by user");
                            return Err(EngineError::Cancelled);
                        }
                    }
                    waited += step;
                }
            }
        }
    }
    Ok(())
}

async fn import_inventories(
    client: &HttpClient,
    registry: &Registry,
    data: &ExportedData,
    preview: &MigrationPreview,
    options: &ImportOptions,
    id_map: &mut IdMap,
    log: &dyn Fn(&str),
) {
    log(&log_lines::section("Inventories"));
    let path = &registry["inventories"].api_path;

    for inv in &data.inventories {
        let Some(name) = inv.name() else { continue };
        if is_excluded(options, "inventories", name) {
            log(&log_lines::excluded(name));
            continue;
        }

        let org_id = inv
            .summary_field(&["organization", "name"])
            .and_then(Value::as_str)
            .and_then(|n| id_map.orgs.get(n))
            .copied();

        let mut overrides = vec![];
        if let Some(org_id) = org_id {
            overrides.push(("organization", json!(org_id)));
        }
        let body = passthrough_body(inv, &overrides);

        if let Some(id) = create_or_adopt(client, path, "inventories", name, preview, &body, log).await {
            id_map.inventories.insert(name.to_string(), id);
        }
    }
}

async fn import_hosts(
    client: &HttpClient,
    prefix: &str,
    data: &ExportedData,
    options: &ImportOptions,
    id_map: &mut IdMap,
    log: &dyn Fn(&str),
) {
    log(&log_lines::section("Hosts"));

    for inv in &data.inventories {
        let Some(inv_name) = inv.name() else { continue };
        let Some(inv_source_id) = inv.id() else { continue };
        if is_excluded(options, "inventories", inv_name) {
            continue;
        }
        let Some(&dest_inv_id) = id_map.inventories.get(inv_name) else {
            continue;
        };
        let Some(hosts) = data.hosts.get(&inv_source_id) else {
            continue;
        };
        let path = format!("{prefix}inventories/{dest_inv_id}/hosts/");

        for host in hosts {
            let Some(host_name) = host.name() else { continue };
            let body = passthrough_body(host, &[("inventory", json!(dest_inv_id))]);
            if let Some(id) = find_or_create(client, &path, host_name, &body, log).await {
                id_map.hosts.insert(IdMap::host_key(inv_name, host_name), id);
            }
        }
    }
}

async fn import_groups(
    client: &HttpClient,
    prefix: &str,
    data: &ExportedData,
    options: &ImportOptions,
    id_map: &mut IdMap,
    log: &dyn Fn(&str),
) {
    log(&log_lines::section("Groups"));

    for inv in &data.inventories {
        let Some(inv_name) = inv.name() else { continue };
        let Some(inv_source_id) = inv.id() else { continue };
        if is_excluded(options, "inventories", inv_name) {
            continue;
        }
        let Some(&dest_inv_id) = id_map.inventories.get(inv_name) else {
            continue;
        };
        let Some(groups) = data.groups.get(&inv_source_id) else {
            continue;
        };
        let path = format!("{prefix}inventories/{dest_inv_id}/groups/");

        // Source host ID -> name, to translate `group_hosts`' ID-keyed
        // membership back into the name-keyed `id_map.hosts` lookup.
        let host_names_by_source_id: HashMap<i64, &str> = data
            .hosts
            .get(&inv_source_id)
            .into_iter()
            .flatten()
            .filter_map(|h| h.id().zip(h.name()))
            .collect();

        for group in groups {
            let Some(group_name) = group.name() else { continue };
            let Some(group_source_id) = group.id() else { continue };
            let body = passthrough_body(group, &[("inventory", json!(dest_inv_id))]);
            let Some(dest_group_id) = find_or_create(client, &path, group_name, &body, log).await else {
                continue;
            };
            id_map
                .groups
                .insert(IdMap::group_key(inv_name, group_name), dest_group_id);

            if let Some(member_host_ids) = data.group_hosts.get(&group_source_id) {
                let assoc_path = format!("{prefix}groups/{dest_group_id}/hosts/");
                for source_host_id in member_host_ids {
                    let Some(&host_name) = host_names_by_source_id.get(source_host_id) else {
                        continue;
                    };
                    if let Some(&dest_host_id) = id_map.hosts.get(&IdMap::host_key(inv_name, host_name)) {
                        let _ = client.post(&assoc_path, &json!({"id": dest_host_id})).await;
                    }
                }
            }
        }
    }
}

async fn import_job_templates(
    client: &HttpClient,
    registry: &Registry,
    prefix: &str,
    data: &ExportedData,
    preview: &MigrationPreview,
    options: &ImportOptions,
    id_map: &mut IdMap,
    log: &dyn Fn(&str),
) {
    log(&log_lines::section("Job Templates"));
    let path = &registry["job_templates"].api_path;

    for jt in &data.job_templates {
        let Some(name) = jt.name() else { continue };
        if is_excluded(options, "job_templates", name) {
            log(&log_lines::excluded(name));
            continue;
        }

        let project_name = jt.summary_field(&["project", "name"]).and_then(Value::as_str);
        let inventory_name = jt.summary_field(&["inventory", "name"]).and_then(Value::as_str);

        let Some(project_id) = project_name.and_then(|n| id_map.projects.get(n)).copied() else {
            log(&log_lines::skip_reason(name, "project not found"));
            continue;
        };

        let Some(inventory_id) = inventory_name.and_then(|n| id_map.inventories.get(n)).copied() else {
            log(&log_lines::skip_reason(name, "inventory not found"));
            continue;
        };

        let body = passthrough_body(
            jt,
            &[("project", json!(project_id)), ("inventory", json!(inventory_id))],
        );

        let Some(dest_id) = create_or_adopt(client, path, "job_templates", name, preview, &body, log).await else {
            continue;
        };
        id_map.job_templates.insert(name.to_string(), dest_id);

        for cred_name in jt.summary_credential_names() {
            if let Some(&cred_id) = id_map.credentials.get(&cred_name) {
                let assoc_path = format!("{prefix}job_templates/{dest_id}/credentials/");
                let _ = client.post(&assoc_path, &json!({"id": cred_id})).await;
            }
        }

        if let Some(source_id) = jt.id() {
            if let Some(spec) = data.surveys.get(&source_id) {
                let survey_path = format!("{prefix}job_templates/{dest_id}/survey_spec/");
                let _ = client.post(&survey_path, spec).await;
            }
        }
    }
}

async fn import_schedules(
    client: &HttpClient,
    registry: &Registry,
    data: &ExportedData,
    preview: &MigrationPreview,
    options: &ImportOptions,
    id_map: &IdMap,
    log: &dyn Fn(&str),
) {
    log(&log_lines::section("Schedules"));
    let path = &registry["schedules"].api_path;

    for schedule in &data.schedules {
        let Some(name) = schedule.name() else { continue };
        if is_excluded(options, "schedules", name) {
            log(&log_lines::excluded(name));
            continue;
        }

        let Some(parent_name) = schedule
            .summary_field(&["unified_job_template", "name"])
            .and_then(Value::as_str)
        else {
            log(&log_lines::skip_reason(name, "no parent template on record"));
            continue;
        };

        let Some(parent_id) = id_map.resolve_unified_job_template(parent_name) else {
            log(&log_lines::skip_reason(name, &format!("parent \"{parent_name}\" not found")));
            continue;
        };

        let body = json!({
            "name": name,
            "rrule": schedule.get_str("rrule").unwrap_or(""),
            "unified_job_template": parent_id,
        });

        create_or_adopt(client, path, "schedules", name, preview, &body, log).await;
    }
}

async fn import_workflow_job_templates(
    client: &HttpClient,
    registry: &Registry,
    data: &ExportedData,
    preview: &MigrationPreview,
    options: &ImportOptions,
    id_map: &mut IdMap,
    log: &dyn Fn(&str),
) {
    log(&log_lines::section("Workflow Job Templates"));
    let path = &registry["workflow_job_templates"].api_path;

    for wfjt in &data.workflow_job_templates {
        let Some(name) = wfjt.name() else { continue };
        if is_excluded(options, "workflow_job_templates", name) {
            log(&log_lines::excluded(name));
            continue;
        }

        let org_id = wfjt
            .summary_field(&["organization", "name"])
            .and_then(Value::as_str)
            .and_then(|n| id_map.orgs.get(n))
            .copied();

        let mut overrides = vec![];
        if let Some(org_id) = org_id {
            overrides.push(("organization", json!(org_id)));
        }
        let body = passthrough_body(wfjt, &overrides);

        if let Some(id) =
            create_or_adopt(client, path, "workflow_job_templates", name, preview, &body, log).await
        {
            id_map.workflow_job_templates.insert(name.to_string(), id);
        }
    }
}

async fn import_workflow_nodes(
    client: &HttpClient,
    prefix: &str,
    data: &ExportedData,
    id_map: &mut IdMap,
    log: &dyn Fn(&str),
) -> Result<(), EngineError> {
    log(&log_lines::section("Workflow Nodes"));

    for (wfjt_name, &dest_wfjt_id) in id_map.workflow_job_templates.clone().iter() {
        let source_wfjt_id = data
            .workflow_job_templates
            .iter()
            .find(|w| w.name() == Some(wfjt_name.as_str()))
            .and_then(|w| w.id());
        let Some(source_wfjt_id) = source_wfjt_id else {
            continue;
        };
        let Some(nodes) = data.workflow_nodes.get(&source_wfjt_id) else {
            continue;
        };

        let nodes_path = format!("{prefix}workflow_job_templates/{dest_wfjt_id}/workflow_nodes/");

        // Pass 1: create every node, resolving its unified_job_template by name.
        for node in nodes {
            let Some(source_node_id) = node.id() else { continue };
            let ujt_name = node
                .summary_field(&["unified_job_template", "name"])
                .and_then(Value::as_str);
            let Some(dest_ujt_id) = ujt_name.and_then(|n| id_map.resolve_unified_job_template(n)) else {
                log(&log_lines::skip_reason(
                    &format!("node {source_node_id}"),
                    "unified job template not found",
                ));
                continue;
            };

            let (resp, _status, err) = client
                .post(&nodes_path, &json!({"unified_job_template": dest_ujt_id}))
                .await;
            match err {
                None => {
                    if let Some(dest_node_id) = Resource::from(resp).id() {
                        id_map.nodes.insert(source_node_id, dest_node_id);
                    }
                }
                Some(e) => log(&log_lines::fail(&format!("node {source_node_id}"), &e.to_string())),
            }
        }

        // Pass 2: wire success/failure/always edges between the nodes just created.
        for node in nodes {
            let Some(source_node_id) = node.id() else { continue };
            let Some(&dest_node_id) = id_map.nodes.get(&source_node_id) else {
                continue;
            };

            for edge_kind in ["success_nodes", "failure_nodes", "always_nodes"] {
                let targets = node
                    .as_value()
                    .get(edge_kind)
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default();

                for target in targets {
                    let Some(source_target_id) = target.as_i64() else { continue };
                    let Some(&dest_target_id) = id_map.nodes.get(&source_target_id) else {
                        continue;
                    };
                    let edge_path =
                        format!("{prefix}workflow_job_template_nodes/{dest_node_id}/{edge_kind}/");
                    let _ = client.post(&edge_path, &json!({"id": dest_target_id})).await;
                }
            }
        }

        if let Some(spec) = data.surveys.get(&source_wfjt_id) {
            let survey_path = format!("{prefix}workflow_job_templates/{dest_wfjt_id}/survey_spec/");
            let _ = client.post(&survey_path, spec).await;
        }
    }

    Ok(())
}

async fn import_membership(
    client: &HttpClient,
    prefix: &str,
    data: &ExportedData,
    id_map: &IdMap,
    log: &dyn Fn(&str),
) {
    log(&log_lines::section("Membership"));

    for (org_name, usernames) in &data.org_members {
        let Some(&org_id) = id_map.orgs.get(org_name) else { continue };
        let assoc_path = format!("{prefix}organizations/{org_id}/users/");
        for username in usernames {
            if let Some(&user_id) = id_map.users.get(username) {
                let _ = client.post(&assoc_path, &json!({"id": user_id})).await;
            }
        }
    }

    for (team_name, usernames) in &data.team_members {
        let Some(&team_id) = id_map.teams.get(team_name) else { continue };
        let assoc_path = format!("{prefix}teams/{team_id}/users/");
        for username in usernames {
            if let Some(&user_id) = id_map.users.get(username) {
                let _ = client.post(&assoc_path, &json!({"id": user_id})).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_body_strips_source_specific_fields() {
        let resource = Resource::new(json!({
            "id": 7,
            "url": "/api/v2/projects/7/",
            "summary_fields": {"organization": {"name": "Acme"}},
            "name": "PBooks",
            "scm_type": "git",
        }));
        let body = passthrough_body(&resource, &[("organization", json!(3))]);

        assert!(body.get("id").is_none());
        assert!(body.get("summary_fields").is_none());
        assert_eq!(body["organization"], json!(3));
        assert_eq!(body["scm_type"], json!("git"));
        assert_eq!(body["name"], json!("PBooks"));
    }

    #[test]
    fn is_excluded_checks_the_named_set() {
        let mut exclude = HashMap::new();
        exclude.insert("job_templates".to_string(), {
            let mut set = HashSet::new();
            set.insert("Deploy".to_string());
            set
        });
        let options = ImportOptions {
            exclude,
            wait_for_project_sync: false,
            sync_poll_interval: Duration::from_secs(3),
            sync_deadline: Duration::from_secs(120),
        };

        assert!(is_excluded(&options, "job_templates", "Deploy"));
        assert!(!is_excluded(&options, "job_templates", "Other"));
        assert!(!is_excluded(&options, "projects", "Deploy"));
    }
}
