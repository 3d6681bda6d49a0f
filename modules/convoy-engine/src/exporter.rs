use crate::data::ExportedData;
use crate::error::EngineError;
use convoy_common::Resource;
use convoy_http::HttpClient;
use convoy_registry::Registry;
use serde_json::Value;
use std::collections::HashSet;
use tracing::warn;

/// Derive the shared path prefix (`/api/v2/` or `/api/controller/v2/`, or a
/// connection-scoped rewrite of either) from the registry's organizations
/// entry, since every entry shares the same prefix.
fn prefix(registry: &Registry) -> String {
    registry["organizations"]
        .api_path
        .trim_end_matches("organizations/")
        .to_string()
}

async fn fetch_kind(
    client: &HttpClient,
    registry: &Registry,
    kind: &str,
    log: &dyn Fn(&str),
) -> Result<Vec<Resource>, EngineError> {
    let rt = &registry[kind];
    let raw = client.get_all(&rt.api_path).await?;
    let mut out = Vec::with_capacity(raw.len());

    for value in raw {
        let resource = Resource::from(value);
        match resource.natural_key() {
            None | Some("") => {
                warn!(kind, "exported resource has an empty natural key, skipping");
                log(&format!("  SKIP: (unnamed {kind} entry, empty natural key)"));
            }
            Some(key) if rt.is_default_skip(key) => {}
            Some(_) => out.push(resource),
        }
    }

    Ok(out)
}

/// Produce a fully materialized snapshot of the source's object graph.
/// Read-only: never writes to the source.
pub async fn export(
    client: &HttpClient,
    registry: &Registry,
    log: &dyn Fn(&str),
) -> Result<ExportedData, EngineError> {
    let mut data = ExportedData::default();
    let prefix = prefix(registry);

    data.organizations = fetch_kind(client, registry, "organizations", log).await?;
    data.teams = fetch_kind(client, registry, "teams", log).await?;
    data.users = fetch_kind(client, registry, "users", log).await?;

    data.credential_types = fetch_kind(client, registry, "credential_types", log)
        .await?
        .into_iter()
        .filter(|r| !r.is_managed())
        .collect();

    data.credentials = fetch_kind(client, registry, "credentials", log).await?;
    data.projects = fetch_kind(client, registry, "projects", log).await?;
    data.inventories = fetch_kind(client, registry, "inventories", log).await?;

    for inventory in &data.inventories {
        let Some(inv_name) = inventory.name() else {
            continue;
        };
        let Some(inv_id) = inventory.id() else {
            continue;
        };

        let hosts_path = format!("{prefix}inventories/{inv_id}/hosts/");
        let hosts = match client.get_all(&hosts_path).await {
            Ok(raw) => raw.into_iter().map(Resource::from).collect::<Vec<_>>(),
            Err(e) => {
                warn!(inventory = inv_name, error = %e, "failed to fetch hosts for inventory");
                Vec::new()
            }
        };

        let groups_path = format!("{prefix}inventories/{inv_id}/groups/");
        let groups = match client.get_all(&groups_path).await {
            Ok(raw) => raw.into_iter().map(Resource::from).collect::<Vec<_>>(),
            Err(e) => {
                warn!(inventory = inv_name, error = %e, "failed to fetch groups for inventory");
                Vec::new()
            }
        };

        for group in &groups {
            let (Some(group_id), Some(group_name)) = (group.id(), group.name()) else {
                continue;
            };
            let members_path = format!("{prefix}groups/{group_id}/hosts/");
            let member_ids = match client.get_all(&members_path).await {
                Ok(raw) => raw
                    .into_iter()
                    .filter_map(|v| Resource::from(v).id())
                    .collect::<Vec<_>>(),
                Err(e) => {
                    warn!(group = group_name, error = %e, "failed to fetch group membership");
                    Vec::new()
                }
            };
            data.group_hosts.insert(group_id, member_ids);
        }

        log(&format!(
            "  inventory '{inv_name}': {} hosts, {} groups",
            hosts.len(),
            groups.len()
        ));
        data.hosts.insert(inv_id, hosts);
        data.groups.insert(inv_id, groups);
    }

    data.job_templates = fetch_kind(client, registry, "job_templates", log).await?;
    for jt in &data.job_templates {
        if jt.survey_enabled() {
            if let (Some(id), Some(spec)) = (jt.id(), fetch_survey(client, &prefix, "job_templates", jt.id()).await) {
                data.surveys.insert(id, spec);
            }
        }
    }

    data.workflow_job_templates = fetch_kind(client, registry, "workflow_job_templates", log).await?;
    for wfjt in &data.workflow_job_templates {
        let Some(wfjt_id) = wfjt.id() else { continue };

        let nodes_path = format!("{prefix}workflow_job_templates/{wfjt_id}/workflow_nodes/");
        match client.get_all(&nodes_path).await {
            Ok(raw) => {
                data.workflow_nodes
                    .insert(wfjt_id, raw.into_iter().map(Resource::from).collect());
            }
            Err(e) => {
                warn!(wfjt = wfjt.name().unwrap_or_default(), error = %e, "failed to fetch workflow nodes");
            }
        }

        if wfjt.survey_enabled() {
            if let Some(spec) = fetch_survey(client, &prefix, "workflow_job_templates", Some(wfjt_id)).await {
                data.surveys.insert(wfjt_id, spec);
            }
        }
    }

    let known_ujt_names: HashSet<&str> = data
        .job_templates
        .iter()
        .chain(data.workflow_job_templates.iter())
        .filter_map(|r| r.name())
        .collect();

    data.schedules = fetch_kind(client, registry, "schedules", log)
        .await?
        .into_iter()
        .filter(|s| {
            s.summary_field(&["unified_job_template", "name"])
                .and_then(Value::as_str)
                .map(|n| known_ujt_names.contains(n))
                .unwrap_or(false)
        })
        .collect();

    for org in &data.organizations {
        let (Some(org_id), Some(org_name)) = (org.id(), org.name()) else {
            continue;
        };
        let members = fetch_membership(client, &prefix, "organizations", org_id).await;
        data.org_members.insert(org_name.to_string(), members);
    }
    for team in &data.teams {
        let (Some(team_id), Some(team_name)) = (team.id(), team.name()) else {
            continue;
        };
        let members = fetch_membership(client, &prefix, "teams", team_id).await;
        data.team_members.insert(team_name.to_string(), members);
    }

    Ok(data)
}

async fn fetch_survey(
    client: &HttpClient,
    prefix: &str,
    parent_kind: &str,
    id: Option<i64>,
) -> Option<Value> {
    let id = id?;
    let path = format!("{prefix}{parent_kind}/{id}/survey_spec/");
    client.get(&path, &[]).await.ok()
}

async fn fetch_membership(client: &HttpClient, prefix: &str, parent_kind: &str, id: i64) -> Vec<String> {
    let path = format!("{prefix}{parent_kind}/{id}/users/");
    client
        .get_all(&path)
        .await
        .unwrap_or_default()
        .into_iter()
        .filter_map(|v| Resource::from(v).username().map(String::from))
        .filter(|u| u != "admin")
        .collect()
}
