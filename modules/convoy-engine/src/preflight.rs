use crate::data::{ExportedData, MigrationAction, MigrationPreview, MigrationResource, DISPLAY_ORDER};
use crate::error::EngineError;
use convoy_common::Resource;
use convoy_http::HttpClient;
use convoy_registry::Registry;

fn resources_for<'a>(data: &'a ExportedData, kind: &str) -> &'a [Resource] {
    match kind {
        "organizations" => &data.organizations,
        "teams" => &data.teams,
        "users" => &data.users,
        "credential_types" => &data.credential_types,
        "credentials" => &data.credentials,
        "projects" => &data.projects,
        "inventories" => &data.inventories,
        "job_templates" => &data.job_templates,
        "workflow_job_templates" => &data.workflow_job_templates,
        "schedules" => &data.schedules,
        other => unreachable!("unknown resource kind in preflight: {other}"),
    }
}

/// Classify every exported entity against the destination: `create` if no
/// same-natural-key row exists there, `skip_exists` (with `dest_id`) if one
/// does. Read-only: never writes to the destination.
pub async fn preflight(
    client: &HttpClient,
    registry: &Registry,
    data: &ExportedData,
    source_conn_id: impl Into<String>,
    dest_conn_id: impl Into<String>,
) -> Result<MigrationPreview, EngineError> {
    let mut preview = MigrationPreview {
        source_conn_id: source_conn_id.into(),
        dest_conn_id: dest_conn_id.into(),
        ..Default::default()
    };

    for &kind in DISPLAY_ORDER {
        let rt = &registry[kind];
        let mut classified = Vec::new();

        for resource in resources_for(data, kind) {
            let Some(key) = resource.natural_key() else {
                continue;
            };

            let existing = if kind == "users" {
                client.find_by_username(&rt.api_path, key).await?
            } else {
                client.find_by_name(&rt.api_path, key).await?
            };

            let (action, dest_id) = match existing.as_ref().and_then(|v| Resource::from(v.clone()).id()) {
                Some(id) => (MigrationAction::SkipExists, Some(id)),
                None => (MigrationAction::Create, None),
            };

            classified.push(MigrationResource {
                source_id: resource.id().unwrap_or(0),
                name: key.to_string(),
                type_name: kind.to_string(),
                action,
                dest_id,
            });
        }

        preview.resources.insert(kind.to_string(), classified);
    }

    if !data.credentials.is_empty() {
        preview
            .warnings
            .push("secrets cannot be exported; inputs will be empty".to_string());
    }
    if !data.users.is_empty() {
        preview
            .warnings
            .push("passwords cannot be exported; placeholder password assigned".to_string());
    }

    Ok(preview)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MigrationAction;

    #[test]
    fn resources_for_every_display_order_kind_does_not_panic() {
        let data = ExportedData::default();
        for &kind in DISPLAY_ORDER {
            assert!(resources_for(&data, kind).is_empty());
        }
    }

    #[test]
    fn classification_invariant_skip_exists_implies_dest_id() {
        let classified = MigrationResource {
            source_id: 1,
            name: "Acme".into(),
            type_name: "organizations".into(),
            action: MigrationAction::SkipExists,
            dest_id: Some(9),
        };
        if classified.action == MigrationAction::SkipExists {
            assert!(classified.dest_id.unwrap_or(0) > 0);
        }
    }
}
