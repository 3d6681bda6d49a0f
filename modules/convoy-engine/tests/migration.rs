use convoy_common::{Connection, Flavor};
use convoy_http::HttpClient;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::AtomicBool;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn connection_for(server: &MockServer) -> Connection {
    let url = url::Url::parse(&server.uri()).unwrap();
    Connection::new(
        url.scheme().to_string(),
        url.host_str().unwrap().to_string(),
        url.port_or_known_default().unwrap_or(80),
        "admin".to_string(),
        "secret".to_string(),
        Flavor::FlavorA,
    )
}

fn empty_list(path_str: &'static str) -> Mock {
    Mock::given(method("GET"))
        .and(path(path_str))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 0, "next": null, "results": []
        })))
}

async fn mount_empty_source_collections(server: &MockServer) {
    for p in [
        "/api/v2/teams/",
        "/api/v2/users/",
        "/api/v2/credential_types/",
        "/api/v2/credentials/",
        "/api/v2/projects/",
        "/api/v2/inventories/",
        "/api/v2/job_templates/",
        "/api/v2/workflow_job_templates/",
        "/api/v2/schedules/",
    ] {
        empty_list(p).mount(server).await;
    }
}

#[tokio::test]
async fn fresh_migration_creates_one_organization_then_second_run_is_a_no_op() {
    let source = MockServer::start().await;
    let dest = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/organizations/"))
        .and(query_param_is_missing("name"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "next": null,
            "results": [{"id": 1, "name": "Acme", "description": "Acme org"}]
        })))
        .mount(&source)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/organizations/1/users/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 0, "next": null, "results": []
        })))
        .mount(&source)
        .await;
    mount_empty_source_collections(&source).await;

    empty_list("/api/v2/credential_types/").mount(&dest).await;

    // First run: destination has no Acme yet.
    Mock::given(method("GET"))
        .and(path("/api/v2/organizations/"))
        .and(query_param("name", "Acme"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 0, "next": null, "results": []
        })))
        .up_to_n_times(1)
        .mount(&dest)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v2/organizations/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 101, "name": "Acme", "description": "Acme org"
        })))
        .up_to_n_times(1)
        .mount(&dest)
        .await;

    let src_conn = connection_for(&source);
    let dst_conn = connection_for(&dest);
    let src_client = HttpClient::new(&src_conn, Duration::from_secs(5)).unwrap();
    let dst_client = HttpClient::new(&dst_conn, Duration::from_secs(5)).unwrap();

    let src_registry = convoy_registry::build(Flavor::FlavorA);
    let dst_registry = convoy_registry::build(Flavor::FlavorA);

    let mut lines = Vec::new();
    let log = |line: &str| lines.push(line.to_string());

    let (migration_preview, data) = convoy_engine::preview(
        &src_client,
        &src_registry,
        &dst_client,
        &dst_registry,
        &src_conn,
        &dst_conn,
        &log,
    )
    .await
    .unwrap();

    assert_eq!(migration_preview.resources["organizations"].len(), 1);
    assert_eq!(
        migration_preview.resources["organizations"][0].action,
        convoy_engine::MigrationAction::Create
    );

    let cancel = AtomicBool::new(false);
    convoy_engine::run(
        &dst_client,
        &dst_registry,
        &data,
        &migration_preview,
        HashMap::<String, HashSet<String>>::new(),
        false,
        Duration::from_millis(10),
        Duration::from_millis(50),
        &cancel,
        &log,
    )
    .await
    .unwrap();

    assert!(lines.iter().any(|l| l.contains("CREATED: Acme")));

    // Second pass: destination now reports Acme as existing.
    Mock::given(method("GET"))
        .and(path("/api/v2/organizations/"))
        .and(query_param("name", "Acme"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "next": null,
            "results": [{"id": 101, "name": "Acme", "description": "Acme org"}]
        })))
        .mount(&dest)
        .await;

    let mut second_lines = Vec::new();
    let second_log = |line: &str| second_lines.push(line.to_string());

    let (second_preview, second_data) = convoy_engine::preview(
        &src_client,
        &src_registry,
        &dst_client,
        &dst_registry,
        &src_conn,
        &dst_conn,
        &second_log,
    )
    .await
    .unwrap();

    assert_eq!(
        second_preview.resources["organizations"][0].action,
        convoy_engine::MigrationAction::SkipExists
    );

    convoy_engine::run(
        &dst_client,
        &dst_registry,
        &second_data,
        &second_preview,
        HashMap::<String, HashSet<String>>::new(),
        false,
        Duration::from_millis(10),
        Duration::from_millis(50),
        &cancel,
        &second_log,
    )
    .await
    .unwrap();

    assert!(second_lines.iter().any(|l| l.contains("SKIP (exists): Acme")));
    assert!(!second_lines.iter().any(|l| l.contains("CREATED: Acme")));
}
