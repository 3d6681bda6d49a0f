use convoy_common::{Connection, Flavor};
use convoy_discovery::probe;
use convoy_http::HttpClient;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn connection_for(server: &MockServer, flavor: Flavor) -> Connection {
    let url = url::Url::parse(&server.uri()).unwrap();
    Connection::new(
        url.scheme().to_string(),
        url.host_str().unwrap().to_string(),
        url.port_or_known_default().unwrap_or(80),
        "admin".to_string(),
        "secret".to_string(),
        flavor,
    )
}

#[tokio::test]
async fn probe_reads_version_and_prefix_for_flavor_a() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "current_version": "/api/v2/"
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v2/ping/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "version": "4.2.0"
        })))
        .mount(&server)
        .await;

    let connection = connection_for(&server, Flavor::FlavorA);
    let client = HttpClient::new(&connection, Duration::from_secs(5)).unwrap();
    let discovery = probe(&client, &connection).await;

    assert_eq!(discovery.version, "4.2.0");
    assert_eq!(discovery.prefix, "/api/v2/");
}

#[tokio::test]
async fn probe_falls_back_to_defaults_on_failure() {
    let server = MockServer::start().await;
    // No mocks registered: every request 404s.

    let connection = connection_for(&server, Flavor::FlavorA);
    let client = HttpClient::new(&connection, Duration::from_secs(5)).unwrap();
    let discovery = probe(&client, &connection).await;

    assert_eq!(discovery.version, "");
    assert_eq!(discovery.prefix, "/api/v2/");
}
