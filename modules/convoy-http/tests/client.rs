use convoy_common::{Connection, Flavor};
use convoy_http::HttpClient;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
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

fn client_for(server: &MockServer) -> HttpClient {
    HttpClient::new(&connection_for(server), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn get_all_follows_relative_next_links() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/organizations/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 2,
            "next": "/api/v2/organizations/?page=2",
            "results": [{"id": 1, "name": "first"}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v2/organizations/"))
        .and(wiremock::matchers::query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 2,
            "next": null,
            "results": [{"id": 2, "name": "second"}]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let all = client.get_all("/api/v2/organizations/").await.unwrap();

    assert_eq!(all.len(), 2);
    assert_eq!(all[0]["name"], "first");
    assert_eq!(all[1]["name"], "second");
}

#[tokio::test]
async fn get_all_rejects_cross_host_next() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/organizations/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 2,
            "next": "http://attacker.example/api/v2/organizations/?page=2",
            "results": [{"id": 1, "name": "first"}]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.get_all("/api/v2/organizations/").await.unwrap_err();

    assert!(matches!(err, convoy_http::HttpError::CrossHostPagination(_)));
}

#[tokio::test]
async fn delete_treats_404_as_success() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/v2/organizations/9/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.delete("/api/v2/organizations/9/").await.unwrap();
}

#[tokio::test]
async fn post_returns_status_and_error_without_failing_the_call() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/organizations/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "name": ["This field must be unique."]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let (body, status, err) = client
        .post("/api/v2/organizations/", &json!({"name": "dup"}))
        .await;

    assert_eq!(status, 400);
    assert!(err.is_some());
    assert!(body["name"].is_array());
}

#[tokio::test]
async fn find_by_name_returns_first_match() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/organizations/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "next": null,
            "results": [{"id": 5, "name": "Acme"}]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let found = client
        .find_by_name("/api/v2/organizations/", "Acme")
        .await
        .unwrap();

    assert_eq!(found.unwrap()["id"], 5);
}
