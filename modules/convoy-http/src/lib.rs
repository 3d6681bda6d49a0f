//! Authenticated JSON HTTP client for the two REST control-plane flavors.
//!
//! Wraps a `reqwest::Client` configured from a [`Connection`]: Basic auth,
//! optional TLS relaxation, and a fixed per-request timeout. Redirects are
//! followed manually rather than through reqwest's built-in policy, because
//! the default policy drops the `Authorization` header on cross-origin hops
//! and these APIs sometimes redirect `http -> https` on the same host.

mod error;
mod page;

pub use error::HttpError;
use page::Page;

use convoy_common::Connection;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const MAX_REDIRECTS: u8 = 5;

pub struct HttpClient {
    client: reqwest::Client,
    base_url: Url,
    username: String,
    password: String,
}

impl HttpClient {
    /// Build a client for `connection`, applying its TLS settings and the
    /// given request timeout.
    pub fn new(connection: &Connection, timeout: Duration) -> Result<Self, HttpError> {
        let mut builder = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none());

        if connection.insecure {
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(pem) = &connection.ca_pem {
            let cert = reqwest::Certificate::from_pem(pem.as_bytes())
                .map_err(|e| HttpError::Network(format!("invalid CA PEM: {e}")))?;
            builder = builder
                .add_root_certificate(cert)
                .tls_built_in_root_certs(false);
        }

        let client = builder.build()?;
        let base_url = Url::parse(&connection.base_url())?;

        Ok(Self {
            client,
            base_url,
            username: connection.username.clone(),
            password: connection.password.clone(),
        })
    }

    fn url_for(&self, path: &str) -> Result<Url, HttpError> {
        Ok(self.base_url.join(path)?)
    }

    /// Execute a request, following same-host redirects up to
    /// [`MAX_REDIRECTS`] and re-applying Basic auth on every hop.
    async fn execute(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
    ) -> Result<reqwest::Response, HttpError> {
        let mut current = url;
        for _ in 0..=MAX_REDIRECTS {
            let mut req = self
                .client
                .request(method.clone(), current.clone())
                .basic_auth(&self.username, Some(&self.password));
            if let Some(b) = body {
                req = req.json(b);
            }

            let resp = req.send().await?;
            let status = resp.status();

            if status.is_redirection() {
                let location = resp
                    .headers()
                    .get(reqwest::header::LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| HttpError::Network("redirect with no Location".into()))?;
                let next = current.join(location)?;
                debug!(from = %current, to = %next, "following redirect");
                current = next;
                continue;
            }

            return Ok(resp);
        }
        Err(HttpError::TooManyRedirects(current.to_string()))
    }

    async fn parse_json(path: &str, resp: reqwest::Response) -> Result<Value, HttpError> {
        let status = resp.status();
        let body_text = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(HttpError::Status {
                path: path.to_string(),
                status: status.as_u16(),
                body: error::truncate_body(&body_text),
            });
        }

        if body_text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body_text).map_err(|e| HttpError::Parse(e.to_string()))
    }

    /// GET a single resource or collection page, with query parameters.
    pub async fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<Value, HttpError> {
        let mut url = self.url_for(path)?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        let resp = self.execute(Method::GET, url, None).await?;
        Self::parse_json(path, resp).await
    }

    /// POST a JSON body. Unlike the other methods this does not fail the
    /// caller on a non-2xx response: it returns the decoded body (best
    /// effort), the status code, and the error if any, so callers that need
    /// to inspect validation errors (e.g. "already exists") can do so
    /// without losing the response.
    pub async fn post(
        &self,
        path: &str,
        body: &Value,
    ) -> (Value, u16, Option<HttpError>) {
        let url = match self.url_for(path) {
            Ok(u) => u,
            Err(e) => return (Value::Null, 0, Some(e)),
        };
        let resp = match self.execute(Method::POST, url, Some(body)).await {
            Ok(r) => r,
            Err(e) => return (Value::Null, 0, Some(e)),
        };
        let status = resp.status().as_u16();
        let body_text = resp.text().await.unwrap_or_default();
        let value = if body_text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&body_text).unwrap_or(Value::Null)
        };

        if StatusCode::from_u16(status)
            .map(|s| s.is_success())
            .unwrap_or(false)
        {
            (value, status, None)
        } else {
            let err = HttpError::Status {
                path: path.to_string(),
                status,
                body: error::truncate_body(&body_text),
            };
            (value, status, Some(err))
        }
    }

    /// PATCH a JSON body onto an existing resource.
    pub async fn patch(&self, path: &str, body: &Value) -> Result<Value, HttpError> {
        let url = self.url_for(path)?;
        let resp = self.execute(Method::PATCH, url, Some(body)).await?;
        Self::parse_json(path, resp).await
    }

    /// DELETE a resource. A 404 is treated as success: the desired end
    /// state (the resource does not exist) already holds.
    pub async fn delete(&self, path: &str) -> Result<(), HttpError> {
        let url = self.url_for(path)?;
        let resp = self.execute(Method::DELETE, url, None).await?;
        let status = resp.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            Ok(())
        } else {
            let body_text = resp.text().await.unwrap_or_default();
            Err(HttpError::Status {
                path: path.to_string(),
                status: status.as_u16(),
                body: error::truncate_body(&body_text),
            })
        }
    }

    /// GET every page of a `{count, next, results}` collection, following
    /// `next` links. A `next` URL pointing at a different host than the
    /// connection is rejected rather than silently followed.
    pub async fn get_all(&self, path: &str) -> Result<Vec<Value>, HttpError> {
        let mut results = Vec::new();
        let mut next: Option<Url> = Some(self.url_for(path)?);

        while let Some(url) = next {
            let resp = self.execute(Method::GET, url.clone(), None).await?;
            let status = resp.status();
            let body_text = resp.text().await.unwrap_or_default();

            if !status.is_success() {
                return Err(HttpError::Status {
                    path: path.to_string(),
                    status: status.as_u16(),
                    body: error::truncate_body(&body_text),
                });
            }

            let page: Page =
                serde_json::from_str(&body_text).map_err(|e| HttpError::Parse(e.to_string()))?;
            results.extend(page.results);

            next = match page.next {
                None => None,
                Some(n) => {
                    let next_url = url.join(&n)?;
                    if next_url.host_str() != self.base_url.host_str() {
                        return Err(HttpError::CrossHostPagination(next_url.to_string()));
                    }
                    Some(next_url)
                }
            };
        }

        Ok(results)
    }

    /// Find a resource in a collection by its `name` field.
    pub async fn find_by_name(&self, path: &str, name: &str) -> Result<Option<Value>, HttpError> {
        self.find_by_field(path, "name", name).await
    }

    /// Find a resource in a collection by its `username` field.
    pub async fn find_by_username(
        &self,
        path: &str,
        username: &str,
    ) -> Result<Option<Value>, HttpError> {
        self.find_by_field(path, "username", username).await
    }

    async fn find_by_field(
        &self,
        path: &str,
        field: &str,
        value: &str,
    ) -> Result<Option<Value>, HttpError> {
        let body = self.get(path, &[(field, value)]).await?;
        let results = body
            .get("results")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        if results.len() > 1 {
            warn!(path, field, value, "find_by_field matched more than one result, using first");
        }

        Ok(results.into_iter().next())
    }
}
