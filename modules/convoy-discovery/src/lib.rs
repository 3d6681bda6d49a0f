//! One-shot API discovery: learn a connection's version and path prefix
//! after a successful authentication probe.
//!
//! Discovery failures are never fatal — they're logged and the caller falls
//! back to the flavor's default prefix and an empty version string, which
//! `version_at_least` treats as "feature available."

use convoy_common::{Connection, Flavor};
use convoy_http::HttpClient;
use convoy_registry::Registry;
use tracing::warn;

/// Result of a successful probe: the platform version string (possibly
/// empty) and the API path prefix actually in use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    pub version: String,
    pub prefix: String,
}

/// Probe `connection` for its version and path prefix. Never returns an
/// error to the caller: on any failure it logs a warning and returns the
/// flavor's default prefix with an empty version.
pub async fn probe(client: &HttpClient, connection: &Connection) -> Discovery {
    match try_probe(client, connection).await {
        Ok(d) => d,
        Err(e) => {
            warn!(error = %e, host = %connection.host, "API discovery failed, falling back to defaults");
            Discovery {
                version: String::new(),
                prefix: default_prefix(connection.flavor).to_string(),
            }
        }
    }
}

async fn try_probe(
    client: &HttpClient,
    connection: &Connection,
) -> Result<Discovery, convoy_http::HttpError> {
    let root = client.get("/api/", &[]).await?;
    let prefix = resolve_prefix(connection.flavor, &root)
        .unwrap_or_else(|| default_prefix(connection.flavor).to_string());

    let ping_path = format!("{prefix}ping/");
    let ping = match client.get(&ping_path, &[]).await {
        Ok(p) => p,
        Err(_) if connection.flavor == Flavor::FlavorB => {
            // Pre-gateway builds answer on the flavor-A path even when the
            // connection otherwise speaks flavor-B.
            client.get(&format!("{}ping/", default_prefix(Flavor::FlavorA)), &[]).await?
        }
        Err(e) => return Err(e),
    };

    let version = ping
        .get("version")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(Discovery { version, prefix })
}

fn resolve_prefix(flavor: Flavor, root: &serde_json::Value) -> Option<String> {
    match flavor {
        Flavor::FlavorA => root
            .get("current_version")
            .and_then(serde_json::Value::as_str)
            .map(String::from),
        Flavor::FlavorB => root
            .get("apis")
            .and_then(|apis| apis.get("controller"))
            .and_then(serde_json::Value::as_str)
            .map(|prefix| {
                let prefix = prefix.trim_end_matches('/');
                format!("{prefix}/v2/")
            }),
    }
}

fn default_prefix(flavor: Flavor) -> &'static str {
    match flavor {
        Flavor::FlavorA => "/api/v2/",
        Flavor::FlavorB => "/api/controller/v2/",
    }
}

/// If `discovery.prefix` differs from the flavor's default, return a
/// connection-scoped rewrite of `registry`; otherwise return `None` and the
/// caller keeps using the shared default registry.
pub fn rewrite_if_needed(
    flavor: Flavor,
    registry: &Registry,
    discovery: &Discovery,
) -> Option<Registry> {
    let default = default_prefix(flavor);
    if discovery.prefix == default {
        None
    } else {
        Some(convoy_registry::rewrite(registry, default, &discovery.prefix))
    }
}

/// `true` iff `v` is empty, `min` is empty, or `v >= min` under
/// part-by-part numeric comparison (missing parts treated as zero).
pub fn version_at_least(v: &str, min: &str) -> bool {
    if v.is_empty() || min.is_empty() {
        return true;
    }

    let v_parts = parse_parts(v);
    let min_parts = parse_parts(min);
    let len = v_parts.len().max(min_parts.len());

    for i in 0..len {
        let a = v_parts.get(i).copied().unwrap_or(0);
        let b = min_parts.get(i).copied().unwrap_or(0);
        if a != b {
            return a > b;
        }
    }
    true
}

fn parse_parts(v: &str) -> Vec<u64> {
    v.split('.').map(|p| p.parse::<u64>().unwrap_or(0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_at_least_handles_empty_strings() {
        assert!(version_at_least("", "4.2.0"));
        assert!(version_at_least("4.2.0", ""));
        assert!(version_at_least("", ""));
    }

    #[test]
    fn version_at_least_compares_numerically_not_lexically() {
        assert!(version_at_least("4.10.0", "4.9.0"));
        assert!(!version_at_least("4.9.0", "4.10.0"));
    }

    #[test]
    fn version_at_least_treats_missing_parts_as_zero() {
        assert!(version_at_least("4.2", "4.2.0"));
        assert!(!version_at_least("4.2", "4.2.1"));
    }

    #[test]
    fn resolve_prefix_flavor_a_reads_current_version() {
        let root = serde_json::json!({"current_version": "/api/v2/"});
        assert_eq!(
            resolve_prefix(Flavor::FlavorA, &root),
            Some("/api/v2/".to_string())
        );
    }

    #[test]
    fn resolve_prefix_flavor_b_suffixes_v2() {
        let root = serde_json::json!({"apis": {"controller": "/api/controller"}});
        assert_eq!(
            resolve_prefix(Flavor::FlavorB, &root),
            Some("/api/controller/v2/".to_string())
        );
    }

    #[test]
    fn rewrite_if_needed_returns_none_when_prefix_matches_default() {
        let registry = convoy_registry::build(Flavor::FlavorA);
        let discovery = Discovery {
            version: "4.2.0".into(),
            prefix: "/api/v2/".into(),
        };
        assert!(rewrite_if_needed(Flavor::FlavorA, &registry, &discovery).is_none());
    }

    #[test]
    fn rewrite_if_needed_rewrites_when_prefix_differs() {
        let registry = convoy_registry::build(Flavor::FlavorA);
        let discovery = Discovery {
            version: "4.2.0".into(),
            prefix: "/api/v2.1/".into(),
        };
        let rewritten = rewrite_if_needed(Flavor::FlavorA, &registry, &discovery).unwrap();
        assert_eq!(
            rewritten["job_templates"].api_path,
            "/api/v2.1/job_templates/"
        );
    }
}
