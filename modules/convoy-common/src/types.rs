//! Connection identity and platform flavor.
//!
//! `Connection` describes *where* to talk to a control plane. Its lifecycle —
//! creation, persistence, listing, deletion — belongs to the host application
//! (an in-memory connection store, a config file, whatever); this crate only
//! ever receives a `Connection` by value and never mutates one except to
//! record what discovery (`convoy-discovery`) learned.

use serde::{Deserialize, Serialize};

/// The two wire-compatible API dialects this crate understands.
///
/// They differ mainly in URL prefix (`/api/v2/` vs `/api/controller/v2/`);
/// `convoy-registry` holds the per-flavor path catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flavor {
    FlavorA,
    FlavorB,
}

impl std::fmt::Display for Flavor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Flavor::FlavorA => write!(f, "flavor-a"),
            Flavor::FlavorB => write!(f, "flavor-b"),
        }
    }
}

impl std::str::FromStr for Flavor {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flavor-a" | "flavor_a" => Ok(Self::FlavorA),
            "flavor-b" | "flavor_b" => Ok(Self::FlavorB),
            other => Err(format!("unknown flavor: {other}")),
        }
    }
}

/// Identity of a remote control plane — source or destination, depending on
/// role in a given migration call.
///
/// Invariant: `base_url() == "{scheme}://{host}:{port}"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub flavor: Flavor,
    /// PEM-encoded CA bundle. When set, only this pool is trusted.
    pub ca_pem: Option<String>,
    /// Skip TLS verification entirely. Takes priority over `ca_pem`.
    pub insecure: bool,
    /// Filled in by `convoy-discovery::probe` after a successful auth.
    pub version: Option<String>,
    /// Filled in by `convoy-discovery::probe`, e.g. `/api/v2/`.
    pub api_prefix: Option<String>,
}

impl Connection {
    pub fn new(
        scheme: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
        flavor: Flavor,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            port,
            username: username.into(),
            password: password.into(),
            flavor,
            ca_pem: None,
            insecure: false,
            version: None,
            api_prefix: None,
        }
    }

    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_matches_invariant() {
        let c = Connection::new("https", "controller.example.com", 443, "u", "p", Flavor::FlavorA);
        assert_eq!(c.base_url(), "https://controller.example.com:443");
    }

    #[test]
    fn flavor_round_trips_through_display_and_from_str() {
        for f in [Flavor::FlavorA, Flavor::FlavorB] {
            let s = f.to_string();
            assert_eq!(s.parse::<Flavor>().unwrap(), f);
        }
    }
}
