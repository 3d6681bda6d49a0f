use anyhow::{Context, Result};
use convoy_common::{Connection, Flavor};
use std::env;

/// Read one connection's identity from environment variables prefixed with
/// `CONVOY_<SIDE>_`, e.g. `CONVOY_SRC_HOST`, `CONVOY_DST_PASSWORD`.
///
/// This crate never persists connections — that's the host application's
/// job. Reading from the environment is this binary's stand-in for "the
/// user picked a connection" in a single, non-interactive invocation.
pub fn connection_from_env(side: &str) -> Result<Connection> {
    let var = |suffix: &str| -> Result<String> {
        let key = format!("CONVOY_{side}_{suffix}");
        env::var(&key).with_context(|| format!("missing required environment variable {key}"))
    };

    let scheme = var("SCHEME")?;
    let host = var("HOST")?;
    let port: u16 = var("PORT")?
        .parse()
        .with_context(|| format!("CONVOY_{side}_PORT is not a valid port number"))?;
    let username = var("USERNAME")?;
    let password = var("PASSWORD")?;
    let flavor: Flavor = var("FLAVOR")?
        .parse()
        .map_err(|e| anyhow::anyhow!("CONVOY_{side}_FLAVOR: {e}"))?;

    let mut connection = Connection::new(scheme, host, port, username, password, flavor);

    if let Ok(v) = env::var(format!("CONVOY_{side}_INSECURE")) {
        connection.insecure = v == "1" || v.eq_ignore_ascii_case("true");
    }
    if let Ok(pem) = env::var(format!("CONVOY_{side}_CA_PEM")) {
        connection.ca_pem = Some(pem);
    }

    Ok(connection)
}
