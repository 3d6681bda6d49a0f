use std::env;
use std::time::Duration;

/// Ambient configuration for the pieces this crate owns directly — the HTTP
/// client's timeout and the job runtime's poll cadence. Connection identity
/// and persistence stay external (see the Non-goals in the spec); this is
/// not a connection store.
#[derive(Debug, Clone)]
pub struct Config {
    /// Per-request HTTP timeout. Default 30s.
    pub http_timeout: Duration,
    /// Interval between polls of a project's sync status. Default 3s.
    pub project_sync_poll_interval: Duration,
    /// Deadline for a single project's sync wait. Default 120s.
    pub project_sync_deadline: Duration,
    /// Tick interval for the log-stream WebSocket poll. Default 200ms.
    pub log_stream_tick: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_timeout: Duration::from_secs(30),
            project_sync_poll_interval: Duration::from_secs(3),
            project_sync_deadline: Duration::from_secs(120),
            log_stream_tick: Duration::from_millis(200),
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to the
    /// documented defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            http_timeout: env_secs("CONVOY_HTTP_TIMEOUT_SECS", defaults.http_timeout),
            project_sync_poll_interval: env_secs(
                "CONVOY_PROJECT_SYNC_POLL_SECS",
                defaults.project_sync_poll_interval,
            ),
            project_sync_deadline: env_secs(
                "CONVOY_PROJECT_SYNC_DEADLINE_SECS",
                defaults.project_sync_deadline,
            ),
            log_stream_tick: env_millis("CONVOY_LOG_STREAM_TICK_MS", defaults.log_stream_tick),
        }
    }
}

fn env_secs(key: &str, default: Duration) -> Duration {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

fn env_millis(key: &str, default: Duration) -> Duration {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let c = Config::default();
        assert_eq!(c.http_timeout, Duration::from_secs(30));
        assert_eq!(c.project_sync_poll_interval, Duration::from_secs(3));
        assert_eq!(c.project_sync_deadline, Duration::from_secs(120));
        assert_eq!(c.log_stream_tick, Duration::from_millis(200));
    }
}
