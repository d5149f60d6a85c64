//! Server configuration and environment resolution (spec.md §4.6, §6).
//!
//! Every setting here has a constructor-argument override; environment
//! variables are consulted only when the caller leaves a field unset,
//! following the precedence order in spec.md §6.

use std::time::Duration;

/// Canonical environment variable prefix this build uses for port and
/// logging resolution (spec.md §6 `<PREFIX>_*`).
pub const ENV_PREFIXES: &[&str] = &["PULUMICOST", "FINFOCUS"];

/// Resolves the listen port per spec.md §4.6: caller-supplied positive
/// port wins; otherwise the first of `<PREFIX>_PLUGIN_PORT` that parses
/// as a positive integer; `PORT` is never consulted. Returns `0`
/// ("not configured") on total absence or parse failure.
pub fn resolve_port(caller_supplied: Option<u16>) -> u16 {
    if let Some(port) = caller_supplied {
        if port > 0 {
            return port;
        }
    }
    for prefix in ENV_PREFIXES {
        if let Ok(raw) = std::env::var(format!("{prefix}_PLUGIN_PORT")) {
            if let Ok(port) = raw.parse::<u16>() {
                if port > 0 {
                    return port;
                }
            }
        }
    }
    0
}

/// `<PREFIX>_LOG_LEVEL`, falling back to plain `LOG_LEVEL` (spec.md §6).
pub fn resolve_log_level() -> Option<String> {
    for prefix in ENV_PREFIXES {
        if let Ok(v) = std::env::var(format!("{prefix}_LOG_LEVEL")) {
            return Some(v);
        }
    }
    std::env::var("LOG_LEVEL").ok()
}

/// `<PREFIX>_TEST_MODE`: strict `"true"`/`"false"`, anything else warns
/// and defaults to `false` (spec.md §6).
pub fn resolve_test_mode() -> bool {
    for prefix in ENV_PREFIXES {
        if let Ok(v) = std::env::var(format!("{prefix}_TEST_MODE")) {
            return match v.as_str() {
                "true" => true,
                "false" => false,
                other => {
                    tracing::warn!(value = other, "ignoring non-boolean *_TEST_MODE, defaulting to false");
                    false
                }
            };
        }
    }
    false
}

/// Cross-origin policy for the server's HTTP surface (spec.md §4.6,
/// "secure default" — disabled unless explicitly configured).
#[derive(Debug, Clone, Default)]
pub enum CorsPolicy {
    #[default]
    Disabled,
    AllowOrigins(Vec<String>),
}

/// Constructor-level configuration for [`crate::runtime::PluginServer`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: Option<u16>,
    pub cors: CorsPolicy,
    pub max_payload_bytes: usize,
    pub shutdown_deadline: Duration,
    pub health_check_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: None,
            cors: CorsPolicy::Disabled,
            max_payload_bytes: 1024 * 1024,
            shutdown_deadline: Duration::from_secs(30),
            health_check_timeout: Duration::from_secs(5),
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_cors(mut self, cors: CorsPolicy) -> Self {
        self.cors = cors;
        self
    }

    pub fn with_max_payload_bytes(mut self, bytes: usize) -> Self {
        self.max_payload_bytes = bytes;
        self
    }

    pub fn with_shutdown_deadline(mut self, deadline: Duration) -> Self {
        self.shutdown_deadline = deadline;
        self
    }

    pub fn resolved_port(&self) -> u16 {
        resolve_port(self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variables are process-global; serialize the tests that
    // touch them so they don't race under the test harness.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn caller_supplied_port_wins_over_env() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("PULUMICOST_PLUGIN_PORT", "9999");
        assert_eq!(resolve_port(Some(4000)), 4000);
        std::env::remove_var("PULUMICOST_PLUGIN_PORT");
    }

    #[test]
    fn falls_back_to_canonical_env_var() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("PORT");
        std::env::set_var("FINFOCUS_PLUGIN_PORT", "5123");
        assert_eq!(resolve_port(None), 5123);
        std::env::remove_var("FINFOCUS_PLUGIN_PORT");
    }

    #[test]
    fn generic_port_env_var_is_never_consulted() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("PULUMICOST_PLUGIN_PORT");
        std::env::remove_var("FINFOCUS_PLUGIN_PORT");
        std::env::set_var("PORT", "6000");
        assert_eq!(resolve_port(None), 0);
        std::env::remove_var("PORT");
    }

    #[test]
    fn absence_and_parse_failure_both_yield_zero() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("PULUMICOST_PLUGIN_PORT");
        std::env::remove_var("FINFOCUS_PLUGIN_PORT");
        assert_eq!(resolve_port(None), 0);

        std::env::set_var("PULUMICOST_PLUGIN_PORT", "not-a-port");
        assert_eq!(resolve_port(None), 0);
        std::env::remove_var("PULUMICOST_PLUGIN_PORT");
    }

    #[test]
    fn test_mode_rejects_non_boolean_values() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("PULUMICOST_TEST_MODE", "maybe");
        assert!(!resolve_test_mode());
        std::env::remove_var("PULUMICOST_TEST_MODE");
    }
}
