//! `GET /healthz` (spec.md §4.6, §6).

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

/// Bounds how long the runtime waits on a plugin's [`HealthChecker`]
/// before treating it as failed (spec.md §5 "Timeouts").
pub const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Body schema for `GET /healthz` (spec.md §6). `last_checked` is
/// always stamped by the runtime; a plugin's [`HealthChecker`] must
/// not set it.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub healthy: bool,
    pub message: String,
    #[serde(default)]
    pub details: HashMap<String, String>,
    pub last_checked: DateTime<Utc>,
}

impl HealthStatus {
    /// The default body served when a plugin does not implement
    /// [`HealthChecker`].
    pub fn default_healthy() -> Self {
        Self {
            healthy: true,
            message: String::new(),
            details: HashMap::new(),
            last_checked: Utc::now(),
        }
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self {
            healthy: false,
            message: message.into(),
            details: HashMap::new(),
            last_checked: Utc::now(),
        }
    }
}

/// Optional capability: a plugin that wants to influence `/healthz`
/// beyond the runtime's default `200 {"healthy": true}` body
/// implements this (spec.md §4.6).
#[async_trait::async_trait]
pub trait HealthChecker: Send + Sync {
    async fn check(&self) -> HealthStatus;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_healthy_has_no_message_and_is_healthy() {
        let status = HealthStatus::default_healthy();
        assert!(status.healthy);
        assert!(status.message.is_empty());
    }

    #[test]
    fn unhealthy_carries_the_message() {
        let status = HealthStatus::unhealthy("upstream pricing source unreachable");
        assert!(!status.healthy);
        assert_eq!(status.message, "upstream pricing source unreachable");
    }
}
