//! # Orchestrator Configuration
//!
//! Settings can come from three places: the defaults, a JSON document, or environment
//! variables.
//!
//! | Field | Env | Default |
//! |-------|-----|---------|
//! | `health_check_timeout_ms` | `ORCHESTRATOR_HEALTH_TIMEOUT_MS` | `5000` |
//! | `event_capacity` | `ORCHESTRATOR_EVENT_CAPACITY` | `64` |

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const HEALTH_TIMEOUT_ENV: &str = "ORCHESTRATOR_HEALTH_TIMEOUT_MS";
pub const EVENT_CAPACITY_ENV: &str = "ORCHESTRATOR_EVENT_CAPACITY";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Upper bound for a single module's health probe.
    pub health_check_timeout_ms: u64,
    /// Buffer size for [`BroadcastPublisher`](crate::events::BroadcastPublisher).
    pub event_capacity: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            health_check_timeout_ms: 5_000,
            event_capacity: 64,
        }
    }
}

impl OrchestratorConfig {
    pub fn health_check_timeout(&self) -> Duration {
        Duration::from_millis(self.health_check_timeout_ms)
    }

    pub fn with_health_check_timeout(mut self, timeout: Duration) -> Self {
        self.health_check_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Parses a JSON document. Missing fields keep their defaults.
    pub fn from_json(document: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(document)?)
    }

    /// Reads overrides from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(value) = lookup(HEALTH_TIMEOUT_ENV) {
            config.health_check_timeout_ms = parse(HEALTH_TIMEOUT_ENV, &value)?;
        }
        if let Some(value) = lookup(EVENT_CAPACITY_ENV) {
            config.event_capacity = parse(EVENT_CAPACITY_ENV, &value)?;
        }
        Ok(config)
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}
