//! # Health Aggregation
//!
//! Folds per-module health into one system status. A failing module never fails the report:
//! errors, timeouts and panics are captured as data on that module's entry, and the overall
//! status becomes [`OverallHealth::Degraded`].

use crate::module::{HealthStatus, ModuleInstance};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallHealth {
    Healthy,
    Degraded,
}

/// One module's entry in the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    pub details: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ModuleHealth {
    fn healthy(details: serde_json::Value) -> Self {
        Self {
            status: HealthStatus::Healthy,
            details,
            error: None,
        }
    }

    fn unhealthy(details: serde_json::Value, error: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            details,
            error: Some(error.into()),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub overall: OverallHealth,
    pub modules: BTreeMap<String, ModuleHealth>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.overall == OverallHealth::Healthy
    }

    pub fn module(&self, name: &str) -> Option<&ModuleHealth> {
        self.modules.get(name)
    }
}

/// Probes every given module concurrently and folds the results.
///
/// Modules that do not report health are healthy without being called. Each probe runs on
/// its own task so a panicking probe is contained, and is bounded by `timeout`.
pub(crate) async fn aggregate(modules: Vec<(String, ModuleInstance)>, timeout: Duration) -> HealthReport {
    let mut entries = BTreeMap::new();
    let mut probes = Vec::new();

    for (name, instance) in modules {
        let module = instance.module().clone();
        if !module.reports_health() {
            entries.insert(name, ModuleHealth::healthy(serde_json::Value::Null));
            continue;
        }
        let handle = tokio::spawn(async move { tokio::time::timeout(timeout, module.health_check()).await });
        probes.push((name, handle));
    }

    for (name, handle) in probes {
        let entry = match handle.await {
            Ok(Ok(Ok(snapshot))) if snapshot.status == HealthStatus::Healthy => {
                ModuleHealth::healthy(snapshot.details)
            }
            Ok(Ok(Ok(snapshot))) => ModuleHealth::unhealthy(snapshot.details, "Module reported unhealthy"),
            Ok(Ok(Err(e))) => ModuleHealth::unhealthy(serde_json::Value::Null, e.to_string()),
            Ok(Err(_)) => ModuleHealth::unhealthy(
                serde_json::Value::Null,
                format!("Health check timed out after {:?}", timeout),
            ),
            Err(e) => ModuleHealth::unhealthy(serde_json::Value::Null, format!("Health check panicked: {}", e)),
        };
        if let Some(error) = &entry.error {
            warn!(module = %name, %error, "Module unhealthy");
        }
        entries.insert(name, entry);
    }

    let overall = if entries.values().all(ModuleHealth::is_healthy) {
        OverallHealth::Healthy
    } else {
        OverallHealth::Degraded
    };
    debug!(?overall, modules = entries.len(), "Health check complete");

    HealthReport {
        overall,
        modules: entries,
    }
}
