use async_trait::async_trait;
use module_orchestrator::mock::{CallLog, RecordingPublisher, TestModule};
use module_orchestrator::{
    factory_fn, HealthSnapshot, HealthStatus, Module, ModuleError, Orchestrator, OrchestratorConfig, OverallHealth,
    SharedContext,
};
use std::sync::Arc;
use std::time::Duration;

fn orchestrator(config: OrchestratorConfig) -> Orchestrator {
    Orchestrator::new(config, SharedContext::default(), Arc::new(RecordingPublisher::default()))
}

#[tokio::test]
async fn test_module_without_health_check_is_healthy() {
    let log = CallLog::default();
    let mut orchestrator = orchestrator(OrchestratorConfig::default());
    orchestrator
        .register_module(TestModule::new("store", &log).registration())
        .unwrap();
    orchestrator.initialize().await.unwrap();

    let report = orchestrator.perform_health_check().await;

    assert_eq!(report.overall, OverallHealth::Healthy);
    assert!(report.module("store").unwrap().is_healthy());
    // Healthy by status: the probe is never called
    assert_eq!(log.count("health:store"), 0);
}

#[tokio::test]
async fn test_failing_probe_degrades_without_hiding_others() {
    let log = CallLog::default();
    let mut orchestrator = orchestrator(OrchestratorConfig::default());
    orchestrator
        .register_all([
            TestModule::new("store", &log).healthy().registration(),
            TestModule::new("cache", &log).failing_health().registration(),
            TestModule::new("auth", &log).unhealthy().registration().depends_on(["store"]),
            TestModule::new("campaigns", &log).registration().depends_on(["auth"]),
        ])
        .unwrap();
    orchestrator.initialize().await.unwrap();

    let report = orchestrator.perform_health_check().await;

    assert_eq!(report.overall, OverallHealth::Degraded);
    assert_eq!(report.modules.len(), 4);
    assert!(report.module("store").unwrap().is_healthy());
    assert!(report.module("campaigns").unwrap().is_healthy());

    let cache = report.module("cache").unwrap();
    assert_eq!(cache.status, HealthStatus::Unhealthy);
    assert_eq!(cache.error.as_deref(), Some("cache health probe failed"));

    let auth = report.module("auth").unwrap();
    assert_eq!(auth.status, HealthStatus::Unhealthy);
    assert_eq!(auth.details["module"], "auth");
}

#[tokio::test]
async fn test_hanging_probe_times_out() {
    let log = CallLog::default();
    let config = OrchestratorConfig::default().with_health_check_timeout(Duration::from_millis(50));
    let mut orchestrator = orchestrator(config);
    orchestrator
        .register_all([
            TestModule::new("stuck", &log).hang_health().registration(),
            TestModule::new("fine", &log).healthy().registration(),
        ])
        .unwrap();
    orchestrator.initialize().await.unwrap();

    let report = tokio::time::timeout(Duration::from_secs(5), orchestrator.perform_health_check())
        .await
        .expect("health check must not stall");

    assert_eq!(report.overall, OverallHealth::Degraded);
    let stuck = report.module("stuck").unwrap();
    assert!(!stuck.is_healthy());
    assert!(stuck.error.as_deref().unwrap().contains("timed out"));
    assert!(report.module("fine").unwrap().is_healthy());
}

#[tokio::test]
async fn test_only_ready_modules_are_reported() {
    let log = CallLog::default();
    let mut orchestrator = orchestrator(OrchestratorConfig::default());
    orchestrator
        .register_all([
            TestModule::new("store", &log).healthy().registration(),
            TestModule::new("auth", &log).fail_start().registration().depends_on(["store"]),
            TestModule::new("campaigns", &log).registration().depends_on(["auth"]),
        ])
        .unwrap();
    assert!(orchestrator.initialize().await.is_err());

    let report = orchestrator.perform_health_check().await;

    // A failed module is absent, not unhealthy; the orchestrator itself is fine
    assert_eq!(report.overall, OverallHealth::Healthy);
    assert_eq!(report.modules.keys().collect::<Vec<_>>(), ["store"]);
}

#[tokio::test]
async fn test_empty_system_is_healthy() {
    let orchestrator = orchestrator(OrchestratorConfig::default());
    let report = orchestrator.perform_health_check().await;
    assert!(report.is_healthy());
    assert!(report.modules.is_empty());
}

#[tokio::test]
async fn test_report_serializes() {
    let log = CallLog::default();
    let mut orchestrator = orchestrator(OrchestratorConfig::default());
    orchestrator
        .register_module(TestModule::new("cache", &log).failing_health().registration())
        .unwrap();
    orchestrator.initialize().await.unwrap();

    let json = serde_json::to_value(orchestrator.perform_health_check().await).unwrap();

    assert_eq!(json["overall"], "degraded");
    assert_eq!(json["modules"]["cache"]["status"], "unhealthy");
    assert_eq!(json["modules"]["cache"]["error"], "cache health probe failed");
}

/// A module whose health check panics.
struct Panicky;

#[async_trait]
impl Module for Panicky {
    fn reports_health(&self) -> bool {
        true
    }

    async fn health_check(&self) -> Result<HealthSnapshot, ModuleError> {
        panic!("probe exploded");
    }
}

#[tokio::test]
async fn test_panicking_probe_is_contained() {
    let log = CallLog::default();
    let mut orchestrator = orchestrator(OrchestratorConfig::default());
    orchestrator
        .register_module(TestModule::new("store", &log).healthy().registration())
        .unwrap();
    orchestrator
        .register(
            "payments",
            ["store"],
            factory_fn(|_, _| async { Ok::<_, ModuleError>(Panicky) }),
        )
        .unwrap();
    orchestrator.initialize().await.unwrap();

    let report = orchestrator.perform_health_check().await;

    assert_eq!(report.overall, OverallHealth::Degraded);
    assert!(report.module("store").unwrap().is_healthy());
    let payments = report.module("payments").unwrap();
    assert_eq!(payments.status, HealthStatus::Unhealthy);
    assert!(payments
        .error
        .as_deref()
        .is_some_and(|e| e.starts_with("Health check panicked")));

    // The orchestrator stays usable after a probe panicked
    assert!(orchestrator.perform_health_check().await.module("store").unwrap().is_healthy());
}
