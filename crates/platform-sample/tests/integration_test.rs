use module_orchestrator::mock::{CallLog, RecordingPublisher, TestModule};
use module_orchestrator::{
    factory_fn, HealthStatus, ModuleStatus, NoopPublisher, Orchestrator, OrchestratorConfig, OrchestratorError,
    OverallHealth, SharedContext,
};
use platform_sample::lifecycle::{registrations, Platform, PlatformSettings, AUTH, CAMPAIGNS, NOTIFICATIONS, PROFILES};
use platform_sample::modules::{AuthModule, CampaignsModule, Notification, PlatformError, ProfilesModule, CAMPAIGN_CREATED};
use platform_sample::services::{shared_context, Cache, DomainBus, MemoryStore};
use std::sync::Arc;
use std::time::Duration;

async fn started_platform() -> (Platform, Arc<RecordingPublisher>) {
    let events = Arc::new(RecordingPublisher::default());
    let mut platform = Platform::new(OrchestratorConfig::default(), shared_context(16), events.clone())
        .expect("registration failed");
    platform.start().await.expect("platform failed to start");
    (platform, events)
}

async fn inbox_eventually(platform: &Platform, token: &str, count: usize) -> Vec<Notification> {
    let notifications = platform.notifications().unwrap();
    for _ in 0..50 {
        let inbox = notifications.inbox(token).await.unwrap();
        if inbox.len() >= count {
            return inbox;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    notifications.inbox(token).await.unwrap()
}

/// Full end-to-end flow through every module.
#[tokio::test]
async fn test_full_platform_integration() {
    let (mut platform, events) = started_platform().await;

    // Startup follows dependencies, not registration order
    let initialized: Vec<_> = events
        .named("module.initialized")
        .iter()
        .filter_map(|e| e.module().map(str::to_string))
        .collect();
    let position = |name: &str| initialized.iter().position(|m| m == name).unwrap();
    assert_eq!(initialized.len(), 4);
    assert_eq!(position(AUTH), 0);
    assert!(position(PROFILES) < position(CAMPAIGNS));

    let auth = platform.auth().unwrap();
    auth.register_user("u1", "alice@example.com").await.unwrap();
    let token = auth.login("u1").await.unwrap();

    let profile = platform
        .profiles()
        .unwrap()
        .update_profile(&token, "  Alice ")
        .await
        .unwrap();
    assert_eq!(profile.display_name, "Alice");

    let campaign = platform
        .campaigns()
        .unwrap()
        .create_campaign(&token, "Launch", 500.0)
        .await
        .unwrap();
    assert_eq!(campaign.owner, "u1");
    assert_eq!(campaign.owner_name, "Alice");
    assert_eq!(platform.campaigns().unwrap().campaign(&campaign.id).await.unwrap(), campaign);

    let inbox = inbox_eventually(&platform, &token, 1).await;
    assert_eq!(
        inbox,
        vec![Notification {
            topic: CAMPAIGN_CREATED.to_string(),
            message: "Campaign 'Launch' is live".to_string(),
        }]
    );

    let health = platform.health().await;
    assert_eq!(health.overall, OverallHealth::Healthy);
    assert!(health.module(AUTH).is_some());
    assert!(health.module(NOTIFICATIONS).is_some());
    // Modules without a health check are reported healthy
    assert_eq!(health.module(PROFILES).unwrap().status, HealthStatus::Healthy);

    let report = platform.shutdown().await;
    assert!(report.is_clean());
    assert_eq!(report.stopped.len(), 4);
    assert_eq!(report.stopped.last().map(String::as_str), Some(AUTH));
    let stopped = |name: &str| report.stopped.iter().position(|m| m == name).unwrap();
    assert!(stopped(CAMPAIGNS) < stopped(PROFILES));
    assert!(platform.auth().is_err());
}

#[tokio::test]
async fn test_requests_require_a_session() {
    let (platform, _) = started_platform().await;
    let auth = platform.auth().unwrap();
    auth.register_user("u1", "alice@example.com").await.unwrap();
    let token = auth.login("u1").await.unwrap();
    auth.logout(&token).await;

    let result = platform.campaigns().unwrap().create_campaign(&token, "Launch", 10.0).await;
    assert!(matches!(result, Err(PlatformError::Unauthorized)));

    assert!(matches!(auth.login("ghost").await, Err(PlatformError::NotFound(_))));
    assert!(matches!(
        auth.register_user("u2", "not-an-email").await,
        Err(PlatformError::Validation(_))
    ));
}

#[tokio::test]
async fn test_campaign_budget_comes_from_module_config() {
    let settings = PlatformSettings {
        max_campaign_budget: 100.0,
        ..PlatformSettings::default()
    };
    let mut platform = Platform::with_settings(
        OrchestratorConfig::default(),
        shared_context(16),
        Arc::new(NoopPublisher),
        &settings,
    )
    .unwrap();
    platform.start().await.unwrap();

    let auth = platform.auth().unwrap();
    auth.register_user("u1", "alice@example.com").await.unwrap();
    let token = auth.login("u1").await.unwrap();
    platform.profiles().unwrap().update_profile(&token, "Alice").await.unwrap();

    let campaigns = platform.campaigns().unwrap();
    assert!(matches!(
        campaigns.create_campaign(&token, "Too big", 150.0).await,
        Err(PlatformError::Validation(_))
    ));
    assert!(campaigns.create_campaign(&token, "Fits", 100.0).await.is_ok());
}

#[tokio::test]
async fn test_invalid_module_config_fails_startup() {
    let settings = PlatformSettings {
        max_campaign_budget: -1.0,
        ..PlatformSettings::default()
    };
    let events = Arc::new(RecordingPublisher::default());
    let mut platform = Platform::with_settings(
        OrchestratorConfig::default(),
        shared_context(16),
        events.clone(),
        &settings,
    )
    .unwrap();

    let err = platform.start().await.unwrap_err();
    assert!(matches!(err, OrchestratorError::ModuleConstruction { ref module, .. } if module == CAMPAIGNS));
    assert!(!platform.orchestrator().is_initialized());
    assert_eq!(events.named("orchestrator.error").len(), 1);

    // Dependencies that started keep running until shutdown
    let status = platform.orchestrator().module_status();
    assert_eq!(status[AUTH].status, ModuleStatus::Ready);
    assert_eq!(status[CAMPAIGNS].status, ModuleStatus::Error);
    assert!(status[CAMPAIGNS].last_error.is_some());

    let report = platform.shutdown().await;
    assert!(report.is_clean());
    assert!(!report.stopped.iter().any(|m| m == CAMPAIGNS));
}

#[tokio::test]
async fn test_missing_shared_service_fails_startup() {
    // No cache in the context
    let context = SharedContext::builder()
        .with(MemoryStore::default())
        .with(DomainBus::new(4))
        .build();
    let mut platform = Platform::new(OrchestratorConfig::default(), context, Arc::new(NoopPublisher)).unwrap();

    let err = platform.start().await.unwrap_err();
    assert_eq!(err.module(), Some(AUTH));
    assert!(platform.profiles().is_err());
}

#[tokio::test]
async fn test_notifications_unhealthy_after_listener_stops() {
    let (platform, _) = started_platform().await;
    let notifications = platform.notifications().unwrap();
    assert!(notifications.is_listening().await);

    // Stopping the module directly leaves the orchestrator believing it is ready
    module_orchestrator::Module::stop(notifications.as_ref()).await.unwrap();

    let health = platform.health().await;
    assert_eq!(health.overall, OverallHealth::Degraded);
    assert_eq!(health.module(NOTIFICATIONS).unwrap().status, HealthStatus::Unhealthy);
    assert_eq!(health.module(AUTH).unwrap().status, HealthStatus::Healthy);
}

#[tokio::test]
async fn test_platform_restarts_after_shutdown() {
    let (mut platform, _) = started_platform().await;
    let first = platform.auth().unwrap();
    platform.shutdown().await;

    platform.start().await.unwrap();
    let second = platform.auth().unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(platform.notifications().unwrap().is_listening().await);
}

/// Real campaigns module wired to a stand-in `profiles` of the wrong type.
#[tokio::test]
async fn test_campaigns_rejects_foreign_profiles_module() {
    let log = CallLog::default();
    let mut orchestrator = Orchestrator::new(
        OrchestratorConfig::default(),
        shared_context(4),
        Arc::new(NoopPublisher),
    );
    orchestrator
        .register(AUTH, Vec::<String>::new(), factory_fn(AuthModule::build))
        .unwrap();
    orchestrator
        .register_module(TestModule::new(PROFILES, &log).registration())
        .unwrap();
    orchestrator
        .register(CAMPAIGNS, [AUTH, PROFILES], factory_fn(CampaignsModule::build))
        .unwrap();

    let err = orchestrator.initialize().await.unwrap_err();
    assert!(matches!(err, OrchestratorError::ModuleConstruction { ref module, .. } if module == CAMPAIGNS));
    assert_eq!(log.count(&format!("start:{}", PROFILES)), 1);
}

/// Real profiles module over real auth, without the rest of the platform.
#[tokio::test]
async fn test_profiles_with_only_auth() {
    let context = SharedContext::builder()
        .with(MemoryStore::default())
        .with(Cache::default())
        .build();
    let mut orchestrator = Orchestrator::new(OrchestratorConfig::default(), context, Arc::new(NoopPublisher));
    orchestrator
        .register_all(
            registrations(&PlatformSettings::default())
                .into_iter()
                .filter(|r| r.name() == AUTH || r.name() == PROFILES),
        )
        .unwrap();
    orchestrator.initialize().await.unwrap();

    let auth = orchestrator.get_module_as::<AuthModule>(AUTH).unwrap();
    auth.register_user("u1", "alice@example.com").await.unwrap();
    let token = auth.login("u1").await.unwrap();
    assert!(token.starts_with("sess_u1_"));

    let profiles = orchestrator.get_module_as::<ProfilesModule>(PROFILES).unwrap();
    profiles.update_profile(&token, "Alice").await.unwrap();
    assert_eq!(profiles.profile("u1").await.unwrap().display_name, "Alice");
    assert!(matches!(profiles.profile("u2").await, Err(PlatformError::NotFound(_))));
}

#[test]
fn test_settings_from_json_keep_defaults() {
    let settings = PlatformSettings::from_json(r#"{ "max_campaign_budget": 250.0 }"#).unwrap();
    assert_eq!(settings.max_campaign_budget, 250.0);
    assert_eq!(settings.token_prefix, PlatformSettings::default().token_prefix);

    assert!(PlatformSettings::from_json("{ broken").is_err());
}
