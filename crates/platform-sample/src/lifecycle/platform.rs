use crate::modules::{AuthModule, CampaignsModule, NotificationsModule, ProfilesModule};
use module_orchestrator::{
    factory_fn, EventPublisher, HealthReport, Module, ModuleRegistration, Orchestrator, OrchestratorConfig,
    OrchestratorError, SharedContext, ShutdownReport,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

pub const AUTH: &str = "auth";
pub const PROFILES: &str = "profiles";
pub const CAMPAIGNS: &str = "campaigns";
pub const NOTIFICATIONS: &str = "notifications";

/// Environment variable holding a JSON [`PlatformSettings`] document.
pub const SETTINGS_ENV: &str = "PLATFORM_SETTINGS";

/// Per-module settings of the sample platform.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlatformSettings {
    pub token_prefix: String,
    pub max_campaign_budget: f64,
}

impl PlatformSettings {
    /// Parses a JSON document. Missing fields keep their defaults.
    pub fn from_json(document: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(document)
    }
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            token_prefix: "sess".to_string(),
            max_campaign_budget: 10_000.0,
        }
    }
}

/// The module registrations of the platform, deliberately not in startup order.
pub fn registrations(settings: &PlatformSettings) -> Vec<ModuleRegistration> {
    vec![
        ModuleRegistration::new(CAMPAIGNS, factory_fn(CampaignsModule::build))
            .depends_on([AUTH, PROFILES])
            .with_config(serde_json::json!({ "max_budget": settings.max_campaign_budget })),
        ModuleRegistration::new(NOTIFICATIONS, factory_fn(NotificationsModule::build)).depends_on([AUTH]),
        ModuleRegistration::new(PROFILES, factory_fn(ProfilesModule::build)).depends_on([AUTH]),
        ModuleRegistration::new(AUTH, factory_fn(AuthModule::build))
            .with_config(serde_json::json!({ "token_prefix": settings.token_prefix })),
    ]
}

/// The running sample platform.
///
/// Owns the orchestrator; module handles are looked up on demand so they always reflect the
/// current lifecycle state.
pub struct Platform {
    orchestrator: Orchestrator,
}

impl Platform {
    pub fn new(
        config: OrchestratorConfig,
        context: SharedContext,
        events: Arc<dyn EventPublisher>,
    ) -> Result<Self, OrchestratorError> {
        Self::with_settings(config, context, events, &PlatformSettings::default())
    }

    pub fn with_settings(
        config: OrchestratorConfig,
        context: SharedContext,
        events: Arc<dyn EventPublisher>,
        settings: &PlatformSettings,
    ) -> Result<Self, OrchestratorError> {
        let mut orchestrator = Orchestrator::new(config, context, events);
        orchestrator.register_all(registrations(settings))?;
        Ok(Self { orchestrator })
    }

    /// Starts every module in dependency order.
    pub async fn start(&mut self) -> Result<(), OrchestratorError> {
        self.orchestrator.initialize().await?;
        info!(modules = self.orchestrator.registry().len(), "Platform started");
        Ok(())
    }

    pub async fn health(&self) -> HealthReport {
        self.orchestrator.perform_health_check().await
    }

    /// Stops every module in reverse dependency order.
    pub async fn shutdown(&mut self) -> ShutdownReport {
        let report = self.orchestrator.shutdown().await;
        if report.is_clean() {
            info!(stopped = report.stopped.len(), "Platform stopped");
        } else {
            warn!(failures = report.failures.len(), "Platform stopped with failures");
        }
        report
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn auth(&self) -> Result<Arc<AuthModule>, OrchestratorError> {
        self.module(AUTH)
    }

    pub fn profiles(&self) -> Result<Arc<ProfilesModule>, OrchestratorError> {
        self.module(PROFILES)
    }

    pub fn campaigns(&self) -> Result<Arc<CampaignsModule>, OrchestratorError> {
        self.module(CAMPAIGNS)
    }

    pub fn notifications(&self) -> Result<Arc<NotificationsModule>, OrchestratorError> {
        self.module(NOTIFICATIONS)
    }

    fn module<M: Module>(&self, name: &str) -> Result<Arc<M>, OrchestratorError> {
        self.orchestrator.get_module_as::<M>(name)
    }
}
