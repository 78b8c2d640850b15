//! # Platform Sample
//!
//! Boots a small marketing platform through the module orchestrator.
//!
//! ## 🚀 Core Components
//!
//! - **`services`**: in-memory store, cache and domain bus shared through the context.
//! - **`modules`**: `auth`, `profiles`, `campaigns` and `notifications`.
//! - **`lifecycle`**: the [`Platform`] wrapper that registers, starts and stops them.
//!
//! ## 📚 Quick Start
//!
//! The entry point:
//! 1.  Loads [`OrchestratorConfig`] and [`PlatformSettings`] from the environment and starts
//!     the [`Platform`].
//! 2.  Registers a user, logs in and creates a profile and a campaign.
//! 3.  Logs the lifecycle events, the health report and the module status as JSON.
//! 4.  Shuts the platform down in reverse dependency order.

use module_orchestrator::telemetry::setup_tracing;
use module_orchestrator::{BroadcastPublisher, OrchestratorConfig};
use platform_sample::lifecycle::{Platform, PlatformSettings, SETTINGS_ENV};
use platform_sample::services::shared_context;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let config = OrchestratorConfig::from_env().map_err(|e| e.to_string())?;
    info!(?config, "Starting platform");

    let events = Arc::new(BroadcastPublisher::new(config.event_capacity));
    let mut lifecycle = events.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = lifecycle.recv().await {
            info!(event = event.name(), module = event.module(), "Lifecycle event");
        }
    });

    let settings = match std::env::var(SETTINGS_ENV) {
        Ok(document) => PlatformSettings::from_json(&document).map_err(|e| e.to_string())?,
        Err(_) => PlatformSettings::default(),
    };
    info!(?settings, "Platform settings loaded");

    let mut platform = Platform::with_settings(config.clone(), shared_context(config.event_capacity), events, &settings)
        .map_err(|e| e.to_string())?;
    platform.start().await.map_err(|e| e.to_string())?;

    let span = tracing::info_span!("onboarding");
    let token = async {
        let auth = platform.auth().map_err(|e| e.to_string())?;
        auth.register_user("u1", "alice@example.com")
            .await
            .map_err(|e| e.to_string())?;
        let token = auth.login("u1").await.map_err(|e| e.to_string())?;
        platform
            .profiles()
            .map_err(|e| e.to_string())?
            .update_profile(&token, "Alice")
            .await
            .map_err(|e| e.to_string())?;
        Ok::<_, String>(token)
    }
    .instrument(span)
    .await?;

    let span = tracing::info_span!("campaign_launch");
    let launched = async {
        let campaigns = platform.campaigns().map_err(|e| e.to_string())?;
        campaigns
            .create_campaign(&token, "Autumn launch", 2_500.0)
            .await
            .map_err(|e| e.to_string())
    }
    .instrument(span)
    .await;

    match launched {
        Ok(campaign) => info!(campaign_id = %campaign.id, "Campaign launched"),
        Err(e) => error!(error = %e, "Campaign launch failed"),
    }

    // The notification listener runs on its own task
    tokio::time::sleep(Duration::from_millis(50)).await;
    if let Ok(notifications) = platform.notifications() {
        let inbox = notifications.inbox(&token).await.map_err(|e| e.to_string())?;
        info!(count = inbox.len(), "Inbox checked");
    }

    let health = platform.health().await;
    let status = platform.orchestrator().module_status();
    info!(
        health = %serde_json::to_string(&health).map_err(|e| e.to_string())?,
        status = %serde_json::to_string(&status).map_err(|e| e.to_string())?,
        "Platform report"
    );

    let report = platform.shutdown().await;
    if !report.is_clean() {
        return Err(format!("shutdown failures: {:?}", report.failures));
    }

    info!("Application completed successfully");
    Ok(())
}
