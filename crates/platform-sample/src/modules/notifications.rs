//! Turns domain events into per-user notifications.
//!
//! `start` spawns a listener on the [`DomainBus`]; `stop` aborts it. The health check reports
//! the listener as unhealthy once it has exited.

use super::{AuthModule, PlatformError, CAMPAIGN_CREATED};
use crate::services::{DomainBus, DomainEvent};
use async_trait::async_trait;
use module_orchestrator::{DependencyBundle, HealthSnapshot, Module, ModuleError, SharedContext};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub topic: String,
    pub message: String,
}

type Outbox = Arc<Mutex<HashMap<String, Vec<Notification>>>>;

pub struct NotificationsModule {
    auth: Arc<AuthModule>,
    bus: Arc<DomainBus>,
    outbox: Outbox,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl NotificationsModule {
    pub async fn build(deps: DependencyBundle, ctx: SharedContext) -> Result<Self, ModuleError> {
        Ok(Self {
            auth: deps.get_as::<AuthModule>("auth")?,
            bus: ctx.require::<DomainBus>()?,
            outbox: Arc::default(),
            listener: Mutex::new(None),
        })
    }

    /// Notifications delivered to the token's user.
    pub async fn inbox(&self, token: &str) -> Result<Vec<Notification>, PlatformError> {
        let user_id = self.auth.authenticate(token).await?;
        Ok(self.outbox.lock().await.get(&user_id).cloned().unwrap_or_default())
    }

    pub async fn is_listening(&self) -> bool {
        self.listener
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

async fn listen(mut rx: broadcast::Receiver<DomainEvent>, outbox: Outbox) {
    loop {
        match rx.recv().await {
            Ok(event) => deliver(&event, &outbox).await,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "Notification listener lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    debug!("Notification listener exited");
}

async fn deliver(event: &DomainEvent, outbox: &Outbox) {
    if event.topic != CAMPAIGN_CREATED {
        return;
    }
    let (Some(owner), Some(name)) = (event.payload["owner"].as_str(), event.payload["name"].as_str()) else {
        warn!(topic = %event.topic, "Malformed event payload");
        return;
    };
    let notification = Notification {
        topic: event.topic.clone(),
        message: format!("Campaign '{}' is live", name),
    };
    outbox
        .lock()
        .await
        .entry(owner.to_string())
        .or_default()
        .push(notification);
    debug!(user_id = owner, "Notification delivered");
}

#[async_trait]
impl Module for NotificationsModule {
    async fn start(&self) -> Result<(), ModuleError> {
        let mut listener = self.listener.lock().await;
        if listener.is_none() {
            let rx = self.bus.subscribe();
            *listener = Some(tokio::spawn(listen(rx, self.outbox.clone())));
            info!("Notification listener started");
        }
        Ok(())
    }

    async fn stop(&self) -> Result<(), ModuleError> {
        if let Some(handle) = self.listener.lock().await.take() {
            handle.abort();
            info!("Notification listener stopped");
        }
        Ok(())
    }

    fn reports_health(&self) -> bool {
        true
    }

    async fn health_check(&self) -> Result<HealthSnapshot, ModuleError> {
        if self.is_listening().await {
            Ok(HealthSnapshot::healthy())
        } else {
            Ok(HealthSnapshot::unhealthy(serde_json::json!({ "listener": "not running" })))
        }
    }
}
