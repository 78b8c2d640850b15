//! Campaign creation. Announces new campaigns on the [`DomainBus`].

use super::{AuthModule, PlatformError, ProfilesModule};
use crate::services::{DomainBus, MemoryStore};
use async_trait::async_trait;
use module_orchestrator::{DependencyBundle, Module, ModuleError, SharedContext};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, instrument};

const CAMPAIGNS: &str = "campaigns";
pub const CAMPAIGN_CREATED: &str = "campaign.created";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    pub owner: String,
    pub owner_name: String,
    pub name: String,
    pub budget: f64,
}

pub struct CampaignsModule {
    auth: Arc<AuthModule>,
    profiles: Arc<ProfilesModule>,
    store: Arc<MemoryStore>,
    bus: Arc<DomainBus>,
    max_budget: f64,
    next_id: AtomicU64,
}

impl CampaignsModule {
    pub async fn build(deps: DependencyBundle, ctx: SharedContext) -> Result<Self, ModuleError> {
        let max_budget = deps.config()["max_budget"].as_f64().unwrap_or(10_000.0);
        if max_budget <= 0.0 {
            return Err(ModuleError::Message(format!("max_budget must be positive, got {}", max_budget)));
        }
        Ok(Self {
            auth: deps.get_as::<AuthModule>("auth")?,
            profiles: deps.get_as::<ProfilesModule>("profiles")?,
            store: ctx.require::<MemoryStore>()?,
            bus: ctx.require::<DomainBus>()?,
            max_budget,
            next_id: AtomicU64::new(1),
        })
    }

    #[instrument(skip(self, token))]
    pub async fn create_campaign(&self, token: &str, name: &str, budget: f64) -> Result<Campaign, PlatformError> {
        let owner = self.auth.authenticate(token).await?;
        if !(budget > 0.0 && budget <= self.max_budget) {
            return Err(PlatformError::Validation(format!(
                "budget must be in (0, {}], got {}",
                self.max_budget, budget
            )));
        }
        let owner_name = self.profiles.profile(&owner).await?.display_name;

        let id = format!("campaign_{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let campaign = Campaign {
            id: id.clone(),
            owner,
            owner_name,
            name: name.to_string(),
            budget,
        };
        let value = serde_json::to_value(&campaign).map_err(|e| PlatformError::Validation(e.to_string()))?;
        self.store.put(CAMPAIGNS, &id, value.clone()).await;
        self.bus.publish(CAMPAIGN_CREATED, value);

        info!(campaign_id = %id, "Campaign created");
        Ok(campaign)
    }

    pub async fn campaign(&self, id: &str) -> Result<Campaign, PlatformError> {
        let value = self
            .store
            .get(CAMPAIGNS, id)
            .await
            .ok_or_else(|| PlatformError::NotFound(id.to_string()))?;
        serde_json::from_value(value).map_err(|e| PlatformError::Validation(e.to_string()))
    }
}

#[async_trait]
impl Module for CampaignsModule {}
